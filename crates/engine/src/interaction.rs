//! Per-object pointer handling.
//!
//! An [`InteractionAdapter`] turns a pointer event over one object into calls
//! on the [`ObjectInteractions`] capability, depending on the active mode. It
//! does the world→local conversion against the object's current frame; what
//! happens to the resulting anchors (snapping, chaining, selection) is up to
//! the implementor.

use glam::Vec3;
use shared::{InteractionMode, LineEnd, ObjectId, PointData, PointerButton};

use crate::picking::{pick_part, Ray};
use crate::scene::{NodeKey, SceneGraph};
use crate::transform::Frame;

/// Callbacks an object's adapter drives
pub trait ObjectInteractions {
    /// Select `node` (the object root in move mode, a part in edit mode)
    fn on_select(&mut self, node: NodeKey, object_id: &str);
    fn on_add_point(&mut self, point: PointData);
    fn on_add_line_point(&mut self, end: LineEnd);
    fn on_update_temp_end(&mut self, end: LineEnd);
    /// Hover feedback; `None` when the pointer leaves
    fn on_hover(&mut self, _node: Option<NodeKey>) {}
}

/// What the rendering layer reports for a pointer event over an object
#[derive(Debug, Clone)]
pub struct PointerHit {
    pub object_id: ObjectId,
    /// Sub-object that received the event
    pub node: NodeKey,
    /// World-space hit point
    pub point: Vec3,
    /// World-space face normal, when the hit was on a face
    pub normal: Option<Vec3>,
    /// Picking ray, used for the independent part test in edit mode
    pub ray: Option<Ray>,
}

/// Pointer handling for one registered object
#[derive(Debug, Clone)]
pub struct InteractionAdapter {
    object_id: ObjectId,
    root: NodeKey,
}

impl InteractionAdapter {
    pub fn new(object_id: impl Into<ObjectId>, root: NodeKey) -> Self {
        Self {
            object_id: object_id.into(),
            root,
        }
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Returns true if the event produced a callback
    pub fn pointer_down(
        &self,
        scene: &SceneGraph,
        mode: InteractionMode,
        hit: &PointerHit,
        button: PointerButton,
        sink: &mut impl ObjectInteractions,
    ) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        match mode {
            InteractionMode::Idle => false,
            InteractionMode::PlacePoint => {
                let Some(normal) = hit.normal else {
                    return false;
                };
                let Some(frame) = Frame::of(scene, self.root) else {
                    return false;
                };
                let Some(local) = frame.to_local(hit.point) else {
                    return false;
                };
                sink.on_add_point(PointData {
                    object_id: self.object_id.clone(),
                    position: local.to_array(),
                    normal: frame.normal_to_local(normal).to_array(),
                });
                true
            }
            InteractionMode::PlaceLine => match self.line_end(scene, hit.point) {
                Some(end) => {
                    sink.on_add_line_point(end);
                    true
                }
                None => false,
            },
            InteractionMode::Move => {
                sink.on_select(self.root, &self.object_id);
                true
            }
            InteractionMode::Edit => {
                let part = self.part_under(scene, hit);
                sink.on_select(part, &self.object_id);
                true
            }
        }
    }

    pub fn pointer_move(
        &self,
        scene: &SceneGraph,
        mode: InteractionMode,
        hit: &PointerHit,
        sink: &mut impl ObjectInteractions,
    ) {
        match mode {
            InteractionMode::PlaceLine => {
                if let Some(end) = self.line_end(scene, hit.point) {
                    sink.on_update_temp_end(end);
                }
            }
            InteractionMode::Move => sink.on_hover(Some(self.root)),
            InteractionMode::Edit => sink.on_hover(Some(self.part_under(scene, hit))),
            InteractionMode::Idle | InteractionMode::PlacePoint => {}
        }
    }

    fn line_end(&self, scene: &SceneGraph, world: Vec3) -> Option<LineEnd> {
        let local = Frame::of(scene, self.root)?.to_local(world)?;
        Some(LineEnd {
            object_id: self.object_id.clone(),
            position: local.to_array(),
        })
    }

    /// Part under the pointer: re-cast the ray against this object's own
    /// hierarchy, falling back to the reported sub-object, then the root.
    fn part_under(&self, scene: &SceneGraph, hit: &PointerHit) -> NodeKey {
        hit.ray
            .and_then(|ray| pick_part(scene, self.root, &ray))
            .map(|h| h.node)
            .unwrap_or_else(|| {
                if scene.is_within(self.root, hit.node) {
                    hit.node
                } else {
                    self.root
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::mesh;
    use crate::scene::{NodeRole, NodeTransform, SceneNode};

    #[derive(Default)]
    struct Recorder {
        selected: Vec<NodeKey>,
        points: Vec<PointData>,
        line_points: Vec<LineEnd>,
        temp_ends: Vec<LineEnd>,
        hovered: Vec<Option<NodeKey>>,
    }

    impl ObjectInteractions for Recorder {
        fn on_select(&mut self, node: NodeKey, _object_id: &str) {
            self.selected.push(node);
        }
        fn on_add_point(&mut self, point: PointData) {
            self.points.push(point);
        }
        fn on_add_line_point(&mut self, end: LineEnd) {
            self.line_points.push(end);
        }
        fn on_update_temp_end(&mut self, end: LineEnd) {
            self.temp_ends.push(end);
        }
        fn on_hover(&mut self, node: Option<NodeKey>) {
            self.hovered.push(node);
        }
    }

    fn box_at(g: &mut SceneGraph, at: Vec3) -> NodeKey {
        g.spawn(
            SceneNode::new("box", NodeRole::Object, NodeTransform::from_translation(at))
                .with_mesh(mesh::cube(1.0, 1.0, 1.0), [1.0, 1.0, 1.0]),
        )
    }

    fn top_hit(root: NodeKey, point: Vec3) -> PointerHit {
        PointerHit {
            object_id: "box".into(),
            node: root,
            point,
            normal: Some(Vec3::Y),
            ray: Some(Ray::new(point + Vec3::Y * 10.0, Vec3::NEG_Y)),
        }
    }

    #[test]
    fn test_place_point_stores_local_frame() {
        let mut g = SceneGraph::new();
        let root = box_at(&mut g, Vec3::new(5.0, 0.0, 0.0));
        let adapter = InteractionAdapter::new("box", root);
        let mut rec = Recorder::default();

        let hit = top_hit(root, Vec3::new(5.25, 0.5, 0.0));
        assert!(adapter.pointer_down(&g, InteractionMode::PlacePoint, &hit, PointerButton::Primary, &mut rec));
        let p = &rec.points[0];
        assert_eq!(p.object_id, "box");
        assert!(Vec3::from(p.position).abs_diff_eq(Vec3::new(0.25, 0.5, 0.0), 1e-5));
        assert!(Vec3::from(p.normal).abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn test_place_point_requires_normal() {
        let mut g = SceneGraph::new();
        let root = box_at(&mut g, Vec3::ZERO);
        let adapter = InteractionAdapter::new("box", root);
        let mut rec = Recorder::default();
        let mut hit = top_hit(root, Vec3::new(0.0, 0.5, 0.0));
        hit.normal = None;
        assert!(!adapter.pointer_down(&g, InteractionMode::PlacePoint, &hit, PointerButton::Primary, &mut rec));
        assert!(rec.points.is_empty());
    }

    #[test]
    fn test_non_primary_button_ignored() {
        let mut g = SceneGraph::new();
        let root = box_at(&mut g, Vec3::ZERO);
        let adapter = InteractionAdapter::new("box", root);
        let mut rec = Recorder::default();
        let hit = top_hit(root, Vec3::new(0.0, 0.5, 0.0));
        for mode in [InteractionMode::PlacePoint, InteractionMode::PlaceLine, InteractionMode::Move] {
            for button in [PointerButton::Secondary, PointerButton::Auxiliary] {
                assert!(!adapter.pointer_down(&g, mode, &hit, button, &mut rec));
            }
        }
        assert!(rec.points.is_empty() && rec.line_points.is_empty() && rec.selected.is_empty());
    }

    #[test]
    fn test_idle_does_nothing() {
        let mut g = SceneGraph::new();
        let root = box_at(&mut g, Vec3::ZERO);
        let adapter = InteractionAdapter::new("box", root);
        let mut rec = Recorder::default();
        let hit = top_hit(root, Vec3::new(0.0, 0.5, 0.0));
        assert!(!adapter.pointer_down(&g, InteractionMode::Idle, &hit, PointerButton::Primary, &mut rec));
        adapter.pointer_move(&g, InteractionMode::Idle, &hit, &mut rec);
        assert!(rec.hovered.is_empty());
    }

    #[test]
    fn test_line_point_and_temp_end_are_local() {
        let mut g = SceneGraph::new();
        let root = box_at(&mut g, Vec3::new(0.0, 2.0, 0.0));
        let adapter = InteractionAdapter::new("box", root);
        let mut rec = Recorder::default();
        let hit = top_hit(root, Vec3::new(0.1, 2.5, 0.1));
        adapter.pointer_down(&g, InteractionMode::PlaceLine, &hit, PointerButton::Primary, &mut rec);
        adapter.pointer_move(&g, InteractionMode::PlaceLine, &hit, &mut rec);
        let expected = Vec3::new(0.1, 0.5, 0.1);
        assert!(Vec3::from(rec.line_points[0].position).abs_diff_eq(expected, 1e-5));
        assert!(Vec3::from(rec.temp_ends[0].position).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_move_selects_root_edit_selects_part() {
        let mut g = SceneGraph::new();
        let root = g.spawn_model(&fixtures::two_part_model());
        let parts = g.parts(root);
        let adapter = InteractionAdapter::new("model", root);
        let mut rec = Recorder::default();

        // Reported sub-object is the left part, but the ray goes through the right one
        let hit = PointerHit {
            object_id: "model".into(),
            node: parts[0],
            point: Vec3::new(1.0, 0.5, 0.0),
            normal: Some(Vec3::Y),
            ray: Some(Ray::new(Vec3::new(1.0, 10.0, 0.0), Vec3::NEG_Y)),
        };
        adapter.pointer_down(&g, InteractionMode::Move, &hit, PointerButton::Primary, &mut rec);
        adapter.pointer_down(&g, InteractionMode::Edit, &hit, PointerButton::Primary, &mut rec);
        assert_eq!(rec.selected, vec![root, parts[1]]);

        let no_ray = PointerHit { ray: None, ..hit };
        adapter.pointer_down(&g, InteractionMode::Edit, &no_ray, PointerButton::Primary, &mut rec);
        assert_eq!(rec.selected[2], parts[0]);
    }

    #[test]
    fn test_hover_targets() {
        let mut g = SceneGraph::new();
        let root = g.spawn_model(&fixtures::two_part_model());
        let parts = g.parts(root);
        let adapter = InteractionAdapter::new("model", root);
        let mut rec = Recorder::default();
        let hit = PointerHit {
            object_id: "model".into(),
            node: parts[0],
            point: Vec3::new(-1.0, 0.5, 0.0),
            normal: Some(Vec3::Y),
            ray: Some(Ray::new(Vec3::new(-1.0, 10.0, 0.0), Vec3::NEG_Y)),
        };
        adapter.pointer_move(&g, InteractionMode::Move, &hit, &mut rec);
        adapter.pointer_move(&g, InteractionMode::Edit, &hit, &mut rec);
        assert_eq!(rec.hovered, vec![Some(root), Some(parts[0])]);
    }
}
