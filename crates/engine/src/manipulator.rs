//! Move/edit manipulator.
//!
//! The handle drives a detached proxy position, not the selected node. Each
//! drag step turns the proxy displacement into a world-space move of the
//! target, so the handle sits at the bounding-box center regardless of
//! where the target's pivot is.

use glam::Vec3;
use serde::Serialize;
use tracing::debug;

use crate::picking::Ray;
use crate::scene::{NodeKey, SceneGraph};

/// Length of each axis handle in world units
pub const HANDLE_LENGTH: f32 = 1.0;

/// Which axis a manipulator handle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn direction(&self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

pub struct Manipulator {
    /// Proxy position; `Some` while mounted
    proxy: Option<Vec3>,
    /// Node moved by the proxy
    target: Option<NodeKey>,
    /// Whether a drag is in progress
    dragging: bool,
    /// Axis constraint for the current drag
    active_axis: Option<Axis>,
    /// Camera orbit input; off for the duration of a drag
    orbit_enabled: bool,
}

impl Default for Manipulator {
    fn default() -> Self {
        Self {
            proxy: None,
            target: None,
            dragging: false,
            active_axis: None,
            orbit_enabled: true,
        }
    }
}

impl Manipulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.proxy.is_some()
    }

    pub fn position(&self) -> Option<Vec3> {
        self.proxy
    }

    pub fn target(&self) -> Option<NodeKey> {
        self.target
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn active_axis(&self) -> Option<Axis> {
        self.active_axis
    }

    pub fn orbit_enabled(&self) -> bool {
        self.orbit_enabled
    }

    /// Mount on `node`, placing the proxy at its world bounding-box center
    /// (or its origin when it has no geometry). Returns false for stale keys.
    pub fn attach(&mut self, scene: &SceneGraph, node: NodeKey) -> bool {
        let center = scene
            .world_aabb(node)
            .map(|b| b.center())
            .or_else(|| scene.world_translation(node));
        let Some(center) = center else {
            self.detach();
            return false;
        };
        self.end_drag();
        self.proxy = Some(center);
        self.target = Some(node);
        debug!(?center, "manipulator attached");
        true
    }

    pub fn detach(&mut self) {
        self.end_drag();
        self.proxy = None;
        self.target = None;
    }

    /// Start a drag, optionally constrained to one axis
    pub fn begin_drag(&mut self, axis: Option<Axis>) -> bool {
        if !self.is_mounted() {
            return false;
        }
        self.dragging = true;
        self.active_axis = axis;
        self.orbit_enabled = false;
        true
    }

    /// Move the proxy to `new_proxy` and apply the same displacement to the
    /// target's world position. Returns the target's new world position.
    pub fn drag_to(&mut self, scene: &mut SceneGraph, new_proxy: Vec3) -> Option<Vec3> {
        let last = self.proxy?;
        let target = self.target?;

        let mut delta = new_proxy - last;
        if let Some(axis) = self.active_axis {
            let dir = axis.direction();
            delta = dir * delta.dot(dir);
        }

        let world = scene.world_translation(target)? + delta;
        if !scene.set_world_translation(target, world) {
            return None;
        }
        self.proxy = Some(last + delta);
        Some(world)
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
        self.active_axis = None;
        self.orbit_enabled = true;
    }

    /// Which handle (if any) a ray passes near
    pub fn hit_test(&self, ray: &Ray) -> Option<Axis> {
        handle_hit_test(ray, self.proxy?, HANDLE_LENGTH)
    }

    /// Pointer-down on the handle: start a drag constrained to the axis under
    /// `ray`. Returns `None` (and stays idle) when no axis is hit.
    pub fn grab(&mut self, ray: &Ray) -> Option<Axis> {
        let axis = self.hit_test(ray)?;
        self.begin_drag(Some(axis)).then_some(axis)
    }
}

/// Grab radius around each handle, as a fraction of its length
const GRAB_RADIUS: f32 = 0.15;

/// Axis handle whose segment passes closest to `ray`, if any is within the
/// grab radius.
pub fn handle_hit_test(ray: &Ray, center: Vec3, axis_length: f32) -> Option<Axis> {
    let radius = GRAB_RADIUS * axis_length;
    [Axis::X, Axis::Y, Axis::Z]
        .into_iter()
        .map(|axis| {
            let end = center + axis.direction() * axis_length;
            (axis, ray_segment_distance(ray, center, end))
        })
        .filter(|(_, d)| *d < radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(axis, _)| axis)
}

/// Shortest distance between a ray and the segment `a..b`
fn ray_segment_distance(ray: &Ray, a: Vec3, b: Vec3) -> f32 {
    let u = ray.direction.normalize_or_zero();
    let v = b - a;
    let vv = v.length_squared();
    if vv == 0.0 {
        let s = (a - ray.origin).dot(u).max(0.0);
        return (ray.origin + u * s).distance(a);
    }
    let w = ray.origin - a;
    let uv = u.dot(v);

    // Closest points of the two infinite lines, then clamp onto the segment
    // and re-project so both clamps hold at once.
    let denom = vv - uv * uv;
    let t = if denom > 1e-6 * vv {
        (v.dot(w) - uv * u.dot(w)) / denom
    } else {
        0.0
    };
    let t = t.clamp(0.0, 1.0);
    let s = (v * t - w).dot(u).max(0.0);
    let on_ray = ray.origin + u * s;
    let t = ((on_ray - a).dot(v) / vv).clamp(0.0, 1.0);
    on_ray.distance(a + v * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::mesh;
    use crate::scene::{NodeRole, NodeTransform, SceneNode};
    use glam::Quat;

    fn unit_box(g: &mut SceneGraph, at: Vec3) -> NodeKey {
        g.spawn(
            SceneNode::new("box", NodeRole::Object, NodeTransform::from_translation(at))
                .with_mesh(mesh::cube(1.0, 1.0, 1.0), [1.0, 1.0, 1.0]),
        )
    }

    #[test]
    fn test_attach_at_bbox_center() {
        let mut g = SceneGraph::new();
        let root = g.spawn_model(&fixtures::two_part_model());
        g.get_mut(root).unwrap().transform.translation = Vec3::new(0.0, 3.0, 0.0);
        let mut m = Manipulator::new();
        assert!(m.attach(&g, root));
        assert!(m.position().unwrap().abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-5));

        let parts = g.parts(root);
        assert!(m.attach(&g, parts[1]));
        assert!(m.position().unwrap().abs_diff_eq(Vec3::new(1.0, 3.0, 0.0), 1e-5));
    }

    #[test]
    fn test_drag_moves_root_object() {
        let mut g = SceneGraph::new();
        let k = unit_box(&mut g, Vec3::ZERO);
        let mut m = Manipulator::new();
        m.attach(&g, k);
        assert!(m.begin_drag(None));
        assert!(!m.orbit_enabled());

        let world = m.drag_to(&mut g, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        assert!(world.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert_eq!(g.get(k).unwrap().transform.translation, Vec3::new(2.0, 0.0, 0.0));

        m.end_drag();
        assert!(m.orbit_enabled());
    }

    #[test]
    fn test_drag_is_incremental() {
        let mut g = SceneGraph::new();
        let k = unit_box(&mut g, Vec3::new(1.0, 0.0, 0.0));
        let mut m = Manipulator::new();
        m.attach(&g, k);
        m.begin_drag(None);
        m.drag_to(&mut g, Vec3::new(1.5, 0.0, 0.0));
        m.drag_to(&mut g, Vec3::new(2.0, 1.0, 0.0));
        let t = g.get(k).unwrap().transform.translation;
        assert!(t.abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_drag_child_converts_into_parent_space() {
        let mut g = SceneGraph::new();
        let root = g.spawn_model(&fixtures::two_part_model());
        {
            let t = &mut g.get_mut(root).unwrap().transform;
            t.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
            t.scale = Vec3::splat(2.0);
        }
        let part = g.parts(root)[1];
        let before = g.world_translation(part).unwrap();

        let mut m = Manipulator::new();
        m.attach(&g, part);
        m.begin_drag(None);
        let start = m.position().unwrap();
        m.drag_to(&mut g, start + Vec3::new(0.0, 0.0, 1.0));

        let after = g.world_translation(part).unwrap();
        assert!((after - before).abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5));
        // Sibling untouched
        let sibling = g.parts(root)[0];
        assert!(g.world_translation(sibling).unwrap().abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
    }

    #[test]
    fn test_axis_constraint() {
        let mut g = SceneGraph::new();
        let k = unit_box(&mut g, Vec3::ZERO);
        let mut m = Manipulator::new();
        m.attach(&g, k);
        m.begin_drag(Some(Axis::Y));
        m.drag_to(&mut g, Vec3::new(3.0, 1.0, -2.0));
        assert_eq!(g.get(k).unwrap().transform.translation, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(m.position(), Some(Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_detached_ignores_drags() {
        let mut g = SceneGraph::new();
        let k = unit_box(&mut g, Vec3::ZERO);
        let mut m = Manipulator::new();
        assert!(!m.begin_drag(None));
        assert!(m.drag_to(&mut g, Vec3::ONE).is_none());
        assert_eq!(g.get(k).unwrap().transform.translation, Vec3::ZERO);
    }

    #[test]
    fn test_detach_restores_orbit() {
        let mut g = SceneGraph::new();
        let k = unit_box(&mut g, Vec3::ZERO);
        let mut m = Manipulator::new();
        m.attach(&g, k);
        m.begin_drag(None);
        m.detach();
        assert!(m.orbit_enabled());
        assert!(!m.is_mounted());
    }

    #[test]
    fn test_handle_hit_test() {
        let center = Vec3::ZERO;
        let ray = Ray::new(Vec3::new(0.5, 5.0, 0.0), Vec3::NEG_Y);
        assert_eq!(handle_hit_test(&ray, center, 1.0), Some(Axis::X));
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.7), Vec3::NEG_Y);
        assert_eq!(handle_hit_test(&ray, center, 1.0), Some(Axis::Z));
        let miss = Ray::new(Vec3::new(3.0, 5.0, 3.0), Vec3::NEG_Y);
        assert!(handle_hit_test(&miss, center, 1.0).is_none());
        let side = Ray::new(Vec3::new(5.0, 0.5, 0.05), Vec3::NEG_X);
        assert_eq!(handle_hit_test(&side, center, 1.0), Some(Axis::Y));
    }

    #[test]
    fn test_ray_segment_distance_parallel_and_skew() {
        let down = Ray::new(Vec3::new(0.7, 100.0, 0.0), Vec3::NEG_Y);
        let d = ray_segment_distance(&down, Vec3::ZERO, Vec3::Y);
        assert!((d - 0.7).abs() < 1e-5);

        let skew = Ray::new(Vec3::new(0.5, 2.0, -3.0), Vec3::Z);
        let d = ray_segment_distance(&skew, Vec3::ZERO, Vec3::X);
        assert!((d - 2.0).abs() < 1e-5);

        // Closest approach lies behind the ray origin
        let away = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        let d = ray_segment_distance(&away, Vec3::ZERO, Vec3::X);
        assert!((d - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_grab_picks_axis_and_constrains_drag() {
        let mut g = SceneGraph::new();
        let k = unit_box(&mut g, Vec3::ZERO);
        let mut m = Manipulator::new();
        assert!(m.grab(&Ray::new(Vec3::new(0.6, 5.0, 0.0), Vec3::NEG_Y)).is_none());

        m.attach(&g, k);
        let miss = Ray::new(Vec3::new(3.0, 5.0, 3.0), Vec3::NEG_Y);
        assert!(m.grab(&miss).is_none());
        assert!(!m.is_dragging());

        let axis = m.grab(&Ray::new(Vec3::new(0.6, 5.0, 0.0), Vec3::NEG_Y));
        assert_eq!(axis, Some(Axis::X));
        assert!(m.is_dragging());
        assert!(!m.orbit_enabled());
        m.drag_to(&mut g, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(g.get(k).unwrap().transform.translation, Vec3::new(1.0, 0.0, 0.0));
    }
}
