//! Coordinate transform service.
//!
//! Anchors are stored in the local frame of their host object and mapped back
//! to world space with the host's *current* transform every frame. That round
//! trip is what keeps annotations glued to objects that move.

use glam::{Mat4, Quat, Vec3};

use crate::scene::{NodeKey, SceneGraph};

/// Snapshot of a node's world frame
#[derive(Clone, Copy, Debug)]
pub struct Frame {
    matrix: Mat4,
    rotation: Quat,
}

impl Frame {
    pub fn new(matrix: Mat4, rotation: Quat) -> Self {
        Self { matrix, rotation }
    }

    /// Frame from a single TRS (rotation taken from the TRS itself)
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            matrix: Mat4::from_scale_rotation_translation(scale, rotation, translation),
            rotation,
        }
    }

    /// Current world frame of `node`; `None` if the node is gone
    pub fn of(scene: &SceneGraph, node: NodeKey) -> Option<Self> {
        Some(Self {
            matrix: scene.world_matrix(node)?,
            rotation: scene.world_rotation(node)?,
        })
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// World point → local point. `None` for degenerate (zero-scale) frames.
    pub fn to_local(&self, world: Vec3) -> Option<Vec3> {
        Some(invert(&self.matrix)?.transform_point3(world))
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.matrix.transform_point3(local)
    }

    /// Rotate a world direction into the local frame (orientation only)
    pub fn normal_to_local(&self, world: Vec3) -> Vec3 {
        (self.rotation.inverse() * world).normalize_or_zero()
    }

    /// Rotate a local direction into world space (orientation only)
    pub fn normal_to_world(&self, local: Vec3) -> Vec3 {
        (self.rotation * local).normalize_or_zero()
    }
}

/// Inverse of `matrix`, or `None` when it is singular. Tiny but non-zero
/// scales (a millimetre-authored model, nested unit conversions) invert fine.
pub fn invert(matrix: &Mat4) -> Option<Mat4> {
    let det = matrix.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inverse = matrix.inverse();
    inverse.is_finite().then_some(inverse)
}

pub fn to_local(scene: &SceneGraph, node: NodeKey, world: Vec3) -> Option<Vec3> {
    Frame::of(scene, node)?.to_local(world)
}

pub fn to_world(scene: &SceneGraph, node: NodeKey, local: Vec3) -> Option<Vec3> {
    Some(Frame::of(scene, node)?.to_world(local))
}

pub fn normal_to_local(scene: &SceneGraph, node: NodeKey, world: Vec3) -> Option<Vec3> {
    Some(Frame::of(scene, node)?.normal_to_local(world))
}

pub fn normal_to_world(scene: &SceneGraph, node: NodeKey, local: Vec3) -> Option<Vec3> {
    Some(Frame::of(scene, node)?.normal_to_world(local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeRole, NodeTransform, SceneNode};
    use glam::EulerRot;

    fn approx_eq(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-4 * (1.0 + b.length()))
    }

    #[test]
    fn test_round_trip_many_frames() {
        let translations = [Vec3::ZERO, Vec3::new(5.0, -2.0, 3.5), Vec3::new(-100.0, 0.25, 42.0)];
        let rotations = [
            Quat::IDENTITY,
            Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            Quat::from_euler(EulerRot::XYZ, 0.3, -1.2, 2.5),
        ];
        let scales = [Vec3::ONE, Vec3::splat(0.5), Vec3::new(2.0, 0.25, 7.0)];
        let points = [Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0), Vec3::new(-8.0, 0.1, 12.5)];

        for t in translations {
            for r in rotations {
                for s in scales {
                    let frame = Frame::from_trs(t, r, s);
                    for p in points {
                        let local = frame.to_local(p).unwrap();
                        let back = frame.to_world(local);
                        let tol = 1e-4 * (1.0 + p.length() + t.length());
                        assert!(back.abs_diff_eq(p, tol), "{t:?} {r:?} {s:?}: {p:?} -> {back:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_round_trip_small_scales() {
        let rotation = Quat::from_euler(EulerRot::XYZ, 0.3, -1.2, 2.5);
        for s in [Vec3::splat(0.001), Vec3::new(0.001, 0.01, 0.0001), Vec3::splat(1e-5)] {
            let frame = Frame::from_trs(Vec3::new(0.2, -0.1, 0.05), rotation, s);
            let p = Vec3::new(0.0005, 0.0002, -0.0003);
            let local = frame.to_local(p).unwrap();
            assert!(frame.to_world(local).abs_diff_eq(p, 1e-6), "{s:?}");
        }
        let mm = Frame::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::splat(0.001));
        assert!(approx_eq(mm.to_local(Vec3::new(0.0005, 0.0, 0.0)).unwrap(), Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn test_invert_rejects_singular() {
        assert!(invert(&Mat4::ZERO).is_none());
        assert!(invert(&Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0))).is_none());
        assert!(invert(&Mat4::from_scale(Vec3::splat(0.001))).is_some());
    }

    #[test]
    fn test_degenerate_frame_has_no_local() {
        let frame = Frame::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::new(1.0, 0.0, 1.0));
        assert!(frame.to_local(Vec3::ONE).is_none());
    }

    #[test]
    fn test_normals_ignore_translation_and_scale() {
        let frame = Frame::from_trs(
            Vec3::new(10.0, 10.0, 10.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(3.0, 1.0, 1.0),
        );
        assert!(approx_eq(frame.normal_to_world(Vec3::X), Vec3::Y));
        assert!(approx_eq(frame.normal_to_local(Vec3::Y), Vec3::X));
        let n = Vec3::new(0.3, -0.4, 0.866).normalize();
        assert!(approx_eq(frame.normal_to_world(frame.normal_to_local(n)), n));
    }

    #[test]
    fn test_scene_helpers_follow_current_transform() {
        let mut g = SceneGraph::new();
        let k = g.spawn(SceneNode::new("o", NodeRole::Object, NodeTransform::IDENTITY));
        let local = to_local(&g, k, Vec3::new(1.0, 0.0, 0.0)).unwrap();

        g.get_mut(k).unwrap().transform.translation = Vec3::new(5.0, 0.0, 0.0);
        let world = to_world(&g, k, local).unwrap();
        assert!(approx_eq(world, Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn test_scene_helpers_missing_node() {
        let mut g = SceneGraph::new();
        let k = g.spawn(SceneNode::new("o", NodeRole::Object, NodeTransform::IDENTITY));
        g.remove(k);
        assert!(to_local(&g, k, Vec3::ONE).is_none());
        assert!(to_world(&g, k, Vec3::ONE).is_none());
        assert!(normal_to_local(&g, k, Vec3::Y).is_none());
        assert!(normal_to_world(&g, k, Vec3::Y).is_none());
    }

    #[test]
    fn test_nested_frame_uses_parent_orientation() {
        let mut g = SceneGraph::new();
        let parent = g.spawn(SceneNode::new(
            "parent",
            NodeRole::Object,
            NodeTransform {
                translation: Vec3::ZERO,
                rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                scale: Vec3::ONE,
            },
        ));
        let child = g
            .spawn_child(
                parent,
                SceneNode::new(
                    "child",
                    NodeRole::Part,
                    NodeTransform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
                ),
            )
            .unwrap();
        // R_y(90°) maps +X to -Z
        let world = to_world(&g, child, Vec3::ZERO).unwrap();
        assert!(approx_eq(world, Vec3::new(0.0, 0.0, -1.0)));
        let n = normal_to_world(&g, child, Vec3::X).unwrap();
        assert!(approx_eq(n, Vec3::NEG_Z));
    }
}
