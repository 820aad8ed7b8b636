use glam::{Mat4, Vec3};
use shared::ObjectId;

use crate::mesh::MeshData;
use crate::registry::ObjectRegistry;
use crate::scene::{NodeKey, SceneGraph};
use crate::transform::invert;

/// A ray in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// The same ray expressed through `matrix` (parameter `t` is preserved)
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// AABB of a mesh's vertex positions; `None` for empty meshes
    pub fn from_mesh(data: &MeshData) -> Option<Self> {
        Self::from_points((0..data.vertex_count()).map(|i| data.position(i)))
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Bounding box of the eight transformed corners
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });
        // Eight corners are always present
        Self::from_points(corners.map(|c| matrix.transform_point3(c))).unwrap_or(*self)
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = Vec3::new(
        1.0 / ray.direction.x,
        1.0 / ray.direction.y,
        1.0 / ray.direction.z,
    );

    let t1 = (aabb.min.x - ray.origin.x) * inv_dir.x;
    let t2 = (aabb.max.x - ray.origin.x) * inv_dir.x;
    let t3 = (aabb.min.y - ray.origin.y) * inv_dir.y;
    let t4 = (aabb.max.y - ray.origin.y) * inv_dir.y;
    let t5 = (aabb.min.z - ray.origin.z) * inv_dir.z;
    let t6 = (aabb.max.z - ray.origin.z) * inv_dir.z;

    let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Möller-Trumbore ray-triangle intersection algorithm.
/// Returns the distance along the ray if hit, or None if no intersection.
pub fn ray_triangle_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    // Intersection is behind ray origin
    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

/// Result of picking a triangle in a mesh (mesh-local values)
#[derive(Clone, Debug)]
pub struct TriangleHit {
    /// Index of the triangle (into mesh.indices / 3)
    pub triangle_index: usize,
    /// Ray parameter of the hit
    pub distance: f32,
    /// Stored normal of the hit triangle
    pub normal: Vec3,
}

/// Find the nearest triangle in a mesh intersected by the ray.
pub fn pick_triangle(ray: &Ray, mesh: &MeshData) -> Option<TriangleHit> {
    let mut best: Option<TriangleHit> = None;

    for tri_idx in 0..mesh.triangle_count() {
        let Some([v0, v1, v2]) = mesh.triangle(tri_idx) else {
            continue;
        };
        if let Some(dist) = ray_triangle_intersect(ray, v0, v1, v2) {
            if best.as_ref().is_none_or(|b| dist < b.distance) {
                best = Some(TriangleHit {
                    triangle_index: tri_idx,
                    distance: dist,
                    normal: mesh.triangle_normal(tri_idx),
                });
            }
        }
    }

    best
}

/// A part hit in world space
#[derive(Clone, Debug)]
pub struct PartHit {
    /// The mesh-bearing node that was hit
    pub node: NodeKey,
    /// Ray parameter of the hit (comparable across parts for one ray)
    pub distance: f32,
    pub point: Vec3,
    /// World-space face normal
    pub normal: Vec3,
}

/// Nearest part under `root` (root included) hit by a world-space ray.
/// Overlay nodes are never considered.
pub fn pick_part(scene: &SceneGraph, root: NodeKey, ray: &Ray) -> Option<PartHit> {
    let mut best: Option<PartHit> = None;

    for key in scene.parts(root) {
        let Some(part) = scene.get(key).and_then(|n| n.mesh.as_ref()) else {
            continue;
        };
        let Some(world) = scene.world_matrix(key) else {
            continue;
        };
        let Some(inverse) = invert(&world) else {
            continue;
        };
        let local_ray = ray.transformed(&inverse);
        let Some(hit) = pick_triangle(&local_ray, &part.mesh) else {
            continue;
        };
        if best.as_ref().is_some_and(|b| b.distance <= hit.distance) {
            continue;
        }
        let rotation = scene.world_rotation(key).unwrap_or_default();
        best = Some(PartHit {
            node: key,
            distance: hit.distance,
            point: ray.at(hit.distance),
            normal: (rotation * hit.normal).normalize_or_zero(),
        });
    }

    best
}

/// Nearest hit across every registered object
#[derive(Clone, Debug)]
pub struct SceneHit {
    pub object_id: ObjectId,
    pub root: NodeKey,
    pub part: PartHit,
}

pub fn pick_scene(scene: &SceneGraph, registry: &ObjectRegistry, ray: &Ray) -> Option<SceneHit> {
    let mut best: Option<SceneHit> = None;

    for (id, root) in registry.iter() {
        if !scene.contains(root) {
            continue;
        }
        if let Some(hit) = pick_part(scene, root, ray) {
            if best.as_ref().is_none_or(|b| hit.distance < b.part.distance) {
                best = Some(SceneHit {
                    object_id: id.clone(),
                    root,
                    part: hit,
                });
            }
        }
    }

    best
}
