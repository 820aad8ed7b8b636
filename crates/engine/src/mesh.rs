use std::collections::HashSet;

use glam::Vec3;
use shared::ModelMesh;

/// Floats per vertex in [`MeshData::vertices`]: position(3) + normal(3)
pub const STRIDE: usize = 6;

/// CPU-side mesh data: interleaved [pos.x, pos.y, pos.z, norm.x, norm.y, norm.z]
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let base = index * STRIDE;
        Vec3::new(
            self.vertices[base],
            self.vertices[base + 1],
            self.vertices[base + 2],
        )
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        let base = index * STRIDE;
        Vec3::new(
            self.vertices[base + 3],
            self.vertices[base + 4],
            self.vertices[base + 5],
        )
    }

    /// Corner positions of a triangle. Out-of-range indices yield `None`.
    pub fn triangle(&self, tri_idx: usize) -> Option<[Vec3; 3]> {
        let count = self.vertex_count();
        let i = self.indices.get(tri_idx * 3..tri_idx * 3 + 3)?;
        if i.iter().any(|&v| v as usize >= count) {
            return None;
        }
        Some([
            self.position(i[0] as usize),
            self.position(i[1] as usize),
            self.position(i[2] as usize),
        ])
    }

    /// Stored normal of a triangle (normal of its first vertex)
    pub fn triangle_normal(&self, tri_idx: usize) -> Vec3 {
        self.normal(self.indices[tri_idx * 3] as usize)
    }

    /// Build flat-shaded mesh data from a loader mesh.
    /// Every triangle gets its own three vertices so normals stay per-face.
    pub fn from_model(mesh: &ModelMesh) -> Self {
        let mut vertices = Vec::with_capacity(mesh.indices.len() * STRIDE);
        let mut indices = Vec::with_capacity(mesh.indices.len());

        for tri in mesh.indices.chunks_exact(3) {
            let Some(corners) = tri
                .iter()
                .map(|&i| mesh.positions.get(i as usize).copied().map(Vec3::from))
                .collect::<Option<Vec<_>>>()
            else {
                continue;
            };
            let n = (corners[1] - corners[0])
                .cross(corners[2] - corners[0])
                .normalize_or_zero();
            let base = (vertices.len() / STRIDE) as u32;
            for c in &corners {
                push_vert(&mut vertices, c.x, c.y, c.z, n);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        MeshData { vertices, indices }
    }
}

/// Lines mesh: interleaved [pos.x, pos.y, pos.z], two vertices per segment
#[derive(Clone, Debug, PartialEq)]
pub struct LineMeshData {
    pub vertices: Vec<f32>,
}

impl LineMeshData {
    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 6
    }
}

// ── Primitive generation ─────────────────────────────────────

/// Plane in the local XY plane facing +Z.
/// Scene code rotates it -90° about X so it lies flat.
pub fn plane(w: f32, h: f32) -> MeshData {
    let hw = w * 0.5;
    let hh = h * 0.5;
    let n = Vec3::Z;

    let mut vertices = Vec::with_capacity(4 * STRIDE);
    push_vert(&mut vertices, -hw, -hh, 0.0, n);
    push_vert(&mut vertices, hw, -hh, 0.0, n);
    push_vert(&mut vertices, hw, hh, 0.0, n);
    push_vert(&mut vertices, -hw, hh, 0.0, n);

    MeshData {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

pub fn cube(w: f32, h: f32, d: f32) -> MeshData {
    let hw = w * 0.5;
    let hh = h * 0.5;
    let hd = d * 0.5;

    let faces: [([Vec3; 4], Vec3); 6] = [
        // Front (+Z)
        ([Vec3::new(-hw, -hh, hd), Vec3::new(hw, -hh, hd), Vec3::new(hw, hh, hd), Vec3::new(-hw, hh, hd)], Vec3::Z),
        // Back (-Z)
        ([Vec3::new(hw, -hh, -hd), Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, hh, -hd), Vec3::new(hw, hh, -hd)], Vec3::NEG_Z),
        // Right (+X)
        ([Vec3::new(hw, -hh, hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, hh, -hd), Vec3::new(hw, hh, hd)], Vec3::X),
        // Left (-X)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, -hh, hd), Vec3::new(-hw, hh, hd), Vec3::new(-hw, hh, -hd)], Vec3::NEG_X),
        // Top (+Y)
        ([Vec3::new(-hw, hh, hd), Vec3::new(hw, hh, hd), Vec3::new(hw, hh, -hd), Vec3::new(-hw, hh, -hd)], Vec3::Y),
        // Bottom (-Y)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, -hh, hd), Vec3::new(-hw, -hh, hd)], Vec3::NEG_Y),
    ];

    let mut vertices = Vec::with_capacity(24 * STRIDE);
    let mut indices = Vec::with_capacity(36);

    for (quad, normal) in &faces {
        let base = (vertices.len() / STRIDE) as u32;
        for v in quad {
            push_vert(&mut vertices, v.x, v.y, v.z, *normal);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

/// Unique triangle edges of a mesh as a line list (wireframe overlay geometry).
/// Edges shared by two triangles are emitted once.
pub fn wireframe(mesh: &MeshData) -> LineMeshData {
    let mut seen: HashSet<([i32; 3], [i32; 3])> = HashSet::new();
    let mut vertices = Vec::new();

    for tri_idx in 0..mesh.triangle_count() {
        let Some(corners) = mesh.triangle(tri_idx) else {
            continue;
        };
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            let (ka, kb) = (quantize(corners[a]), quantize(corners[b]));
            let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
            if seen.insert(key) {
                push_line_vert(&mut vertices, corners[a]);
                push_line_vert(&mut vertices, corners[b]);
            }
        }
    }

    LineMeshData { vertices }
}

// ── Helpers ──────────────────────────────────────────────────

fn push_vert(v: &mut Vec<f32>, px: f32, py: f32, pz: f32, n: Vec3) {
    v.extend_from_slice(&[px, py, pz, n.x, n.y, n.z]);
}

fn push_line_vert(v: &mut Vec<f32>, p: Vec3) {
    v.extend_from_slice(&[p.x, p.y, p.z]);
}

fn quantize(p: Vec3) -> [i32; 3] {
    [
        (p.x * 1000.0).round() as i32,
        (p.y * 1000.0).round() as i32,
        (p.z * 1000.0).round() as i32,
    ]
}
