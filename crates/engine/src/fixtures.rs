//! Factory functions for creating test data.
//!
//! Model graphs shaped like what a host loader would report, plus a loader
//! that serves them, for unit tests, integration tests and the command
//! protocol.

use shared::{ModelMesh, ModelNode, Transform};

use crate::loader::{LoadError, ModelLoader, UploadFile};

// ── Meshes ──────────────────────────────────────────────────────

/// Axis-aligned unit cube centred on the origin, outward winding
pub fn unit_cube_mesh(color: [f32; 3]) -> ModelMesh {
    let positions = vec![
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ];
    #[rustfmt::skip]
    let indices = vec![
        4, 5, 6, 4, 6, 7, // +Z
        1, 0, 3, 1, 3, 2, // -Z
        5, 1, 2, 5, 2, 6, // +X
        0, 4, 7, 0, 7, 3, // -X
        7, 6, 2, 7, 2, 3, // +Y
        0, 1, 5, 0, 5, 4, // -Y
    ];
    ModelMesh {
        positions,
        indices,
        color,
    }
}

// ── Model graphs ────────────────────────────────────────────────

/// Leaf node carrying a unit cube at `position`
pub fn cube_node(name: &str, position: [f32; 3]) -> ModelNode {
    ModelNode {
        name: name.to_string(),
        transform: Transform::at(position),
        mesh: Some(unit_cube_mesh([0.8, 0.8, 0.8])),
        children: Vec::new(),
    }
}

/// Mesh-less root with two unit-cube parts at x = -1 ("left") and x = +1 ("right")
pub fn two_part_model() -> ModelNode {
    ModelNode {
        name: "assembly".to_string(),
        transform: Transform::new(),
        mesh: None,
        children: vec![
            cube_node("left", [-1.0, 0.0, 0.0]),
            cube_node("right", [1.0, 0.0, 0.0]),
        ],
    }
}

/// Root → group (offset by +2 on Y) → one unit-cube part
pub fn nested_model() -> ModelNode {
    ModelNode {
        name: "rig".to_string(),
        transform: Transform::new(),
        mesh: None,
        children: vec![ModelNode {
            name: "arm".to_string(),
            transform: Transform::at([0.0, 2.0, 0.0]),
            mesh: None,
            children: vec![cube_node("hand", [0.0, 0.0, 0.0])],
        }],
    }
}

/// Loader standing in for the host's file parsers. Every supported file
/// yields [`two_part_model`] named after the file; files whose name contains
/// "corrupt" fail to parse and files whose name contains "empty" have no
/// geometry.
#[derive(Default)]
pub struct FixtureLoader;

impl ModelLoader for FixtureLoader {
    fn load(&self, file: &UploadFile) -> Result<ModelNode, LoadError> {
        file.format()?;
        if file.name.contains("corrupt") {
            return Err(LoadError::Failed {
                file: file.name.clone(),
                reason: "unexpected end of data".to_string(),
            });
        }
        if file.name.contains("empty") {
            return Ok(ModelNode {
                name: file.name.clone(),
                transform: Transform::new(),
                mesh: None,
                children: Vec::new(),
            });
        }
        Ok(ModelNode {
            name: file.name.clone(),
            ..two_part_model()
        })
    }
}
