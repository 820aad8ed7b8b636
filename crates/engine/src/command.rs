//! JSON command protocol.
//!
//! Lets a host script (or the headless binary) drive the editor with rays
//! instead of a live renderer.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use shared::{ModelNode, PointerButton};

use crate::engine::{EditorEvent, Key, UiIntent};
use crate::harness::TestHarness;
use crate::picking::Ray;

/// A command the host can execute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    AddPlane,
    AddBox,
    /// Instantiate a model graph as if a loader had produced it
    InsertModel {
        model: ModelNode,
    },
    TogglePoint,
    ToggleLine,
    ToggleMove,
    ToggleEdit,
    /// Pointer-down along a world-space ray; a ray that hits nothing is a miss
    PointerDown {
        origin: [f32; 3],
        direction: [f32; 3],
        #[serde(default)]
        button: PointerButton,
    },
    PointerMove {
        origin: [f32; 3],
        direction: [f32; 3],
    },
    PointerMissed,
    ContextMenu,
    /// Key press, DOM `KeyboardEvent.key` naming
    Key {
        key: String,
    },
    /// Start a drag. With a ray, the handle axis under it constrains the
    /// drag and a ray that misses every axis starts nothing.
    DragStart {
        #[serde(default)]
        origin: Option<[f32; 3]>,
        #[serde(default)]
        direction: Option<[f32; 3]>,
    },
    /// Move the manipulator handle to `position`
    Drag {
        position: [f32; 3],
    },
    DragEnd,
    /// Place an object's origin at a world position
    SetPosition {
        id: String,
        position: [f32; 3],
    },
    /// World-space annotation snapshot
    Frame,
    /// Drop every committed annotation
    ResetAnnotations,
    /// Inspect the editor: mode, objects, annotation counts.
    Inspect,
    /// Drain pending UI notices
    Notices,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }

    fn from_serialized<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(data) => Self::ok_with_data(data),
            Err(e) => Self::err(format!("Serialization failed: {e}")),
        }
    }
}

fn mode_response(harness: &TestHarness) -> CommandResponse {
    let editor = &harness.editor;
    CommandResponse::ok_with_data(serde_json::json!({
        "flags": editor.mode_flags(),
        "hint": editor.hint(),
    }))
}

/// Execute a single command on the harness.
pub fn execute_command(harness: &mut TestHarness, cmd: EditorCommand) -> CommandResponse {
    match cmd {
        EditorCommand::AddPlane => {
            let id = harness.add_plane();
            CommandResponse::ok_with_data(serde_json::json!({ "id": id }))
        }

        EditorCommand::AddBox => {
            let id = harness.add_box();
            CommandResponse::ok_with_data(serde_json::json!({ "id": id }))
        }

        EditorCommand::InsertModel { model } => {
            let id = harness.insert_model(&model);
            CommandResponse::ok_with_data(serde_json::json!({ "id": id }))
        }

        EditorCommand::TogglePoint => {
            harness.intent(UiIntent::TogglePoint);
            mode_response(harness)
        }

        EditorCommand::ToggleLine => {
            harness.intent(UiIntent::ToggleLine);
            mode_response(harness)
        }

        EditorCommand::ToggleMove => {
            harness.intent(UiIntent::ToggleMove);
            mode_response(harness)
        }

        EditorCommand::ToggleEdit => {
            harness.intent(UiIntent::ToggleEdit);
            mode_response(harness)
        }

        EditorCommand::PointerDown {
            origin,
            direction,
            button,
        } => {
            let ray = Ray::new(Vec3::from(origin), Vec3::from(direction));
            let hit = harness.cast(ray).map(|h| h.object_id);
            let d = harness.click_ray(ray, button);
            CommandResponse::ok_with_data(serde_json::json!({
                "handled": d.handled,
                "hit": hit,
                "mode": harness.editor.mode(),
            }))
        }

        EditorCommand::PointerMove { origin, direction } => {
            let d = harness.hover_ray(Ray::new(Vec3::from(origin), Vec3::from(direction)));
            CommandResponse::ok_with_data(serde_json::json!({ "handled": d.handled }))
        }

        EditorCommand::PointerMissed => {
            harness.editor.dispatch(EditorEvent::PointerMissed);
            mode_response(harness)
        }

        EditorCommand::ContextMenu => {
            let d = harness.context_menu();
            CommandResponse::ok_with_data(serde_json::json!({
                "suppress_context_menu": d.suppress_context_menu,
                "mode": harness.editor.mode(),
            }))
        }

        EditorCommand::Key { key } => {
            harness.editor.dispatch(EditorEvent::Key(Key::from_dom(&key)));
            mode_response(harness)
        }

        EditorCommand::DragStart { origin, direction } => {
            if !harness.editor.manipulator().is_mounted() {
                return CommandResponse::err("No manipulator is mounted");
            }
            let event = match (origin, direction) {
                (Some(origin), Some(direction)) => EditorEvent::GrabHandle {
                    ray: Ray::new(Vec3::from(origin), Vec3::from(direction)),
                },
                _ => EditorEvent::DragStart { axis: None },
            };
            if !harness.editor.dispatch(event).handled {
                return CommandResponse::err("No handle under the pointer");
            }
            let manipulator = harness.editor.manipulator();
            CommandResponse::ok_with_data(serde_json::json!({
                "axis": manipulator.active_axis(),
                "orbit_enabled": manipulator.orbit_enabled(),
            }))
        }

        EditorCommand::Drag { position } => {
            let d = harness.editor.dispatch(EditorEvent::Drag {
                proxy: Vec3::from(position),
            });
            if !d.handled {
                return CommandResponse::err("No drag in progress");
            }
            let target = harness.editor.selection().map(|s| s.object_id.clone());
            let object_position = target
                .as_deref()
                .and_then(|id| harness.position_of(id))
                .map(|p| p.to_array());
            CommandResponse::ok_with_data(serde_json::json!({
                "object_id": target,
                "position": object_position,
            }))
        }

        EditorCommand::DragEnd => {
            harness.editor.dispatch(EditorEvent::DragEnd);
            CommandResponse::ok_with_data(serde_json::json!({
                "orbit_enabled": harness.editor.manipulator().orbit_enabled(),
            }))
        }

        EditorCommand::SetPosition { id, position } => {
            if harness.editor.set_position(&id, Vec3::from(position)) {
                CommandResponse::ok_with_data(serde_json::json!({ "id": id }))
            } else {
                CommandResponse::err(format!("Object '{id}' not found"))
            }
        }

        EditorCommand::Frame => CommandResponse::from_serialized(&harness.frame()),

        EditorCommand::ResetAnnotations => {
            harness.editor.reset_annotations();
            CommandResponse::ok_with_data(serde_json::json!({ "point_count": 0, "segment_count": 0 }))
        }

        EditorCommand::Inspect => {
            let editor = &harness.editor;
            let objects: Vec<serde_json::Value> = editor
                .objects()
                .iter()
                .map(|id| {
                    let node = editor.registry().resolve(id);
                    let name = node
                        .and_then(|k| editor.scene().get(k))
                        .map(|n| n.name.clone());
                    let parts = node.map(|k| editor.scene().parts(k).len()).unwrap_or(0);
                    serde_json::json!({
                        "id": id,
                        "name": name,
                        "position": editor.position_of(id).map(|p| p.to_array()),
                        "part_count": parts,
                        "annotation_count": editor.annotations().count_for(id),
                    })
                })
                .collect();
            CommandResponse::ok_with_data(serde_json::json!({
                "mode": editor.mode(),
                "hint": editor.hint(),
                "object_count": objects.len(),
                "objects": objects,
                "point_count": editor.annotations().points().len(),
                "segment_count": editor.annotations().segments().len(),
                "selection": editor.selection().map(|s| s.object_id.clone()),
                "chain_open": editor.state().pending().is_some_and(|p| p.is_open()),
            }))
        }

        EditorCommand::Notices => {
            let notices = harness.editor.drain_notices();
            CommandResponse::from_serialized(&notices)
        }
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json(harness: &mut TestHarness, json: &str) -> Result<CommandResponse, String> {
    let cmd: EditorCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(harness, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch(
    harness: &mut TestHarness,
    json: &str,
) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<EditorCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds
        .into_iter()
        .map(|cmd| execute_command(harness, cmd))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serde_unit() {
        let cmd: EditorCommand = serde_json::from_str(r#"{"command": "toggle_line"}"#).unwrap();
        assert!(matches!(cmd, EditorCommand::ToggleLine));
    }

    #[test]
    fn test_command_serde_pointer_down_default_button() {
        let json = r#"{"command": "pointer_down", "origin": [0, 10, 0], "direction": [0, -1, 0]}"#;
        let cmd: EditorCommand = serde_json::from_str(json).unwrap();
        match cmd {
            EditorCommand::PointerDown { button, origin, .. } => {
                assert_eq!(button, PointerButton::Primary);
                assert_eq!(origin, [0.0, 10.0, 0.0]);
            }
            _ => panic!("Expected PointerDown"),
        }
    }

    #[test]
    fn test_command_serde_secondary_button() {
        let json = r#"{"command": "pointer_down", "origin": [0, 10, 0], "direction": [0, -1, 0], "button": "secondary"}"#;
        let cmd: EditorCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(
            cmd,
            EditorCommand::PointerDown {
                button: PointerButton::Secondary,
                ..
            }
        ));
    }

    #[test]
    fn test_command_serde_key() {
        let cmd: EditorCommand =
            serde_json::from_str(r#"{"command": "key", "key": "Escape"}"#).unwrap();
        assert!(matches!(cmd, EditorCommand::Key { key } if key == "Escape"));
    }

    #[test]
    fn test_invalid_json() {
        let mut h = TestHarness::new();
        assert!(execute_json(&mut h, "not json").is_err());
        assert!(execute_json(&mut h, r#"{"command": "explode"}"#).is_err());
    }

    #[test]
    fn test_set_position_unknown_object() {
        let mut h = TestHarness::new();
        let resp = execute_json(
            &mut h,
            r#"{"command": "set_position", "id": "nope", "position": [1, 2, 3]}"#,
        )
        .unwrap();
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("nope"));
    }

    #[test]
    fn test_drag_start_without_selection_fails() {
        let mut h = TestHarness::new();
        let resp = execute_json(&mut h, r#"{"command": "drag_start"}"#).unwrap();
        assert!(!resp.success);
    }
}
