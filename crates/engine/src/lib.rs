// Library crate: the interaction and anchoring engine plus the headless
// harness and command protocol used by tests, the binary and the wasm facade.

pub mod command;
pub mod engine;
pub mod fixtures;
pub mod harness;
pub mod highlight;
pub mod interaction;
pub mod loader;
pub mod manipulator;
pub mod mesh;
pub mod picking;
pub mod registry;
pub mod scene;
pub mod snap;
pub mod state;
pub mod transform;

pub use engine::{Dispatch, Editor, EditorEvent, EditorNotice, FrameSnapshot, Key, ModeFlags, UiIntent};
