pub mod annotations;
pub mod mode;
pub mod selection;
pub mod settings;

pub use annotations::AnnotationStore;
pub use mode::{EditorState, ModeAction, PendingLine, Transition};
pub use selection::SelectionState;
pub use settings::EditorSettings;
