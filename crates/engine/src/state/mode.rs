//! Mode state machine.
//!
//! [`EditorState`] is the single owned record for interaction state. Every
//! mode change and cancellation goes through [`EditorState::apply`], which
//! reports what it did as a [`Transition`] so the controller can re-sync
//! highlight and manipulator and emit notices.

use shared::{InteractionMode, LineData, LineEnd};
use tracing::debug;

use super::selection::SelectionState;

/// Line chain in progress. Only exists while the mode is `PlaceLine`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingLine {
    /// Where the next segment starts; `None` until the first click
    start: Option<LineEnd>,
    /// Preview end under the pointer
    temp_end: Option<LineEnd>,
    /// Points placed so far in this chain (part of the snap pool)
    chain: Vec<LineEnd>,
}

impl PendingLine {
    pub fn start(&self) -> Option<&LineEnd> {
        self.start.as_ref()
    }

    pub fn temp_end(&self) -> Option<&LineEnd> {
        self.temp_end.as_ref()
    }

    pub fn chain(&self) -> &[LineEnd] {
        &self.chain
    }

    pub fn is_open(&self) -> bool {
        self.start.is_some()
    }

    /// Add a clicked point. The first point opens the chain; every later one
    /// closes a segment from the current start and becomes the new start.
    pub fn push(&mut self, end: LineEnd) -> Option<LineData> {
        self.temp_end = None;
        self.chain.push(end.clone());
        let previous = self.start.replace(end.clone())?;
        Some(LineData {
            start: previous,
            end,
        })
    }

    /// Preview end; ignored while no chain is open
    pub fn set_temp_end(&mut self, end: LineEnd) -> bool {
        if self.start.is_none() {
            return false;
        }
        self.temp_end = Some(end);
        true
    }

    /// Pointer left every object: nothing to preview
    pub fn clear_temp_end(&mut self) -> bool {
        self.temp_end.take().is_some()
    }

    /// Drop the chain. Returns true if one was open.
    pub fn reset(&mut self) -> bool {
        let was_open = self.is_open();
        *self = Self::default();
        was_open
    }
}

/// Inputs the mode machine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeAction {
    /// Toolbar toggle; toggling the active mode returns to `Idle`
    Toggle(InteractionMode),
    Escape,
    PointerMissed,
    ContextMenu,
}

/// What a single [`EditorState::apply`] call changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: InteractionMode,
    pub to: InteractionMode,
    pub selection_cleared: bool,
    /// An open line chain was dropped without emitting a segment
    pub chain_cancelled: bool,
    /// The host must suppress its native context menu
    pub suppress_context_menu: bool,
}

impl Transition {
    pub fn mode_changed(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Default)]
pub struct EditorState {
    mode: InteractionMode,
    pub selection: SelectionState,
    pending: Option<PendingLine>,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn pending(&self) -> Option<&PendingLine> {
        self.pending.as_ref()
    }

    pub fn pending_mut(&mut self) -> Option<&mut PendingLine> {
        self.pending.as_mut()
    }

    pub fn apply(&mut self, action: ModeAction) -> Transition {
        let from = self.mode;
        let mut t = Transition {
            from,
            to: from,
            selection_cleared: false,
            chain_cancelled: false,
            suppress_context_menu: false,
        };

        match action {
            ModeAction::Toggle(mode) => {
                let target = if mode == from {
                    InteractionMode::Idle
                } else {
                    mode
                };
                self.enter(target, &mut t);
            }
            ModeAction::Escape => {
                t.selection_cleared = self.selection.clear();
                if from.is_placement() || from.is_manipulation() {
                    self.enter(InteractionMode::Idle, &mut t);
                }
            }
            ModeAction::PointerMissed => {
                t.selection_cleared = self.selection.clear();
                t.chain_cancelled = self.reset_chain();
            }
            ModeAction::ContextMenu => {
                t.suppress_context_menu = true;
                t.selection_cleared = self.selection.clear();
                match from {
                    InteractionMode::PlacePoint => self.enter(InteractionMode::Idle, &mut t),
                    InteractionMode::PlaceLine => t.chain_cancelled = self.reset_chain(),
                    _ => {}
                }
            }
        }

        t.to = self.mode;
        if t.mode_changed() || t.chain_cancelled {
            debug!(?action, from = ?t.from, to = ?t.to, chain_cancelled = t.chain_cancelled, "mode transition");
        }
        t
    }

    /// Switch modes. Selection and any pending line never survive a switch;
    /// entering `PlaceLine` always starts from a fresh chain.
    fn enter(&mut self, mode: InteractionMode, t: &mut Transition) {
        if let Some(pending) = self.pending.take() {
            t.chain_cancelled |= pending.is_open();
        }
        t.selection_cleared |= self.selection.clear();
        self.mode = mode;
        if mode == InteractionMode::PlaceLine {
            self.pending = Some(PendingLine::default());
        }
    }

    fn reset_chain(&mut self) -> bool {
        self.pending.as_mut().is_some_and(PendingLine::reset)
    }
}
