//! Headless test harness for programmatic scene interaction.
//!
//! Plays the rendering layer's part: pointer events are synthesised from
//! world-space rays picked against the scene graph, then fed to the editor.

use glam::Vec3;
use shared::{ModelNode, ObjectId, PointerButton};

use crate::engine::{Dispatch, Editor, EditorEvent, FrameSnapshot, Key, UiIntent};
use crate::interaction::PointerHit;
use crate::picking::{pick_scene, Ray};
use crate::state::EditorSettings;

/// Height rays are cast from by the top-down helpers
const CAST_HEIGHT: f32 = 100.0;

/// Headless harness around an [`Editor`]
pub struct TestHarness {
    pub editor: Editor,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Create a new empty harness with default settings.
    pub fn new() -> Self {
        Self::with_settings(EditorSettings::default())
    }

    pub fn with_settings(settings: EditorSettings) -> Self {
        Self {
            editor: Editor::new(settings),
        }
    }

    // ── Scene manipulation ────────────────────────────────────

    pub fn add_plane(&mut self) -> ObjectId {
        self.editor.add_plane()
    }

    pub fn add_box(&mut self) -> ObjectId {
        self.editor.add_box()
    }

    /// Add a box and move its origin to `position`
    pub fn add_box_at(&mut self, position: Vec3) -> ObjectId {
        let id = self.editor.add_box();
        self.editor.set_position(&id, position);
        id
    }

    pub fn insert_model(&mut self, model: &ModelNode) -> ObjectId {
        self.editor.insert_model(model)
    }

    pub fn object_count(&self) -> usize {
        self.editor.objects().len()
    }

    pub fn position_of(&self, id: &str) -> Option<Vec3> {
        self.editor.position_of(id)
    }

    // ── Input ─────────────────────────────────────────────────

    pub fn intent(&mut self, intent: UiIntent) -> Dispatch {
        self.editor.dispatch(EditorEvent::Intent(intent))
    }

    /// Nearest registered object under `ray`, as the renderer would report it
    pub fn cast(&self, ray: Ray) -> Option<PointerHit> {
        let hit = pick_scene(self.editor.scene(), self.editor.registry(), &ray)?;
        Some(PointerHit {
            object_id: hit.object_id,
            node: hit.part.node,
            point: hit.part.point,
            normal: Some(hit.part.normal),
            ray: Some(ray),
        })
    }

    /// Pointer-down along `ray`; a ray that hits nothing is a missed click
    pub fn click_ray(&mut self, ray: Ray, button: PointerButton) -> Dispatch {
        match self.cast(ray) {
            Some(hit) => self.editor.dispatch(EditorEvent::PointerDown { hit, button }),
            None => self.editor.dispatch(EditorEvent::PointerMissed),
        }
    }

    /// Primary click straight down onto (x, z)
    pub fn click_at(&mut self, x: f32, z: f32) -> Dispatch {
        self.click_ray(top_down(x, z), PointerButton::Primary)
    }

    pub fn hover_ray(&mut self, ray: Ray) -> Dispatch {
        let hit = self.cast(ray);
        self.editor.dispatch(EditorEvent::PointerMove { hit })
    }

    pub fn hover_at(&mut self, x: f32, z: f32) -> Dispatch {
        self.hover_ray(top_down(x, z))
    }

    pub fn context_menu(&mut self) -> Dispatch {
        self.editor.dispatch(EditorEvent::ContextMenu)
    }

    pub fn escape(&mut self) -> Dispatch {
        self.editor.dispatch(EditorEvent::Key(Key::Escape))
    }

    /// Full manipulator gesture: grab, move the handle by `delta`, release
    pub fn drag_manipulator_by(&mut self, delta: Vec3) -> bool {
        let Some(start) = self.editor.manipulator().position() else {
            return false;
        };
        self.editor.dispatch(EditorEvent::DragStart { axis: None });
        let moved = self
            .editor
            .dispatch(EditorEvent::Drag {
                proxy: start + delta,
            })
            .handled;
        self.editor.dispatch(EditorEvent::DragEnd);
        moved
    }

    /// Pointer-down on the manipulator along `ray`
    pub fn grab_handle(&mut self, ray: Ray) -> Dispatch {
        self.editor.dispatch(EditorEvent::GrabHandle { ray })
    }

    /// Grab the handle axis under `ray`, move the handle by `delta`, release.
    /// Returns false when `ray` misses every axis.
    pub fn drag_handle_along(&mut self, ray: Ray, delta: Vec3) -> bool {
        let Some(start) = self.editor.manipulator().position() else {
            return false;
        };
        if !self.grab_handle(ray).handled {
            return false;
        }
        self.editor.dispatch(EditorEvent::Drag {
            proxy: start + delta,
        });
        self.editor.dispatch(EditorEvent::DragEnd);
        true
    }

    pub fn frame(&self) -> FrameSnapshot {
        self.editor.frame()
    }
}

/// Ray pointing straight down onto (x, z)
pub fn top_down(x: f32, z: f32) -> Ray {
    Ray::new(Vec3::new(x, CAST_HEIGHT, z), Vec3::NEG_Y)
}
