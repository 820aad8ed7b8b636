//! Editor controller.
//!
//! [`Editor`] owns every piece of mutable interaction state and is driven
//! through one entry point, [`Editor::dispatch`]. After each event it
//! re-syncs the derived views (highlight layers, manipulator) with the
//! selection, and queues [`EditorNotice`]s for the UI.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use shared::{
    InteractionMode, LineData, LineEnd, ModelNode, ObjectId, PointData, PointerButton, Primitive,
    Transform,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::highlight::HighlightController;
use crate::interaction::{InteractionAdapter, ObjectInteractions, PointerHit};
use crate::loader::{
    LoadError, ModelFormat, ModelLoader, PendingUpload, UploadFile, UploadTicket,
};
use crate::manipulator::{Axis, Manipulator};
use crate::picking::Ray;
use crate::registry::ObjectRegistry;
use crate::scene::{NodeKey, SceneGraph};
use crate::snap;
use crate::state::annotations::{resolve_end, AnnotationStore, ResolvedPoint, ResolvedSegment};
use crate::state::selection::SelectedNode;
use crate::state::settings::AnnotationSettings;
use crate::state::{EditorSettings, EditorState, ModeAction, Transition};

/// Toolbar / panel intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiIntent {
    AddPlane,
    AddBox,
    TogglePoint,
    ToggleLine,
    ToggleMove,
    ToggleEdit,
}

impl UiIntent {
    /// Mode toggled by this intent, if it is a toggle
    pub fn mode(&self) -> Option<InteractionMode> {
        match self {
            UiIntent::TogglePoint => Some(InteractionMode::PlacePoint),
            UiIntent::ToggleLine => Some(InteractionMode::PlaceLine),
            UiIntent::ToggleMove => Some(InteractionMode::Move),
            UiIntent::ToggleEdit => Some(InteractionMode::Edit),
            UiIntent::AddPlane | UiIntent::AddBox => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    Other,
}

impl Key {
    /// From a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// Everything the host can feed into the editor
#[derive(Debug, Clone)]
pub enum EditorEvent {
    Intent(UiIntent),
    PointerDown {
        hit: PointerHit,
        button: PointerButton,
    },
    /// `None` when the pointer is over empty space
    PointerMove {
        hit: Option<PointerHit>,
    },
    PointerMissed,
    ContextMenu,
    Key(Key),
    DragStart {
        axis: Option<Axis>,
    },
    /// Pointer-down that may land on a handle axis; starts a constrained drag
    GrabHandle {
        ray: Ray,
    },
    /// New proxy position reported by the manipulator handle
    Drag {
        proxy: Vec3,
    },
    DragEnd,
}

/// What the host has to do after an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// The event changed something
    pub handled: bool,
    /// Suppress the native context menu
    pub suppress_context_menu: bool,
}

/// Notifications for the UI, drained with [`Editor::drain_notices`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditorNotice {
    ModeChanged {
        from: InteractionMode,
        to: InteractionMode,
    },
    SelectionChanged {
        object_id: Option<ObjectId>,
    },
    PointAdded {
        point: PointData,
    },
    ChainStarted {
        start: LineEnd,
    },
    SegmentAdded {
        segment: LineData,
    },
    ChainCancelled,
    ObjectAdded {
        id: ObjectId,
        name: String,
    },
    /// Opaque "could not load" message; auto-dismissed by the UI
    LoadFailed {
        file: String,
        message: String,
    },
}

/// Toggle states for the tool panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeFlags {
    pub mode: InteractionMode,
    pub point_mode: bool,
    pub line_mode: bool,
    pub move_mode: bool,
    pub edit_mode: bool,
}

impl From<InteractionMode> for ModeFlags {
    fn from(mode: InteractionMode) -> Self {
        Self {
            mode,
            point_mode: mode == InteractionMode::PlacePoint,
            line_mode: mode == InteractionMode::PlaceLine,
            move_mode: mode == InteractionMode::Move,
            edit_mode: mode == InteractionMode::Edit,
        }
    }
}

/// World-space annotation state for one rendered frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub points: Vec<ResolvedPoint>,
    pub segments: Vec<ResolvedSegment>,
    /// In-progress segment from the chain start to the pointer
    pub preview: Option<ResolvedSegment>,
    /// Manipulator handle position while mounted
    pub manipulator: Option<[f32; 3]>,
    pub orbit_enabled: bool,
    /// How markers and lines are drawn
    pub style: AnnotationSettings,
}

pub struct Editor {
    scene: SceneGraph,
    registry: ObjectRegistry,
    /// Object ids in insertion order
    objects: Vec<ObjectId>,
    state: EditorState,
    annotations: AnnotationStore,
    manipulator: Manipulator,
    highlight: HighlightController,
    settings: EditorSettings,
    notices: Vec<EditorNotice>,
    uploads: HashMap<UploadTicket, PendingUpload>,
    next_ticket: u64,
    /// Selection version the derived views were last synced to
    synced_selection: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            scene: SceneGraph::new(),
            registry: ObjectRegistry::new(),
            objects: Vec::new(),
            state: EditorState::new(),
            annotations: AnnotationStore::new(),
            manipulator: Manipulator::new(),
            highlight: HighlightController::new(&settings.highlight),
            settings,
            notices: Vec::new(),
            uploads: HashMap::new(),
            next_ticket: 1,
            synced_selection: 0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    pub fn mode(&self) -> InteractionMode {
        self.state.mode()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn selection(&self) -> Option<&SelectedNode> {
        self.state.selection.primary()
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn manipulator(&self) -> &Manipulator {
        &self.manipulator
    }

    pub fn highlight(&self) -> &HighlightController {
        &self.highlight
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn mode_flags(&self) -> ModeFlags {
        ModeFlags::from(self.mode())
    }

    /// Guidance text for the active mode
    pub fn hint(&self) -> Option<&'static str> {
        match self.mode() {
            InteractionMode::Idle => None,
            InteractionMode::PlacePoint => Some("Click on an object to place a point"),
            InteractionMode::PlaceLine => {
                if self.state.pending().is_some_and(|p| p.is_open()) {
                    Some("Click to add the next point")
                } else {
                    Some("Click to set start of line")
                }
            }
            InteractionMode::Move => Some("Click an object to move it"),
            InteractionMode::Edit => Some("Click a part to edit it"),
        }
    }

    pub fn drain_notices(&mut self) -> Vec<EditorNotice> {
        std::mem::take(&mut self.notices)
    }

    // ── Events ────────────────────────────────────────────────

    pub fn dispatch(&mut self, event: EditorEvent) -> Dispatch {
        let mut out = Dispatch::default();
        match event {
            EditorEvent::Intent(intent) => {
                match intent {
                    UiIntent::AddPlane => {
                        self.add_plane();
                    }
                    UiIntent::AddBox => {
                        self.add_box();
                    }
                    toggle => {
                        if let Some(mode) = toggle.mode() {
                            self.apply_mode(ModeAction::Toggle(mode));
                        }
                    }
                }
                out.handled = true;
            }
            EditorEvent::PointerDown { hit, button } => {
                out.handled = self.pointer_down(&hit, button);
            }
            EditorEvent::PointerMove { hit } => {
                self.pointer_move(hit.as_ref());
                out.handled = hit.is_some();
            }
            EditorEvent::PointerMissed => {
                self.apply_mode(ModeAction::PointerMissed);
                out.handled = true;
            }
            EditorEvent::ContextMenu => {
                let t = self.apply_mode(ModeAction::ContextMenu);
                out.suppress_context_menu = t.suppress_context_menu;
                out.handled = true;
            }
            EditorEvent::Key(Key::Escape) => {
                self.apply_mode(ModeAction::Escape);
                out.handled = true;
            }
            EditorEvent::Key(Key::Other) => {}
            EditorEvent::DragStart { axis } => {
                out.handled = self.manipulator.begin_drag(axis);
            }
            EditorEvent::GrabHandle { ray } => {
                if let Some(axis) = self.manipulator.grab(&ray) {
                    debug!(?axis, "handle grabbed");
                    out.handled = true;
                }
            }
            EditorEvent::Drag { proxy } => {
                if self.manipulator.is_dragging() {
                    out.handled = self.manipulator.drag_to(&mut self.scene, proxy).is_some();
                }
            }
            EditorEvent::DragEnd => {
                out.handled = self.manipulator.is_dragging();
                self.manipulator.end_drag();
            }
        }
        self.sync();
        out
    }

    fn apply_mode(&mut self, action: ModeAction) -> Transition {
        let t = self.state.apply(action);
        if t.mode_changed() {
            self.notices.push(EditorNotice::ModeChanged {
                from: t.from,
                to: t.to,
            });
        }
        if t.chain_cancelled {
            self.notices.push(EditorNotice::ChainCancelled);
        }
        t
    }

    fn adapter_for(&self, object_id: &str) -> Option<InteractionAdapter> {
        let root = self
            .registry
            .resolve(object_id)
            .filter(|k| self.scene.contains(*k))?;
        Some(InteractionAdapter::new(object_id, root))
    }

    fn pointer_down(&mut self, hit: &PointerHit, button: PointerButton) -> bool {
        let Some(adapter) = self.adapter_for(&hit.object_id) else {
            debug!(object_id = %hit.object_id, "pointer down on unregistered object");
            return false;
        };
        let mode = self.state.mode();
        let mut session = Session {
            scene: &self.scene,
            registry: &self.registry,
            settings: &self.settings,
            state: &mut self.state,
            annotations: &mut self.annotations,
            notices: &mut self.notices,
        };
        adapter.pointer_down(&self.scene, mode, hit, button, &mut session)
    }

    fn pointer_move(&mut self, hit: Option<&PointerHit>) {
        let Some(adapter) = hit.and_then(|h| self.adapter_for(&h.object_id)) else {
            self.state.selection.set_hovered(None);
            if let Some(pending) = self.state.pending_mut() {
                pending.clear_temp_end();
            }
            return;
        };
        let Some(hit) = hit else {
            return;
        };
        let mode = self.state.mode();
        let mut session = Session {
            scene: &self.scene,
            registry: &self.registry,
            settings: &self.settings,
            state: &mut self.state,
            annotations: &mut self.annotations,
            notices: &mut self.notices,
        };
        adapter.pointer_move(&self.scene, mode, hit, &mut session);
    }

    /// Bring highlight layers and the manipulator in line with the selection
    fn sync(&mut self) {
        let mode = self.state.mode();
        let selected = self
            .state
            .selection
            .node()
            .filter(|k| self.scene.contains(*k));
        if selected.is_none() && self.state.selection.primary().is_some() {
            // Selected node was removed from the scene
            self.state.selection.clear();
        }
        let hovered = self
            .state
            .selection
            .hovered()
            .filter(|k| mode.is_manipulation() && self.scene.contains(*k));

        self.highlight.set_selected(&mut self.scene, selected);
        self.highlight.set_hovered(&mut self.scene, hovered);

        let version = self.state.selection.version();
        if version != self.synced_selection {
            self.synced_selection = version;
            match selected.filter(|_| mode.is_manipulation()) {
                Some(node) => {
                    self.manipulator.attach(&self.scene, node);
                }
                None => self.manipulator.detach(),
            }
            let object_id = self.state.selection.primary().map(|s| s.object_id.clone());
            debug!(?object_id, "selection changed");
            self.notices.push(EditorNotice::SelectionChanged { object_id });
        }
        if self.manipulator.is_mounted() && (selected.is_none() || !mode.is_manipulation()) {
            self.manipulator.detach();
        }
    }

    // ── Objects ───────────────────────────────────────────────

    pub fn add_plane(&mut self) -> ObjectId {
        let [width, height] = self.settings.primitives.plane_size;
        let color = self.settings.primitives.plane_color;
        self.add_primitive("Plane", &Primitive::Plane { width, height }, &Transform::new(), color)
    }

    pub fn add_box(&mut self) -> ObjectId {
        let [width, height, depth] = self.settings.primitives.box_size;
        let color = self.settings.primitives.box_color;
        self.add_primitive(
            "Box",
            &Primitive::Box {
                width,
                height,
                depth,
            },
            &Transform::new(),
            color,
        )
    }

    pub fn add_primitive(
        &mut self,
        name: &str,
        primitive: &Primitive,
        transform: &Transform,
        color: [f32; 3],
    ) -> ObjectId {
        let node = self.scene.spawn_primitive(name, primitive, transform, color);
        self.mount(node, name.to_string())
    }

    /// Instantiate a loaded model graph as a new object
    pub fn insert_model(&mut self, model: &ModelNode) -> ObjectId {
        let node = self.scene.spawn_model(model);
        self.mount(node, model.name.clone())
    }

    fn mount(&mut self, node: NodeKey, name: String) -> ObjectId {
        let id = Uuid::new_v4().to_string();
        self.registry.register(id.clone(), node);
        self.objects.push(id.clone());
        info!(%id, %name, "object added");
        self.notices.push(EditorNotice::ObjectAdded {
            id: id.clone(),
            name,
        });
        id
    }

    /// Unmount an object. Its annotations stay in the store and are skipped
    /// from then on.
    pub fn remove_object(&mut self, id: &str) -> bool {
        let Some(node) = self.registry.unregister(id) else {
            return false;
        };
        self.objects.retain(|o| o != id);
        if self.highlight.selected().is_some_and(|s| self.scene.is_within(node, s)) {
            self.highlight.set_selected(&mut self.scene, None);
        }
        if self.highlight.hovered().is_some_and(|h| self.scene.is_within(node, h)) {
            self.highlight.set_hovered(&mut self.scene, None);
        }
        self.scene.remove(node);
        info!(%id, "object removed");
        self.sync();
        true
    }

    /// Place an object's origin at a world position
    pub fn set_position(&mut self, id: &str, position: Vec3) -> bool {
        let Some(node) = self.registry.resolve(id) else {
            return false;
        };
        if !self.scene.set_world_translation(node, position) {
            return false;
        }
        if let Some(target) = self.manipulator.target() {
            if self.scene.is_within(node, target) {
                self.manipulator.attach(&self.scene, target);
            }
        }
        true
    }

    /// Current world position of an object's origin
    pub fn position_of(&self, id: &str) -> Option<Vec3> {
        self.scene.world_translation(self.registry.resolve(id)?)
    }

    // ── Uploads ───────────────────────────────────────────────

    /// Accept one file for loading. Unsupported formats are reported right
    /// away and get no ticket.
    pub fn begin_upload(&mut self, file_name: &str) -> Option<UploadTicket> {
        let format = match ModelFormat::detect(file_name) {
            Ok(format) => format,
            Err(e) => {
                self.report_load_failure(file_name, &e);
                return None;
            }
        };
        let ticket = UploadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.uploads.insert(
            ticket,
            PendingUpload {
                file_name: file_name.to_string(),
                format,
            },
        );
        debug!(?ticket, file = file_name, ?format, "upload started");
        Some(ticket)
    }

    /// One ticket per accepted file
    pub fn upload(&mut self, files: &[UploadFile]) -> Vec<UploadTicket> {
        files
            .iter()
            .filter_map(|f| self.begin_upload(&f.name))
            .collect()
    }

    /// Report the host's load result for `ticket`
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<ModelNode, LoadError>,
    ) -> Option<ObjectId> {
        let Some(pending) = self.uploads.remove(&ticket) else {
            warn!(?ticket, "result for unknown upload ticket");
            return None;
        };
        let model = result.and_then(|m| {
            if m.mesh_count() == 0 {
                Err(LoadError::Empty(pending.file_name.clone()))
            } else {
                Ok(m)
            }
        });
        match model {
            Ok(model) => Some(self.insert_model(&model)),
            Err(e) => {
                self.report_load_failure(&pending.file_name, &e);
                None
            }
        }
    }

    /// Upload and load synchronously through `loader`
    pub fn load_with(&mut self, loader: &impl ModelLoader, files: &[UploadFile]) -> Vec<ObjectId> {
        let mut added = Vec::new();
        for file in files {
            let Some(ticket) = self.begin_upload(&file.name) else {
                continue;
            };
            if let Some(id) = self.finish_upload(ticket, loader.load(file)) {
                added.push(id);
            }
        }
        added
    }

    pub fn pending_uploads(&self) -> usize {
        self.uploads.len()
    }

    fn report_load_failure(&mut self, file: &str, error: &LoadError) {
        warn!(file, "could not load model: {error}");
        self.notices.push(EditorNotice::LoadFailed {
            file: file.to_string(),
            message: error.to_string(),
        });
    }

    // ── Frame ─────────────────────────────────────────────────

    /// World-space view of all annotations against current transforms
    pub fn frame(&self) -> FrameSnapshot {
        let preview = self.state.pending().and_then(|p| {
            Some(ResolvedSegment {
                start: resolve_end(&self.scene, &self.registry, p.start()?)?.to_array(),
                end: resolve_end(&self.scene, &self.registry, p.temp_end()?)?.to_array(),
            })
        });
        FrameSnapshot {
            points: self.annotations.resolve_points(&self.scene, &self.registry),
            segments: self.annotations.resolve_segments(&self.scene, &self.registry),
            preview,
            manipulator: self.manipulator.position().map(|p| p.to_array()),
            orbit_enabled: self.manipulator.orbit_enabled(),
            style: self.settings.annotations.clone(),
        }
    }

    /// Drop all annotations. Host scripts only; the UI has no reset.
    pub fn reset_annotations(&mut self) {
        info!(
            points = self.annotations.points().len(),
            segments = self.annotations.segments().len(),
            "annotations reset"
        );
        self.annotations.reset();
    }
}

/// The controller's side of [`ObjectInteractions`], borrowing only the
/// fields a pointer callback may touch.
struct Session<'a> {
    scene: &'a SceneGraph,
    registry: &'a ObjectRegistry,
    settings: &'a EditorSettings,
    state: &'a mut EditorState,
    annotations: &'a mut AnnotationStore,
    notices: &'a mut Vec<EditorNotice>,
}

impl Session<'_> {
    /// Replace `end` with the nearest existing endpoint within the snap
    /// tolerance. A snapped end shares the anchor it snapped to.
    fn snapped(&self, end: LineEnd) -> LineEnd {
        let Some(world) = resolve_end(self.scene, self.registry, &end) else {
            return end;
        };
        let chain = self.state.pending().map(|p| p.chain()).unwrap_or_default();
        let pool = self.annotations.snap_pool(self.scene, self.registry, chain);
        let worlds: Vec<Vec3> = pool.iter().map(|t| t.world).collect();
        match snap::nearest_within(world, &worlds, self.settings.snap_tolerance()) {
            Some(i) => pool[i].end.clone(),
            None => end,
        }
    }
}

impl ObjectInteractions for Session<'_> {
    fn on_select(&mut self, node: NodeKey, object_id: &str) {
        self.state.selection.select(node, object_id);
    }

    fn on_add_point(&mut self, point: PointData) {
        info!(object_id = %point.object_id, position = ?point.position, "point added");
        self.annotations.add_point(point.clone());
        self.notices.push(EditorNotice::PointAdded { point });
    }

    fn on_add_line_point(&mut self, end: LineEnd) {
        let end = self.snapped(end);
        let Some(pending) = self.state.pending_mut() else {
            return;
        };
        match pending.push(end.clone()) {
            Some(segment) => {
                info!(start = ?segment.start.position, end = ?segment.end.position, "segment added");
                self.annotations.add_segment(segment.clone());
                self.notices.push(EditorNotice::SegmentAdded { segment });
            }
            None => {
                debug!(object_id = %end.object_id, "line chain started");
                self.notices.push(EditorNotice::ChainStarted { start: end });
            }
        }
    }

    fn on_update_temp_end(&mut self, end: LineEnd) {
        let end = self.snapped(end);
        if let Some(pending) = self.state.pending_mut() {
            pending.set_temp_end(end);
        }
    }

    fn on_hover(&mut self, node: Option<NodeKey>) {
        self.state.selection.set_hovered(node);
    }
}
