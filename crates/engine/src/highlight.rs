//! Selection and hover highlighting.
//!
//! Highlighting never touches anything the editor persists. The color-swap
//! strategy caches the original color in [`Material`]'s stash slot (empty
//! means "never highlighted"); the wireframe strategy attaches one tagged
//! overlay child per part. Turning either off restores the part exactly.

use std::collections::HashSet;

use crate::mesh;
use crate::scene::{Material, NodeKey, NodeRole, NodeTransform, SceneGraph, SceneNode, Wireframe};
use crate::state::settings::{HighlightSettings, HighlightStrategy};

const OVERLAY_NAME: &str = "highlight-overlay";

/// Capability surface the highlighter needs from a scene
pub trait Highlightable {
    /// Parts drawn for `root` (root included)
    fn drawable_parts(&self, root: NodeKey) -> Vec<NodeKey>;
    fn material_mut(&mut self, part: NodeKey) -> Option<&mut Material>;
    /// Tagged overlay attached to `part`, if any
    fn overlay_of(&self, part: NodeKey) -> Option<NodeKey>;
    /// Attach (or recolor) the overlay of `part`
    fn attach_overlay(&mut self, part: NodeKey, color: [f32; 3]);
    fn detach_overlay(&mut self, part: NodeKey);
}

impl Highlightable for SceneGraph {
    fn drawable_parts(&self, root: NodeKey) -> Vec<NodeKey> {
        self.parts(root)
    }

    fn material_mut(&mut self, part: NodeKey) -> Option<&mut Material> {
        self.get_mut(part)?.mesh.as_mut().map(|m| &mut m.material)
    }

    fn overlay_of(&self, part: NodeKey) -> Option<NodeKey> {
        self.get(part)?.children().iter().copied().find(|c| {
            self.get(*c)
                .is_some_and(|n| n.role == NodeRole::Overlay && n.name == OVERLAY_NAME)
        })
    }

    fn attach_overlay(&mut self, part: NodeKey, color: [f32; 3]) {
        if let Some(existing) = self.overlay_of(part) {
            if let Some(wire) = self.get_mut(existing).and_then(|n| n.wireframe.as_mut()) {
                wire.color = color;
            }
            return;
        }
        let Some(lines) = self
            .get(part)
            .and_then(|n| n.mesh.as_ref())
            .map(|m| mesh::wireframe(&m.mesh))
        else {
            return;
        };
        let mut overlay = SceneNode::new(OVERLAY_NAME, NodeRole::Overlay, NodeTransform::IDENTITY);
        overlay.wireframe = Some(Wireframe { lines, color });
        self.spawn_child(part, overlay);
    }

    fn detach_overlay(&mut self, part: NodeKey) {
        if let Some(overlay) = self.overlay_of(part) {
            self.remove(overlay);
        }
    }
}

/// Put the highlight color on a material, caching the original on first use
pub fn swap_color_on(material: &mut Material, color: [f32; 3]) {
    if material.stashed_color.is_none() {
        material.stashed_color = Some(material.color);
    }
    material.color = color;
}

/// Restore the cached original color; no-op if never highlighted
pub fn swap_color_off(material: &mut Material) {
    if let Some(original) = material.stashed_color.take() {
        material.color = original;
    }
}

/// Apply (`Some(color)`) or remove (`None`) the highlight on one part
pub fn set_part_highlight<S: Highlightable + ?Sized>(
    scene: &mut S,
    part: NodeKey,
    color: Option<[f32; 3]>,
    strategy: HighlightStrategy,
) {
    match (strategy, color) {
        (HighlightStrategy::ColorSwap, Some(c)) => {
            if let Some(m) = scene.material_mut(part) {
                swap_color_on(m, c);
            }
        }
        (HighlightStrategy::ColorSwap, None) => {
            if let Some(m) = scene.material_mut(part) {
                swap_color_off(m);
            }
        }
        (HighlightStrategy::Wireframe, Some(c)) => scene.attach_overlay(part, c),
        (HighlightStrategy::Wireframe, None) => scene.detach_overlay(part),
    }
}

/// Highlight (or un-highlight) every drawable part of `node`
pub fn set_highlight<S: Highlightable + ?Sized>(
    scene: &mut S,
    node: NodeKey,
    on: bool,
    strategy: HighlightStrategy,
    color: [f32; 3],
) {
    for part in scene.drawable_parts(node) {
        set_part_highlight(scene, part, on.then_some(color), strategy);
    }
}

/// Two independent highlight layers: selection and hover.
/// Where both cover a part, selection wins; dropping hover never clears a
/// selection highlight.
pub struct HighlightController {
    strategy: HighlightStrategy,
    selection_color: [f32; 3],
    hover_color: [f32; 3],
    selected: Option<NodeKey>,
    hovered: Option<NodeKey>,
}

impl HighlightController {
    pub fn new(settings: &HighlightSettings) -> Self {
        Self {
            strategy: settings.strategy,
            selection_color: settings.selection_color,
            hover_color: settings.hover_color,
            selected: None,
            hovered: None,
        }
    }

    pub fn strategy(&self) -> HighlightStrategy {
        self.strategy
    }

    pub fn selected(&self) -> Option<NodeKey> {
        self.selected
    }

    pub fn hovered(&self) -> Option<NodeKey> {
        self.hovered
    }

    pub fn set_selected<S: Highlightable + ?Sized>(&mut self, scene: &mut S, node: Option<NodeKey>) {
        if self.selected == node {
            return;
        }
        let previous = std::mem::replace(&mut self.selected, node);
        self.refresh(scene, [previous, node]);
    }

    pub fn set_hovered<S: Highlightable + ?Sized>(&mut self, scene: &mut S, node: Option<NodeKey>) {
        if self.hovered == node {
            return;
        }
        let previous = std::mem::replace(&mut self.hovered, node);
        self.refresh(scene, [previous, node]);
    }

    /// Remove both layers
    pub fn clear<S: Highlightable + ?Sized>(&mut self, scene: &mut S) {
        let touched = [self.selected.take(), self.hovered.take()];
        self.refresh(scene, touched);
    }

    /// Re-apply the desired state to every part under the touched nodes
    fn refresh<S: Highlightable + ?Sized>(&self, scene: &mut S, touched: [Option<NodeKey>; 2]) {
        let selected_parts = self.selected.map(|n| scene.drawable_parts(n)).unwrap_or_default();
        let hovered_parts = self.hovered.map(|n| scene.drawable_parts(n)).unwrap_or_default();

        // Old and new nodes may overlap (a root and one of its parts)
        let mut seen = HashSet::new();
        let parts: Vec<NodeKey> = touched
            .into_iter()
            .flatten()
            .flat_map(|n| scene.drawable_parts(n))
            .filter(|p| seen.insert(*p))
            .collect();

        for part in parts {
            let color = if selected_parts.contains(&part) {
                Some(self.selection_color)
            } else if hovered_parts.contains(&part) {
                Some(self.hover_color)
            } else {
                None
            };
            set_part_highlight(scene, part, color, self.strategy);
        }
    }
}
