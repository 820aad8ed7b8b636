//! Scene graph: a generational arena of transform-bearing nodes.
//!
//! This is the engine's view of the rendering layer. Nodes are addressed by
//! [`NodeKey`]; removing a node bumps its slot generation so every key that
//! still points at it resolves to `None` instead of aliasing a new node.

use std::f32::consts::FRAC_PI_2;

use glam::{EulerRot, Mat4, Quat, Vec3};
use shared::{ModelNode, Primitive, Transform};

use crate::mesh::{self, LineMeshData, MeshData};
use crate::picking::Aabb;
use crate::transform::Frame;

/// Handle to a node in a [`SceneGraph`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey {
    index: u32,
    generation: u32,
}

/// Local translation / rotation / scale of a node relative to its parent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl NodeTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<&Transform> for NodeTransform {
    fn from(t: &Transform) -> Self {
        let [rx, ry, rz] = t.rotation;
        Self {
            translation: Vec3::from(t.position),
            rotation: Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
            scale: Vec3::from(t.scale),
        }
    }
}

/// What a node represents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
    /// Root of a registered scene object
    Object,
    /// Transform-only node inside a model hierarchy
    Group,
    /// Mesh-bearing node inside a model hierarchy
    Part,
    /// Highlight overlay, never picked and never enumerated as a part
    Overlay,
}

/// Surface material. `stashed_color` holds the pre-highlight color while a
/// color-swap highlight is applied; `None` means "not highlighted".
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub(crate) stashed_color: Option<[f32; 3]>,
}

impl Material {
    pub fn new(color: [f32; 3]) -> Self {
        Self {
            color,
            stashed_color: None,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.stashed_color.is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshPart {
    pub mesh: MeshData,
    pub material: Material,
}

/// Wireframe line geometry attached to an overlay node
#[derive(Clone, Debug, PartialEq)]
pub struct Wireframe {
    pub lines: LineMeshData,
    pub color: [f32; 3],
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: NodeTransform,
    pub role: NodeRole,
    pub mesh: Option<MeshPart>,
    pub wireframe: Option<Wireframe>,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, role: NodeRole, transform: NodeTransform) -> Self {
        Self {
            name: name.into(),
            transform,
            role,
            mesh: None,
            wireframe: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: MeshData, color: [f32; 3]) -> Self {
        self.mesh = Some(MeshPart {
            mesh,
            material: Material::new(color),
        });
        self
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// Arena of scene nodes
#[derive(Default)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes (overlays included)
    pub fn node_count(&self) -> usize {
        self.live
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.slots
            .get(key.index as usize)
            .filter(|s| s.generation == key.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|s| s.generation == key.generation)
            .and_then(|s| s.node.as_mut())
    }

    /// Insert a root node
    pub fn spawn(&mut self, node: SceneNode) -> NodeKey {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeKey {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeKey {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    /// Insert a node under `parent`. Returns `None` if the parent is gone.
    pub fn spawn_child(&mut self, parent: NodeKey, mut node: SceneNode) -> Option<NodeKey> {
        if !self.contains(parent) {
            return None;
        }
        node.parent = Some(parent);
        let key = self.spawn(node);
        self.get_mut(parent)?.children.push(key);
        Some(key)
    }

    /// Remove a node and its whole subtree. Returns false for stale keys.
    pub fn remove(&mut self, key: NodeKey) -> bool {
        let Some(parent) = self.get(key).map(|n| n.parent) else {
            return false;
        };
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|c| *c != key);
        }
        for k in self.descendants(key) {
            let slot = &mut self.slots[k.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(k.index);
            self.live -= 1;
        }
        true
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.get(key)?.parent
    }

    /// True when `node` is `ancestor` or lies in its subtree
    pub fn is_within(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = Some(node);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// `key` followed by all of its descendants, depth first
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            let Some(node) = self.get(k) else {
                continue;
            };
            out.push(k);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Mesh-bearing nodes under `root` (root included), overlays excluded
    pub fn parts(&self, root: NodeKey) -> Vec<NodeKey> {
        self.descendants(root)
            .into_iter()
            .filter(|k| {
                self.get(*k)
                    .is_some_and(|n| n.mesh.is_some() && n.role != NodeRole::Overlay)
            })
            .collect()
    }

    pub fn world_matrix(&self, key: NodeKey) -> Option<Mat4> {
        let node = self.get(key)?;
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    /// Accumulated orientation of the node, ignoring scale
    pub fn world_rotation(&self, key: NodeKey) -> Option<Quat> {
        let node = self.get(key)?;
        match node.parent {
            Some(parent) => Some(self.world_rotation(parent)? * node.transform.rotation),
            None => Some(node.transform.rotation),
        }
    }

    /// World-space position of the node's origin
    pub fn world_translation(&self, key: NodeKey) -> Option<Vec3> {
        Some(self.world_matrix(key)?.transform_point3(Vec3::ZERO))
    }

    /// Move the node's origin to `world`. With a parent the position is
    /// converted into the parent's local space first. Returns false for stale
    /// keys and degenerate parents.
    pub fn set_world_translation(&mut self, key: NodeKey, world: Vec3) -> bool {
        let local = match self.parent(key) {
            Some(parent) => match Frame::of(self, parent).and_then(|f| f.to_local(world)) {
                Some(local) => local,
                None => return false,
            },
            None => world,
        };
        match self.get_mut(key) {
            Some(node) => {
                node.transform.translation = local;
                true
            }
            None => false,
        }
    }

    /// World-space bounding box of every part under `root`
    pub fn world_aabb(&self, root: NodeKey) -> Option<Aabb> {
        self.parts(root)
            .into_iter()
            .filter_map(|k| {
                let part = self.get(k)?.mesh.as_ref()?;
                let local = Aabb::from_mesh(&part.mesh)?;
                Some(local.transformed(&self.world_matrix(k)?))
            })
            .reduce(|a, b| a.union(&b))
    }

    // ── Object construction ───────────────────────────────────

    /// Spawn a primitive as a single-node object
    pub fn spawn_primitive(
        &mut self,
        name: &str,
        primitive: &Primitive,
        transform: &Transform,
        color: [f32; 3],
    ) -> NodeKey {
        let mut node_transform = NodeTransform::from(transform);
        let mesh = match primitive {
            Primitive::Plane { width, height } => {
                // Planes lie flat: local +Z becomes world +Y
                node_transform.rotation *= Quat::from_rotation_x(-FRAC_PI_2);
                mesh::plane(*width, *height)
            }
            Primitive::Box {
                width,
                height,
                depth,
            } => mesh::cube(*width, *height, *depth),
        };
        self.spawn(SceneNode::new(name, NodeRole::Object, node_transform).with_mesh(mesh, color))
    }

    /// Instantiate a loader graph. The returned root is the object node.
    pub fn spawn_model(&mut self, model: &ModelNode) -> NodeKey {
        let root = self.spawn(model_node(model, NodeRole::Object));
        let mut stack: Vec<(NodeKey, &ModelNode)> =
            model.children.iter().rev().map(|c| (root, c)).collect();
        while let Some((parent, child)) = stack.pop() {
            let role = if child.mesh.is_some() {
                NodeRole::Part
            } else {
                NodeRole::Group
            };
            let Some(key) = self.spawn_child(parent, model_node(child, role)) else {
                continue;
            };
            stack.extend(child.children.iter().rev().map(|c| (key, c)));
        }
        root
    }
}

fn model_node(model: &ModelNode, role: NodeRole) -> SceneNode {
    let node = SceneNode::new(model.name.clone(), role, NodeTransform::from(&model.transform));
    match &model.mesh {
        Some(m) => node.with_mesh(MeshData::from_model(m), m.color),
        None => node,
    }
}
