use serde::{Deserialize, Serialize};

/// Уникальный идентификатор объекта в сцене
pub type ObjectId = String;

/// Тип примитива, добавляемого из панели инструментов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// Плоскость, лежащая в XZ (повёрнута на -90° вокруг X)
    Plane { width: f32, height: f32 },
    Box { width: f32, height: f32, depth: f32 },
}

/// Трансформация объекта: позиция, поворот (углы Эйлера XYZ, радианы), масштаб
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// Режим взаимодействия; в каждый момент активен ровно один
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    Idle,
    Move,
    PlacePoint,
    PlaceLine,
    Edit,
}

impl InteractionMode {
    pub fn all() -> &'static [InteractionMode] {
        &[
            InteractionMode::Idle,
            InteractionMode::Move,
            InteractionMode::PlacePoint,
            InteractionMode::PlaceLine,
            InteractionMode::Edit,
        ]
    }

    /// Режимы размещения аннотаций
    pub fn is_placement(&self) -> bool {
        matches!(self, InteractionMode::PlacePoint | InteractionMode::PlaceLine)
    }

    /// Режимы, в которых доступен манипулятор
    pub fn is_manipulation(&self) -> bool {
        matches!(self, InteractionMode::Move | InteractionMode::Edit)
    }
}

/// Кнопка указателя (нумерация как в DOM: 0 — основная, 1 — средняя, 2 — правая)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Auxiliary,
    Secondary,
}

impl PointerButton {
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => PointerButton::Primary,
            2 => PointerButton::Secondary,
            _ => PointerButton::Auxiliary,
        }
    }
}

/// Точка, привязанная к поверхности объекта (в локальных координатах объекта)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    pub object_id: ObjectId,
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Конец отрезка (в локальных координатах объекта)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineEnd {
    pub object_id: ObjectId,
    pub position: [f32; 3],
}

/// Отрезок между двумя привязанными концами (могут лежать на разных объектах)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub start: LineEnd,
    pub end: LineEnd,
}

impl LineData {
    /// Ссылается ли отрезок на объект
    pub fn touches(&self, object_id: &str) -> bool {
        self.start.object_id == object_id || self.end.object_id == object_id
    }
}

/// Геометрия узла загруженной модели
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    #[serde(default = "default_color")]
    pub color: [f32; 3],
}

/// Узел графа модели, который возвращает загрузчик
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<ModelMesh>,
    #[serde(default)]
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    /// Количество узлов с геометрией во всём поддереве
    pub fn mesh_count(&self) -> usize {
        usize::from(self.mesh.is_some())
            + self.children.iter().map(ModelNode::mesh_count).sum::<usize>()
    }
}

fn default_color() -> [f32; 3] {
    [0.8, 0.8, 0.8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_plane_tag() {
        let p = Primitive::Plane { width: 10.0, height: 10.0 };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains(r#""type":"plane""#));
        let back: Primitive = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn test_mode_snake_case() {
        let json = serde_json::to_string(&InteractionMode::PlaceLine).unwrap();
        assert_eq!(json, r#""place_line""#);
        let mode: InteractionMode = serde_json::from_str(r#""place_point""#).unwrap();
        assert_eq!(mode, InteractionMode::PlacePoint);
    }

    #[test]
    fn test_mode_default_idle() {
        assert_eq!(InteractionMode::default(), InteractionMode::Idle);
        assert_eq!(InteractionMode::all().len(), 5);
    }

    #[test]
    fn test_mode_groups() {
        assert!(InteractionMode::PlacePoint.is_placement());
        assert!(InteractionMode::PlaceLine.is_placement());
        assert!(!InteractionMode::Move.is_placement());
        assert!(InteractionMode::Move.is_manipulation());
        assert!(InteractionMode::Edit.is_manipulation());
        assert!(!InteractionMode::Idle.is_manipulation());
    }

    #[test]
    fn test_pointer_button_from_dom() {
        assert_eq!(PointerButton::from_dom(0), PointerButton::Primary);
        assert_eq!(PointerButton::from_dom(1), PointerButton::Auxiliary);
        assert_eq!(PointerButton::from_dom(2), PointerButton::Secondary);
        assert_eq!(PointerButton::from_dom(4), PointerButton::Auxiliary);
    }

    #[test]
    fn test_transform_default_identity() {
        let t = Transform::default();
        assert_eq!(t.scale, [1.0, 1.0, 1.0]);
        assert_eq!(Transform::at([1.0, 2.0, 3.0]).position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_model_node_defaults() {
        let json = r#"{"name": "root", "children": [
            {"name": "a", "mesh": {"positions": [[0,0,0],[1,0,0],[0,1,0]], "indices": [0,1,2]}},
            {"name": "b", "children": [{"name": "c", "mesh": {"positions": [], "indices": []}}]}
        ]}"#;
        let node: ModelNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.transform, Transform::new());
        assert_eq!(node.mesh_count(), 2);
        assert_eq!(node.children[0].mesh.as_ref().unwrap().color, [0.8, 0.8, 0.8]);
    }

    #[test]
    fn test_line_touches() {
        let line = LineData {
            start: LineEnd { object_id: "a".into(), position: [0.0; 3] },
            end: LineEnd { object_id: "b".into(), position: [0.0; 3] },
        };
        assert!(line.touches("a"));
        assert!(line.touches("b"));
        assert!(!line.touches("c"));
    }
}
