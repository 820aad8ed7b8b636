//! Annotation store: anchored points and line segments.
//!
//! Everything here is stored in the local frame of its host object and keyed
//! by object id. World positions are recomputed from the host's current
//! transform on every [`AnnotationStore::resolve`] call; annotations whose host
//! is unregistered (or unmounted) are skipped for that frame.

use glam::Vec3;
use serde::Serialize;
use shared::{LineData, LineEnd, ObjectId, PointData};

use crate::registry::ObjectRegistry;
use crate::scene::SceneGraph;
use crate::transform::Frame;

/// A point anchored to an object's surface
pub type AnchoredPoint = PointData;
/// A committed segment between two anchored ends
pub type LineSegment = LineData;

/// World-space view of an [`AnchoredPoint`] for the current frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPoint {
    pub object_id: ObjectId,
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// World-space view of a segment for the current frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSegment {
    pub start: [f32; 3],
    pub end: [f32; 3],
}

/// Current world position of a line end, or `None` if its host is gone
pub fn resolve_end(scene: &SceneGraph, registry: &ObjectRegistry, end: &LineEnd) -> Option<Vec3> {
    let node = registry.resolve(&end.object_id)?;
    Some(Frame::of(scene, node)?.to_world(Vec3::from(end.position)))
}

/// A snap pool entry: the anchored end and where it sits this frame
#[derive(Debug, Clone)]
pub struct SnapTarget {
    pub end: LineEnd,
    pub world: Vec3,
}

#[derive(Default)]
pub struct AnnotationStore {
    points: Vec<AnchoredPoint>,
    segments: Vec<LineSegment>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[AnchoredPoint] {
        &self.points
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    pub fn add_point(&mut self, point: AnchoredPoint) {
        self.points.push(point);
    }

    pub fn add_segment(&mut self, segment: LineSegment) {
        self.segments.push(segment);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.segments.is_empty()
    }

    /// Drop every annotation
    pub fn reset(&mut self) {
        self.points.clear();
        self.segments.clear();
    }

    /// Annotations that reference `object_id` (points + segments touching it)
    pub fn count_for(&self, object_id: &str) -> usize {
        self.points.iter().filter(|p| p.object_id == object_id).count()
            + self.segments.iter().filter(|s| s.touches(object_id)).count()
    }

    /// World positions of all points whose host currently resolves
    pub fn resolve_points(&self, scene: &SceneGraph, registry: &ObjectRegistry) -> Vec<ResolvedPoint> {
        self.points
            .iter()
            .filter_map(|p| {
                let frame = Frame::of(scene, registry.resolve(&p.object_id)?)?;
                Some(ResolvedPoint {
                    object_id: p.object_id.clone(),
                    position: frame.to_world(Vec3::from(p.position)).to_array(),
                    normal: frame.normal_to_world(Vec3::from(p.normal)).to_array(),
                })
            })
            .collect()
    }

    /// World positions of all segments whose both ends currently resolve
    pub fn resolve_segments(&self, scene: &SceneGraph, registry: &ObjectRegistry) -> Vec<ResolvedSegment> {
        self.segments
            .iter()
            .filter_map(|s| {
                Some(ResolvedSegment {
                    start: resolve_end(scene, registry, &s.start)?.to_array(),
                    end: resolve_end(scene, registry, &s.end)?.to_array(),
                })
            })
            .collect()
    }

    /// Snap pool for line placement: every committed segment endpoint, then
    /// the points of the chain in progress. Unresolvable ends are left out.
    pub fn snap_pool(
        &self,
        scene: &SceneGraph,
        registry: &ObjectRegistry,
        chain: &[LineEnd],
    ) -> Vec<SnapTarget> {
        self.segments
            .iter()
            .flat_map(|s| [&s.start, &s.end])
            .chain(chain.iter())
            .filter_map(|end| {
                Some(SnapTarget {
                    world: resolve_end(scene, registry, end)?,
                    end: end.clone(),
                })
            })
            .collect()
    }
}
