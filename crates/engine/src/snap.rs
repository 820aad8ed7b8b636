//! Snap resolver for line placement.

use glam::Vec3;

/// Default snap radius in world units
pub const DEFAULT_TOLERANCE: f32 = 0.2;

/// Index of the pool point closest to `candidate` whose distance is strictly
/// below `tolerance`. Ties keep the earliest point in pool order.
pub fn nearest_within(candidate: Vec3, pool: &[Vec3], tolerance: f32) -> Option<usize> {
    let limit = tolerance * tolerance;
    let mut best: Option<(usize, f32)> = None;

    for (i, p) in pool.iter().enumerate() {
        let d = p.distance_squared(candidate);
        if d < limit && best.is_none_or(|(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }

    best.map(|(i, _)| i)
}

/// Replace `candidate` with the nearest pool point within `tolerance`,
/// or return it unchanged.
pub fn snap(candidate: Vec3, pool: &[Vec3], tolerance: f32) -> Vec3 {
    nearest_within(candidate, pool, tolerance).map_or(candidate, |i| pool[i])
}
