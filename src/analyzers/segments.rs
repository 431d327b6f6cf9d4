//! Splits a route into consecutive stretches of roughly equal length.

use crate::analyzers::types::{Coordinate, Segment};
use crate::analyzers::utility::haversine_m;
use crate::error::{PipelineError, PipelineResult};
use tracing::debug;

/// Default segment length in metres.
pub const SEGMENT_DISTANCE_THRESHOLD: f64 = 100.0;

/// Walks the route once, closing a segment as soon as the distance covered
/// since its first point reaches `threshold_m`.
///
/// The closing point is also the first point of the next segment. The last
/// segment is emitted even when it is shorter than the threshold, so a
/// single-point route yields one single-point segment.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if the route is empty, if
/// `z_data` is not parallel to `coordinates`, or if the threshold is not a
/// positive distance.
pub fn divide_into_segments(
    coordinates: &[Coordinate],
    z_data: &[f64],
    threshold_m: f64,
) -> PipelineResult<Vec<Segment>> {
    if coordinates.is_empty() {
        return Err(PipelineError::InvalidInput(
            "cannot segment an empty route".into(),
        ));
    }
    if coordinates.len() != z_data.len() {
        return Err(PipelineError::InvalidInput(format!(
            "{} coordinates but {} acceleration samples",
            coordinates.len(),
            z_data.len()
        )));
    }
    if !(threshold_m > 0.0) {
        return Err(PipelineError::InvalidInput(format!(
            "segment threshold must be positive, got {}",
            threshold_m
        )));
    }

    let mut segments = Vec::new();
    let mut current = Segment::seeded(coordinates[0], z_data[0]);
    let mut covered = 0.0;

    for i in 1..coordinates.len() {
        covered += haversine_m(&coordinates[i - 1], &coordinates[i]);
        current.push(coordinates[i], z_data[i]);

        if covered >= threshold_m {
            let next = Segment::seeded(coordinates[i], z_data[i]);
            segments.push(std::mem::replace(&mut current, next));
            covered = 0.0;
        }
    }
    segments.push(current);

    debug!(
        points = coordinates.len(),
        segments = segments.len(),
        threshold_m,
        "Route segmented"
    );
    Ok(segments)
}
