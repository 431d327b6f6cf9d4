//! Bump detection over the vertical acceleration of a whole trip.
//!
//! Every sample is compared against a trip-wide baseline, the 70th
//! percentile of `|z|`. A sample whose deviation reaches [`BUMP_THRESHOLD`]
//! marks its location as a bump; severity bands are used only for the
//! summary counts and start strictly above the threshold.

use crate::analyzers::types::{BumpCounts, BumpSet, Severity, Trip};
use crate::analyzers::utility::percentile;
use tracing::debug;

pub const BASELINE_PERCENTILE: f64 = 70.0;
pub const BUMP_THRESHOLD: f64 = 1.0;
pub const MEDIUM_THRESHOLD: f64 = 1.5;
pub const BIG_THRESHOLD: f64 = 2.0;

/// 70th percentile of the absolute vertical acceleration.
pub fn baseline(z_data: &[f64]) -> f64 {
    let magnitudes: Vec<f64> = z_data.iter().map(|z| z.abs()).collect();
    percentile(&magnitudes, BASELINE_PERCENTILE)
}

pub fn deviation(z: f64, baseline: f64) -> f64 {
    (z.abs() - baseline).abs()
}

pub fn is_bump_candidate(deviation: f64) -> bool {
    deviation >= BUMP_THRESHOLD
}

/// Severity band of a deviation. A deviation of exactly [`BUMP_THRESHOLD`]
/// is a bump candidate but belongs to no band.
pub fn severity(deviation: f64) -> Option<Severity> {
    match deviation {
        d if d >= BIG_THRESHOLD => Some(Severity::Big),
        d if d >= MEDIUM_THRESHOLD => Some(Severity::Medium),
        d if d > BUMP_THRESHOLD => Some(Severity::Small),
        _ => None,
    }
}

/// Collects the coordinates of every bump candidate in the trip.
pub fn find_bump_coords(trip: &Trip) -> BumpSet {
    let base = baseline(&trip.vertical_series());

    let bumps: BumpSet = trip
        .records()
        .iter()
        .filter(|r| is_bump_candidate(deviation(r.z, base)))
        .map(|r| r.coordinate())
        .collect();

    debug!(baseline = base, bumps = bumps.len(), "Bump coordinates found");
    bumps
}

/// Counts bumps per severity band.
pub fn bump_statistics(z_data: &[f64]) -> BumpCounts {
    let base = baseline(z_data);
    let mut counts = BumpCounts::default();

    for z in z_data {
        if let Some(band) = severity(deviation(*z, base)) {
            counts.record(band);
        }
    }

    counts
}
