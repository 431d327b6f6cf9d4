//! Threshold tables for segment colors and trip ratings.
//!
//! Both tables are scanned top to bottom and the first matching rule wins.

use crate::analyzers::types::{BumpSet, Rating, Segment, SegmentQuality};
use crate::analyzers::utility::{mean, stddev};

/// A segment matches when it has at least `min_bumps` bumps and its
/// vertical acceleration spreads at least `min_stddev`.
#[derive(Debug, Clone, Copy)]
pub struct QualityRule {
    pub min_bumps: usize,
    pub min_stddev: f64,
    pub quality: SegmentQuality,
}

/// | Bumps | Stddev of z | Quality   | Color  |
/// |-------|-------------|-----------|--------|
/// | >= 5  | any         | very poor | red    |
/// | 2–4   | any         | poor      | orange |
/// | 1     | any         | fair      | yellow |
/// | 0     | >= 0.5      | good      | green  |
/// | 0     | < 0.5       | excellent | blue   |
pub static SEGMENT_RULES: &[QualityRule] = &[
    QualityRule {
        min_bumps: 5,
        min_stddev: 0.0,
        quality: SegmentQuality::VeryPoor,
    },
    QualityRule {
        min_bumps: 2,
        min_stddev: 0.0,
        quality: SegmentQuality::Poor,
    },
    QualityRule {
        min_bumps: 1,
        min_stddev: 0.0,
        quality: SegmentQuality::Fair,
    },
    QualityRule {
        min_bumps: 0,
        min_stddev: 0.5,
        quality: SegmentQuality::Good,
    },
    QualityRule {
        min_bumps: 0,
        min_stddev: 0.0,
        quality: SegmentQuality::Excellent,
    },
];

/// A trip matches when both densities are strictly below the rule's limits.
#[derive(Debug, Clone, Copy)]
pub struct RatingRule {
    pub max_bumps_per_minute: f64,
    pub max_bumps_per_km: f64,
    pub rating: Rating,
}

/// | Bumps per minute | Bumps per km | Rating    |
/// |------------------|--------------|-----------|
/// | < 0.1            | any          | Excellent |
/// | 0.1 – 0.3        | < 0.5        | Good      |
/// | 0.1 – 0.3        | >= 0.5       | Fair      |
/// | 0.3 – 0.6        | < 1.5        | Fair      |
/// | 0.3 – 0.6        | >= 1.5       | Poor      |
/// | >= 0.6           | any          | Poor      |
pub static RATING_RULES: &[RatingRule] = &[
    RatingRule {
        max_bumps_per_minute: 0.1,
        max_bumps_per_km: f64::INFINITY,
        rating: Rating::Excellent,
    },
    RatingRule {
        max_bumps_per_minute: 0.3,
        max_bumps_per_km: 0.5,
        rating: Rating::Good,
    },
    RatingRule {
        max_bumps_per_minute: 0.3,
        max_bumps_per_km: f64::INFINITY,
        rating: Rating::Fair,
    },
    RatingRule {
        max_bumps_per_minute: 0.6,
        max_bumps_per_km: 1.5,
        rating: Rating::Fair,
    },
    RatingRule {
        max_bumps_per_minute: 0.6,
        max_bumps_per_km: f64::INFINITY,
        rating: Rating::Poor,
    },
    RatingRule {
        max_bumps_per_minute: f64::INFINITY,
        max_bumps_per_km: f64::INFINITY,
        rating: Rating::Poor,
    },
];

pub fn quality_for(bump_count: usize, z_stddev: f64) -> SegmentQuality {
    SEGMENT_RULES
        .iter()
        .find(|r| bump_count >= r.min_bumps && z_stddev >= r.min_stddev)
        .map(|r| r.quality)
        .unwrap_or(SegmentQuality::Excellent)
}

/// Number of the segment's points that are bump locations.
pub fn bump_matches(segment: &Segment, bumps: &BumpSet) -> usize {
    segment
        .coordinates()
        .iter()
        .filter(|c| bumps.contains(c))
        .count()
}

/// Classifies a segment from its bump count and the spread of its
/// vertical acceleration.
pub fn classify_segment(segment: &Segment, bumps: &BumpSet) -> SegmentQuality {
    let z = segment.vertical_series();
    quality_for(bump_matches(segment, bumps), stddev(z, mean(z)))
}

/// Rates a trip by bump density over time and over distance.
///
/// Returns [`Rating::Invalid`] when the duration or distance is not
/// positive, or the bump count is negative.
pub fn rate(duration_minutes: f64, distance_km: f64, total_bumps: i64) -> Rating {
    if !(duration_minutes > 0.0) || !(distance_km > 0.0) || total_bumps < 0 {
        return Rating::Invalid;
    }

    let bumps_per_minute = total_bumps as f64 / duration_minutes;
    let bumps_per_km = total_bumps as f64 / distance_km;

    RATING_RULES
        .iter()
        .find(|r| bumps_per_minute < r.max_bumps_per_minute && bumps_per_km < r.max_bumps_per_km)
        .map(|r| r.rating)
        .unwrap_or(Rating::Poor)
}
