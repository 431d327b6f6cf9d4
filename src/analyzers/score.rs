use crate::analyzers::grade::rate;
use crate::analyzers::types::{BumpCounts, Coordinate, QualityCounts, RoadReport, Trip};
use crate::analyzers::utility::{haversine_km, round_to};
use crate::error::{PipelineError, PipelineResult};
use chrono::{NaiveTime, TimeDelta};

/// Time-of-day format used in both sensor logs.
pub const TIME_FORMAT: &str = "%H:%M:%S";

fn parse_time(value: &str) -> PipelineResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|e| PipelineError::InvalidInput(format!("bad time '{}': {}", value, e)))
}

/// Time between the first and last record. Trips that cross midnight come
/// out negative.
pub fn road_duration(trip: &Trip) -> PipelineResult<TimeDelta> {
    let (first, last) = match (trip.records().first(), trip.records().last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(PipelineError::InvalidInput(
                "cannot time an empty trip".into(),
            ));
        }
    };

    Ok(parse_time(&last.time)? - parse_time(&first.time)?)
}

/// Length of the route in kilometres, rounded to two decimals.
pub fn road_distance(coordinates: &[Coordinate]) -> f64 {
    let total: f64 = coordinates
        .windows(2)
        .map(|pair| haversine_km(&pair[0], &pair[1]))
        .sum();
    round_to(total, 2)
}

/// Builds the trip summary. An unusable duration or distance yields
/// [`Rating::Invalid`](crate::analyzers::types::Rating::Invalid) rather
/// than an error.
pub fn score_trip(
    trip: &Trip,
    bump_counts: BumpCounts,
    segments: QualityCounts,
) -> PipelineResult<RoadReport> {
    let duration = road_duration(trip)?;
    let distance_km = road_distance(&trip.coordinates());
    let duration_minutes = duration.num_milliseconds() as f64 / 60_000.0;

    let rating = rate(duration_minutes, distance_km, bump_counts.total as i64);

    Ok(RoadReport {
        duration,
        distance_km,
        bump_counts,
        rating,
        segments,
    })
}
