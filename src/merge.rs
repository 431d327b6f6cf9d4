//! Joins the accelerometer and GPS logs on their shared `time` column.

use std::collections::HashMap;
use tracing::debug;

use crate::analyzers::types::{MergedRecord, PositionSample, SensorSample, Trip};
use crate::error::{PipelineError, PipelineResult};
use crate::loader::Frame;

pub const TIME_KEY: &str = "time";

/// Inner join of two sample streams on exact `time` equality.
///
/// Output follows GPS order. A time value present several times in both
/// streams produces every pairing for that value.
pub fn merge_samples(accel: &[SensorSample], gps: &[PositionSample]) -> Vec<MergedRecord> {
    let mut by_time: HashMap<&str, Vec<&SensorSample>> = HashMap::new();
    for sample in accel {
        by_time.entry(sample.time.as_str()).or_default().push(sample);
    }

    gps.iter()
        .flat_map(|position| {
            by_time
                .get(position.time.as_str())
                .into_iter()
                .flatten()
                .map(move |sensor| MergedRecord::join(position, sensor))
        })
        .collect()
}

/// Converts both logs to typed samples and joins them into a [`Trip`].
///
/// # Errors
///
/// [`PipelineError::MissingKey`] if either log lacks a `time` column,
/// [`PipelineError::NoOverlap`] if no time value appears in both, and
/// [`PipelineError::Csv`] if a row does not match its sample type.
pub fn merge_frames(accel: &Frame, gps: &Frame) -> PipelineResult<Trip> {
    if !accel.has_column(TIME_KEY) || !gps.has_column(TIME_KEY) {
        return Err(PipelineError::MissingKey {
            column: TIME_KEY.to_string(),
        });
    }

    let accel: Vec<SensorSample> = accel.deserialize()?;
    let gps: Vec<PositionSample> = gps.deserialize()?;
    let records = merge_samples(&accel, &gps);

    debug!(
        accel_rows = accel.len(),
        gps_rows = gps.len(),
        merged = records.len(),
        "Sensor logs merged"
    );

    if records.is_empty() {
        return Err(PipelineError::NoOverlap);
    }
    Ok(Trip::new(records))
}
