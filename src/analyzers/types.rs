//! Data types used by the road-quality pipeline.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// A single row deserialized from an accelerometer log (`x,y,z,time`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub time: String,
}

/// A single row deserialized from a GPS log (`latitude,longitude,time`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    pub time: String,
}

/// One position joined with the acceleration sampled at the same second.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub time: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MergedRecord {
    pub fn join(position: &PositionSample, sensor: &SensorSample) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            time: position.time.clone(),
            x: sensor.x,
            y: sensor.y,
            z: sensor.z,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// The merged records of one recorded trip, in GPS log order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trip {
    records: Vec<MergedRecord>,
}

impl Trip {
    pub fn new(records: Vec<MergedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MergedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.records.iter().map(MergedRecord::coordinate).collect()
    }

    /// The z-axis acceleration of every record, parallel to [`Trip::coordinates`].
    pub fn vertical_series(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.z).collect()
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Coordinates are compared at 1e-7 degree resolution (about 1 cm).
const COORDINATE_SCALE: f64 = 1e7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordinateKey(i64, i64);

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn key(&self) -> CoordinateKey {
        CoordinateKey(
            (self.latitude * COORDINATE_SCALE).round() as i64,
            (self.longitude * COORDINATE_SCALE).round() as i64,
        )
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Locations of detected bumps, matched by coordinate value.
///
/// Iteration yields each distinct location once, in detection order.
#[derive(Debug, Clone, Default)]
pub struct BumpSet {
    keys: HashSet<CoordinateKey>,
    coordinates: Vec<Coordinate>,
}

impl BumpSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if an equal coordinate was already present.
    pub fn insert(&mut self, coordinate: Coordinate) -> bool {
        let inserted = self.keys.insert(coordinate.key());
        if inserted {
            self.coordinates.push(coordinate);
        }
        inserted
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.keys.contains(&coordinate.key())
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> {
        self.coordinates.iter()
    }
}

impl FromIterator<Coordinate> for BumpSet {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        let mut set = BumpSet::new();
        for coordinate in iter {
            set.insert(coordinate);
        }
        set
    }
}

/// A stretch of route plus the z-axis samples taken along it.
///
/// Consecutive segments share their boundary point.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub(crate) coordinates: Vec<Coordinate>,
    pub(crate) vertical_series: Vec<f64>,
}

impl Segment {
    pub(crate) fn seeded(coordinate: Coordinate, z: f64) -> Self {
        Self {
            coordinates: vec![coordinate],
            vertical_series: vec![z],
        }
    }

    pub(crate) fn push(&mut self, coordinate: Coordinate, z: f64) {
        self.coordinates.push(coordinate);
        self.vertical_series.push(z);
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn vertical_series(&self) -> &[f64] {
        &self.vertical_series
    }

    pub fn first(&self) -> Option<&Coordinate> {
        self.coordinates.first()
    }

    pub fn last(&self) -> Option<&Coordinate> {
        self.coordinates.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Small,
    Medium,
    Big,
}

/// Bump totals for a trip; `total` is always `big + medium + small`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BumpCounts {
    pub total: usize,
    pub big: usize,
    pub medium: usize,
    pub small: usize,
}

impl BumpCounts {
    pub fn record(&mut self, severity: Severity) {
        self.total += 1;
        match severity {
            Severity::Big => self.big += 1,
            Severity::Medium => self.medium += 1,
            Severity::Small => self.small += 1,
        }
    }
}

/// Smoothness class of a single segment, drawn in its map color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl SegmentQuality {
    pub const ALL: [SegmentQuality; 5] = [
        SegmentQuality::Excellent,
        SegmentQuality::Good,
        SegmentQuality::Fair,
        SegmentQuality::Poor,
        SegmentQuality::VeryPoor,
    ];

    pub fn color(&self) -> &'static str {
        match self {
            SegmentQuality::Excellent => "blue",
            SegmentQuality::Good => "green",
            SegmentQuality::Fair => "yellow",
            SegmentQuality::Poor => "orange",
            SegmentQuality::VeryPoor => "red",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SegmentQuality::Excellent => "excellent",
            SegmentQuality::Good => "good",
            SegmentQuality::Fair => "fair",
            SegmentQuality::Poor => "poor",
            SegmentQuality::VeryPoor => "very poor",
        }
    }
}

/// Number of segments in each quality class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityCounts {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
    pub very_poor: usize,
}

impl QualityCounts {
    pub fn record(&mut self, quality: SegmentQuality) {
        match quality {
            SegmentQuality::Excellent => self.excellent += 1,
            SegmentQuality::Good => self.good += 1,
            SegmentQuality::Fair => self.fair += 1,
            SegmentQuality::Poor => self.poor += 1,
            SegmentQuality::VeryPoor => self.very_poor += 1,
        }
    }
}

impl FromIterator<SegmentQuality> for QualityCounts {
    fn from_iter<I: IntoIterator<Item = SegmentQuality>>(iter: I) -> Self {
        let mut counts = QualityCounts::default();
        for quality in iter {
            counts.record(quality);
        }
        counts
    }
}

/// Overall verdict for a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
    Invalid,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Poor => "Poor",
            Rating::Invalid => "Invalid input. Please provide positive values.",
        };
        f.write_str(text)
    }
}

/// Serialized as its display text, so every output spells it the same way.
impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Summary statistics handed to the report writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadReport {
    #[serde(serialize_with = "serialize_duration")]
    pub duration: TimeDelta,
    pub distance_km: f64,
    pub bump_counts: BumpCounts,
    pub rating: Rating,
    pub segments: QualityCounts,
}

impl RoadReport {
    pub fn duration_text(&self) -> String {
        format_duration(self.duration)
    }

    pub fn distance_text(&self) -> String {
        format!("{:.2}", self.distance_km)
    }
}

/// Formats a span as `H:MM:SS`, prefixed with `-` when negative.
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let secs = total.unsigned_abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

fn serialize_duration<S: Serializer>(duration: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}
