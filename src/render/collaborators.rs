use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::analyzers::types::{BumpSet, RoadReport, Segment, SegmentQuality};

pub trait MapRenderer {
    /// Draws every segment in its quality color and returns the path of the
    /// rendered map.
    fn render(&self, segments: &[(Segment, SegmentQuality)], bumps: &BumpSet) -> Result<PathBuf>;
}

pub trait ImageCapturer {
    /// Rasterizes the map at `map` and returns the path of the image.
    fn capture(&self, map: &Path) -> Result<PathBuf>;
}

pub trait ReportWriter {
    /// Writes the road statistics sheet and returns its path.
    fn write(&self, image: &Path, report: &RoadReport) -> Result<PathBuf>;
}
