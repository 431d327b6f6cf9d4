//! Output formatting and persistence for road reports.
//!
//! Supports pretty-printing, JSON serialization, and the fixed-layout
//! road statistics workbook.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analyzers::types::RoadReport;
use crate::render::ReportWriter;
use rust_xlsxwriter::{Image, Workbook};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Width of columns A and B, in characters.
const COLUMN_WIDTH: f64 = 20.0;
/// Screenshot anchor, cell A10.
const IMAGE_ROW: u32 = 9;
const IMAGE_SCALE: f64 = 1.5;

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &RoadReport) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json(report: &RoadReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

/// Zero-based `(row, column, value)` cells of the statistics sheet.
pub fn statistics_cells(report: &RoadReport) -> Vec<(u32, u16, Cell)> {
    let counts = report.bump_counts;
    vec![
        (0, 0, "Duration:".into()),
        (0, 1, Cell::Text(report.duration_text())),
        (1, 0, "Length (Km)".into()),
        (1, 1, Cell::Number(report.distance_km)),
        (3, 0, "Number of bumps:".into()),
        (3, 1, Cell::Number(counts.total as f64)),
        (4, 1, "Big bumps".into()),
        (4, 2, Cell::Number(counts.big as f64)),
        (5, 1, "Medium bumps:".into()),
        (5, 2, Cell::Number(counts.medium as f64)),
        (6, 1, "Small bumps:".into()),
        (6, 2, Cell::Number(counts.small as f64)),
        (7, 0, "Road rating:".into()),
        (7, 1, Cell::Text(report.rating.to_string())),
    ]
}

/// Writes `road_statistics_<stamp>.xlsx` with the map screenshot embedded
/// at A10, plus a JSON copy of the report.
pub struct XlsxReportWriter {
    results_dir: PathBuf,
    stamp: String,
}

impl XlsxReportWriter {
    pub fn new(results_dir: impl Into<PathBuf>, stamp: &str) -> Self {
        Self {
            results_dir: results_dir.into(),
            stamp: stamp.to_string(),
        }
    }

    pub fn sheet_path(&self) -> PathBuf {
        self.results_dir
            .join(format!("road_statistics_{}.xlsx", self.stamp))
    }

    pub fn json_path(&self) -> PathBuf {
        sidecar_path(&self.sheet_path())
    }

    fn write_json(&self, report: &RoadReport) -> Result<()> {
        let json = File::create(self.json_path())?;
        serde_json::to_writer_pretty(json, report)?;
        Ok(())
    }
}

/// Location of the JSON copy written next to a statistics sheet.
pub fn sidecar_path(sheet: &Path) -> PathBuf {
    sheet.with_extension("json")
}

impl ReportWriter for XlsxReportWriter {
    fn write(&self, image: &Path, report: &RoadReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.results_dir)?;
        let path = self.sheet_path();
        debug!(path = %path.display(), "Writing road statistics");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_column_width(0, COLUMN_WIDTH)?;
        worksheet.set_column_width(1, COLUMN_WIDTH)?;

        for (row, col, cell) in statistics_cells(report) {
            match cell {
                Cell::Text(text) => worksheet.write_string(row, col, text)?,
                Cell::Number(value) => worksheet.write_number(row, col, value)?,
            };
        }

        let screenshot = Image::new(image)
            .with_context(|| format!("loading {}", image.display()))?
            .set_scale_width(IMAGE_SCALE)
            .set_scale_height(IMAGE_SCALE);
        worksheet.insert_image(IMAGE_ROW, 0, &screenshot)?;

        workbook
            .save(&path)
            .with_context(|| format!("saving {}", path.display()))?;

        self.write_json(report).inspect_err(|_| {
            let _ = fs::remove_file(&path);
        })?;

        info!(path = %path.display(), rating = %report.rating, "Road statistics written");
        Ok(path)
    }
}
