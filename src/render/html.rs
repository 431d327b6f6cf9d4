use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use super::collaborators::MapRenderer;
use crate::analyzers::types::{BumpSet, Coordinate, Segment, SegmentQuality};

const ZOOM_START: u8 = 15;
const LINE_WEIGHT: u8 = 6;

#[derive(Serialize)]
struct Polyline<'a> {
    color: &'a str,
    points: Vec<[f64; 2]>,
}

fn latlng(c: &Coordinate) -> [f64; 2] {
    [c.latitude, c.longitude]
}

/// Writes a self-contained Leaflet page over OpenStreetMap tiles.
pub struct HtmlMapRenderer {
    results_dir: PathBuf,
    stamp: String,
}

impl HtmlMapRenderer {
    pub fn new(results_dir: impl Into<PathBuf>, stamp: &str) -> Self {
        Self {
            results_dir: results_dir.into(),
            stamp: stamp.to_string(),
        }
    }

    fn legend() -> String {
        let mut rows = String::new();
        for quality in SegmentQuality::ALL {
            rows.push_str(&format!(
                "&nbsp;<span style=\"color:{}\">&#9679;</span> - {}<br>\n",
                quality.color(),
                quality.label()
            ));
        }
        format!(
            "<div style=\"position: fixed; top: 30px; right: 30px; width: 140px; \
             border:4px solid black; z-index:9999; font-size:15px; \
             background-color:lightblue;\">&nbsp;Road quality:<br>\n{}</div>",
            rows
        )
    }

    /// Builds the page for `segments`, centered on the first point of the
    /// first segment.
    pub fn page(&self, segments: &[(Segment, SegmentQuality)], bumps: &BumpSet) -> Result<String> {
        let Some(start) = segments.first().and_then(|(s, _)| s.first()) else {
            bail!("cannot render a map without segments");
        };

        let lines: Vec<Polyline> = segments
            .iter()
            .map(|(segment, quality)| Polyline {
                color: quality.color(),
                points: segment.coordinates().iter().map(latlng).collect(),
            })
            .collect();
        let bump_points: Vec<[f64; 2]> = bumps.iter().map(latlng).collect();

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Road quality {stamp}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
{legend}
<script>
var map = L.map("map").setView({start}, {zoom});
L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
  attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
{lines}.forEach(function (line) {{
  L.polyline(line.points, {{ color: line.color, weight: {weight} }}).addTo(map);
}});
{bumps}.forEach(function (point) {{
  L.circleMarker(point, {{ radius: 3, color: "black" }}).addTo(map);
}});
</script>
</body>
</html>
"#,
            stamp = self.stamp,
            legend = Self::legend(),
            start = serde_json::to_string(&latlng(start))?,
            zoom = ZOOM_START,
            lines = serde_json::to_string(&lines)?,
            weight = LINE_WEIGHT,
            bumps = serde_json::to_string(&bump_points)?,
        ))
    }
}

impl MapRenderer for HtmlMapRenderer {
    fn render(&self, segments: &[(Segment, SegmentQuality)], bumps: &BumpSet) -> Result<PathBuf> {
        let page = self.page(segments, bumps)?;

        fs::create_dir_all(&self.results_dir)
            .with_context(|| format!("creating {}", self.results_dir.display()))?;
        let path = self.results_dir.join(format!("map_{}.html", self.stamp));
        fs::write(&path, page).with_context(|| format!("writing {}", path.display()))?;
        debug!(segments = segments.len(), bumps = bumps.len(), "Map page written");

        let path = fs::canonicalize(&path)?;
        info!(path = %path.display(), "Map rendered");
        Ok(path)
    }
}
