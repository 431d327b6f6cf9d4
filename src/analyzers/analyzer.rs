use crate::analyzers::bumps::{bump_statistics, find_bump_coords};
use crate::analyzers::grade::classify_segment;
use crate::analyzers::score::score_trip;
use crate::analyzers::segments::divide_into_segments;
use crate::analyzers::types::{QualityCounts, RoadReport, Segment, SegmentQuality, Trip};
use crate::loader::read_data_file;
use crate::merge::merge_frames;
use crate::output::sidecar_path;
use crate::render::{ImageCapturer, MapRenderer, ReportWriter, run_stamp};
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const ACCEL_PREFIX: &str = "accel_data_";
const GPS_PREFIX: &str = "gps_data_";

/// The two logs recorded for one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripFiles {
    pub accel: PathBuf,
    pub gps: PathBuf,
    /// Recording timestamp taken from the file names, if known.
    pub stamp: Option<String>,
}

impl TripFiles {
    pub fn new(accel: impl Into<PathBuf>, gps: impl Into<PathBuf>) -> Self {
        Self {
            accel: accel.into(),
            gps: gps.into(),
            stamp: None,
        }
    }

    /// Timestamp used to name this trip's artifacts.
    pub fn artifact_stamp(&self) -> String {
        self.stamp.clone().unwrap_or_else(run_stamp)
    }
}

/// External services that draw, capture and persist a trip's results.
pub struct Collaborators<'a> {
    pub renderer: &'a dyn MapRenderer,
    pub capturer: &'a dyn ImageCapturer,
    pub writer: &'a dyn ReportWriter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripArtifacts {
    pub map: PathBuf,
    pub image: PathBuf,
    pub report: PathBuf,
}

impl TripArtifacts {
    /// Every file written for the trip, including the report's JSON copy.
    pub fn paths(&self) -> [PathBuf; 4] {
        [
            self.map.clone(),
            self.image.clone(),
            self.report.clone(),
            sidecar_path(&self.report),
        ]
    }
}

#[derive(Debug)]
pub enum TripOutcome {
    /// Artifacts were written and the logs archived.
    Completed {
        report: RoadReport,
        artifacts: TripArtifacts,
    },
    /// The logs were unusable and have been deleted.
    Discarded { reason: String },
}

/// Loads and merges both logs. Returns `Ok(None)` when either log has no data.
pub fn load_trip(files: &TripFiles) -> Result<Option<Trip>> {
    let accel = read_data_file(&files.accel)?;
    let gps = read_data_file(&files.gps)?;

    let (Some(accel), Some(gps)) = (accel, gps) else {
        return Ok(None);
    };

    Ok(Some(merge_frames(&accel, &gps)?))
}

/// Detects bumps, segments and classifies the route, scores the trip and
/// hands everything to the collaborators.
pub fn analyze_trip(
    trip: &Trip,
    segment_distance_m: f64,
    collaborators: &Collaborators<'_>,
) -> Result<(RoadReport, TripArtifacts)> {
    let bumps = find_bump_coords(trip);
    let coordinates = trip.coordinates();
    let z_data = trip.vertical_series();

    let segments = divide_into_segments(&coordinates, &z_data, segment_distance_m)?;
    let classified: Vec<(Segment, SegmentQuality)> = segments
        .into_iter()
        .map(|segment| {
            let quality = classify_segment(&segment, &bumps);
            (segment, quality)
        })
        .collect();
    let qualities: QualityCounts = classified.iter().map(|(_, q)| *q).collect();

    let report = score_trip(trip, bump_statistics(&z_data), qualities)?;
    debug!(?report, "Trip scored");

    let map = collaborators
        .renderer
        .render(&classified, &bumps)
        .context("rendering map")?;
    let image = collaborators
        .capturer
        .capture(&map)
        .inspect_err(|_| discard_files(&[&map]))
        .context("capturing map image")?;
    let sheet = collaborators
        .writer
        .write(&image, &report)
        .inspect_err(|_| discard_files(&[&map, &image]))
        .context("writing road statistics")?;

    Ok((
        report,
        TripArtifacts {
            map,
            image,
            report: sheet,
        },
    ))
}

/// Runs the whole pipeline for one trip.
///
/// On success both logs are moved into `archive_dir`. If the logs hold no
/// usable data, or any stage fails, both logs are deleted instead, along
/// with any artifact already written for the trip.
#[tracing::instrument(
    skip(files, collaborators),
    fields(accel = %files.accel.display(), gps = %files.gps.display())
)]
pub fn process_trip(
    files: &TripFiles,
    archive_dir: &Path,
    segment_distance_m: f64,
    collaborators: &Collaborators<'_>,
) -> TripOutcome {
    let result = load_trip(files).and_then(|trip| match trip {
        None => Ok(None),
        Some(trip) => {
            let analyzed = analyze_trip(&trip, segment_distance_m, collaborators)?;
            archive_trip(files, archive_dir, &analyzed.1)?;
            Ok(Some(analyzed))
        }
    });

    match result {
        Ok(Some((report, artifacts))) => {
            info!(
                rating = %report.rating,
                distance_km = report.distance_km,
                bumps = report.bump_counts.total,
                report = %artifacts.report.display(),
                "Trip processed"
            );
            TripOutcome::Completed { report, artifacts }
        }
        Ok(None) => {
            warn!("No data to process");
            remove_files(files);
            TripOutcome::Discarded {
                reason: "no data to process".to_string(),
            }
        }
        Err(e) => {
            error!(error = ?e, "Trip processing failed, discarding logs");
            remove_files(files);
            TripOutcome::Discarded {
                reason: format!("{:#}", e),
            }
        }
    }
}

/// Deletes both logs. Files that are already gone are skipped.
pub fn remove_files(files: &TripFiles) {
    discard_files(&[&files.accel, &files.gps]);
}

/// Deletes each path, skipping files that are already gone.
pub fn discard_files<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => info!(path = %path.display(), "Deleted"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete"),
        }
    }
}

/// Moves both logs into `archive_dir`, creating it if needed.
pub fn archive_files(files: &TripFiles, archive_dir: &Path) -> Result<()> {
    fs::create_dir_all(archive_dir)
        .with_context(|| format!("creating {}", archive_dir.display()))?;

    for path in [&files.accel, &files.gps] {
        let name = path
            .file_name()
            .with_context(|| format!("{} has no file name", path.display()))?;
        let target = archive_dir.join(name);
        move_file(path, &target)?;
        debug!(from = %path.display(), to = %target.display(), "Archived");
    }

    Ok(())
}

/// Archives both logs. When archiving fails part-way, the copies already
/// moved and the trip's artifacts are deleted so the trip leaves nothing
/// behind; the caller still removes whatever log was not moved.
pub fn archive_trip(files: &TripFiles, archive_dir: &Path, artifacts: &TripArtifacts) -> Result<()> {
    archive_files(files, archive_dir).inspect_err(|e| {
        warn!(error = %e, "Archiving failed, rolling back");
        let archived: Vec<PathBuf> = [&files.accel, &files.gps]
            .into_iter()
            .filter_map(|path| path.file_name())
            .map(|name| archive_dir.join(name))
            .collect();
        discard_files(&archived);
        discard_files(&artifacts.paths());
    })
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // rename fails across filesystems
    fs::copy(from, to).with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
    fs::remove_file(from).with_context(|| format!("removing {}", from.display()))?;
    Ok(())
}

/// Finds every `accel_data_<stamp>.csv` in `dir` that has a matching
/// `gps_data_<stamp>.csv`, ordered by stamp.
pub fn discover_trips(dir: &Path) -> Result<Vec<TripFiles>> {
    let mut trips = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name();
        let Some(stamp) = name
            .to_str()
            .and_then(|n| n.strip_prefix(ACCEL_PREFIX))
            .and_then(|n| n.strip_suffix(".csv"))
        else {
            continue;
        };

        let gps = dir.join(format!("{}{}.csv", GPS_PREFIX, stamp));
        if !gps.is_file() {
            warn!(accel = %entry.path().display(), "No matching GPS log");
            continue;
        }

        trips.push(TripFiles {
            accel: entry.path(),
            gps,
            stamp: Some(stamp.to_string()),
        });
    }

    trips.sort_by(|a, b| a.stamp.cmp(&b.stamp));
    Ok(trips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("road_quality_rater_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_remove_files() {
        let dir = temp_dir("remove_files");
        let files = TripFiles::new(dir.join("temp_file1.txt"), dir.join("temp_file2.txt"));
        fs::write(&files.accel, "This is a test.").unwrap();
        fs::write(&files.gps, "This is another test.").unwrap();

        remove_files(&files);

        assert!(!files.accel.exists());
        assert!(!files.gps.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_remove_files_tolerates_missing() {
        let dir = temp_dir("remove_missing");
        let files = TripFiles::new(dir.join("present.csv"), dir.join("absent.csv"));
        fs::write(&files.accel, "x,y,z,time\n").unwrap();

        remove_files(&files);

        assert!(!files.accel.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_archive_files() {
        let dir = temp_dir("archive_files");
        let archive = dir.join("data");
        let files = TripFiles::new(dir.join("accel.csv"), dir.join("gps.csv"));
        fs::write(&files.accel, "x,y,z,time\n").unwrap();
        fs::write(&files.gps, "latitude,longitude,time\n").unwrap();

        archive_files(&files, &archive).unwrap();

        assert!(!files.accel.exists());
        assert!(!files.gps.exists());
        assert!(archive.join("accel.csv").exists());
        assert!(archive.join("gps.csv").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_discard_files_skips_missing() {
        let dir = temp_dir("discard_files");
        let present = dir.join("map_x.html");
        fs::write(&present, "<html></html>").unwrap();

        discard_files(&[present.clone(), dir.join("image_x.png")]);

        assert!(!present.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_archive_trip_rolls_back_partial_archive() {
        let dir = temp_dir("archive_rollback");
        let archive = dir.join("data");
        // The GPS log vanished, so only the accelerometer log gets archived.
        let files = TripFiles::new(dir.join("accel.csv"), dir.join("gps.csv"));
        fs::write(&files.accel, "x,y,z,time\n").unwrap();
        let artifacts = TripArtifacts {
            map: dir.join("map_x.html"),
            image: dir.join("image_x.png"),
            report: dir.join("road_statistics_x.xlsx"),
        };
        for path in artifacts.paths() {
            fs::write(path, "artifact").unwrap();
        }

        assert!(archive_trip(&files, &archive, &artifacts).is_err());

        assert!(!files.accel.exists());
        assert!(!archive.join("accel.csv").exists());
        assert!(!dir.join("road_statistics_x.json").exists());
        for path in artifacts.paths() {
            assert!(!path.exists(), "{} should be deleted", path.display());
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_archive_trip_keeps_artifacts_on_success() {
        let dir = temp_dir("archive_trip");
        let archive = dir.join("data");
        let files = TripFiles::new(dir.join("accel.csv"), dir.join("gps.csv"));
        fs::write(&files.accel, "x,y,z,time\n").unwrap();
        fs::write(&files.gps, "latitude,longitude,time\n").unwrap();
        let artifacts = TripArtifacts {
            map: dir.join("map_x.html"),
            image: dir.join("image_x.png"),
            report: dir.join("road_statistics_x.xlsx"),
        };
        fs::write(&artifacts.map, "<html></html>").unwrap();

        archive_trip(&files, &archive, &artifacts).unwrap();

        assert!(archive.join("gps.csv").exists());
        assert!(artifacts.map.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_discover_trips_pairs_logs() {
        let dir = temp_dir("discover");
        for name in [
            "accel_data_2024_05_02_08_00_00.csv",
            "gps_data_2024_05_02_08_00_00.csv",
            "accel_data_2024_05_01_08_00_00.csv",
            "gps_data_2024_05_01_08_00_00.csv",
            "accel_data_2024_05_03_08_00_00.csv",
            "notes.txt",
        ] {
            fs::write(dir.join(name), "").unwrap();
        }

        let trips = discover_trips(&dir).unwrap();

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].stamp.as_deref(), Some("2024_05_01_08_00_00"));
        assert_eq!(trips[1].gps, dir.join("gps_data_2024_05_02_08_00_00.csv"));
        assert_eq!(trips[0].artifact_stamp(), "2024_05_01_08_00_00");
        fs::remove_dir_all(&dir).unwrap();
    }
}
