use anyhow::{Result, bail};
use road_quality_rater::analyzers::analyzer::{
    Collaborators, TripFiles, TripOutcome, discover_trips, load_trip, process_trip,
};
use road_quality_rater::analyzers::segments::SEGMENT_DISTANCE_THRESHOLD;
use road_quality_rater::analyzers::types::{BumpSet, Rating, RoadReport, Segment, SegmentQuality};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

const STAMP: &str = "2024_05_01_08_00_00";

/// Records what it was asked to draw and writes a placeholder page.
struct FakeRenderer {
    map: PathBuf,
    colors: RefCell<Vec<&'static str>>,
    bumps: RefCell<usize>,
}

impl FakeRenderer {
    fn new(dir: &Path) -> Self {
        Self {
            map: dir.join("map.html"),
            colors: RefCell::default(),
            bumps: RefCell::default(),
        }
    }
}

impl road_quality_rater::render::MapRenderer for FakeRenderer {
    fn render(&self, segments: &[(Segment, SegmentQuality)], bumps: &BumpSet) -> Result<PathBuf> {
        *self.colors.borrow_mut() = segments.iter().map(|(_, q)| q.color()).collect();
        *self.bumps.borrow_mut() = bumps.len();
        fs::write(&self.map, "<html></html>")?;
        Ok(self.map.clone())
    }
}

struct FakeCapturer {
    fail: bool,
}

impl road_quality_rater::render::ImageCapturer for FakeCapturer {
    fn capture(&self, map: &Path) -> Result<PathBuf> {
        if self.fail {
            bail!("browser crashed");
        }
        let image = map.with_extension("png");
        fs::write(&image, "png")?;
        Ok(image)
    }
}

#[derive(Default)]
struct FakeWriter {
    fail: bool,
    written: RefCell<Option<(PathBuf, RoadReport)>>,
}

impl road_quality_rater::render::ReportWriter for FakeWriter {
    fn write(&self, image: &Path, report: &RoadReport) -> Result<PathBuf> {
        if self.fail {
            bail!("disk full");
        }
        *self.written.borrow_mut() = Some((image.to_path_buf(), report.clone()));
        Ok(PathBuf::from("/results/road_statistics.xlsx"))
    }
}

/// Copies the fixture trip into a fresh directory.
fn stage(name: &str) -> (PathBuf, TripFiles) {
    let dir = std::env::temp_dir().join(format!("road_quality_rater_it_{}", name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let accel = dir.join(format!("accel_data_{}.csv", STAMP));
    let gps = dir.join(format!("gps_data_{}.csv", STAMP));
    fs::copy(fixtures.join(format!("accel_data_{}.csv", STAMP)), &accel).unwrap();
    fs::copy(fixtures.join(format!("gps_data_{}.csv", STAMP)), &gps).unwrap();

    (dir, TripFiles::new(accel, gps))
}

#[test]
fn test_full_pipeline() {
    let (dir, files) = stage("full");
    let archive = dir.join("data");
    let renderer = FakeRenderer::new(&dir);
    let capturer = FakeCapturer { fail: false };
    let writer = FakeWriter::default();
    let collaborators = Collaborators {
        renderer: &renderer,
        capturer: &capturer,
        writer: &writer,
    };

    let outcome = process_trip(&files, &archive, SEGMENT_DISTANCE_THRESHOLD, &collaborators);

    let (report, artifacts) = match outcome {
        TripOutcome::Completed { report, artifacts } => (report, artifacts),
        other => panic!("trip should complete: {:?}", other),
    };

    assert_eq!(report.duration_text(), "0:00:10");
    assert_eq!(report.distance_text(), "0.44");
    assert_eq!(report.bump_counts.total, 2);
    assert_eq!(report.bump_counts.big, 1);
    assert_eq!(report.bump_counts.medium, 0);
    assert_eq!(report.bump_counts.small, 1);
    assert_eq!(report.rating, Rating::Poor);
    assert_eq!(report.segments.excellent, 2);
    assert_eq!(report.segments.fair, 2);

    assert_eq!(*renderer.colors.borrow(), ["blue", "yellow", "yellow", "blue"]);
    assert_eq!(*renderer.bumps.borrow(), 2);

    let (image, written) = writer.written.borrow().clone().unwrap();
    assert_eq!(image, dir.join("map.png"));
    assert_eq!(written, report);
    assert_eq!(artifacts.map, dir.join("map.html"));
    assert!(artifacts.map.exists());
    assert!(artifacts.image.exists());
    assert_eq!(artifacts.report, PathBuf::from("/results/road_statistics.xlsx"));

    assert!(!files.accel.exists());
    assert!(!files.gps.exists());
    assert!(archive.join(format!("accel_data_{}.csv", STAMP)).exists());
    assert!(archive.join(format!("gps_data_{}.csv", STAMP)).exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_load_trip_drops_unmatched_rows() {
    let (dir, files) = stage("load");

    let trip = load_trip(&files).unwrap().unwrap();

    // The accelerometer log has one extra sample before the first fix.
    assert_eq!(trip.len(), 11);
    assert_eq!(trip.records()[0].time, "08:00:00");
    assert_eq!(trip.records()[4].z, 12.5);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_header_only_log_discards_trip() {
    let (dir, files) = stage("header_only");
    fs::write(&files.gps, "latitude,longitude,time\n").unwrap();
    let renderer = FakeRenderer::new(&dir);
    let capturer = FakeCapturer { fail: false };
    let writer = FakeWriter::default();
    let collaborators = Collaborators {
        renderer: &renderer,
        capturer: &capturer,
        writer: &writer,
    };

    let outcome = process_trip(&files, &dir.join("data"), SEGMENT_DISTANCE_THRESHOLD, &collaborators);

    assert!(matches!(outcome, TripOutcome::Discarded { .. }));
    assert!(!files.accel.exists());
    assert!(!files.gps.exists());
    assert!(writer.written.borrow().is_none());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_log_discards_trip() {
    let (dir, files) = stage("missing");
    fs::remove_file(&files.accel).unwrap();
    let renderer = FakeRenderer::new(&dir);
    let capturer = FakeCapturer { fail: false };
    let writer = FakeWriter::default();
    let collaborators = Collaborators {
        renderer: &renderer,
        capturer: &capturer,
        writer: &writer,
    };

    let outcome = process_trip(&files, &dir.join("data"), SEGMENT_DISTANCE_THRESHOLD, &collaborators);

    assert!(matches!(outcome, TripOutcome::Discarded { .. }));
    assert!(!files.gps.exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_disjoint_times_discard_trip() {
    let (dir, files) = stage("disjoint");
    fs::write(&files.gps, "latitude,longitude,time\n44.81,20.46,09:00:00\n").unwrap();
    let renderer = FakeRenderer::new(&dir);
    let capturer = FakeCapturer { fail: false };
    let writer = FakeWriter::default();
    let collaborators = Collaborators {
        renderer: &renderer,
        capturer: &capturer,
        writer: &writer,
    };

    let outcome = process_trip(&files, &dir.join("data"), SEGMENT_DISTANCE_THRESHOLD, &collaborators);

    let TripOutcome::Discarded { reason } = outcome else {
        panic!("trip should be discarded");
    };
    assert!(reason.contains("share no time values"));
    assert!(!files.accel.exists());
    assert!(!files.gps.exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_collaborator_failure_discards_trip() {
    let (dir, files) = stage("capture_fails");
    let archive = dir.join("data");
    let renderer = FakeRenderer::new(&dir);
    let capturer = FakeCapturer { fail: true };
    let writer = FakeWriter::default();
    let collaborators = Collaborators {
        renderer: &renderer,
        capturer: &capturer,
        writer: &writer,
    };

    let outcome = process_trip(&files, &archive, SEGMENT_DISTANCE_THRESHOLD, &collaborators);

    let TripOutcome::Discarded { reason } = outcome else {
        panic!("trip should be discarded");
    };
    assert!(reason.contains("browser crashed"));
    assert!(!files.accel.exists());
    assert!(!files.gps.exists());
    assert!(!archive.join(format!("accel_data_{}.csv", STAMP)).exists());
    assert!(!dir.join("map.html").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_writer_failure_removes_artifacts() {
    let (dir, files) = stage("writer_fails");
    let renderer = FakeRenderer::new(&dir);
    let capturer = FakeCapturer { fail: false };
    let writer = FakeWriter {
        fail: true,
        ..FakeWriter::default()
    };
    let collaborators = Collaborators {
        renderer: &renderer,
        capturer: &capturer,
        writer: &writer,
    };

    let outcome = process_trip(&files, &dir.join("data"), SEGMENT_DISTANCE_THRESHOLD, &collaborators);

    let TripOutcome::Discarded { reason } = outcome else {
        panic!("trip should be discarded");
    };
    assert!(reason.contains("disk full"));
    assert!(!files.accel.exists());
    assert!(!dir.join("map.html").exists());
    assert!(!dir.join("map.png").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_discover_staged_trip() {
    let (dir, files) = stage("discover");

    let trips = discover_trips(&dir).unwrap();

    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].accel, files.accel);
    assert_eq!(trips[0].gps, files.gps);
    assert_eq!(trips[0].artifact_stamp(), STAMP);

    fs::remove_dir_all(&dir).unwrap();
}
