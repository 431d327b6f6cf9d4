//! CLI entry point for the Road Quality Rater tool.
//!
//! Provides subcommands for processing a single recorded trip, processing
//! every trip waiting in a directory, and rating figures directly.

use anyhow::Result;
use clap::{Parser, Subcommand};
use road_quality_rater::analyzers::analyzer::{
    Collaborators, TripFiles, TripOutcome, discover_trips, process_trip,
};
use road_quality_rater::analyzers::grade::rate;
use road_quality_rater::config::Settings;
use road_quality_rater::output::{XlsxReportWriter, print_json, print_pretty};
use road_quality_rater::render::{HeadlessBrowserCapturer, HtmlMapRenderer};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "road_quality_rater")]
#[command(about = "A tool to rate road quality from recorded GPS and accelerometer logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one trip from its accelerometer and GPS logs
    Process {
        /// Accelerometer log (x,y,z,time)
        #[arg(long, value_name = "CSV")]
        accel: PathBuf,

        /// GPS log (latitude,longitude,time)
        #[arg(long, value_name = "CSV")]
        gps: PathBuf,

        /// Directory processed logs are archived to [env: DATA_FOLDER]
        #[arg(short = 'd', long)]
        data_dir: Option<PathBuf>,

        /// Directory for maps, images and statistics [env: RESULTS_FOLDER]
        #[arg(short = 'r', long)]
        results_dir: Option<PathBuf>,
    },
    /// Process every accel_data_*/gps_data_* pair found in a directory
    Batch {
        /// Directory holding the recorded logs
        #[arg(short, long, default_value = ".")]
        input_dir: PathBuf,

        /// Directory processed logs are archived to [env: DATA_FOLDER]
        #[arg(short = 'd', long)]
        data_dir: Option<PathBuf>,

        /// Directory for maps, images and statistics [env: RESULTS_FOLDER]
        #[arg(short = 'r', long)]
        results_dir: Option<PathBuf>,
    },
    /// Rate a trip from its duration, length and bump count
    Rate {
        #[arg(long)]
        duration_minutes: f64,

        #[arg(long)]
        distance_km: f64,

        #[arg(long, allow_negative_numbers = true)]
        bumps: i64,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/road_quality_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("road_quality_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();

    match cli.command {
        Commands::Process {
            accel,
            gps,
            data_dir,
            results_dir,
        } => {
            apply_overrides(&mut settings, data_dir, results_dir);
            run_trip(&TripFiles::new(accel, gps), &settings)?;
        }
        Commands::Batch {
            input_dir,
            data_dir,
            results_dir,
        } => {
            apply_overrides(&mut settings, data_dir, results_dir);
            let trips = discover_trips(&input_dir)?;
            info!(input_dir = %input_dir.display(), trips = trips.len(), "Trips found");

            let mut completed = 0;
            for trip in &trips {
                if run_trip(trip, &settings)? {
                    completed += 1;
                }
            }
            info!(completed, discarded = trips.len() - completed, "Batch finished");
        }
        Commands::Rate {
            duration_minutes,
            distance_km,
            bumps,
        } => {
            let rating = rate(duration_minutes, distance_km, bumps);
            info!(duration_minutes, distance_km, bumps, %rating, "Road rating");
            println!("{}", rating);
        }
    }

    Ok(())
}

fn apply_overrides(settings: &mut Settings, data_dir: Option<PathBuf>, results_dir: Option<PathBuf>) {
    if let Some(dir) = data_dir {
        settings.data_dir = dir;
    }
    if let Some(dir) = results_dir {
        settings.results_dir = dir;
    }
}

/// Processes one trip with the on-disk collaborators. Returns whether the
/// trip produced a report.
fn run_trip(files: &TripFiles, settings: &Settings) -> Result<bool> {
    let stamp = files.artifact_stamp();
    let renderer = HtmlMapRenderer::new(&settings.results_dir, &stamp);
    let capturer = HeadlessBrowserCapturer::new(
        &settings.chrome_bin,
        &settings.results_dir,
        &stamp,
        settings.capture_delay,
    );
    let writer = XlsxReportWriter::new(&settings.results_dir, &stamp);
    let collaborators = Collaborators {
        renderer: &renderer,
        capturer: &capturer,
        writer: &writer,
    };

    let span = tracing::info_span!("trip", stamp = %stamp);
    let _enter = span.enter();

    match process_trip(
        files,
        &settings.data_dir,
        settings.segment_distance_m,
        &collaborators,
    ) {
        TripOutcome::Completed { report, artifacts } => {
            print_pretty(&report);
            print_json(&report)?;
            info!(
                map = %artifacts.map.display(),
                image = %artifacts.image.display(),
                "Saving road statistics done"
            );
            Ok(true)
        }
        TripOutcome::Discarded { reason } => {
            warn!(%reason, "Trip discarded");
            Ok(false)
        }
    }
}
