//! Runtime settings read from the environment (and `.env`).

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::analyzers::segments::SEGMENT_DISTANCE_THRESHOLD;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Where processed logs are archived.
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    pub segment_distance_m: f64,
    pub chrome_bin: String,
    pub capture_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            results_dir: PathBuf::from("./results"),
            segment_distance_m: SEGMENT_DISTANCE_THRESHOLD,
            chrome_bin: "chromium".to_string(),
            capture_delay: Duration::from_millis(3000),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; unset or unparsable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();

        let segment_distance_m = match lookup("SEGMENT_DISTANCE_M").map(|v| v.parse::<f64>()) {
            Some(Ok(v)) if v > 0.0 => v,
            Some(_) => {
                warn!("SEGMENT_DISTANCE_M must be a positive number, using default");
                defaults.segment_distance_m
            }
            None => defaults.segment_distance_m,
        };

        let capture_delay = match lookup("CAPTURE_DELAY_MS").map(|v| v.parse::<u64>()) {
            Some(Ok(ms)) => Duration::from_millis(ms),
            Some(Err(e)) => {
                warn!(error = %e, "CAPTURE_DELAY_MS is not a number, using default");
                defaults.capture_delay
            }
            None => defaults.capture_delay,
        };

        Self {
            data_dir: lookup("DATA_FOLDER").map(PathBuf::from).unwrap_or(defaults.data_dir),
            results_dir: lookup("RESULTS_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            segment_distance_m,
            chrome_bin: lookup("CHROME_BIN").unwrap_or(defaults.chrome_bin),
            capture_delay,
        }
    }
}
