//! Collaborators that turn a classified route into map, image and report
//! artifacts.

mod capture;
mod collaborators;
mod html;

pub use capture::HeadlessBrowserCapturer;
pub use collaborators::{ImageCapturer, MapRenderer, ReportWriter};
pub use html::HtmlMapRenderer;

use chrono::Local;

/// Local timestamp used to name the artifacts of one run.
pub fn run_stamp() -> String {
    Local::now().format("%Y_%m_%d_%H_%M_%S").to_string()
}
