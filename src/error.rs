//! Error taxonomy shared by the loading, merging and segmentation stages.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("{} is empty", .0.display())]
    EmptyData(PathBuf),

    #[error("both data files must have a '{column}' column to merge")]
    MissingKey { column: String },

    #[error("sensor logs share no time values")]
    NoOverlap,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
