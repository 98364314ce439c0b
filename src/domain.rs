use derive_setters::Setters;
use polars::error::PolarsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::pagination::DEFAULT_PAGE_SIZE;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Loading failed: {0}")]
    LoadingFailed(String),
    #[error("File not found")]
    FileNotFound,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Unknown file type")]
    UnknownFileType,
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct ViewerConfig {
    pub page_size: usize,
    pub event_poll_time: u64,
    pub max_column_width: usize,
    /// Column the global query is mirrored into.
    pub searchable_column: Option<String>,
    /// Table title, also the export file name base.
    pub title: String,
    pub export_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            event_poll_time: 100,
            max_column_width: 40,
            searchable_column: None,
            title: "data".to_string(),
            export_dir: PathBuf::from("."),
        }
    }
}
