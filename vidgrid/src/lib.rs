use std::path::PathBuf;

use thiserror::Error;

pub mod cli;
pub mod discover;
pub mod filter;
pub mod gif;
pub mod grid;
pub mod layout;
pub mod logging;
pub mod opts;
pub mod probe;
pub mod recurse;
pub mod render;

// Default glob used by every tool when no pattern is given
pub const DEFAULT_PATTERN: &str = "*.mp4";

// One erring to rule them all...
#[derive(Error, Debug)]
pub enum GridError {
    #[error("No files matching '{pattern}' found in {dir}")]
    NoInputsFound { dir: PathBuf, pattern: String },
    #[error("Number of captions ({captions}) must match number of videos ({videos})")]
    CaptionCountMismatch { captions: usize, videos: usize },
    #[error("Video file not found: {0}")]
    VideoNotFound(PathBuf),
    #[error("Could not read metadata for {path}: {reason}")]
    MetadataUnavailable { path: PathBuf, reason: String },
    #[error("Failed to extract frame from {0}")]
    ExtractionFailed(PathBuf),
    #[error("Encoding {output} failed (exit code {code:?})")]
    EncodeFailed { output: PathBuf, code: Option<i32> },
    #[error("Directory '{0}' does not exist")]
    DirectoryNotFound(PathBuf),
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    #[error("Could not launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unexpected IO error")]
    IoErr(#[from] std::io::Error),
    #[error("Unexpected Json error")]
    JsonErr(#[from] serde_json::Error),
    #[error("Invalid glob pattern")]
    PatternErr(#[from] glob::PatternError),
    #[error("Directory walk error")]
    WalkErr(#[from] walkdir::Error),
}

impl GridError {
    // Process exit status for this failure; a failed encode hands back the
    // renderer's own code when there is one
    pub fn exit_code(&self) -> i32 {
        match self {
            GridError::EncodeFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}
