use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExifToolError {
    #[error("could not start '{}': {source}", .executable.display())]
    ExifToolNotFound {
        executable: PathBuf,
        source: std::io::Error,
    },

    #[error("error when piping exiftool streams: {0}")]
    Pipe(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no final token found ({buffered} bytes buffered)")]
    NoFinalToken { buffered: usize },

    #[error("error reading exif data: {}", .path.display())]
    EmptyResponse { path: PathBuf },

    #[error("error while reading exiftool output for {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        source: Box<ExifToolError>,
    },

    #[error("error during unmarshaling of {} at '{json_path}' ({payload}): {source}", .path.display())]
    Decode {
        path: PathBuf,
        json_path: String,
        payload: String,
        source: serde_json::Error,
    },

    #[error("Expected a single-element JSON array from exiftool. file={}, elements={found}", .path.display())]
    UnexpectedFormat { path: PathBuf, found: usize },

    #[error("path cannot be sent to exiftool: {path:?}")]
    InvalidPath { path: PathBuf },

    #[error("zero-date string in tag {tag}")]
    ZeroDate { tag: String },

    #[error("parsing time error formatting '{value}' as '{format}': {source}")]
    DateParse {
        value: String,
        format: &'static str,
        source: chrono::ParseError,
    },

    #[error("cannot find a suitable exif creation date for {}: {reason}", .path.display())]
    CreationDateNotFound {
        path: PathBuf,
        reason: CreationDateIssue,
    },

    #[error("error while closing exiftool: {}", join_errors(.0))]
    Close(Vec<ExifToolError>),

    #[error("exiftool session is already closed")]
    SessionClosed,

    #[error("exiftool session lock poisoned by a panicking request")]
    Poisoned,
}

/// Why no creation date could be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationDateIssue {
    /// Every candidate tag was absent, a zero-date or unparseable.
    NoCandidates,
    /// The earliest candidate is a placeholder at or before the epoch year.
    Placeholder(i32),
}

impl fmt::Display for CreationDateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreationDateIssue::NoCandidates => f.write_str("no usable date candidates"),
            CreationDateIssue::Placeholder(year) => {
                write!(f, "earliest candidate has placeholder year {}", year)
            }
        }
    }
}

impl ExifToolError {
    /// Returns `true` for errors after which the record cannot be used
    /// meaningfully. The library never terminates the process itself.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExifToolError::CreationDateNotFound { .. })
    }
}

fn join_errors(errors: &[ExifToolError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
