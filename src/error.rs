//! Error taxonomy shared by every pipeline stage.
//!
//! Each variant carries the file, field, line or axis needed to act on it
//! without re-running the pipeline under extra logging.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The upstream producer never wrote the input file.
    #[error(
        "source unavailable: {} does not exist (run the upstream simulation that produces it first)",
        path.display()
    )]
    SourceUnavailable { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A data row whose column count differs from the schema.
    #[error(
        "{}:{line}: malformed row: schema declares {expected} columns, found {found}",
        path.display()
    )]
    MalformedSchema {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A cell that does not parse as a number.
    #[error(
        "{}:{line}: malformed value for field `{field}`: {value:?} is not a number",
        path.display()
    )]
    MalformedValue {
        path: PathBuf,
        line: usize,
        field: String,
        value: String,
    },

    /// A log-scaled axis over data that is zero or negative.
    #[error(
        "invalid axis scale: {axis} axis is log-scaled but series `{series}` has non-positive value {value} at index {index}"
    )]
    InvalidAxisScale {
        axis: String,
        series: String,
        index: usize,
        value: f64,
    },

    /// The rendered figure could not be persisted.
    #[error("failed to write {}: {reason}", path.display())]
    OutputWriteFailure { path: PathBuf, reason: String },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("unknown table `{0}`")]
    UnknownTable(String),

    #[error("table `{table}` has no field `{field}`")]
    UnknownField { table: String, field: String },

    #[error("table `{table}` already has a field named `{field}`")]
    DuplicateField { table: String, field: String },

    #[error("table `{table}`: field `{field}` has {found} samples, expected {expected}")]
    LengthMismatch {
        table: String,
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid derivation: {0}")]
    InvalidDerivation(String),

    #[error("invalid plot: {0}")]
    InvalidPlot(String),

    /// The drawing backend failed while rasterizing a figure.
    #[error("failed to draw {}: {reason}", path.display())]
    Draw { path: PathBuf, reason: String },

    #[error("interactive presentation failed: {0}")]
    Presentation(String),

    #[error("config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("unknown preset `{name}` (available: {})", known.join(", "))]
    UnknownPreset {
        name: String,
        known: &'static [&'static str],
    },

    #[error("pipeline stage out of order: expected {expected}, pipeline is {actual}")]
    StageOrder {
        expected: &'static str,
        actual: &'static str,
    },
}

impl Error {
    /// Classify an I/O failure on an input path, keeping "not there" apart
    /// from "there but unreadable".
    pub fn from_read(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        if err.kind() == io::ErrorKind::NotFound {
            Error::SourceUnavailable { path }
        } else {
            Error::SourceRead { path, source: err }
        }
    }

    pub fn write_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::OutputWriteFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_source_unavailable() {
        let err = Error::from_read(
            "/data/lorenz.dat",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        match err {
            Error::SourceUnavailable { path } => {
                assert_eq!(path, PathBuf::from("/data/lorenz.dat"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn permission_denied_is_not_source_unavailable() {
        let err = Error::from_read(
            "/data/lorenz.dat",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, Error::SourceRead { .. }));
    }

    #[test]
    fn messages_name_path_and_line() {
        let err = Error::MalformedValue {
            path: PathBuf::from("traj.txt"),
            line: 7,
            field: "y".into(),
            value: "nan?".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("traj.txt:7"), "{msg}");
        assert!(msg.contains("`y`"), "{msg}");
    }
}
