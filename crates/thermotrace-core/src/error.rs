use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while preparing a ledger submission.
///
/// Every variant is terminal for the pipeline. Nothing here is retried;
/// the caller decides whether to surface it or exit.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("input file not found: {}", .path.display())]
    InputFileMissing { path: PathBuf },

    #[error("malformed {field} {input:?}: {reason}")]
    MalformedGeometry {
        field: &'static str,
        input: String,
        reason: String,
    },

    #[error("{field} must be a finite number, got {value}")]
    InvalidScore { field: &'static str, value: f64 },

    #[error("inconsistent inspection record: {0}")]
    InconsistentRecord(String),

    #[error("unknown organization {name:?} (known: {known})")]
    UnknownOrganization { name: String, known: String },

    /// `stderr` holds the client's diagnostic output as it was written.
    #[error("failed to upload {} to IPFS: {}", .path.display(), .stderr.trim())]
    UploadFailure { path: PathBuf, stderr: String },

    #[error("upload of {} timed out after {timeout:?}", .path.display())]
    UploadTimeout { path: PathBuf, timeout: Duration },

    #[error("failed to write submission script {}", .path.display())]
    ScriptWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid network configuration: {0}")]
    Config(String),

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize inspection record")]
    Serialize(#[from] serde_json::Error),
}

impl SubmitError {
    pub(crate) fn geometry(
        field: &'static str,
        input: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedGeometry {
            field,
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SubmitError> = std::result::Result<T, E>;
