//! Error types for the doc2md service.
//!
//! Two error types mirror the two sides of the conversion boundary:
//!
//! * [`Doc2MdError`] — everything that can end a request: a bad upload, a
//!   failed write of the temporary artifact, a converter failure, or a worker
//!   that never came back. Each variant maps to exactly one HTTP status in
//!   [`crate::server`].
//!
//! * [`ConverterError`] — what a [`crate::backend::Converter`] reports. The
//!   request layer wraps it in [`Doc2MdError::Conversion`] and keeps its
//!   message intact so the client sees the underlying cause.
//!
//! Failures while deleting a temporary artifact are not represented here.
//! They are logged by [`crate::pipeline::artifact`] and never reach a caller.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// All errors that terminate a conversion request.
#[derive(Debug, Error)]
pub enum Doc2MdError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// The uploaded filename has no usable extension.
    #[error("File must have a valid extension (got '{filename}')")]
    MissingExtension { filename: String },

    /// The multipart body did not contain the expected field.
    #[error("Missing '{field}' field in multipart upload")]
    MissingField { field: &'static str },

    /// The multipart body or the upload stream could not be read.
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// The upload exceeded the configured body limit.
    #[error("Upload exceeds the maximum allowed size: {0}")]
    PayloadTooLarge(String),

    // ── Server errors ─────────────────────────────────────────────────────
    /// The temporary artifact could not be created or written.
    #[error("Failed to write temporary file '{path}': {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The converter reported a failure.
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConverterError),

    /// The conversion did not finish within the configured limit.
    #[error("Conversion timed out after {limit:?}")]
    Timeout { limit: Duration },

    /// The blocking worker panicked or was cancelled.
    #[error("Conversion worker failed: {0}")]
    WorkerFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Doc2MdError {
    /// Whether the request failed because of what the client sent.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Doc2MdError::MissingExtension { .. }
                | Doc2MdError::MissingField { .. }
                | Doc2MdError::MalformedUpload(_)
                | Doc2MdError::PayloadTooLarge(_)
        )
    }

    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Doc2MdError::MissingExtension { .. } => "MISSING_EXTENSION",
            Doc2MdError::MissingField { .. } => "MISSING_FIELD",
            Doc2MdError::MalformedUpload(_) => "MALFORMED_UPLOAD",
            Doc2MdError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Doc2MdError::ArtifactWrite { .. } => "ARTIFACT_WRITE_FAILED",
            Doc2MdError::Conversion(_) => "CONVERSION_FAILED",
            Doc2MdError::Timeout { .. } => "CONVERSION_TIMEOUT",
            Doc2MdError::WorkerFailed(_) => "WORKER_FAILED",
            Doc2MdError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

impl From<std::convert::Infallible> for Doc2MdError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// A failure reported by a converter backend.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// The converter executable could not be started.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran but exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    Exited {
        program: String,
        status: String,
        stderr: String,
    },

    /// The converter succeeded but left no markdown where expected.
    #[error("'{program}' produced no markdown at '{path}'")]
    MissingOutput { program: String, path: PathBuf },

    /// Scratch space for the converter could not be prepared or read.
    #[error("converter I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The converter emitted bytes that are not UTF-8.
    #[error("converter output is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The converter was stopped because its deadline passed.
    #[error("'{program}' was stopped at its deadline")]
    DeadlineExceeded { program: String },

    /// Any other converter-specific failure.
    #[error("{0}")]
    Failed(String),
}
