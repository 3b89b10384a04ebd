//! Pipeline-level error types (thiserror-based).
//!
//! Per-unit failures (one layer's conversion, one folder's export) never
//! appear here — they are logged at the unit boundary and the batch
//! continues. These errors terminate a whole session.

use thiserror::Error;

use lb_common::DocumentError;

use crate::event::SessionOutcome;

/// Errors that terminate a conversion or export session.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No active document when the session started. Nothing was mutated.
    #[error("no document open")]
    NoDocument,

    /// The session found nothing to work on. Nothing was mutated.
    /// The string is the user-facing reason ("no maskable layers found",
    /// "no folder layers found").
    #[error("{0}")]
    NoTargets(&'static str),

    /// Export was started without a resolved output directory.
    #[error("no output directory selected")]
    NoOutputDirectory,

    /// Export options failed validation.
    #[error("invalid export options: {0}")]
    InvalidOptions(String),

    /// Cooperative cancellation was observed mid-session.
    #[error("cancelled by user")]
    Cancelled,

    /// The session worker thread could not be started.
    #[error("session start failed: {0}")]
    StartFailed(String),

    /// An unclassified document-host failure escalated past the unit
    /// boundary; snapshot-captured state was restored before surfacing.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

impl PipelineError {
    /// Map this error to the terminal session outcome. Cancellation is
    /// distinguished from failure.
    pub fn into_outcome(self) -> SessionOutcome {
        match self {
            Self::Cancelled => SessionOutcome::Cancelled,
            other => SessionOutcome::Failed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_maps_to_cancelled_outcome() {
        assert!(PipelineError::Cancelled.into_outcome().is_cancelled());
    }

    #[test]
    fn other_errors_map_to_failed_with_message() {
        let outcome = PipelineError::NoTargets("no folder layers found").into_outcome();
        assert_eq!(outcome.message(), Some("no folder layers found"));

        let outcome = PipelineError::NoDocument.into_outcome();
        assert_eq!(outcome.message(), Some("no document open"));
    }

    #[test]
    fn document_error_conversion() {
        let err: PipelineError =
            DocumentError::HostFailure("modal state busy".into()).into();
        assert!(err.to_string().contains("modal state busy"));
    }
}
