//! Document-host error types (thiserror-based).
//!
//! Every host operation the pipelines invoke is fallible; these errors
//! describe why a single read or mutation against the document failed.
//! Pipeline-level outcomes (cancelled, nothing to do) live in the
//! pipeline crate.

use thiserror::Error;

use crate::types::{LayerId, LayerKind};

/// Errors from individual document-host operations.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The referenced layer does not exist (deleted, or never existed).
    #[error("Layer {0} not found")]
    LayerNotFound(LayerId),

    /// An operation that requires a folder was given a leaf, or vice versa.
    #[error("Layer {id} has kind {actual}, expected {expected}")]
    WrongKind {
        id: LayerId,
        expected: LayerKind,
        actual: LayerKind,
    },

    /// The layer carries no mask, but a mask operation was requested.
    #[error("Layer {0} has no mask")]
    NoMask(LayerId),

    /// A stacking-order move referenced a layer in a different container.
    #[error("Layer {layer} and reference {reference} are not siblings")]
    NotSiblings { layer: LayerId, reference: LayerId },

    /// Color sampling is not possible for this layer (empty, non-raster).
    #[error("Cannot sample a color from layer {0}")]
    SamplingUnavailable(LayerId),

    /// The host rejected or failed the operation for its own reasons.
    #[error("Host operation failed: {0}")]
    HostFailure(String),

    /// File I/O error during export.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for document-host operations.
pub type DocumentResult<T> = Result<T, DocumentError>;
