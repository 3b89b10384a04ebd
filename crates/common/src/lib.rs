//! `lb-common` — Shared types and errors for the LayerBatch pipelines.
//!
//! This crate is the foundation that the document and pipeline crates
//! depend on. It defines the core abstractions:
//!
//! - **Types**: `LayerId`, `LayerKind` (document tree vocabulary)
//! - **Color**: `Rgb` with the sampling fallback constants
//! - **Options**: `ExportOptions`, `ImageFormat` (per-invocation export config)
//! - **Errors**: `DocumentError`, `DocumentResult` (thiserror-based)

pub mod color;
pub mod error;
pub mod options;
pub mod types;

// Re-export commonly used items at crate root
pub use color::Rgb;
pub use error::{DocumentError, DocumentResult};
pub use options::{ExportOptions, ImageFormat};
pub use types::{LayerId, LayerKind};
