//! `lb-document` — Document access layer for the LayerBatch pipelines.
//!
//! This crate provides:
//!
//! - **`DocumentHost`**: The capability trait through which the pipelines
//!   read and mutate the externally-owned layer tree. Every call is
//!   fallible; the pipelines never touch a document any other way.
//! - **`SimDocument`**: An arena-backed in-memory host implementation.
//!   It is a first-class module (not test-only) so the CLI and downstream
//!   crates can drive the pipelines without a real host, and it records
//!   exports and supports fault injection for error-path tests.
//! - **`traverse`**: Pre-order tree flattening (all nodes / folders only /
//!   leaves only).
//! - **`snapshot`**: Visibility and folder-mask state capture with
//!   best-effort, idempotent restore.
//!
//! # Architecture
//!
//! ```text
//! pipelines (lb-pipeline)
//!     │  reads + mutations, all fallible
//!     ▼
//! DocumentHost (trait)
//!     ├── SimDocument        (in-memory arena, exports recorded)
//!     └── <real host bridge> (out of tree)
//! ```

pub mod host;
pub mod sim;
pub mod snapshot;
pub mod traverse;

// Re-export primary types at crate root for convenience.
pub use host::DocumentHost;
pub use sim::{SimDocument, SimExport};
pub use snapshot::{FolderMaskRecord, FolderMaskSnapshot, VisibilitySnapshot};
pub use traverse::{flatten_all, flatten_folders, flatten_leaves};
