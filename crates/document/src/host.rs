//! The `DocumentHost` capability trait.
//!
//! The pipelines treat the document as a single shared, globally-mutable
//! resource owned by an external host. Every read and every mutation goes
//! through this trait, which keeps the core logic host-agnostic and makes
//! an in-memory double ([`SimDocument`](crate::sim::SimDocument))
//! possible.
//!
//! Each method models one host round-trip. Between two calls, caller-side
//! state (registries, snapshots) can be assumed stable; no two mutating
//! calls ever run concurrently against the same document because the host
//! value moves into the session that drives it.

use std::path::Path;

use lb_common::{DocumentResult, ExportOptions, LayerId, LayerKind, Rgb};

/// Read and mutate a layered document owned by an external host.
///
/// Mutations are expected to either fully apply or fail with a
/// [`DocumentError`](lb_common::DocumentError); partial application is the
/// host's problem, not the caller's.
pub trait DocumentHost {
    // --- reads ---

    /// Whether a document is open at all. Sessions report a distinguished
    /// failure and touch nothing when this is false.
    fn is_open(&self) -> bool;

    /// Top-level layers in stacking order (index 0 is topmost).
    fn root_layers(&self) -> DocumentResult<Vec<LayerId>>;

    /// Direct children of a folder in stacking order. A leaf layer has no
    /// children; asking for them is a kind error.
    fn children(&self, id: LayerId) -> DocumentResult<Vec<LayerId>>;

    fn kind(&self, id: LayerId) -> DocumentResult<LayerKind>;

    fn name(&self, id: LayerId) -> DocumentResult<String>;

    fn is_visible(&self, id: LayerId) -> DocumentResult<bool>;

    /// Whether the layer currently carries a (pixel) mask.
    fn has_mask(&self, id: LayerId) -> DocumentResult<bool>;

    /// Sample a representative color from the layer's content.
    ///
    /// Hosts may be unable to sample (empty layer, non-raster content);
    /// callers are expected to fall back to [`Rgb::FALLBACK`] rather than
    /// treat this as fatal.
    fn sample_color(&self, id: LayerId) -> DocumentResult<Rgb>;

    // --- mutations ---

    fn set_visible(&mut self, id: LayerId, visible: bool) -> DocumentResult<()>;

    fn set_name(&mut self, id: LayerId, name: &str) -> DocumentResult<()>;

    /// Create a new solid-fill layer at the top of the root stack and
    /// return its id. Callers reposition it afterwards.
    fn create_fill_layer(&mut self, color: Rgb) -> DocumentResult<LayerId>;

    fn delete_layer(&mut self, id: LayerId) -> DocumentResult<()>;

    /// Duplicate a layer (and its mask, if any) directly above the
    /// original, optionally renaming the copy.
    fn duplicate_layer(&mut self, id: LayerId, new_name: Option<&str>) -> DocumentResult<LayerId>;

    /// Reposition `layer` directly beneath `reference` in stacking order,
    /// within `reference`'s container.
    fn move_below(&mut self, layer: LayerId, reference: LayerId) -> DocumentResult<()>;

    /// Copy the mask of `source` onto `target`. Fails when `source` has
    /// no mask.
    fn duplicate_mask(&mut self, source: LayerId, target: LayerId) -> DocumentResult<()>;

    /// Suppress (or un-suppress) the visual effect of a layer's mask
    /// without detaching it. Fails when the layer has no mask.
    fn set_mask_disabled(&mut self, id: LayerId, disabled: bool) -> DocumentResult<()>;

    /// Establish a clipping-mask association: the layer's visible pixels
    /// become bounded by the layer stacked immediately below it.
    fn clip_to_below(&mut self, id: LayerId) -> DocumentResult<()>;

    /// Render the currently visible document content to an image file.
    fn export_image(&mut self, path: &Path, options: &ExportOptions) -> DocumentResult<()>;
}
