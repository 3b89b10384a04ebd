//! Mask-to-fill conversion pipeline.
//!
//! The pipeline runs three phases over one session:
//!
//! 1. **Pre-processing** — capture the mask/visibility state of every
//!    folder, then suppress the mask effect on folders that carry one so
//!    it cannot interfere with per-layer isolation.
//! 2. **Main-processing** — walk all leaf layers in pre-order; convert
//!    each untouched masked leaf via the worker; report one progress
//!    unit per leaf visited (so the denominator equals leaf count).
//! 3. **Post-processing** — delete the recorded originals, clip each
//!    recorded fill to the layer below it, strip the transient `_fill`
//!    suffix document-wide, and restore the folder mask state captured
//!    in Pre-processing.
//!
//! Any pipeline-level error (and any cancellation) runs the same
//! best-effort folder-mask restore before surfacing; fill creations and
//! deletions already committed are not rolled back.

mod worker;

use std::collections::HashSet;

use tracing::{debug, info};

use lb_common::LayerId;
use lb_document::{flatten_all, flatten_leaves, DocumentHost, FolderMaskSnapshot};

use crate::cancel::CancelToken;
use crate::error::PipelineError;
use crate::event::Reporter;

/// Phase of the conversion state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConversionPhase {
    Idle,
    PreProcessing,
    MainProcessing,
    PostProcessing,
    Completed,
    Failed,
    Cancelled,
}

/// What a completed conversion session did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Leaves visited by Main-processing (equals the progress total).
    pub leaves_visited: usize,
    /// Masked leaves actually converted to fills.
    pub converted: usize,
}

/// Session-scoped conversion state, created per invocation and passed
/// between phases. Never outlives the session.
#[derive(Debug, Default)]
pub(crate) struct ConversionSession {
    /// Current phase. Control flow is driven by the call sequence in
    /// `drive`, not by this field; it exists so every transition gets a
    /// structured log record.
    phase: ConversionPhase,
    /// Idempotence guard: leaf ids already handled this session.
    pub(crate) processed: HashSet<LayerId>,
    /// Originals to remove in Post-processing.
    pub(crate) layers_to_delete: Vec<LayerId>,
    /// Derived fills to receive a clipping mask in Post-processing.
    /// Every entry has a corresponding entry in `layers_to_delete`.
    pub(crate) fill_layers_to_clip: Vec<LayerId>,
    /// Folder mask/visibility state captured in Pre-processing.
    pub(crate) folder_mask_states: FolderMaskSnapshot,
}

impl Default for ConversionPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl ConversionSession {
    fn enter(&mut self, phase: ConversionPhase) {
        debug!(from = ?self.phase, to = ?phase, "Conversion phase transition");
        self.phase = phase;
    }
}

/// Run a full conversion session against `host`.
///
/// Synchronous core; [`ConversionPipeline::start`](crate::ConversionPipeline::start)
/// wraps it in a worker thread. Reports log lines and per-leaf progress
/// through `reporter`; polls `cancel` between phases and between leaves.
pub fn run_conversion<H: DocumentHost + ?Sized>(
    host: &mut H,
    reporter: &Reporter,
    cancel: &CancelToken,
) -> Result<ConversionSummary, PipelineError> {
    if !host.is_open() {
        reporter.log("No document is open");
        return Err(PipelineError::NoDocument);
    }

    // Target check before any mutation: a document with nothing maskable
    // is reported without touching it.
    let leaves = flatten_leaves(host)?;
    let mut maskable = 0usize;
    for &leaf in &leaves {
        if host.has_mask(leaf)? {
            maskable += 1;
        }
    }
    if maskable == 0 {
        reporter.log("No maskable layers found in document.");
        return Err(PipelineError::NoTargets("no maskable layers found"));
    }
    info!(leaves = leaves.len(), maskable, "Starting mask conversion");

    let mut session = ConversionSession::default();
    let result = drive(host, reporter, cancel, &mut session);
    match &result {
        Ok(summary) => {
            session.enter(ConversionPhase::Completed);
            info!(
                converted = summary.converted,
                leaves = summary.leaves_visited,
                "Conversion completed"
            );
        }
        Err(PipelineError::Cancelled) => {
            reporter.log("Restoring folder mask states...");
            session.folder_mask_states.restore(host);
            session.enter(ConversionPhase::Cancelled);
        }
        Err(e) => {
            reporter.log(format!("Error: {e}"));
            reporter.log("Restoring folder mask states...");
            session.folder_mask_states.restore(host);
            session.enter(ConversionPhase::Failed);
        }
    }
    result
}

fn drive<H: DocumentHost + ?Sized>(
    host: &mut H,
    reporter: &Reporter,
    cancel: &CancelToken,
    session: &mut ConversionSession,
) -> Result<ConversionSummary, PipelineError> {
    session.enter(ConversionPhase::PreProcessing);
    reporter.log("Step 1: Starting pre-processing...");
    pre_process(host, reporter, session)?;
    if cancel.is_requested() {
        return Err(PipelineError::Cancelled);
    }

    session.enter(ConversionPhase::MainProcessing);
    reporter.log("Step 2: Starting main conversion process...");
    let summary = main_process(host, reporter, cancel, session)?;
    if cancel.is_requested() {
        return Err(PipelineError::Cancelled);
    }

    session.enter(ConversionPhase::PostProcessing);
    reporter.log("Step 3: Starting post-processing...");
    post_process(host, reporter, session)?;

    reporter.log("All processing completed successfully");
    Ok(summary)
}

/// Capture folder mask state, then hide masks on folders that carry one.
///
/// Capture completes for every folder before the first suppression, so a
/// record never observes state this session itself changed.
fn pre_process<H: DocumentHost + ?Sized>(
    host: &mut H,
    reporter: &Reporter,
    session: &mut ConversionSession,
) -> Result<(), PipelineError> {
    reporter.log("Saving folder mask states...");
    session.folder_mask_states = FolderMaskSnapshot::capture(host)?;
    for record in session.folder_mask_states.masked() {
        if let Ok(name) = host.name(record.id) {
            reporter.log(format!("Saved mask state for folder \"{name}\""));
        }
    }
    reporter.log(format!(
        "Saved mask states for {} folders",
        session.folder_mask_states.records().len()
    ));

    reporter.log("Hiding folder masks...");
    for record in session.folder_mask_states.masked() {
        host.set_mask_disabled(record.id, true)?;
        if let Ok(name) = host.name(record.id) {
            reporter.log(format!("Hiding mask for folder \"{name}\""));
        }
    }
    reporter.log("All folder masks hidden");

    reporter.log("Pre-processing completed successfully");
    Ok(())
}

/// Walk leaves in pre-order and convert each untouched masked one.
fn main_process<H: DocumentHost + ?Sized>(
    host: &mut H,
    reporter: &Reporter,
    cancel: &CancelToken,
    session: &mut ConversionSession,
) -> Result<ConversionSummary, PipelineError> {
    // Registries are session-scoped: cleared at the start of every
    // Main-processing run.
    session.processed.clear();
    session.layers_to_delete.clear();
    session.fill_layers_to_clip.clear();

    let leaves = flatten_leaves(host)?;
    reporter.started(leaves.len() as u64);

    let mut converted = 0usize;
    for &leaf in &leaves {
        if cancel.is_requested() {
            reporter.log("Conversion cancelled by user.");
            return Err(PipelineError::Cancelled);
        }

        if host.has_mask(leaf)? && !session.processed.contains(&leaf) {
            session.processed.insert(leaf);
            if worker::convert_masked_leaf(host, leaf, session, reporter) {
                converted += 1;
            }
        }

        // One unit per leaf visited, converted or not.
        reporter.progress();
    }

    reporter.log("Main processing completed");
    Ok(ConversionSummary {
        leaves_visited: leaves.len(),
        converted,
    })
}

/// Delete originals, clip fills, strip the transient suffix, restore
/// folder mask state.
fn post_process<H: DocumentHost + ?Sized>(
    host: &mut H,
    reporter: &Reporter,
    session: &mut ConversionSession,
) -> Result<(), PipelineError> {
    reporter.log("Deleting original layers...");
    for &layer in &session.layers_to_delete {
        let name = host.name(layer).unwrap_or_else(|_| layer.to_string());
        match host.delete_layer(layer) {
            Ok(()) => reporter.log(format!("Removed layer \"{name}\"")),
            Err(e) => reporter.log(format!("Error removing layer: {e}")),
        }
    }

    reporter.log("Applying clipping masks...");
    for &fill in &session.fill_layers_to_clip {
        match host.clip_to_below(fill) {
            Ok(()) => {
                if let Ok(name) = host.name(fill) {
                    reporter.log(format!("Created clipping mask for layer \"{name}\""));
                }
            }
            Err(e) => reporter.log(format!("Error creating clipping mask: {e}")),
        }
    }

    // Strip the transient suffix document-wide. This deliberately also
    // touches layers that carried the suffix before this session; the
    // narrow risk is accepted to keep the cleanup idempotent.
    reporter.log("Renaming layers (removing '_fill' suffix)...");
    for id in flatten_all(host)? {
        let name = host.name(id)?;
        if let Some(stripped) = name.strip_suffix("_fill") {
            host.set_name(id, stripped)?;
        }
    }

    reporter.log("Restoring folder mask states...");
    session.folder_mask_states.restore(host);

    reporter.log("Post-processing completed");
    Ok(())
}
