//! `lb-pipeline` — Batch automation pipelines for layered documents.
//!
//! Two workflows, both driven through the
//! [`DocumentHost`](lb_document::DocumentHost) capability interface:
//!
//! - **Mask conversion** ([`convert`]): turn every masked leaf layer
//!   into a solid-fill layer carrying an equivalent clipping mask, in a
//!   three-phase pipeline with snapshot/restore cleanup.
//! - **Folder export** ([`export`]): render each folder-group to its own
//!   image file by isolating it, exporting, and restoring visibility.
//!
//! Progress, log lines, and the terminal outcome are streamed via a
//! crossbeam channel so a UI can display them and allow cancellation.
//!
//! # Architecture
//!
//! ```text
//! ConversionPipeline::start(host)          ExportPipeline::start(host, options)
//!   |                                        |
//!   +-- spawn "mask-convert" thread          +-- spawn "folder-export" thread
//!   |     run_conversion():                  |     run_export():
//!   |       pre  -> capture + hide masks     |       for each folder:
//!   |       main -> convert masked leaves    |         snapshot visibility
//!   |       post -> delete/clip/rename       |         isolate + export
//!   |       (restore on error/cancel)        |         restore visibility
//!   |                                        |
//!   +-- returns SessionHandle (events + cancel) for both
//! ```
//!
//! The `run_*` cores are synchronous and deterministic; the `start`
//! wrappers add the worker thread and the completion event.

pub mod cancel;
pub mod convert;
pub mod error;
pub mod event;
pub mod export;

// Re-export primary API at crate root
pub use cancel::CancelToken;
pub use convert::{run_conversion, ConversionPhase, ConversionSummary};
pub use error::PipelineError;
pub use event::{Reporter, SessionEvent, SessionHandle, SessionOutcome};
pub use export::{run_export, sanitize_file_stem, ExportSummary};

use tracing::{info, warn};

use lb_common::ExportOptions;
use lb_document::DocumentHost;

/// Starter for mask-conversion sessions.
pub struct ConversionPipeline;

impl ConversionPipeline {
    /// Start a conversion session on its own worker thread.
    ///
    /// The host moves into the session for its duration — the pipeline is
    /// the document's sole writer until the `Completed` event arrives.
    /// Returns a [`SessionHandle`] for event draining and cancellation.
    pub fn start<H>(host: H) -> Result<SessionHandle, PipelineError>
    where
        H: DocumentHost + Send + 'static,
    {
        let (reporter, events_rx) = Reporter::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        std::thread::Builder::new()
            .name("mask-convert".to_string())
            .spawn(move || {
                let mut host = host;
                let outcome = match run_conversion(&mut host, &reporter, &worker_cancel) {
                    Ok(_) => SessionOutcome::Success,
                    Err(e) => {
                        warn!(error = %e, "Conversion session ended early");
                        e.into_outcome()
                    }
                };
                reporter.completed(outcome);
            })
            .map_err(|e| {
                PipelineError::StartFailed(format!("failed to spawn conversion thread: {e}"))
            })?;

        Ok(SessionHandle::new(events_rx, cancel))
    }
}

/// Starter for folder-export sessions.
pub struct ExportPipeline;

impl ExportPipeline {
    /// Start an export session on its own worker thread.
    ///
    /// Caller-supplied `overrides` are merged over the defaults for this
    /// invocation only. Options are validated before the thread spawns,
    /// so an invalid quality is an immediate error rather than a
    /// `Failed` event.
    pub fn start<H>(host: H, overrides: Option<ExportOptions>) -> Result<SessionHandle, PipelineError>
    where
        H: DocumentHost + Send + 'static,
    {
        let options = match overrides {
            Some(overrides) => ExportOptions::default().merged(&overrides),
            None => ExportOptions::default(),
        };
        options.validate().map_err(PipelineError::InvalidOptions)?;
        info!(format = %options.format, quality = options.quality, "Export session requested");

        let (reporter, events_rx) = Reporter::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        std::thread::Builder::new()
            .name("folder-export".to_string())
            .spawn(move || {
                let mut host = host;
                let outcome = match run_export(&mut host, &options, &reporter, &worker_cancel) {
                    Ok(_) => SessionOutcome::Success,
                    Err(e) => {
                        warn!(error = %e, "Export session ended early");
                        e.into_outcome()
                    }
                };
                reporter.completed(outcome);
            })
            .map_err(|e| {
                PipelineError::StartFailed(format!("failed to spawn export thread: {e}"))
            })?;

        Ok(SessionHandle::new(events_rx, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_common::{ImageFormat, LayerKind, Rgb};
    use lb_document::SimDocument;
    use std::path::PathBuf;
    use std::time::Duration;

    fn make_convertible_doc() -> SimDocument {
        let mut doc = SimDocument::new();
        let folder = doc.add_folder(None, "Group 1");
        let masked = doc.add_pixel(Some(folder), "hero");
        doc.attach_mask(masked);
        doc.set_sample_color(masked, Rgb::new(10, 20, 30));
        doc.add_layer(Some(folder), "plain", LayerKind::Other);
        doc
    }

    fn wait_for_completion(handle: &SessionHandle) -> Option<SessionOutcome> {
        for _ in 0..200 {
            while let Some(event) = handle.try_recv_event() {
                if let SessionEvent::Completed(outcome) = event {
                    return Some(outcome);
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn conversion_session_completes() {
        let handle = ConversionPipeline::start(make_convertible_doc()).unwrap();
        let outcome = wait_for_completion(&handle).expect("session did not finish");
        assert!(outcome.is_success());
    }

    #[test]
    fn conversion_session_start_and_cancel() {
        let handle = ConversionPipeline::start(make_convertible_doc()).unwrap();
        handle.cancel();
        assert!(handle.is_cancel_requested());

        // Whether the worker observed the flag in time or finished first,
        // the terminal event must arrive.
        let outcome = wait_for_completion(&handle).expect("session did not finish");
        assert!(outcome.is_success() || outcome.is_cancelled());
    }

    #[test]
    fn export_session_completes_and_reports_per_folder_progress() {
        let mut doc = SimDocument::new();
        doc.add_folder(None, "A");
        doc.add_folder(None, "B");
        let options = ExportOptions {
            directory: Some(PathBuf::from("/out")),
            ..ExportOptions::default()
        };
        let handle = ExportPipeline::start(doc, Some(options)).unwrap();

        let mut progress_units = 0u64;
        let mut outcome = None;
        for _ in 0..200 {
            while let Some(event) = handle.try_recv_event() {
                match event {
                    SessionEvent::Progress { units } => progress_units += units,
                    SessionEvent::Completed(o) => outcome = Some(o),
                    _ => {}
                }
            }
            if outcome.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(outcome.map(|o| o.is_success()), Some(true));
        assert_eq!(progress_units, 2);
    }

    #[test]
    fn export_start_rejects_invalid_quality() {
        let options = ExportOptions {
            quality: 150,
            format: ImageFormat::Jpeg,
            directory: Some(PathBuf::from("/out")),
            ..ExportOptions::default()
        };
        let result = ExportPipeline::start(SimDocument::new(), Some(options));
        assert!(matches!(result, Err(PipelineError::InvalidOptions(_))));
    }

    #[test]
    fn export_session_fails_without_directory() {
        let mut doc = SimDocument::new();
        doc.add_folder(None, "A");
        let handle = ExportPipeline::start(doc, None).unwrap();
        let outcome = wait_for_completion(&handle).expect("session did not finish");
        assert_eq!(outcome.message(), Some("no output directory selected"));
    }
}
