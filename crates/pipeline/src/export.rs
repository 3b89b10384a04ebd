//! Per-folder image export engine.
//!
//! Every folder-group in the document becomes one image file: the engine
//! hides every layer, shows the one folder, asks the host to render, and
//! restores the captured visibility before moving on — so each folder's
//! isolation is independent and self-correcting even under error. One
//! folder's failure never stops the batch.

use std::path::Path;

use tracing::info;

use lb_common::{ExportOptions, LayerId};
use lb_document::{flatten_all, flatten_folders, DocumentHost, VisibilitySnapshot};

use crate::cancel::CancelToken;
use crate::error::PipelineError;
use crate::event::Reporter;

/// Characters that must not appear in an exported file stem.
const ILLEGAL_STEM_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replace filesystem-hostile characters in a folder name with `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_STEM_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// What a completed export session did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    /// Folders exported successfully.
    pub exported: usize,
    /// Folders whose export failed (logged, skipped).
    pub failed: usize,
}

/// Run a full folder-export session against `host`.
///
/// `options` must already be merged (caller overrides over defaults) and
/// carry a resolved output directory. Synchronous core;
/// [`ExportPipeline::start`](crate::ExportPipeline::start) wraps it in a
/// worker thread. Polls `cancel` before each folder; a cancellation
/// mid-folder is honored only after that folder's visibility restore.
pub fn run_export<H: DocumentHost + ?Sized>(
    host: &mut H,
    options: &ExportOptions,
    reporter: &Reporter,
    cancel: &CancelToken,
) -> Result<ExportSummary, PipelineError> {
    if !host.is_open() {
        reporter.log("No document open.");
        return Err(PipelineError::NoDocument);
    }
    options
        .validate()
        .map_err(PipelineError::InvalidOptions)?;
    let directory = match &options.directory {
        Some(dir) => dir.clone(),
        None => {
            reporter.log("Export cancelled: No output directory selected.");
            return Err(PipelineError::NoOutputDirectory);
        }
    };

    reporter.log("Getting folder list...");
    let folders = flatten_folders(host)?;
    if folders.is_empty() {
        reporter.log("No folder layers found in document.");
        return Err(PipelineError::NoTargets("no folder layers found"));
    }
    reporter.log(format!("Found {} folders to export.", folders.len()));
    info!(
        folders = folders.len(),
        directory = %directory.display(),
        format = %options.format,
        "Starting folder export"
    );
    reporter.started(folders.len() as u64);

    let mut summary = ExportSummary {
        exported: 0,
        failed: 0,
    };
    let total = folders.len();
    for (index, &folder) in folders.iter().enumerate() {
        if cancel.is_requested() {
            reporter.log("Export cancelled by user.");
            return Err(PipelineError::Cancelled);
        }

        let name = host.name(folder).unwrap_or_else(|_| folder.to_string());
        reporter.log(format!("Processing folder {}/{}: {}", index + 1, total, name));

        if export_one_folder(host, folder, &name, &directory, options, reporter) {
            summary.exported += 1;
        } else {
            summary.failed += 1;
        }

        // One unit per folder processed, success or failure alike.
        reporter.progress();
    }

    reporter.log("Export completed successfully.");
    Ok(summary)
}

/// Isolate one folder, export it, and put visibility back.
///
/// The visibility restore runs on success and failure alike, before the
/// next folder is touched. Returns whether the export succeeded.
fn export_one_folder<H: DocumentHost + ?Sized>(
    host: &mut H,
    folder: LayerId,
    name: &str,
    directory: &Path,
    options: &ExportOptions,
    reporter: &Reporter,
) -> bool {
    // Capture before any mutation; a capture failure means nothing was
    // touched, so the folder is skipped outright.
    let all = match flatten_all(host) {
        Ok(all) => all,
        Err(e) => {
            reporter.log(format!("Error during export process: {e}"));
            return false;
        }
    };
    let snapshot = match VisibilitySnapshot::capture(host, &all) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            reporter.log(format!("Error during export process: {e}"));
            return false;
        }
    };

    let result = isolate_and_export(host, folder, name, &all, directory, options);
    snapshot.restore(host);

    match result {
        Ok(file_name) => {
            reporter.log(format!("Successfully exported: {file_name}"));
            true
        }
        Err(e) => {
            reporter.log(format!("Error exporting {name}: {e}"));
            false
        }
    }
}

fn isolate_and_export<H: DocumentHost + ?Sized>(
    host: &mut H,
    folder: LayerId,
    name: &str,
    all: &[LayerId],
    directory: &Path,
    options: &ExportOptions,
) -> Result<String, PipelineError> {
    for &id in all {
        host.set_visible(id, false)?;
    }
    host.set_visible(folder, true)?;

    let stem = sanitize_file_stem(name);
    let file_name = format!("{stem}.{}", options.format.extension());
    host.export_image(&directory.join(&file_name), options)?;
    Ok(file_name)
}
