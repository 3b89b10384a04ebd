//! Mutable-state capture with best-effort restore.
//!
//! Both snapshot types follow the same contract: capture reads the live
//! tree once, before any mutation in the enclosing scope, and yields an
//! immutable list independent of later tree changes. Restore attempts
//! every entry, treats a missing or changed node as a logged skip (never
//! an error), and is idempotent — restoring twice leaves the document in
//! the same state as restoring once.

use tracing::{debug, warn};

use lb_common::{DocumentResult, LayerId};

use crate::host::DocumentHost;
use crate::traverse::{flatten_all, flatten_folders};

/// Per-layer visibility captured before an isolation pass.
#[derive(Clone, Debug)]
pub struct VisibilitySnapshot {
    entries: Vec<(LayerId, bool)>,
}

impl VisibilitySnapshot {
    /// Capture the visibility of the given layers, in the given order.
    pub fn capture<H: DocumentHost + ?Sized>(host: &H, ids: &[LayerId]) -> DocumentResult<Self> {
        let mut entries = Vec::with_capacity(ids.len());
        for &id in ids {
            entries.push((id, host.is_visible(id)?));
        }
        Ok(Self { entries })
    }

    /// Capture the visibility of every layer in the document.
    pub fn capture_document<H: DocumentHost + ?Sized>(host: &H) -> DocumentResult<Self> {
        let all = flatten_all(host)?;
        Self::capture(host, &all)
    }

    /// Write the captured visibility back, entry by entry.
    ///
    /// A layer deleted since capture is skipped with a warning; the
    /// remaining entries are still attempted. Returns the number of
    /// entries restored.
    pub fn restore<H: DocumentHost + ?Sized>(&self, host: &mut H) -> usize {
        let mut restored = 0;
        for &(id, visible) in &self.entries {
            match host.set_visible(id, visible) {
                Ok(()) => restored += 1,
                Err(e) => warn!(%id, error = %e, "Skipping visibility restore"),
            }
        }
        debug!(restored, total = self.entries.len(), "Visibility restored");
        restored
    }

    pub fn entries(&self) -> &[(LayerId, bool)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mask and visibility state of one folder at capture time.
#[derive(Clone, Debug)]
pub struct FolderMaskRecord {
    pub id: LayerId,
    pub had_mask: bool,
    pub visible: bool,
}

/// Mask/visibility state of every folder, captured before the conversion
/// pipeline suppresses folder masks.
///
/// Capture walks every folder and completes before any suppression
/// begins, so records never observe self-induced state as "original".
#[derive(Clone, Debug, Default)]
pub struct FolderMaskSnapshot {
    records: Vec<FolderMaskRecord>,
}

impl FolderMaskSnapshot {
    /// Capture mask presence and visibility for every folder in the
    /// document, in discovery order.
    pub fn capture<H: DocumentHost + ?Sized>(host: &H) -> DocumentResult<Self> {
        let mut records = Vec::new();
        for id in flatten_folders(host)? {
            records.push(FolderMaskRecord {
                id,
                had_mask: host.has_mask(id)?,
                visible: host.is_visible(id)?,
            });
        }
        Ok(Self { records })
    }

    /// Records of folders that carried a mask at capture time.
    pub fn masked(&self) -> impl Iterator<Item = &FolderMaskRecord> {
        self.records.iter().filter(|r| r.had_mask)
    }

    pub fn records(&self) -> &[FolderMaskRecord] {
        &self.records
    }

    /// Best-effort restore: re-enable the mask effect on folders that had
    /// one, and put captured visibility back. Skips (with a warning)
    /// folders that no longer exist.
    pub fn restore<H: DocumentHost + ?Sized>(&self, host: &mut H) {
        for record in &self.records {
            if record.had_mask {
                if let Err(e) = host.set_mask_disabled(record.id, false) {
                    warn!(id = %record.id, error = %e, "Skipping folder mask restore");
                }
            }
            if let Err(e) = host.set_visible(record.id, record.visible) {
                warn!(id = %record.id, error = %e, "Skipping folder visibility restore");
            }
        }
        debug!(folders = self.records.len(), "Folder mask state restored");
    }
}
