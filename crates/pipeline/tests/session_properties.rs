//! End-to-end pipeline behavior against the simulated document host.

use std::path::{Path, PathBuf};

use lb_common::{DocumentResult, ExportOptions, ImageFormat, LayerId, LayerKind, Rgb};
use lb_document::{flatten_leaves, DocumentHost, SimDocument};
use lb_pipeline::{
    run_conversion, run_export, CancelToken, PipelineError, Reporter, SessionEvent,
};

fn count_progress(events: &[SessionEvent]) -> u64 {
    events
        .iter()
        .map(|e| match e {
            SessionEvent::Progress { units } => *units,
            _ => 0,
        })
        .sum()
}

fn log_lines(events: &[SessionEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Log(m) => Some(m.as_str()),
            _ => None,
        })
        .collect()
}

/// Document with two masked pixel leaves, one unmasked leaf, and a
/// masked folder.
///
/// ```text
/// Art (folder, masked)
/// ├── hero (pixel, masked)
/// └── shadow (pixel, masked)
/// notes (other, unmasked)
/// ```
fn make_conversion_doc() -> (SimDocument, LayerId, Vec<LayerId>) {
    let mut doc = SimDocument::new();
    let folder = doc.add_folder(None, "Art");
    doc.attach_mask(folder);
    let hero = doc.add_pixel(Some(folder), "hero");
    doc.attach_mask(hero);
    doc.set_sample_color(hero, Rgb::new(200, 40, 40));
    let shadow = doc.add_pixel(Some(folder), "shadow");
    doc.attach_mask(shadow);
    // No sample color for "shadow": the worker must fall back.
    let notes = doc.add_layer(None, "notes", LayerKind::Other);
    (doc, folder, vec![hero, shadow, notes])
}

// ---------------------------------------------------------------------------
// Conversion pipeline
// ---------------------------------------------------------------------------

#[test]
fn full_conversion_counts_and_effects() {
    let (mut doc, folder, leaves) = make_conversion_doc();
    let (reporter, rx) = Reporter::channel();
    let token = CancelToken::new();

    let summary = run_conversion(&mut doc, &reporter, &token).unwrap();
    assert_eq!(summary.converted, 2);
    assert_eq!(summary.leaves_visited, 3);

    // N originals removed.
    assert!(!doc.contains(leaves[0]));
    assert!(!doc.contains(leaves[1]));
    assert!(doc.contains(leaves[2]));

    // N fills created, clipped, masked, renamed back to the original name.
    let remaining = flatten_leaves(&doc).unwrap();
    let fills: Vec<LayerId> = remaining
        .iter()
        .copied()
        .filter(|&id| doc.kind(id).unwrap() == LayerKind::Fill)
        .collect();
    assert_eq!(fills.len(), 2);
    for &fill in &fills {
        assert!(doc.is_clipped(fill).unwrap());
        assert!(doc.has_mask(fill).unwrap());
        let name = doc.name(fill).unwrap();
        assert!(!name.ends_with("_fill"), "transient suffix left on {name}");
    }
    let names: Vec<String> = fills.iter().map(|&f| doc.name(f).unwrap()).collect();
    assert!(names.contains(&"hero".to_string()));
    assert!(names.contains(&"shadow".to_string()));

    // Sampled color used where available, fallback where not.
    let colors: Vec<Rgb> = fills
        .iter()
        .map(|&f| doc.fill_color(f).unwrap().unwrap())
        .collect();
    assert!(colors.contains(&Rgb::new(200, 40, 40)));
    assert!(colors.contains(&Rgb::FALLBACK));

    // Folder mask suppressed during the run is re-enabled afterwards.
    assert!(!doc.is_mask_disabled(folder).unwrap());

    // Progress increments exactly once per leaf.
    let events: Vec<SessionEvent> = rx.try_iter().collect();
    assert_eq!(count_progress(&events), 3);
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::Started { total_units: 3 })));
}

#[test]
fn conversion_no_document_reports_without_mutation() {
    let mut doc = SimDocument::closed();
    let (reporter, _rx) = Reporter::channel();
    let result = run_conversion(&mut doc, &reporter, &CancelToken::new());
    assert!(matches!(result, Err(PipelineError::NoDocument)));
}

#[test]
fn conversion_without_maskable_leaves_is_no_targets() {
    let mut doc = SimDocument::new();
    let folder = doc.add_folder(None, "G");
    doc.add_pixel(Some(folder), "plain");
    let layer_count = doc.layer_count();

    let (reporter, _rx) = Reporter::channel();
    let result = run_conversion(&mut doc, &reporter, &CancelToken::new());
    assert!(matches!(result, Err(PipelineError::NoTargets(_))));
    // Nothing was mutated.
    assert_eq!(doc.layer_count(), layer_count);
}

#[test]
fn fill_creation_failure_skips_layer_and_continues() {
    let (mut doc, _, leaves) = make_conversion_doc();
    doc.set_fail_fill_creation(true);

    let (reporter, rx) = Reporter::channel();
    let summary = run_conversion(&mut doc, &reporter, &CancelToken::new()).unwrap();
    assert_eq!(summary.converted, 0);
    assert_eq!(summary.leaves_visited, 3);

    // Originals survive when no fill replaced them.
    assert!(doc.contains(leaves[0]));
    assert!(doc.contains(leaves[1]));

    let events: Vec<SessionEvent> = rx.try_iter().collect();
    assert_eq!(count_progress(&events), 3);
    assert!(log_lines(&events)
        .iter()
        .any(|l| l.contains("Failed to create solid fill layer")));
}

#[test]
fn coincidental_fill_suffix_is_stripped_but_not_converted() {
    let (mut doc, _, _) = make_conversion_doc();
    // Unrelated, unmasked layer carrying the suffix from some prior edit.
    let decor = doc.add_layer(None, "decor_fill", LayerKind::Pixel);

    let (reporter, _rx) = Reporter::channel();
    let summary = run_conversion(&mut doc, &reporter, &CancelToken::new()).unwrap();

    // Only the two masked leaves qualified.
    assert_eq!(summary.converted, 2);
    // The coincidental suffix was stripped anyway (accepted narrow risk).
    assert_eq!(doc.name(decor).unwrap(), "decor");
    assert_eq!(doc.kind(decor).unwrap(), LayerKind::Pixel);
}

/// Host adapter that requests cancellation once a number of fill layers
/// have been created, simulating a user pressing cancel mid-run.
struct CancelAfterFills {
    inner: SimDocument,
    remaining: usize,
    token: CancelToken,
}

impl DocumentHost for CancelAfterFills {
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
    fn root_layers(&self) -> DocumentResult<Vec<LayerId>> {
        self.inner.root_layers()
    }
    fn children(&self, id: LayerId) -> DocumentResult<Vec<LayerId>> {
        self.inner.children(id)
    }
    fn kind(&self, id: LayerId) -> DocumentResult<LayerKind> {
        self.inner.kind(id)
    }
    fn name(&self, id: LayerId) -> DocumentResult<String> {
        self.inner.name(id)
    }
    fn is_visible(&self, id: LayerId) -> DocumentResult<bool> {
        self.inner.is_visible(id)
    }
    fn has_mask(&self, id: LayerId) -> DocumentResult<bool> {
        self.inner.has_mask(id)
    }
    fn sample_color(&self, id: LayerId) -> DocumentResult<Rgb> {
        self.inner.sample_color(id)
    }
    fn set_visible(&mut self, id: LayerId, visible: bool) -> DocumentResult<()> {
        self.inner.set_visible(id, visible)
    }
    fn set_name(&mut self, id: LayerId, name: &str) -> DocumentResult<()> {
        self.inner.set_name(id, name)
    }
    fn create_fill_layer(&mut self, color: Rgb) -> DocumentResult<LayerId> {
        let id = self.inner.create_fill_layer(color)?;
        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                self.token.request();
            }
        }
        Ok(id)
    }
    fn delete_layer(&mut self, id: LayerId) -> DocumentResult<()> {
        self.inner.delete_layer(id)
    }
    fn duplicate_layer(&mut self, id: LayerId, new_name: Option<&str>) -> DocumentResult<LayerId> {
        self.inner.duplicate_layer(id, new_name)
    }
    fn move_below(&mut self, layer: LayerId, reference: LayerId) -> DocumentResult<()> {
        self.inner.move_below(layer, reference)
    }
    fn duplicate_mask(&mut self, source: LayerId, target: LayerId) -> DocumentResult<()> {
        self.inner.duplicate_mask(source, target)
    }
    fn set_mask_disabled(&mut self, id: LayerId, disabled: bool) -> DocumentResult<()> {
        self.inner.set_mask_disabled(id, disabled)
    }
    fn clip_to_below(&mut self, id: LayerId) -> DocumentResult<()> {
        self.inner.clip_to_below(id)
    }
    fn export_image(&mut self, path: &Path, options: &ExportOptions) -> DocumentResult<()> {
        self.inner.export_image(path, options)
    }
}

#[test]
fn cancellation_after_first_unit_stops_before_second_and_restores_masks() {
    let (doc, folder, leaves) = make_conversion_doc();
    let token = CancelToken::new();
    let mut host = CancelAfterFills {
        inner: doc,
        remaining: 1,
        token: token.clone(),
    };

    let (reporter, rx) = Reporter::channel();
    let result = run_conversion(&mut host, &reporter, &token);
    assert!(matches!(result, Err(PipelineError::Cancelled)));

    // Unit 1 ("hero") committed: a fill exists below it. Unit 2 never
    // attempted: "shadow" is untouched and no second fill was made.
    let doc = &host.inner;
    let fills: Vec<LayerId> = flatten_leaves(doc)
        .unwrap()
        .iter()
        .copied()
        .filter(|&id| doc.kind(id).unwrap() == LayerKind::Fill)
        .collect();
    assert_eq!(fills.len(), 1);
    assert!(doc.contains(leaves[0]));
    assert!(doc.contains(leaves[1]));

    // Folder mask state restored to its pre-processing snapshot.
    assert!(!doc.is_mask_disabled(folder).unwrap());

    // Progress stopped after the first leaf.
    let events: Vec<SessionEvent> = rx.try_iter().collect();
    assert_eq!(count_progress(&events), 1);
    assert!(log_lines(&events)
        .iter()
        .any(|l| l.contains("cancelled")));
}

// ---------------------------------------------------------------------------
// Export engine
// ---------------------------------------------------------------------------

fn export_options(dir: &str) -> ExportOptions {
    ExportOptions {
        directory: Some(PathBuf::from(dir)),
        ..ExportOptions::default()
    }
}

fn visibility_of(doc: &SimDocument, ids: &[LayerId]) -> Vec<bool> {
    ids.iter().map(|&id| doc.is_visible(id).unwrap()).collect()
}

#[test]
fn export_names_files_after_sanitized_folders() {
    let mut doc = SimDocument::new();
    let ab = doc.add_folder(None, "A/B");
    doc.add_pixel(Some(ab), "content");
    let icons = doc.add_folder(None, "Icons?");
    doc.add_pixel(Some(icons), "icon");
    let all: Vec<LayerId> = lb_document::flatten_all(&doc).unwrap();
    let before = visibility_of(&doc, &all);

    let (reporter, _rx) = Reporter::channel();
    let summary = run_export(&mut doc, &export_options("/out"), &reporter, &CancelToken::new())
        .unwrap();
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.failed, 0);

    let paths: Vec<&Path> = doc.exports().iter().map(|e| e.path.as_path()).collect();
    assert_eq!(paths, vec![Path::new("/out/A_B.png"), Path::new("/out/Icons_.png")]);

    // Full-document visibility matches the pre-export snapshot.
    assert_eq!(visibility_of(&doc, &all), before);
}

#[test]
fn export_isolates_exactly_one_folder_per_file() {
    let mut doc = SimDocument::new();
    let a = doc.add_folder(None, "A");
    let a1 = doc.add_pixel(Some(a), "a1");
    let b = doc.add_folder(None, "B");
    doc.add_pixel(Some(b), "b1");
    doc.set_visible(a1, false).unwrap();

    let (reporter, _rx) = Reporter::channel();
    run_export(&mut doc, &export_options("/out"), &reporter, &CancelToken::new()).unwrap();

    // Every layer is hidden, then only the target folder is shown.
    let exports = doc.exports();
    assert_eq!(exports.len(), 2);
    assert_eq!(exports[0].visible_layers, vec![a]);
    assert_eq!(exports[1].visible_layers, vec![b]);

    // A descendant hidden before the run is hidden again after it.
    assert!(!doc.is_visible(a1).unwrap());
}

#[test]
fn export_without_folders_is_no_targets_and_writes_nothing() {
    let mut doc = SimDocument::new();
    doc.add_pixel(None, "loose");

    let (reporter, _rx) = Reporter::channel();
    let result = run_export(&mut doc, &export_options("/out"), &reporter, &CancelToken::new());
    match result {
        Err(e @ PipelineError::NoTargets(_)) => {
            assert!(e.into_outcome().message().unwrap().contains("no folder"));
        }
        other => panic!("expected NoTargets, got {other:?}"),
    }
    assert!(doc.exports().is_empty());
}

#[test]
fn export_without_directory_writes_nothing() {
    let mut doc = SimDocument::new();
    doc.add_folder(None, "A");

    let (reporter, _rx) = Reporter::channel();
    let result = run_export(
        &mut doc,
        &ExportOptions::default(),
        &reporter,
        &CancelToken::new(),
    );
    assert!(matches!(result, Err(PipelineError::NoOutputDirectory)));
    assert!(doc.exports().is_empty());
}

#[test]
fn failing_folder_does_not_stop_the_batch_or_leak_visibility() {
    let mut doc = SimDocument::new();
    doc.add_folder(None, "A");
    let b = doc.add_folder(None, "B");
    doc.add_pixel(Some(b), "b1");
    doc.add_folder(None, "C");
    doc.fail_export_for("B");
    let all: Vec<LayerId> = lb_document::flatten_all(&doc).unwrap();
    let before = visibility_of(&doc, &all);

    let (reporter, rx) = Reporter::channel();
    let summary = run_export(&mut doc, &export_options("/out"), &reporter, &CancelToken::new())
        .unwrap();
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.failed, 1);

    let stems: Vec<String> = doc
        .exports()
        .iter()
        .map(|e| e.path.file_stem().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(stems, vec!["A", "C"]);

    // Visibility restored even for the failed folder.
    assert_eq!(visibility_of(&doc, &all), before);

    let events: Vec<SessionEvent> = rx.try_iter().collect();
    assert_eq!(count_progress(&events), 3);
    assert!(log_lines(&events)
        .iter()
        .any(|l| l.starts_with("Error exporting B")));
}

#[test]
fn export_cancellation_is_polled_per_folder() {
    let mut doc = SimDocument::new();
    doc.add_folder(None, "A");
    doc.add_folder(None, "B");

    let token = CancelToken::new();
    token.request();

    let (reporter, _rx) = Reporter::channel();
    let result = run_export(&mut doc, &export_options("/out"), &reporter, &token);
    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert!(doc.exports().is_empty());
}

#[test]
fn export_respects_format_and_quality_options() {
    let mut doc = SimDocument::new();
    doc.add_folder(None, "Art");

    let options = ExportOptions {
        format: ImageFormat::Jpeg,
        quality: 80,
        include_icc_profile: false,
        directory: Some(PathBuf::from("/renders")),
    };
    let (reporter, _rx) = Reporter::channel();
    run_export(&mut doc, &options, &reporter, &CancelToken::new()).unwrap();

    let export = &doc.exports()[0];
    assert_eq!(export.path, PathBuf::from("/renders/Art.jpg"));
    assert_eq!(export.format, ImageFormat::Jpeg);
    assert_eq!(export.quality, 80);
    assert!(!export.include_icc_profile);
}
