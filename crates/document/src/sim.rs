//! In-memory simulated document host.
//!
//! `SimDocument` stores layers in an arena: a flat table keyed by
//! [`LayerId`] with child-id lists and optional parent ids, so the tree
//! has no cyclic object graph. It implements the full [`DocumentHost`]
//! surface, records every export instead of writing files, and supports
//! fault injection so error paths can be tested deterministically.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use lb_common::{DocumentError, DocumentResult, ExportOptions, ImageFormat, LayerId, LayerKind, Rgb};

use crate::host::DocumentHost;

/// One layer entry in the arena.
#[derive(Clone, Debug)]
struct SimLayer {
    name: String,
    kind: LayerKind,
    visible: bool,
    /// Mask presence; `Some(disabled)` means a mask is attached and
    /// `disabled` tracks whether its visual effect is suppressed.
    mask: Option<bool>,
    /// Clipping-mask association to the layer below, if established.
    clipped: bool,
    /// Fill color for `Fill` layers.
    fill_color: Option<Rgb>,
    /// Representative content color, when sampling is possible.
    sample: Option<Rgb>,
    parent: Option<LayerId>,
    children: Vec<LayerId>,
}

/// Record of one simulated export call.
#[derive(Clone, Debug)]
pub struct SimExport {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub quality: u8,
    pub include_icc_profile: bool,
    /// Ids of every layer that was visible when the export ran, sorted.
    pub visible_layers: Vec<LayerId>,
}

/// Arena-backed in-memory document.
#[derive(Debug, Default)]
pub struct SimDocument {
    nodes: HashMap<LayerId, SimLayer>,
    roots: Vec<LayerId>,
    next_id: u64,
    closed: bool,
    exports: Vec<SimExport>,
    /// File stems whose export should fail (write-error injection).
    failing_export_stems: HashSet<String>,
    /// When set, `create_fill_layer` fails.
    fail_fill_creation: bool,
}

impl SimDocument {
    /// An open, empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with no open document.
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    // --- builder API (tests, CLI) ---

    /// Add a layer under `parent` (`None` = top level), at the bottom of
    /// its container's stack.
    pub fn add_layer(&mut self, parent: Option<LayerId>, name: &str, kind: LayerKind) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SimLayer {
                name: name.to_string(),
                kind,
                visible: true,
                mask: None,
                clipped: false,
                fill_color: None,
                sample: None,
                parent,
                children: Vec::new(),
            },
        );
        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        id
    }

    pub fn add_folder(&mut self, parent: Option<LayerId>, name: &str) -> LayerId {
        self.add_layer(parent, name, LayerKind::Folder)
    }

    pub fn add_pixel(&mut self, parent: Option<LayerId>, name: &str) -> LayerId {
        self.add_layer(parent, name, LayerKind::Pixel)
    }

    /// Attach a (enabled) mask to a layer.
    pub fn attach_mask(&mut self, id: LayerId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.mask = Some(false);
        }
    }

    /// Set the color that `sample_color` will return for this layer.
    pub fn set_sample_color(&mut self, id: LayerId, color: Rgb) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.sample = Some(color);
        }
    }

    // --- fault injection ---

    /// Make exports whose file stem equals `stem` fail with a host error.
    pub fn fail_export_for(&mut self, stem: &str) {
        self.failing_export_stems.insert(stem.to_string());
    }

    /// Make every subsequent `create_fill_layer` call fail.
    pub fn set_fail_fill_creation(&mut self, fail: bool) {
        self.fail_fill_creation = fail;
    }

    // --- inspection ---

    /// Exports recorded so far, in call order.
    pub fn exports(&self) -> &[SimExport] {
        &self.exports
    }

    /// Whether a layer id still resolves to a live layer.
    pub fn contains(&self, id: LayerId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Whether the layer's mask effect is currently suppressed.
    pub fn is_mask_disabled(&self, id: LayerId) -> DocumentResult<bool> {
        let node = self.node(id)?;
        node.mask.ok_or(DocumentError::NoMask(id))
    }

    /// Whether the layer has a clipping-mask association.
    pub fn is_clipped(&self, id: LayerId) -> DocumentResult<bool> {
        Ok(self.node(id)?.clipped)
    }

    /// Fill color of a `Fill` layer.
    pub fn fill_color(&self, id: LayerId) -> DocumentResult<Option<Rgb>> {
        Ok(self.node(id)?.fill_color)
    }

    /// Total number of live layers.
    pub fn layer_count(&self) -> usize {
        self.nodes.len()
    }

    // --- internals ---

    fn node(&self, id: LayerId) -> DocumentResult<&SimLayer> {
        self.nodes.get(&id).ok_or(DocumentError::LayerNotFound(id))
    }

    fn node_mut(&mut self, id: LayerId) -> DocumentResult<&mut SimLayer> {
        self.nodes
            .get_mut(&id)
            .ok_or(DocumentError::LayerNotFound(id))
    }

    fn sibling_list(&mut self, parent: Option<LayerId>) -> DocumentResult<&mut Vec<LayerId>> {
        match parent {
            Some(p) => Ok(&mut self
                .nodes
                .get_mut(&p)
                .ok_or(DocumentError::LayerNotFound(p))?
                .children),
            None => Ok(&mut self.roots),
        }
    }

    fn detach(&mut self, id: LayerId) -> DocumentResult<()> {
        let parent = self.node(id)?.parent;
        let siblings = self.sibling_list(parent)?;
        siblings.retain(|&s| s != id);
        Ok(())
    }

    fn remove_subtree(&mut self, id: LayerId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }
}

impl DocumentHost for SimDocument {
    fn is_open(&self) -> bool {
        !self.closed
    }

    fn root_layers(&self) -> DocumentResult<Vec<LayerId>> {
        Ok(self.roots.clone())
    }

    fn children(&self, id: LayerId) -> DocumentResult<Vec<LayerId>> {
        let node = self.node(id)?;
        if !node.kind.is_folder() {
            return Err(DocumentError::WrongKind {
                id,
                expected: LayerKind::Folder,
                actual: node.kind,
            });
        }
        Ok(node.children.clone())
    }

    fn kind(&self, id: LayerId) -> DocumentResult<LayerKind> {
        Ok(self.node(id)?.kind)
    }

    fn name(&self, id: LayerId) -> DocumentResult<String> {
        Ok(self.node(id)?.name.clone())
    }

    fn is_visible(&self, id: LayerId) -> DocumentResult<bool> {
        Ok(self.node(id)?.visible)
    }

    fn has_mask(&self, id: LayerId) -> DocumentResult<bool> {
        Ok(self.node(id)?.mask.is_some())
    }

    fn sample_color(&self, id: LayerId) -> DocumentResult<Rgb> {
        let node = self.node(id)?;
        node.sample.ok_or(DocumentError::SamplingUnavailable(id))
    }

    fn set_visible(&mut self, id: LayerId, visible: bool) -> DocumentResult<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    fn set_name(&mut self, id: LayerId, name: &str) -> DocumentResult<()> {
        self.node_mut(id)?.name = name.to_string();
        Ok(())
    }

    fn create_fill_layer(&mut self, color: Rgb) -> DocumentResult<LayerId> {
        if self.fail_fill_creation {
            return Err(DocumentError::HostFailure(
                "fill layer creation rejected".into(),
            ));
        }
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SimLayer {
                name: format!("Color Fill {}", id.0),
                kind: LayerKind::Fill,
                visible: true,
                mask: None,
                clipped: false,
                fill_color: Some(color),
                sample: None,
                parent: None,
                children: Vec::new(),
            },
        );
        // New content layers appear at the top of the root stack.
        self.roots.insert(0, id);
        debug!(%id, %color, "Created fill layer");
        Ok(id)
    }

    fn delete_layer(&mut self, id: LayerId) -> DocumentResult<()> {
        self.node(id)?;
        self.detach(id)?;
        self.remove_subtree(id);
        Ok(())
    }

    fn duplicate_layer(&mut self, id: LayerId, new_name: Option<&str>) -> DocumentResult<LayerId> {
        let original = self.node(id)?.clone();
        let copy_id = LayerId(self.next_id);
        self.next_id += 1;
        let copy = SimLayer {
            name: new_name
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} copy", original.name)),
            children: Vec::new(),
            clipped: false,
            ..original
        };
        let parent = copy.parent;
        self.nodes.insert(copy_id, copy);
        // The copy lands directly above the original.
        let siblings = self.sibling_list(parent)?;
        let pos = siblings.iter().position(|&s| s == id).unwrap_or(0);
        siblings.insert(pos, copy_id);
        Ok(copy_id)
    }

    fn move_below(&mut self, layer: LayerId, reference: LayerId) -> DocumentResult<()> {
        self.node(layer)?;
        let ref_parent = self.node(reference)?.parent;
        self.detach(layer)?;
        self.node_mut(layer)?.parent = ref_parent;
        let siblings = self.sibling_list(ref_parent)?;
        let pos = siblings
            .iter()
            .position(|&s| s == reference)
            .ok_or(DocumentError::NotSiblings { layer, reference })?;
        siblings.insert(pos + 1, layer);
        Ok(())
    }

    fn duplicate_mask(&mut self, source: LayerId, target: LayerId) -> DocumentResult<()> {
        let source_mask = self.node(source)?.mask;
        if source_mask.is_none() {
            return Err(DocumentError::NoMask(source));
        }
        self.node_mut(target)?.mask = source_mask;
        Ok(())
    }

    fn set_mask_disabled(&mut self, id: LayerId, disabled: bool) -> DocumentResult<()> {
        let node = self.node_mut(id)?;
        match node.mask {
            Some(_) => {
                node.mask = Some(disabled);
                Ok(())
            }
            None => Err(DocumentError::NoMask(id)),
        }
    }

    fn clip_to_below(&mut self, id: LayerId) -> DocumentResult<()> {
        self.node(id)?;
        self.node_mut(id)?.clipped = true;
        Ok(())
    }

    fn export_image(&mut self, path: &Path, options: &ExportOptions) -> DocumentResult<()> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing_export_stems.contains(&stem) {
            return Err(DocumentError::HostFailure(format!(
                "write failed for {stem}"
            )));
        }
        let mut visible: Vec<LayerId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.visible)
            .map(|(&id, _)| id)
            .collect();
        visible.sort();
        self.exports.push(SimExport {
            path: path.to_path_buf(),
            format: options.format,
            quality: options.quality,
            include_icc_profile: options.include_icc_profile,
            visible_layers: visible,
        });
        debug!(path = %path.display(), "Recorded simulated export");
        Ok(())
    }
}
