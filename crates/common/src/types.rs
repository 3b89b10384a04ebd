//! Core document-tree vocabulary with newtype pattern for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a layer within one document session.
///
/// Identifiers are assigned by the host and are never reused while the
/// session is alive, so a dangling `LayerId` (layer deleted since capture)
/// is detectable rather than silently aliasing another layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// The kind of a layer node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Container node grouping child layers. Carries visibility and may
    /// carry a mask of its own.
    Folder,
    /// Raster content layer.
    Pixel,
    /// Solid-fill content layer.
    Fill,
    /// Anything else (text, adjustment, smart object, ...). Treated as a
    /// leaf by traversal and never converted.
    Other,
}

impl LayerKind {
    /// Whether this kind is a folder-group (container) node.
    pub fn is_folder(self) -> bool {
        matches!(self, Self::Folder)
    }

    /// Whether this kind is a leaf (non-container) node.
    pub fn is_leaf(self) -> bool {
        !self.is_folder()
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Folder => "folder",
            Self::Pixel => "pixel",
            Self::Fill => "fill",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}
