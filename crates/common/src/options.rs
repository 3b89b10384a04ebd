//! Export configuration: output format and per-invocation options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Output image codec for folder export.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Tiff,
    Webp,
}

impl ImageFormat {
    /// Lower-case file extension. The export file naming contract is
    /// `<sanitized folder name>.<extension>`.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Tiff => "tif",
            Self::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Tiff => "TIFF",
            Self::Webp => "WebP",
        };
        write!(f, "{s}")
    }
}

/// Options for one folder-export invocation.
///
/// Caller-supplied options are merged over the defaults for that
/// invocation only; nothing is persisted across sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Output image format.
    pub format: ImageFormat,
    /// Compression/quality hint, 0-100.
    pub quality: u8,
    /// Whether to embed the document's ICC profile in the output files.
    pub include_icc_profile: bool,
    /// Pre-selected output directory. `None` means the caller has not
    /// resolved a directory yet; the export engine refuses to run
    /// without one (directory selection UI is the caller's concern).
    pub directory: Option<PathBuf>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 100,
            include_icc_profile: true,
            directory: None,
        }
    }
}

impl ExportOptions {
    /// Overlay caller-supplied overrides on top of `self`.
    ///
    /// `directory` is only taken from the overrides when set there, so a
    /// partial override keeps an already-resolved directory.
    pub fn merged(&self, overrides: &ExportOptions) -> Self {
        Self {
            format: overrides.format,
            quality: overrides.quality,
            include_icc_profile: overrides.include_icc_profile,
            directory: overrides
                .directory
                .clone()
                .or_else(|| self.directory.clone()),
        }
    }

    /// Validate the option values.
    pub fn validate(&self) -> Result<(), String> {
        if self.quality > 100 {
            return Err(format!("Quality must be 0-100, got {}", self.quality));
        }
        Ok(())
    }
}
