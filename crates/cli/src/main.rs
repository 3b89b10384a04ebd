//! Command-line driver for the layer batch pipelines.
//!
//! Loads a JSON document description, builds the in-memory host, runs the
//! requested pipeline on its worker thread, and streams session log lines
//! to stdout:
//!
//! ```text
//! layerbatch convert document.json
//! layerbatch export document.json --out ./renders --format jpg --quality 85
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lb_common::{ExportOptions, ImageFormat, LayerKind, Rgb};
use lb_document::SimDocument;
use lb_pipeline::{ConversionPipeline, ExportPipeline, SessionEvent, SessionHandle};

#[derive(Parser, Debug)]
#[command(
    name = "layerbatch",
    version,
    about = "Batch automation for layered documents",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert every masked leaf layer into a solid-fill layer
    Convert {
        /// JSON document description
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,
    },
    /// Export each folder-group to its own image file
    Export {
        /// JSON document description
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,
        /// Output directory for the exported images
        #[arg(long = "out", value_name = "DIR")]
        out: Option<PathBuf>,
        /// Output image format
        #[arg(long, value_enum, default_value = "png")]
        format: FormatArg,
        /// Compression/quality hint, 0-100
        #[arg(long, default_value_t = 100)]
        quality: u8,
    },
}

/// Output format as spelled on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Png,
    #[value(alias = "jpeg")]
    Jpg,
    #[value(alias = "tiff")]
    Tif,
    Webp,
}

impl From<FormatArg> for ImageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpg => ImageFormat::Jpeg,
            FormatArg::Tif => ImageFormat::Tiff,
            FormatArg::Webp => ImageFormat::Webp,
        }
    }
}

/// One layer in the JSON document description. Kind defaults to `pixel`;
/// a node with children is a folder regardless of the declared kind.
#[derive(Debug, Deserialize)]
struct LayerDesc {
    name: String,
    #[serde(default)]
    kind: Option<LayerKind>,
    #[serde(default)]
    mask: bool,
    #[serde(default = "default_visible")]
    visible: bool,
    /// Representative content color as `[r, g, b]`.
    #[serde(default)]
    sample: Option<[u8; 3]>,
    #[serde(default)]
    children: Vec<LayerDesc>,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct DocumentDesc {
    layers: Vec<LayerDesc>,
}

impl DocumentDesc {
    fn load(path: &PathBuf) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading document description {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing document description {}", path.display()))
    }

    fn build(&self) -> SimDocument {
        let mut doc = SimDocument::new();
        for layer in &self.layers {
            add_layer(&mut doc, None, layer);
        }
        doc
    }
}

fn add_layer(doc: &mut SimDocument, parent: Option<lb_common::LayerId>, desc: &LayerDesc) {
    let kind = if !desc.children.is_empty() {
        LayerKind::Folder
    } else {
        desc.kind.unwrap_or(LayerKind::Pixel)
    };
    let id = doc.add_layer(parent, &desc.name, kind);
    if desc.mask {
        doc.attach_mask(id);
    }
    if !desc.visible {
        // Fresh layers start visible; the builder host cannot fail here.
        let _ = lb_document::DocumentHost::set_visible(doc, id, false);
    }
    if let Some([r, g, b]) = desc.sample {
        doc.set_sample_color(id, Rgb::new(r, g, b));
    }
    for child in &desc.children {
        add_layer(doc, Some(id), child);
    }
}

/// Block on the session, echoing log lines and returning the outcome.
fn follow(handle: &SessionHandle) -> Result<()> {
    while let Some(event) = handle.recv_event() {
        match event {
            SessionEvent::Started { total_units } => {
                println!("[0/{total_units}]");
            }
            SessionEvent::Log(line) => println!("{line}"),
            SessionEvent::Progress { .. } => {}
            SessionEvent::Completed(outcome) => {
                return match outcome.message() {
                    None => Ok(()),
                    Some(message) => bail!("session failed: {message}"),
                };
            }
        }
    }
    bail!("session channel closed before completion")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Convert { document } => {
            let doc = DocumentDesc::load(&document)?.build();
            info!(document = %document.display(), "Running mask conversion");
            let handle = ConversionPipeline::start(doc)?;
            follow(&handle)
        }
        Command::Export {
            document,
            out,
            format,
            quality,
        } => {
            let doc = DocumentDesc::load(&document)?.build();
            let options = ExportOptions {
                format: format.into(),
                quality,
                directory: out,
                ..ExportOptions::default()
            };
            info!(document = %document.display(), "Running folder export");
            let handle = ExportPipeline::start(doc, Some(options))?;
            follow(&handle)
        }
    }
}
