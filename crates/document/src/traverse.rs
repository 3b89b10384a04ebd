//! Pre-order tree flattening.
//!
//! All three walks are depth-first pre-order: a node is emitted before
//! its children, children in their existing stacking order. The walks
//! are read-only and reflect the tree at call time; mutate-then-iterate
//! is a caller bug — traverse before mutating, or re-traverse after.

use lb_common::{DocumentResult, LayerId};

use crate::host::DocumentHost;

/// Every layer in the document, folders included.
pub fn flatten_all<H: DocumentHost + ?Sized>(host: &H) -> DocumentResult<Vec<LayerId>> {
    let mut out = Vec::new();
    for id in host.root_layers()? {
        visit(host, id, &mut out, Keep::All)?;
    }
    Ok(out)
}

/// Folder-group layers only, each discovered before its nested folders.
pub fn flatten_folders<H: DocumentHost + ?Sized>(host: &H) -> DocumentResult<Vec<LayerId>> {
    let mut out = Vec::new();
    for id in host.root_layers()? {
        visit(host, id, &mut out, Keep::Folders)?;
    }
    Ok(out)
}

/// Leaf (non-folder) layers only, in pre-order.
pub fn flatten_leaves<H: DocumentHost + ?Sized>(host: &H) -> DocumentResult<Vec<LayerId>> {
    let mut out = Vec::new();
    for id in host.root_layers()? {
        visit(host, id, &mut out, Keep::Leaves)?;
    }
    Ok(out)
}

#[derive(Copy, Clone)]
enum Keep {
    All,
    Folders,
    Leaves,
}

fn visit<H: DocumentHost + ?Sized>(
    host: &H,
    id: LayerId,
    out: &mut Vec<LayerId>,
    keep: Keep,
) -> DocumentResult<()> {
    let is_folder = host.kind(id)?.is_folder();
    let emit = match keep {
        Keep::All => true,
        Keep::Folders => is_folder,
        Keep::Leaves => !is_folder,
    };
    if emit {
        out.push(id);
    }
    if is_folder {
        for child in host.children(id)? {
            visit(host, child, out, keep)?;
        }
    }
    Ok(())
}
