//! Per-layer mask-to-fill conversion.

use tracing::warn;

use lb_common::{LayerId, Rgb};
use lb_document::DocumentHost;

use crate::convert::ConversionSession;
use crate::event::Reporter;

/// Convert one masked leaf layer into a solid-fill layer carrying the
/// same mask.
///
/// Steps: sample a representative color (falling back to
/// [`Rgb::FALLBACK`] when the host cannot sample), create the fill
/// layer, rename it to the transient `<name>_fill`, move it directly
/// beneath the original, and duplicate the original's mask onto it. The
/// original/fill pair is recorded in the session registries for
/// Post-processing.
///
/// Failure policy: sampling failure never aborts the layer; fill-layer
/// creation failure skips the layer entirely (logged, batch continues);
/// later step failures are logged and the pair is still recorded, so
/// Post-processing gets a chance to finish the job.
///
/// Returns whether a fill layer was created and recorded.
pub(crate) fn convert_masked_leaf<H: DocumentHost + ?Sized>(
    host: &mut H,
    layer: LayerId,
    session: &mut ConversionSession,
    reporter: &Reporter,
) -> bool {
    let layer_name = match host.name(layer) {
        Ok(name) => name,
        Err(e) => {
            reporter.log(format!("Error reading layer {layer}: {e}"));
            return false;
        }
    };

    let color = match host.sample_color(layer) {
        Ok(color) => {
            reporter.log(format!("Sampled color from \"{layer_name}\": {color}"));
            color
        }
        Err(e) => {
            reporter.log(format!(
                "Error sampling color from \"{layer_name}\": {e}; using {}",
                Rgb::FALLBACK
            ));
            Rgb::FALLBACK
        }
    };

    let fill = match host.create_fill_layer(color) {
        Ok(fill) => {
            reporter.log(format!(
                "Created solid fill layer (R={}, G={}, B={})",
                color.r, color.g, color.b
            ));
            fill
        }
        Err(e) => {
            warn!(%layer, error = %e, "Fill layer creation failed, skipping layer");
            reporter.log(format!("Error: Failed to create solid fill layer: {e}"));
            return false;
        }
    };

    // Transient name; the suffix is stripped again in Post-processing.
    let fill_name = format!("{layer_name}_fill");
    if let Err(e) = host.set_name(fill, &fill_name) {
        reporter.log(format!("Error renaming fill layer: {e}"));
    }

    match host.move_below(fill, layer) {
        Ok(()) => reporter.log(format!(
            "Layer \"{fill_name}\" moved below \"{layer_name}\""
        )),
        Err(e) => reporter.log(format!("Error: Failed to move layer: {e}")),
    }

    match host.duplicate_mask(layer, fill) {
        Ok(()) => reporter.log(format!(
            "Duplicated mask from \"{layer_name}\" to \"{fill_name}\""
        )),
        Err(e) => reporter.log(format!("Error duplicating mask: {e}")),
    }

    session.layers_to_delete.push(layer);
    session.fill_layers_to_clip.push(fill);
    true
}
