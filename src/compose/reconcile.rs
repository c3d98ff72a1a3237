//! Matching the number of supplied images to the arrangement's slots.
//!
//! Extra images are dropped. A grid that is too big for one, two or three
//! images is swapped for the exact-fit row (`1x1`, `1x2`, `1x3`); every other
//! shortfall is filled by repeating the images in order.

use crate::layout::{ArrangementSpec, Catalog, LayoutError};
use tracing::debug;

/// The arrangement actually used and which input fills each slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<'a> {
    pub spec: &'a ArrangementSpec,
    /// Input index per slot, in slot order.
    pub indices: Vec<usize>,
}

/// `slots` indices cycling through `0..available`.
pub fn fill_cyclic(available: usize, slots: usize) -> Vec<usize> {
    if available == 0 {
        return Vec::new();
    }
    (0..slots).map(|i| i % available).collect()
}

/// Reconcile `supplied` images with `spec`.
pub fn reconcile<'a>(
    spec: &'a ArrangementSpec,
    catalog: &'a Catalog,
    supplied: usize,
) -> Result<Reconciled<'a>, LayoutError> {
    let selected = supplied.min(spec.max_images);
    if selected == spec.max_images || selected == 0 {
        return Ok(Reconciled {
            spec,
            indices: (0..selected).collect(),
        });
    }

    if spec.is_grid() && selected <= 3 {
        let exact = catalog.require(["1x1", "1x2", "1x3"][selected - 1])?;
        debug!(from = %spec.id, to = %exact.id, "Downgraded arrangement to fit images");
        return Ok(Reconciled {
            spec: exact,
            indices: (0..selected).collect(),
        });
    }

    debug!(
        arrangement = %spec.id,
        repeated = spec.max_images - selected,
        "Filling empty slots by repeating images"
    );
    Ok(Reconciled {
        spec,
        indices: fill_cyclic(selected, spec.max_images),
    })
}
