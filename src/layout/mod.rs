//! Arrangement catalog, automatic selection and slot geometry.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `catalog` | The fixed set of grid and custom arrangements |
//! | `selector` | Rule tables that pick an arrangement from image features |
//! | `sanitize` | Coerces caller-supplied geometry numbers into safe integers |
//! | `geometry` | Slot rectangles and divider lines for an arrangement |

pub mod catalog;
pub mod geometry;
pub mod sanitize;
pub mod selector;

pub use catalog::{ArrangementKind, ArrangementSpec, Catalog, CustomShape, LayoutError, LayoutMode};
pub use geometry::{DividerLine, DividerOrientation, Layout, SlotRect, compute_layout};
pub use sanitize::{GeometryRequest, MIN_SLOT_SIZE, finite_or};
pub use selector::{AggregateMetrics, LayoutDecision, fallback_for_count, select_layout};
