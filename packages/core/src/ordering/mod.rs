//! Fractional Sibling Ordering
//!
//! Sibling order is a real number so a single drag/drop insertion never
//! requires renumbering unrelated siblings.

pub mod fractional;

pub use fractional::{DropPosition, OrderCalculator, PRECISION_THRESHOLD};
