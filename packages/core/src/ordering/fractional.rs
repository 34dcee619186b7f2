//! Fractional order calculation for drag/drop reordering
//!
//! The computed value is always strictly between its two bounding neighbors
//! (or strictly beyond the nearest neighbor at a list boundary), so a total
//! order is preserved without rewriting other siblings. Repeated insertion
//! between the same two neighbors halves the available gap each time;
//! [`OrderCalculator::needs_rebalancing`] detects when a sibling list has
//! run out of precision and [`OrderCalculator::rebalance`] produces evenly
//! spaced replacement orders.

/// Where a dragged item lands relative to the drop target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    /// Insert immediately before the target sibling
    Before,
    /// Insert immediately after the target sibling
    After,
    /// Drop into the target folder, before its first child
    Inside,
}

/// Minimum usable gap between adjacent sibling orders
pub const PRECISION_THRESHOLD: f64 = 0.0001;

/// Calculates the fractional order for inserting a node among siblings
pub struct OrderCalculator;

impl OrderCalculator {
    /// Calculate the order value for an item dropped at `position`.
    ///
    /// `orders` is the ordered list of sibling order values (each defaulting
    /// to 0 where unset); for `Before`/`After` it is the target's sibling
    /// list and `target_index` locates the target within it, for `Inside`
    /// it is the target folder's children and `target_index` is ignored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use codex_core::ordering::{DropPosition, OrderCalculator};
    ///
    /// // Between two siblings
    /// let order = OrderCalculator::calculate_order(DropPosition::After, 0, &[1.0, 2.0]);
    /// assert_eq!(order, 1.5);
    ///
    /// // Into an empty folder
    /// let order = OrderCalculator::calculate_order(DropPosition::Inside, 0, &[]);
    /// assert_eq!(order, 0.0);
    /// ```
    pub fn calculate_order(position: DropPosition, target_index: usize, orders: &[f64]) -> f64 {
        let target = orders.get(target_index).copied().unwrap_or(0.0);
        match position {
            DropPosition::Before => {
                if target_index == 0 {
                    target - 1.0
                } else {
                    (target + orders[target_index - 1]) / 2.0
                }
            }
            DropPosition::After => match orders.get(target_index + 1) {
                Some(next) => (target + next) / 2.0,
                None => target + 1.0,
            },
            DropPosition::Inside => orders.first().map(|first| first - 1.0).unwrap_or(0.0),
        }
    }

    /// Check if a sibling list has run out of precision (gap too small)
    pub fn needs_rebalancing(orders: &[f64]) -> bool {
        orders
            .windows(2)
            .any(|pair| pair[1] - pair[0] < PRECISION_THRESHOLD)
    }

    /// Evenly spaced replacement orders for a sibling list of `count` items
    ///
    /// # Example
    /// Input list orders: `[1.0, 1.0001, 1.0002, 1.0003]`
    /// Output: `[1.0, 2.0, 3.0, 4.0]`
    pub fn rebalance(count: usize) -> Vec<f64> {
        (1..=count).map(|i| i as f64).collect()
    }
}
