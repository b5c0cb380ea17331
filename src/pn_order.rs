//! PN-order bookkeeping.
//!
//! A PN order is a non-negative half-integer `n`; a series truncated at order
//! `n` keeps the powers `v^0 ..= v^(2n)`, i.e. `order_index(n) = 1 + 2n` terms.
//! Orders are stored as an integer count of half steps so the index arithmetic
//! is exact and cannot overflow.

use std::fmt;

use crate::error::StateError;

/// Largest representable order, in half steps: `(i32::MAX - 2) / 2` as an order.
const MAX_TWICE: i32 = i32::MAX - 2;

/// A half-integer post-Newtonian order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PNOrder {
    twice: i32,
}

impl PNOrder {
    /// Sentinel meaning "keep every term any formula knows".
    pub const MAX: PNOrder = PNOrder { twice: MAX_TWICE };

    /// Newtonian order.
    pub const NEWTONIAN: PNOrder = PNOrder { twice: 0 };

    /// Build from a count of half steps (`3.5PN` is `from_half_steps(7)`),
    /// clamped to [`PNOrder::MAX`].
    pub fn from_half_steps(twice: u32) -> Self {
        Self {
            twice: twice.min(MAX_TWICE as u32) as i32,
        }
    }

    /// The order as a number (`3.5` for 3.5PN).
    pub fn value(self) -> f64 {
        f64::from(self.twice) / 2.0
    }

    /// Twice the order.
    pub fn half_steps(self) -> u32 {
        self.twice as u32
    }

    /// Whether this is the "every term" sentinel.
    pub fn is_max(self) -> bool {
        self.twice == MAX_TWICE
    }
}

impl Default for PNOrder {
    fn default() -> Self {
        PNOrder::MAX
    }
}

impl fmt::Display for PNOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_max() {
            write!(f, "max PN")
        } else if self.twice % 2 == 0 {
            write!(f, "{}PN", self.twice / 2)
        } else {
            write!(f, "{}.5PN", self.twice / 2)
        }
    }
}

/// Round an arbitrary number to the nearest half-integer PN order.
///
/// Values at or above the overflow-safe maximum, including `f64::INFINITY`,
/// become [`PNOrder::MAX`]. Negative values and NaN are rejected.
pub fn prepare_pn_order(x: f64) -> Result<PNOrder, StateError> {
    if x.is_nan() || x < 0.0 {
        return Err(StateError::InvalidPnOrder { value: x });
    }
    let twice = (2.0 * x).round();
    if twice >= f64::from(MAX_TWICE) {
        return Ok(PNOrder::MAX);
    }
    Ok(PNOrder {
        twice: twice as i32,
    })
}

/// Number of series terms retained at `order`: `1 + 2n`.
pub fn order_index(order: PNOrder) -> usize {
    1 + order.twice as usize
}

/// How many of `known_terms` coefficients survive truncation at `order` for a
/// series whose first term enters the combined equation `offset` powers of `v`
/// above the equation's own leading term.
pub fn truncation_length(order: PNOrder, known_terms: usize, offset: usize) -> usize {
    known_terms.min(order_index(order).saturating_sub(offset))
}
