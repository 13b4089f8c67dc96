//! # Billing Strategy
//!
//! The cost-computation policy attached to a tariff.
//!
//! ## Strategy Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       BillingStrategy                               │
//! │                                                                     │
//! │  Flat                        cost = base_cost × minutes             │
//! │  Discounted { percent }      cost = base_cost × minutes             │
//! │                                     × (1 − percent/100)             │
//! │                                                                     │
//! │  Persisted as a tagged value: { "kind": "discounted",               │
//! │                                 "percent": 20.0 }                   │
//! │  The display label ("Flat", "Discounted (20%)") is derived, never   │
//! │  the source of truth — except when loading legacy files that only   │
//! │  carry the label, where `from_label` re-derives the percent.        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_DISCOUNT_PERCENT;

// =============================================================================
// Billing Strategy
// =============================================================================

/// The cost-computation policy for a tariff.
///
/// ## Invariants
/// - A strategy is owned exclusively by the tariff it is attached to.
/// - `percent` is expected in 0–100; out-of-range values are accepted
///   unsanitized (a caller bug, not validated here).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BillingStrategy {
    /// Straight per-minute billing.
    Flat,

    /// Per-minute billing with a percentage discount.
    Discounted {
        /// Discount percentage (20.0 = 20% off).
        #[serde(default = "default_percent")]
        percent: f64,
    },
}

fn default_percent() -> f64 {
    DEFAULT_DISCOUNT_PERCENT
}

impl BillingStrategy {
    /// Creates a discounted strategy.
    #[inline]
    pub const fn discounted(percent: f64) -> Self {
        BillingStrategy::Discounted { percent }
    }

    /// Computes the charge for `minutes` of usage at `base_cost` per minute.
    ///
    /// Pure function, no side effects.
    ///
    /// ## Example
    /// ```rust
    /// use callmeter_core::BillingStrategy;
    ///
    /// assert_eq!(BillingStrategy::Flat.compute_cost(0.10, 100), 10.0);
    /// assert_eq!(BillingStrategy::discounted(20.0).compute_cost(0.15, 200), 24.0);
    /// ```
    pub fn compute_cost(&self, base_cost: f64, minutes: i64) -> f64 {
        let price = base_cost * minutes as f64;
        match self {
            BillingStrategy::Flat => price,
            BillingStrategy::Discounted { percent } => price * (1.0 - percent / 100.0),
        }
    }

    /// Returns the display label: `"Flat"` or `"Discounted (<percent>%)"`.
    ///
    /// The percent is formatted as a plain number (no fixed decimal places):
    /// `Discounted (20%)`, `Discounted (12.5%)`.
    pub fn label(&self) -> String {
        match self {
            BillingStrategy::Flat => "Flat".to_string(),
            BillingStrategy::Discounted { percent } => format!("Discounted ({}%)", percent),
        }
    }

    /// Re-derives a strategy from a display label.
    ///
    /// Legacy snapshot and import files carry only the label; this is the
    /// compatibility path for them. A label containing `Discounted` yields a
    /// discounted strategy with the percent parsed from the parenthesized
    /// portion, falling back to [`DEFAULT_DISCOUNT_PERCENT`] when the
    /// parentheses are absent or unparseable. Anything else is `Flat`.
    pub fn from_label(label: &str) -> Self {
        if !label.contains("Discounted") {
            return BillingStrategy::Flat;
        }

        let percent = parse_percent(label).unwrap_or(DEFAULT_DISCOUNT_PERCENT);
        BillingStrategy::Discounted { percent }
    }

    /// Returns true for the discounted variant.
    #[inline]
    pub const fn is_discounted(&self) -> bool {
        matches!(self, BillingStrategy::Discounted { .. })
    }
}

/// Extracts the percent from a `"Discounted (20%)"`-shaped label.
fn parse_percent(label: &str) -> Option<f64> {
    let start = label.find('(')? + 1;
    let end = label.find(')')?;
    if start >= end {
        return None;
    }

    label[start..end].replace('%', "").trim().parse().ok()
}

impl Default for BillingStrategy {
    fn default() -> Self {
        BillingStrategy::Flat
    }
}

/// Displays the strategy label.
impl fmt::Display for BillingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
