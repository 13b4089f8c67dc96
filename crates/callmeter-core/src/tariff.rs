//! # Tariff Catalog
//!
//! Named billing plans and the catalog that owns them.
//!
//! ## Catalog Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        TariffCatalog                                │
//! │                                                                     │
//! │  • The tariff name is the primary key (case-sensitive, unique).     │
//! │  • Iteration order is insertion order (Vec-backed).                 │
//! │  • Adding a duplicate name is a logged no-op, never an error.       │
//! │  • Tariffs are never removed; only descriptions mutate in place.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::strategy::BillingStrategy;

// =============================================================================
// Tariff
// =============================================================================

/// A named billing plan with a per-minute base cost and a billing strategy.
///
/// ## Base Cost Convention
/// `base_cost` is stored exactly as supplied by the caller. For discounted
/// tariffs the discount is applied only during cost computation — never baked
/// into the stored rate. A caller that pre-discounts the rate would
/// double-apply the discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tariff {
    /// Unique name (primary key within the catalog).
    pub name: String,

    /// Base cost per minute (non-negative).
    pub base_cost: f64,

    /// The cost-computation policy. Never absent.
    pub strategy: BillingStrategy,

    /// Free-text description (empty when not provided).
    #[serde(default)]
    pub description: String,
}

impl Tariff {
    /// Creates a tariff with the given strategy.
    pub fn new(
        name: impl Into<String>,
        base_cost: f64,
        strategy: BillingStrategy,
        description: impl Into<String>,
    ) -> Self {
        Tariff {
            name: name.into(),
            base_cost,
            strategy,
            description: description.into(),
        }
    }

    /// Computes the charge for `minutes` of usage on this tariff.
    #[inline]
    pub fn compute_cost(&self, minutes: i64) -> f64 {
        self.strategy.compute_cost(self.base_cost, minutes)
    }

    /// Returns the display label of the attached strategy.
    #[inline]
    pub fn strategy_label(&self) -> String {
        self.strategy.label()
    }

    /// True when a non-empty description is present.
    #[inline]
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// Tariffs compare equal on (name, base cost, description).
impl PartialEq for Tariff {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.base_cost == other.base_cost
            && self.description == other.description
    }
}

/// Ordering compares the per-minute base cost only.
impl PartialOrd for Tariff {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.base_cost.partial_cmp(&other.base_cost)
    }
}

// =============================================================================
// Tariff Catalog
// =============================================================================

/// The set of named tariffs, stable by insertion order.
#[derive(Debug, Clone, Default)]
pub struct TariffCatalog {
    tariffs: Vec<Tariff>,
}

impl TariffCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        TariffCatalog::default()
    }

    /// Adds a flat-rate tariff.
    ///
    /// Returns false (logged, no state change) when `name` already exists.
    pub fn add_flat(
        &mut self,
        name: impl Into<String>,
        base_cost: f64,
        description: impl Into<String>,
    ) -> bool {
        self.add(Tariff::new(name, base_cost, BillingStrategy::Flat, description))
    }

    /// Adds a discounted tariff.
    ///
    /// `base_cost` is registered as supplied; `percent` takes effect only at
    /// cost-computation time. Returns false when `name` already exists.
    pub fn add_discounted(
        &mut self,
        name: impl Into<String>,
        base_cost: f64,
        percent: f64,
        description: impl Into<String>,
    ) -> bool {
        self.add(Tariff::new(
            name,
            base_cost,
            BillingStrategy::discounted(percent),
            description,
        ))
    }

    /// Adds a pre-built tariff, enforcing name uniqueness.
    pub fn add(&mut self, tariff: Tariff) -> bool {
        if self.exists(&tariff.name) {
            warn!(tariff = %tariff.name, "tariff already exists, add ignored");
            return false;
        }

        debug!(tariff = %tariff.name, strategy = %tariff.strategy_label(), "tariff added");
        self.tariffs.push(tariff);
        true
    }

    /// Overwrites a tariff's description in place.
    ///
    /// Returns false (logged, no state change) when `name` is not found.
    pub fn set_description(&mut self, name: &str, description: impl Into<String>) -> bool {
        match self.tariffs.iter_mut().find(|t| t.name == name) {
            Some(tariff) => {
                tariff.description = description.into();
                debug!(tariff = %name, "tariff description updated");
                true
            }
            None => {
                warn!(tariff = %name, "tariff not found, description ignored");
                false
            }
        }
    }

    /// Looks up a tariff by name.
    pub fn find(&self, name: &str) -> Option<&Tariff> {
        self.tariffs.iter().find(|t| t.name == name)
    }

    /// True when a tariff with this name is registered.
    pub fn exists(&self, name: &str) -> bool {
        self.tariffs.iter().any(|t| t.name == name)
    }

    /// All tariffs, stable by insertion order.
    pub fn list(&self) -> &[Tariff] {
        &self.tariffs
    }

    /// Iterates tariffs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Tariff> {
        self.tariffs.iter()
    }

    /// Number of registered tariffs.
    pub fn len(&self) -> usize {
        self.tariffs.len()
    }

    /// True when no tariffs are registered.
    pub fn is_empty(&self) -> bool {
        self.tariffs.is_empty()
    }

    /// Drops every tariff (bulk-load entry point).
    pub fn clear(&mut self) {
        self.tariffs.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_flat_and_lookup() {
        let mut catalog = TariffCatalog::new();
        assert!(catalog.add_flat("Basic", 0.10, ""));
        assert!(catalog.exists("Basic"));

        let tariff = catalog.find("Basic").unwrap();
        assert_eq!(tariff.base_cost, 0.10);
        assert_eq!(tariff.strategy, BillingStrategy::Flat);
        assert!(!tariff.has_description());
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut catalog = TariffCatalog::new();
        assert!(catalog.add_flat("Basic", 0.10, ""));
        assert!(!catalog.add_flat("Basic", 0.99, "other"));

        // First registration wins, untouched.
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("Basic").unwrap().base_cost, 0.10);
    }

    #[test]
    fn test_discounted_keeps_supplied_base_cost() {
        let mut catalog = TariffCatalog::new();
        catalog.add_discounted("Premium", 0.15, 20.0, "evening plan");

        let tariff = catalog.find("Premium").unwrap();
        assert_eq!(tariff.base_cost, 0.15);
        assert_eq!(tariff.strategy, BillingStrategy::discounted(20.0));
        // Discount applies at computation time only.
        assert!((tariff.compute_cost(200) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_description() {
        let mut catalog = TariffCatalog::new();
        catalog.add_flat("Basic", 0.10, "");

        assert!(catalog.set_description("Basic", "city calls"));
        assert_eq!(catalog.find("Basic").unwrap().description, "city calls");

        assert!(!catalog.set_description("Missing", "nope"));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut catalog = TariffCatalog::new();
        for name in ["C", "A", "B"] {
            catalog.add_flat(name, 1.0, "");
        }

        let names: Vec<_> = catalog.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut catalog = TariffCatalog::new();
        assert!(catalog.add_flat("basic", 0.10, ""));
        assert!(catalog.add_flat("Basic", 0.20, ""));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_tariff_ordering_by_base_cost() {
        let cheap = Tariff::new("A", 0.05, BillingStrategy::Flat, "");
        let pricey = Tariff::new("B", 0.50, BillingStrategy::Flat, "");
        assert!(cheap < pricey);
        assert!(pricey >= cheap);
    }

    #[test]
    fn test_tariff_equality_ignores_strategy() {
        let a = Tariff::new("A", 0.05, BillingStrategy::Flat, "x");
        let b = Tariff::new("A", 0.05, BillingStrategy::discounted(10.0), "x");
        assert_eq!(a, b);
    }
}
