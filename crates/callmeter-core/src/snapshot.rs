//! # Snapshot Types
//!
//! The persisted JSON shape of the engine, plus the read-only summaries the
//! collaborating UI layer consumes.
//!
//! ## Snapshot File Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       callmeter.json                                │
//! │                                                                     │
//! │  {                                                                  │
//! │    "consumers":        [ {name, totalCost, tariffs: [...]}, ... ],  │
//! │    "tariffs":          [ {name, baseCost, strategy,                 │
//! │                           strategyName, consumerCount,              │
//! │                           description?}, ... ],                     │
//! │    "tariffsMap":       { tariffName: [consumerName, ...] },         │
//! │    "consumersTariffs": { consumerName: [{tariffName, minutes}] }    │
//! │  }                                                                  │
//! │                                                                     │
//! │  • camelCase field names, pretty-printed, UTF-8                     │
//! │  • all four top-level fields written even when empty                │
//! │  • unknown/missing fields default to empty on load                  │
//! │  • consumersTariffs is the canonical ledger; tariffsMap and the     │
//! │    derived counts/costs are written for inspection and legacy       │
//! │    compatibility but re-derived on load                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::strategy::BillingStrategy;

// =============================================================================
// Tariff Summary
// =============================================================================

/// Read-only projection of a tariff, also the import/export record.
///
/// `strategy` is the structured source of truth; `strategyName` is the
/// display label kept alongside it so legacy files (label only) still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffSummary {
    /// Tariff name (primary key; required on the wire).
    pub name: String,

    /// Base cost per minute.
    #[serde(default)]
    pub base_cost: f64,

    /// Structured strategy. Absent in files written before the tagged
    /// variant existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<BillingStrategy>,

    /// Display label ("Flat", "Discounted (20%)").
    #[serde(default)]
    pub strategy_name: String,

    /// Live subscriber count at save time. Derived again on load.
    #[serde(default)]
    pub consumer_count: usize,

    /// Optional description; omitted on save when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TariffSummary {
    /// Resolves the effective strategy: the structured field when present,
    /// otherwise re-derived from the display label (default discount 20).
    pub fn resolved_strategy(&self) -> BillingStrategy {
        self.strategy
            .unwrap_or_else(|| BillingStrategy::from_label(&self.strategy_name))
    }

    /// Description as the engine stores it (empty when absent).
    pub fn description_or_empty(&self) -> String {
        self.description.clone().unwrap_or_default()
    }
}

// =============================================================================
// Consumer Summary
// =============================================================================

/// One line of a consumer's usage breakdown, with the derived charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerTariffView {
    /// Tariff the usage accrues against.
    pub tariff_name: String,

    /// Accumulated minutes.
    #[serde(default)]
    pub minutes: i64,

    /// Charge for this record, recomputed from the catalog at save time.
    #[serde(default)]
    pub cost: f64,
}

/// Read-only projection of a consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerSummary {
    /// Consumer name (primary key).
    pub name: String,

    /// Total charge across all records, recomputed at save time.
    #[serde(default)]
    pub total_cost: f64,

    /// Per-record breakdown in subscription order.
    #[serde(default)]
    pub tariffs: Vec<ConsumerTariffView>,
}

// =============================================================================
// Usage Entry
// =============================================================================

/// A (tariff name, minutes) pair in the canonical persisted ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntry {
    /// Tariff the minutes accrued against.
    pub tariff_name: String,

    /// Accumulated minutes.
    #[serde(default)]
    pub minutes: i64,
}

// =============================================================================
// Snapshot
// =============================================================================

/// The full persisted representation of engine state.
///
/// Every field defaults to empty so partial or legacy files still
/// deserialize. Maps are BTreeMaps so the saved file is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Consumer projections (derived values included for inspection).
    #[serde(default)]
    pub consumers: Vec<ConsumerSummary>,

    /// Tariff projections.
    #[serde(default)]
    pub tariffs: Vec<TariffSummary>,

    /// Reverse index: tariff name → subscriber names. Redundant recovery
    /// path; written on save, ignored on load in favor of derivation.
    #[serde(default)]
    pub tariffs_map: BTreeMap<String, Vec<String>>,

    /// Canonical usage ledger: consumer name → usage entries.
    #[serde(default)]
    pub consumers_tariffs: BTreeMap<String, Vec<UsageEntry>>,
}

impl Snapshot {
    /// True when the snapshot carries no tariffs and no consumers.
    pub fn is_empty(&self) -> bool {
        self.tariffs.is_empty() && self.consumers.is_empty() && self.consumers_tariffs.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_loads_as_default() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.tariffs_map.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"schemaVersion": 3, "tariffs": []}"#).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_tariff_summary_requires_name() {
        assert!(serde_json::from_str::<TariffSummary>("{}").is_err());

        let minimal: TariffSummary = serde_json::from_str(r#"{"name":"Basic"}"#).unwrap();
        assert_eq!(minimal.name, "Basic");
        assert_eq!(minimal.base_cost, 0.0);
        assert_eq!(minimal.resolved_strategy(), BillingStrategy::Flat);
    }

    #[test]
    fn test_resolved_strategy_prefers_structured_field() {
        let summary: TariffSummary = serde_json::from_str(
            r#"{
                "name": "Night",
                "baseCost": 0.2,
                "strategy": {"kind": "discounted", "percent": 35.0},
                "strategyName": "Discounted (99%)"
            }"#,
        )
        .unwrap();

        // The label disagrees on purpose; the structured field wins.
        assert_eq!(summary.resolved_strategy(), BillingStrategy::discounted(35.0));
    }

    #[test]
    fn test_resolved_strategy_falls_back_to_label() {
        let summary: TariffSummary = serde_json::from_str(
            r#"{"name": "Night", "baseCost": 0.2, "strategyName": "Discounted (35%)"}"#,
        )
        .unwrap();
        assert_eq!(summary.resolved_strategy(), BillingStrategy::discounted(35.0));
    }

    #[test]
    fn test_empty_description_is_omitted_on_save() {
        let summary = TariffSummary {
            name: "Basic".to_string(),
            base_cost: 0.1,
            strategy: Some(BillingStrategy::Flat),
            strategy_name: "Flat".to_string(),
            consumer_count: 0,
            description: None,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["baseCost"], 0.1);
        assert_eq!(json["strategyName"], "Flat");
    }

    #[test]
    fn test_snapshot_round_trips() {
        let mut snapshot = Snapshot::default();
        snapshot.tariffs.push(TariffSummary {
            name: "Basic".to_string(),
            base_cost: 0.1,
            strategy: Some(BillingStrategy::Flat),
            strategy_name: "Flat".to_string(),
            consumer_count: 1,
            description: Some("city".to_string()),
        });
        snapshot
            .consumers_tariffs
            .insert("A".to_string(), vec![UsageEntry {
                tariff_name: "Basic".to_string(),
                minutes: 100,
            }]);

        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
