//! # Subscription Ledger
//!
//! Consumers, their usage records, and the reverse index from tariff name to
//! subscribed consumer names.
//!
//! ## Ledger Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      SubscriptionLedger                             │
//! │                                                                     │
//! │  consumers (insertion order)      subscribers (reverse index)       │
//! │  ───────────────────────────      ──────────────────────────        │
//! │  "alice" → [(Basic, 100),         "Basic"   → ["alice", "bob"]      │
//! │             (Premium, 40)]        "Premium" → ["alice"]             │
//! │  "bob"   → [(Basic, 250)]                                           │
//! │                                                                     │
//! │  INVARIANT: C appears in T's subscriber list exactly when C holds   │
//! │  at least one usage record for T. Subscriber lists hold distinct    │
//! │  names; a consumer with two records for the same tariff counts      │
//! │  once.                                                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The catalog is passed into every operation that validates tariff names or
//! prices usage; the ledger never owns tariffs.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::tariff::TariffCatalog;

// =============================================================================
// Usage Record
// =============================================================================

/// A (tariff name, accumulated minutes) pair belonging to a consumer.
///
/// A consumer may hold more than one record for the same tariff name if
/// subscribed twice; each is tracked independently by list position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    /// Name of the tariff this usage accrues against.
    pub tariff_name: String,

    /// Accumulated minutes (≥ 0).
    pub minutes: i64,
}

impl UsageRecord {
    /// Creates a usage record.
    pub fn new(tariff_name: impl Into<String>, minutes: i64) -> Self {
        UsageRecord {
            tariff_name: tariff_name.into(),
            minutes,
        }
    }
}

// =============================================================================
// Consumer
// =============================================================================

/// A subscriber with an ordered sequence of usage records.
#[derive(Debug, Clone)]
pub struct Consumer {
    /// Unique name (primary key within the ledger).
    pub name: String,

    /// Usage records in subscription order.
    pub records: Vec<UsageRecord>,
}

// =============================================================================
// Subscription Ledger
// =============================================================================

/// Consumers plus the tariff → consumer-names reverse index.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionLedger {
    /// Consumers in insertion order.
    consumers: Vec<Consumer>,

    /// Reverse index: tariff name → distinct subscriber names, in
    /// subscription order.
    subscribers: HashMap<String, Vec<String>>,
}

impl SubscriptionLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        SubscriptionLedger::default()
    }

    /// Installs an empty subscriber list for a freshly added tariff.
    pub fn register_tariff(&mut self, tariff_name: &str) {
        self.subscribers.entry(tariff_name.to_string()).or_default();
    }

    /// Creates a consumer with one usage record.
    ///
    /// Fails (logged, no state change) when the tariff is unknown to the
    /// catalog or the consumer name is already taken.
    pub fn add_consumer(
        &mut self,
        catalog: &TariffCatalog,
        name: &str,
        minutes: i64,
        tariff_name: &str,
    ) -> bool {
        if !catalog.exists(tariff_name) {
            warn!(consumer = %name, tariff = %tariff_name, "unknown tariff, consumer not added");
            return false;
        }
        if self.consumer(name).is_some() {
            warn!(consumer = %name, "consumer already exists, add ignored");
            return false;
        }

        self.consumers.push(Consumer {
            name: name.to_string(),
            records: vec![UsageRecord::new(tariff_name, minutes)],
        });
        self.index_subscription(tariff_name, name);
        debug!(consumer = %name, tariff = %tariff_name, minutes, "consumer added");
        true
    }

    /// Removes a consumer and strips its name from every subscriber list.
    ///
    /// Returns false when the name is unknown.
    pub fn remove_consumer(&mut self, name: &str) -> bool {
        let Some(position) = self.consumers.iter().position(|c| c.name == name) else {
            warn!(consumer = %name, "consumer not found, remove ignored");
            return false;
        };

        let consumer = self.consumers.remove(position);
        for record in &consumer.records {
            if let Some(names) = self.subscribers.get_mut(&record.tariff_name) {
                names.retain(|n| n != name);
            }
        }
        debug!(consumer = %name, "consumer removed");
        true
    }

    /// Subscribes an existing consumer to another tariff.
    ///
    /// Appends a new usage record — never merges with an existing record for
    /// the same tariff. Fails silently when consumer or tariff is unknown.
    pub fn add_usage_record(
        &mut self,
        catalog: &TariffCatalog,
        consumer_name: &str,
        minutes: i64,
        tariff_name: &str,
    ) -> bool {
        if !catalog.exists(tariff_name) {
            warn!(consumer = %consumer_name, tariff = %tariff_name, "unknown tariff, record not added");
            return false;
        }

        let Some(consumer) = self.consumer_mut(consumer_name) else {
            warn!(consumer = %consumer_name, "consumer not found, record not added");
            return false;
        };

        consumer.records.push(UsageRecord::new(tariff_name, minutes));
        self.index_subscription(tariff_name, consumer_name);
        debug!(consumer = %consumer_name, tariff = %tariff_name, minutes, "usage record added");
        true
    }

    /// Adds minutes to the first usage record matching `tariff_name`.
    ///
    /// No-op when consumer, tariff, or matching record is absent.
    pub fn increment_usage(
        &mut self,
        catalog: &TariffCatalog,
        consumer_name: &str,
        minutes: i64,
        tariff_name: &str,
    ) -> bool {
        if !catalog.exists(tariff_name) {
            warn!(consumer = %consumer_name, tariff = %tariff_name, "unknown tariff, increment ignored");
            return false;
        }

        let Some(consumer) = self.consumer_mut(consumer_name) else {
            warn!(consumer = %consumer_name, "consumer not found, increment ignored");
            return false;
        };

        match consumer
            .records
            .iter_mut()
            .find(|r| r.tariff_name == tariff_name)
        {
            Some(record) => {
                record.minutes += minutes;
                debug!(consumer = %consumer_name, tariff = %tariff_name, minutes, "usage incremented");
                true
            }
            None => {
                warn!(consumer = %consumer_name, tariff = %tariff_name, "no matching record, increment ignored");
                false
            }
        }
    }

    // =========================================================================
    // Cost Queries
    // =========================================================================

    /// Total charge across all of a consumer's usage records.
    ///
    /// `None` when the consumer is unknown. A record whose tariff is missing
    /// from the catalog at lookup time contributes 0.
    pub fn total_cost(&self, catalog: &TariffCatalog, consumer_name: &str) -> Option<f64> {
        let consumer = self.consumer(consumer_name)?;

        Some(
            consumer
                .records
                .iter()
                .map(|record| {
                    catalog
                        .find(&record.tariff_name)
                        .map(|t| t.compute_cost(record.minutes))
                        .unwrap_or(0.0)
                })
                .sum(),
        )
    }

    /// Charge for the first usage record matching `tariff_name`.
    ///
    /// `None` when the consumer, a matching record, or the tariff itself is
    /// absent.
    pub fn cost_of_record(
        &self,
        catalog: &TariffCatalog,
        consumer_name: &str,
        tariff_name: &str,
    ) -> Option<f64> {
        let record = self
            .consumer(consumer_name)?
            .records
            .iter()
            .find(|r| r.tariff_name == tariff_name)?;

        catalog
            .find(tariff_name)
            .map(|t| t.compute_cost(record.minutes))
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    /// Looks up a consumer by name.
    pub fn consumer(&self, name: &str) -> Option<&Consumer> {
        self.consumers.iter().find(|c| c.name == name)
    }

    /// All consumers, stable by insertion order.
    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    /// Consumer names in insertion order.
    pub fn consumer_names(&self) -> Vec<String> {
        self.consumers.iter().map(|c| c.name.clone()).collect()
    }

    /// Number of consumers.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// The accumulated minutes of each of a consumer's records, in record
    /// order. Empty when the consumer is unknown.
    pub fn minutes_of(&self, consumer_name: &str) -> Vec<i64> {
        self.consumer(consumer_name)
            .map(|c| c.records.iter().map(|r| r.minutes).collect())
            .unwrap_or_default()
    }

    /// Number of distinct consumers subscribed to a tariff.
    pub fn subscriber_count_of(&self, tariff_name: &str) -> usize {
        self.subscribers.get(tariff_name).map_or(0, Vec::len)
    }

    /// Subscriber names for a tariff, in subscription order.
    pub fn subscribers_of(&self, tariff_name: &str) -> &[String] {
        self.subscribers.get(tariff_name).map_or(&[], Vec::as_slice)
    }

    /// Tariff names that currently have a subscriber-list entry.
    pub fn indexed_tariffs(&self) -> impl Iterator<Item = &String> {
        self.subscribers.keys()
    }

    // =========================================================================
    // Bulk-Load Support
    // =========================================================================

    /// Drops all consumers and index entries (bulk-load entry point).
    pub fn clear(&mut self) {
        self.consumers.clear();
        self.subscribers.clear();
    }

    /// Reinstates a consumer from persisted records, deriving index entries.
    ///
    /// Load path only: no catalog validation — records naming tariffs absent
    /// from the catalog are kept and cost 0 until the tariff exists. When the
    /// name is already present the records are appended.
    pub fn restore_consumer(&mut self, name: &str, records: Vec<UsageRecord>) {
        for record in &records {
            self.index_subscription(&record.tariff_name, name);
        }

        match self.consumers.iter().position(|c| c.name == name) {
            Some(position) => self.consumers[position].records.extend(records),
            None => self.consumers.push(Consumer {
                name: name.to_string(),
                records,
            }),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn consumer_mut(&mut self, name: &str) -> Option<&mut Consumer> {
        self.consumers.iter_mut().find(|c| c.name == name)
    }

    /// Appends the consumer to the tariff's subscriber list, keeping names
    /// distinct. Creates the list on demand.
    fn index_subscription(&mut self, tariff_name: &str, consumer_name: &str) {
        let names = self.subscribers.entry(tariff_name.to_string()).or_default();
        if !names.iter().any(|n| n == consumer_name) {
            names.push(consumer_name.to_string());
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TariffCatalog {
        let mut catalog = TariffCatalog::new();
        catalog.add_flat("Basic", 0.10, "");
        catalog.add_discounted("Premium", 0.15, 20.0, "");
        catalog
    }

    #[test]
    fn test_add_consumer_and_total_cost() {
        let catalog = catalog();
        let mut ledger = SubscriptionLedger::new();

        assert!(ledger.add_consumer(&catalog, "A", 100, "Basic"));
        assert_eq!(ledger.total_cost(&catalog, "A"), Some(10.0));

        assert!(ledger.add_consumer(&catalog, "B", 200, "Premium"));
        let cost = ledger.total_cost(&catalog, "B").unwrap();
        assert!((cost - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_consumer_rejections() {
        let catalog = catalog();
        let mut ledger = SubscriptionLedger::new();

        assert!(!ledger.add_consumer(&catalog, "A", 10, "Missing"));
        assert_eq!(ledger.consumer_count(), 0);

        assert!(ledger.add_consumer(&catalog, "A", 10, "Basic"));
        assert!(!ledger.add_consumer(&catalog, "A", 99, "Premium"));
        assert_eq!(ledger.consumer_count(), 1);
        assert_eq!(ledger.minutes_of("A"), vec![10]);
    }

    #[test]
    fn test_remove_consumer_strips_index() {
        let catalog = catalog();
        let mut ledger = SubscriptionLedger::new();
        ledger.add_consumer(&catalog, "A", 100, "Basic");
        ledger.add_usage_record(&catalog, "A", 50, "Premium");
        ledger.add_consumer(&catalog, "B", 30, "Basic");

        assert!(ledger.remove_consumer("A"));
        assert_eq!(ledger.subscriber_count_of("Basic"), 1);
        assert_eq!(ledger.subscriber_count_of("Premium"), 0);
        assert_eq!(ledger.subscribers_of("Basic"), ["B".to_string()]);

        assert!(!ledger.remove_consumer("A"));
        assert!(!ledger.remove_consumer("nobody"));
    }

    #[test]
    fn test_duplicate_records_tracked_independently() {
        let catalog = catalog();
        let mut ledger = SubscriptionLedger::new();
        ledger.add_consumer(&catalog, "A", 100, "Basic");
        assert!(ledger.add_usage_record(&catalog, "A", 40, "Basic"));

        // Two records, but the subscriber list counts the consumer once.
        assert_eq!(ledger.minutes_of("A"), vec![100, 40]);
        assert_eq!(ledger.subscriber_count_of("Basic"), 1);

        // Increment targets the FIRST matching record.
        assert!(ledger.increment_usage(&catalog, "A", 5, "Basic"));
        assert_eq!(ledger.minutes_of("A"), vec![105, 40]);

        // cost_of_record prices the first record only.
        let cost = ledger.cost_of_record(&catalog, "A", "Basic").unwrap();
        assert!((cost - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_increment_usage_rejections() {
        let catalog = catalog();
        let mut ledger = SubscriptionLedger::new();
        ledger.add_consumer(&catalog, "A", 100, "Basic");

        assert!(!ledger.increment_usage(&catalog, "A", 5, "Missing"));
        assert!(!ledger.increment_usage(&catalog, "ghost", 5, "Basic"));
        assert!(!ledger.increment_usage(&catalog, "A", 5, "Premium"));
        assert_eq!(ledger.minutes_of("A"), vec![100]);
    }

    #[test]
    fn test_cost_queries_return_none_sentinel() {
        let catalog = catalog();
        let mut ledger = SubscriptionLedger::new();
        ledger.add_consumer(&catalog, "A", 0, "Basic");

        // Zero cost is a real answer, distinguishable from the sentinel.
        assert_eq!(ledger.total_cost(&catalog, "A"), Some(0.0));
        assert_eq!(ledger.total_cost(&catalog, "ghost"), None);
        assert_eq!(ledger.cost_of_record(&catalog, "ghost", "Basic"), None);
        assert_eq!(ledger.cost_of_record(&catalog, "A", "Premium"), None);
    }

    #[test]
    fn test_missing_tariff_contributes_zero_to_total() {
        let catalog = catalog();
        let mut ledger = SubscriptionLedger::new();
        // Restored from disk against a catalog that no longer has "Legacy".
        ledger.restore_consumer(
            "A",
            vec![UsageRecord::new("Basic", 100), UsageRecord::new("Legacy", 500)],
        );

        assert_eq!(ledger.total_cost(&catalog, "A"), Some(10.0));
        // cost_of_record cannot price a record without its tariff.
        assert_eq!(ledger.cost_of_record(&catalog, "A", "Legacy"), None);
        // Index entry exists regardless, so ledger and index agree.
        assert_eq!(ledger.subscriber_count_of("Legacy"), 1);
    }

    #[test]
    fn test_index_matches_ledger_after_mutation_sequence() {
        let catalog = catalog();
        let mut ledger = SubscriptionLedger::new();
        ledger.register_tariff("Basic");
        ledger.register_tariff("Premium");

        ledger.add_consumer(&catalog, "A", 10, "Basic");
        ledger.add_consumer(&catalog, "B", 20, "Basic");
        ledger.add_usage_record(&catalog, "A", 30, "Premium");
        ledger.add_usage_record(&catalog, "B", 40, "Basic");
        ledger.remove_consumer("B");
        ledger.add_consumer(&catalog, "C", 50, "Premium");

        for tariff in ["Basic", "Premium"] {
            let holding = ledger
                .consumers()
                .iter()
                .filter(|c| c.records.iter().any(|r| r.tariff_name == tariff))
                .count();
            assert_eq!(ledger.subscriber_count_of(tariff), holding, "tariff: {tariff}");
        }
    }

    #[test]
    fn test_register_tariff_installs_empty_list() {
        let mut ledger = SubscriptionLedger::new();
        ledger.register_tariff("Basic");
        assert_eq!(ledger.subscriber_count_of("Basic"), 0);
        // Unregistered tariffs also answer zero, not a panic.
        assert_eq!(ledger.subscriber_count_of("Missing"), 0);
    }
}
