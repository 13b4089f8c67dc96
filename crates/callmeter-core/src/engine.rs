//! # Billing Engine
//!
//! The aggregate composing the tariff catalog and the subscription ledger
//! behind one API, with change-notification fan-out.
//!
//! ## Engine Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        BillingEngine                                │
//! │                                                                     │
//! │  Collaborator (UI / store)                                          │
//! │       │ add_consumer("alice", 100, "Basic")                         │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │  BillingEngine                                                │  │
//! │  │                                                               │  │
//! │  │   ┌───────────────┐        ┌─────────────────────┐            │  │
//! │  │   │ TariffCatalog │◄───────│ SubscriptionLedger  │            │  │
//! │  │   │ (owned)       │ priced │ (owned)             │            │  │
//! │  │   └───────────────┘ lookups└─────────────────────┘            │  │
//! │  │                                                               │  │
//! │  │   on success ──► ChangeListener fan-out                       │  │
//! │  │                  (auto-save scheduler, UI refresh, ...)       │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │                                                                     │
//! │  THREAD SAFETY: the engine is a single-owner structure. Callers     │
//! │  that share it across tasks wrap it in Arc<Mutex<..>> and           │
//! │  serialize mutations themselves.                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::ledger::{SubscriptionLedger, UsageRecord};
use crate::snapshot::{ConsumerSummary, ConsumerTariffView, Snapshot, TariffSummary, UsageEntry};
use crate::tariff::{Tariff, TariffCatalog};

// =============================================================================
// Change Listener
// =============================================================================

/// Observer notified after every successful engine mutation
/// (implemented by the auto-save scheduler and the UI refresh hook).
pub trait ChangeListener: Send + Sync {
    /// Called once per successful mutating operation.
    fn on_change(&self);
}

/// No-op listener for testing.
pub struct NoOpListener;

impl ChangeListener for NoOpListener {
    fn on_change(&self) {}
}

// =============================================================================
// Billing Engine
// =============================================================================

/// The billing aggregate: tariffs + subscriptions behind one surface.
///
/// One engine instance is constructed at process start and handed to every
/// collaborator that needs it; there is no ambient singleton.
#[derive(Default)]
pub struct BillingEngine {
    /// Owned exclusively; no external component mutates it directly.
    catalog: TariffCatalog,

    /// Owned exclusively.
    ledger: SubscriptionLedger,

    /// Subscribers to mutation notifications.
    listeners: Vec<Arc<dyn ChangeListener>>,
}

impl BillingEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        BillingEngine::default()
    }

    /// Registers a change listener. Listeners fire after every successful
    /// mutation, in subscription order.
    pub fn subscribe(&mut self, listener: Arc<dyn ChangeListener>) {
        self.listeners.push(listener);
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener.on_change();
        }
    }

    // =========================================================================
    // Mutating Operations
    // =========================================================================
    // Each returns an explicit success boolean; rejections are logged no-ops
    // inside the catalog/ledger and never notify.

    /// Adds a flat-rate tariff and registers its (empty) subscriber list.
    pub fn add_flat_tariff(&mut self, name: &str, base_cost: f64, description: &str) -> bool {
        let added = self.catalog.add_flat(name, base_cost, description);
        if added {
            self.ledger.register_tariff(name);
            self.notify();
        }
        added
    }

    /// Adds a discounted tariff. The base cost is stored as supplied; the
    /// discount applies at cost-computation time only.
    pub fn add_discounted_tariff(
        &mut self,
        name: &str,
        base_cost: f64,
        percent: f64,
        description: &str,
    ) -> bool {
        let added = self.catalog.add_discounted(name, base_cost, percent, description);
        if added {
            self.ledger.register_tariff(name);
            self.notify();
        }
        added
    }

    /// Overwrites a tariff's description.
    pub fn set_description(&mut self, name: &str, description: &str) -> bool {
        let updated = self.catalog.set_description(name, description);
        if updated {
            self.notify();
        }
        updated
    }

    /// Creates a consumer with one usage record.
    pub fn add_consumer(&mut self, name: &str, minutes: i64, tariff_name: &str) -> bool {
        let added = self
            .ledger
            .add_consumer(&self.catalog, name, minutes, tariff_name);
        if added {
            self.notify();
        }
        added
    }

    /// Removes a consumer and its reverse-index entries.
    pub fn remove_consumer(&mut self, name: &str) -> bool {
        let removed = self.ledger.remove_consumer(name);
        if removed {
            self.notify();
        }
        removed
    }

    /// Subscribes an existing consumer to another tariff (a new independent
    /// record, even if one already exists for the same tariff).
    pub fn add_usage_record(&mut self, consumer: &str, minutes: i64, tariff_name: &str) -> bool {
        let added = self
            .ledger
            .add_usage_record(&self.catalog, consumer, minutes, tariff_name);
        if added {
            self.notify();
        }
        added
    }

    /// Adds minutes to the first record matching the tariff.
    pub fn increment_usage(&mut self, consumer: &str, minutes: i64, tariff_name: &str) -> bool {
        let updated = self
            .ledger
            .increment_usage(&self.catalog, consumer, minutes, tariff_name);
        if updated {
            self.notify();
        }
        updated
    }

    // =========================================================================
    // Read Operations
    // =========================================================================
    // Synchronous, side-effect-free queries over the current state.

    /// Total charge for a consumer; `None` when unknown.
    pub fn total_cost(&self, consumer: &str) -> Option<f64> {
        self.ledger.total_cost(&self.catalog, consumer)
    }

    /// Charge for the first record matching the tariff; `None` when the
    /// consumer, the record, or the tariff is absent.
    pub fn cost_of_record(&self, consumer: &str, tariff_name: &str) -> Option<f64> {
        self.ledger.cost_of_record(&self.catalog, consumer, tariff_name)
    }

    /// Number of distinct consumers subscribed to a tariff.
    pub fn subscriber_count_of(&self, tariff_name: &str) -> usize {
        self.ledger.subscriber_count_of(tariff_name)
    }

    /// Consumer names in insertion order.
    pub fn consumer_names(&self) -> Vec<String> {
        self.ledger.consumer_names()
    }

    /// Number of consumers.
    pub fn consumer_count(&self) -> usize {
        self.ledger.consumer_count()
    }

    /// Per-record minutes of a consumer (empty when unknown).
    pub fn minutes_of(&self, consumer: &str) -> Vec<i64> {
        self.ledger.minutes_of(consumer)
    }

    /// True when a tariff with this name is registered.
    pub fn tariff_exists(&self, name: &str) -> bool {
        self.catalog.exists(name)
    }

    /// Looks up a tariff by name.
    pub fn find_tariff(&self, name: &str) -> Option<&Tariff> {
        self.catalog.find(name)
    }

    /// Number of registered tariffs.
    pub fn tariff_count(&self) -> usize {
        self.catalog.len()
    }

    /// Tariff projections for display, export, and persistence.
    pub fn tariff_summaries(&self) -> Vec<TariffSummary> {
        self.catalog
            .iter()
            .map(|tariff| TariffSummary {
                name: tariff.name.clone(),
                base_cost: tariff.base_cost,
                strategy: Some(tariff.strategy),
                strategy_name: tariff.strategy_label(),
                consumer_count: self.ledger.subscriber_count_of(&tariff.name),
                description: if tariff.description.is_empty() {
                    None
                } else {
                    Some(tariff.description.clone())
                },
            })
            .collect()
    }

    /// Consumer projections with per-record and total charges.
    ///
    /// A record whose tariff is missing from the catalog shows a 0 charge,
    /// matching its contribution to the total.
    pub fn consumer_summaries(&self) -> Vec<ConsumerSummary> {
        self.ledger
            .consumers()
            .iter()
            .map(|consumer| ConsumerSummary {
                name: consumer.name.clone(),
                total_cost: self
                    .ledger
                    .total_cost(&self.catalog, &consumer.name)
                    .unwrap_or(0.0),
                tariffs: consumer
                    .records
                    .iter()
                    .map(|record| ConsumerTariffView {
                        tariff_name: record.tariff_name.clone(),
                        minutes: record.minutes,
                        cost: self
                            .catalog
                            .find(&record.tariff_name)
                            .map(|t| t.compute_cost(record.minutes))
                            .unwrap_or(0.0),
                    })
                    .collect(),
            })
            .collect()
    }

    // =========================================================================
    // Persistence Surface
    // =========================================================================

    /// Captures the full persisted shape of the engine.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            consumers: self.consumer_summaries(),
            tariffs: self.tariff_summaries(),
            tariffs_map: self
                .ledger
                .indexed_tariffs()
                .map(|name| (name.clone(), self.ledger.subscribers_of(name).to_vec()))
                .collect(),
            consumers_tariffs: self
                .ledger
                .consumers()
                .iter()
                .map(|consumer| {
                    (
                        consumer.name.clone(),
                        consumer
                            .records
                            .iter()
                            .map(|r| UsageEntry {
                                tariff_name: r.tariff_name.clone(),
                                minutes: r.minutes,
                            })
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    /// Replaces all engine state with the snapshot's contents.
    ///
    /// Reconstruction is single-sourced: tariffs come from the summaries
    /// (structured strategy preferred, label fallback), consumers from the
    /// canonical `consumersTariffs` map — or, for legacy files that carry
    /// only summaries, from the consumers' usage breakdowns. The reverse
    /// index and subscriber counts are derived from the rebuilt ledger; the
    /// persisted `tariffsMap` and `consumerCount` are not trusted.
    ///
    /// Listeners are NOT notified: this is the load path, not a user
    /// mutation.
    pub fn bulk_load(&mut self, snapshot: &Snapshot) {
        self.catalog.clear();
        self.ledger.clear();

        for summary in &snapshot.tariffs {
            let tariff = Tariff::new(
                summary.name.clone(),
                summary.base_cost,
                summary.resolved_strategy(),
                summary.description_or_empty(),
            );
            if self.catalog.add(tariff) {
                self.ledger.register_tariff(&summary.name);
            }
        }

        if !snapshot.consumers_tariffs.is_empty() {
            for (name, entries) in &snapshot.consumers_tariffs {
                let records = entries
                    .iter()
                    .map(|e| UsageRecord::new(e.tariff_name.clone(), e.minutes))
                    .collect();
                self.ledger.restore_consumer(name, records);
            }
        } else {
            // Legacy fallback: no canonical map, rebuild from the summaries.
            for consumer in &snapshot.consumers {
                let records = consumer
                    .tariffs
                    .iter()
                    .map(|view| UsageRecord::new(view.tariff_name.clone(), view.minutes))
                    .collect();
                self.ledger.restore_consumer(&consumer.name, records);
            }
        }

        info!(
            tariffs = self.catalog.len(),
            consumers = self.ledger.consumer_count(),
            "engine state loaded"
        );
    }

    /// Merges imported tariff summaries into the catalog.
    ///
    /// Only tariffs whose name is not already present are added (duplicates
    /// are skipped, never merged or updated). Returns the number imported;
    /// listeners fire once when at least one tariff was added.
    pub fn import_summaries(&mut self, summaries: &[TariffSummary]) -> usize {
        let mut imported = 0;

        for summary in summaries {
            if self.catalog.exists(&summary.name) {
                debug!(tariff = %summary.name, "duplicate name, import skipped");
                continue;
            }

            let tariff = Tariff::new(
                summary.name.clone(),
                summary.base_cost,
                summary.resolved_strategy(),
                summary.description_or_empty(),
            );
            if self.catalog.add(tariff) {
                self.ledger.register_tariff(&summary.name);
                imported += 1;
            }
        }

        info!(imported, offered = summaries.len(), "tariff import merged");
        if imported > 0 {
            self.notify();
        }
        imported
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
