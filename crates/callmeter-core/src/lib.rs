//! # callmeter-core: Pure Billing Engine
//!
//! This crate is the **heart** of callmeter. It contains the telephony
//! billing domain as pure, synchronous state machines with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      callmeter Architecture                         │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                 UI Layer (external collaborator)              │  │
//! │  │   tariff cards ──► consumer panel ──► import/export dialog    │  │
//! │  └──────────────────────────────┬────────────────────────────────┘  │
//! │                                 │ Arc<Mutex<BillingEngine>>          │
//! │  ┌──────────────────────────────▼────────────────────────────────┐  │
//! │  │              ★ callmeter-core (THIS CRATE) ★                  │  │
//! │  │                                                               │  │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │  │
//! │  │  │ strategy │ │  tariff  │ │  ledger  │ │      engine      │  │  │
//! │  │  │ Flat /   │ │ Tariff   │ │ Consumer │ │  BillingEngine   │  │  │
//! │  │  │ Discount │ │ Catalog  │ │ + index  │ │  ChangeListener  │  │  │
//! │  │  └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │  │
//! │  │                                                               │  │
//! │  │  NO I/O • NO CLOCK • NO NETWORK • PURE STATE                  │  │
//! │  └──────────────────────────────┬────────────────────────────────┘  │
//! │                                 │ Snapshot                           │
//! │  ┌──────────────────────────────▼────────────────────────────────┐  │
//! │  │                callmeter-store (persistence)                  │  │
//! │  │        JSON snapshot file, import/export, auto-save           │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`strategy`] - Billing strategies (flat / discounted) and their labels
//! - [`tariff`] - Tariff plans and the insertion-ordered catalog
//! - [`ledger`] - Consumers, usage records, and the reverse index
//! - [`engine`] - The aggregate API with change-notification fan-out
//! - [`snapshot`] - Persisted/wire data types
//!
//! ## Design Principles
//!
//! 1. **Logged no-ops**: validation rejections (duplicate names, unknown
//!    references) log and leave state untouched; they never raise.
//! 2. **Option sentinels**: cost queries answer `None` for unknown
//!    subjects, distinguishable from a legitimate zero charge.
//! 3. **One source of truth**: the usage ledger is canonical; the reverse
//!    index and all counts/costs are derived from it.
//!
//! ## Example Usage
//!
//! ```rust
//! use callmeter_core::BillingEngine;
//!
//! let mut engine = BillingEngine::new();
//! engine.add_flat_tariff("Basic", 0.10, "city calls");
//! engine.add_consumer("alice", 100, "Basic");
//!
//! assert_eq!(engine.total_cost("alice"), Some(10.0));
//! assert_eq!(engine.subscriber_count_of("Basic"), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod ledger;
pub mod snapshot;
pub mod strategy;
pub mod tariff;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use engine::{BillingEngine, ChangeListener, NoOpListener};
pub use ledger::{Consumer, SubscriptionLedger, UsageRecord};
pub use snapshot::{ConsumerSummary, ConsumerTariffView, Snapshot, TariffSummary, UsageEntry};
pub use strategy::BillingStrategy;
pub use tariff::{Tariff, TariffCatalog};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Discount percentage assumed when a legacy label carries the discounted
/// marker but no parseable percent, e.g. `"Discounted"` or
/// `"Discounted (n/a)"`.
pub const DEFAULT_DISCOUNT_PERCENT: f64 = 20.0;
