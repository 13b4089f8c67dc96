//! # callmeter-store: Persistence Gateway
//!
//! This crate persists the billing engine's state as a JSON snapshot file,
//! performs tolerant tariff import/export, and schedules debounced
//! auto-saves off the engine's change notifications.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      callmeter Data Flow                            │
//! │                                                                     │
//! │  Collaborator mutation (add tariff, add consumer, ...)              │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  BillingEngine ──► ChangeListener fan-out                           │
//! │       │                     │ on_change                             │
//! │       │ snapshot()          ▼                                       │
//! │  ┌────┴────────────────────────────────────────────────────────┐    │
//! │  │               callmeter-store (THIS CRATE)                  │    │
//! │  │                                                             │    │
//! │  │   ┌──────────────┐        ┌─────────────────────────────┐   │    │
//! │  │   │  AutoSaver   │───────►│       SnapshotStore         │   │    │
//! │  │   │  (debounce)  │  save  │  save/load/import/export    │   │    │
//! │  │   └──────────────┘        └──────────────┬──────────────┘   │    │
//! │  │                                          │                  │    │
//! │  └──────────────────────────────────────────┼──────────────────┘    │
//! │                                             ▼                       │
//! │                                callmeter.json (snapshot file)       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Store configuration (path, debounce window)
//! - [`error`] - Persistence error types
//! - [`gateway`] - Snapshot save/load and tariff import/export
//! - [`autosave`] - Debounced auto-save scheduler
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::{Arc, Mutex};
//! use callmeter_core::BillingEngine;
//! use callmeter_store::{AutoSaveListener, AutoSaver, SnapshotStore, StoreConfig};
//!
//! let config = StoreConfig::from_env();
//! let store = SnapshotStore::new(&config);
//!
//! // Load the last snapshot (missing/corrupt file → empty state).
//! let mut engine = BillingEngine::new();
//! engine.bulk_load(&store.load().await);
//!
//! // Wire auto-save and share the engine with the UI collaborator.
//! let engine = Arc::new(Mutex::new(engine));
//! let handle = AutoSaver::spawn(engine.clone(), store, config.debounce);
//! engine.lock().unwrap().subscribe(Arc::new(AutoSaveListener::new(handle)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod autosave;
pub mod config;
pub mod error;
pub mod gateway;

// =============================================================================
// Re-exports
// =============================================================================

pub use autosave::{AutoSaveListener, AutoSaver, AutoSaverHandle, StoreStatus};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use gateway::SnapshotStore;
