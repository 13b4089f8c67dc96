//! # Auto-Save Scheduler
//!
//! Debounced, serialized snapshot saves driven by engine change
//! notifications.
//!
//! ## Scheduler Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       AutoSaver Flow                                │
//! │                                                                     │
//! │  BillingEngine mutation                                             │
//! │       │ on_change()                                                 │
//! │       ▼                                                             │
//! │  AutoSaveListener ──► AutoSaverHandle::notify()  (non-blocking)     │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                   AutoSaver task                              │  │
//! │  │                                                               │  │
//! │  │  1. Receive first notification                                │  │
//! │  │  2. Sleep the debounce window (NOT cancellable)               │  │
//! │  │  3. Drain queued notifications (burst → one save)             │  │
//! │  │  4. Lock engine, capture snapshot, unlock                     │  │
//! │  │  5. store.save(snapshot)  — failures recorded, not fatal      │  │
//! │  │  6. Loop. Notifications that arrived during the save start    │  │
//! │  │     their own cycle.                                          │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │                                                                     │
//! │  Saves are serialized by construction: one task, one file.          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio::time::sleep;
use tracing::{debug, error, info};

use callmeter_core::{BillingEngine, ChangeListener};

use crate::gateway::SnapshotStore;

// =============================================================================
// Store Status
// =============================================================================

/// Current persistence status for external queries.
#[derive(Debug, Clone, Default)]
pub struct StoreStatus {
    /// Number of snapshot saves completed successfully.
    pub saves_completed: u64,

    /// When the last successful save finished.
    pub last_save: Option<DateTime<Utc>>,

    /// Last save error, cleared by the next successful save.
    pub last_error: Option<String>,
}

// =============================================================================
// Auto-Saver
// =============================================================================

/// Background task that turns change notifications into debounced saves.
pub struct AutoSaver {
    /// The engine, shared with the mutating collaborators.
    engine: Arc<Mutex<BillingEngine>>,

    /// Persistence gateway.
    store: SnapshotStore,

    /// Debounce window.
    debounce: Duration,

    /// Incoming change notifications.
    change_rx: mpsc::Receiver<()>,

    /// Shutdown receiver.
    shutdown_rx: mpsc::Receiver<()>,

    /// Shared status.
    status: Arc<RwLock<StoreStatus>>,
}

/// Handle for notifying and controlling a running [`AutoSaver`].
#[derive(Clone)]
pub struct AutoSaverHandle {
    change_tx: mpsc::Sender<()>,
    shutdown_tx: mpsc::Sender<()>,
    status: Arc<RwLock<StoreStatus>>,
}

impl AutoSaverHandle {
    /// Queues a change notification. Non-blocking; safe to call from a
    /// synchronous listener. A full queue means a save is already pending,
    /// so dropping the notification loses nothing.
    pub fn notify(&self) {
        let _ = self.change_tx.try_send(());
    }

    /// Signals the task to stop, flushing one final save if a notification
    /// is still queued.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }

    /// Returns the current persistence status.
    pub async fn status(&self) -> StoreStatus {
        self.status.read().await.clone()
    }
}

impl AutoSaver {
    /// Creates the task and its handle without spawning.
    pub fn new(
        engine: Arc<Mutex<BillingEngine>>,
        store: SnapshotStore,
        debounce: Duration,
    ) -> (Self, AutoSaverHandle) {
        let (change_tx, change_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let status = Arc::new(RwLock::new(StoreStatus::default()));

        let saver = AutoSaver {
            engine,
            store,
            debounce,
            change_rx,
            shutdown_rx,
            status: status.clone(),
        };
        let handle = AutoSaverHandle {
            change_tx,
            shutdown_tx,
            status,
        };

        (saver, handle)
    }

    /// Spawns the task on the current runtime and returns its handle.
    pub fn spawn(
        engine: Arc<Mutex<BillingEngine>>,
        store: SnapshotStore,
        debounce: Duration,
    ) -> AutoSaverHandle {
        let (saver, handle) = AutoSaver::new(engine, store, debounce);
        tokio::spawn(saver.run());
        handle
    }

    /// Runs the scheduler loop. Spawn this as a background task.
    pub async fn run(mut self) {
        let debounce_ms = self.debounce.as_millis() as u64;
        info!(debounce_ms, "auto-saver started");

        loop {
            tokio::select! {
                // Shutdown outranks a pending change; the flush below still
                // captures whatever that change would have saved.
                biased;

                _ = self.shutdown_rx.recv() => {
                    if self.drain_pending() {
                        debug!("flushing final save before shutdown");
                        self.save_once().await;
                    }
                    break;
                }

                Some(()) = self.change_rx.recv() => {
                    // The window is committed: once it elapses the save
                    // proceeds even if newer changes are already queued.
                    sleep(self.debounce).await;
                    self.drain_pending();
                    self.save_once().await;
                }

                else => break,
            }
        }

        info!("auto-saver stopped");
    }

    /// Coalesces every queued notification into the upcoming save.
    /// Returns true when at least one was queued.
    fn drain_pending(&mut self) -> bool {
        let mut drained = false;
        while self.change_rx.try_recv().is_ok() {
            drained = true;
        }
        drained
    }

    /// Captures a snapshot under the engine lock and writes it out.
    async fn save_once(&self) {
        // Hold the lock only for the in-memory capture, not the file write.
        let snapshot = {
            let engine = match self.engine.lock() {
                Ok(engine) => engine,
                Err(poisoned) => poisoned.into_inner(),
            };
            engine.snapshot()
        };

        match self.store.save(&snapshot).await {
            Ok(()) => {
                let mut status = self.status.write().await;
                status.saves_completed += 1;
                status.last_save = Some(Utc::now());
                status.last_error = None;
            }
            Err(e) => {
                error!(error = %e, "auto-save failed, will retry on next change");
                let mut status = self.status.write().await;
                status.last_error = Some(e.to_string());
            }
        }
    }
}

// =============================================================================
// Change Listener Bridge
// =============================================================================

/// [`ChangeListener`] implementation that forwards engine mutations to the
/// auto-saver. Subscribe it on the engine at startup.
pub struct AutoSaveListener {
    handle: AutoSaverHandle,
}

impl AutoSaveListener {
    /// Creates the bridge from a running auto-saver's handle.
    pub fn new(handle: AutoSaverHandle) -> Self {
        AutoSaveListener { handle }
    }
}

impl ChangeListener for AutoSaveListener {
    fn on_change(&self) {
        self.handle.notify();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
