//! # Snapshot Store
//!
//! Save/load for the full engine snapshot, plus the tolerant tariff
//! import/export paths.
//!
//! ## Import Fallback Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  Tolerant Tariff Import                             │
//! │                                                                     │
//! │  file contents                                                      │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  1. Parse as full snapshot object ── ≥1 tariff? ──► its tariff list │
//! │       │ (parse failed or zero tariffs)                              │
//! │       ▼                                                             │
//! │  2. Parse as bare tariff array ───── non-empty? ──► the array       │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  3. Parse as single tariff object ── ok? ─────────► [that tariff]   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  4. Empty list (zero imported — a valid outcome, not an error)      │
//! │                                                                     │
//! │  Each attempt is isolated: a failure never aborts the next one.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, info, warn};

use callmeter_core::{Snapshot, TariffSummary};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

// =============================================================================
// Snapshot Store
// =============================================================================

/// Persistence gateway for the engine snapshot.
///
/// ## Usage
/// ```rust,ignore
/// let store = SnapshotStore::new(&StoreConfig::from_env());
///
/// let snapshot = store.load().await;          // missing/bad file → empty
/// store.save(&engine.snapshot()).await?;      // atomic whole-file rewrite
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store writing to the configured snapshot path.
    pub fn new(config: &StoreConfig) -> Self {
        info!(path = %config.data_path.display(), "snapshot store ready");
        SnapshotStore {
            data_path: config.data_path.clone(),
        }
    }

    /// Creates a store writing to an explicit path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        SnapshotStore {
            data_path: path.into(),
        }
    }

    /// Path of the snapshot file.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// True when a snapshot file exists on disk.
    pub fn data_file_exists(&self) -> bool {
        self.data_path.exists()
    }

    // =========================================================================
    // Snapshot Save / Load
    // =========================================================================

    /// Writes the snapshot as pretty-printed JSON.
    ///
    /// The write is an atomic whole-file rewrite: contents land in a
    /// sibling `.tmp` file first and are renamed over the target, so a
    /// crash mid-save never leaves a truncated snapshot. Failures are
    /// logged and returned; the caller retries on the next mutation.
    pub async fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(snapshot)?;

        if let Some(parent) = self.data_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let tmp_path = tmp_sibling(&self.data_path);
        if let Err(e) = fs::write(&tmp_path, json.as_bytes()).await {
            error!(path = %tmp_path.display(), error = %e, "snapshot write failed");
            return Err(StoreError::io(tmp_path, e));
        }
        if let Err(e) = fs::rename(&tmp_path, &self.data_path).await {
            error!(path = %self.data_path.display(), error = %e, "snapshot rename failed");
            return Err(StoreError::io(&self.data_path, e));
        }

        debug!(
            path = %self.data_path.display(),
            tariffs = snapshot.tariffs.len(),
            consumers = snapshot.consumers.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Reads the snapshot, substituting an empty one for a missing file or
    /// malformed contents. Never an error to the caller.
    pub async fn load(&self) -> Snapshot {
        let text = match fs::read_to_string(&self.data_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.data_path.display(), "no snapshot file yet, starting empty");
                return Snapshot::default();
            }
            Err(e) => {
                warn!(path = %self.data_path.display(), error = %e, "snapshot read failed, starting empty");
                return Snapshot::default();
            }
        };

        match serde_json::from_str::<Snapshot>(&text) {
            Ok(snapshot) => {
                info!(
                    path = %self.data_path.display(),
                    tariffs = snapshot.tariffs.len(),
                    consumers = snapshot.consumers.len(),
                    "snapshot loaded"
                );
                snapshot
            }
            Err(e) => {
                warn!(path = %self.data_path.display(), error = %e, "malformed snapshot, starting empty");
                Snapshot::default()
            }
        }
    }

    /// Deletes the snapshot file. Missing file is not an error.
    pub async fn delete_data_file(&self) -> StoreResult<()> {
        match fs::remove_file(&self.data_path).await {
            Ok(()) => {
                info!(path = %self.data_path.display(), "snapshot file deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.data_path, e)),
        }
    }

    // =========================================================================
    // Tariff Import / Export
    // =========================================================================

    /// Reads tariff summaries from an arbitrary file using the fallback
    /// chain above. An unreadable or unrecognized file yields an empty list
    /// (reported as zero imported), never an error.
    pub async fn import_tariffs(&self, path: &Path) -> Vec<TariffSummary> {
        let text = match fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "import file unreadable");
                return Vec::new();
            }
        };

        let tariffs = decode_tariff_payload(&text);
        info!(path = %path.display(), count = tariffs.len(), "tariff import decoded");
        tariffs
    }

    /// Writes tariff summaries as a bare pretty-printed array.
    pub async fn export_tariffs(
        &self,
        tariffs: &[TariffSummary],
        path: &Path,
    ) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(tariffs)?;
        fs::write(path, json.as_bytes())
            .await
            .map_err(|e| StoreError::io(path, e))?;

        info!(path = %path.display(), count = tariffs.len(), "tariffs exported");
        Ok(())
    }

    /// Probes whether a file parses as any accepted tariff shape (full
    /// snapshot, bare array, or single summary). Contents are discarded.
    pub async fn is_valid_tariff_file(&self, path: &Path) -> bool {
        let Ok(text) = fs::read_to_string(path).await else {
            return false;
        };

        serde_json::from_str::<Snapshot>(&text).is_ok()
            || serde_json::from_str::<Vec<TariffSummary>>(&text).is_ok()
            || serde_json::from_str::<TariffSummary>(&text).is_ok()
    }
}

/// `<path>.tmp` next to the target, for the atomic rename.
fn tmp_sibling(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// The ordered fallback decode. Pure so the shapes are testable without
/// touching the filesystem.
fn decode_tariff_payload(text: &str) -> Vec<TariffSummary> {
    if let Ok(snapshot) = serde_json::from_str::<Snapshot>(text) {
        if !snapshot.tariffs.is_empty() {
            debug!(count = snapshot.tariffs.len(), "import matched full snapshot shape");
            return snapshot.tariffs;
        }
    }

    if let Ok(tariffs) = serde_json::from_str::<Vec<TariffSummary>>(text) {
        if !tariffs.is_empty() {
            debug!(count = tariffs.len(), "import matched bare array shape");
            return tariffs;
        }
    }

    if let Ok(tariff) = serde_json::from_str::<TariffSummary>(text) {
        debug!(tariff = %tariff.name, "import matched single tariff shape");
        return vec![tariff];
    }

    debug!("import matched no shape");
    Vec::new()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use callmeter_core::BillingEngine;

    fn seeded_engine() -> BillingEngine {
        let mut engine = BillingEngine::new();
        engine.add_flat_tariff("Basic", 0.10, "");
        engine.add_discounted_tariff("Premium", 0.15, 20.0, "evening plan");
        engine.add_consumer("A", 100, "Basic");
        engine.add_consumer("B", 200, "Premium");
        engine
    }

    fn store_in(dir: &tempfile::TempDir) -> SnapshotStore {
        SnapshotStore::at_path(dir.path().join("callmeter.json"))
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let engine = seeded_engine();

        store.save(&engine.snapshot()).await.unwrap();
        assert!(store.data_file_exists());

        let loaded = store.load().await;
        let mut restored = BillingEngine::new();
        restored.bulk_load(&loaded);

        assert_eq!(restored.tariff_count(), 2);
        assert_eq!(restored.consumer_count(), 2);
        let total = restored.total_cost("B").unwrap();
        assert!((total - 24.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_save_leaves_no_tmp_residue() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&seeded_engine().snapshot()).await.unwrap();

        let residue: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(residue.is_empty(), "tmp files left behind: {residue:?}");
    }

    #[tokio::test]
    async fn test_saved_file_is_pretty_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&seeded_engine().snapshot()).await.unwrap();

        let text = std::fs::read_to_string(store.data_path()).unwrap();
        assert!(text.contains('\n'), "expected pretty-printed output");
        for field in ["\"consumers\"", "\"tariffs\"", "\"tariffsMap\"", "\"consumersTariffs\""] {
            assert!(text.contains(field), "missing field: {field}");
        }
        assert!(text.contains("\"baseCost\""));
    }

    #[tokio::test]
    async fn test_empty_engine_still_writes_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&BillingEngine::new().snapshot()).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.data_path()).unwrap()).unwrap();
        for field in ["consumers", "tariffs", "tariffsMap", "consumersTariffs"] {
            assert!(value.get(field).is_some(), "missing field: {field}");
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let snapshot = store.load().await;
        assert!(snapshot.is_empty());

        let mut engine = BillingEngine::new();
        engine.bulk_load(&snapshot);
        assert_eq!(engine.tariff_count(), 0);
        assert_eq!(engine.consumer_count(), 0);
    }

    #[tokio::test]
    async fn test_load_malformed_file_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.data_path(), "{ not json ]").unwrap();

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::at_path(dir.path().join("nested/deep/callmeter.json"));

        store.save(&seeded_engine().snapshot()).await.unwrap();
        assert!(store.data_file_exists());
    }

    #[tokio::test]
    async fn test_delete_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&seeded_engine().snapshot()).await.unwrap();

        store.delete_data_file().await.unwrap();
        assert!(!store.data_file_exists());
        // Deleting again is not an error.
        store.delete_data_file().await.unwrap();
    }

    // -------------------------------------------------------------------------
    // Import shapes
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_import_full_snapshot_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let import_path = dir.path().join("import.json");
        let snapshot_json = serde_json::to_string_pretty(&seeded_engine().snapshot()).unwrap();
        std::fs::write(&import_path, snapshot_json).unwrap();

        let tariffs = store.import_tariffs(&import_path).await;
        assert_eq!(tariffs.len(), 2);
    }

    #[tokio::test]
    async fn test_import_bare_array_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let import_path = dir.path().join("import.json");
        std::fs::write(
            &import_path,
            r#"[
                {"name": "Night", "baseCost": 0.05, "strategyName": "Discounted (50%)"},
                {"name": "Day", "baseCost": 0.2, "strategyName": "Flat"}
            ]"#,
        )
        .unwrap();

        let tariffs = store.import_tariffs(&import_path).await;
        assert_eq!(tariffs.len(), 2);
        assert_eq!(tariffs[0].name, "Night");
    }

    #[tokio::test]
    async fn test_import_single_object_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let import_path = dir.path().join("import.json");
        std::fs::write(&import_path, r#"{"name": "Solo", "baseCost": 0.3}"#).unwrap();

        let tariffs = store.import_tariffs(&import_path).await;
        assert_eq!(tariffs.len(), 1);
        assert_eq!(tariffs[0].name, "Solo");
    }

    #[tokio::test]
    async fn test_import_unrecognized_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let import_path = dir.path().join("import.json");
        for payload in ["not json at all", "42", "[]", "{}"] {
            std::fs::write(&import_path, payload).unwrap();
            let tariffs = store.import_tariffs(&import_path).await;
            assert!(tariffs.is_empty(), "payload: {payload}");
        }

        // Missing file: same non-error outcome.
        let tariffs = store.import_tariffs(&dir.path().join("missing.json")).await;
        assert!(tariffs.is_empty());
    }

    #[tokio::test]
    async fn test_import_merge_skips_duplicates_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut engine = seeded_engine();

        let import_path = dir.path().join("import.json");
        std::fs::write(
            &import_path,
            r#"[
                {"name": "Basic", "baseCost": 9.9, "strategyName": "Flat"},
                {"name": "Night", "baseCost": 0.05, "strategyName": "Discounted (50%)"}
            ]"#,
        )
        .unwrap();

        let offered = store.import_tariffs(&import_path).await;
        assert_eq!(engine.import_summaries(&offered), 1);
        assert_eq!(engine.tariff_count(), 3);
        assert_eq!(engine.find_tariff("Basic").unwrap().base_cost, 0.10);
    }

    #[tokio::test]
    async fn test_export_writes_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let engine = seeded_engine();

        let export_path = dir.path().join("export.json");
        store
            .export_tariffs(&engine.tariff_summaries(), &export_path)
            .await
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
        let array = value.as_array().expect("export must be a bare array");
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["name"], "Basic");
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let engine = seeded_engine();

        let path = dir.path().join("tariffs.json");
        store
            .export_tariffs(&engine.tariff_summaries(), &path)
            .await
            .unwrap();

        let back = store.import_tariffs(&path).await;
        assert_eq!(back, engine.tariff_summaries());
    }

    #[tokio::test]
    async fn test_is_valid_tariff_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let path = dir.path().join("probe.json");

        std::fs::write(&path, r#"{"name": "Solo", "baseCost": 0.3}"#).unwrap();
        assert!(store.is_valid_tariff_file(&path).await);

        std::fs::write(&path, "[]").unwrap();
        assert!(store.is_valid_tariff_file(&path).await);

        std::fs::write(&path, "definitely not json").unwrap();
        assert!(!store.is_valid_tariff_file(&path).await);

        assert!(!store.is_valid_tariff_file(&dir.path().join("missing.json")).await);
    }
}
