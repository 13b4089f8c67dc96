//! # Store Configuration
//!
//! Where the snapshot lives and how eagerly it is saved.
//!
//! ## Configuration Sources (Priority Order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                   Configuration Priority                            │
//! │                                                                     │
//! │  1. Environment Variables (highest priority)                        │
//! │     CALLMETER_DATA_PATH=/var/lib/callmeter/ledger.json              │
//! │     CALLMETER_DEBOUNCE_MS=250                                       │
//! │                                                                     │
//! │  2. TOML Config File                                                │
//! │     data_path = "/var/lib/callmeter/ledger.json"                    │
//! │     debounce_ms = 250                                               │
//! │                                                                     │
//! │  3. Default Values (lowest priority)                                │
//! │     <platform data dir>/callmeter.json, 500 ms debounce             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::{info, warn};

/// Snapshot file name under the platform data directory.
pub const DATA_FILE_NAME: &str = "callmeter.json";

/// Default auto-save debounce window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

// =============================================================================
// Store Config
// =============================================================================

/// Persistence configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Absolute path of the snapshot file.
    pub data_path: PathBuf,

    /// Auto-save debounce window: a burst of mutations inside this window
    /// produces one save.
    pub debounce: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_path: default_data_path(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Resolves the snapshot path under the platform data directory, falling
/// back to the working directory when the platform offers none.
fn default_data_path() -> PathBuf {
    match ProjectDirs::from("io", "callmeter", "callmeter") {
        Some(dirs) => dirs.data_dir().join(DATA_FILE_NAME),
        None => PathBuf::from(DATA_FILE_NAME),
    }
}

/// On-disk shape of the optional TOML config file.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_path: Option<PathBuf>,
    debounce_ms: Option<u64>,
}

impl StoreConfig {
    /// Creates a config from defaults plus environment overrides.
    ///
    /// ## Environment Variables
    /// - `CALLMETER_DATA_PATH`: snapshot file path
    /// - `CALLMETER_DEBOUNCE_MS`: auto-save debounce window
    pub fn from_env() -> Self {
        let mut config = StoreConfig::default();
        config.apply_env();
        config
    }

    /// Loads the TOML file at `path` (tolerant of absence or bad contents),
    /// then applies environment overrides on top.
    pub fn load(path: &Path) -> Self {
        let file = match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str::<ConfigFile>(&text) {
                Ok(file) => {
                    info!(path = %path.display(), "store config loaded");
                    file
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "bad config file, using defaults");
                    ConfigFile::default()
                }
            },
            Err(_) => ConfigFile::default(),
        };

        let mut config = StoreConfig::default();
        if let Some(data_path) = file.data_path {
            config.data_path = data_path;
        }
        if let Some(ms) = file.debounce_ms {
            config.debounce = Duration::from_millis(ms);
        }
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("CALLMETER_DATA_PATH") {
            self.data_path = PathBuf::from(path);
        }

        if let Ok(ms_str) = std::env::var("CALLMETER_DEBOUNCE_MS") {
            if let Ok(ms) = ms_str.parse::<u64>() {
                self.debounce = Duration::from_millis(ms);
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
