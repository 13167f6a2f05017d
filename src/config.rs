//! Subsystem configuration
//!
//! Which storage tiers exist and whether a JavaScript engine is available
//! are decided once at start-up from a [`ScriptsConfig`] and injected into
//! the resolver and dispatcher. The configuration is stored as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One filesystem root searched for scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTier {
    /// Short label used in logs ("sd", "store")
    pub name: String,
    pub root: PathBuf,
}

impl StorageTier {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Directory holding scripts addressed by relative name.
    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    /// Directory holding the scripts run when `event` fires.
    pub fn events_dir(&self, event: &str) -> PathBuf {
        self.root.join("events").join(event)
    }
}

/// Script subsystem configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Removable media root (SD card). Searched before the store when set.
    pub removable_root: Option<PathBuf>,
    /// Persistent storage root, always searched last
    pub store_root: PathBuf,
    /// Create the JavaScript heap at start-up
    pub javascript: bool,
    /// Longest command script line in content bytes, terminator not counted
    pub max_line_length: usize,
    /// Largest JavaScript source that will be loaded, in bytes
    pub max_script_size: u64,
    /// Heap limit for the JavaScript runtime in bytes
    pub engine_memory_limit: Option<usize>,
    /// Output kept from one JavaScript evaluation, in bytes
    pub max_script_output: usize,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            removable_root: None,
            store_root: PathBuf::from("/store"),
            javascript: true,
            max_line_length: 1024,
            max_script_size: 64 * 1024,
            engine_memory_limit: None,
            max_script_output: 64 * 1024,
        }
    }
}

impl ScriptsConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage tiers in search order: removable first, store always last.
    pub fn tiers(&self) -> Vec<StorageTier> {
        let mut tiers = Vec::with_capacity(2);
        if let Some(root) = &self.removable_root {
            tiers.push(StorageTier::new("sd", root));
        }
        tiers.push(StorageTier::new("store", &self.store_root));
        tiers
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_line_length < 2 {
            anyhow::bail!("max_line_length must be at least 2");
        }
        if self.max_script_size == 0 {
            anyhow::bail!("max_script_size must be greater than zero");
        }
        if self.max_script_output == 0 {
            anyhow::bail!("max_script_output must be greater than zero");
        }
        if !self.store_root.is_absolute() {
            anyhow::bail!("store_root must be an absolute path: {:?}", self.store_root);
        }
        if let Some(root) = &self.removable_root {
            if !root.is_absolute() {
                anyhow::bail!("removable_root must be an absolute path: {:?}", root);
            }
            if root == &self.store_root {
                anyhow::bail!("removable_root and store_root must differ");
            }
        }
        Ok(())
    }
}
