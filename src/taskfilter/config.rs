use crate::error::{FilterError, Result};
use crate::manager::TaskFilterManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const CONFIG_FILENAME: &str = "config.json";

/// Saved state of the built-in filter options, stored in `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterConfig {
    /// Option values keyed by option id (e.g. "filter.overdueTasks")
    #[serde(default)]
    pub enabled: BTreeMap<String, bool>,
}

impl FilterConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(FilterError::Io)?;
        let config: FilterConfig =
            serde_json::from_str(&content).map_err(FilterError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(FilterError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(FilterError::Serialization)?;
        fs::write(config_path, content).map_err(FilterError::Io)?;
        Ok(())
    }

    /// Pushes the saved values into the manager's options.
    ///
    /// Ids the manager does not know are left alone.
    pub fn apply_to(&self, manager: &TaskFilterManager) {
        for (id, value) in &self.enabled {
            match manager.option(id) {
                Some(option) => option.set(*value),
                None => debug!(option = %id, "ignoring unknown option in config"),
            }
        }
    }

    /// Snapshot of the manager's current option values.
    pub fn capture(manager: &TaskFilterManager) -> Self {
        let enabled = manager
            .options()
            .into_iter()
            .map(|o| (o.id().to_string(), o.get()))
            .collect();
        Self { enabled }
    }
}
