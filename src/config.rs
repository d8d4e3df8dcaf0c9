use crate::storage::FileStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// Refresh step applied when nothing persisted carries one. 0 disables it.
    pub default_step_ms: u64,
    /// Used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Overrides `~/.spanpick/store.json`.
    pub store_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_step_ms: 0,
            log_level: "warn".to_string(),
            store_file: None,
        }
    }
}

impl Config {
    pub fn open_store(&self) -> Result<FileStore> {
        match &self.store_file {
            Some(path) => Ok(FileStore::from_path(path.clone())),
            None => Ok(FileStore::new()?),
        }
    }
}

pub fn load_config() -> Result<Config> {
    let path = FileStore::get_base_dir()?.join("config.json");
    load_config_from(path)
}

pub fn load_config_from(path: PathBuf) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        let data = serde_json::to_string_pretty(&config)?;
        fs::write(&path, data)?;
        return Ok(config);
    }

    let data = fs::read_to_string(&path)?;
    let config = serde_json::from_str(&data)?;
    Ok(config)
}
