use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    pub query: QueryConfig,
    pub history: HistoryConfig,
}

/// Query-string write batching configuration
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QueryConfig {
    /// Debounce window for coalescing URL writes (in milliseconds)
    pub debounce_ms: u64,
}

/// Navigation history configuration
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HistoryConfig {
    /// Maximum number of retained history entries
    pub max_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            query: QueryConfig { debounce_ms: 10 },
            history: HistoryConfig { max_entries: 100 },
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Option<PathBuf> {
        // Use directories crate to find config directory
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "boardstate") {
            let config_dir = proj_dirs.config_dir();
            return Some(config_dir.join("config.toml"));
        }
        None
    }

    /// Load configuration from file, or return defaults if file doesn't exist
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<Config>(&contents) {
                        Ok(config) => return config,
                        Err(e) => {
                            warn!("failed to parse config file, using defaults: {}", e);
                        }
                    },
                    Err(e) => {
                        warn!("failed to read config file, using defaults: {}", e);
                    }
                }
            }
        }
        Config::default()
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(path) = Self::config_path() {
            // Create config directory if it doesn't exist
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }

            let contents = toml::to_string_pretty(self)?;
            fs::write(&path, contents)?;
            return Ok(());
        }

        Err("Could not determine config directory".into())
    }

    /// Create a default config file if it doesn't exist
    pub fn create_default() -> Result<(), Box<dyn std::error::Error>> {
        if let Some(path) = Self::config_path() {
            if !path.exists() {
                let config = Config::default();
                config.save()?;
            }
        }
        Ok(())
    }
}
