//! Runtime configuration.
//!
//! One TOML file with `[world]`, `[storage]`, `[dialogue]`, and `[logging]`
//! tables. Every field has a default, so a missing or sparse file still
//! boots the built-in world with local data storage. Values are validated on
//! load; anything structural (an unreadable file, bad TOML) is an error,
//! while merely questionable values are corrected with a warning.
//!
//! ```toml
//! [world]
//! name = "Hollowvale"
//! epoch = "2025-01-01T00:00:00Z"
//! admins = ["fern"]
//!
//! [storage]
//! data_dir = "./data"
//! autosave_seconds = 300
//! ```

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub dialogue: DialogueSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    /// Display name used in prompts and logs.
    pub name: String,
    /// Wall-clock instant world minute zero counts from. Once a world
    /// snapshot exists, its recorded epoch takes precedence.
    pub epoch: DateTime<Utc>,
    /// Directory of TOML world definition files. The built-in world loads
    /// when unset.
    pub world_dir: Option<String>,
    /// Usernames allowed to run admin verbs, matched case-insensitively.
    pub admins: Vec<String>,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            name: "Hollowvale".to_string(),
            epoch: default_epoch(),
            world_dir: None,
            admins: Vec::new(),
        }
    }
}

fn default_epoch() -> DateTime<Utc> {
    // A fixed instant so a bare config always opens on the same calendar day.
    DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory holding the world snapshot and per-player records.
    pub data_dir: String,
    /// Wall seconds between world snapshot writes. Saves piggyback on player
    /// activity; an idle world writes nothing.
    pub autosave_seconds: u64,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            autosave_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueSection {
    /// Bound in milliseconds on each dialogue provider call.
    pub timeout_ms: u64,
    /// How many recent transcript entries a provider is shown.
    pub log_tail: usize,
}

impl Default for DialogueSection {
    fn default() -> Self {
        Self {
            timeout_ms: 1500,
            log_tail: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default log filter when RUST_LOG is unset: trace, debug, info, warn,
    /// or error.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Write a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject structurally unusable values and correct questionable ones.
    fn validate(&mut self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.dialogue.timeout_ms == 0 {
            warn!("dialogue.timeout_ms of 0 would silence every provider; using the default");
            self.dialogue.timeout_ms = DialogueSection::default().timeout_ms;
        }
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                warn!("unknown logging.level '{}'; falling back to info", other);
                self.logging.level = "info".to_string();
            }
        }
        Ok(())
    }
}
