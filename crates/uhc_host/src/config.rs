//! Configuration for the development host.
//!
//! The file holds the host's own settings next to the full plugin configuration
//! under `[uhc]`. A missing file is created with defaults on first start.

use plugin_uhc::UhcConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

fn default_tick_interval() -> u64 {
    50 // 20 ticks per second
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tick loop settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Players and spawn points seeded into the in-memory world
    #[serde(default)]
    pub sandbox: SandboxSettings,
    /// Plugin configuration
    #[serde(default)]
    pub uhc: UhcConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Milliseconds between two game ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    /// Players connected when the host starts
    pub players: Vec<String>,
    /// Spawn points registered when the host starts, as `[x, z]`
    pub spawns: Vec<[i32; 2]>,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            players: vec!["alice".into(), "bob".into(), "carol".into(), "dave".into()],
            spawns: vec![[300, 300], [-300, 300], [300, -300], [-300, -300]],
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, writing the defaults there if it is missing.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.tick_interval_ms == 0 {
            return Err("server.tick_interval_ms must be at least 1".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        self.uhc.validate().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.tick_interval_ms, 50);
        assert_eq!(config.sandbox.players.len(), config.sandbox.spawns.len());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("uhc.toml");

        let config = AppConfig::load_from_file(&path)
            .await
            .expect("defaults are written");
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        // The written file loads back to the same values.
        let reloaded = AppConfig::load_from_file(&path).await.expect("file parses");
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[server]
tick_interval_ms = 25

[logging]
level = "debug"
json_format = true

[sandbox]
players = ["steve"]
spawns = [[10, -10]]

[uhc.episodes]
length_minutes = 15
sync_timer = false

[uhc.spawns]
seed = 99
"#;

        let temp_file = NamedTempFile::new().expect("temp file");
        tokio::fs::write(temp_file.path(), toml_content)
            .await
            .expect("temp file is writable");

        let config = AppConfig::load_from_file(temp_file.path())
            .await
            .expect("file parses");
        assert_eq!(config.server.tick_interval_ms, 25);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.sandbox.players, vec!["steve".to_string()]);
        assert_eq!(config.sandbox.spawns, vec![[10, -10]]);
        assert_eq!(config.uhc.episodes.length_minutes, 15);
        assert!(!config.uhc.episodes.sync_timer);
        assert_eq!(config.uhc.spawns.seed, Some(99));
        assert_eq!(config.uhc.border.warning_interval_secs, 90);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "warn".to_string();
        config.server.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        config.server.tick_interval_ms = 50;
        config.uhc.episodes.length_minutes = 0;
        let err = config.validate().expect_err("episode length is checked");
        assert!(err.contains("length_minutes"));
    }
}
