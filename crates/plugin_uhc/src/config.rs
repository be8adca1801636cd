//! Typed plugin configuration.
//!
//! Every setting the match logic reads is resolved once into [`UhcConfig`] when the
//! plugin is built. Missing keys fall back to the defaults below, so an empty TOML
//! table is a valid configuration.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Longest accepted interval or delay, in seconds.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Root plugin configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UhcConfig {
    /// Episode timer settings
    pub episodes: EpisodeSettings,
    /// World clock applied when the match starts
    pub daylight_cycle: DaylightCycleSettings,
    /// Staggered team teleportation
    pub slow_start: SlowStartSettings,
    /// Future-border warnings
    pub border: BorderSettings,
    /// Spawn point registration and assignment
    pub spawns: SpawnSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeSettings {
    /// Episode length in minutes
    pub length_minutes: u32,
    /// Derive the countdown from wall-clock time instead of decrementing it
    pub sync_timer: bool,
}

impl Default for EpisodeSettings {
    fn default() -> Self {
        Self {
            length_minutes: 20,
            sync_timer: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaylightCycleSettings {
    /// Keep the day/night cycle running during the match
    pub do_cycle: bool,
    /// Absolute time of day forced at match start
    pub time: i64,
}

impl Default for DaylightCycleSettings {
    fn default() -> Self {
        Self {
            do_cycle: false,
            time: 6000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlowStartSettings {
    /// Seconds between two team teleportations
    pub delay_between_tp_secs: u64,
}

impl Default for SlowStartSettings {
    fn default() -> Self {
        Self {
            delay_between_tp_secs: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderSettings {
    /// Seconds between two warning announcements
    pub warning_interval_secs: u64,
    /// Border centre, X axis
    pub center_x: f64,
    /// Border centre, Z axis
    pub center_z: f64,
}

impl Default for BorderSettings {
    fn default() -> Self {
        Self {
            warning_interval_secs: 90,
            center_x: 0.0,
            center_z: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Blocks above the surface where registered spawns are placed
    pub height_offset: i32,
    /// Fixed seed for team-to-spawn assignment (random when unset)
    pub seed: Option<u64>,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            height_offset: 120,
            seed: None,
        }
    }
}

impl UhcConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: UhcConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.episodes.length_minutes == 0 {
            return Err(ConfigError::Invalid(
                "episodes.length_minutes must be at least 1".to_string(),
            ));
        }

        if !(1..=MAX_INTERVAL_SECS).contains(&self.border.warning_interval_secs) {
            return Err(ConfigError::Invalid(format!(
                "border.warning_interval_secs must be within 1..={MAX_INTERVAL_SECS}, got {}",
                self.border.warning_interval_secs
            )));
        }

        if self.slow_start.delay_between_tp_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "slow_start.delay_between_tp_secs must be at most {MAX_INTERVAL_SECS}, got {}",
                self.slow_start.delay_between_tp_secs
            )));
        }

        if !(0..24000).contains(&self.daylight_cycle.time) {
            return Err(ConfigError::Invalid(format!(
                "daylight_cycle.time must be within 0..24000, got {}",
                self.daylight_cycle.time
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UhcConfig::default();
        assert_eq!(config.episodes.length_minutes, 20);
        assert!(config.episodes.sync_timer);
        assert_eq!(config.daylight_cycle.time, 6000);
        assert!(!config.daylight_cycle.do_cycle);
        assert_eq!(config.slow_start.delay_between_tp_secs, 3);
        assert_eq!(config.border.warning_interval_secs, 90);
        assert_eq!(config.spawns.height_offset, 120);
        assert!(config.spawns.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = UhcConfig::from_toml_str(
            r#"
            [episodes]
            length_minutes = 10
            sync_timer = false

            [border]
            warning_interval_secs = 30
            "#,
        )
        .expect("partial config parses");

        assert_eq!(config.episodes.length_minutes, 10);
        assert!(!config.episodes.sync_timer);
        assert_eq!(config.border.warning_interval_secs, 30);
        assert_eq!(config.border.center_x, 0.0);
        assert_eq!(config.slow_start, SlowStartSettings::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = UhcConfig::default();
        config.episodes.length_minutes = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.episodes.length_minutes = 5;
        config.daylight_cycle.time = 30000;
        assert!(config.validate().is_err());

        config.daylight_cycle.time = 0;
        config.border.warning_interval_secs = u64::MAX / 10;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.border.warning_interval_secs = MAX_INTERVAL_SECS;
        assert!(config.validate().is_ok());

        config.slow_start.delay_between_tp_secs = MAX_INTERVAL_SECS + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.slow_start.delay_between_tp_secs = 0;
        assert!(config.validate().is_ok());

        assert!(matches!(
            UhcConfig::from_toml_str("episodes = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
