//! navflow configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::host::DEFAULT_MAX_DISPATCHES;

/// Main navflow configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Navigation defaults
    pub navigation: NavigationConfig,

    /// Scenario simulator settings
    pub simulator: SimulatorConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Follows the same fallback chain as [`Config::load`] but never fails.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let paths = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::candidates(),
        };

        paths
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|config| config.log_level)
    }

    // Project-local .navflow.yml, then ~/.config/navflow/navflow.yml
    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".navflow.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("navflow").join("navflow.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Navigation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Animate commands that do not say otherwise
    pub animated: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self { animated: true }
    }
}

/// Scenario simulator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Maximum host reports delivered by one pump
    #[serde(rename = "max-dispatches")]
    pub max_dispatches: usize,

    /// Deliver queued host reports after every step
    #[serde(rename = "pump-after-each-step")]
    pub pump_after_each_step: bool,

    /// Stop a run at the first failed expectation
    #[serde(rename = "stop-on-failure")]
    pub stop_on_failure: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_dispatches: DEFAULT_MAX_DISPATCHES,
            pump_after_each_step: true,
            stop_on_failure: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.log_level.is_none());
        assert!(config.navigation.animated);
        assert_eq!(config.simulator.max_dispatches, DEFAULT_MAX_DISPATCHES);
        assert!(config.simulator.pump_after_each_step);
        assert!(!config.simulator.stop_on_failure);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

navigation:
  animated: false

simulator:
  max-dispatches: 50
  pump-after-each-step: false
  stop-on-failure: true
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(!config.navigation.animated);
        assert_eq!(config.simulator.max_dispatches, 50);
        assert!(!config.simulator.pump_after_each_step);
        assert!(config.simulator.stop_on_failure);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
simulator:
  stop-on-failure: true
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert!(config.simulator.stop_on_failure);

        // Defaults for unspecified
        assert!(config.simulator.pump_after_each_step);
        assert!(config.navigation.animated);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log-level: warn\nnavigation:\n  animated: false").unwrap();
        let path = file.path().to_path_buf();

        let config = Config::load(Some(&path)).unwrap();
        assert!(!config.navigation.animated);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let path = PathBuf::from("/nonexistent/navflow.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }
}
