//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use mlx_types::uuids::DEVICE_NAME_FILTER;

/// Default scan timeout in seconds.
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 10;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Advertised sensor name to connect to
    #[serde(default)]
    pub device_name: Option<String>,

    /// Scan timeout in seconds
    #[serde(default)]
    pub scan_timeout: Option<u64>,

    /// Directory for exported CSV files
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mlx-monitor")
            .join("config.toml")
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`; unreadable or invalid files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => warn!("Failed to parse config {}: {}", path.display(), e),
            },
            Err(e) => warn!("Failed to read config {}: {}", path.display(), e),
        }
        Self::default()
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// A config with every default written out, for `config init`.
    pub fn template() -> Self {
        Self {
            device_name: Some(DEVICE_NAME_FILTER.to_string()),
            scan_timeout: Some(DEFAULT_SCAN_TIMEOUT_SECS),
            export_dir: None,
            no_color: false,
        }
    }
}

/// Resolve the sensor name: flag or env var, then config, then `"MLX R"`.
pub fn resolve_device_name(arg: Option<&str>, config: &Config) -> String {
    arg.filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| config.device_name.clone())
        .unwrap_or_else(|| DEVICE_NAME_FILTER.to_string())
}

/// Resolve the scan timeout: flag, then config, then the default.
pub fn resolve_scan_timeout(arg: Option<u64>, config: &Config) -> Duration {
    Duration::from_secs(
        arg.or(config.scan_timeout)
            .unwrap_or(DEFAULT_SCAN_TIMEOUT_SECS),
    )
}

/// Directory exports land in when no explicit path is given.
pub fn resolve_export_dir(config: &Config) -> PathBuf {
    config
        .export_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_device_name_prefers_arg() {
        let config = Config {
            device_name: Some("Bench R".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_device_name(Some("Lab R"), &config), "Lab R");
    }

    #[test]
    fn test_resolve_device_name_falls_back_to_config() {
        let config = Config {
            device_name: Some("Bench R".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_device_name(None, &config), "Bench R");
        assert_eq!(resolve_device_name(Some(""), &config), "Bench R");
    }

    #[test]
    fn test_resolve_device_name_default() {
        assert_eq!(resolve_device_name(None, &Config::default()), "MLX R");
    }

    #[test]
    fn test_resolve_scan_timeout() {
        let config = Config {
            scan_timeout: Some(25),
            ..Default::default()
        };
        assert_eq!(resolve_scan_timeout(Some(3), &config), Duration::from_secs(3));
        assert_eq!(resolve_scan_timeout(None, &config), Duration::from_secs(25));
        assert_eq!(
            resolve_scan_timeout(None, &Config::default()),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_resolve_export_dir() {
        assert_eq!(resolve_export_dir(&Config::default()), PathBuf::from("."));
        let config = Config {
            export_dir: Some(PathBuf::from("/tmp/exports")),
            ..Default::default()
        };
        assert_eq!(resolve_export_dir(&config), PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            device_name: Some("Bench R".to_string()),
            scan_timeout: Some(5),
            export_dir: Some(dir.path().to_path_buf()),
            no_color: true,
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            Config::load_from(&dir.path().join("absent.toml")),
            Config::default()
        );
    }

    #[test]
    fn test_load_invalid_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "scan_timeout = \"soon\"").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_template_serializes_defaults() {
        let toml_str = toml::to_string_pretty(&Config::template()).unwrap();
        assert!(toml_str.contains("device_name = \"MLX R\""));
        assert!(toml_str.contains("scan_timeout = 10"));
        assert!(toml_str.contains("no_color = false"));
    }
}
