//! TOML configuration for the device connection.

pub mod schema;

pub use schema::{Config, DeviceConfig};

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Overrides `device.password` when set and non-empty.
pub const PASSWORD_ENV: &str = "PLENTICORE_PASSWORD";

impl Config {
    /// Read, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            if !password.is_empty() {
                config.device.password = password;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| anyhow::anyhow!("{e}"))
    }

    pub fn validate(&self) -> Result<()> {
        let device = &self.device;
        if device.host.trim().is_empty() {
            bail!("device.host must not be empty");
        }
        if device.password.is_empty() {
            bail!("device.password must not be empty (or set {PASSWORD_ENV})");
        }
        if device.request_timeout_secs == 0 {
            bail!("device.request_timeout_secs must be positive");
        }
        if device.refresh_interval_secs == 0 {
            bail!("device.refresh_interval_secs must be positive");
        }
        Ok(())
    }

    /// `<config dir>/plenticore/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "plenticore")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
[device]
host = "192.168.1.50"
password = "secret"
"#;

    #[test]
    fn parse_applies_defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.device.host, "192.168.1.50");
        assert_eq!(config.device.request_timeout_secs, 10);
        assert_eq!(config.device.refresh_interval_secs, 60);
        config.validate().unwrap();
    }

    #[test]
    fn parse_explicit_values() {
        let config = Config::parse(
            r#"
[device]
host = "http://inverter.local:8080/"
password = "secret"
request_timeout_secs = 3
refresh_interval_secs = 15
"#,
        )
        .unwrap();
        assert_eq!(config.device.request_timeout_secs, 3);
        assert_eq!(config.device.refresh_interval_secs, 15);
        assert_eq!(config.device.base_url(), "http://inverter.local:8080");
    }

    #[test]
    fn base_url_adds_scheme() {
        let device = DeviceConfig::new("10.0.0.7", "pw");
        assert_eq!(device.base_url(), "http://10.0.0.7");
        let device = DeviceConfig::new("https://10.0.0.7/", "pw");
        assert_eq!(device.base_url(), "https://10.0.0.7");
    }

    #[test]
    fn missing_device_table_fails() {
        assert!(Config::parse("host = \"x\"").is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.device.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::parse(MINIMAL).unwrap();
        config.device.refresh_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::parse(MINIMAL).unwrap();
        config.device.host = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.device.base_url(), "http://192.168.1.50");
    }

    #[test]
    fn load_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn debug_redacts_password() {
        let config = Config::parse(MINIMAL).unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}
