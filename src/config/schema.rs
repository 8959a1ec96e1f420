use serde::{Deserialize, Serialize};

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_refresh_interval_secs() -> u64 {
    60
}

/// Top-level `config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub device: DeviceConfig,
}

/// Connection settings for one inverter.
#[derive(Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Host name or address, or a full base URL (`http://host:port`).
    pub host: String,
    /// Device password; the account name is fixed.
    pub password: String,
    /// Upper bound for each HTTP call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Delay between reads in `watch` mode.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl DeviceConfig {
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            password: password.into(),
            request_timeout_secs: default_request_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }

    /// Device root URL without a trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        }
    }
}

impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("host", &self.host)
            .field("password", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .finish()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config").field("device", &self.device).finish()
    }
}
