use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Sent verbatim as the Cookie header of the upload request
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// Upload timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_capture_ready_delay")]
    pub capture_ready_delay_ms: u64,

    #[serde(default = "default_reset_delay")]
    pub reset_delay_ms: u64,

    /// Global keyboard shortcut acting as the action control, e.g. "SUPER+ALT+D"
    #[serde(default)]
    pub action_shortcut: Option<String>,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_upload_path() -> String {
    "/upload_files".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_capture_ready_delay() -> u64 {
    500
}

fn default_reset_delay() -> u64 {
    1000
}

/// Rates the Opus encoder accepts
const OPUS_SAMPLE_RATES: [u32; 5] = [8000, 12000, 16000, 24000, 48000];

fn default_sample_rate() -> u32 {
    16000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            upload_path: default_upload_path(),
            session_cookie: None,
            timeout: default_timeout(),
            capture_ready_delay_ms: default_capture_ready_delay(),
            reset_delay_ms: default_reset_delay(),
            action_shortcut: None,
            sample_rate: default_sample_rate(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/envisonet/config.json)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `config_path`, writing defaults there if it is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("envisonet").join("config.json"))
    }

    /// Full URL the recordings are posted to
    pub fn upload_url(&self) -> Result<Url> {
        let base = Url::parse(&self.server_url)
            .with_context(|| format!("Invalid server_url: {}", self.server_url))?;
        base.join(&self.upload_path)
            .with_context(|| format!("Invalid upload_path: {}", self.upload_path))
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn capture_ready_delay(&self) -> Duration {
        Duration::from_millis(self.capture_ready_delay_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(anyhow::anyhow!("server_url cannot be empty"));
        }

        let upload_url = self.upload_url()?;
        if !matches!(upload_url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!(
                "server_url must use http or https, got {}",
                upload_url.scheme()
            ));
        }

        if self.timeout == 0 {
            return Err(anyhow::anyhow!("timeout must be at least one second"));
        }

        if !OPUS_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(anyhow::anyhow!(
                "sample_rate must be one of {:?}, got {}",
                OPUS_SAMPLE_RATES,
                self.sample_rate
            ));
        }

        if let Some(shortcut) = &self.action_shortcut {
            crate::shortcuts::parse_shortcut(shortcut)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envisonet").join("config.json");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.server_url, "http://localhost:5000");
        assert_eq!(config.capture_ready_delay(), Duration::from_millis(500));
        assert_eq!(config.reset_delay(), Duration::from_secs(1));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "server_url": "https://envisonet.example", "session_cookie": "session=abc" }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.session_cookie.as_deref(), Some("session=abc"));
        assert_eq!(config.upload_path, "/upload_files");
        assert_eq!(
            config.upload_url().unwrap().as_str(),
            "https://envisonet.example/upload_files"
        );
        config.validate().unwrap();
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = Config {
            server_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            server_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            timeout: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            sample_rate: 44100,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            action_shortcut: Some("SUPER+NOPE".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
