//! Server configuration.
//!
//! Provides the listen address and mail settings. Configuration can be loaded
//! from and saved to a TOML file. Mail credentials are never stored here; they
//! come from the `EMAIL_USER` and `EMAIL_PASS` environment variables.

use folio_common::{ConfigError, FolioResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "folio.toml";

/// Environment variable that overrides the config path.
pub const CONFIG_ENV: &str = "FOLIO_CONFIG";

/// Server configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    // === Listener ===
    /// Address to bind
    pub bind_address: String,
    /// Port to bind
    pub port: u16,

    // === Contact Relay ===
    /// Where contact submissions are delivered
    pub recipient: String,
    /// Name used in the auto-reply subject and signature
    pub owner_name: String,
    /// From address (None = `EMAIL_USER`)
    pub sender: Option<String>,

    // === SMTP ===
    /// SMTP relay host (None = log mails instead of sending)
    pub smtp_relay: Option<String>,
    /// SMTP submission port
    pub smtp_port: u16,
    /// SMTP command timeout in seconds
    pub smtp_timeout_secs: u64,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,

            recipient: "owner@example.com".to_string(),
            owner_name: "the site owner".to_string(),
            sender: None,

            smtp_relay: None,
            smtp_port: 587,
            smtp_timeout_secs: 10,
        }
    }
}

impl FolioConfig {
    /// Load configuration from `FOLIO_CONFIG`, or `folio.toml` in the
    /// working directory. Returns default config if the file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(mut config) => {
                    config.validate();
                    info!("Loaded config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("{e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read config file: {e}");
                Self::default()
            },
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> FolioResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the configuration file path.
    fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from)
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        if self.port == 0 {
            self.port = 5000;
        }
        if self.smtp_port == 0 {
            self.smtp_port = 587;
        }
        self.smtp_timeout_secs = self.smtp_timeout_secs.clamp(1, 120);

        let owner = self.owner_name.trim();
        self.owner_name = if owner.is_empty() {
            Self::default().owner_name
        } else {
            owner.to_string()
        };

        if self.smtp_relay.as_deref().is_some_and(|relay| relay.trim().is_empty()) {
            self.smtp_relay = None;
        }
    }

    /// Socket address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind_address
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                field: "bind_address".to_string(),
                reason: e.to_string(),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// SMTP command timeout.
    #[must_use]
    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_secs)
    }
}
