//! Server configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/availcal/config.toml` by default:
//!
//! ```toml
//! expose_error_details = false
//!
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [fetch]
//! timeout_secs = 10
//!
//! [[sources]]
//! name = "Booking.com"
//! url = "env::BOOKING_ICAL_URL"
//!
//! [[sources]]
//! name = "Airbnb"
//! url = "https://www.airbnb.com/calendar/ical/1234.ics?s=..."
//! ```
//!
//! Feed URLs embed access tokens, so `url` also accepts an `env::VAR_NAME`
//! reference that is resolved from the environment at startup.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use availcal_core::{CalendarSource, SourceRegistry};
use availcal_feeds::FetchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

const ENV_PREFIX: &str = "env::";

/// Configuration for the availcal server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Include the underlying cause in API error responses.
    pub expose_error_details: bool,

    pub server: ServerSettings,

    pub fetch: FetchSettings,

    /// Calendar feeds to aggregate.
    pub sources: Vec<SourceSettings>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
        }
    }
}

/// Outbound request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Per-source request timeout in seconds.
    pub timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Overrides the default browser user agent.
    pub user_agent: Option<String>,

    /// Empty string disables the header.
    pub accept_language: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: FetchConfig::DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: FetchConfig::DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: None,
            accept_language: None,
        }
    }
}

/// One `[[sources]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSettings {
    pub name: String,
    /// Feed URL, or an `env::VAR_NAME` reference.
    pub url: String,
}

impl AppConfig {
    /// Loads configuration from the default path, falling back to defaults
    /// if the file does not exist.
    pub fn load() -> ServerResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ServerError::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but cannot work.
    pub fn validate(&self) -> ServerResult<()> {
        if self.fetch.timeout_secs == 0 {
            return Err(ServerError::config("fetch.timeout_secs must be greater than 0"));
        }
        if self.fetch.connect_timeout_secs == 0 {
            return Err(ServerError::config(
                "fetch.connect_timeout_secs must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("availcal")
            .join("config.toml")
    }

    /// Builds the source registry, resolving `env::` references.
    ///
    /// # Errors
    ///
    /// Fails on an unset environment variable, an invalid URL or a
    /// duplicate source name.
    pub fn registry(&self) -> ServerResult<SourceRegistry> {
        let sources = self
            .sources
            .iter()
            .map(|entry| -> ServerResult<CalendarSource> {
                let url = resolve_reference(&entry.url)?;
                Ok(CalendarSource::parse(entry.name.as_str(), &url)?)
            })
            .collect::<ServerResult<Vec<_>>>()?;

        Ok(SourceRegistry::new(sources)?)
    }

    /// Converts the `[fetch]` section into a fetcher configuration.
    ///
    /// # Errors
    ///
    /// Fails if [`AppConfig::validate`] does.
    pub fn fetch_config(&self) -> ServerResult<FetchConfig> {
        self.validate()?;
        let mut config = FetchConfig::new()
            .with_timeout(Duration::from_secs(self.fetch.timeout_secs))
            .with_connect_timeout(Duration::from_secs(self.fetch.connect_timeout_secs));

        if let Some(ref user_agent) = self.fetch.user_agent {
            config = config.with_user_agent(user_agent.as_str());
        }
        if let Some(ref language) = self.fetch.accept_language {
            let language = Some(language.trim()).filter(|l| !l.is_empty());
            config = config.with_accept_language(language.map(str::to_string));
        }
        Ok(config)
    }
}

impl AppConfig {
    /// Returns a copy that is safe to print: literal feed URLs lose their
    /// query string and credentials. `env::` references are kept.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for entry in &mut config.sources {
            if entry.url.starts_with(ENV_PREFIX) {
                continue;
            }
            entry.url = match CalendarSource::parse(entry.name.as_str(), &entry.url) {
                Ok(source) => source.redacted_endpoint(),
                Err(_) => "<invalid url>".to_string(),
            };
        }
        config
    }
}

/// Expands an `env::VAR_NAME` reference. Other values are returned as-is.
fn resolve_reference(value: &str) -> ServerResult<String> {
    match value.strip_prefix(ENV_PREFIX) {
        Some(var) => std::env::var(var).map_err(|_| {
            ServerError::config(format!("environment variable {} is not set", var))
        }),
        None => Ok(value.to_string()),
    }
}
