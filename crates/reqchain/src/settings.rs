//! Client configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::response::Result;

/// Settings used to build the default [`HttpClient`](crate::HttpClient)
///
/// Durations are expressed in whole seconds so the struct can be layered from
/// a TOML file with [`ClientConfig::from_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Overall request timeout
    pub timeout_secs: u64,
    /// TCP connect timeout
    pub connect_timeout_secs: u64,
    /// TCP keep-alive interval
    pub tcp_keepalive_secs: u64,
    /// How long an idle pooled connection is kept
    pub pool_idle_timeout_secs: u64,
    /// Maximum idle connections kept per host
    pub pool_max_idle_per_host: usize,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
    /// Proxy URL applied to every scheme
    pub proxy: Option<String>,
    /// Keep a cookie jar across calls made with the same client
    pub cookie_store: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 30,
            tcp_keepalive_secs: 30,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 100,
            accept_invalid_certs: false,
            proxy: None,
            cookie_store: true,
        }
    }
}

impl ClientConfig {
    /// Load settings from a file, falling back to defaults for missing keys
    ///
    /// The format is derived from the file extension (`.toml`, `.json`, ...).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Config::builder()
            .add_source(Config::try_from(&Self::default()).map_err(config_error)?)
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(config_error)?;

        settings.try_deserialize().map_err(config_error)
    }

    /// Overall request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// TCP connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// TCP keep-alive interval
    pub fn tcp_keepalive(&self) -> Duration {
        Duration::from_secs(self.tcp_keepalive_secs)
    }

    /// Idle pooled connection lifetime
    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

fn config_error(err: config::ConfigError) -> HttpError {
    HttpError::Build(format!("Invalid client config: {err}"))
}
