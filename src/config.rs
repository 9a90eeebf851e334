//! Server configuration
//!
//! Read from the environment at startup:
//!
//! - `HANGAR_HOST` / `HOST` - bind host (default `0.0.0.0`)
//! - `HANGAR_PORT` / `PORT` - bind port (default `8815`)
//! - `HANGAR_ADVERTISE` - comma-separated extra endpoint locations
//! - `HANGAR_BATCH_ROWS` - max rows per streamed batch (default 65536)
//! - `HANGAR_LOG` - log filter when `RUST_LOG` is unset (default `info`)
//! - `HANGAR_LOG_FORMAT` - `pretty` or `json`

use std::env;
use std::net::{SocketAddr, ToSocketAddrs};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::flight::DEFAULT_BATCH_ROWS;
use crate::{Error, Result, DEFAULT_PORT};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Locations advertised after the bind location
    pub advertise: Vec<String>,
    pub max_batch_rows: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            advertise: Vec::new(),
            max_batch_rows: DEFAULT_BATCH_ROWS,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset values take the
    /// defaults; set but invalid values are rejected with [`Error::Config`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let host = lookup("HANGAR_HOST")
            .or_else(|| lookup("HOST"))
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);

        let port = match lookup("HANGAR_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid port: {raw:?}")))?,
            None => defaults.port,
        };

        let advertise = lookup("HANGAR_ADVERTISE")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let max_batch_rows = match lookup("HANGAR_BATCH_ROWS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(rows) if rows > 0 => rows,
                _ => {
                    return Err(Error::Config(format!(
                        "invalid batch size: {raw:?} (expected a positive integer)"
                    )))
                }
            },
            None => defaults.max_batch_rows,
        };

        let log_level = lookup("HANGAR_LOG").unwrap_or(defaults.log_level);

        let log_format = match lookup("HANGAR_LOG_FORMAT").as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(Error::Config(format!(
                    "unknown log format: {other:?} (expected pretty or json)"
                )))
            }
        };

        Ok(Self {
            host,
            port,
            advertise,
            max_batch_rows,
            log_level,
            log_format,
        })
    }

    /// Resolved socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Config(format!("cannot resolve {}:{}", self.host, self.port)))
    }

    /// Flight location of the bind address
    pub fn location(&self) -> String {
        if self.host.contains(':') {
            format!("grpc+tcp://[{}]:{}", self.host, self.port)
        } else {
            format!("grpc+tcp://{}:{}", self.host, self.port)
        }
    }

    /// Every location advertised in endpoints, bind location first
    pub fn locations(&self) -> Vec<String> {
        let mut locations = vec![self.location()];
        for extra in &self.advertise {
            if !locations.contains(extra) {
                locations.push(extra.clone());
            }
        }
        locations
    }

    /// Install the global tracing subscriber.
    ///
    /// Fails if a subscriber is already installed.
    pub fn init_tracing(&self) -> Result<()> {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&self.log_level));

        let registry = tracing_subscriber::registry().with(env_filter);

        match self.log_format {
            LogFormat::Json => {
                registry
                    .with(tracing_subscriber::fmt::layer().json())
                    .try_init()
            }
            LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        }
        .map_err(|e| Error::Config(format!("tracing already initialised: {e}")))
    }
}
