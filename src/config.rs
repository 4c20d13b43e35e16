//! Environment configuration.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::error::{ConfigError, ConfigResult};

const DEFAULT_PORT: u16 = 5020;
const DEFAULT_BODY_LIMIT_MB: usize = 5;
const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    /// IP address or hostname; hostnames are resolved at startup
    pub host: String,
    pub port: u16,
    /// Max size of an uploaded image
    pub body_limit_bytes: usize,
    pub predictor: PredictorConfig,
}

/// Where and how to reach the remote classifier.
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Base URL; `/predict` is appended
    pub endpoint: String,
    /// `None` waits for the endpoint indefinitely
    pub timeout: Option<Duration>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

impl PredictorConfig {
    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.endpoint.trim_end_matches('/'))
    }
}

impl Config {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_var(&lookup, "PORT", "port number", DEFAULT_PORT)?;
        let body_limit_mb = parse_var(
            &lookup,
            "BODY_LIMIT_MB",
            "integer",
            DEFAULT_BODY_LIMIT_MB,
        )?;

        let body_limit_bytes = body_limit_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            ConfigError::InvalidValue {
                name: "BODY_LIMIT_MB",
                expected: "size in megabytes",
                value: body_limit_mb.to_string(),
            }
        })?;

        let endpoint = lookup("PREDICT_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.into());
        Url::parse(&endpoint).map_err(|e| ConfigError::InvalidEndpoint(e.to_string()))?;

        let timeout = match lookup("PREDICT_TIMEOUT_SECS") {
            Some(value) => Some(Duration::from_secs(value.parse().map_err(|_| {
                ConfigError::InvalidValue {
                    name: "PREDICT_TIMEOUT_SECS",
                    expected: "number of seconds",
                    value,
                }
            })?)),
            None => None,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            body_limit_bytes,
            predictor: PredictorConfig { endpoint, timeout },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolves `host:port` to the first address the resolver returns.
    pub async fn resolve_bind_addr(&self) -> ConfigResult<SocketAddr> {
        let addr = self.bind_addr();
        let first = tokio::net::lookup_host(addr.as_str())
            .await
            .map_err(|e| ConfigError::UnresolvableHost(format!("{}: {}", addr, e)))?
            .next();
        first.ok_or_else(|| ConfigError::UnresolvableHost(addr))
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, expected: &'static str, default: T) -> ConfigResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            name,
            expected,
            value,
        }),
        None => Ok(default),
    }
}
