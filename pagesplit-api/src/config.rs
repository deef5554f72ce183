//! Server configuration from environment variables

use crate::response::ResponseMode;
use pagesplit::{MAX_DOCUMENT_SIZE, SESSION_TTL};
use std::net::SocketAddr;
use std::time::Duration;

pub const ENV_BIND: &str = "PAGESPLIT_BIND";
pub const ENV_PUBLIC_BASE_URL: &str = "PAGESPLIT_PUBLIC_BASE_URL";
pub const ENV_MAX_DOCUMENT_BYTES: &str = "PAGESPLIT_MAX_DOCUMENT_BYTES";
pub const ENV_MAX_BODY_BYTES: &str = "PAGESPLIT_MAX_BODY_BYTES";
pub const ENV_SESSION_TTL_SECS: &str = "PAGESPLIT_SESSION_TTL_SECS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "PAGESPLIT_SWEEP_INTERVAL_SECS";
pub const ENV_DEFAULT_MODE: &str = "PAGESPLIT_DEFAULT_MODE";

/// Transport ceiling for request bodies. Leaves room for a base64-in-JSON
/// encoding of a document at the size limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Prefix for `downloadUrl` values; empty yields relative URLs
    pub public_base_url: String,
    pub max_document_bytes: usize,
    pub max_body_bytes: usize,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    pub default_mode: ResponseMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            public_base_url: String::new(),
            max_document_bytes: MAX_DOCUMENT_SIZE,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            session_ttl: SESSION_TTL,
            sweep_interval: Duration::from_secs(60),
            default_mode: ResponseMode::default(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup. Unset
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = lookup(ENV_BIND) {
            config.bind_addr = parse(ENV_BIND, &value)?;
        }
        if let Some(value) = lookup(ENV_PUBLIC_BASE_URL) {
            config.public_base_url = value.trim().trim_end_matches('/').to_string();
        }
        if let Some(value) = lookup(ENV_MAX_DOCUMENT_BYTES) {
            config.max_document_bytes = parse(ENV_MAX_DOCUMENT_BYTES, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_BODY_BYTES) {
            config.max_body_bytes = parse(ENV_MAX_BODY_BYTES, &value)?;
        }
        if let Some(value) = lookup(ENV_SESSION_TTL_SECS) {
            config.session_ttl = Duration::from_secs(parse(ENV_SESSION_TTL_SECS, &value)?);
        }
        if let Some(value) = lookup(ENV_SWEEP_INTERVAL_SECS) {
            let secs: u64 = parse(ENV_SWEEP_INTERVAL_SECS, &value)?;
            if secs == 0 {
                return Err(ConfigError {
                    var: ENV_SWEEP_INTERVAL_SECS,
                    value,
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(value) = lookup(ENV_DEFAULT_MODE) {
            config.default_mode = parse(ENV_DEFAULT_MODE, &value)?;
        }

        Ok(config)
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.max_document_bytes, 6 * 1024 * 1024);
        assert_eq!(config.session_ttl, Duration::from_secs(600));
        assert_eq!(config.default_mode, ResponseMode::Referenced);
        assert!(config.public_base_url.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_BIND, "127.0.0.1:8080"),
            (ENV_PUBLIC_BASE_URL, "https://split.example.com/"),
            (ENV_SESSION_TTL_SECS, "30"),
            (ENV_DEFAULT_MODE, "inline"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.public_base_url, "https://split.example.com");
        assert_eq!(config.session_ttl, Duration::from_secs(30));
        assert_eq!(config.default_mode, ResponseMode::Inline);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[(ENV_MAX_DOCUMENT_BYTES, "lots")])).unwrap_err();
        assert_eq!(err.var, ENV_MAX_DOCUMENT_BYTES);

        let err = Config::from_lookup(lookup(&[(ENV_DEFAULT_MODE, "zip")])).unwrap_err();
        assert_eq!(err.var, ENV_DEFAULT_MODE);

        let err = Config::from_lookup(lookup(&[(ENV_SWEEP_INTERVAL_SECS, "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }
}
