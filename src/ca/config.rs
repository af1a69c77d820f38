use std::time::Duration;

use log::warn;

pub const DEFAULT_CA_ADDRESS: &str = "localhost";
pub const DEFAULT_CA_PORT: u16 = 8888;
pub const NEWCERT_PATH: &str = "/api/v1/cfssl/newcert";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

const CA_ADDRESS_ENV: &str = "CFSSL_CA_ADDRESS";
const TIMEOUT_ENV: &str = "CFSSL_HTTP_TIMEOUT_SECS";

/// Where and how the CA issuance endpoint is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for CaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CA_ADDRESS)
    }
}

impl CaConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_CA_PORT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("cfssl-newcert/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `CFSSL_CA_ADDRESS` and `CFSSL_HTTP_TIMEOUT_SECS`, falling back
    /// to defaults for unset or unusable values.
    pub fn from_env() -> Self {
        let host = resolve_host(std::env::var(CA_ADDRESS_ENV).ok());
        let timeout = resolve_timeout(std::env::var(TIMEOUT_ENV).ok());
        Self::new(host).with_timeout(timeout)
    }

    pub fn endpoint_url(&self) -> String {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("http://{}:{}{}", host, self.port, NEWCERT_PATH)
    }
}

fn resolve_host(raw: Option<String>) -> String {
    match raw {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        Some(_) => {
            warn!("[ca] {CA_ADDRESS_ENV} is blank; using {DEFAULT_CA_ADDRESS}");
            DEFAULT_CA_ADDRESS.to_string()
        }
        None => DEFAULT_CA_ADDRESS.to_string(),
    }
}

fn resolve_timeout(raw: Option<String>) -> Duration {
    let Some(raw) = raw else {
        return Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!("[ca] invalid {TIMEOUT_ENV} value {raw:?}; using default");
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        }
    }
}
