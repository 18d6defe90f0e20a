//! Licensegate configuration.

use crate::LicenseGateError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable holding the listen address.
pub const ENV_BIND: &str = "LICENSEGATE_BIND";
/// Environment variable holding the administrative bearer token.
pub const ENV_ADMIN_TOKEN: &str = "LICENSEGATE_ADMIN_TOKEN";
/// Environment variable holding the data directory.
pub const ENV_DATA_DIR: &str = "LICENSEGATE_DATA_DIR";
/// Environment variable holding the directory of served scripts.
pub const ENV_PUBLIC_DIR: &str = "LICENSEGATE_PUBLIC_DIR";

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Namespace under `dirs::data_dir()` when no data directory is given.
pub const DEFAULT_NAMESPACE: &str = "licensegate";

/// Where licenses live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Process memory only.
    Memory,
    /// JSON snapshot in this directory.
    File(PathBuf),
    /// JSON snapshot under `dirs::data_dir()/licensegate`.
    DefaultDataDir,
}

/// Configuration for the licensegate HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: SocketAddr,

    /// Bearer token required on administrative endpoints.
    pub admin_token: String,

    /// License persistence.
    pub storage: StorageConfig,

    /// Directory holding `license-check.js` and `core.js`, if served.
    pub public_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Read configuration from `LICENSEGATE_*` environment variables.
    ///
    /// Missing variables fall back to defaults, except the admin token which
    /// is left empty and rejected by [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, LicenseGateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, test map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LicenseGateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw.parse().map_err(|e| {
            LicenseGateError::ConfigError(format!(
                "{} is not a socket address ({}): {}",
                ENV_BIND, bind_raw, e
            ))
        })?;

        let storage = match lookup(ENV_DATA_DIR) {
            Some(dir) if dir == ":memory:" => StorageConfig::Memory,
            Some(dir) if !dir.is_empty() => StorageConfig::File(PathBuf::from(dir)),
            _ => StorageConfig::DefaultDataDir,
        };

        let config = Self {
            bind,
            admin_token: lookup(ENV_ADMIN_TOKEN).unwrap_or_default(),
            storage,
            public_dir: lookup(ENV_PUBLIC_DIR)
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
        };
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), LicenseGateError> {
        if self.admin_token.trim().is_empty() {
            return Err(LicenseGateError::ConfigError(format!(
                "admin token cannot be empty (set {})",
                ENV_ADMIN_TOKEN
            )));
        }
        if let StorageConfig::File(dir) = &self.storage {
            if dir.as_os_str().is_empty() {
                return Err(LicenseGateError::ConfigError(
                    "data directory cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Configuration for a gate loader embedded in a page or host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Full URL of the verification endpoint.
    pub endpoint: String,

    /// Token shipped with the loader.
    pub token: String,

    /// URL of the script to load once verified.
    pub script_url: String,
}

impl GateConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), LicenseGateError> {
        if !is_http_url(&self.endpoint) {
            return Err(LicenseGateError::ConfigError(format!(
                "endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }
        if self.token.is_empty() {
            return Err(LicenseGateError::ConfigError(
                "token cannot be empty".to_string(),
            ));
        }
        if self.script_url.is_empty() {
            return Err(LicenseGateError::ConfigError(
                "script_url cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.storage, StorageConfig::DefaultDataDir);
        assert!(config.public_dir.is_none());
        assert!(matches!(
            config.validate(),
            Err(LicenseGateError::ConfigError(_))
        ));
    }

    #[test]
    fn test_full_lookup() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (ENV_BIND, "127.0.0.1:8080"),
            (ENV_ADMIN_TOKEN, "secret"),
            (ENV_DATA_DIR, "/var/lib/licensegate"),
            (ENV_PUBLIC_DIR, "/srv/public"),
        ]))
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.admin_token, "secret");
        assert_eq!(
            config.storage,
            StorageConfig::File(PathBuf::from("/var/lib/licensegate"))
        );
        assert_eq!(config.public_dir, Some(PathBuf::from("/srv/public")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_storage() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[(ENV_DATA_DIR, ":memory:")])).unwrap();
        assert_eq!(config.storage, StorageConfig::Memory);
    }

    #[test]
    fn test_bad_bind_address() {
        let result = ServerConfig::from_lookup(lookup_from(&[(ENV_BIND, "not-an-addr")]));
        assert!(matches!(result, Err(LicenseGateError::ConfigError(_))));
    }

    #[test]
    fn test_gate_config_validation() {
        let config = GateConfig {
            endpoint: "https://licenses.example.com/public/licenses/check-license".to_string(),
            token: "T1".to_string(),
            script_url: "https://licenses.example.com/core.js".to_string(),
        };
        assert!(config.validate().is_ok());

        let bad_endpoint = GateConfig {
            endpoint: "ftp://nope".to_string(),
            ..config.clone()
        };
        assert!(bad_endpoint.validate().is_err());

        let no_token = GateConfig {
            token: String::new(),
            ..config
        };
        assert!(no_token.validate().is_err());
    }
}
