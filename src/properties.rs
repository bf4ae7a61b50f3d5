//! # Client Properties
//!
//! Per-client settings keyed by client name, plus one entry (named by
//! `default_config`, `"default"` unless changed) that every client inherits.
//!
//! ```toml
//! [config.default]
//! connect_timeout_ms = 5000
//! logger_level = "basic"
//!
//! [config.billing]
//! read_timeout_ms = 30000
//! logger_level = "full"
//! dismiss_404 = true
//!
//! [config.billing.default_request_headers]
//! X-Tenant = ["acme"]
//! ```
//!
//! Sources are merged by [`PropertiesLoader`] in this order (later sources
//! override earlier):
//! 1. Built-in defaults (`ClientProperties::default()`)
//! 2. A TOML file, when one is configured and exists
//! 3. Environment variables prefixed with `CLIENTS_`, `__` separating keys
//!    (e.g. `CLIENTS_CONFIG__BILLING__READ_TIMEOUT_MS=30000`)

use crate::clients::{LoggerLevel, Options};
use crate::error::PropertiesError;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_NAME: &str = "default";
pub const DEFAULT_ENV_PREFIX: &str = "CLIENTS";

/// Settings for every client, keyed by client name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientProperties {
    /// Name of the entry every client inherits from.
    pub default_config: String,
    pub config: HashMap<String, ClientConfig>,
}

impl Default for ClientProperties {
    fn default() -> Self {
        Self {
            default_config: DEFAULT_CONFIG_NAME.to_string(),
            config: HashMap::new(),
        }
    }
}

impl ClientProperties {
    pub fn with_client(mut self, name: impl Into<String>, config: ClientConfig) -> Self {
        self.config.insert(name.into(), config);
        self
    }

    /// The default entry merged with the entry for `name`. Named fields win.
    pub fn config_for(&self, name: &str) -> ClientConfig {
        let base = self
            .config
            .get(&self.default_config)
            .cloned()
            .unwrap_or_default();
        match self.config.get(name) {
            Some(named) if name != self.default_config => base.merge(named),
            _ => base,
        }
    }

    /// Names of the clients with their own entry, sorted. The default entry is
    /// not a client.
    pub fn client_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .config
            .keys()
            .map(String::as_str)
            .filter(|name| *name != self.default_config)
            .collect();
        names.sort_unstable();
        names
    }

    fn validate(&self) -> Result<(), PropertiesError> {
        for (client, config) in &self.config {
            for (key, value) in [
                ("connect_timeout_ms", config.connect_timeout_ms),
                ("read_timeout_ms", config.read_timeout_ms),
            ] {
                if value == Some(0) {
                    return Err(PropertiesError::Invalid {
                        client: client.clone(),
                        message: format!("{} cannot be 0", key),
                    });
                }
            }
            if client.trim().is_empty() {
                return Err(PropertiesError::Invalid {
                    client: client.clone(),
                    message: "client name cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Settings for one client. Unset fields fall through to the default entry,
/// then to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub logger_level: Option<LoggerLevel>,
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub follow_redirects: Option<bool>,
    pub default_request_headers: BTreeMap<String, Vec<String>>,
    pub default_query_parameters: BTreeMap<String, Vec<String>>,
    pub dismiss_404: Option<bool>,
}

impl ClientConfig {
    /// `self` overlaid with `other`: set fields of `other` win, header and
    /// query maps are merged per key.
    pub fn merge(&self, other: &ClientConfig) -> ClientConfig {
        let mut headers = self.default_request_headers.clone();
        headers.extend(other.default_request_headers.clone());
        let mut queries = self.default_query_parameters.clone();
        queries.extend(other.default_query_parameters.clone());

        ClientConfig {
            logger_level: other.logger_level.or(self.logger_level),
            connect_timeout_ms: other.connect_timeout_ms.or(self.connect_timeout_ms),
            read_timeout_ms: other.read_timeout_ms.or(self.read_timeout_ms),
            follow_redirects: other.follow_redirects.or(self.follow_redirects),
            default_request_headers: headers,
            default_query_parameters: queries,
            dismiss_404: other.dismiss_404.or(self.dismiss_404),
        }
    }

    pub fn options(&self) -> Options {
        let defaults = Options::default();
        Options {
            connect_timeout: self
                .connect_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            read_timeout: self
                .read_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.read_timeout),
            follow_redirects: self.follow_redirects.unwrap_or(defaults.follow_redirects),
        }
    }

    pub fn logger_level(&self) -> LoggerLevel {
        self.logger_level.unwrap_or_default()
    }

    pub fn dismiss_404(&self) -> bool {
        self.dismiss_404.unwrap_or(false)
    }
}

/// Loads [`ClientProperties`] from defaults, a TOML file and the environment.
#[derive(Debug, Clone)]
pub struct PropertiesLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl Default for PropertiesLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertiesLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// The merged sources, before extraction.
    pub fn figment(&self) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(ClientProperties::default()));

        if let Some(path) = &self.config_path {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
                info!(path = %path.display(), "Loaded client properties file");
            } else {
                debug!(path = %path.display(), "Client properties file not found, skipping");
            }
        }

        figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("__"))
    }

    pub fn load(&self) -> Result<ClientProperties, PropertiesError> {
        let properties: ClientProperties = self.figment().extract()?;
        properties.validate()?;
        info!(clients = properties.client_names().len(), "Client properties loaded");
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn billing() -> ClientConfig {
        ClientConfig {
            read_timeout_ms: Some(30_000),
            logger_level: Some(LoggerLevel::Full),
            default_request_headers: BTreeMap::from([(
                "X-Tenant".to_string(),
                vec!["acme".to_string()],
            )]),
            ..Default::default()
        }
    }

    fn shared() -> ClientConfig {
        ClientConfig {
            connect_timeout_ms: Some(5_000),
            logger_level: Some(LoggerLevel::Basic),
            default_request_headers: BTreeMap::from([
                ("X-Tenant".to_string(), vec!["default".to_string()]),
                ("Accept".to_string(), vec!["application/json".to_string()]),
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn test_named_entry_overlays_default() {
        let properties = ClientProperties::default()
            .with_client("default", shared())
            .with_client("billing", billing());

        let config = properties.config_for("billing");
        assert_eq!(config.connect_timeout_ms, Some(5_000));
        assert_eq!(config.read_timeout_ms, Some(30_000));
        assert_eq!(config.logger_level(), LoggerLevel::Full);
        assert_eq!(config.default_request_headers["X-Tenant"], vec!["acme"]);
        assert_eq!(config.default_request_headers["Accept"], vec!["application/json"]);

        let options = config.options();
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
        assert_eq!(options.read_timeout, Duration::from_secs(30));
        assert!(options.follow_redirects);
    }

    #[test]
    fn test_unknown_client_gets_default_entry() {
        let properties = ClientProperties::default().with_client("default", shared());
        assert_eq!(properties.config_for("orders"), shared());
        assert!(properties.client_names().is_empty());
    }

    #[test]
    fn test_default_entry_name_is_configurable() {
        let properties = ClientProperties {
            default_config: "shared".to_string(),
            ..Default::default()
        }
        .with_client("shared", shared())
        .with_client("billing", billing());

        assert_eq!(properties.client_names(), vec!["billing"]);
        assert_eq!(properties.config_for("billing").connect_timeout_ms, Some(5_000));
    }

    #[test]
    fn test_load_from_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "clients.toml",
                r#"
                [config.default]
                connect_timeout_ms = 5000

                [config.billing]
                read_timeout_ms = 30000
                logger_level = "full"
                "#,
            )?;
            jail.set_env("CLIENTS_CONFIG__BILLING__DISMISS_404", "true");

            let properties = PropertiesLoader::new()
                .with_config_path("clients.toml")
                .load()
                .map_err(|e| e.to_string())?;

            let billing = properties.config_for("billing");
            assert_eq!(billing.connect_timeout_ms, Some(5_000));
            assert_eq!(billing.read_timeout_ms, Some(30_000));
            assert_eq!(billing.logger_level(), LoggerLevel::Full);
            assert!(billing.dismiss_404());
            assert_eq!(properties.client_names(), vec!["billing"]);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        figment::Jail::expect_with(|_jail| {
            let properties = PropertiesLoader::new()
                .with_config_path("absent.toml")
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(properties, ClientProperties::default());
            Ok(())
        });
    }

    #[test]
    fn test_zero_timeout_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CLIENTS_CONFIG__BILLING__READ_TIMEOUT_MS", "0");
            let result = PropertiesLoader::new().load();
            assert!(matches!(
                result,
                Err(PropertiesError::Invalid { ref client, .. }) if client == "billing"
            ));
            Ok(())
        });
    }
}
