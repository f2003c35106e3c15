//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::{AsRefStr, EnumString};
use tracing::{debug, info, instrument, warn};

/// Environment variable overriding the bind host.
pub const HOST_ENV: &str = "TICTACTOE_HOST";
/// Environment variable overriding the bind port.
pub const PORT_ENV: &str = "TICTACTOE_PORT";
/// Environment variable overriding the SQLite path.
pub const DATABASE_ENV: &str = "DATABASE_URL";

/// Where game records live.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    EnumString,
    AsRefStr,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StorageKind {
    /// In-process map, lost on exit.
    Memory,
    /// SQLite file via diesel.
    #[default]
    Sqlite,
}

/// Configuration for the game server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Storage backend.
    #[serde(default)]
    storage: StorageKind,

    /// SQLite database file, used when `storage` is `sqlite`.
    #[serde(default = "default_database_path")]
    database_path: String,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    3000
}

/// Default SQLite database file.
#[instrument]
pub fn default_database_path() -> String {
    "tictactoe.db".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            storage: StorageKind::default(),
            database_path: default_database_path(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, storage = %config.storage, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed TOML or unknown values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an unusable value.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the port does not parse.
    #[instrument(skip(self, lookup))]
    pub fn with_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup(HOST_ENV) {
            debug!(host = %host, "Host overridden from environment");
            self.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid {}='{}': {}", PORT_ENV, port, e)))?;
            debug!(port = self.port, "Port overridden from environment");
        }
        if let Some(path) = lookup(DATABASE_ENV) {
            if path.trim().is_empty() {
                warn!("{} is set but empty, ignoring", DATABASE_ENV);
            } else {
                self.database_path = path;
            }
        }
        Ok(self)
    }

    /// Applies command-line overrides; `None` keeps the current value.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        storage: Option<StorageKind>,
        database_path: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(storage) = storage {
            self.storage = storage;
        }
        if let Some(path) = database_path {
            self.database_path = path;
        }
        self
    }

    /// Socket address string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_partial_toml() {
        let config = ServerConfig::from_toml("port = 8080\nstorage = \"memory\"\n").unwrap();
        assert_eq!(*config.port(), 8080);
        assert_eq!(*config.storage(), StorageKind::Memory);
        assert_eq!(config.host(), "127.0.0.1");
    }

    #[test]
    fn test_unknown_storage_rejected() {
        assert!(ServerConfig::from_toml("storage = \"postgres\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = \"0.0.0.0\"\ndatabase_path = \"games.db\"").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.database_path(), "games.db");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (HOST_ENV, "0.0.0.0"),
            (PORT_ENV, "9000"),
            (DATABASE_ENV, "/tmp/ttt.db"),
        ]);
        let config = ServerConfig::default()
            .with_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.database_path(), "/tmp/ttt.db");
    }

    #[test]
    fn test_bad_port_env() {
        let result = ServerConfig::default().with_env_from(|key| {
            (key == PORT_ENV).then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = ServerConfig::default().with_overrides(
            None,
            Some(4000),
            Some(StorageKind::Memory),
            None,
        );
        assert_eq!(*config.port(), 4000);
        assert_eq!(*config.storage(), StorageKind::Memory);
        assert_eq!(config.database_path(), "tictactoe.db");
    }
}
