// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! # Runtime Configuration
//!
//! Configuration is loaded from a JSON file at startup. The file path comes
//! from `BUDGETING_CONFIG`, defaulting to `configs/config.json`.
//!
//! ## File fields
//!
//! | Field | Description | Default |
//! |-------|-------------|---------|
//! | `env` | Environment name | `""` |
//! | `secrets_url` | Secrets-service base URL | Required |
//! | `tracking_dsn` | Error-tracking sink endpoint | disabled |
//! | `tracking_env` | Environment tag on tracked events | `""` |
//! | `tracking_only_crashes` | Forward only panics to the sink | `false` |
//! | `port` | Listen port | `8080` when 0/absent |
//! | `log_path` | Log file path | stdout only |
//! | `debug` | Verbose logging and statement logging | `false` |
//! | `mailer.url` | Mailer service base URL | optional |
//! | `backend.url` | Backend (token check, balance) base URL | Required |
//! | `core.url` | Core identity service base URL | Required |
//!
//! The database connection string is deliberately absent from the file: it is
//! fetched at startup from the secrets service under [`DB_SECRET_NAME`].

use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable naming the config file path.
pub const CONFIG_PATH_ENV: &str = "BUDGETING_CONFIG";

/// Default config file path relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.json";

/// Fixed secret name under which the secrets service stores the DB URL.
pub const DB_SECRET_NAME: &str = "DB-BACKEND-URL";

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open config file {path}: {source}")]
    Open { path: String, source: io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Nested base-URL block for an upstream collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub env: String,
    pub secrets_url: String,
    #[serde(default)]
    pub tracking_dsn: String,
    #[serde(default)]
    pub tracking_env: String,
    #[serde(default)]
    pub tracking_only_crashes: bool,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub log_path: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub mailer: Option<UrlConfig>,
    pub backend: UrlConfig,
    pub core: UrlConfig,
    /// Fetched from the secrets service at startup, never from the file.
    #[serde(skip)]
    pub db_url: String,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_reader(file).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Listen port, applying the default when unset.
    pub fn listen_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_PORT
        } else {
            self.port
        }
    }

    /// Log file path, when configured.
    pub fn log_path(&self) -> Option<&Path> {
        if self.log_path.is_empty() {
            None
        } else {
            Some(Path::new(&self.log_path))
        }
    }
}

/// Resolve the config file path from the environment.
pub fn config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "env": "production",
        "secrets_url": "http://secrets.internal",
        "tracking_dsn": "http://tracking.internal/store",
        "tracking_env": "production",
        "port": 9090,
        "log_path": "logs/api.log",
        "debug": true,
        "mailer": {"url": "http://mailer.internal"},
        "backend": {"url": "http://backend.internal"},
        "core": {"url": "http://core.internal"}
    }"#;

    #[test]
    fn parses_full_fixture() {
        let config: Config = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(config.env, "production");
        assert_eq!(config.listen_port(), 9090);
        assert_eq!(config.log_path().unwrap(), Path::new("logs/api.log"));
        assert!(config.debug);
        assert_eq!(config.backend.url, "http://backend.internal");
        assert_eq!(config.core.url, "http://core.internal");
        assert_eq!(config.mailer.unwrap().url, "http://mailer.internal");
        assert!(config.db_url.is_empty());
    }

    #[test]
    fn missing_port_and_log_path_use_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"secrets_url": "u", "backend": {"url": "b"}, "core": {"url": "c"}}"#,
        )
        .unwrap();
        assert_eq!(config.listen_port(), 8080);
        assert!(config.log_path().is_none());
        assert!(!config.tracking_only_crashes);
        assert!(config.tracking_dsn.is_empty());
    }

    #[test]
    fn zero_port_maps_to_default() {
        let config: Config = serde_json::from_str(
            r#"{"secrets_url": "u", "port": 0, "backend": {"url": "b"}, "core": {"url": "c"}}"#,
        )
        .unwrap();
        assert_eq!(config.listen_port(), 8080);
    }

    #[test]
    fn load_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.secrets_url, "http://secrets.internal");
    }

    #[test]
    fn load_surfaces_open_errors() {
        let missing = Config::load(Path::new("/nonexistent/config.json"));
        assert!(matches!(missing, Err(ConfigError::Open { .. })));
    }
}
