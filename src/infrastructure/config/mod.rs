use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::error::{AppError, Result};
use crate::domain::municipio::ImportConfig;

pub const DEFAULT_CONFIG_FILE: &str = "fiscalbook.toml";
pub const ENV_PREFIX: &str = "FISCALBOOK_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://fiscalbook.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

/// Layered application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub import: ImportConfig,
}

impl AppConfig {
    /// Defaults, then the TOML file (if present), then `FISCALBOOK_*` env vars.
    ///
    /// Nested keys use a double underscore: `FISCALBOOK_HTTP__PORT=8080`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if path.is_some() && !file.exists() {
            return Err(AppError::ConfigError(format!(
                "Config file not found: {}",
                file.display()
            )));
        }

        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::ConfigError("database.url is empty".to_string()));
        }
        if self.http.port == 0 {
            return Err(AppError::ConfigError("http.port must be non-zero".to_string()));
        }
        self.import
            .validate()
            .map_err(|e| AppError::ConfigError(format!("import: {}", e)))
    }
}
