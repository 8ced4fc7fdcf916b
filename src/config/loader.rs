//! Configuration Loader
//!
//! Layers compiled-in defaults, an optional configuration file and environment overrides,
//! then validates the merged result.

use super::error::ConfigResult;
use super::CloudburstConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable prefix for overrides, e.g. `CLOUDBURST__SERVICE__PORT=8080`
pub const ENV_PREFIX: &str = "CLOUDBURST";

/// Nesting separator for environment overrides
pub const ENV_SEPARATOR: &str = "__";

/// Default configuration file stem, resolved as `config/cloudburst.{toml,yaml,json}`
pub const DEFAULT_CONFIG_FILE: &str = "config/cloudburst";

/// Loaded, validated configuration
#[derive(Debug)]
pub struct ConfigManager {
    config: CloudburstConfig,
    source_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from the default file location and the process environment
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_layers(Path::new(DEFAULT_CONFIG_FILE), None)
    }

    /// Load configuration from an explicit file (stem or full path) plus the process environment
    pub fn load_from_path(path: impl AsRef<Path>) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_layers(path.as_ref(), None)
    }

    /// Load with an explicit environment map instead of the process environment.
    /// Useful for tests that must not touch global environment variables.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: HashMap<String, String>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_layers(path.as_ref(), Some(env))
    }

    fn load_layers(
        path: &Path,
        env: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        debug!(path = %path.display(), "Loading cloudburst configuration");

        let defaults = config::Config::try_from(&CloudburstConfig::default())?;
        let file_path = path.to_string_lossy().to_string();

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env);

        let merged = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(&file_path).required(false))
            .add_source(environment)
            .build()?;

        let config: CloudburstConfig = merged.try_deserialize()?;
        config.validate()?;

        let source_file = Self::resolve_existing_file(path);
        info!(
            region = %config.provisioning.region,
            profile_priority = config.provisioning.profile_priority,
            max_workers = config.distribution.max_workers,
            source_file = ?source_file,
            "⚙️ CONFIG: Configuration loaded successfully"
        );
        debug!(
            "Configuration: {}",
            serde_json::to_string(&Self::sanitize_for_logging(&config))
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );

        Ok(Arc::new(ConfigManager {
            config,
            source_file,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &CloudburstConfig {
        &self.config
    }

    /// File the configuration was read from, if one existed
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// JSON view of the configuration with secrets masked
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_for_logging(&self.config)
    }

    fn sanitize_for_logging(config: &CloudburstConfig) -> serde_json::Value {
        let mut value = serde_json::to_value(config).unwrap_or(serde_json::Value::Null);
        if let Some(key) = value
            .get_mut("service")
            .and_then(|service| service.get_mut("auth_key"))
        {
            if !key.is_null() {
                *key = serde_json::Value::String("***".to_string());
            }
        }
        value
    }

    fn resolve_existing_file(path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        ["toml", "yaml", "yml", "json"]
            .iter()
            .map(|ext| path.with_extension(ext))
            .find(|candidate| candidate.is_file())
    }
}
