use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use toolreg::tools::DispatchPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub log_level: Option<String>,
    pub endpoint: EndpointConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EndpointConfig {
    pub server_url: String,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub enforce_schema: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            timeout_ms: 30000,
            max_attempts: 3,
            retry_backoff_ms: 250,
            enforce_schema: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    pub tools_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tools_file: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("toolreg")
                .join("tools.jsonl"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            endpoint: EndpointConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.server_url.trim().is_empty() {
            bail!("endpoint.server-url must not be empty");
        }
        if self.endpoint.timeout_ms == 0 {
            bail!("endpoint.timeout-ms must be greater than zero");
        }
        if self.endpoint.max_attempts == 0 {
            bail!("endpoint.max-attempts must be at least 1");
        }
        Ok(())
    }

    /// Dispatcher settings derived from the endpoint section
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            timeout: Duration::from_millis(self.endpoint.timeout_ms),
            max_attempts: self.endpoint.max_attempts,
            retry_backoff: Duration::from_millis(self.endpoint.retry_backoff_ms),
            enforce_schema: self.endpoint.enforce_schema,
        }
    }
}
