//! Runtime configuration.
//!
//! Configuration is resolved once at startup and then passed by reference
//! into every component call. Sources are layered, later ones win:
//! built-in defaults, an optional YAML file, `SMART_TERMINAL_*` environment
//! variables, then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::platform::{Dialect, Platform};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_MODEL: &str = "llama3.1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const ENV_ENDPOINT: &str = "SMART_TERMINAL_ENDPOINT";
const ENV_MODEL: &str = "SMART_TERMINAL_MODEL";
const ENV_TIMEOUT_MS: &str = "SMART_TERMINAL_TIMEOUT_MS";
const ENV_EXEC_TIMEOUT_MS: &str = "SMART_TERMINAL_EXEC_TIMEOUT_MS";

/// Where and how to reach the inference service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// How proposed commands are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub dialect: Dialect,
    pub timeout: Duration,
}

impl ExecutionConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Everything a run needs, fixed for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub platform: Platform,
    pub inference: InferenceConfig,
    pub execution: ExecutionConfig,
}

/// Optional settings read from the YAML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_ms: Option<u64>,
    pub exec_timeout_ms: Option<u64>,
}

impl ConfigFile {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        // An empty file is a valid "no overrides" config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(file)
    }

    /// Default location: `$HOME/.smart-terminal/config.yaml`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".smart-terminal").join("config.yaml")
    }
}

/// Command-line overrides. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_ms: Option<u64>,
    pub exec_timeout_ms: Option<u64>,
}

impl AppConfig {
    /// Built-in defaults for the given platform.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            inference: InferenceConfig::default(),
            execution: ExecutionConfig::new(platform.dialect()),
        }
    }

    /// Resolve the full layered configuration for this process.
    pub fn load(platform: Platform, overrides: &Overrides) -> Result<Self> {
        let mut config = Self::new(platform);

        let file = match &overrides.config_path {
            // An explicit path must exist.
            Some(path) => Some(ConfigFile::load_from_file(path)?),
            None => {
                let path = ConfigFile::default_path();
                if path.exists() {
                    Some(ConfigFile::load_from_file(&path)?)
                } else {
                    None
                }
            }
        };
        if let Some(file) = file {
            config.apply_file(&file)?;
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides)?;

        tracing::info!(
            endpoint = %config.inference.endpoint,
            model = %config.inference.model,
            timeout_ms = config.inference.timeout.as_millis() as u64,
            exec_timeout_ms = config.execution.timeout.as_millis() as u64,
            dialect = %config.execution.dialect,
            "Configuration resolved"
        );
        Ok(config)
    }

    pub fn apply_file(&mut self, file: &ConfigFile) -> Result<()> {
        self.set(
            file.endpoint.clone(),
            file.model.clone(),
            file.timeout_ms,
            file.exec_timeout_ms,
        )
        .context("Invalid value in config file")
    }

    /// Apply `SMART_TERMINAL_*` variables using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_ms = lookup(ENV_TIMEOUT_MS)
            .map(|v| parse_millis(ENV_TIMEOUT_MS, &v))
            .transpose()?;
        let exec_timeout_ms = lookup(ENV_EXEC_TIMEOUT_MS)
            .map(|v| parse_millis(ENV_EXEC_TIMEOUT_MS, &v))
            .transpose()?;
        self.set(lookup(ENV_ENDPOINT), lookup(ENV_MODEL), timeout_ms, exec_timeout_ms)
            .context("Invalid value in environment")
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<()> {
        self.set(
            overrides.endpoint.clone(),
            overrides.model.clone(),
            overrides.timeout_ms,
            overrides.exec_timeout_ms,
        )
        .context("Invalid command-line option")
    }

    fn set(
        &mut self,
        endpoint: Option<String>,
        model: Option<String>,
        timeout_ms: Option<u64>,
        exec_timeout_ms: Option<u64>,
    ) -> Result<()> {
        if let Some(endpoint) = endpoint {
            if endpoint.trim().is_empty() {
                bail!("endpoint must not be empty");
            }
            self.inference.endpoint = endpoint;
        }
        if let Some(model) = model {
            if model.trim().is_empty() {
                bail!("model must not be empty");
            }
            self.inference.model = model;
        }
        if let Some(ms) = timeout_ms {
            self.inference.timeout = positive_millis("timeout", ms)?;
        }
        if let Some(ms) = exec_timeout_ms {
            self.execution.timeout = positive_millis("execution timeout", ms)?;
        }
        Ok(())
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{} must be a whole number of milliseconds, got {:?}", key, value))
}

fn positive_millis(what: &str, ms: u64) -> Result<Duration> {
    if ms == 0 {
        bail!("{} must be greater than zero", what);
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn linux() -> Platform {
        Platform::from_os("linux")
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::new(linux());
        assert_eq!(config.inference.endpoint, "http://localhost:11434/api/generate");
        assert_eq!(config.inference.model, "llama3.1");
        assert_eq!(config.inference.timeout, Duration::from_millis(30_000));
        assert_eq!(config.execution.timeout, Duration::from_millis(30_000));
        assert_eq!(config.execution.dialect, Dialect::Posix);
    }

    #[test]
    fn test_execution_dialect_follows_platform() {
        let config = AppConfig::new(Platform::from_os("windows"));
        assert_eq!(config.execution.dialect, Dialect::PowerShell);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SMART_TERMINAL_MODEL", "qwen2.5-coder"),
            ("SMART_TERMINAL_TIMEOUT_MS", " 5000 "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::new(linux());
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.inference.model, "qwen2.5-coder");
        assert_eq!(config.inference.timeout, Duration::from_millis(5000));
        // untouched
        assert_eq!(config.inference.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.execution.timeout, Duration::from_millis(30_000));
    }

    #[test]
    fn test_env_rejects_bad_timeout() {
        let mut config = AppConfig::new(linux());
        let err = config
            .apply_env(|key| (key == "SMART_TERMINAL_EXEC_TIMEOUT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("SMART_TERMINAL_EXEC_TIMEOUT_MS"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AppConfig::new(linux());
        let overrides = Overrides {
            timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(config.apply_overrides(&overrides).is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = AppConfig::new(linux());
        config
            .apply_file(&ConfigFile {
                endpoint: Some("http://gpu-box:11434/api/generate".to_string()),
                model: Some("mistral".to_string()),
                timeout_ms: None,
                exec_timeout_ms: Some(1000),
            })
            .unwrap();
        config
            .apply_overrides(&Overrides {
                model: Some("llama3.2".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.inference.endpoint, "http://gpu-box:11434/api/generate");
        assert_eq!(config.inference.model, "llama3.2");
        assert_eq!(config.execution.timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut config = AppConfig::new(linux());
        let overrides = Overrides {
            model: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.apply_overrides(&overrides).is_err());
    }
}
