//! Configuration File Loading
//!
//! Loads the dispatcher configuration from TOML or JSON, applies
//! environment overrides and validates the result.

use super::{Config, ENV_FORCE_EMBEDDED, ENV_TERMINALS};
use crate::error::{Error, Result};
use crate::models::TerminalCandidate;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Pick a format from a file extension; anything unknown is TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist. Environment overrides are applied either way.
    pub fn load() -> Result<Config> {
        let path = Self::default_config_path();
        let mut config = if path.exists() {
            Self::read_file(&path)?
        } else {
            debug!("No config at {}, using defaults", path.display());
            Config::default()
        };

        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load from an explicit path; a missing file is an error
    pub fn load_from_path(path: &Path) -> Result<Config> {
        let mut config = Self::read_file(path)?;
        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;
        info!("Loaded dispatcher config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration content in the given format
    ///
    /// Neither overrides nor validation are applied; the loaders validate
    /// once the environment has had its say.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Config> {
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| Error::ConfigParseFailed {
                format: format.label().to_string(),
                reason: e.to_string(),
            })?,
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| Error::ConfigParseFailed {
                    format: format.label().to_string(),
                    reason: e.to_string(),
                })?
            }
        };
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, ConfigFormat::from_path(path))
    }

    /// Default configuration path: `<config dir>/portal-launcher/dispatch.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("portal-launcher")
            .join("dispatch.toml")
    }

    /// Apply environment overrides from the process environment
    pub fn apply_env_overrides(config: &mut Config) {
        Self::apply_overrides(
            config,
            env::var(ENV_FORCE_EMBEDDED).ok().as_deref(),
            env::var(ENV_TERMINALS).ok().as_deref(),
        );
    }

    /// Apply override values; `None` leaves the setting alone
    pub fn apply_overrides(
        config: &mut Config,
        force_embedded: Option<&str>,
        terminals: Option<&str>,
    ) {
        if let Some(value) = force_embedded {
            config.embedded.force = value == "1" || value.eq_ignore_ascii_case("true");
            debug!("Force embedded terminal: {}", config.embedded.force);
        }

        if let Some(list) = terminals {
            let candidates = TerminalCandidate::parse_list(list);
            if candidates.is_empty() {
                warn!("Ignoring empty {} override", ENV_TERMINALS);
            } else {
                config.terminals = candidates;
            }
        }
    }

    /// Validate configuration
    pub fn validate(config: &Config) -> Result<()> {
        if config.terminals.is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "terminals".to_string(),
                reason: "At least one terminal candidate is required".to_string(),
            });
        }

        if config
            .terminals
            .iter()
            .any(|candidate| candidate.program.trim().is_empty())
        {
            return Err(Error::ConfigValidationFailed {
                field: "terminals".to_string(),
                reason: "Terminal program names cannot be empty".to_string(),
            });
        }

        if config.probe.timeout_ms == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "probe.timeout_ms".to_string(),
                reason: "Probe timeout must be greater than 0".to_string(),
            });
        }

        if config.shell.program.trim().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "shell.program".to_string(),
                reason: "Shell program cannot be empty".to_string(),
            });
        }

        if config.embedded.rows == 0 || config.embedded.cols == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "embedded.rows/cols".to_string(),
                reason: "Terminal size must be greater than 0".to_string(),
            });
        }

        if config.embedded.scrollback_lines == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "embedded.scrollback_lines".to_string(),
                reason: "Scrollback must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
