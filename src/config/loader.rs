//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::formula::Formula;

use super::types::EngineConfig;

/// The largest scale `rust_decimal` can represent.
const MAX_MONETARY_SCALE: u32 = 28;

/// Loads and validates engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/freight/
/// └── engine.yaml   # standard formula, general unit type, monetary scale
/// ```
///
/// Every key in `engine.yaml` is optional and falls back to
/// [`EngineConfig::default`].
///
/// # Example
///
/// ```no_run
/// use freight_tariff_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/freight")?;
/// println!("Standard formula: {}", loader.config().standard_formula);
/// # Ok::<(), freight_tariff_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - `engine.yaml` is missing (`ConfigNotFound`)
    /// - the file is not valid YAML for [`EngineConfig`] (`ConfigParseError`)
    /// - the standard formula does not parse, or the scale is out of range
    ///   (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let engine_path = path.as_ref().join("engine.yaml");
        let path_str = engine_path.display().to_string();

        let content = fs::read_to_string(&engine_path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::from_yaml_str(&content, &path_str)
    }

    /// Parses configuration from YAML text; `origin` names the source in errors.
    pub fn from_yaml_str(content: &str, origin: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        Self::validate(&config, origin)?;
        Ok(Self { config })
    }

    fn validate(config: &EngineConfig, origin: &str) -> EngineResult<()> {
        if let Err(err) = Formula::parse(&config.standard_formula) {
            return Err(EngineError::ConfigParseError {
                path: origin.to_string(),
                message: format!(
                    "standard_formula '{}' is invalid: {}",
                    config.standard_formula, err
                ),
            });
        }

        if config.general_unit_type.trim().is_empty() {
            return Err(EngineError::ConfigParseError {
                path: origin.to_string(),
                message: "general_unit_type must not be empty".to_string(),
            });
        }

        if config.monetary_scale > MAX_MONETARY_SCALE {
            return Err(EngineError::ConfigParseError {
                path: origin.to_string(),
                message: format!(
                    "monetary_scale {} exceeds {}",
                    config.monetary_scale, MAX_MONETARY_SCALE
                ),
            });
        }

        Ok(())
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}
