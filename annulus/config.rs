//! Optional TOML configuration for the calculator.
//!
//! ```toml
//! grid = "data/aad_grid.json"
//!
//! [limits]
//! age_years = { min = 0.0, max = 59.0 }
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use crate::validation::DomainLimits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    /// Grid file to load. Relative paths resolve against the working directory.
    pub grid: Option<PathBuf>,
    pub limits: DomainLimits,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML config file: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config limit '{name}' must have finite bounds, got min {min} and max {max}")]
    NonFiniteBounds { name: &'static str, min: f64, max: f64 },
    #[error("Config limit '{name}' has min {min} greater than max {max}")]
    InvertedBounds { name: &'static str, min: f64, max: f64 },
}

impl CalculatorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.check_limits()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Read calculator config from {}", path.display());
        Ok(config)
    }

    fn check_limits(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        for (name, bounds) in [
            ("age_years", limits.age_years),
            ("weight_kg", limits.weight_kg),
            ("height_cm", limits.height_cm),
        ] {
            if !bounds.min.is_finite() || !bounds.max.is_finite() {
                return Err(ConfigError::NonFiniteBounds {
                    name,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
            if bounds.min > bounds.max {
                return Err(ConfigError::InvertedBounds {
                    name,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }
        Ok(())
    }
}
