//! Configuration types for the tariff engine.
//!
//! This module contains the strongly-typed configuration structure that is
//! deserialized from `engine.yaml`.

use serde::Deserialize;

/// The formula used when a client has no formula of its own, or when its
/// formula cannot be evaluated.
pub const DEFAULT_STANDARD_FORMULA: &str = "Valor * Palets + Peaje";

/// The wildcard unit type for client formulas.
pub const DEFAULT_GENERAL_UNIT_TYPE: &str = "General";

/// Decimal places for monetary outputs.
pub const DEFAULT_MONETARY_SCALE: u32 = 2;

/// Engine configuration.
///
/// # Example
///
/// ```
/// use freight_tariff_engine::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.standard_formula, "Valor * Palets + Peaje");
/// assert_eq!(config.monetary_scale, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The standard pricing formula.
    pub standard_formula: String,
    /// Unit type acting as the client-wide formula fallback.
    pub general_unit_type: String,
    /// Decimal places monetary amounts are rounded to.
    pub monetary_scale: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            standard_formula: DEFAULT_STANDARD_FORMULA.to_string(),
            general_unit_type: DEFAULT_GENERAL_UNIT_TYPE.to_string(),
            monetary_scale: DEFAULT_MONETARY_SCALE,
        }
    }
}

impl EngineConfig {
    /// Returns a copy with a different standard formula.
    pub fn with_standard_formula(mut self, formula: impl Into<String>) -> Self {
        self.standard_formula = formula.into();
        self
    }
}
