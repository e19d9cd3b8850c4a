//! Configuration loading and management for the tariff engine.
//!
//! The configuration is an explicit value handed to the engine at
//! construction; nothing in the crate reads global state.
//!
//! # Example
//!
//! ```no_run
//! use freight_tariff_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/freight").unwrap();
//! println!("Standard formula: {}", config.config().standard_formula);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    DEFAULT_GENERAL_UNIT_TYPE, DEFAULT_MONETARY_SCALE, DEFAULT_STANDARD_FORMULA, EngineConfig,
};
