//! Application state for the tariff engine API.

use std::sync::Arc;

use crate::engine::TariffEngine;

/// Shared application state.
///
/// Holds the engine shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<TariffEngine>,
}

impl AppState {
    /// Creates a new application state around the given engine.
    pub fn new(engine: TariffEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Returns a reference to the engine.
    pub fn engine(&self) -> &TariffEngine {
        &self.engine
    }
}
