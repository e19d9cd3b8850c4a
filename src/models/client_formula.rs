//! Client pricing formula model.

use serde::{Deserialize, Serialize};

use super::Validity;
use super::validity::Versioned;

/// A client-specific pricing expression for one unit type.
///
/// The unit type `General` (configurable) acts as a wildcard fallback for
/// unit types without a dedicated formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFormula {
    /// Persistence identity of the formula.
    pub id: String,
    /// The client the formula prices for.
    pub client_id: String,
    /// Vehicle or unit type, e.g. "Sider", "Bitren", "General".
    pub unit_type: String,
    /// The expression text, e.g. `Valor * Palets + Peaje`.
    pub expression: String,
    /// The window during which the formula applies.
    #[serde(flatten)]
    pub validity: Validity,
}

impl Versioned for ClientFormula {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    // Unit types match case-insensitively during resolution, so they share a scope.
    fn scope_key(&self) -> String {
        format!(
            "client {} / {}",
            self.client_id,
            self.unit_type.to_ascii_lowercase()
        )
    }
}
