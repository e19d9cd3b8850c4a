//! Request types for the tariff engine API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{CalculationRequest, ClientFormula, Route, TariffKind, TariffRecord};

/// Request body for the `/calculate` endpoint.
///
/// Carries the route with its tariff history and the client's formulas,
/// since the engine holds no data of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// The route being billed, with its tariff records.
    pub route: Route,
    /// The client's pricing formulas.
    #[serde(default)]
    pub formulas: Vec<ClientFormula>,
    /// The date the service is billed on.
    pub billing_date: NaiveDate,
    /// Full (`TRMC`) or partial (`TRMI`) route pricing.
    pub kind: TariffKind,
    /// Unit type used to pick the client formula.
    pub unit_type: String,
    /// Unit count, e.g. pallets.
    pub quantity: Decimal,
    /// Pin the calculation to a specific tariff record.
    #[serde(default)]
    pub explicit_tariff_id: Option<String>,
    /// Permit expired tariffs as a fallback.
    #[serde(default)]
    pub allow_non_current: bool,
}

impl CalculateRequest {
    /// Splits the body into the engine request and the formulas.
    pub fn into_parts(self) -> (CalculationRequest, Vec<ClientFormula>) {
        let request = CalculationRequest {
            route: self.route,
            billing_date: self.billing_date,
            kind: self.kind,
            explicit_tariff_id: self.explicit_tariff_id,
            unit_type: self.unit_type,
            quantity: self.quantity,
            allow_non_current: self.allow_non_current,
        };
        (request, self.formulas)
    }
}

/// Request body for the `/validate-overlap` endpoint.
///
/// The record type is inferred from the candidate's fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverlapValidationRequest {
    /// A tariff record checked against its route's records.
    Tariff {
        /// The record about to be stored.
        candidate: TariffRecord,
        /// Records already stored.
        #[serde(default)]
        existing: Vec<TariffRecord>,
    },
    /// A client formula checked against the client's formulas.
    Formula {
        /// The formula about to be stored.
        candidate: ClientFormula,
        /// Formulas already stored.
        #[serde(default)]
        existing: Vec<ClientFormula>,
    },
}

impl OverlapValidationRequest {
    /// The candidate record's id.
    pub fn candidate_id(&self) -> &str {
        match self {
            Self::Tariff { candidate, .. } => &candidate.id,
            Self::Formula { candidate, .. } => &candidate.id,
        }
    }
}
