//! Core data models for the freight tariff engine.
//!
//! This module contains the records supplied by collaborators (routes,
//! tariff records, client formulas) and the results the engine produces.

mod calculation_result;
mod client_formula;
mod route;
mod tariff;
mod validity;

pub use calculation_result::{
    AuditStep, AuditTrace, AuditWarning, CalculationRequest, CalculationResult, FormulaTier,
    TariffTier,
};
pub use client_formula::ClientFormula;
pub use route::{Route, TariffStore};
pub use tariff::{CalculationMethod, TariffKind, TariffRecord};
pub use validity::{Validity, Versioned};
