//! Calculation request and result models.
//!
//! This module contains the [`CalculationRequest`] supplied by collaborators,
//! the [`CalculationResult`] returned by the engine, and the audit structures
//! recording every resolution decision taken along the way.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CalculationMethod, Route, TariffKind};

/// A single billing calculation request.
///
/// Created per call and owned by the caller; the route must already carry
/// its tariff records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// The route being billed, with its tariff history loaded.
    pub route: Route,
    /// The date the service is billed on.
    pub billing_date: NaiveDate,
    /// Full or partial route pricing.
    pub kind: TariffKind,
    /// Pin the calculation to a specific tariff record.
    #[serde(default)]
    pub explicit_tariff_id: Option<String>,
    /// Unit type used to pick the client formula, e.g. "Sider".
    pub unit_type: String,
    /// Unit count, e.g. pallets.
    pub quantity: Decimal,
    /// Permit expired (non-current) tariffs as a fallback.
    #[serde(default)]
    pub allow_non_current: bool,
}

/// Which resolution tier selected the tariff record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffTier {
    /// The caller pinned the record by id.
    Explicit,
    /// The record's validity contains the billing date.
    Current,
    /// The most recent record starting on or before the billing date.
    Historical,
}

/// Which resolution tier selected the pricing formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaTier {
    /// Formula for the exact unit type, valid on the billing date.
    ExactUnitType,
    /// General formula valid on the billing date.
    General,
    /// Most recent formula for the unit type, possibly expired.
    HistoricalUnitType,
    /// Any formula for the client.
    AnyClientFormula,
    /// The configured standard formula.
    Standard,
}

/// A single step in the audit trace recording a calculation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings record recovered conditions, such as a formula that failed to
/// evaluate and was replaced by the standard formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use freight_tariff_engine::models::AuditTrace;
///
/// let trace = AuditTrace {
///     steps: vec![],
///     warnings: vec![],
///     duration_us: 12,
/// };
/// assert!(trace.warnings.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// Returns the number the next pushed step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Returns true if a warning with `code` was recorded.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// The monetary breakdown of a billing calculation.
///
/// All amounts are rounded to the configured scale, and `total` is the sum
/// of the already-rounded `base_amount` and `toll_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The route billed.
    pub route_id: String,
    /// The tariff record the amounts were derived from.
    pub resolved_tariff_id: Option<String>,
    /// How the tariff record was selected.
    pub tariff_tier: Option<TariffTier>,
    /// The calculation method actually applied.
    pub method: CalculationMethod,
    /// The expression the amounts correspond to.
    pub formula_used: String,
    /// How the formula was selected, for formula-priced tariffs.
    pub formula_tier: Option<FormulaTier>,
    /// Base amount, excluding toll.
    pub base_amount: Decimal,
    /// Toll amount.
    pub toll_amount: Decimal,
    /// Base plus toll.
    pub total: Decimal,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}
