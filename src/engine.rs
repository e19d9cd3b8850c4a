//! The collaborator-facing tariff engine.
//!
//! `TariffEngine` ties the resolvers and the calculator together behind the
//! two entry points collaborators use: pricing a billing request and gating
//! the creation of new versioned records.

use std::time::Instant;

use tracing::debug;

use crate::calculation::{
    FormulaResolver, TariffCalculator, TariffQuery, resolve_tariff, validate_no_overlap,
};
use crate::config::{ConfigLoader, EngineConfig};
use crate::error::EngineResult;
use crate::models::{
    AuditTrace, CalculationRequest, CalculationResult, ClientFormula, TariffRecord,
};

/// Resolves tariffs and formulas and calculates billing amounts.
///
/// The engine holds only configuration; every call works on the data it is
/// given, so one instance can be shared across threads.
///
/// # Example
///
/// ```
/// use freight_tariff_engine::config::EngineConfig;
/// use freight_tariff_engine::engine::TariffEngine;
/// use freight_tariff_engine::models::{
///     CalculationMethod, CalculationRequest, Route, TariffKind, TariffRecord, Validity,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
/// let route = Route {
///     id: "R".to_string(),
///     origin: "SANTIAGO".to_string(),
///     destination: "RANCAGUA".to_string(),
///     client_id: "C-1".to_string(),
///     distance_km: Some(Decimal::new(120, 0)),
///     tariff_records: vec![TariffRecord {
///         id: "T-1".to_string(),
///         route_id: "R".to_string(),
///         kind: TariffKind::FullRoute,
///         calculation_method: CalculationMethod::Distance,
///         base_value: Decimal::TEN,
///         toll_value: Decimal::new(500, 0),
///         validity: Validity::new(d(1, 1), Some(d(12, 31))).unwrap(),
///     }],
/// };
/// let request = CalculationRequest {
///     route,
///     billing_date: d(6, 1),
///     kind: TariffKind::FullRoute,
///     explicit_tariff_id: None,
///     unit_type: "General".to_string(),
///     quantity: Decimal::ONE,
///     allow_non_current: false,
/// };
///
/// let engine = TariffEngine::new(EngineConfig::default());
/// let result = engine.resolve_and_calculate(&request, &[]).unwrap();
/// assert_eq!(result.total, Decimal::new(170000, 2));
/// ```
#[derive(Debug, Clone)]
pub struct TariffEngine {
    config: EngineConfig,
    formula_resolver: FormulaResolver,
    calculator: TariffCalculator,
}

impl TariffEngine {
    /// Creates an engine from an explicit configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            formula_resolver: FormulaResolver::new(&config),
            calculator: TariffCalculator::new(&config),
            config,
        }
    }

    /// Creates an engine from a loaded configuration directory.
    pub fn from_loader(loader: ConfigLoader) -> Self {
        Self::new(loader.into_config())
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Prices a billing request.
    ///
    /// Resolves the tariff record for the request's route, kind and date,
    /// resolves the client formula when the record is formula-priced, then
    /// calculates the rounded breakdown. The client is the route's client.
    ///
    /// # Errors
    ///
    /// - `TariffNotFound` if no tariff applies
    /// - `ExplicitTariffNotFound` if a pinned tariff id is not on the route
    /// - `MissingDistance` for a distance tariff on a route without distance
    /// - `AmountOverflow` if the billed amount leaves the decimal range
    pub fn resolve_and_calculate(
        &self,
        request: &CalculationRequest,
        formulas: &[ClientFormula],
    ) -> EngineResult<CalculationResult> {
        let start_time = Instant::now();
        let route = &request.route;
        let mut trace = AuditTrace::default();

        let query = TariffQuery {
            kind: request.kind,
            billing_date: request.billing_date,
            explicit_tariff_id: request.explicit_tariff_id.as_deref(),
            allow_non_current: request.allow_non_current,
        };
        let tariff = resolve_tariff(route, &query, trace.next_step_number())?;
        trace.steps.push(tariff.audit_step);

        let formula = if tariff.record.calculation_method.is_custom() {
            let resolution = self.formula_resolver.resolve(
                formulas,
                &route.client_id,
                &request.unit_type,
                request.billing_date,
                trace.next_step_number(),
            );
            trace.steps.push(resolution.audit_step);
            Some((resolution.expression, resolution.tier))
        } else {
            None
        };

        let mut result = self.calculator.calculate(
            route,
            tariff.record,
            request.quantity,
            formula.map(|(expression, _)| expression),
            trace.next_step_number(),
        )?;

        trace.steps.append(&mut result.audit_trace.steps);
        result.audit_trace.steps = trace.steps;
        result.tariff_tier = Some(tariff.tier);
        result.formula_tier = formula.map(|(_, tier)| tier);
        result.audit_trace.duration_us = start_time.elapsed().as_micros() as u64;

        debug!(
            route_id = %route.id,
            tariff_id = %tariff.record.id,
            total = %result.total,
            warnings = result.audit_trace.warnings.len(),
            "Calculation completed"
        );

        Ok(result)
    }

    /// Checks that a tariff record can be stored next to `existing`.
    ///
    /// Records are compared within the same route, kind and calculation
    /// method. See [`validate_no_overlap`].
    pub fn validate_tariff(
        &self,
        candidate: &TariffRecord,
        existing: &[TariffRecord],
    ) -> EngineResult<()> {
        validate_no_overlap(candidate, existing)
    }

    /// Checks that a client formula can be stored next to `existing`.
    ///
    /// Formulas are compared within the same client and unit type.
    pub fn validate_formula(
        &self,
        candidate: &ClientFormula,
        existing: &[ClientFormula],
    ) -> EngineResult<()> {
        validate_no_overlap(candidate, existing)
    }
}

impl Default for TariffEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
