//! Tariff amount calculation.
//!
//! This module turns a resolved tariff record into a rounded monetary
//! breakdown using one of four calculation methods: per distance, flat,
//! per unit, or a client pricing formula.
//!
//! Formula failures never fail the calculation. A formula that cannot be
//! evaluated is replaced by the standard formula, and a formula yielding a
//! zero total for non-zero inputs is recomputed per unit; both cases are
//! logged and recorded as audit warnings.

use std::time::Instant;

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::formula::{Formula, FormulaContext};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, CalculationMethod, CalculationResult, Route,
    TariffRecord,
};

/// Expression describing the distance method.
pub const DISTANCE_EXPRESSION: &str = "Valor * Km + Peaje";

/// Expression describing the flat method.
pub const FLAT_EXPRESSION: &str = "Valor + Peaje";

/// Expression describing the per-unit method.
pub const PER_UNIT_EXPRESSION: &str = "Valor * Palets + Peaje";

/// Warning code recorded when a client formula is replaced by the standard formula.
pub const FORMULA_FALLBACK_WARNING: &str = "FORMULA_FALLBACK";

/// Warning code recorded when the per-unit method replaces a formula result.
pub const PER_UNIT_SAFETY_NET_WARNING: &str = "PER_UNIT_SAFETY_NET";

/// Unrounded amounts before the monetary scale is applied.
struct Breakdown {
    base: Decimal,
    toll: Decimal,
    method: CalculationMethod,
    formula_used: String,
    /// Variables the evaluated formula reads; empty for fixed methods.
    variables: Vec<String>,
    reasoning: String,
}

/// Calculates monetary amounts for resolved tariff records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TariffCalculator {
    standard_formula: String,
    monetary_scale: u32,
}

impl TariffCalculator {
    /// Creates a calculator using the configured standard formula and scale.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            standard_formula: config.standard_formula.clone(),
            monetary_scale: config.monetary_scale,
        }
    }

    /// Rounds an amount to the monetary scale, halves away from zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use freight_tariff_engine::calculation::TariffCalculator;
    /// use freight_tariff_engine::config::EngineConfig;
    /// use rust_decimal::Decimal;
    ///
    /// let calculator = TariffCalculator::new(&EngineConfig::default());
    /// assert_eq!(calculator.round_money(Decimal::new(66670, 3)), Decimal::new(6667, 2));
    /// assert_eq!(calculator.round_money(Decimal::new(-1005, 3)), Decimal::new(-101, 2));
    /// ```
    pub fn round_money(&self, amount: Decimal) -> Decimal {
        let mut rounded = amount
            .round_dp_with_strategy(self.monetary_scale, RoundingStrategy::MidpointAwayFromZero);
        // Pad to the full scale so amounts always render with their cents.
        rounded.rescale(self.monetary_scale);
        rounded
    }

    /// Calculates the amounts for `tariff` on `route`.
    ///
    /// # Arguments
    ///
    /// * `route` - The route billed; supplies the distance for distance tariffs
    /// * `tariff` - The resolved tariff record
    /// * `quantity` - Unit count, e.g. pallets
    /// * `formula` - The client formula for custom tariffs; the standard
    ///   formula is used when `None`
    /// * `step_number` - The step number for audit trail sequencing
    ///
    /// # Returns
    ///
    /// A `CalculationResult` whose base, toll and total are each rounded to
    /// the monetary scale, with `total` the sum of the rounded components.
    /// Tier fields are left empty for the caller to fill in.
    ///
    /// # Errors
    ///
    /// - `MissingDistance` for a distance tariff on a route without a
    ///   computed distance
    /// - `AmountOverflow` if an amount leaves the decimal range
    ///
    /// Formula problems are never returned as errors.
    pub fn calculate(
        &self,
        route: &Route,
        tariff: &TariffRecord,
        quantity: Decimal,
        formula: Option<&str>,
        step_number: u32,
    ) -> EngineResult<CalculationResult> {
        let start_time = Instant::now();
        let mut warnings = Vec::new();

        let breakdown = match &tariff.calculation_method {
            CalculationMethod::Distance => {
                let distance = route.distance_km.ok_or_else(|| EngineError::MissingDistance {
                    route_id: route.id.clone(),
                })?;
                let base = checked(
                    tariff.base_value.checked_mul(distance),
                    tariff,
                    "base x distance",
                )?;
                Breakdown {
                    base,
                    toll: tariff.toll_value,
                    method: tariff.calculation_method.clone(),
                    formula_used: DISTANCE_EXPRESSION.to_string(),
                    variables: Vec::new(),
                    reasoning: format!(
                        "${} x {} km = ${}",
                        tariff.base_value.normalize(),
                        distance.normalize(),
                        base.normalize()
                    ),
                }
            }
            CalculationMethod::Flat => Breakdown {
                base: tariff.base_value,
                toll: tariff.toll_value,
                method: tariff.calculation_method.clone(),
                formula_used: FLAT_EXPRESSION.to_string(),
                variables: Vec::new(),
                reasoning: format!("Flat amount ${}", tariff.base_value.normalize()),
            },
            CalculationMethod::PerUnit => per_unit(tariff, quantity)?,
            CalculationMethod::Custom(_) => {
                self.formula_breakdown(tariff, quantity, formula, &mut warnings)?
            }
        };

        let base_amount = self.round_money(breakdown.base);
        let toll_amount = self.round_money(breakdown.toll);
        let total = self.round_money(checked(
            base_amount.checked_add(toll_amount),
            tariff,
            "base + toll",
        )?);

        let audit_step = AuditStep {
            step_number,
            rule_id: "tariff_calculation".to_string(),
            rule_name: "Tariff Calculation".to_string(),
            input: serde_json::json!({
                "tariff_id": tariff.id,
                "calculation_method": tariff.calculation_method.label(),
                "base_value": tariff.base_value.to_string(),
                "toll_value": tariff.toll_value.to_string(),
                "quantity": quantity.to_string(),
                "distance_km": route.distance_km.map(|d| d.to_string()),
                "formula": formula
            }),
            output: serde_json::json!({
                "method": breakdown.method.label(),
                "formula_used": breakdown.formula_used,
                "formula_variables": breakdown.variables,
                "base_amount": base_amount.to_string(),
                "toll_amount": toll_amount.to_string(),
                "total": total.to_string()
            }),
            reasoning: format!(
                "{}; + toll ${} = ${}",
                breakdown.reasoning, toll_amount, total
            ),
        };

        Ok(CalculationResult {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            route_id: route.id.clone(),
            resolved_tariff_id: Some(tariff.id.clone()),
            tariff_tier: None,
            method: breakdown.method,
            formula_used: breakdown.formula_used,
            formula_tier: None,
            base_amount,
            toll_amount,
            total,
            audit_trace: AuditTrace {
                steps: vec![audit_step],
                warnings,
                duration_us: start_time.elapsed().as_micros() as u64,
            },
        })
    }

    fn formula_breakdown(
        &self,
        tariff: &TariffRecord,
        quantity: Decimal,
        formula: Option<&str>,
        warnings: &mut Vec<AuditWarning>,
    ) -> EngineResult<Breakdown> {
        let ctx = FormulaContext::for_tariff(tariff.base_value, tariff.toll_value, quantity);
        let requested = formula.unwrap_or(&self.standard_formula);

        let evaluated = match evaluate(requested, &ctx) {
            Ok(evaluated) => Some(evaluated),
            Err(err) => {
                warn!(
                    tariff_id = %tariff.id,
                    formula = %requested,
                    error = %err,
                    "Formula evaluation failed; falling back to standard formula"
                );
                warnings.push(AuditWarning {
                    code: FORMULA_FALLBACK_WARNING.to_string(),
                    message: format!("{}; using standard formula '{}'", err, self.standard_formula),
                    severity: "medium".to_string(),
                });

                if requested == self.standard_formula {
                    None
                } else {
                    match evaluate(&self.standard_formula, &ctx) {
                        Ok(evaluated) => Some(evaluated),
                        Err(err) => {
                            warn!(
                                tariff_id = %tariff.id,
                                error = %err,
                                "Standard formula evaluation failed"
                            );
                            None
                        }
                    }
                }
            }
        };

        let Some((formula, total)) = evaluated else {
            return self.safety_net(tariff, quantity, "no formula could be evaluated", warnings);
        };

        let inputs_non_zero = !tariff.base_value.is_zero() && !quantity.is_zero();
        if total.is_zero() && inputs_non_zero {
            return self.safety_net(
                tariff,
                quantity,
                &format!("formula '{}' produced a zero total", formula.source()),
                warnings,
            );
        }

        // Toll only counts separately when the formula adds it on top.
        let toll = if formula.adds_toll() {
            tariff.toll_value
        } else {
            Decimal::ZERO
        };

        let Some(base) = total.checked_sub(toll) else {
            return self.safety_net(
                tariff,
                quantity,
                &format!("formula '{}' total minus toll overflows", formula.source()),
                warnings,
            );
        };

        Ok(Breakdown {
            base,
            toll,
            method: tariff.calculation_method.clone(),
            formula_used: formula.source().to_string(),
            variables: formula.expr().variables().into_iter().map(String::from).collect(),
            reasoning: format!("{} = ${}", formula.source(), total.normalize()),
        })
    }

    fn safety_net(
        &self,
        tariff: &TariffRecord,
        quantity: Decimal,
        cause: &str,
        warnings: &mut Vec<AuditWarning>,
    ) -> EngineResult<Breakdown> {
        warn!(
            tariff_id = %tariff.id,
            cause = %cause,
            "Recomputing formula tariff per unit"
        );
        warnings.push(AuditWarning {
            code: PER_UNIT_SAFETY_NET_WARNING.to_string(),
            message: format!("{}; recomputed per unit", cause),
            severity: "high".to_string(),
        });
        per_unit(tariff, quantity)
    }
}

fn checked(
    value: Option<Decimal>,
    tariff: &TariffRecord,
    operation: &str,
) -> EngineResult<Decimal> {
    value.ok_or_else(|| EngineError::AmountOverflow {
        tariff_id: tariff.id.clone(),
        operation: operation.to_string(),
    })
}

fn per_unit(tariff: &TariffRecord, quantity: Decimal) -> EngineResult<Breakdown> {
    let base = checked(tariff.base_value.checked_mul(quantity), tariff, "base x quantity")?;
    Ok(Breakdown {
        base,
        toll: tariff.toll_value,
        method: CalculationMethod::PerUnit,
        formula_used: PER_UNIT_EXPRESSION.to_string(),
        variables: Vec::new(),
        reasoning: format!(
            "${} x {} units = ${}",
            tariff.base_value.normalize(),
            quantity.normalize(),
            base.normalize()
        ),
    })
}

fn evaluate(source: &str, ctx: &FormulaContext) -> EngineResult<(Formula, Decimal)> {
    let to_engine_error = |source_err| EngineError::Evaluation {
        formula: source.to_string(),
        source: source_err,
    };
    let formula = Formula::parse(source).map_err(to_engine_error)?;
    let total = formula.evaluate(ctx).map_err(to_engine_error)?;
    Ok((formula, total))
}
