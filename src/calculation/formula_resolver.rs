//! Client formula resolution.
//!
//! This module selects the pricing formula for a client, unit type and
//! billing date. Resolution never fails: when the client has no usable
//! formula the configured standard formula is returned.

use chrono::NaiveDate;
use tracing::debug;

use crate::config::EngineConfig;
use crate::models::{AuditStep, ClientFormula, FormulaTier};

/// The result of a formula resolution, including the expression and audit step.
#[derive(Debug, Clone)]
pub struct FormulaResolution<'a> {
    /// The selected expression text.
    pub expression: &'a str,
    /// The client formula it came from; `None` for the standard formula.
    pub formula_id: Option<&'a str>,
    /// The tier that selected it.
    pub tier: FormulaTier,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Selects client pricing formulas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaResolver {
    standard_formula: String,
    general_unit_type: String,
}

impl FormulaResolver {
    /// Creates a resolver using the configured standard formula and general unit type.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            standard_formula: config.standard_formula.clone(),
            general_unit_type: config.general_unit_type.clone(),
        }
    }

    /// The formula returned when nothing else applies.
    pub fn standard_formula(&self) -> &str {
        &self.standard_formula
    }

    /// Resolves the formula for `client_id` and `unit_type` on `billing_date`.
    ///
    /// Tiers, first hit wins:
    /// 1. a formula for the unit type valid on the billing date
    /// 2. a general formula valid on the billing date
    /// 3. the unit type's most recent formula starting on or before the
    ///    billing date, even if expired
    /// 4. any formula for the client, unit type before general before other
    ///    unit types, most recent first
    /// 5. the standard formula
    ///
    /// Unit types compare case-insensitively. Formulas for other clients and
    /// formulas with blank expressions are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use freight_tariff_engine::calculation::FormulaResolver;
    /// use freight_tariff_engine::config::EngineConfig;
    /// use freight_tariff_engine::models::FormulaTier;
    /// use chrono::NaiveDate;
    ///
    /// let resolver = FormulaResolver::new(&EngineConfig::default());
    /// let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    /// let resolution = resolver.resolve(&[], "C-1", "Sider", date, 1);
    /// assert_eq!(resolution.expression, "Valor * Palets + Peaje");
    /// assert_eq!(resolution.tier, FormulaTier::Standard);
    /// ```
    pub fn resolve<'a>(
        &'a self,
        formulas: &'a [ClientFormula],
        client_id: &str,
        unit_type: &str,
        billing_date: NaiveDate,
        step_number: u32,
    ) -> FormulaResolution<'a> {
        let candidates: Vec<&ClientFormula> = formulas
            .iter()
            .filter(|f| f.client_id == client_id && !f.expression.trim().is_empty())
            .collect();

        let is_unit = |f: &ClientFormula| f.unit_type.eq_ignore_ascii_case(unit_type);
        let is_general = |f: &ClientFormula| f.unit_type.eq_ignore_ascii_case(&self.general_unit_type);

        let found = latest(&candidates, |f| is_unit(f) && f.validity.contains(billing_date))
            .map(|f| (f, FormulaTier::ExactUnitType))
            .or_else(|| {
                latest(&candidates, |f| is_general(f) && f.validity.contains(billing_date))
                    .map(|f| (f, FormulaTier::General))
            })
            .or_else(|| {
                latest(&candidates, |f| {
                    is_unit(f) && f.validity.valid_from <= billing_date
                })
                .map(|f| (f, FormulaTier::HistoricalUnitType))
            })
            .or_else(|| {
                candidates
                    .iter()
                    .copied()
                    .max_by_key(|&f| {
                        let preference = if is_unit(f) {
                            2
                        } else if is_general(f) {
                            1
                        } else {
                            0
                        };
                        (preference, f.validity.valid_from)
                    })
                    .map(|f| (f, FormulaTier::AnyClientFormula))
            });

        let (expression, formula_id, tier) = match found {
            Some((formula, tier)) => (
                formula.expression.as_str(),
                Some(formula.id.as_str()),
                tier,
            ),
            None => (self.standard_formula.as_str(), None, FormulaTier::Standard),
        };

        debug!(
            client_id = %client_id,
            unit_type = %unit_type,
            tier = ?tier,
            formula = %expression,
            "Formula resolved"
        );

        let audit_step = AuditStep {
            step_number,
            rule_id: "formula_resolution".to_string(),
            rule_name: "Formula Resolution".to_string(),
            input: serde_json::json!({
                "client_id": client_id,
                "unit_type": unit_type,
                "billing_date": billing_date.to_string(),
                "candidates": candidates.len()
            }),
            output: serde_json::json!({
                "formula_id": formula_id,
                "expression": expression,
                "tier": tier
            }),
            reasoning: match formula_id {
                Some(id) => format!("Using client formula '{}' ({:?}): {}", id, tier, expression),
                None => format!(
                    "No formula for client '{}'; using standard formula: {}",
                    client_id, expression
                ),
            },
        };

        FormulaResolution {
            expression,
            formula_id,
            tier,
            audit_step,
        }
    }
}

fn latest<'a>(
    candidates: &[&'a ClientFormula],
    predicate: impl Fn(&ClientFormula) -> bool,
) -> Option<&'a ClientFormula> {
    candidates
        .iter()
        .copied()
        .filter(|&f| predicate(f))
        .max_by_key(|f| f.validity.valid_from)
}
