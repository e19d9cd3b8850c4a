//! Tree-walking evaluator for parsed formulas.
//!
//! Evaluation is pure: the only inputs are the expression tree and the
//! variable bindings, and the only operations are checked decimal
//! arithmetic and comparisons.

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};

use crate::error::FormulaError;

use super::ast::{BinaryOp, Expr};
use super::lexer::Comparison;
use super::parser::parse;

/// Variable bound to the tariff's base value.
pub const VAR_BASE_VALUE: &str = "Valor";

/// Variable bound to the tariff's toll value.
pub const VAR_TOLL: &str = "Peaje";

/// Variable bound to the unit quantity.
pub const VAR_QUANTITY: &str = "Palets";

/// Named numeric values a formula may reference.
///
/// Names match whole identifiers exactly; `Palets` never matches inside
/// `PaletsExtra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaContext {
    values: HashMap<String, Decimal>,
}

impl FormulaContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the three tariff variables.
    ///
    /// # Examples
    ///
    /// ```
    /// use freight_tariff_engine::formula::FormulaContext;
    /// use rust_decimal::Decimal;
    ///
    /// let ctx = FormulaContext::for_tariff(Decimal::new(100, 0), Decimal::new(50, 0), Decimal::new(3, 0));
    /// assert_eq!(ctx.get("Palets"), Some(Decimal::new(3, 0)));
    /// ```
    pub fn for_tariff(base_value: Decimal, toll_value: Decimal, quantity: Decimal) -> Self {
        Self::new()
            .with(VAR_BASE_VALUE, base_value)
            .with(VAR_TOLL, toll_value)
            .with(VAR_QUANTITY, quantity)
    }

    /// Adds or replaces a binding.
    pub fn with(mut self, name: impl Into<String>, value: Decimal) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Looks up a binding.
    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.values.get(name).copied()
    }
}

/// A parsed formula together with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses formula text.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        Ok(Self {
            source: source.to_string(),
            expr: parse(source)?,
        })
    }

    /// The original text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluates the formula against `ctx`.
    pub fn evaluate(&self, ctx: &FormulaContext) -> Result<Decimal, FormulaError> {
        evaluate(&self.expr, ctx)
    }

    /// Returns true if the toll variable is added on top of the rest of the
    /// formula rather than folded into it.
    pub fn adds_toll(&self) -> bool {
        self.expr.adds_variable(VAR_TOLL)
    }
}

/// Parses and evaluates formula text in one step.
///
/// # Examples
///
/// ```
/// use freight_tariff_engine::formula::{FormulaContext, evaluate_formula};
/// use rust_decimal::Decimal;
///
/// let ctx = FormulaContext::for_tariff(Decimal::new(100, 0), Decimal::new(50, 0), Decimal::new(3, 0));
/// let total = evaluate_formula("Valor * Palets + Peaje", &ctx).unwrap();
/// assert_eq!(total, Decimal::new(350, 0));
/// ```
pub fn evaluate_formula(source: &str, ctx: &FormulaContext) -> Result<Decimal, FormulaError> {
    evaluate(&parse(source)?, ctx)
}

/// Evaluates an expression tree against `ctx`.
pub fn evaluate(expr: &Expr, ctx: &FormulaContext) -> Result<Decimal, FormulaError> {
    match expr {
        Expr::Num(value) => Ok(*value),
        Expr::Var(name) => ctx
            .get(name)
            .ok_or_else(|| FormulaError::UnknownVariable { name: name.clone() }),
        Expr::Neg(inner) => Ok(-evaluate(inner, ctx)?),
        Expr::BinOp { op, lhs, rhs } => {
            let lhs = evaluate(lhs, ctx)?;
            let rhs = evaluate(rhs, ctx)?;
            apply(*op, lhs, rhs)
        }
        Expr::Ternary {
            condition,
            when_true,
            when_false,
        } => {
            // Only the selected branch is evaluated.
            if evaluate(condition, ctx)?.is_zero() {
                evaluate(when_false, ctx)
            } else {
                evaluate(when_true, ctx)
            }
        }
    }
}

fn apply(op: BinaryOp, lhs: Decimal, rhs: Decimal) -> Result<Decimal, FormulaError> {
    let overflow = || FormulaError::Overflow {
        operation: op.symbol().to_string(),
    };
    match op {
        BinaryOp::Add => lhs.checked_add(rhs).ok_or_else(overflow),
        BinaryOp::Sub => lhs.checked_sub(rhs).ok_or_else(overflow),
        BinaryOp::Mul => lhs.checked_mul(rhs).ok_or_else(overflow),
        BinaryOp::Div => {
            if rhs.is_zero() {
                return Err(FormulaError::DivisionByZero);
            }
            lhs.checked_div(rhs).ok_or_else(overflow)
        }
        BinaryOp::Pow => {
            if lhs.is_zero() && rhs.is_sign_negative() && !rhs.is_zero() {
                return Err(FormulaError::DivisionByZero);
            }
            if lhs.is_sign_negative() && !lhs.is_zero() && !rhs.fract().is_zero() {
                return Err(FormulaError::NoRealResult {
                    base: lhs.to_string(),
                    exponent: rhs.to_string(),
                });
            }
            let result = if rhs.fract().is_zero() {
                rhs.to_i64().and_then(|exp| lhs.checked_powi(exp))
            } else {
                lhs.checked_powd(rhs)
            };
            result.ok_or_else(overflow)
        }
        BinaryOp::Compare(cmp) => {
            let holds = match cmp {
                Comparison::Eq => lhs == rhs,
                Comparison::Ne => lhs != rhs,
                Comparison::Lt => lhs < rhs,
                Comparison::Le => lhs <= rhs,
                Comparison::Gt => lhs > rhs,
                Comparison::Ge => lhs >= rhs,
            };
            Ok(if holds { Decimal::ONE } else { Decimal::ZERO })
        }
    }
}
