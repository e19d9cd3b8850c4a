//! Pricing formula language.
//!
//! Client formulas are small spreadsheet-style expressions over the
//! variables `Valor`, `Peaje` and `Palets`, with arithmetic (`+ - * / ^`),
//! parentheses, comparisons and a single conditional primitive
//! `SI(condition; when_true; when_false)`.
//!
//! Formulas go through a tokenizer, a recursive-descent parser producing an
//! [`Expr`] tree, and a tree-walking evaluator. Nothing in the pipeline can
//! reach host state; unknown identifiers and unsupported syntax are errors.
//!
//! # Example
//!
//! ```
//! use freight_tariff_engine::formula::{Formula, FormulaContext};
//! use rust_decimal::Decimal;
//!
//! let formula = Formula::parse("SI(Palets > 10; Valor * 0,9; Valor) * Palets + Peaje").unwrap();
//! let ctx = FormulaContext::for_tariff(Decimal::new(100, 0), Decimal::new(50, 0), Decimal::new(12, 0));
//! assert_eq!(formula.evaluate(&ctx).unwrap(), Decimal::new(1130, 0));
//! ```

mod ast;
mod evaluator;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Expr};
pub use evaluator::{
    Formula, FormulaContext, VAR_BASE_VALUE, VAR_QUANTITY, VAR_TOLL, evaluate, evaluate_formula,
};
pub use lexer::{Comparison, Spanned, Token, tokenize};
pub use parser::{CONDITIONAL_KEYWORD, MAX_NESTING_DEPTH, parse};
