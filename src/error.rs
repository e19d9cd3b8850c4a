//! Error types for the freight tariff engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during tariff resolution,
//! formula evaluation and overlap validation.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::TariffKind;

/// The main error type for the freight tariff engine.
///
/// # Example
///
/// ```
/// use freight_tariff_engine::error::EngineError;
///
/// let error = EngineError::MissingDistance {
///     route_id: "R-100".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Route 'R-100' has no computed distance for a distance-based tariff"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or failed validation.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No tariff record applies to the route, kind and date.
    #[error("No {kind} tariff found for route '{route_id}' on date {date}")]
    TariffNotFound {
        /// The route that was searched.
        route_id: String,
        /// The requested tariff kind.
        kind: TariffKind,
        /// The billing date.
        date: NaiveDate,
    },

    /// An explicitly requested tariff id does not belong to the route.
    #[error("Tariff '{tariff_id}' does not exist on route '{route_id}'")]
    ExplicitTariffNotFound {
        /// The route that was searched.
        route_id: String,
        /// The requested tariff id.
        tariff_id: String,
    },

    /// A candidate validity interval overlaps an existing record in the same scope.
    #[error(
        "Validity {candidate_from}..{} overlaps record '{conflicting_id}' ({conflicting_from}..{}) in scope '{scope}'",
        fmt_open(.candidate_to),
        fmt_open(.conflicting_to)
    )]
    OverlapConflict {
        /// The scope key shared by both records.
        scope: String,
        /// Start of the rejected interval.
        candidate_from: NaiveDate,
        /// End of the rejected interval (`None` = open-ended).
        candidate_to: Option<NaiveDate>,
        /// Identity of the existing record it collides with.
        conflicting_id: String,
        /// Start of the existing record's interval.
        conflicting_from: NaiveDate,
        /// End of the existing record's interval (`None` = open-ended).
        conflicting_to: Option<NaiveDate>,
    },

    /// A distance-based tariff was applied to a route without a distance.
    #[error("Route '{route_id}' has no computed distance for a distance-based tariff")]
    MissingDistance {
        /// The route lacking a distance.
        route_id: String,
    },

    /// A billed amount left the representable decimal range.
    #[error("Amount for tariff '{tariff_id}' overflows computing {operation}")]
    AmountOverflow {
        /// The tariff being billed.
        tariff_id: String,
        /// The arithmetic step that overflowed, e.g. `base x quantity`.
        operation: String,
    },

    /// A validity interval ends before it starts.
    #[error("Malformed validity interval: {valid_from} is after {valid_to}")]
    MalformedInterval {
        /// The interval start.
        valid_from: NaiveDate,
        /// The interval end.
        valid_to: NaiveDate,
    },

    /// A pricing formula could not be evaluated.
    ///
    /// The calculator records this as a fallback warning and never returns it
    /// from a calculation.
    #[error("Formula '{formula}' could not be evaluated: {source}")]
    Evaluation {
        /// The formula text.
        formula: String,
        /// The underlying interpreter error.
        #[source]
        source: FormulaError,
    },
}

fn fmt_open(date: &Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.to_string(),
        None => "open".to_string(),
    }
}

/// Errors raised while tokenizing, parsing or evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// The formula is empty or whitespace only.
    #[error("formula is empty")]
    Empty,

    /// A character outside the formula alphabet was found.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// Byte offset in the formula.
        position: usize,
    },

    /// A numeric literal could not be represented.
    #[error("invalid number '{literal}'")]
    InvalidNumber {
        /// The literal text.
        literal: String,
    },

    /// The parser found a token it did not expect.
    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken {
        /// Display form of the token.
        found: String,
        /// Byte offset in the formula.
        position: usize,
    },

    /// The formula ended in the middle of an expression.
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// Parentheses do not balance.
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    /// `SI` was called with the wrong number of arguments.
    #[error("SI expects 3 arguments, found {found}")]
    ConditionalArity {
        /// Number of arguments supplied.
        found: usize,
    },

    /// An identifier is not a bound variable.
    #[error("unknown variable '{name}'")]
    UnknownVariable {
        /// The identifier.
        name: String,
    },

    /// Nesting exceeds the parser's depth limit.
    #[error("formula nesting exceeds {limit} levels")]
    TooDeep {
        /// The depth limit.
        limit: usize,
    },

    /// A power of a negative base with a fractional exponent.
    #[error("'{base} ^ {exponent}' has no real result")]
    NoRealResult {
        /// The negative base.
        base: String,
        /// The fractional exponent.
        exponent: String,
    },

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A result could not be represented as a finite decimal.
    #[error("arithmetic overflow in '{operation}'")]
    Overflow {
        /// The operator that overflowed.
        operation: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
