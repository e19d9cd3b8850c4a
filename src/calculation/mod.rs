//! Calculation logic for the freight tariff engine.
//!
//! This module contains the validity overlap gate, the cascading tariff
//! and formula resolvers, and the calculator that turns a resolved tariff
//! into a rounded monetary breakdown.

mod formula_resolver;
mod interval_overlap;
mod tariff_calculator;
mod tariff_resolver;

pub use formula_resolver::{FormulaResolution, FormulaResolver};
pub use interval_overlap::{check_interval, overlaps, validate_no_overlap};
pub use tariff_calculator::{
    DISTANCE_EXPRESSION, FLAT_EXPRESSION, FORMULA_FALLBACK_WARNING, PER_UNIT_EXPRESSION,
    PER_UNIT_SAFETY_NET_WARNING, TariffCalculator,
};
pub use tariff_resolver::{TariffQuery, TariffResolution, find_tariff, resolve_tariff};
