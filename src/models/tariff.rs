//! Tariff record model and related types.
//!
//! A [`TariffRecord`] is one time-versioned rate attached to a route. A route
//! normally holds a history of records per kind and calculation method.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Validity;
use super::validity::Versioned;

/// The route-tariff variant a record prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TariffKind {
    /// Full route pricing ("TRMC").
    #[serde(rename = "TRMC")]
    FullRoute,
    /// Partial route pricing ("TRMI").
    #[serde(rename = "TRMI")]
    PartialRoute,
}

impl TariffKind {
    /// Returns the domain tag for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            TariffKind::FullRoute => "TRMC",
            TariffKind::PartialRoute => "TRMI",
        }
    }
}

impl fmt::Display for TariffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// How a tariff's base amount is derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// Base value per kilometre of route distance.
    Distance,
    /// Base value as a fixed amount.
    Flat,
    /// Base value per unit (e.g. pallet).
    PerUnit,
    /// Client pricing formula; carries the persisted method label.
    Custom(String),
}

impl CalculationMethod {
    /// Returns a stable label for audit output.
    pub fn label(&self) -> &str {
        match self {
            CalculationMethod::Distance => "distance",
            CalculationMethod::Flat => "flat",
            CalculationMethod::PerUnit => "per_unit",
            CalculationMethod::Custom(label) => label,
        }
    }

    /// Returns true for the formula-driven method.
    pub fn is_custom(&self) -> bool {
        matches!(self, CalculationMethod::Custom(_))
    }
}

/// A time-versioned tariff belonging to exactly one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffRecord {
    /// Persistence identity of the record.
    pub id: String,
    /// The route this record belongs to.
    pub route_id: String,
    /// Full or partial route pricing.
    pub kind: TariffKind,
    /// How the base amount is calculated.
    pub calculation_method: CalculationMethod,
    /// Rate or amount, interpreted according to the calculation method.
    pub base_value: Decimal,
    /// Toll amount added on top of the base.
    #[serde(default)]
    pub toll_value: Decimal,
    /// The window during which the record applies.
    #[serde(flatten)]
    pub validity: Validity,
}

impl Versioned for TariffRecord {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    fn scope_key(&self) -> String {
        format!(
            "route {} / {} / {}",
            self.route_id,
            self.kind,
            self.calculation_method.label()
        )
    }
}
