//! Validity intervals for time-versioned records.
//!
//! A [`Validity`] is the window during which a tariff or formula is
//! authoritative. Both bounds are inclusive; an absent end date means the
//! record is still active.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The validity window of a versioned record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Validity {
    /// First day the record applies.
    pub valid_from: NaiveDate,
    /// Last day the record applies, or `None` while still active.
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
}

impl Validity {
    /// Creates a validity window, rejecting an end date before the start date.
    ///
    /// # Examples
    ///
    /// ```
    /// use freight_tariff_engine::models::Validity;
    /// use chrono::NaiveDate;
    ///
    /// let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let to = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    /// assert!(Validity::new(from, Some(to)).is_err());
    /// assert!(Validity::new(from, None).is_ok());
    /// ```
    pub fn new(valid_from: NaiveDate, valid_to: Option<NaiveDate>) -> EngineResult<Self> {
        let validity = Self {
            valid_from,
            valid_to,
        };
        validity.check()?;
        Ok(validity)
    }

    /// Creates an open-ended validity window starting at `valid_from`.
    pub fn open(valid_from: NaiveDate) -> Self {
        Self {
            valid_from,
            valid_to: None,
        }
    }

    /// Verifies that the window is well formed.
    ///
    /// Records deserialized from storage bypass [`Validity::new`], so every
    /// consumer that depends on ordering calls this first.
    pub fn check(&self) -> EngineResult<()> {
        match self.valid_to {
            Some(valid_to) if self.valid_from > valid_to => Err(EngineError::MalformedInterval {
                valid_from: self.valid_from,
                valid_to,
            }),
            _ => Ok(()),
        }
    }

    /// Returns true if the window has no end date.
    pub fn is_open_ended(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Returns true if `date` falls inside the window (both bounds inclusive).
    ///
    /// # Examples
    ///
    /// ```
    /// use freight_tariff_engine::models::Validity;
    /// use chrono::NaiveDate;
    ///
    /// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
    /// let validity = Validity::new(d(1, 1), Some(d(12, 31))).unwrap();
    /// assert!(validity.contains(d(12, 31)));
    /// assert!(!Validity::open(d(6, 1)).contains(d(5, 31)));
    /// ```
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && self.valid_to.is_none_or(|to| date <= to)
    }
}

/// A record with an identity, a validity window and a uniqueness scope.
///
/// Two records with equal [`Versioned::scope_key`] must not have overlapping
/// validity windows.
pub trait Versioned {
    /// The persistence identity of the record.
    fn record_id(&self) -> &str;

    /// The record's validity window.
    fn validity(&self) -> &Validity;

    /// The key under which validity windows must be disjoint.
    fn scope_key(&self) -> String;
}
