//! Validity interval overlap detection.
//!
//! This module provides the overlap predicate for validity windows and the
//! creation-time gate that keeps versioned records in one scope disjoint.
//! The gate only checks; callers must run check-then-insert inside a
//! serializable transaction (or equivalent lock) keyed by the scope.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{Validity, Versioned};

/// Stand-in end date for open-ended windows. Never leaves this module.
const OPEN_END: NaiveDate = NaiveDate::MAX;

fn normalized_end(validity: &Validity) -> NaiveDate {
    validity.valid_to.unwrap_or(OPEN_END)
}

/// Returns true if two validity windows share at least one day.
///
/// Both bounds are inclusive, so a window ending on the day another begins
/// overlaps it. Open-ended windows extend indefinitely.
///
/// # Errors
///
/// Returns `MalformedInterval` if either window ends before it starts.
///
/// # Examples
///
/// ```
/// use freight_tariff_engine::calculation::overlaps;
/// use freight_tariff_engine::models::Validity;
/// use chrono::NaiveDate;
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
/// let first = Validity::new(d(1, 1), Some(d(3, 31))).unwrap();
/// let touching = Validity::new(d(3, 31), Some(d(6, 30))).unwrap();
/// let later = Validity::open(d(7, 1));
///
/// assert!(overlaps(&first, &touching).unwrap());
/// assert!(!overlaps(&first, &later).unwrap());
/// ```
pub fn overlaps(a: &Validity, b: &Validity) -> EngineResult<bool> {
    a.check()?;
    b.check()?;
    Ok(a.valid_from <= normalized_end(b) && b.valid_from <= normalized_end(a))
}

/// Checks a candidate window against existing windows sharing `scope`.
///
/// `existing` yields `(record_id, validity)` pairs. The first overlapping
/// record is reported in an `OverlapConflict`.
pub fn check_interval<'a>(
    candidate: &Validity,
    existing: impl IntoIterator<Item = (&'a str, &'a Validity)>,
    scope: &str,
) -> EngineResult<()> {
    candidate.check()?;

    for (record_id, validity) in existing {
        if overlaps(candidate, validity)? {
            debug!(
                scope = %scope,
                conflicting_id = %record_id,
                "Validity window overlaps an existing record"
            );
            return Err(EngineError::OverlapConflict {
                scope: scope.to_string(),
                candidate_from: candidate.valid_from,
                candidate_to: candidate.valid_to,
                conflicting_id: record_id.to_string(),
                conflicting_from: validity.valid_from,
                conflicting_to: validity.valid_to,
            });
        }
    }

    Ok(())
}

/// Verifies that `candidate` can be stored alongside `existing`.
///
/// Only records with the same [`Versioned::scope_key`] are compared, and a
/// record with the candidate's own id is skipped so updates do not collide
/// with the version they replace.
///
/// # Errors
///
/// - `MalformedInterval` if the candidate (or a compared record) ends before
///   it starts; this is checked before any overlap test
/// - `OverlapConflict` naming the first conflicting record
pub fn validate_no_overlap<'a, T>(
    candidate: &T,
    existing: impl IntoIterator<Item = &'a T>,
) -> EngineResult<()>
where
    T: Versioned + 'a,
{
    let scope = candidate.scope_key();
    let peers = existing
        .into_iter()
        .filter(|record| record.record_id() != candidate.record_id())
        .filter(|record| record.scope_key() == scope)
        .map(|record| (record.record_id(), record.validity()));

    check_interval(candidate.validity(), peers, &scope)
}
