//! Tariff record resolution.
//!
//! This module selects the single applicable tariff record for a route,
//! kind and billing date from a history of possibly overlapping versions.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, TariffKind, TariffRecord, TariffStore, TariffTier};

/// What the caller is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TariffQuery<'q> {
    /// Full or partial route pricing.
    pub kind: TariffKind,
    /// The date being billed.
    pub billing_date: NaiveDate,
    /// A record pinned by the caller.
    pub explicit_tariff_id: Option<&'q str>,
    /// Permit expired records as a fallback.
    pub allow_non_current: bool,
}

/// The result of a tariff resolution, including the record and audit step.
#[derive(Debug, Clone)]
pub struct TariffResolution<'a> {
    /// The selected record.
    pub record: &'a TariffRecord,
    /// The tier that selected it.
    pub tier: TariffTier,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Selects the applicable tariff record, if any.
///
/// Tiers, first hit wins:
/// 1. an explicit id when non-current tariffs are allowed (any date, any kind)
/// 2. a record of the kind whose validity contains the billing date; among
///    several, the latest `valid_from`
/// 3. when non-current tariffs are allowed, the record of the kind with the
///    latest `valid_from` on or before the billing date
///
/// `Ok(None)` is the ordinary "no rate for this route/date" outcome.
///
/// # Errors
///
/// Returns `ExplicitTariffNotFound` if tier 1 applies and the id is not on
/// the route.
pub fn find_tariff<'a, S>(
    store: &'a S,
    query: &TariffQuery<'_>,
) -> EngineResult<Option<(&'a TariffRecord, TariffTier)>>
where
    S: TariffStore,
{
    if let Some(tariff_id) = query.explicit_tariff_id {
        if query.allow_non_current {
            return store
                .find_tariff(tariff_id)
                .map(|record| Some((record, TariffTier::Explicit)))
                .ok_or_else(|| EngineError::ExplicitTariffNotFound {
                    route_id: store.route_id().to_string(),
                    tariff_id: tariff_id.to_string(),
                });
        }
        debug!(
            route_id = %store.route_id(),
            tariff_id = %tariff_id,
            "Explicit tariff ignored; non-current tariffs not allowed"
        );
    }

    let found = current_tariff(store, query.kind, query.billing_date)
        .map(|record| (record, TariffTier::Current))
        .or_else(|| {
            query
                .allow_non_current
                .then(|| historical_tariff(store, query.kind, query.billing_date))
                .flatten()
                .map(|record| (record, TariffTier::Historical))
        });

    Ok(found)
}

fn current_tariff<S>(store: &S, kind: TariffKind, date: NaiveDate) -> Option<&TariffRecord>
where
    S: TariffStore,
{
    store
        .tariffs_of_kind(kind)
        .filter(|record| record.validity.contains(date))
        .max_by_key(|record| record.validity.valid_from)
}

fn historical_tariff<S>(store: &S, kind: TariffKind, date: NaiveDate) -> Option<&TariffRecord>
where
    S: TariffStore,
{
    store
        .tariffs_of_kind(kind)
        .filter(|record| record.validity.valid_from <= date)
        .max_by_key(|record| record.validity.valid_from)
}

/// Resolves the applicable tariff record or fails with `TariffNotFound`.
///
/// # Arguments
///
/// * `store` - The route's tariff history
/// * `query` - Kind, billing date and fallback options
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use freight_tariff_engine::calculation::{TariffQuery, resolve_tariff};
/// use freight_tariff_engine::models::{
///     CalculationMethod, Route, TariffKind, TariffRecord, TariffTier, Validity,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
/// let route = Route {
///     id: "R-1".to_string(),
///     origin: "A".to_string(),
///     destination: "B".to_string(),
///     client_id: "C-1".to_string(),
///     distance_km: None,
///     tariff_records: vec![TariffRecord {
///         id: "T-1".to_string(),
///         route_id: "R-1".to_string(),
///         kind: TariffKind::FullRoute,
///         calculation_method: CalculationMethod::Flat,
///         base_value: Decimal::new(900, 0),
///         toll_value: Decimal::ZERO,
///         validity: Validity::new(d(2024, 1, 1), Some(d(2024, 12, 31))).unwrap(),
///     }],
/// };
///
/// let query = TariffQuery {
///     kind: TariffKind::FullRoute,
///     billing_date: d(2024, 6, 1),
///     explicit_tariff_id: None,
///     allow_non_current: false,
/// };
/// let resolution = resolve_tariff(&route, &query, 1).unwrap();
/// assert_eq!(resolution.record.id, "T-1");
/// assert_eq!(resolution.tier, TariffTier::Current);
/// ```
pub fn resolve_tariff<'a, S>(
    store: &'a S,
    query: &TariffQuery<'_>,
    step_number: u32,
) -> EngineResult<TariffResolution<'a>>
where
    S: TariffStore,
{
    let (record, tier) =
        find_tariff(store, query)?.ok_or_else(|| EngineError::TariffNotFound {
            route_id: store.route_id().to_string(),
            kind: query.kind,
            date: query.billing_date,
        })?;

    debug!(
        route_id = %store.route_id(),
        tariff_id = %record.id,
        tier = ?tier,
        "Tariff resolved"
    );

    let audit_step = AuditStep {
        step_number,
        rule_id: "tariff_resolution".to_string(),
        rule_name: "Tariff Resolution".to_string(),
        input: serde_json::json!({
            "route_id": store.route_id(),
            "kind": query.kind.code(),
            "billing_date": query.billing_date.to_string(),
            "explicit_tariff_id": query.explicit_tariff_id,
            "allow_non_current": query.allow_non_current,
            "candidates": store.tariffs_of_kind(query.kind).count()
        }),
        output: serde_json::json!({
            "tariff_id": record.id,
            "tier": tier,
            "valid_from": record.validity.valid_from.to_string(),
            "valid_to": record.validity.valid_to.map(|d| d.to_string()),
            "open_ended": record.validity.is_open_ended()
        }),
        reasoning: match tier {
            TariffTier::Explicit => format!("Using explicitly requested tariff '{}'", record.id),
            TariffTier::Current => format!(
                "Tariff '{}' is valid on {}",
                record.id, query.billing_date
            ),
            TariffTier::Historical => format!(
                "No {} tariff valid on {}; using most recent tariff '{}' from {}",
                query.kind, query.billing_date, record.id, record.validity.valid_from
            ),
        },
    };

    Ok(TariffResolution {
        record,
        tier,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalculationMethod, Route, Validity};
    use rust_decimal::Decimal;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(id: &str, kind: TariffKind, from: &str, to: Option<&str>) -> TariffRecord {
        TariffRecord {
            id: id.to_string(),
            route_id: "R-1".to_string(),
            kind,
            calculation_method: CalculationMethod::Flat,
            base_value: Decimal::ONE_HUNDRED,
            toll_value: Decimal::ZERO,
            validity: Validity {
                valid_from: date(from),
                valid_to: to.map(date),
            },
        }
    }

    fn route(records: Vec<TariffRecord>) -> Route {
        Route {
            id: "R-1".to_string(),
            origin: "SANTIAGO".to_string(),
            destination: "ANTOFAGASTA".to_string(),
            client_id: "C-1".to_string(),
            distance_km: None,
            tariff_records: records,
        }
    }

    fn query(billing_date: &str, allow_non_current: bool) -> TariffQuery<'static> {
        TariffQuery {
            kind: TariffKind::FullRoute,
            billing_date: date(billing_date),
            explicit_tariff_id: None,
            allow_non_current,
        }
    }

    #[test]
    fn test_current_record_is_selected() {
        let route = route(vec![
            record("T-2023", TariffKind::FullRoute, "2023-01-01", Some("2023-12-31")),
            record("T-2024", TariffKind::FullRoute, "2024-01-01", None),
        ]);
        let resolution = resolve_tariff(&route, &query("2024-06-01", false), 1).unwrap();
        assert_eq!(resolution.record.id, "T-2024");
        assert_eq!(resolution.tier, TariffTier::Current);
        assert_eq!(resolution.audit_step.rule_id, "tariff_resolution");
        assert_eq!(resolution.audit_step.output["tier"], "current");
    }

    #[test]
    fn test_validity_bounds_are_inclusive() {
        let route = route(vec![record(
            "T-1",
            TariffKind::FullRoute,
            "2024-01-01",
            Some("2024-12-31"),
        )]);
        assert!(find_tariff(&route, &query("2024-01-01", false)).unwrap().is_some());
        assert!(find_tariff(&route, &query("2024-12-31", false)).unwrap().is_some());
        assert!(find_tariff(&route, &query("2025-01-01", false)).unwrap().is_none());
    }

    #[test]
    fn test_other_kind_is_ignored() {
        let route = route(vec![record("T-1", TariffKind::PartialRoute, "2024-01-01", None)]);
        assert!(find_tariff(&route, &query("2024-06-01", true)).unwrap().is_none());
    }

    #[test]
    fn test_overlapping_legacy_records_pick_latest_start() {
        let route = route(vec![
            record("T-old", TariffKind::FullRoute, "2023-01-01", None),
            record("T-new", TariffKind::FullRoute, "2024-03-01", None),
            record("T-mid", TariffKind::FullRoute, "2023-06-01", Some("2024-12-31")),
        ]);
        let (record, tier) = find_tariff(&route, &query("2024-06-01", false))
            .unwrap()
            .unwrap();
        assert_eq!(record.id, "T-new");
        assert_eq!(tier, TariffTier::Current);
    }

    #[test]
    fn test_expired_only_is_not_found_without_fallback() {
        let route = route(vec![record(
            "T-1",
            TariffKind::FullRoute,
            "2023-01-01",
            Some("2023-12-31"),
        )]);
        match resolve_tariff(&route, &query("2024-06-01", false), 1) {
            Err(EngineError::TariffNotFound {
                route_id,
                kind,
                date: d,
            }) => {
                assert_eq!(route_id, "R-1");
                assert_eq!(kind, TariffKind::FullRoute);
                assert_eq!(d, date("2024-06-01"));
            }
            other => panic!("Expected TariffNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_record_used_with_fallback() {
        let route = route(vec![
            record("T-2022", TariffKind::FullRoute, "2022-01-01", Some("2022-12-31")),
            record("T-2023", TariffKind::FullRoute, "2023-01-01", Some("2023-12-31")),
            record("T-2026", TariffKind::FullRoute, "2026-01-01", None),
        ]);
        let resolution = resolve_tariff(&route, &query("2024-06-01", true), 3).unwrap();
        assert_eq!(resolution.record.id, "T-2023");
        assert_eq!(resolution.tier, TariffTier::Historical);
        assert_eq!(resolution.audit_step.step_number, 3);
        assert_eq!(resolution.audit_step.output["open_ended"], false);
        assert!(resolution.audit_step.reasoning.contains("most recent"));
    }

    #[test]
    fn test_future_records_never_match() {
        let route = route(vec![record("T-2026", TariffKind::FullRoute, "2026-01-01", None)]);
        assert!(find_tariff(&route, &query("2024-06-01", true)).unwrap().is_none());
    }

    #[test]
    fn test_explicit_id_with_non_current_ignores_date_and_kind() {
        let route = route(vec![
            record("T-1", TariffKind::PartialRoute, "2020-01-01", Some("2020-12-31")),
            record("T-2", TariffKind::FullRoute, "2024-01-01", None),
        ]);
        let mut q = query("2024-06-01", true);
        q.explicit_tariff_id = Some("T-1");
        let (record, tier) = find_tariff(&route, &q).unwrap().unwrap();
        assert_eq!(record.id, "T-1");
        assert_eq!(tier, TariffTier::Explicit);
    }

    #[test]
    fn test_explicit_id_missing_is_an_error() {
        let route = route(vec![record("T-1", TariffKind::FullRoute, "2024-01-01", None)]);
        let mut q = query("2024-06-01", true);
        q.explicit_tariff_id = Some("T-404");
        match find_tariff(&route, &q) {
            Err(EngineError::ExplicitTariffNotFound { tariff_id, .. }) => {
                assert_eq!(tariff_id, "T-404")
            }
            other => panic!("Expected ExplicitTariffNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_id_without_non_current_falls_through() {
        let route = route(vec![
            record("T-1", TariffKind::FullRoute, "2020-01-01", Some("2020-12-31")),
            record("T-2", TariffKind::FullRoute, "2024-01-01", None),
        ]);
        let mut q = query("2024-06-01", false);
        q.explicit_tariff_id = Some("T-1");
        let (record, tier) = find_tariff(&route, &q).unwrap().unwrap();
        assert_eq!(record.id, "T-2");
        assert_eq!(tier, TariffTier::Current);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let route = route(vec![
            record("T-a", TariffKind::FullRoute, "2023-01-01", Some("2023-12-31")),
            record("T-b", TariffKind::FullRoute, "2024-01-01", Some("2024-12-31")),
        ]);
        let q = query("2024-06-01", false);
        let first = find_tariff(&route, &q).unwrap().map(|(r, _)| r.id.clone());
        for _ in 0..10 {
            let again = find_tariff(&route, &q).unwrap().map(|(r, _)| r.id.clone());
            assert_eq!(again, first);
        }
    }
}
