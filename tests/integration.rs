//! Integration tests for the freight tariff engine.
//!
//! This test suite covers:
//! - The end-to-end distance scenario through the engine and over HTTP
//! - Tariff resolution tiers (current, historical, explicit)
//! - Client formula resolution and evaluation
//! - Formula fallback diagnostics
//! - Overlap validation for tariffs and formulas
//! - Error cases

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;

use freight_tariff_engine::api::{AppState, create_router};
use freight_tariff_engine::config::ConfigLoader;
use freight_tariff_engine::engine::TariffEngine;
use freight_tariff_engine::error::EngineError;
use freight_tariff_engine::models::{
    CalculationMethod, CalculationRequest, Route, TariffKind, TariffRecord, TariffTier, Validity,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn create_engine() -> TariffEngine {
    let loader = ConfigLoader::load("./config/freight").expect("Failed to load config");
    TariffEngine::from_loader(loader)
}

fn create_router_for_test() -> Router {
    create_router(AppState::new(create_engine()))
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

fn tariff_json(
    id: &str,
    method: Value,
    base_value: &str,
    toll_value: &str,
    valid_from: &str,
    valid_to: Option<&str>,
) -> Value {
    json!({
        "id": id,
        "route_id": "R",
        "kind": "TRMC",
        "calculation_method": method,
        "base_value": base_value,
        "toll_value": toll_value,
        "valid_from": valid_from,
        "valid_to": valid_to
    })
}

fn formula_json(id: &str, unit_type: &str, expression: &str, valid_from: &str) -> Value {
    json!({
        "id": id,
        "client_id": "C-1",
        "unit_type": unit_type,
        "expression": expression,
        "valid_from": valid_from
    })
}

fn calculate_body(
    tariffs: Vec<Value>,
    formulas: Vec<Value>,
    billing_date: &str,
    quantity: &str,
) -> Value {
    json!({
        "route": {
            "id": "R",
            "origin": "SANTIAGO",
            "destination": "RANCAGUA",
            "client_id": "C-1",
            "distance_km": "120",
            "tariff_records": tariffs
        },
        "formulas": formulas,
        "billing_date": billing_date,
        "kind": "TRMC",
        "unit_type": "Sider",
        "quantity": quantity
    })
}

fn assert_amount(result: &Value, field: &str, expected: &str) {
    let actual = result[field].as_str().unwrap();
    assert_eq!(
        decimal(actual).normalize(),
        decimal(expected).normalize(),
        "Expected {} {}, got {}",
        field,
        expected,
        actual
    );
}

// =============================================================================
// SECTION 1: End-to-end scenario
// =============================================================================

#[test]
fn test_distance_scenario_through_engine() {
    let route = Route {
        id: "R".to_string(),
        origin: "SANTIAGO".to_string(),
        destination: "RANCAGUA".to_string(),
        client_id: "C-1".to_string(),
        distance_km: Some(decimal("120")),
        tariff_records: vec![TariffRecord {
            id: "T-1".to_string(),
            route_id: "R".to_string(),
            kind: TariffKind::FullRoute,
            calculation_method: CalculationMethod::Distance,
            base_value: decimal("10"),
            toll_value: decimal("500"),
            validity: Validity::new(date("2024-01-01"), Some(date("2024-12-31"))).unwrap(),
        }],
    };
    let request = CalculationRequest {
        route,
        billing_date: date("2024-06-01"),
        kind: TariffKind::FullRoute,
        explicit_tariff_id: None,
        unit_type: "General".to_string(),
        quantity: decimal("99"),
        allow_non_current: false,
    };

    let result = create_engine().resolve_and_calculate(&request, &[]).unwrap();
    assert_eq!(result.base_amount, decimal("1200.00"));
    assert_eq!(result.toll_amount, decimal("500.00"));
    assert_eq!(result.total, decimal("1700.00"));
    assert_eq!(result.tariff_tier, Some(TariffTier::Current));
}

#[tokio::test]
async fn test_distance_scenario_over_http() {
    let body = calculate_body(
        vec![tariff_json(
            "T-1",
            json!("distance"),
            "10",
            "500",
            "2024-01-01",
            Some("2024-12-31"),
        )],
        vec![],
        "2024-06-01",
        "1",
    );

    let (status, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_amount(&result, "base_amount", "1200.00");
    assert_amount(&result, "toll_amount", "500.00");
    assert_amount(&result, "total", "1700.00");
    assert_eq!(result["resolved_tariff_id"], "T-1");
    assert_eq!(result["tariff_tier"], "current");
    assert_eq!(result["method"], "distance");
    assert!(result["calculation_id"].is_string());
    assert_eq!(result["audit_trace"]["steps"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_validity_end_date_is_inclusive() {
    let body = calculate_body(
        vec![tariff_json(
            "T-1",
            json!("flat"),
            "900",
            "0",
            "2024-01-01",
            Some("2024-12-31"),
        )],
        vec![],
        "2024-12-31",
        "1",
    );

    let (status, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_amount(&result, "total", "900");
}

// =============================================================================
// SECTION 2: Tariff resolution tiers
// =============================================================================

#[tokio::test]
async fn test_latest_current_record_wins() {
    let body = calculate_body(
        vec![
            tariff_json("T-1", json!("flat"), "800", "0", "2024-01-01", None),
            tariff_json("T-2", json!("flat"), "950", "0", "2024-05-01", None),
        ],
        vec![],
        "2024-06-01",
        "1",
    );

    let (_, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(result["resolved_tariff_id"], "T-2");
    assert_amount(&result, "total", "950");
}

#[tokio::test]
async fn test_expired_record_needs_allow_non_current() {
    let tariffs = vec![tariff_json(
        "T-old",
        json!("per_unit"),
        "20",
        "5",
        "2023-01-01",
        Some("2023-12-31"),
    )];

    let body = calculate_body(tariffs.clone(), vec![], "2024-06-01", "3");
    let (status, error) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "TARIFF_NOT_FOUND");

    let mut body = calculate_body(tariffs, vec![], "2024-06-01", "3");
    body["allow_non_current"] = json!(true);
    let (status, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["tariff_tier"], "historical");
    assert_amount(&result, "total", "65");
}

#[tokio::test]
async fn test_explicit_tariff_pins_record() {
    let mut body = calculate_body(
        vec![
            tariff_json("T-old", json!("flat"), "700", "0", "2023-01-01", Some("2023-12-31")),
            tariff_json("T-new", json!("flat"), "900", "0", "2024-01-01", None),
        ],
        vec![],
        "2024-06-01",
        "1",
    );
    body["explicit_tariff_id"] = json!("T-old");

    let (_, result) = post_json(create_router_for_test(), "/calculate", body.clone()).await;
    assert_eq!(result["resolved_tariff_id"], "T-new");

    body["allow_non_current"] = json!(true);
    let (_, result) = post_json(create_router_for_test(), "/calculate", body.clone()).await;
    assert_eq!(result["resolved_tariff_id"], "T-old");
    assert_eq!(result["tariff_tier"], "explicit");

    body["explicit_tariff_id"] = json!("T-missing");
    let (status, error) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error["message"].as_str().unwrap().contains("T-missing"));
}

// =============================================================================
// SECTION 3: Client formulas
// =============================================================================

#[tokio::test]
async fn test_conditional_client_formula() {
    let tariffs = vec![tariff_json(
        "T-1",
        json!({ "custom": "formula" }),
        "100",
        "50",
        "2024-01-01",
        None,
    )];
    let formulas = vec![formula_json(
        "F-1",
        "Sider",
        "SI(Palets>10; Valor*0,9; Valor) * Palets + Peaje",
        "2024-01-01",
    )];

    let body = calculate_body(tariffs.clone(), formulas.clone(), "2024-06-01", "12");
    let (status, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_amount(&result, "total", "1130");
    assert_amount(&result, "toll_amount", "50");
    assert_eq!(result["formula_tier"], "exact_unit_type");

    let body = calculate_body(tariffs, formulas, "2024-06-01", "10");
    let (_, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_amount(&result, "total", "1050");
}

#[tokio::test]
async fn test_general_formula_fallback() {
    let tariffs = vec![tariff_json(
        "T-1",
        json!({ "custom": "formula" }),
        "100",
        "50",
        "2024-01-01",
        None,
    )];
    let formulas = vec![
        formula_json("F-gen", "General", "(Valor + Peaje) * Palets", "2024-01-01"),
        formula_json("F-bitren", "Bitren", "Valor", "2024-01-01"),
    ];

    let body = calculate_body(tariffs, formulas, "2024-06-01", "2");
    let (_, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(result["formula_tier"], "general");
    assert_eq!(result["formula_used"], "(Valor + Peaje) * Palets");
    assert_amount(&result, "total", "300");
    assert_amount(&result, "toll_amount", "0");
}

#[tokio::test]
async fn test_malformed_formula_records_fallback_warning() {
    let tariffs = vec![tariff_json(
        "T-1",
        json!({ "custom": "formula" }),
        "100",
        "50",
        "2024-01-01",
        None,
    )];
    let formulas = vec![formula_json("F-1", "Sider", "Valor * (Palets", "2024-01-01")];

    let body = calculate_body(tariffs, formulas, "2024-06-01", "3");
    let (status, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_amount(&result, "total", "350");
    assert_eq!(result["formula_used"], "Valor * Palets + Peaje");

    let warnings = result["audit_trace"]["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["code"], "FORMULA_FALLBACK");
}

#[tokio::test]
async fn test_per_unit_rounding() {
    let body = calculate_body(
        vec![tariff_json("T-1", json!("per_unit"), "33.335", "0", "2024-01-01", None)],
        vec![],
        "2024-06-01",
        "2",
    );

    let (_, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_amount(&result, "base_amount", "66.67");
    assert_amount(&result, "total", "66.67");
}

#[tokio::test]
async fn test_long_formula_falls_back_without_crashing() {
    let tariffs = vec![tariff_json(
        "T-1",
        json!({ "custom": "formula" }),
        "100",
        "50",
        "2024-01-01",
        None,
    )];
    let long_sum = vec!["1"; 5_000].join("+");
    let formulas = vec![formula_json("F-1", "Sider", &long_sum, "2024-01-01")];

    let body = calculate_body(tariffs, formulas, "2024-06-01", "3");
    let (status, result) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_amount(&result, "total", "350");
    assert_eq!(result["audit_trace"]["warnings"][0]["code"], "FORMULA_FALLBACK");
}

#[tokio::test]
async fn test_amount_overflow_is_422() {
    let body = calculate_body(
        vec![tariff_json(
            "T-1",
            json!("per_unit"),
            "10000000000000000000000000000",
            "0",
            "2024-01-01",
            None,
        )],
        vec![],
        "2024-06-01",
        "10",
    );

    let (status, error) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "AMOUNT_OVERFLOW");
}

// =============================================================================
// SECTION 4: Overlap validation
// =============================================================================

#[tokio::test]
async fn test_overlapping_tariff_is_rejected() {
    let body = json!({
        "candidate": tariff_json("T-2", json!("distance"), "12", "0", "2024-12-31", None),
        "existing": [
            tariff_json("T-1", json!("distance"), "10", "0", "2024-01-01", Some("2024-12-31"))
        ]
    });

    let (status, error) = post_json(create_router_for_test(), "/validate-overlap", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "OVERLAP_CONFLICT");
    assert!(error["details"].as_str().unwrap().contains("T-1"));
}

#[tokio::test]
async fn test_tariff_with_other_method_is_accepted() {
    let body = json!({
        "candidate": tariff_json("T-2", json!("flat"), "900", "0", "2024-06-01", None),
        "existing": [
            tariff_json("T-1", json!("distance"), "10", "0", "2024-01-01", None)
        ]
    });

    let (status, result) = post_json(create_router_for_test(), "/validate-overlap", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["valid"], true);
}

#[tokio::test]
async fn test_malformed_candidate_interval_is_422() {
    let body = json!({
        "candidate": {
            "id": "F-2",
            "client_id": "C-1",
            "unit_type": "Sider",
            "expression": "Valor",
            "valid_from": "2024-06-01",
            "valid_to": "2024-05-01"
        },
        "existing": []
    });

    let (status, error) = post_json(create_router_for_test(), "/validate-overlap", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "MALFORMED_INTERVAL");
}

// =============================================================================
// SECTION 5: Error cases
// =============================================================================

#[tokio::test]
async fn test_distance_tariff_without_distance_is_422() {
    let mut body = calculate_body(
        vec![tariff_json("T-1", json!("distance"), "10", "0", "2024-01-01", None)],
        vec![],
        "2024-06-01",
        "1",
    );
    body["route"]["distance_km"] = Value::Null;

    let (status, error) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "MISSING_DISTANCE");
}

#[tokio::test]
async fn test_unknown_kind_is_malformed_json() {
    let mut body = calculate_body(vec![], vec![], "2024-06-01", "1");
    body["kind"] = json!("TRMX");

    let (status, error) = post_json(create_router_for_test(), "/calculate", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MALFORMED_JSON");
}

#[test]
fn test_partial_route_kind_not_found() {
    let request = CalculationRequest {
        route: Route {
            id: "R".to_string(),
            origin: "SANTIAGO".to_string(),
            destination: "RANCAGUA".to_string(),
            client_id: "C-1".to_string(),
            distance_km: None,
            tariff_records: vec![TariffRecord {
                id: "T-1".to_string(),
                route_id: "R".to_string(),
                kind: TariffKind::FullRoute,
                calculation_method: CalculationMethod::Flat,
                base_value: decimal("900"),
                toll_value: Decimal::ZERO,
                validity: Validity::open(date("2024-01-01")),
            }],
        },
        billing_date: date("2024-06-01"),
        kind: TariffKind::PartialRoute,
        explicit_tariff_id: None,
        unit_type: "Sider".to_string(),
        quantity: Decimal::ONE,
        allow_non_current: true,
    };

    match create_engine().resolve_and_calculate(&request, &[]) {
        Err(EngineError::TariffNotFound { kind, .. }) => assert_eq!(kind, TariffKind::PartialRoute),
        other => panic!("Expected TariffNotFound, got {:?}", other),
    }
}
