//! Router tests: requests go through the full app without a socket.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use ledger_api::caller::{ROLE_HEADER, STORE_HEADER};
use ledger_api::{build_router, AppState};
use ledger_core::{CallerContext, Money, Role};
use ledger_db::{Database, DbConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app_with_db() -> (Router, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    (build_router(AppState::new(db.clone())), db)
}

async fn app() -> Router {
    app_with_db().await.0
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    caller: Option<(&str, Option<&str>)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((role, store)) = caller {
        builder = builder.header(ROLE_HEADER, role);
        if let Some(store) = store {
            builder = builder.header(STORE_HEADER, store);
        }
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn manager(store: &str) -> Option<(&'static str, Option<&str>)> {
    Some(("MANAGER", Some(store)))
}

fn discount_body(code: &str) -> Value {
    let now = Utc::now();
    json!({
        "name": format!("Discount {}", code),
        "code": code,
        "type": "PERCENTAGE",
        "value": 10,
        "validFrom": (now - Duration::days(1)).to_rfc3339(),
        "validTo": (now + Duration::days(1)).to_rfc3339(),
    })
}

async fn create(app: &Router, store: &str, body: Value) -> Value {
    let (status, json) = send(app, Method::POST, "/discounts", manager(store), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    json
}

// =============================================================================
// Caller Context
// =============================================================================

#[tokio::test]
async fn test_missing_role_is_unauthorized() {
    let app = app().await;
    let (status, json) = send(&app, Method::GET, "/discounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_healthz() {
    let app = app().await;
    let (status, json) = send(&app, Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_returns_camel_case_record() {
    let app = app().await;
    let json = create(&app, "S1", discount_body("SUMMER10")).await;

    assert_eq!(json["store"], "S1");
    assert_eq!(json["code"], "SUMMER10");
    assert_eq!(json["type"], "PERCENTAGE");
    assert_eq!(json["value"].as_f64(), Some(10.0));
    assert_eq!(json["applicableTo"], "ALL_PRODUCTS");
    assert_eq!(json["isActive"], true);
    assert_eq!(json["usageCount"], 0);
    assert_eq!(json["totalDiscountAmount"], 0);
    assert!(json["id"].as_str().is_some());
}

#[tokio::test]
async fn test_create_without_store_is_bad_request() {
    let app = app().await;
    let (status, json) = send(
        &app,
        Method::POST,
        "/discounts",
        Some(("MANAGER", None)),
        Some(discount_body("X1")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Store ID is required");
}

#[tokio::test]
async fn test_create_reports_invalid_fields() {
    let app = app().await;
    let mut body = discount_body("BAD CODE");
    body["value"] = json!(250);

    let (status, json) = send(&app, Method::POST, "/discounts", manager("S1"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");

    let fields: Vec<&str> = json["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["code", "value"]);
}

#[tokio::test]
async fn test_create_with_malformed_body_is_bad_request() {
    let app = app().await;
    let (status, json) = send(
        &app,
        Method::POST,
        "/discounts",
        manager("S1"),
        Some(json!({ "name": "No code", "type": "PERCENTAGE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/discounts")
        .header(ROLE_HEADER, "MANAGER")
        .header(STORE_HEADER, "S1")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_unknown_enum_is_unprocessable() {
    let app = app().await;
    let mut body = discount_body("ENUMS");
    body["type"] = json!("BOGO");
    body["applicableTo"] = json!("EVERYTHING");

    let (status, json) = send(&app, Method::POST, "/discounts", manager("S1"), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["fields"][0]["field"], "type");
    assert_eq!(json["fields"][1]["field"], "applicableTo");
}

#[tokio::test]
async fn test_percentage_value_is_sent_as_percent() {
    let (app, db) = app_with_db().await;
    let created = create(&app, "S1", discount_body("TEN")).await;
    assert_eq!(created["value"].as_f64(), Some(10.0));

    let caller = CallerContext::for_store(Role::Manager, "S1");
    let stored = db
        .ledger()
        .get_by_id(created["id"].as_str().unwrap(), &caller)
        .await
        .unwrap();
    assert_eq!(stored.discount_for(Money::from_cents(10_000)).cents(), 1_000);

    let mut half = discount_body("HALFISH");
    half["value"] = json!(50.5);
    let created = create(&app, "S1", half).await;
    assert_eq!(created["value"].as_f64(), Some(50.5));

    let mut too_much = discount_body("ALL-OF-IT");
    too_much["value"] = json!(100.5);
    let (status, json) = send(&app, Method::POST, "/discounts", manager("S1"), Some(too_much)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["fields"][0]["field"], "value");

    let mut fixed = discount_body("COINS");
    fixed["type"] = json!("FIXED_AMOUNT");
    fixed["value"] = json!(2.5);
    let (status, json) = send(&app, Method::POST, "/discounts", manager("S1"), Some(fixed)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["fields"][0]["field"], "value");
}

#[tokio::test]
async fn test_duplicate_code_is_conflict() {
    let app = app().await;
    create(&app, "S1", discount_body("DUP")).await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/discounts",
        manager("S1"),
        Some(discount_body("DUP")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_other_store_gets_not_found() {
    let app = app().await;
    let created = create(&app, "S1", discount_body("MINE")).await;
    let uri = format!("/discounts/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::GET, &uri, manager("S1"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, Method::GET, &uri, manager("S2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_filters_by_query() {
    let app = app().await;
    create(&app, "S1", discount_body("P1")).await;
    let mut fixed = discount_body("F1");
    fixed["type"] = json!("FIXED_AMOUNT");
    fixed["value"] = json!(500);
    fixed["isActive"] = json!(false);
    create(&app, "S1", fixed).await;

    let (status, json) = send(&app, Method::GET, "/discounts", manager("S1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (_, json) = send(
        &app,
        Method::GET,
        "/discounts?type=FIXED_AMOUNT",
        manager("S1"),
        None,
    )
    .await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["code"], "F1");

    let (_, json) = send(
        &app,
        Method::GET,
        "/discounts?isActive=true&page=1&limit=10",
        manager("S1"),
        None,
    )
    .await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["code"], "P1");

    let (status, _) = send(
        &app,
        Method::GET,
        "/discounts?limit=lots",
        manager("S1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_active_and_code_lookup() {
    let app = app().await;
    let now = Utc::now();
    create(&app, "S1", discount_body("LIVE")).await;

    let mut future = discount_body("SOON");
    future["validFrom"] = json!((now + Duration::days(2)).to_rfc3339());
    future["validTo"] = json!((now + Duration::days(5)).to_rfc3339());
    create(&app, "S1", future).await;

    let (status, json) = send(&app, Method::GET, "/discounts/active", manager("S1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let active = json.as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["code"], "LIVE");

    let (status, json) = send(&app, Method::GET, "/discounts/code/SOON", manager("S1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["code"], "SOON");
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_usage_accounting_flow() {
    let app = app().await;
    let mut body = discount_body("ONCE");
    body["usageLimit"] = json!(1);
    let created = create(&app, "S1", body).await;
    let uri = format!("/discounts/{}/usage", created["id"].as_str().unwrap());

    let (status, json) = send(
        &app,
        Method::POST,
        &uri,
        manager("S1"),
        Some(json!({ "amount": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["usageCount"], 1);
    assert_eq!(json["totalDiscountAmount"], 50);

    let (status, json) = send(
        &app,
        Method::POST,
        &uri,
        manager("S1"),
        Some(json!({ "amount": 25 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("usage limit reached"));

    // Non-numeric amount never reaches the accumulator
    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        manager("S1"),
        Some(json!({ "amount": "fifty" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let get_uri = format!("/discounts/{}", created["id"].as_str().unwrap());
    let (_, json) = send(&app, Method::GET, &get_uri, manager("S1"), None).await;
    assert_eq!(json["usageCount"], 1);
    assert_eq!(json["totalDiscountAmount"], 50);
}

#[tokio::test]
async fn test_update_toggle_delete() {
    let app = app().await;
    let created = create(&app, "S1", discount_body("EDIT")).await;
    let uri = format!("/discounts/{}", created["id"].as_str().unwrap());

    let (status, json) = send(
        &app,
        Method::PUT,
        &uri,
        manager("S1"),
        Some(json!({ "name": "Renamed", "value": 15 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Renamed");
    assert_eq!(json["value"].as_f64(), Some(15.0));
    assert_eq!(json["code"], "EDIT");

    let (status, json) = send(
        &app,
        Method::PATCH,
        &format!("{}/toggle", uri),
        manager("S1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["isActive"], false);

    let (status, json) = send(&app, Method::DELETE, &uri, manager("S1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], true);

    let (status, _) = send(&app, Method::GET, &uri, manager("S1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_rejects_non_uuid_id() {
    let app = app().await;
    let (status, json) = send(
        &app,
        Method::PUT,
        "/discounts/not-a-uuid",
        manager("S1"),
        Some(json!({ "name": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["fields"][0]["field"], "id");
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let app = app().await;
    let uri = format!("/discounts/{}", uuid::Uuid::new_v4());
    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        manager("S1"),
        Some(json!({ "name": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_null_clears_usage_limit() {
    let app = app().await;
    let mut body = discount_body("CAP3");
    body["usageLimit"] = json!(1);
    body["minPurchaseAmount"] = json!(5_000);
    body["description"] = json!("First customer only");
    let created = create(&app, "S1", body).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/discounts/{}", id);
    let usage_uri = format!("/discounts/{}/usage", id);
    let amount = Some(json!({ "amount": 10 }));

    let (status, _) = send(&app, Method::POST, &usage_uri, manager("S1"), amount.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::POST, &usage_uri, manager("S1"), amount.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Leaving a key out keeps the stored value
    let (_, json) = send(
        &app,
        Method::PUT,
        &uri,
        manager("S1"),
        Some(json!({ "name": "Still capped" })),
    )
    .await;
    assert_eq!(json["usageLimit"], 1);
    assert_eq!(json["description"], "First customer only");

    let (status, json) = send(
        &app,
        Method::PUT,
        &uri,
        manager("S1"),
        Some(json!({
            "usageLimit": null,
            "minPurchaseAmount": null,
            "description": null,
            "name": "Unlimited"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Unlimited");
    assert!(json["usageLimit"].is_null());
    assert!(json["minPurchaseAmount"].is_null());
    assert!(json["description"].is_null());

    // Past the old cap
    let (status, json) = send(&app, Method::POST, &usage_uri, manager("S1"), amount).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["usageCount"], 2);
    assert_eq!(json["totalDiscountAmount"], 20);
}
