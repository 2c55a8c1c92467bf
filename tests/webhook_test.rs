mod common;

use chrono::{Duration, Utc};
use serde_json::json;

use common::{error_code, TestApp};
use payme_merchant::domain::TransactionState;

fn check_perform(amount: i64, order_id: &str) -> serde_json::Value {
    json!({
        "method": "CheckPerformTransaction",
        "params": {"amount": amount, "account": {"order_id": order_id}}
    })
}

fn create(amount: i64, order_id: &str, id: &str) -> serde_json::Value {
    json!({
        "method": "CreateTransaction",
        "params": {
            "id": id,
            "time": Utc::now().timestamp_millis(),
            "amount": amount,
            "account": {"order_id": order_id}
        }
    })
}

fn by_id(method: &str, id: &str) -> serde_json::Value {
    json!({"method": method, "params": {"id": id}})
}

#[tokio::test]
async fn test_check_perform_allows_payable_order() {
    let app = TestApp::new();
    app.seed_order("42-1", 500_000).await;

    let response = app.call(check_perform(500_000, "42-1")).await;
    assert_eq!(response, json!({"result": {"allow": true}}));
}

#[tokio::test]
async fn test_check_perform_rejects_mismatches() {
    let app = TestApp::new();
    app.seed_order("42-1", 500_000).await;

    assert_eq!(error_code(&app.call(check_perform(400_000, "42-1")).await), -31050);
    assert_eq!(error_code(&app.call(check_perform(500_000, "missing")).await), -31050);
    assert_eq!(error_code(&app.call(check_perform(0, "42-1")).await), -31001);
    assert_eq!(error_code(&app.call(check_perform(-5, "42-1")).await), -31001);
    assert_eq!(app.repository.applied_updates(), 0);
}

#[tokio::test]
async fn test_check_perform_after_transition_is_rejected() {
    let app = TestApp::new();
    app.seed_order("42-1", 5000).await;
    app.call(create(5000, "42-1", "gw-1")).await;
    app.call(by_id("PerformTransaction", "gw-1")).await;

    assert_eq!(error_code(&app.call(check_perform(5000, "42-1")).await), -31050);
}

#[tokio::test]
async fn test_full_lifecycle() {
    let app = TestApp::new();
    let order = app.seed_order("42-1", 5000).await;

    let created = app.call(create(5000, "42-1", "gw-1")).await;
    assert_eq!(
        created,
        json!({"result": {
            "create_time": order.create_time.timestamp_millis(),
            "transaction": "gw-1",
            "state": 1
        }})
    );

    let performed = app.call(by_id("PerformTransaction", "gw-1")).await;
    assert_eq!(performed["result"]["state"], 2);
    assert_eq!(performed["result"]["transaction"], "gw-1");
    let perform_time = performed["result"]["perform_time"].as_i64().unwrap();
    assert!(perform_time > 0);

    let checked = app.call(by_id("CheckTransaction", "gw-1")).await;
    assert_eq!(checked["result"]["state"], 2);
    assert_eq!(checked["result"]["perform_time"], perform_time);
    assert_eq!(checked["result"]["cancel_time"], 0);
    assert!(checked["result"]["reason"].is_null());

    let stored = app.stored("42-1").await;
    assert_eq!(stored.state, TransactionState::Performed);
    assert_eq!(stored.amount, 5000);
    assert_eq!(stored.external_id.as_deref(), Some("gw-1"));
}

#[tokio::test]
async fn test_create_amount_mismatch() {
    let app = TestApp::new();
    app.seed_order("42-1", 5000).await;

    let response = app.call(create(4000, "42-1", "gw-1")).await;
    assert_eq!(error_code(&response), -31001);
    assert!(app.stored("42-1").await.external_id.is_none());
}

#[tokio::test]
async fn test_create_unknown_order() {
    let app = TestApp::new();
    let response = app.call(create(5000, "nope", "gw-1")).await;
    assert_eq!(error_code(&response), -31050);
}

#[tokio::test]
async fn test_create_conflicting_external_id_never_mutates() {
    let app = TestApp::new();
    app.seed_order("42-1", 5000).await;
    app.call(create(5000, "42-1", "gw-1")).await;
    let before = app.stored("42-1").await;
    let updates = app.repository.applied_updates();

    let response = app.call(create(5000, "42-1", "gw-2")).await;
    assert_eq!(error_code(&response), -31099);
    assert_eq!(response["error"]["message"]["en"], "Transaction already exists with different ID");

    assert_eq!(app.stored("42-1").await, before);
    assert_eq!(app.repository.applied_updates(), updates);
}

#[tokio::test]
async fn test_create_rejects_gateway_id_owned_by_another_order() {
    let app = TestApp::new();
    app.seed_order("42-1", 5000).await;
    app.seed_order("42-2", 5000).await;
    app.call(create(5000, "42-1", "gw-1")).await;

    let response = app.call(create(5000, "42-2", "gw-1")).await;
    assert_eq!(error_code(&response), -31099);
    assert!(app.stored("42-2").await.external_id.is_none());
}

#[tokio::test]
async fn test_create_after_perform_is_invalid_account() {
    let app = TestApp::new();
    app.seed_order("42-1", 5000).await;
    app.call(create(5000, "42-1", "gw-1")).await;
    app.call(by_id("PerformTransaction", "gw-1")).await;

    let response = app.call(create(5000, "42-1", "gw-1")).await;
    assert_eq!(error_code(&response), -31050);
}

#[tokio::test]
async fn test_create_with_future_create_time() {
    let app = TestApp::new();
    app.seed_order_at("42-1", 5000, Utc::now() + Duration::minutes(5))
        .await;

    let response = app.call(create(5000, "42-1", "gw-1")).await;
    assert_eq!(error_code(&response), -31008);
}

#[tokio::test]
async fn test_perform_replay_returns_stored_time() {
    let app = TestApp::new();
    app.seed_order("42-1", 5000).await;
    app.call(create(5000, "42-1", "gw-1")).await;

    let first = app.call(by_id("PerformTransaction", "gw-1")).await;
    let updates = app.repository.applied_updates();
    let second = app.call(by_id("PerformTransaction", "gw-1")).await;

    assert_eq!(first, second);
    assert_eq!(app.repository.applied_updates(), updates);
    let stored = app.stored("42-1").await;
    assert_eq!(
        second["result"]["perform_time"],
        stored.perform_time.unwrap().timestamp_millis()
    );
}

#[tokio::test]
async fn test_cancel_after_perform() {
    let app = TestApp::new();
    app.seed_order("42-1", 5000).await;
    app.call(create(5000, "42-1", "gw-1")).await;
    let performed = app.call(by_id("PerformTransaction", "gw-1")).await;

    let cancelled = app.call(by_id("CancelTransaction", "gw-1")).await;
    assert_eq!(cancelled["result"]["state"], -2);
    let cancel_time = cancelled["result"]["cancel_time"].as_i64().unwrap();
    assert!(cancel_time >= performed["result"]["perform_time"].as_i64().unwrap());

    let updates = app.repository.applied_updates();
    let again = app.call(by_id("CancelTransaction", "gw-1")).await;
    assert_eq!(again, cancelled);
    assert_eq!(app.repository.applied_updates(), updates);

    let checked = app.call(by_id("CheckTransaction", "gw-1")).await;
    assert_eq!(checked["result"]["reason"], 5);
    assert_eq!(checked["result"]["cancel_time"], cancel_time);
    assert_eq!(checked["result"]["perform_time"], performed["result"]["perform_time"]);

    let stored = app.stored("42-1").await;
    assert_eq!(stored.state, TransactionState::CancelledAfterPerform);
    assert!(stored.perform_time.is_some() && stored.cancel_time.is_some());
}

#[tokio::test]
async fn test_cancel_before_perform() {
    let app = TestApp::new();
    app.seed_order("42-1", 5000).await;
    app.call(create(5000, "42-1", "gw-1")).await;

    let cancelled = app
        .call(json!({"method": "CancelTransaction", "params": {"id": "gw-1", "reason": 3}}))
        .await;
    assert_eq!(cancelled["result"]["state"], -1);

    let checked = app.call(by_id("CheckTransaction", "gw-1")).await;
    assert_eq!(checked["result"]["reason"], 3);
    assert_eq!(checked["result"]["perform_time"], 0);

    // Perform on a cancelled transaction replays without mutation.
    let performed = app.call(by_id("PerformTransaction", "gw-1")).await;
    assert_eq!(performed["result"]["state"], -1);
    assert_eq!(performed["result"]["perform_time"], 0);

    let stored = app.stored("42-1").await;
    assert_eq!(stored.state, TransactionState::Cancelled);
    assert!(stored.perform_time.is_none());
}

#[tokio::test]
async fn test_unknown_transaction_id() {
    let app = TestApp::new();
    for method in ["PerformTransaction", "CancelTransaction", "CheckTransaction"] {
        let response = app.call(by_id(method, "missing")).await;
        assert_eq!(error_code(&response), -31003, "{}", method);
    }
}

#[tokio::test]
async fn test_malformed_requests() {
    let app = TestApp::new();
    let auth = common::basic_auth("Paycom", common::PAYME_KEY);

    let response = app.call_raw("{not json".to_string(), Some(&auth)).await;
    assert_eq!(error_code(&response), -32504);

    let response = app
        .call(json!(["CheckTransaction", {"id": "gw-1"}]))
        .await;
    assert_eq!(error_code(&response), -32504);

    let response = app.call(json!({"params": {}})).await;
    assert_eq!(error_code(&response), -32504);

    let response = app.call(json!({"method": "ChangePassword", "params": {}})).await;
    assert_eq!(error_code(&response), -32504);
    assert_eq!(response["error"]["message"]["ru"], "Неверный формат запроса");
    assert_eq!(response["error"]["message"]["uz"], "So‘rov formati noto‘g‘ri");
}

#[tokio::test]
async fn test_health_reports_storage() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["db"], "connected");
}
