//! Integration tests for the REST API.
//!
//! Requests go straight to the Axum router through `tower::ServiceExt`, with
//! the wallet stored as a local file in a temporary directory.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use classroom_wallet::{create_router, initialize_backend, AppConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    _temp_dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = AppConfig {
            data_directory: temp_dir.path().to_path_buf(),
            remote_enabled: false,
            poll_interval_ms: 0,
            ..AppConfig::default()
        };
        let state = initialize_backend(&config)
            .await
            .expect("Failed to initialize backend");
        Self {
            router: create_router(state, &config.cors_origin),
            _temp_dir: temp_dir,
        }
    }

    async fn raw(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.raw(method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }
}

#[tokio::test]
async fn test_initial_wallet() {
    let app = TestApp::new().await;
    let (status, wallet) = app.get("/api/wallet").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wallet["balance"], 0.0);
    assert_eq!(wallet["savedBalance"], 0.0);
    assert_eq!(wallet["schemaVersion"], 1);
    assert_eq!(wallet["settings"]["currencySymbol"], "RM");
    assert_eq!(wallet["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_earn_spend_deposit_flow() {
    let app = TestApp::new().await;

    let (status, earned) = app
        .post(
            "/api/wallet/earn",
            json!({"amount": 5.0, "class_name": "Period 1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(earned["new_balance"], 5.0);
    assert_eq!(earned["success_message"], "Added RM 5.00 to Period 1");
    assert_eq!(earned["transaction"]["type"], "EARN");

    let (status, spent) = app
        .post(
            "/api/wallet/spend",
            json!({"amount": 1.5, "description": "Pencil"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(spent["new_balance"], 3.5);

    let (status, bank) = app.post("/api/bank/deposit", json!({"amount": "2"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bank["applied"], true);
    assert_eq!(bank["balance"], 1.5);
    assert_eq!(bank["saved_balance"], 2.0);
    assert_eq!(bank["current_streak"], 1);

    let (_, bank) = app.post("/api/bank/withdraw", json!({"amount": "0.5"})).await;
    assert_eq!(bank["balance"], 2.0);
    assert_eq!(bank["saved_balance"], 1.5);

    let (_, wallet) = app.get("/api/wallet").await;
    let kinds: Vec<&str> = wallet["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tx| tx["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["WITHDRAW", "DEPOSIT", "SPEND", "EARN"]);
    assert_eq!(wallet["classEarnings"]["Period 1"], 5.0);
    assert_eq!(wallet["stats"]["totalLifetimeEarnings"], 5.0);
}

#[tokio::test]
async fn test_class_limit_and_start_class() {
    let app = TestApp::new().await;
    app.post("/api/wallet/earn", json!({"amount": 4.0, "class_name": "Period 2"}))
        .await;

    let (status, body) = app
        .post("/api/wallet/earn", json!({"amount": 2.0, "class_name": "Period 2"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("Daily limit reached"));

    let (status, wallet) = app
        .post("/api/wallet/start-class", json!({"class_name": "Period 2"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wallet["classEarnings"]["Period 2"], 0.0);
    assert_eq!(wallet["balance"], 4.0);

    let (status, _) = app
        .post("/api/wallet/earn", json!({"amount": 2.0, "class_name": "Period 2"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post("/api/wallet/start-class", json!({"class_name": "Lunch"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insufficient_funds() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/wallet/spend", json!({"amount": 1.0, "description": ""}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Insufficient funds in wallet.");

    let (status, body) = app.post("/api/bank/withdraw", json!({"amount": "1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Insufficient funds in bank.");

    let (status, _) = app.post("/api/wallet/purchase", json!({"item_id": "1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ignored_bank_amounts() {
    let app = TestApp::new().await;
    app.post("/api/wallet/earn", json!({"amount": 1.0})).await;

    for amount in ["", "abc", "-2", "0"] {
        let (status, bank) = app.post("/api/bank/deposit", json!({"amount": amount})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bank["applied"], false);
        assert_eq!(bank["balance"], 1.0);
    }

    let (_, wallet) = app.get("/api/wallet").await;
    assert_eq!(wallet["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_purchase_starts_timer() {
    let app = TestApp::new().await;
    app.post("/api/wallet/earn", json!({"amount": 5.0})).await;

    let (status, body) = app.post("/api/wallet/purchase", json!({"item_id": "99"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    let (status, purchase) = app.post("/api/wallet/purchase", json!({"item_id": "2"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(purchase["new_balance"], 2.0);
    assert_eq!(purchase["transaction"]["description"], "Purchased 15m Screen Time");
    assert_eq!(purchase["timer"]["total_seconds"], 900);
    assert_eq!(purchase["timer"]["is_active"], true);

    let (status, timer) = app.get("/api/timer").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timer["is_active"], true);

    let (_, timer) = app.send(Method::POST, "/api/timer/stop", None).await;
    assert_eq!(timer["is_active"], false);
}

#[tokio::test]
async fn test_settings_round_trip() {
    let app = TestApp::new().await;

    let (status, mut settings) = app.get("/api/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["maxClassEarnings"], 5.0);

    settings["studentName"] = json!("Aisyah");
    settings["maxClassEarnings"] = json!(10.0);
    settings["classes"] = json!(["Math", "Art"]);
    let (status, wallet) = app
        .send(Method::PUT, "/api/settings", Some(settings.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wallet["settings"]["studentName"], "Aisyah");

    let (_, fetched) = app.get("/api/settings").await;
    assert_eq!(fetched, settings);

    let (status, earned) = app.post("/api/wallet/earn", json!({"amount": 8.0})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(earned["transaction"]["className"], "Math");

    settings["maxClassEarnings"] = json!(-1.0);
    let (status, _) = app.send(Method::PUT, "/api/settings", Some(settings)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard() {
    let app = TestApp::new().await;
    app.post("/api/wallet/earn", json!({"amount": 2.5, "class_name": "Period 3"}))
        .await;

    let (status, dashboard) = app.get("/api/wallet/dashboard?class=Period%203").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["selected_class"], "Period 3");
    assert_eq!(dashboard["class_earned"], 2.5);
    assert_eq!(dashboard["earnings_progress"], 50.0);
    assert_eq!(dashboard["formatted_balance"], "RM 2.50");
    assert_eq!(dashboard["storage_mode"], "local");
    assert_eq!(dashboard["estimated_minutes"], 15);

    let (_, dashboard) = app.get("/api/wallet/dashboard").await;
    assert_eq!(dashboard["selected_class"], "Period 1");
    assert_eq!(dashboard["class_earned"], 0.0);
}

#[tokio::test]
async fn test_export_and_import_history() {
    let app = TestApp::new().await;
    app.post(
        "/api/wallet/earn",
        json!({"amount": 2.0, "description": "Quiz", "class_name": "Period 1"}),
    )
    .await;
    app.post("/api/wallet/spend", json!({"amount": 1.0, "description": "Snack"}))
        .await;

    let (status, export) = app.get("/api/history/export").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(export["filename"], "wallet_history.csv");
    assert_eq!(export["transaction_count"], 2);
    let csv_content = export["csv_content"].as_str().unwrap().to_string();
    assert!(csv_content.starts_with("Date,Class,Type,Amount,Description"));

    let (status, bytes) = app
        .raw(Method::GET, "/api/history/export?format=csv", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(bytes).unwrap(), csv_content);

    let (status, _) = app.get("/api/history/export?format=xml").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(Method::POST, "/api/wallet/reset", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, imported) = app
        .post(
            "/api/history/import",
            json!({"text": csv_content, "class_name": "Period 4"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(imported["imported_count"], 1);
    assert_eq!(imported["message"], "Imported 1 earning records.");

    let (_, wallet) = app.get("/api/wallet").await;
    assert_eq!(wallet["balance"], 2.0);
    assert_eq!(wallet["history"][0]["description"], "Quiz");
    assert_eq!(wallet["classEarnings"]["Period 4"], 2.0);
}

#[tokio::test]
async fn test_reset_restores_initial_wallet() {
    let app = TestApp::new().await;
    app.post("/api/wallet/earn", json!({"amount": 3.0})).await;
    app.post("/api/bank/deposit", json!({"amount": "1"})).await;

    let (status, wallet) = app.send(Method::POST, "/api/wallet/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wallet["balance"], 0.0);
    assert_eq!(wallet["savedBalance"], 0.0);
    assert_eq!(wallet["stats"]["currentStreak"], 0);
    assert_eq!(wallet["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new().await;
    let (status, _) = app.raw(Method::GET, "/api/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transactions_carry_class_and_lenient_bank_amounts() {
    let app = TestApp::new().await;
    app.post("/api/wallet/earn", json!({"amount": 4.0, "class_name": "Period 2"}))
        .await;

    let (status, spent) = app
        .post(
            "/api/wallet/spend",
            json!({"amount": 0.125, "description": "Eraser", "class_name": "Period 2"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(spent["transaction"]["className"], "Period 2");

    let (status, bank) = app
        .post("/api/bank/deposit", json!({"amount": "1.5 points"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bank["applied"], true);
    assert_eq!(bank["saved_balance"], 1.5);

    let (_, export) = app.get("/api/history/export").await;
    let csv_content = export["csv_content"].as_str().unwrap();
    assert!(csv_content.contains(",Period 2,SPEND,0.125,Eraser"));
    assert!(csv_content.contains(",Period 1,DEPOSIT,1.5,Deposit to Bank"));
    assert!(!csv_content.contains("General"));
}
