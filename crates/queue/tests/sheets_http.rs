//! Sheets client tests against a local stand-in for the token endpoint and
//! the v4 values / batchUpdate API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};

use courier_common::config::AppConfig;
use courier_common::error::AppError;
use courier_common::traits::QueueStore;
use courier_queue::SheetsQueue;

const TEST_KEY_PEM: &str = include_str!("fixtures/service_account_key.pem");

// ============================================================
// Mock API
// ============================================================

#[derive(Default)]
struct MockSheets {
    /// Answer every Sheets call with 503
    unavailable: bool,
    /// Rows returned by values.get
    values: Option<Value>,
    token_grants: AtomicUsize,
    ranges: Mutex<Vec<String>>,
    bearers: Mutex<Vec<String>>,
    updates: Mutex<Vec<(String, Value)>>,
}

impl MockSheets {
    fn record_bearer(&self, headers: &HeaderMap) {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.bearers.lock().unwrap().push(bearer);
    }
}

async fn grant_token(
    State(mock): State<Arc<MockSheets>>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    assert_eq!(
        form.get("grant_type").map(String::as_str),
        Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    );
    assert!(form.get("assertion").is_some_and(|a| a.split('.').count() == 3));

    let n = mock.token_grants.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "access_token": format!("tok-{n}"), "expires_in": 3600, "token_type": "Bearer" }))
}

async fn get_values(
    State(mock): State<Arc<MockSheets>>,
    Path((_spreadsheet, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    mock.record_bearer(&headers);
    mock.ranges.lock().unwrap().push(range.clone());
    if mock.unavailable {
        return (StatusCode::SERVICE_UNAVAILABLE, "backend unavailable").into_response();
    }

    let mut body = json!({ "range": range, "majorDimension": "ROWS" });
    if let Some(values) = &mock.values {
        body["values"] = values.clone();
    }
    Json(body).into_response()
}

async fn batch_update(
    State(mock): State<Arc<MockSheets>>,
    Path(target): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.record_bearer(&headers);
    mock.updates.lock().unwrap().push((target, body));
    if mock.unavailable {
        return (StatusCode::SERVICE_UNAVAILABLE, "backend unavailable").into_response();
    }
    Json(json!({ "spreadsheetId": "sheet-1", "replies": [{}] })).into_response()
}

/// Serve the mock on a local port and return a queue pointed at it.
async fn queue_against(mock: MockSheets) -> (SheetsQueue, Arc<MockSheets>) {
    let mock = Arc::new(mock);
    let app = Router::new()
        .route("/token", post(grant_token))
        .route("/v4/spreadsheets/{spreadsheet}/values/{range}", get(get_values))
        .route("/v4/spreadsheets/{target}", post(batch_update))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let credentials = json!({
        "type": "service_account",
        "client_email": "queue-bot@project.iam.gserviceaccount.com",
        "private_key": TEST_KEY_PEM,
        "token_uri": format!("{base}/token"),
    });
    let config = AppConfig {
        email_address: "sender@example.com".to_string(),
        email_password: "unused".to_string(),
        smtp_host: "smtp.invalid".to_string(),
        smtp_port: 465,
        spreadsheet_id: "sheet-1".to_string(),
        sheet_name: "Queue".to_string(),
        sheet_id: 7,
        google_credentials: credentials.to_string(),
        telegram_bot_token: "unused".to_string(),
        webhook_token: None,
        port: 0,
    };

    let queue = SheetsQueue::new(&config).unwrap().with_api_base(base);
    (queue, mock)
}

// ============================================================
// Tests
// ============================================================

#[tokio::test]
async fn test_read_first_row_over_http() {
    let (queue, mock) = queue_against(MockSheets {
        values: Some(json!([["a@x.com", "Hi", "<b>body</b>", "5"]])),
        ..Default::default()
    })
    .await;

    let row = queue.read_first_row().await.unwrap().unwrap();

    assert_eq!(row.recipient(), "a@x.com");
    assert_eq!(row.subject(), "Hi");
    assert_eq!(row.body(), "<b>body</b>");
    assert_eq!(row.delay_seconds(), 5);
    assert_eq!(*mock.ranges.lock().unwrap(), ["'Queue'!A2:D2"]);
    assert_eq!(*mock.bearers.lock().unwrap(), ["Bearer tok-1"]);
}

#[tokio::test]
async fn test_missing_values_read_as_empty_queue() {
    let (queue, _mock) = queue_against(MockSheets::default()).await;

    assert!(queue.read_first_row().await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_posts_delete_dimension() {
    let (queue, mock) = queue_against(MockSheets::default()).await;

    queue.delete_first_row().await.unwrap();

    let updates = mock.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    let (target, body) = &updates[0];
    assert_eq!(target, "sheet-1:batchUpdate");

    let range = &body["requests"][0]["deleteDimension"]["range"];
    assert_eq!(range["sheetId"], 7);
    assert_eq!(range["dimension"], "ROWS");
    assert_eq!(range["startIndex"], 1);
    assert_eq!(range["endIndex"], 2);
}

#[tokio::test]
async fn test_access_token_reused_across_calls() {
    let (queue, mock) = queue_against(MockSheets {
        values: Some(json!([["a@x.com"]])),
        ..Default::default()
    })
    .await;

    queue.read_first_row().await.unwrap();
    queue.delete_first_row().await.unwrap();
    queue.read_first_row().await.unwrap();

    assert_eq!(mock.token_grants.load(Ordering::SeqCst), 1);
    assert!(mock.bearers.lock().unwrap().iter().all(|b| b == "Bearer tok-1"));
}

#[tokio::test]
async fn test_unavailable_backend_is_queue_error() {
    let (queue, _mock) = queue_against(MockSheets {
        unavailable: true,
        ..Default::default()
    })
    .await;

    let read = queue.read_first_row().await.unwrap_err();
    assert!(matches!(&read, AppError::Queue(msg) if msg.contains("503")), "{read}");

    let delete = queue.delete_first_row().await.unwrap_err();
    assert!(matches!(&delete, AppError::Queue(msg) if msg.contains("503")), "{delete}");
}
