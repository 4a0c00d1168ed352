//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use userpilot_engine::delivery::{Delivery, DeliveryError, DeliveryReceipt};
use userpilot_types::IdentifyPayload;

pub const USERS_SCHEMA_LINE: &str = r#"{"type":"SCHEMA","stream":"users","schema":{"type":"object","properties":{"organization_id":{"type":"string"}}},"key_properties":["organization_id"]}"#;

pub fn user_record(organization_id: &str) -> Value {
    json!({
        "organization_id": organization_id,
        "first_name": "A",
        "last_name": "B",
        "orga_creation_date": "2020-01-01",
        "is_email_campaign_validated": "true",
        "is_transactional_email_validated": "false",
        "is_profile_completed": "true",
        "enabled_internal_apps": "[]",
        "is_bot": "false",
        "is_receive_newsletter": "true"
    })
}

pub fn record_line(stream: &str, record: &Value) -> String {
    json!({"type": "RECORD", "stream": stream, "record": record}).to_string()
}

pub fn state_line(value: &Value) -> String {
    json!({"type": "STATE", "value": value}).to_string()
}

/// [`Delivery`] that records every payload and answers with a fixed outcome.
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<IdentifyPayload>>,
    reject_with: Option<u16>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(status: u16) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject_with: Some(status),
        }
    }

    pub fn sent(&self) -> Vec<IdentifyPayload> {
        self.sent.lock().unwrap().clone()
    }
}

impl Delivery for RecordingDelivery {
    async fn deliver(&self, payload: &IdentifyPayload) -> Result<DeliveryReceipt, DeliveryError> {
        self.sent.lock().unwrap().push(payload.clone());
        match self.reject_with {
            Some(status) => Err(DeliveryError::Rejected {
                status,
                body: "rejected by test".into(),
            }),
            None => Ok(DeliveryReceipt { status: 200 }),
        }
    }
}

/// One `identify` call as seen by [`FakeUserpilot`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HeaderMap,
    pub body: Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone)]
struct FakeState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    status: StatusCode,
    delay: Duration,
}

/// Local stand-in for the Userpilot API: records every `POST /v1/identify`
/// and answers each with the same status, optionally after a delay.
pub struct FakeUserpilot {
    pub endpoint: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeUserpilot {
    pub async fn start(status: u16) -> Self {
        Self::start_with_delay(status, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: u16, delay: Duration) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            requests: Arc::clone(&requests),
            status: StatusCode::from_u16(status).expect("fake server status must be valid"),
            delay,
        };
        let app = Router::new()
            .route("/v1/identify", post(identify))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("must bind fake server");
        let addr = listener.local_addr().expect("must read local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            endpoint: format!("http://{addr}/v1/identify"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn identify(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .requests
        .lock()
        .unwrap()
        .push(CapturedRequest { headers, body });
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    let reply = if state.status.is_success() {
        json!({"ok": true})
    } else {
        json!({"error": "rejected"})
    };
    (state.status, Json(reply))
}
