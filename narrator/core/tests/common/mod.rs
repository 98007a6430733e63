//! In-process stub of the adventure backend
//!
//! Serves the one-shot and streaming endpoints on an ephemeral port and
//! records every request it sees, including the session header.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use narrator_core::SESSION_HEADER;

/// How the stub fails `/action`
#[derive(Clone, Debug)]
pub enum Failure {
    /// Non-success status, with an envelope error message if given
    Status(u16, Option<&'static str>),
    /// 200 with `success: false`
    Envelope(&'static str),
}

/// Stub behaviour knobs
#[derive(Clone, Debug)]
pub struct Behavior {
    pub session_id: String,
    /// Issue the session in the header (true) or only in the body
    pub session_in_header: bool,
    pub action_failure: Option<Failure>,
    pub action_delay: Option<Duration>,
    pub stream_events: Vec<(&'static str, &'static str)>,
    pub stream_status: Option<u16>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            session_id: "stub-session".to_string(),
            session_in_header: true,
            action_failure: None,
            action_delay: None,
            stream_events: vec![
                ("connected", "ok"),
                ("message", "The "),
                ("message", "door "),
                ("message", "creaks open."),
                ("done", ""),
            ],
            stream_status: None,
        }
    }
}

/// One request as the stub saw it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seen {
    pub path: String,
    pub session: Option<String>,
    pub action: Option<String>,
}

#[derive(Clone)]
struct Stub {
    behavior: Arc<Behavior>,
    seen: Arc<Mutex<Vec<Seen>>>,
    settings: Arc<Mutex<Option<Value>>>,
}

impl Stub {
    fn record(&self, path: &str, headers: &HeaderMap, action: Option<String>) {
        let session = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen.lock().push(Seen {
            path: path.to_string(),
            session,
            action,
        });
    }

    fn narrative(&self, text: &str) -> Response {
        let body = if self.behavior.session_in_header {
            json!({ "success": true, "data": text })
        } else {
            json!({
                "success": true,
                "data": { "response": text, "sessionId": self.behavior.session_id }
            })
        };

        if self.behavior.session_in_header {
            (
                [(SESSION_HEADER, self.behavior.session_id.clone())],
                Json(body),
            )
                .into_response()
        } else {
            Json(body).into_response()
        }
    }
}

/// Running stub server
pub struct StubServer {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Seen>>>,
    settings: Arc<Mutex<Option<Value>>>,
}

impl StubServer {
    pub async fn start() -> Self {
        Self::with_behavior(Behavior::default()).await
    }

    pub async fn with_behavior(behavior: Behavior) -> Self {
        let stub = Stub {
            behavior: Arc::new(behavior),
            seen: Arc::default(),
            settings: Arc::default(),
        };
        let seen = Arc::clone(&stub.seen);
        let settings = Arc::clone(&stub.settings);

        let app = Router::new()
            .route("/set-adventure-settings", post(configure))
            .route("/start-adventure", post(start))
            .route("/action", post(action))
            .route("/health", get(health))
            .route("/game-state/:id", get(game_state))
            .route("/stream-adventure", get(stream_adventure))
            .route("/stream-action", get(stream_action))
            .with_state(stub);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            seen,
            settings,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    pub fn seen_at(&self, path: &str) -> Vec<Seen> {
        self.seen().into_iter().filter(|s| s.path == path).collect()
    }

    pub fn settings(&self) -> Option<Value> {
        self.settings.lock().clone()
    }
}

/// Address with nothing listening on it
pub async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn configure(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stub.record("set-adventure-settings", &headers, None);
    *stub.settings.lock() = Some(body);
    stub.narrative("Adventure settings saved")
}

async fn start(State(stub): State<Stub>, headers: HeaderMap, Json(_body): Json<Value>) -> Response {
    stub.record("start-adventure", &headers, None);
    stub.narrative("You wake in a misty forest.")
}

async fn action(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let action = body["action"].as_str().unwrap_or_default().to_string();
    stub.record("action", &headers, Some(action.clone()));

    if let Some(delay) = stub.behavior.action_delay {
        tokio::time::sleep(delay).await;
    }

    match stub.behavior.action_failure {
        Some(Failure::Status(status, message)) => {
            let status = StatusCode::from_u16(status).unwrap();
            match message {
                Some(message) => {
                    (status, Json(json!({ "success": false, "error": message }))).into_response()
                }
                None => status.into_response(),
            }
        }
        Some(Failure::Envelope(message)) => {
            Json(json!({ "success": false, "error": message })).into_response()
        }
        None => stub.narrative(&format!("You {action}.")),
    }
}

async fn health(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    stub.record("health", &headers, None);
    Json(json!({ "success": true, "data": "ok" })).into_response()
}

async fn game_state(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    stub.record(&format!("game-state/{id}"), &headers, None);
    Json(json!({
        "success": true,
        "data": {
            "history": ["You wake in a misty forest."],
            "currentScene": "misty forest",
            "isInGame": true
        }
    }))
    .into_response()
}

fn event_stream(stub: &Stub) -> Response {
    if let Some(status) = stub.behavior.stream_status {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, "stream unavailable").into_response();
    }

    let events = stub
        .behavior
        .stream_events
        .clone()
        .into_iter()
        .map(|(name, data)| Ok::<_, Infallible>(Event::default().event(name).data(data)));
    Sse::new(futures::stream::iter(events)).into_response()
}

async fn stream_adventure(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    stub.record("stream-adventure", &headers, None);
    event_stream(&stub)
}

async fn stream_action(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    stub.record("stream-action", &headers, params.get("action").cloned());
    event_stream(&stub)
}
