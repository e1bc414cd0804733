#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use radio_core::generation::{EnhancedPrompt, VocalGender};
use radio_db::collections::{ROOMS, TRACKS, USERS};
use radio_db::memory::MemoryStore;
use radio_suno::api::{GenerateRequest, MusicGenerator, SubmitResponse, SunoApiError};
use radio_suno::gateway::{GatewayError, PromptEnhancer};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use radio_api::config::ServerConfig;
use radio_api::router::build_app_router;
use radio_api::state::{AppState, Services};

pub const USER_ID: &str = "usr000000000001";
pub const OTHER_USER_ID: &str = "usr000000000002";
pub const TOKEN: &str = "tok-valid";
pub const OTHER_TOKEN: &str = "tok-other";
pub const ROOM_ID: &str = "room00000000001";

/// Build a test `ServerConfig` with safe defaults.
///
/// No external keys are set; generation and enhancement come from the
/// stub services passed to [`build_test_app`].
pub fn test_config() -> ServerConfig {
    ServerConfig::from_lookup(|key| match key {
        "HOST" => Some("127.0.0.1".into()),
        "PORT" => Some("0".into()),
        "PUBLIC_BASE_URL" => Some("http://radio.test".into()),
        "ROOM_PLAY_TAG" => Some("lofi".into()),
        _ => None,
    })
}

/// Build the full application router over the given store.
///
/// Goes through `build_app_router` so tests exercise the same middleware
/// stack (CORS, request ID, timeout, tracing, panic recovery) as `main.rs`.
pub fn build_test_app(store: MemoryStore, services: Services) -> Router {
    build_test_app_with(test_config(), store, services)
}

pub fn build_test_app_with(config: ServerConfig, store: MemoryStore, services: Services) -> Router {
    let state = AppState::new(config.clone(), Arc::new(store), services);
    build_app_router(state, &config)
}

/// Services with the given generator and nothing else.
pub fn with_generator(generator: Arc<StubGenerator>) -> Services {
    Services {
        generator: Some(generator),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Stub generation API
// ---------------------------------------------------------------------------

/// How the stub generation API answers.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// `{code: 200, data: {taskId}}`.
    Accept,
    /// HTTP 200 with a non-200 envelope code.
    Decline { code: i64, msg: String },
    /// Non-2xx HTTP status.
    Fail { status: u16, body: String },
}

/// Records submissions and answers with a fixed reply.
pub struct StubGenerator {
    pub calls: Mutex<Vec<GenerateRequest>>,
    reply: Mutex<StubReply>,
}

impl StubGenerator {
    pub fn new(reply: StubReply) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Mutex::new(reply),
        })
    }

    pub fn accepting() -> Arc<Self> {
        Self::new(StubReply::Accept)
    }

    /// Answer later submissions with `reply`.
    pub async fn set_reply(&self, reply: StubReply) {
        *self.reply.lock().await = reply;
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl MusicGenerator for StubGenerator {
    async fn submit(&self, request: &GenerateRequest) -> Result<SubmitResponse, SunoApiError> {
        let mut calls = self.calls.lock().await;
        calls.push(request.clone());
        match &*self.reply.lock().await {
            StubReply::Accept => Ok(SubmitResponse {
                status: 200,
                body: json!({
                    "code": 200,
                    "msg": "success",
                    "data": { "taskId": format!("task-{}", calls.len()) },
                }),
            }),
            StubReply::Decline { code, msg } => Ok(SubmitResponse {
                status: 200,
                body: json!({ "code": code, "msg": msg, "data": null }),
            }),
            StubReply::Fail { status, body } => Err(SunoApiError::ApiError {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Stub prompt enhancer
// ---------------------------------------------------------------------------

pub struct StubEnhancer;

#[async_trait]
impl PromptEnhancer for StubEnhancer {
    async fn enhance(&self, description: &str) -> Result<EnhancedPrompt, GatewayError> {
        Ok(EnhancedPrompt {
            title: "Night Drive".into(),
            style: format!("synthwave, {description}"),
            prompt: "[Verse]\nNeon lights".into(),
            vocal_gender: Some(VocalGender::Female),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Seed a user and register `token` as their session.
pub async fn seed_user(store: &MemoryStore, id: &str, token: &str, verified: bool) {
    store
        .seed(
            USERS,
            json!({ "id": id, "email": format!("{id}@radio.test"), "name": id, "verified": verified }),
        )
        .await;
    store.insert_session(token, USERS, id).await;
}

/// Store with the two standard users signed in.
pub async fn store_with_users() -> MemoryStore {
    let store = MemoryStore::new();
    seed_user(&store, USER_ID, TOKEN, true).await;
    seed_user(&store, OTHER_USER_ID, OTHER_TOKEN, true).await;
    store
}

/// Seed a playable track and return its record id.
pub async fn seed_track(store: &MemoryStore, id: &str, tags: &str, user: Option<&str>) -> String {
    let record = store
        .seed(
            TRACKS,
            json!({
                "id": id,
                "track_id": format!("ext-{id}"),
                "title": format!("Track {id}"),
                "tags": tags,
                "duration": 120.5,
                "audio_url": format!("https://cdn.test/{id}.mp3"),
                "image_url": format!("https://cdn.test/{id}.jpeg"),
                "user": user.unwrap_or_default(),
                "deleted": false,
            }),
        )
        .await;
    record["id"].as_str().unwrap_or_default().to_string()
}

/// Seed the room with the given fields merged over an idle default.
pub async fn seed_room(store: &MemoryStore, fields: Value) {
    let mut room = json!({
        "id": ROOM_ID,
        "current_track": "",
        "next_track": "",
        "prompt": "lofi beats to study to",
        "active_request": "",
        "disable_generate": false,
        "instrumental": true,
    });
    if let (Some(room), Value::Object(fields)) = (room.as_object_mut(), fields) {
        room.extend(fields);
    }
    store.seed(ROOMS, room).await;
}

pub async fn room_record(store: &MemoryStore) -> Value {
    store
        .dump(ROOMS)
        .await
        .into_iter()
        .find(|r| r["id"] == ROOM_ID)
        .expect("room seeded")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub fn session_cookie(token: &str) -> String {
    format!("token={token}")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header("cookie", session_cookie(token));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("cookie", session_cookie(token));
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::delete(uri);
    if let Some(token) = token {
        builder = builder.header("cookie", session_cookie(token));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
