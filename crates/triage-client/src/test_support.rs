//! Mock triage backend for client tests
//!
//! Serves the `/api` routes the client calls. Only requests carrying the
//! currently valid access token are accepted; the refresh endpoint rotates
//! that token according to `RefreshBehavior`. Every request's path, query
//! and bearer token is recorded for assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Barrier;
use triage_auth::TokenStore;

use crate::client::{ApiClient, ClientConfig};
use crate::session::NoopHandler;

/// How `POST /auth/refresh` answers.
#[derive(Clone)]
pub enum RefreshBehavior {
    Succeed { access: String, refresh: String },
    Fail,
}

struct Seen {
    path: String,
    query: String,
    bearer: Option<String>,
}

struct MockState {
    valid_access: Mutex<String>,
    valid_refresh: Mutex<String>,
    refresh: Mutex<RefreshBehavior>,
    rotate_access_on_refresh: AtomicBool,
    refresh_calls: AtomicUsize,
    refresh_tokens_seen: Mutex<Vec<String>>,
    seen: Mutex<Vec<Seen>>,
    form_fields: Mutex<Vec<(String, String)>>,
    hold: Mutex<Option<Arc<Barrier>>>,
}

pub struct MockBackend {
    url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Start a backend that accepts `valid_access` and the refresh token `r1`.
    pub async fn start(valid_access: &str) -> Self {
        let state = Arc::new(MockState {
            valid_access: Mutex::new(valid_access.to_string()),
            valid_refresh: Mutex::new("r1".to_string()),
            refresh: Mutex::new(RefreshBehavior::Fail),
            rotate_access_on_refresh: AtomicBool::new(true),
            refresh_calls: AtomicUsize::new(0),
            refresh_tokens_seen: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
            form_fields: Mutex::new(Vec::new()),
            hold: Mutex::new(None),
        });

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/me", get(me).patch(update_me))
            .route("/api/auth/oauth/google", get(oauth_url))
            .route("/api/patients", get(list_patients).post(create_patient))
            .route("/api/patients/transcribe-voice", post(transcribe))
            .route("/api/patients/{id}", get(get_patient).delete(delete_patient))
            .route("/api/prescriptions", get(list_prescriptions))
            .route("/api/prescriptions/digitize", post(digitize))
            .route("/api/prescriptions/{id}", get(get_prescription))
            .route("/api/prescriptions/{id}/status", patch(update_status))
            .route("/api/dashboard/stats", get(stats))
            .route("/api/slow", get(slow))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { url, state }
    }

    pub fn base_url(&self) -> String {
        format!("{}/api", self.url)
    }

    /// Client against this backend with a short timeout and no expiry hook.
    pub fn client(&self, store: Arc<dyn TokenStore>) -> ApiClient {
        ApiClient::new(
            ClientConfig {
                base_url: self.base_url(),
                timeout: Duration::from_secs(5),
            },
            store,
            Arc::new(NoopHandler),
        )
        .unwrap()
    }

    pub fn set_refresh(&self, behavior: RefreshBehavior) {
        *self.state.refresh.lock().unwrap() = behavior;
    }

    pub fn set_valid_access(&self, access: &str) {
        *self.state.valid_access.lock().unwrap() = access.to_string();
    }

    /// Refreshes hand out tokens without making them valid.
    pub fn keep_valid_access_on_refresh(&self) {
        self.state
            .rotate_access_on_refresh
            .store(false, Ordering::SeqCst);
    }

    /// Delay every 401 until `n` requests have been rejected, so they overlap.
    pub fn hold_unauthorized_until(&self, n: usize) {
        *self.state.hold.lock().unwrap() = Some(Arc::new(Barrier::new(n)));
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.state.refresh_tokens_seen.lock().unwrap().clone()
    }

    /// Bearer token of every request to `path`, in arrival order.
    pub fn bearers_for(&self, path: &str) -> Vec<Option<String>> {
        self.state
            .seen
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.path == path)
            .map(|s| s.bearer.clone())
            .collect()
    }

    pub fn queries_for(&self, path: &str) -> Vec<String> {
        self.state
            .seen
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.path == path)
            .map(|s| s.query.clone())
            .collect()
    }

    /// Multipart fields received, as (name, text value or file name).
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.state.form_fields.lock().unwrap().clone()
    }
}

type Shared = State<Arc<MockState>>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn record(State(state): Shared, request: Request, next: Next) -> Response {
    state.seen.lock().unwrap().push(Seen {
        path: request.uri().path().to_string(),
        query: request.uri().query().unwrap_or("").to_string(),
        bearer: bearer(request.headers()),
    });
    next.run(request).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// Ok if the request carries the valid access token, else a 401 response.
async fn authenticate(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let valid = state.valid_access.lock().unwrap().clone();
    if bearer(headers).as_deref() == Some(valid.as_str()) {
        return Ok(());
    }
    let hold = state.hold.lock().unwrap().clone();
    if let Some(barrier) = hold {
        barrier.wait().await;
    }
    Err(detail(StatusCode::UNAUTHORIZED, "Not authenticated"))
}

fn profile() -> Value {
    json!({
        "id": "u1",
        "email": "dr@example.com",
        "full_name": "Dr Ada Osei",
        "role": "doctor",
        "created_at": "2026-01-05T09:00:00Z"
    })
}

fn tokens(state: &MockState) -> Value {
    json!({
        "access_token": state.valid_access.lock().unwrap().clone(),
        "refresh_token": state.valid_refresh.lock().unwrap().clone(),
        "token_type": "bearer",
        "expires_in": 3600
    })
}

fn patient(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Kwame Mensah",
        "age": 54,
        "gender": "Male",
        "symptoms": "Chest pain radiating to left arm",
        "urgency_score": 92,
        "urgency_level": "Critical",
        "wait_time": "0 min",
        "avatar": "KM",
        "history": ["Hypertension"],
        "risk_scores": [{"condition": "Cardiac", "score": 88, "level": "Critical"}],
        "ai_summary": "Possible acute coronary syndrome.",
        "created_at": "2026-10-19T08:30:00Z"
    })
}

fn prescription(id: &str, patient_name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "patient_name": patient_name,
        "date": "2026-10-19",
        "medications": [
            {"drug": "Amoxicillin", "dosage": "500mg", "frequency": "3x daily", "duration": "7 days"}
        ],
        "status": status,
        "image_url": format!("https://storage.example/{id}.png"),
        "created_at": "2026-10-19T10:00:00Z"
    })
}

async fn login(State(state): Shared, Json(body): Json<Value>) -> Response {
    if body["password"] != "correct" {
        return detail(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    let mut user = profile();
    user["email"] = body["email"].clone();
    Json(json!({ "user": user, "tokens": tokens(&state) })).into_response()
}

async fn register(State(state): Shared, Json(body): Json<Value>) -> Response {
    if body["password"] == "wrong" {
        return detail(StatusCode::UNAUTHORIZED, "Registration not permitted");
    }
    if body["email"] == "taken@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": {"message": "Email already registered"}})),
        )
            .into_response();
    }
    let mut user = profile();
    user["email"] = body["email"].clone();
    user["full_name"] = body["full_name"].clone();
    user["role"] = body.get("role").cloned().unwrap_or(json!("patient"));
    (
        StatusCode::CREATED,
        Json(json!({ "user": user, "tokens": tokens(&state) })),
    )
        .into_response()
}

async fn refresh(State(state): Shared, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let presented = body["refresh_token"].as_str().unwrap_or_default().to_string();
    state.refresh_tokens_seen.lock().unwrap().push(presented.clone());

    // Long enough for every overlapping 401 to queue behind this call
    tokio::time::sleep(Duration::from_millis(100)).await;

    let behavior = state.refresh.lock().unwrap().clone();
    let valid_refresh = state.valid_refresh.lock().unwrap().clone();
    match behavior {
        RefreshBehavior::Succeed { access, refresh } if presented == valid_refresh => {
            if state.rotate_access_on_refresh.load(Ordering::SeqCst) {
                *state.valid_access.lock().unwrap() = access.clone();
            }
            *state.valid_refresh.lock().unwrap() = refresh.clone();
            Json(json!({
                "access_token": access,
                "refresh_token": refresh,
                "token_type": "bearer"
            }))
            .into_response()
        }
        _ => detail(StatusCode::UNAUTHORIZED, "Invalid refresh token"),
    }
}

async fn me(State(state): Shared, headers: HeaderMap) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    Json(profile()).into_response()
}

async fn update_me(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    let mut user = profile();
    for key in ["full_name", "role"] {
        if let Some(v) = body.get(key) {
            user[key] = v.clone();
        }
    }
    Json(user).into_response()
}

async fn oauth_url() -> Response {
    Json(json!({"url": "https://accounts.google.com/o/oauth2/v2/auth?client_id=triage"}))
        .into_response()
}

async fn list_patients(
    State(state): Shared,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(50);
    let patients: Vec<Value> = ["p1", "p2", "p3"]
        .iter()
        .take(limit)
        .map(|id| patient(id))
        .collect();
    Json(json!({"patients": patients, "total": 3})).into_response()
}

async fn create_patient(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    if body["age"].as_i64().unwrap_or(0) <= 0 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [{
                "loc": ["body", "age"],
                "msg": "ensure this value is greater than 0",
                "type": "value_error.number.not_gt"
            }]})),
        )
            .into_response();
    }
    let mut created = patient("p-new");
    for key in ["name", "age", "gender", "symptoms", "history"] {
        created[key] = body[key].clone();
    }
    // Scoring runs asynchronously on the backend
    created["urgency_score"] = json!(0);
    created["urgency_level"] = json!("Low");
    created["risk_scores"] = json!([]);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn get_patient(State(state): Shared, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    if id == "missing" {
        return detail(StatusCode::NOT_FOUND, "Patient not found");
    }
    Json(patient(&id)).into_response()
}

async fn delete_patient(State(state): Shared, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    if id == "missing" {
        return detail(StatusCode::NOT_FOUND, "Patient not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Record multipart fields; returns the received file's (name, size).
async fn read_form(state: &MockState, mut multipart: Multipart) -> Option<(String, usize)> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        match file_name {
            Some(file_name) => {
                let bytes = field.bytes().await.unwrap();
                state
                    .form_fields
                    .lock()
                    .unwrap()
                    .push((name, file_name.clone()));
                file = Some((file_name, bytes.len()));
            }
            None => {
                let text = field.text().await.unwrap();
                state.form_fields.lock().unwrap().push((name, text));
            }
        }
    }
    file
}

async fn transcribe(State(state): Shared, headers: HeaderMap, multipart: Multipart) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    let Some((file_name, size)) = read_form(&state, multipart).await else {
        return detail(StatusCode::BAD_REQUEST, "No audio file provided");
    };
    Json(json!({
        "transcription": "Patient reports chest pain since this morning",
        "file_name": file_name,
        "size": size,
        "symptoms": "chest pain"
    }))
    .into_response()
}

async fn digitize(State(state): Shared, headers: HeaderMap, multipart: Multipart) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    if read_form(&state, multipart).await.is_none() {
        return detail(StatusCode::BAD_REQUEST, "No image provided");
    }
    let patient_name = state
        .form_fields
        .lock()
        .unwrap()
        .iter()
        .rev()
        .find(|(name, _)| name == "patient_name")
        .map(|(_, value)| value.clone())
        .unwrap_or_default();
    (
        StatusCode::CREATED,
        Json(prescription("rx-new", &patient_name, "Digitized")),
    )
        .into_response()
}

async fn list_prescriptions(State(state): Shared, headers: HeaderMap) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    Json(json!({
        "prescriptions": [prescription("rx1", "Ama Boateng", "Pending")],
        "total": 1
    }))
    .into_response()
}

async fn get_prescription(State(state): Shared, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    Json(prescription(&id, "Ama Boateng", "Pending")).into_response()
}

async fn update_status(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    let status = body["status"].as_str().unwrap_or_default();
    if !["Pending", "Digitized", "Verified"].contains(&status) {
        return detail(StatusCode::BAD_REQUEST, "Invalid status");
    }
    Json(prescription(&id, "Ama Boateng", status)).into_response()
}

async fn stats(State(state): Shared, headers: HeaderMap) -> Response {
    if let Err(r) = authenticate(&state, &headers).await {
        return r;
    }
    Json(json!({
        "total_patients": 12,
        "critical_patients": 2,
        "pending_reviews": 4,
        "avg_wait_time": "14 min",
        "prescriptions_today": 7,
        "risk_alerts": 3
    }))
    .into_response()
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(2)).await;
    StatusCode::OK.into_response()
}
