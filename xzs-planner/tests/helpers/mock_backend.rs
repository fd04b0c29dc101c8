//! In-process topic backend for integration tests
//!
//! Serves the `/api` routes the planner calls from an axum router bound to
//! an ephemeral port, keeping topics in memory and recording mutations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use xzs_common::api::{
    CollectResponse, Credibility, FavoritesFullResponse, GenerateMaterialsRequest,
    GenerateMaterialsResponse, MarkDoneRequest, Material, SkipRequest,
};
use xzs_common::topic::DiscoveryStatus;
use xzs_common::TopicCandidate;

/// Backend state shared by the handlers and the test
#[derive(Default)]
pub struct MockState {
    pub topics: Mutex<Vec<TopicCandidate>>,
    /// Topics the next collect run returns
    pub collect_pool: Mutex<Vec<TopicCandidate>>,
    pub materials: Mutex<Vec<Material>>,
    pub fail_materials: AtomicBool,
    pub fail_done: AtomicBool,
    pub fail_topics: AtomicBool,
    pub collect_delay_ms: AtomicUsize,
    pub collect_calls: AtomicUsize,
    pub favorite_calls: AtomicUsize,
    pub skips: Mutex<Vec<SkipRequest>>,
    /// (query work_name, body work_name) per mark-done call
    pub done_calls: Mutex<Vec<(Option<String>, Option<String>)>>,
    pub material_requests: Mutex<Vec<GenerateMaterialsRequest>>,
}

impl MockState {
    pub fn topic(&self, id: &str) -> Option<TopicCandidate> {
        self.topics
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id() == id)
            .cloned()
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Start a backend serving `topics`
    pub async fn start(topics: Vec<TopicCandidate>) -> Self {
        let state = Arc::new(MockState::default());
        *state.topics.lock().unwrap() = topics;
        *state.materials.lock().unwrap() = default_materials();

        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/topics", get(list_topics))
        .route("/api/topics/done", post(mark_done))
        .route("/api/topics/skip", post(skip))
        .route("/api/topics/:id", get(get_topic))
        .route("/api/topics/:id/favorite", post(toggle_favorite))
        .route("/api/favorites/full", get(list_favorites))
        .route("/api/status", get(status))
        .route("/api/collect", post(collect))
        .route(
            "/api/workflow/:id/generate-materials",
            post(generate_materials),
        )
        .with_state(state)
}

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn list_topics(State(state): State<Arc<MockState>>) -> Response {
    if state.fail_topics.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let topics: Vec<TopicCandidate> = state
        .topics
        .lock()
        .unwrap()
        .iter()
        .filter(|t| !t.base.is_favorited)
        .cloned()
        .collect();
    Json(topics).into_response()
}

async fn list_favorites(State(state): State<Arc<MockState>>) -> Json<FavoritesFullResponse> {
    let topics: Vec<TopicCandidate> = state
        .topics
        .lock()
        .unwrap()
        .iter()
        .filter(|t| t.base.is_favorited)
        .cloned()
        .collect();
    Json(FavoritesFullResponse {
        count: topics.len(),
        topics,
    })
}

async fn get_topic(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    match state.topic(&id) {
        Some(topic) => Json(topic).into_response(),
        None => error(StatusCode::NOT_FOUND, "Topic not found"),
    }
}

async fn toggle_favorite(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    state.favorite_calls.fetch_add(1, Ordering::SeqCst);
    let mut topics = state.topics.lock().unwrap();
    match topics.iter_mut().find(|t| t.id() == id) {
        Some(topic) => {
            topic.base.is_favorited = !topic.base.is_favorited;
            Json(json!({ "topic_id": id, "is_favorited": topic.base.is_favorited }))
                .into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Topic not found"),
    }
}

async fn mark_done(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<MarkDoneRequest>,
) -> Response {
    state
        .done_calls
        .lock()
        .unwrap()
        .push((query.get("work_name").cloned(), Some(body.work_name.clone())));

    if state.fail_done.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "write failed");
    }

    let work_name = query.get("work_name").cloned().unwrap_or(body.work_name);
    for topic in state.topics.lock().unwrap().iter_mut() {
        if topic.work_name() == work_name {
            topic.base.is_done = true;
        }
    }
    Json(json!({ "status": "success" })).into_response()
}

async fn skip(State(state): State<Arc<MockState>>, Json(request): Json<SkipRequest>) -> Response {
    state
        .topics
        .lock()
        .unwrap()
        .retain(|t| t.id() != request.topic_id);
    state.skips.lock().unwrap().push(request);
    Json(json!({ "status": "success" })).into_response()
}

async fn status(State(state): State<Arc<MockState>>) -> Json<DiscoveryStatus> {
    Json(DiscoveryStatus {
        is_running: false,
        last_run: Some("2026-10-01T08:30:00".to_string()),
        last_count: state.topics.lock().unwrap().len(),
    })
}

async fn collect(State(state): State<Arc<MockState>>) -> Json<CollectResponse> {
    state.collect_calls.fetch_add(1, Ordering::SeqCst);
    let delay = state.collect_delay_ms.load(Ordering::SeqCst) as u64;
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let fresh = state.collect_pool.lock().unwrap().clone();
    *state.topics.lock().unwrap() = fresh.clone();
    Json(CollectResponse {
        status: "success".to_string(),
        count: fresh.len(),
        topics: fresh,
        formatted: None,
        message: None,
    })
}

async fn generate_materials(
    State(state): State<Arc<MockState>>,
    Path(_id): Path<String>,
    Json(request): Json<GenerateMaterialsRequest>,
) -> Response {
    state.material_requests.lock().unwrap().push(request);
    if state.fail_materials.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "model unavailable");
    }
    let materials = state.materials.lock().unwrap().clone();
    Json(GenerateMaterialsResponse {
        count: materials.len(),
        materials,
    })
    .into_response()
}

fn material(id: &str, category: &str, content: &str, credibility: Credibility) -> Material {
    Material {
        id: id.to_string(),
        category: category.to_string(),
        content: content.to_string(),
        credibility,
        source_note: "mock".to_string(),
        source_url: None,
        potential_score: None,
    }
}

/// Materials covering history, a turn and a person
pub fn default_materials() -> Vec<Material> {
    use xzs_common::api::category;
    vec![
        material(
            "1",
            category::HISTORY_ORIGIN,
            "The stew began as a peasant dish in Nice",
            Credibility::Verified,
        ),
        material(
            "2",
            category::CULTURAL_SHIFT,
            "A film turned it into fine dining",
            Credibility::Verified,
        ),
        material(
            "3",
            category::CELEBRITY_ANECDOTE,
            "A chef designed the layered version for the film",
            Credibility::Rumored,
        ),
        material(
            "4",
            category::COLD_FACT,
            "[待挖掘] Who plated it first?",
            Credibility::ToExplore,
        ),
    ]
}
