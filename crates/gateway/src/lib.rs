//! HTTP gateway for LearnCoach.
//!
//! Routes:
//! - `POST /chat`: one tutoring turn
//! - `GET /health`: liveness plus agent and user counts
//! - `GET /`: service status and registered agents
//! - `GET /users/{user_id}`: a user's context snapshot
//! - `POST /agents/reload`: rebuild the agent registry
//!
//! Built on Axum. Each turn runs in its own task so a failing turn surfaces
//! as a 500 instead of taking the connection down.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path};
use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, header},
    response::Json,
    routing::{get, post},
};
use learncoach_agent::{Coordinator, DispatchError, UserContext};
use learncoach_config::AppConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Request bodies above this are rejected before reaching a handler.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub coordinator: Arc<Coordinator>,
    pub config: AppConfig,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes and layers.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/users/{user_id}", get(user_handler))
        .route("/agents/reload", post(reload_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Builds the provider and the coordinator once; every request shares them.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let coordinator = Arc::new(Coordinator::from_config(&config)?);
    info!(
        agents = coordinator.agents_count(),
        provider = %config.provider,
        "Coordinator ready"
    );

    let state = Arc::new(GatewayState { coordinator, config });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: error.into() }))
}

#[derive(Debug, Default, PartialEq)]
struct ChatRequest {
    message: String,
    user_id: Option<String>,
    agent: Option<String>,
}

impl ChatRequest {
    /// Malformed or missing JSON reads as an empty object, and fields of the
    /// wrong type read as absent.
    fn parse(body: &[u8]) -> Self {
        let value: serde_json::Value = serde_json::from_slice(body).unwrap_or_default();
        let field = |name: &str| {
            value
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .filter(|s| !s.is_empty())
        };
        Self {
            message: field("message").unwrap_or_default(),
            user_id: field("user_id"),
            agent: field("agent"),
        }
    }
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    agent_used: String,
    user_id: String,
    status: &'static str,
}

async fn chat_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = ChatRequest::parse(&body);
    if request.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Message is empty"));
    }

    let user_id = request
        .user_id
        .unwrap_or_else(|| state.config.learning.default_user_id.clone());
    let start = Instant::now();

    let coordinator = Arc::clone(&state.coordinator);
    let task_user = user_id.clone();
    let message = request.message;
    let agent = request.agent;
    let outcome = tokio::spawn(async move {
        coordinator
            .handle_turn(agent.as_deref(), &message, &task_user)
            .await
    })
    .await;

    let (response, agent_used) = match outcome {
        Ok(Ok(turn)) => (turn.text(), turn.agent),
        Ok(Err(e)) => {
            let text = e.to_string();
            let DispatchError::UnknownAgent(name) = e;
            (text, name)
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Turn task failed");
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Agent processing failed: {e}"),
            ));
        }
    };

    info!(
        user_id = %user_id,
        agent = %agent_used,
        latency_ms = start.elapsed().as_millis() as u64,
        "Chat turn handled"
    );

    Ok(Json(ChatResponse {
        response,
        agent_used,
        user_id,
        status: "success",
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    agents_count: usize,
    active_users: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        agents_count: state.coordinator.agents_count(),
        active_users: state.coordinator.active_users(),
    })
}

#[derive(Serialize)]
struct IndexResponse {
    service: &'static str,
    status: &'static str,
    agents: Vec<String>,
}

async fn index_handler(State(state): State<SharedState>) -> Json<IndexResponse> {
    Json(IndexResponse {
        service: "Python Learning Coach AI",
        status: "Online",
        agents: state.coordinator.agent_names(),
    })
}

async fn user_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserContext>, ApiError> {
    state
        .coordinator
        .context(&user_id)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("User '{user_id}' not found")))
}

#[derive(Serialize)]
struct ReloadResponse {
    agents_count: usize,
}

async fn reload_handler(State(state): State<SharedState>) -> Json<ReloadResponse> {
    let agents_count = state.coordinator.initialize_registry();
    info!(agents = agents_count, "Agent registry reloaded");
    Json(ReloadResponse { agents_count })
}
