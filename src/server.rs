//! HTTP boundary: the `/quiz` endpoint and health check.
//!
//! Thin by design — validates the request shape, checks the shared secret,
//! and delegates to the session runner. Once the secret matches, the reply
//! is always 200: solver failures are reported in the body so the caller
//! can read the message.

use crate::config::Config;
use crate::fetch::HttpClient;
use crate::renderer::chromium::{find_chromium, ChromiumRenderer};
use crate::session::{Runner, Session, SessionResult};
use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared server state.
pub struct AppState {
    pub config: Config,
}

/// Body of a solve request.
#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    pub email: String,
    pub secret: String,
    pub url: String,
}

/// Build the axum router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/quiz", post(handle_quiz))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the given port.
pub async fn start(port: u16, state: Arc<AppState>) -> Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("quiz solver listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "chromium_available": find_chromium(state.config.chromium_path.as_deref()).is_some(),
    }))
}

async fn handle_quiz(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuizRequest>,
) -> (StatusCode, Json<Value>) {
    // An unset secret authenticates nobody, not everybody.
    if state.config.secret.is_empty() || req.secret != state.config.secret {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "invalid secret" })),
        );
    }

    let started = Instant::now();
    let session = Session::new(req.email, req.secret, req.url, state.config.time_budget);

    match solve_session(&state.config, &session).await {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "elapsed_sec": started.elapsed().as_secs_f64(),
                "result": result,
            })),
        ),
        Err(e) => {
            warn!("session failed: {e:#}");
            (
                StatusCode::OK,
                Json(json!({ "status": "error", "error": format!("{e:#}") })),
            )
        }
    }
}

/// Launch a dedicated browser for the session and release it when the
/// session ends, error paths included.
pub async fn solve_session(config: &Config, session: &Session) -> Result<SessionResult> {
    let renderer = ChromiumRenderer::new(config.chromium_path.as_deref()).await?;
    let mut ctx = renderer.new_context().await?;

    let runner = Runner::new(HttpClient::new());
    let outcome = runner.solve(&mut *ctx, session).await;

    if let Err(e) = ctx.close().await {
        warn!("failed to close page: {e:#}");
    }
    if let Err(e) = renderer.shutdown().await {
        warn!("failed to shut down browser: {e:#}");
    }

    outcome
}
