use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use teloxide::types::Update;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::bot::{self, BotContext};

const HEALTH_TEXT: &str = "Бот TapMoney запущен и ожидает сообщений через Webhook!";
const BAD_CONTENT_TYPE: &str = "Content-Type must be application/json";
const MALFORMED_UPDATE: &str = "Malformed update payload";

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    bot: BotContext,
}

impl AppState {
    pub fn new(bot: BotContext) -> Self {
        Self { bot }
    }
}

pub fn router(state: AppState, webhook_path: &str) -> Router {
    Router::new()
        .route("/", get(health))
        .route(webhook_path, post(telegram_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn run(state: AppState, addr: &str, webhook_path: &str) -> Result<()> {
    let app = router(state, webhook_path);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {} (webhook path {})", addr, webhook_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Received shutdown signal, stopping...");
}

async fn health() -> &'static str {
    info!("Health check on /");
    HEALTH_TEXT
}

/// POST <webhook path>: accepts a JSON update and answers it in the background.
async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    info!("Webhook request received ({} bytes)", body.len());

    if !is_json(&headers) {
        error!(
            "Rejected webhook request with content type {:?}",
            headers.get(CONTENT_TYPE)
        );
        return (StatusCode::FORBIDDEN, BAD_CONTENT_TYPE);
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            error!("Rejected malformed update: {}", e);
            return (StatusCode::FORBIDDEN, MALFORMED_UPDATE);
        }
    };

    tokio::spawn(bot::handle_update(state.bot.clone(), update));

    (StatusCode::OK, "!")
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}
