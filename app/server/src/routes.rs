//! HTTP routes for the chat front end

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use cityline::extract::{CityTables, YearCount};
use cityline::{history, run_turn, Agent};

use crate::page::INDEX_HTML;

pub struct AppState {
    pub agent: Agent,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .layer(cors)
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub input: String,
    /// Serialized history from the previous reply; empty for a fresh chat.
    #[serde(default)]
    pub history: String,
}

/// One labeled table, in reply order.
#[derive(Debug, Serialize)]
pub struct CityTable {
    pub city: String,
    pub rows: Vec<YearCount>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub history: String,
    pub tables: Vec<CityTable>,
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatReply>, (StatusCode, String)> {
    if payload.input.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "input must not be empty".to_string()));
    }
    // A client-corrupted history is the caller's fault, not the agent's.
    if history::decode(&payload.history).is_err() {
        return Err((StatusCode::BAD_REQUEST, "invalid chat history".to_string()));
    }

    let turn = run_turn(&state.agent, &payload.input, &payload.history)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Chat turn failed");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    Ok(Json(ChatReply {
        reply: turn.display_text,
        history: turn.history,
        tables: tables_payload(turn.tables),
    }))
}

/// Flatten the ordered map to an array: JSON object key order is not a
/// contract, array order is.
fn tables_payload(tables: CityTables) -> Vec<CityTable> {
    tables
        .into_iter()
        .map(|(city, rows)| CityTable { city, rows })
        .collect()
}
