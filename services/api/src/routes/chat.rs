//! Campus assistant handler

use axum::{body::Body, extract::State, http::header, response::IntoResponse};
use tracing::warn;

use crate::{
    AppState,
    chat::{ChatRequest, system_prompt},
    error::ApiResult,
    extract::Json,
};

const PROMPT_COMMUNITIES: i64 = 10;
const PROMPT_EVENTS: i64 = 5;

/// Stream an assistant reply as plain text
///
/// Site data only enriches the prompt; failing to load it is not fatal.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    let (communities, events) = tokio::join!(
        state.community_repository.briefs(PROMPT_COMMUNITIES),
        state.event_repository.briefs(PROMPT_EVENTS),
    );

    let communities = communities.unwrap_or_else(|e| {
        warn!("Failed to load communities for chat context: {}", e);
        Vec::new()
    });
    let events = events.unwrap_or_else(|e| {
        warn!("Failed to load events for chat context: {}", e);
        Vec::new()
    });

    let prompt = system_prompt(&communities, &events);
    let stream = state.chat_client.stream(prompt, request.messages).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    ))
}
