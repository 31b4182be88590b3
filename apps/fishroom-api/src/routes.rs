use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fishroom_core::{ChannelTag, Message};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::stamp::stamp;
use crate::state::AppState;

const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(10);
const LONG_POLL_MAX_BATCH: usize = 15;

static NICKNAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w").unwrap());

#[derive(Debug, Deserialize)]
pub struct PollQuery {
    pub id: String,
    pub key: String,
    #[allow(dead_code)]
    pub room: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// `GET /api/messages?id=&key=[&room=]` — long-poll up to 10s, then drain
/// whatever else is already queued (bounded by the queue's own 15-entry cap).
pub async fn poll_messages(State(state): State<Arc<AppState>>, Query(query): Query<PollQuery>) -> Result<Json<MessagesResponse>, StatusCode> {
    if !state.api_clients.auth(&query.id, &query.key).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)? {
        return Err(StatusCode::FORBIDDEN);
    }

    let mut messages = Vec::new();
    if let Some(first) = state
        .api_clients
        .poll(&query.id, LONG_POLL_TIMEOUT)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    {
        messages.push(first);
    }
    while messages.len() < LONG_POLL_MAX_BATCH {
        match state.api_clients.poll(&query.id, Duration::from_millis(0)).await {
            Ok(Some(msg)) => messages.push(msg),
            _ => break,
        }
    }

    Ok(Json(MessagesResponse { messages }))
}

#[derive(Debug, Deserialize)]
pub struct ApiPostBody {
    pub content: String,
    pub sender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiAuthHeaders {
    pub token_id: String,
    pub token_key: String,
}

fn extract_token_headers(headers: &axum::http::HeaderMap) -> Option<ApiAuthHeaders> {
    let token_id = headers.get("X-TOKEN-ID")?.to_str().ok()?.to_string();
    let token_key = headers.get("X-TOKEN-KEY")?.to_str().ok()?.to_string();
    Some(ApiAuthHeaders { token_id, token_key })
}

/// `POST /api/messages/<room>/` — injects a Message tagged `api-<name>` into
/// ingress on behalf of an authenticated API client.
pub async fn post_api_message(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    headers: axum::http::HeaderMap,
    Json(body): Json<ApiPostBody>,
) -> StatusCode {
    if body.content.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    let Some(auth) = extract_token_headers(&headers) else {
        return StatusCode::FORBIDDEN;
    };
    match state.api_clients.auth(&auth.token_id, &auth.token_key).await {
        Ok(true) => {}
        _ => return StatusCode::FORBIDDEN,
    }
    let name = state.api_clients.name(&auth.token_id).await.ok().flatten().unwrap_or(auth.token_id);

    let sender = body.sender.unwrap_or_else(|| name.clone());
    let mut msg = Message::new(ChannelTag::Api(name), sender, room, body.content);
    stamp(&mut msg);

    if state.ingress.publish(&msg).await.is_err() {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
pub struct WebPostBody {
    pub content: String,
    pub nickname: String,
}

/// `POST /messages/<room>/` — the browser client's unauthenticated post,
/// tagged `web`. Rate limiting is left to the layer in front of this app.
pub async fn post_web_message(State(state): State<Arc<AppState>>, Path(room): Path<String>, Json(body): Json<WebPostBody>) -> StatusCode {
    if body.content.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    if !NICKNAME_PATTERN.is_match(&body.nickname) {
        return StatusCode::BAD_REQUEST;
    }

    let mut msg = Message::new(ChannelTag::Web, body.nickname, room, body.content);
    stamp(&mut msg);

    if state.ingress.publish(&msg).await.is_err() {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::OK
}
