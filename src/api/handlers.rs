use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::{
    api::{
        types::{ChatRequest, ChatResponse, HealthResponse, PredictQuery, PredictRequest},
        AppState,
    },
    engine::{Outcome, RequestState},
    reply::{Reply, ReplyMode, PROMPT_FOR_INPUT},
};

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.classifier.name().to_string(),
    })
}

/// Body is read leniently: unparsable JSON counts as an empty request.
pub async fn predict(
    State(state): State<AppState>,
    Query(query): Query<PredictQuery>,
    body: Bytes,
) -> Response {
    let request: PredictRequest = serde_json::from_slice(&body).unwrap_or_default();
    let mode = match query.format.as_deref() {
        Some(raw) => raw.parse::<ReplyMode>().unwrap_or_else(|err| {
            warn!(error = err.as_str(), "ignoring format override");
            state.reply_mode
        }),
        None => state.reply_mode,
    };

    match run_request(&state, request.into_text(), mode).await {
        RequestState::AwaitingText => plain_text(StatusCode::OK, PROMPT_FOR_INPUT.to_string()),
        RequestState::Resolved(Outcome::Reply(reply)) => reply_response(reply),
        RequestState::Resolved(Outcome::Failed(diagnostic)) => plain_text(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Sorry, something went wrong: {diagnostic}"),
        ),
    }
}

pub async fn chat(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<ChatResponse>) {
    let request: ChatRequest = serde_json::from_slice(&body).unwrap_or_default();
    let message = match request.message.filter(|m| !m.trim().is_empty()) {
        Some(message) => message,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ChatResponse::error("Missing message")),
            )
        }
    };
    info!(
        user_id = request.user_id.as_deref().unwrap_or(""),
        "incoming chat message"
    );

    match run_request(&state, Some(message), ReplyMode::Json).await {
        RequestState::Resolved(Outcome::Reply(Reply::Json(detailed))) => (
            StatusCode::OK,
            Json(ChatResponse::ok(detailed.reply, detailed.emotions)),
        ),
        RequestState::Resolved(Outcome::Failed(diagnostic)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ChatResponse::error(diagnostic)),
        ),
        other => {
            warn!(state = ?other, "unexpected chat resolution");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatResponse::error("unexpected reply shape")),
            )
        }
    }
}

/// Classification blocks, so it runs off the async workers.
async fn run_request(state: &AppState, text: Option<String>, mode: ReplyMode) -> RequestState {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return RequestState::AwaitingText;
    };

    let engine = state.engine.clone();
    let classifier = state.classifier.clone();
    tokio::task::spawn_blocking(move || engine.process(classifier.as_ref(), Some(text.as_str()), mode))
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "classification task aborted");
            RequestState::Resolved(Outcome::Failed(format!("classification task aborted: {err}")))
        })
}

fn reply_response(reply: Reply) -> Response {
    match reply {
        Reply::Text(text) => plain_text(StatusCode::OK, text),
        Reply::Emotions(names) => Json(names).into_response(),
        Reply::Json(detailed) => Json(detailed).into_response(),
    }
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, PLAIN_TEXT)], body).into_response()
}
