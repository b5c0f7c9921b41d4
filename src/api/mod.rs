use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{classifier::EmotionClassifier, engine::MoodEngine, reply::ReplyMode};

pub mod handlers;
pub mod types;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MoodEngine>,
    pub classifier: Arc<dyn EmotionClassifier>,
    pub reply_mode: ReplyMode,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/predict",
            get(handlers::health).post(handlers::predict),
        )
        .route("/chat", post(handlers::chat))
}
