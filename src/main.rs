use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moodbot::{
    api::{self, AppState},
    catalog,
    config::ServerConfig,
    engine::MoodEngine,
    inference,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    println!("🚀 Starting mood bot ({} replies)...", config.reply_mode);

    // -----------------------------
    // Read-only catalog + classifier
    // -----------------------------
    let (labels, templates) =
        catalog::load(config.catalog_path.as_deref(), config.templates_path.as_deref())?;
    let engine = Arc::new(MoodEngine::new(labels, templates));

    let model_dir = config.model_dir.clone();
    let device = config.device.clone();
    let seq_len = config.seq_len;
    let classifier = tokio::task::spawn_blocking(move || {
        inference::load_classifier(&model_dir, device.as_deref(), seq_len)
    })
    .await?;

    let state = AppState {
        engine,
        classifier,
        reply_mode: config.reply_mode,
    };

    // -----------------------------
    // Routers
    // -----------------------------
    let app = Router::new()
        .merge(api::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state);

    let addr = config.addr.as_str();

    println!("🌐 HTTP listening on http://{addr}");
    println!("💬 Predict at http://{addr}/api/predict");
    println!("🗨  Chat at http://{addr}/chat");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
