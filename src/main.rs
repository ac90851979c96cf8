use std::sync::Arc;

use alt_text_generator::{
    config::AppConfig,
    openai::OpenAiClient,
    pipeline::Pipeline,
    rekognition::RekognitionDetector,
    server::{self, AppState},
    telemetry,
};
use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_logging();

    let config = AppConfig::from_env().context("failed to load configuration")?;

    let detector = RekognitionDetector::from_settings(&config.aws).await;
    let captioner = OpenAiClient::new(reqwest::Client::new(), &config.openai_base_url);
    let pipeline = Pipeline::new(Arc::new(detector), Arc::new(captioner));

    if config.openai_api_key.is_none() {
        info!("OPENAI_API_KEY not set, the page will ask for a key");
    }

    let state = AppState::new(pipeline, config.openai_api_key.clone());
    let app = server::router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("🚀 Server running on http://{}", listener.local_addr()?);
    info!("📸 Open in your browser to start generating alt text!");

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    Ok(())
}
