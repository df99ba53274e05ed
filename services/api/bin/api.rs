//! Main Entrypoint for the Charla API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing the inference, realtime, and synthesis clients.
//! 3. Constructing the session store and orchestrators.
//! 4. Starting the web server with CORS and graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use charla_api::{
    config::Config,
    realtime::RealtimeSessionClient,
    router::create_router,
    state::AppState,
};
use charla_core::{
    history::InMemoryHistoryStore,
    inference::OpenAIInferenceClient,
    orchestrator::{AnalysisOrchestrator, ConversationOrchestrator},
    session::SessionStore,
    tts::OpenAISpeechClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// How often idle sessions are swept out of the store.
const EVICTION_INTERVAL: Duration = Duration::from_secs(300);

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.openai_api_key.clone())
        .with_api_base(config.api_base.clone());
    let inference = Arc::new(OpenAIInferenceClient::new(
        openai_config,
        config.chat_model.clone(),
    ));

    let store = Arc::new(SessionStore::new(config.session_ttl));

    let app_state = Arc::new(AppState {
        store: store.clone(),
        analysis: Arc::new(AnalysisOrchestrator::new(inference.clone())),
        conversation: Arc::new(ConversationOrchestrator::new(inference)),
        realtime: Arc::new(RealtimeSessionClient::new(
            config.openai_api_key.clone(),
            config.api_base.clone(),
            config.realtime_model.clone(),
            config.realtime_voice.clone(),
        )),
        synthesizer: Arc::new(OpenAISpeechClient::new(
            config.openai_api_key.clone(),
            config.api_base.clone(),
            config.tts_model.clone(),
        )),
        history: Arc::new(InMemoryHistoryStore::new()),
        config: Arc::new(config.clone()),
    });

    // --- 4. Background Session Eviction ---
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            store.evict_expired();
        }
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        model = %config.chat_model,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
