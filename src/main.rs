use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use frontdesk::config::AppConfig;
use frontdesk::handlers;
use frontdesk::services::ai::openai::OpenAiProvider;
use frontdesk::services::calendar::GoogleCalendarProvider;
use frontdesk::services::recordings::TwilioRecordingFetcher;
use frontdesk::services::sessions::SessionStore;
use frontdesk::services::transcribe::OpenAiTranscriber;
use frontdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(
        !config.openai_api_key.is_empty(),
        "OPENAI_API_KEY must be set"
    );

    let llm = OpenAiProvider::new(config.openai_api_key.clone(), config.chat_model.clone());
    let transcriber = OpenAiTranscriber::new(
        config.openai_api_key.clone(),
        config.transcribe_model.clone(),
    );
    let recordings = TwilioRecordingFetcher::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
    );
    let calendar = GoogleCalendarProvider::new(
        config.calendar_token.clone(),
        config.calendar_id.clone(),
    );

    let state = Arc::new(AppState {
        sessions: SessionStore::new(config.session_idle_minutes),
        config: config.clone(),
        llm: Box::new(llm),
        transcriber: Box::new(transcriber),
        recordings: Box::new(recordings),
        calendar: Box::new(calendar),
    });

    // Sweep abandoned call sessions so they cannot pile up for the process
    // lifetime.
    let sweeper_state = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let evicted = sweeper_state.sessions.evict_idle();
            if evicted > 0 {
                tracing::info!(evicted, "evicted idle call sessions");
            }
        }
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/voice", post(handlers::voice::call_start))
        .route("/process", post(handlers::voice::process_turn))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
