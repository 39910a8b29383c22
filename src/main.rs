use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use susurro::application::ports::{
    Diarizer, NoteStore, NoteStoreError, SessionError, SessionVerifier, WebhookDispatcher,
    WebhookError,
};
use susurro::application::services::{JobCoordinator, ProviderRegistry};
use susurro::infrastructure::asr::ProviderEngineFactory;
use susurro::infrastructure::audio::SymphoniaNormalizer;
use susurro::infrastructure::diarization::PyannoteDiarizer;
use susurro::infrastructure::observability::{TracingConfig, init_tracing};
use susurro::presentation::{AppState, Environment, create_router, load_settings};

struct StaticSessionVerifier {
    tokens: HashMap<String, String>,
}

#[async_trait::async_trait]
impl SessionVerifier for StaticSessionVerifier {
    async fn verify(&self, token: &str) -> Result<String, SessionError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(SessionError::Unauthenticated)
    }
}

struct LogNoteStore;

#[async_trait::async_trait]
impl NoteStore for LogNoteStore {
    async fn save(&self, user: &str, title: &str, body: &str) -> Result<String, NoteStoreError> {
        let note_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(user, title, chars = body.len(), note_id = %note_id, "Note saved");
        Ok(note_id)
    }
}

struct LogWebhookDispatcher;

#[async_trait::async_trait]
impl WebhookDispatcher for LogWebhookDispatcher {
    async fn notify_note_saved(&self, user: &str, note_id: &str) -> Result<(), WebhookError> {
        tracing::info!(user, note_id, "Note-saved webhook dispatched");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    let settings = load_settings(environment)?;

    init_tracing(
        TracingConfig::new(environment.as_str(), settings.logging.enable_json),
        settings.server.port,
    );

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let mut descriptors = Vec::new();
    for provider in settings.providers.clone() {
        let name = provider.name.clone();
        match provider.into_descriptor() {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => {
                tracing::warn!(provider = %name, error = %e, "Skipping misconfigured provider");
            }
        }
    }
    tracing::info!(providers = descriptors.len(), "Provider registry loaded");

    let registry = Arc::new(ProviderRegistry::new(descriptors));
    let factory = Arc::new(ProviderEngineFactory::new(
        client.clone(),
        settings.asr.timeouts(),
        settings.asr.kill_grace(),
        settings.enhancement.establish_timeout(),
    ));
    let normalizer = Arc::new(SymphoniaNormalizer);

    let diarizer: Option<Arc<dyn Diarizer>> = if settings.diarization.enabled {
        Some(Arc::new(PyannoteDiarizer::new(
            client.clone(),
            settings.diarization.endpoint.clone().unwrap_or_default(),
            settings.diarization.api_key.clone(),
            settings.diarization.timeout(),
        )))
    } else {
        None
    };

    let tokens = settings
        .auth
        .tokens
        .iter()
        .map(|t| (t.token.clone(), t.user.clone()))
        .collect();
    let sessions: Arc<dyn SessionVerifier> = Arc::new(StaticSessionVerifier { tokens });

    let coordinator = Arc::new(JobCoordinator::new(
        Arc::clone(&registry),
        factory,
        normalizer,
        diarizer,
        Arc::new(LogNoteStore),
        Arc::new(LogWebhookDispatcher),
        settings.jobs.coordinator_config(),
    ));
    let _reaper = coordinator.spawn_retention_reaper();

    let state = AppState {
        coordinator,
        registry,
        sessions,
    };

    let router = create_router(state, settings.server.max_upload_bytes());

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
