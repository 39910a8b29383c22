use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, patch, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::auth::require_session;
use crate::presentation::handlers::{
    cancel_job_handler, create_enhancement_handler, create_transcription_handler,
    extract_concepts_handler, grant_provider_handler, health_handler, job_events_handler,
    job_status_handler, list_providers_handler, revoke_provider_handler,
    set_provider_enabled_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let api = Router::new()
        .route("/api/v1/transcriptions", post(create_transcription_handler))
        .route("/api/v1/enhancements", post(create_enhancement_handler))
        .route(
            "/api/v1/jobs/{job_id}",
            get(job_status_handler).delete(cancel_job_handler),
        )
        .route("/api/v1/jobs/{job_id}/events", get(job_events_handler))
        .route("/api/v1/providers", get(list_providers_handler))
        .route(
            "/api/v1/providers/{name}",
            patch(set_provider_enabled_handler),
        )
        .route(
            "/api/v1/providers/{name}/users/{user}",
            put(grant_provider_handler).delete(revoke_provider_handler),
        )
        .route("/api/v1/concepts", post(extract_concepts_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
