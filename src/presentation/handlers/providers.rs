use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::services::RegistryError;
use crate::presentation::auth::CurrentUser;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ProviderResponse {
    pub name: String,
    pub kind: String,
    pub category: String,
    pub enabled: bool,
    pub open_access: bool,
    pub allowed: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct ProviderPatchBody {
    pub enabled: bool,
}

#[tracing::instrument(skip(state), fields(user = %user.0))]
pub async fn list_providers_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    let table = state.registry.snapshot().await;
    let providers: Vec<ProviderResponse> = table
        .all()
        .into_iter()
        .map(|descriptor| ProviderResponse {
            name: descriptor.name.clone(),
            kind: descriptor.kind.as_str().to_string(),
            category: descriptor.category().as_str().to_string(),
            enabled: descriptor.enabled,
            open_access: descriptor.access.is_open(),
            allowed: descriptor.enabled && descriptor.access.permits(&user.0),
        })
        .collect();

    (StatusCode::OK, Json(providers)).into_response()
}

#[tracing::instrument(skip(state), fields(user = %user.0))]
pub async fn grant_provider_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((name, target)): Path<(String, String)>,
) -> Response {
    match state.registry.grant(&name, &target).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => registry_error_response(e),
    }
}

#[tracing::instrument(skip(state), fields(user = %user.0))]
pub async fn revoke_provider_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((name, target)): Path<(String, String)>,
) -> Response {
    match state.registry.revoke(&name, &target).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => registry_error_response(e),
    }
}

#[tracing::instrument(skip(state, body), fields(user = %user.0, enabled = body.enabled))]
pub async fn set_provider_enabled_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(name): Path<String>,
    Json(body): Json<ProviderPatchBody>,
) -> Response {
    match state.registry.set_enabled(&name, body.enabled).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => registry_error_response(e),
    }
}

fn registry_error_response(e: RegistryError) -> Response {
    let status = match &e {
        RegistryError::UnknownProvider(_) => StatusCode::NOT_FOUND,
        RegistryError::OpenAccess(_) => StatusCode::CONFLICT,
    };
    tracing::warn!(error = %e, "Provider update rejected");
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}
