use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::SessionError;
use crate::presentation::state::AppState;

/// Identity resolved from the bearer token, attached as a request extension.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub String);

#[derive(Serialize)]
struct AuthErrorResponse {
    error: String,
}

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return unauthorized("missing bearer token");
    };

    match state.sessions.verify(token).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(SessionError::Unauthenticated) => unauthorized("invalid session token"),
        Err(SessionError::Unavailable(reason)) => {
            tracing::error!(error = %reason, "Session verification unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(AuthErrorResponse {
                    error: "session verification unavailable".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
