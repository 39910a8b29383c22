use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::application::ports::EnhancementRequest;
use crate::application::services::SubmitEnhancement;
use crate::infrastructure::observability::text_preview;
use crate::presentation::auth::CurrentUser;
use crate::presentation::state::AppState;

use super::transcriptions::{JobAcceptedResponse, submit_error_response};

#[derive(Debug, Deserialize)]
pub struct EnhancementBody {
    pub provider: String,
    pub text: String,
    pub instruction: String,
}

#[tracing::instrument(skip(state, body), fields(user = %user.0, provider = %body.provider))]
pub async fn create_enhancement_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<EnhancementBody>,
) -> Response {
    tracing::debug!(text = %text_preview(&body.text), "Processing enhancement request");

    let submission = SubmitEnhancement {
        user: user.0,
        provider: body.provider,
        request: EnhancementRequest {
            text: body.text,
            instruction: body.instruction,
        },
    };

    match state.coordinator.submit_enhancement(submission).await {
        Ok(handle) => (
            StatusCode::ACCEPTED,
            Json(JobAcceptedResponse {
                job_id: handle.job_id.to_string(),
                message: "Enhancement job accepted".to_string(),
            }),
        )
            .into_response(),
        Err(e) => submit_error_response(e),
    }
}
