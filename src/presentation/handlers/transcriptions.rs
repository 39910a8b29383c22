use axum::Json;
use axum::extract::{Extension, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::TranscribeOptions;
use crate::application::services::{SubmitError, SubmitTranscription};
use crate::domain::AudioPayload;
use crate::presentation::auth::CurrentUser;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct JobAcceptedResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state, multipart), fields(user = %user.0))]
pub async fn create_transcription_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Response {
    let mut payload: Option<AudioPayload> = None;
    let mut provider: Option<String> = None;
    let mut diarize = false;
    let mut save_note = false;
    let mut language: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return bad_request(format!("Failed to read multipart: {}", e));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let data = match field.bytes().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read audio bytes");
                        return bad_request(format!("Failed to read file: {}", e));
                    }
                };
                tracing::debug!(bytes = data.len(), "Audio data received");
                payload = Some(AudioPayload::new(data, content_type, filename));
            }
            "provider" => match field.text().await {
                Ok(value) => provider = Some(value),
                Err(e) => return bad_request(format!("Failed to read provider field: {}", e)),
            },
            "diarize" => match field.text().await {
                Ok(value) => diarize = parse_flag(&value),
                Err(e) => return bad_request(format!("Failed to read diarize field: {}", e)),
            },
            "save_note" => match field.text().await {
                Ok(value) => save_note = parse_flag(&value),
                Err(e) => return bad_request(format!("Failed to read save_note field: {}", e)),
            },
            "language" => match field.text().await {
                Ok(value) if !value.trim().is_empty() => language = Some(value),
                Ok(_) => {}
                Err(e) => return bad_request(format!("Failed to read language field: {}", e)),
            },
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let Some(provider) = provider else {
        return bad_request("Missing provider field".to_string());
    };
    let Some(payload) = payload else {
        return bad_request("No file uploaded".to_string());
    };

    let request = SubmitTranscription {
        user: user.0,
        provider,
        payload,
        options: TranscribeOptions { language },
        diarize,
        save_note,
    };

    match state.coordinator.submit_transcription(request).await {
        Ok(handle) => (
            StatusCode::ACCEPTED,
            Json(JobAcceptedResponse {
                job_id: handle.job_id.to_string(),
                message: "Transcription job accepted".to_string(),
            }),
        )
            .into_response(),
        Err(e) => submit_error_response(e),
    }
}

pub(super) fn submit_error_response(e: SubmitError) -> Response {
    let status = match &e {
        SubmitError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        SubmitError::UnknownProvider(_) => StatusCode::NOT_FOUND,
        SubmitError::ProviderDisabled(_) => StatusCode::SERVICE_UNAVAILABLE,
        SubmitError::WrongCategory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SubmitError::EmptyAudio | SubmitError::EmptyText => StatusCode::BAD_REQUEST,
    };
    tracing::warn!(error = %e, "Job submission rejected");
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}
