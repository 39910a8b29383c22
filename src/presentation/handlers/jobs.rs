use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::{JobEvent, JobOutcome, SubscribeError};
use crate::domain::{Job, JobId, TranscriptSegment};
use crate::presentation::auth::CurrentUser;
use crate::presentation::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub id: String,
    pub kind: String,
    pub status: String,
    pub provider: String,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JobEventBody {
    Progress {
        stage: String,
    },
    Segment {
        index: usize,
        start: f32,
        end: f32,
        text: String,
        speaker: Option<String>,
        tag: Option<String>,
    },
    Delta {
        text: String,
    },
    Warning {
        message: String,
    },
    Completed {
        outcome: OutcomeBody,
    },
    Failed {
        code: String,
        message: String,
    },
    Cancelled,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OutcomeBody {
    Transcription {
        segments: Vec<SegmentBody>,
        transcript: String,
        speakers: Vec<String>,
    },
    Enhancement {
        text: String,
    },
}

#[derive(Serialize)]
struct SegmentBody {
    start: f32,
    end: f32,
    text: String,
    speaker: Option<String>,
    tag: Option<String>,
}

impl From<TranscriptSegment> for SegmentBody {
    fn from(segment: TranscriptSegment) -> Self {
        Self {
            start: segment.start,
            end: segment.end,
            text: segment.text,
            speaker: segment.speaker,
            tag: segment.tag,
        }
    }
}

fn event_body(event: JobEvent) -> JobEventBody {
    match event {
        JobEvent::Progress { stage } => JobEventBody::Progress {
            stage: stage.as_str().to_string(),
        },
        JobEvent::Segment { index, segment } => JobEventBody::Segment {
            index,
            start: segment.start,
            end: segment.end,
            text: segment.text,
            speaker: segment.speaker,
            tag: segment.tag,
        },
        JobEvent::Delta { text } => JobEventBody::Delta { text },
        JobEvent::Warning { message } => JobEventBody::Warning { message },
        JobEvent::Completed { outcome } => JobEventBody::Completed {
            outcome: match outcome {
                JobOutcome::Transcription(t) => OutcomeBody::Transcription {
                    segments: t.segments.into_iter().map(SegmentBody::from).collect(),
                    transcript: t.transcript,
                    speakers: t.speakers,
                },
                JobOutcome::Enhancement(e) => OutcomeBody::Enhancement { text: e.text },
            },
        },
        JobEvent::Failed { code, message } => JobEventBody::Failed {
            code: code.as_str().to_string(),
            message,
        },
        JobEvent::Cancelled => JobEventBody::Cancelled,
    }
}

fn job_response(job: &Job) -> JobStatusResponse {
    JobStatusResponse {
        id: job.id.to_string(),
        kind: job.kind.as_str().to_string(),
        status: job.status.as_str().to_string(),
        provider: job.provider.clone(),
        error_message: job.error_message.clone(),
        created_at: job.created_at.to_rfc3339(),
        updated_at: job.updated_at.to_rfc3339(),
    }
}

fn parse_job_id(raw: &str) -> Result<JobId, Response> {
    match Uuid::parse_str(raw) {
        Ok(uuid) => Ok(JobId::from_uuid(uuid)),
        Err(_) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid job ID: {}", raw),
            }),
        )
            .into_response()),
    }
}

fn not_found(raw: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Job not found: {}", raw),
        }),
    )
        .into_response()
}

/// Loads the job and enforces that it belongs to the caller. Jobs of other
/// users read as missing rather than forbidden.
async fn owned_job(state: &AppState, raw: &str, user: &str) -> Result<(JobId, Job), Response> {
    let job_id = parse_job_id(raw)?;
    match state.coordinator.job(job_id).await {
        Some(job) if job.user == user => Ok((job_id, job)),
        _ => Err(not_found(raw)),
    }
}

#[tracing::instrument(skip(state), fields(user = %user.0))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(job_id): Path<String>,
) -> Response {
    match owned_job(&state, &job_id, &user.0).await {
        Ok((_, job)) => (StatusCode::OK, Json(job_response(&job))).into_response(),
        Err(response) => response,
    }
}

#[tracing::instrument(skip(state), fields(user = %user.0))]
pub async fn cancel_job_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(job_id): Path<String>,
) -> Response {
    let (id, _) = match owned_job(&state, &job_id, &user.0).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    match state.coordinator.cancel(id).await {
        Some(_) => (
            StatusCode::ACCEPTED,
            Json(CancelResponse {
                job_id: id.to_string(),
                message: "Cancellation requested".to_string(),
            }),
        )
            .into_response(),
        None => not_found(&job_id),
    }
}

#[tracing::instrument(skip(state), fields(user = %user.0))]
pub async fn job_events_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(job_id): Path<String>,
) -> Response {
    let (id, _) = match owned_job(&state, &job_id, &user.0).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let mut events = match state.coordinator.subscribe(id).await {
        Ok(receiver) => receiver,
        Err(SubscribeError::UnknownJob) => return not_found(&job_id),
        Err(SubscribeError::AlreadyTaken) => {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("Job events already consumed: {}", job_id),
                }),
            )
                .into_response();
        }
    };

    tracing::debug!(job_id = %id, "Event stream opened");

    let stream = async_stream::stream! {
        while let Some(event) = events.recv().await {
            let terminal = event.is_terminal();
            let body = event_body(event);
            let json = serde_json::to_string(&body).unwrap_or_default();
            yield Ok::<_, Infallible>(Event::default().data(json));
            if terminal {
                break;
            }
        }
    };

    Sse::new(stream)
        .keep_alive(
            axum::response::sse::KeepAlive::new()
                .interval(KEEP_ALIVE_INTERVAL)
                .text("keep-alive"),
        )
        .into_response()
}
