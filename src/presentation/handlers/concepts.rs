use axum::Json;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::infrastructure::text_processing::{ConceptMap, extract_concepts};
use crate::presentation::auth::CurrentUser;

const DEFAULT_MAX_TERMS: usize = 40;

#[derive(Debug, Deserialize)]
pub struct ConceptsBody {
    pub text: String,
    pub language: Option<String>,
    pub max_terms: Option<usize>,
}

#[derive(Serialize)]
pub struct ConceptsResponse {
    pub language: String,
    pub terms: Vec<TermResponse>,
    pub edges: Vec<EdgeResponse>,
}

#[derive(Serialize)]
pub struct TermResponse {
    pub term: String,
    pub count: usize,
}

#[derive(Serialize)]
pub struct EdgeResponse {
    pub source: String,
    pub target: String,
    pub weight: usize,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(body), fields(user = %user.0))]
pub async fn extract_concepts_handler(
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<ConceptsBody>,
) -> Response {
    if body.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Text must be non-empty".to_string(),
            }),
        )
            .into_response();
    }

    let max_terms = body.max_terms.unwrap_or(DEFAULT_MAX_TERMS);

    // Term extraction walks the whole text; keep it off the request thread.
    let extracted = tokio::task::spawn_blocking(move || {
        extract_concepts(&body.text, body.language.as_deref(), max_terms)
    })
    .await;

    match extracted {
        Ok(map) => (StatusCode::OK, Json(concepts_response(map))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Concept extraction task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Concept extraction failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn concepts_response(map: ConceptMap) -> ConceptsResponse {
    ConceptsResponse {
        language: map.language.as_str().to_string(),
        terms: map
            .terms
            .into_iter()
            .map(|t| TermResponse {
                term: t.term,
                count: t.count,
            })
            .collect(),
        edges: map
            .edges
            .into_iter()
            .map(|e| EdgeResponse {
                source: e.source,
                target: e.target,
                weight: e.weight,
            })
            .collect(),
    }
}
