use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::application::ports::{DeltaStream, EnhanceError, EnhancementRequest, TextEnhancer};

const AZURE_API_VERSION: &str = "2024-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    Bearer,
    ApiKeyHeader,
    None,
}

/// Streams chat-completion deltas from an OpenAI-style endpoint. Frames can
/// split anywhere across network chunks, so `data:` lines are reassembled in
/// a buffer before parsing.
pub struct ChatStreamClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
    auth: AuthStyle,
    establish_timeout: Duration,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl ChatStreamClient {
    pub fn new(
        client: Client,
        endpoint: String,
        api_key: Option<String>,
        model: Option<String>,
        auth: AuthStyle,
        establish_timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
            auth,
            establish_timeout,
        }
    }

    fn completions_url(&self) -> String {
        match self.auth {
            AuthStyle::ApiKeyHeader => format!(
                "{}/chat/completions?api-version={}",
                self.endpoint, AZURE_API_VERSION
            ),
            _ => format!("{}/chat/completions", self.endpoint),
        }
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (self.auth, self.api_key.as_deref()) {
            (AuthStyle::Bearer, Some(key)) => request.bearer_auth(key),
            (AuthStyle::ApiKeyHeader, Some(key)) => request.header("api-key", key),
            _ => request,
        }
    }
}

#[async_trait]
impl TextEnhancer for ChatStreamClient {
    async fn enhance(&self, request: &EnhancementRequest) -> Result<DeltaStream, EnhanceError> {
        if self.endpoint.is_empty() {
            return Err(EnhanceError::Unavailable {
                reason: "no endpoint configured".to_string(),
                transient: false,
            });
        }
        let key_missing = self.api_key.as_deref().map(str::is_empty).unwrap_or(true);
        if key_missing && self.auth != AuthStyle::None {
            return Err(EnhanceError::AuthRejected("no api key configured".to_string()));
        }

        let body = ChatCompletionRequest {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| "default".to_string()),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.instruction.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.text.clone(),
                },
            ],
            stream: true,
        };

        let url = self.completions_url();
        tracing::debug!(url = %url, "Opening enhancement delta stream");

        let send = self.apply_auth(self.client.post(&url).json(&body)).send();
        let response = tokio::time::timeout(self.establish_timeout, send)
            .await
            .map_err(|_| EnhanceError::Timeout(self.establish_timeout))?
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(map_status(status, body));
        }

        let mut bytes = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut buffer = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(EnhanceError::Interrupted(e.to_string()));
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = buffer.find('\n') {
                    let line: String = buffer.drain(..=newline).collect();
                    let line = line.trim_end();
                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim_start();
                    if data == "[DONE]" {
                        return;
                    }
                    match serde_json::from_str::<ChatCompletionChunk>(data) {
                        Ok(parsed) => {
                            let content = parsed
                                .choices
                                .into_iter()
                                .next()
                                .and_then(|choice| choice.delta.content);
                            if let Some(content) = content {
                                if !content.is_empty() {
                                    yield Ok(content);
                                }
                            }
                        }
                        Err(e) => {
                            yield Err(EnhanceError::Malformed(format!("stream chunk: {}", e)));
                            return;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn map_status(status: StatusCode, body: String) -> EnhanceError {
    let reason = format!("status {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EnhanceError::AuthRejected(reason),
        StatusCode::TOO_MANY_REQUESTS => EnhanceError::Unavailable {
            reason,
            transient: true,
        },
        StatusCode::BAD_REQUEST
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNPROCESSABLE_ENTITY => EnhanceError::Malformed(reason),
        s if s.is_server_error() => EnhanceError::Unavailable {
            reason,
            transient: true,
        },
        _ => EnhanceError::Unavailable {
            reason,
            transient: false,
        },
    }
}

fn map_request_error(e: reqwest::Error) -> EnhanceError {
    EnhanceError::Unavailable {
        reason: e.to_string(),
        transient: e.is_timeout() || e.is_connect(),
    }
}
