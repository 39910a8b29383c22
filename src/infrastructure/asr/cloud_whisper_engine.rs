use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{SpeechTranscriber, TranscribeError, TranscribeOptions};
use crate::domain::{NormalizedAudio, TranscriptSegment};

use super::http::{AsrTimeouts, map_request_error, map_status};

pub struct CloudWhisperEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
    timeouts: AsrTimeouts,
}

impl CloudWhisperEngine {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: Option<String>,
        model: Option<String>,
        timeouts: AsrTimeouts,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
            timeouts,
        }
    }
}

#[derive(Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    duration: Option<f32>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Deserialize)]
struct VerboseSegment {
    start: f32,
    end: f32,
    text: String,
}

#[async_trait]
impl SpeechTranscriber for CloudWhisperEngine {
    async fn transcribe(
        &self,
        audio: &NormalizedAudio,
        options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TranscribeError::AuthRejected("no api key configured".to_string()))?;
        if self.endpoint.is_empty() {
            return Err(TranscribeError::Unavailable {
                reason: "no endpoint configured".to_string(),
                transient: false,
            });
        }

        let file_part = multipart::Part::bytes(audio.wav.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| TranscribeError::Malformed(format!("mime: {}", e)))?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("response_format", "verbose_json");
        if let Some(model) = &self.model {
            form = form.text("model", model.clone());
        }
        if let Some(language) = &options.language {
            form = form.text("language", language.clone());
        }

        let timeout = self.timeouts.for_duration(audio.duration);
        tracing::debug!(
            endpoint = %self.endpoint,
            timeout_secs = timeout.as_secs(),
            "Sending audio to cloud transcription endpoint"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_request_error(e, timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(map_status(status, body));
        }

        let result: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| TranscribeError::Malformed(format!("parse response: {}", e)))?;

        let segments = if result.segments.is_empty() {
            let text = result.text.trim().to_string();
            if text.is_empty() {
                Vec::new()
            } else {
                let end = result.duration.unwrap_or(audio.duration.as_secs_f32());
                vec![TranscriptSegment::new(0.0, end, text)]
            }
        } else {
            result
                .segments
                .into_iter()
                .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim().to_string()))
                .filter(|s| !s.text.is_empty())
                .collect()
        };

        tracing::info!(segments = segments.len(), "Cloud transcription completed");
        Ok(segments)
    }
}
