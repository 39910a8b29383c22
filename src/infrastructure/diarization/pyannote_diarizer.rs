use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::application::ports::{DiarizeError, Diarizer};
use crate::domain::{NormalizedAudio, SpeakerTurn};

/// Client for a pyannote-style diarization sidecar. The sidecar takes mono
/// 16kHz WAV and returns speaker turns with second offsets.
pub struct PyannoteDiarizer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct DiarizationResponse {
    #[serde(default)]
    turns: Vec<RawTurn>,
}

#[derive(Deserialize)]
struct RawTurn {
    start: f32,
    end: f32,
    speaker: String,
}

impl PyannoteDiarizer {
    pub fn new(
        client: Client,
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl Diarizer for PyannoteDiarizer {
    async fn diarize(&self, audio: &NormalizedAudio) -> Result<Vec<SpeakerTurn>, DiarizeError> {
        if self.endpoint.is_empty() {
            return Err(DiarizeError::Unavailable(
                "no diarization endpoint configured".to_string(),
            ));
        }

        let url = format!("{}/api/v1/diarize", self.endpoint);
        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "audio/wav")
            .body(audio.wav.clone())
            .timeout(self.timeout);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DiarizeError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(DiarizeError::Unavailable(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: DiarizationResponse = response
            .json()
            .await
            .map_err(|e| DiarizeError::InvalidResponse(e.to_string()))?;

        let mut turns: Vec<SpeakerTurn> = parsed
            .turns
            .into_iter()
            .filter(|turn| turn.end > turn.start)
            .map(|turn| SpeakerTurn::new(turn.start, turn.end, turn.speaker))
            .collect();
        turns.sort_by(|a, b| a.start.total_cmp(&b.start));

        tracing::debug!(turns = turns.len(), "Diarization completed");
        Ok(turns)
    }
}
