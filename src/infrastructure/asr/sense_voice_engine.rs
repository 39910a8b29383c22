use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::application::ports::{SpeechTranscriber, TranscribeError, TranscribeOptions};
use crate::domain::{NormalizedAudio, TranscriptSegment};

use super::http::{AsrTimeouts, map_request_error, map_status};

static RICH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|([^|]*)\|>").expect("valid rich tag regex"));

const EMOTIONS: [&str; 8] = [
    "HAPPY",
    "SAD",
    "ANGRY",
    "NEUTRAL",
    "FEARFUL",
    "DISGUSTED",
    "SURPRISED",
    "EMO_UNKNOWN",
];

const EVENTS: [&str; 8] = [
    "Speech", "BGM", "Applause", "Laughter", "Cry", "Sneeze", "Breath", "Cough",
];

/// Talks to a long-lived SenseVoice sidecar over HTTP. The sidecar returns
/// raw model output with rich tags (`<|en|><|HAPPY|><|Speech|>...`); this
/// adapter strips them into plain text plus an optional emotion/event tag.
pub struct SenseVoiceEngine {
    client: reqwest::Client,
    endpoint: String,
    timeouts: AsrTimeouts,
}

impl SenseVoiceEngine {
    pub fn new(client: reqwest::Client, endpoint: String, timeouts: AsrTimeouts) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeouts,
        }
    }
}

#[derive(Deserialize)]
struct SidecarResponse {
    #[serde(default)]
    segments: Vec<SidecarSegment>,
}

#[derive(Deserialize)]
struct SidecarSegment {
    start: f32,
    end: f32,
    text: String,
}

#[async_trait]
impl SpeechTranscriber for SenseVoiceEngine {
    async fn transcribe(
        &self,
        audio: &NormalizedAudio,
        options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        if self.endpoint.is_empty() {
            return Err(TranscribeError::Unavailable {
                reason: "no sidecar endpoint configured".to_string(),
                transient: false,
            });
        }

        let url = format!("{}/api/v1/transcribe", self.endpoint);
        let language = options.language.as_deref().unwrap_or("auto");
        let timeout = self.timeouts.for_duration(audio.duration);

        tracing::debug!(
            url = %url,
            language = language,
            timeout_secs = timeout.as_secs(),
            "Sending audio to SenseVoice sidecar"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("language", language)])
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(audio.wav.to_vec())
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

        let result: SidecarResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::Malformed(format!("parse response: {}", e)))?;

        let segments: Vec<TranscriptSegment> = result
            .segments
            .into_iter()
            .filter_map(|s| {
                let (text, tag) = strip_rich_tags(&s.text);
                if text.is_empty() {
                    None
                } else {
                    Some(TranscriptSegment::with_tag(s.start, s.end, text, tag))
                }
            })
            .collect();

        tracing::info!(segments = segments.len(), "SenseVoice transcription completed");
        Ok(segments)
    }
}

/// Removes every `<|...|>` tag and reports the most interesting one: a
/// non-neutral emotion wins over a non-speech event; plain speech gets none.
pub fn strip_rich_tags(raw: &str) -> (String, Option<String>) {
    let mut emotion: Option<&str> = None;
    let mut event: Option<&str> = None;

    for capture in RICH_TAG.captures_iter(raw) {
        if let Some(token) = capture.get(1) {
            let token = token.as_str();
            if EMOTIONS.contains(&token) {
                emotion.get_or_insert(token);
            } else if EVENTS.contains(&token) {
                event.get_or_insert(token);
            }
        }
    }

    let text = RICH_TAG.replace_all(raw, "").trim().to_string();
    let tag = match emotion {
        Some(emotion) if emotion != "NEUTRAL" && emotion != "EMO_UNKNOWN" => {
            Some(emotion.to_string())
        }
        _ => match event {
            Some(event) if event != "Speech" => Some(event.to_string()),
            _ => None,
        },
    };

    (text, tag)
}
