use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{NormalizedAudio, TranscriptSegment};

#[derive(Debug, Clone, Default)]
pub struct TranscribeOptions {
    pub language: Option<String>,
}

#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: &NormalizedAudio,
        options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("provider unavailable: {reason}")]
    Unavailable { reason: String, transient: bool },
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
    #[error("malformed request or response: {0}")]
    Malformed(String),
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),
}

impl TranscribeError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TranscribeError::Unavailable { transient: true, .. } | TranscribeError::Timeout(_)
        )
    }
}
