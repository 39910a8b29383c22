use async_trait::async_trait;

use crate::domain::{AudioPayload, NormalizedAudio};

#[async_trait]
pub trait AudioNormalizer: Send + Sync {
    async fn normalize(&self, payload: &AudioPayload) -> Result<NormalizedAudio, NormalizeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("audio stream is empty")]
    EmptyAudio,
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
}
