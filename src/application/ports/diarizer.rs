use async_trait::async_trait;

use crate::domain::{NormalizedAudio, SpeakerTurn};

#[async_trait]
pub trait Diarizer: Send + Sync {
    async fn diarize(&self, audio: &NormalizedAudio) -> Result<Vec<SpeakerTurn>, DiarizeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DiarizeError {
    #[error("diarization unavailable: {0}")]
    Unavailable(String),
    #[error("invalid diarization response: {0}")]
    InvalidResponse(String),
}
