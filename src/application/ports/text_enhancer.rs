use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, EnhanceError>> + Send>>;

#[derive(Debug, Clone)]
pub struct EnhancementRequest {
    pub text: String,
    pub instruction: String,
}

#[async_trait]
pub trait TextEnhancer: Send + Sync {
    async fn enhance(&self, request: &EnhancementRequest) -> Result<DeltaStream, EnhanceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("provider unavailable: {reason}")]
    Unavailable { reason: String, transient: bool },
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
    #[error("malformed request or response: {0}")]
    Malformed(String),
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),
    #[error("stream interrupted: {0}")]
    Interrupted(String),
}

impl EnhanceError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EnhanceError::Unavailable { transient: true, .. } | EnhanceError::Timeout(_)
        )
    }
}
