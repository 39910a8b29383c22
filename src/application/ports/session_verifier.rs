use async_trait::async_trait;

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session token rejected")]
    Unauthenticated,
    #[error("session service unavailable: {0}")]
    Unavailable(String),
}
