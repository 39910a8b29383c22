use async_trait::async_trait;

#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    async fn notify_note_saved(&self, user: &str, note_id: &str) -> Result<(), WebhookError>;
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook dispatch failed: {0}")]
    DispatchFailed(String),
}
