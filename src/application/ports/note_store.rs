use async_trait::async_trait;

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn save(&self, user: &str, title: &str, body: &str) -> Result<String, NoteStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NoteStoreError {
    #[error("note storage failed: {0}")]
    StorageFailed(String),
}
