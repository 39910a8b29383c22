use std::sync::Arc;

use crate::domain::{ProviderCategory, ProviderDescriptor};

use super::{SpeechTranscriber, TextEnhancer};

pub trait AdapterFactory: Send + Sync {
    fn speech_transcriber(
        &self,
        descriptor: &ProviderDescriptor,
    ) -> Result<Arc<dyn SpeechTranscriber>, AdapterFactoryError>;

    fn text_enhancer(
        &self,
        descriptor: &ProviderDescriptor,
    ) -> Result<Arc<dyn TextEnhancer>, AdapterFactoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterFactoryError {
    #[error("provider {provider} is not a {expected} provider")]
    WrongCategory {
        provider: String,
        expected: ProviderCategory,
    },
}
