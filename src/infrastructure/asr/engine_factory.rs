use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    AdapterFactory, AdapterFactoryError, SpeechTranscriber, TextEnhancer,
};
use crate::domain::{EngineKind, ProviderCategory, ProviderDescriptor};
use crate::infrastructure::llm::{AuthStyle, ChatStreamClient};

use super::cloud_whisper_engine::CloudWhisperEngine;
use super::http::AsrTimeouts;
use super::sense_voice_engine::SenseVoiceEngine;
use super::whisper_cpp_engine::WhisperCppEngine;

/// Builds provider adapters from registry descriptors. Engines are thin
/// handles over one shared HTTP client; misconfiguration surfaces when the
/// adapter is invoked, not here.
pub struct ProviderEngineFactory {
    client: reqwest::Client,
    asr_timeouts: AsrTimeouts,
    whisper_kill_grace: Duration,
    llm_establish_timeout: Duration,
}

impl ProviderEngineFactory {
    pub fn new(
        client: reqwest::Client,
        asr_timeouts: AsrTimeouts,
        whisper_kill_grace: Duration,
        llm_establish_timeout: Duration,
    ) -> Self {
        Self {
            client,
            asr_timeouts,
            whisper_kill_grace,
            llm_establish_timeout,
        }
    }
}

impl AdapterFactory for ProviderEngineFactory {
    fn speech_transcriber(
        &self,
        descriptor: &ProviderDescriptor,
    ) -> Result<Arc<dyn SpeechTranscriber>, AdapterFactoryError> {
        match descriptor.kind {
            EngineKind::CloudWhisper => Ok(Arc::new(CloudWhisperEngine::new(
                self.client.clone(),
                descriptor.endpoint.clone().unwrap_or_default(),
                descriptor.api_key.clone(),
                descriptor.model.clone(),
                self.asr_timeouts,
            ))),
            EngineKind::WhisperCpp => Ok(Arc::new(WhisperCppEngine::new(
                descriptor.binary_path.clone().unwrap_or_default(),
                descriptor.model_path.clone().unwrap_or_default(),
                self.asr_timeouts,
                self.whisper_kill_grace,
            ))),
            EngineKind::SenseVoice => Ok(Arc::new(SenseVoiceEngine::new(
                self.client.clone(),
                descriptor.endpoint.clone().unwrap_or_default(),
                self.asr_timeouts,
            ))),
            EngineKind::OpenAiCompatible | EngineKind::AzureOpenAi | EngineKind::LocalServer => {
                Err(AdapterFactoryError::WrongCategory {
                    provider: descriptor.name.clone(),
                    expected: ProviderCategory::SpeechToText,
                })
            }
        }
    }

    fn text_enhancer(
        &self,
        descriptor: &ProviderDescriptor,
    ) -> Result<Arc<dyn TextEnhancer>, AdapterFactoryError> {
        let auth = match descriptor.kind {
            EngineKind::OpenAiCompatible => AuthStyle::Bearer,
            EngineKind::AzureOpenAi => AuthStyle::ApiKeyHeader,
            EngineKind::LocalServer => AuthStyle::None,
            EngineKind::CloudWhisper | EngineKind::WhisperCpp | EngineKind::SenseVoice => {
                return Err(AdapterFactoryError::WrongCategory {
                    provider: descriptor.name.clone(),
                    expected: ProviderCategory::Enhancement,
                });
            }
        };

        Ok(Arc::new(ChatStreamClient::new(
            self.client.clone(),
            descriptor.endpoint.clone().unwrap_or_default(),
            descriptor.api_key.clone(),
            descriptor.model.clone(),
            auth,
            self.llm_establish_timeout,
        )))
    }
}
