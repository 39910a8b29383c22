mod cloud_whisper_engine;
mod engine_factory;
mod http;
mod sense_voice_engine;
mod whisper_cpp_engine;

pub use cloud_whisper_engine::CloudWhisperEngine;
pub use engine_factory::ProviderEngineFactory;
pub use http::AsrTimeouts;
pub use sense_voice_engine::{SenseVoiceEngine, strip_rich_tags};
pub use whisper_cpp_engine::WhisperCppEngine;
