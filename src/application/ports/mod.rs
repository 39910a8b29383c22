mod adapter_factory;
mod audio_normalizer;
mod diarizer;
mod note_store;
mod session_verifier;
mod speech_transcriber;
mod text_enhancer;
mod webhook_dispatcher;

pub use adapter_factory::{AdapterFactory, AdapterFactoryError};
pub use audio_normalizer::{AudioNormalizer, NormalizeError};
pub use diarizer::{Diarizer, DiarizeError};
pub use note_store::{NoteStore, NoteStoreError};
pub use session_verifier::{SessionError, SessionVerifier};
pub use speech_transcriber::{SpeechTranscriber, TranscribeError, TranscribeOptions};
pub use text_enhancer::{DeltaStream, EnhanceError, EnhancementRequest, TextEnhancer};
pub use webhook_dispatcher::{WebhookDispatcher, WebhookError};
