mod job_coordinator;
mod merger;
mod provider_registry;

pub use job_coordinator::{
    CoordinatorConfig, EnhancementOutcome, FailureCode, JobCoordinator, JobEvent, JobHandle,
    JobOutcome, JobStage, SubmitEnhancement, SubmitError, SubmitTranscription, SubscribeError,
    TranscriptionOutcome,
};
pub use merger::{assign_speakers, coalesce_turns, distinct_speakers, render_transcript};
pub use provider_registry::{AccessError, ProviderRegistry, ProviderTable, RegistryError};
