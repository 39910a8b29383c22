mod concepts;
mod enhancements;
mod health;
mod jobs;
mod providers;
mod transcriptions;

pub use concepts::extract_concepts_handler;
pub use enhancements::create_enhancement_handler;
pub use health::health_handler;
pub use jobs::{cancel_job_handler, job_events_handler, job_status_handler};
pub use providers::{
    grant_provider_handler, list_providers_handler, revoke_provider_handler,
    set_provider_enabled_handler,
};
pub use transcriptions::create_transcription_handler;
