mod audio;
mod job;
mod job_status;
mod provider;
mod segment;
mod speaker_turn;

pub use audio::{AudioPayload, NormalizedAudio};
pub use job::{Job, JobId, JobKind};
pub use job_status::JobStatus;
pub use provider::{AllowList, EngineKind, ProviderCategory, ProviderDescriptor};
pub use segment::TranscriptSegment;
pub use speaker_turn::SpeakerTurn;
