use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use futures::StreamExt;

use crate::application::ports::{
    AdapterFactory, AudioNormalizer, DiarizeError, Diarizer, EnhanceError, EnhancementRequest,
    NormalizeError, NoteStore, SpeechTranscriber, TextEnhancer, TranscribeError,
    TranscribeOptions, WebhookDispatcher,
};
use crate::domain::{
    AudioPayload, Job, JobId, JobKind, JobStatus, ProviderCategory, ProviderDescriptor,
    TranscriptSegment,
};

use super::merger::{assign_speakers, distinct_speakers, render_transcript};
use super::provider_registry::{AccessError, ProviderRegistry};

#[derive(Debug, Clone)]
pub struct SubmitTranscription {
    pub user: String,
    pub provider: String,
    pub payload: AudioPayload,
    pub options: TranscribeOptions,
    pub diarize: bool,
    pub save_note: bool,
}

#[derive(Debug, Clone)]
pub struct SubmitEnhancement {
    pub user: String,
    pub provider: String,
    pub request: EnhancementRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Normalizing,
    Transcribing,
    Diarizing,
    Enhancing,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Normalizing => "normalizing",
            JobStage::Transcribing => "transcribing",
            JobStage::Diarizing => "diarizing",
            JobStage::Enhancing => "enhancing",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCode {
    Unavailable,
    AuthRejected,
    Malformed,
    Timeout,
    Interrupted,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::Unavailable => "unavailable",
            FailureCode::AuthRejected => "auth_rejected",
            FailureCode::Malformed => "malformed",
            FailureCode::Timeout => "timeout",
            FailureCode::Interrupted => "interrupted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOutcome {
    pub segments: Vec<TranscriptSegment>,
    pub transcript: String,
    pub speakers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementOutcome {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Transcription(TranscriptionOutcome),
    Enhancement(EnhancementOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress { stage: JobStage },
    Segment { index: usize, segment: TranscriptSegment },
    Delta { text: String },
    Warning { message: String },
    Completed { outcome: JobOutcome },
    Failed { code: FailureCode, message: String },
    Cancelled,
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::Completed { .. } | JobEvent::Failed { .. } | JobEvent::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JobHandle {
    pub job_id: JobId,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider {0} is disabled")]
    ProviderDisabled(String),
    #[error("provider {provider} is not a {expected} provider")]
    WrongCategory {
        provider: String,
        expected: ProviderCategory,
    },
    #[error("user is not allowed to use provider {0}")]
    PermissionDenied(String),
    #[error("audio payload is empty")]
    EmptyAudio,
    #[error("text and instruction must be non-empty")]
    EmptyText,
}

impl From<AccessError> for SubmitError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::UnknownProvider(name) => SubmitError::UnknownProvider(name),
            AccessError::ProviderDisabled(name) => SubmitError::ProviderDisabled(name),
            AccessError::WrongCategory { provider, expected } => {
                SubmitError::WrongCategory { provider, expected }
            }
            AccessError::PermissionDenied(name) => SubmitError::PermissionDenied(name),
        }
    }
}

impl From<crate::application::ports::AdapterFactoryError> for SubmitError {
    fn from(e: crate::application::ports::AdapterFactoryError) -> Self {
        match e {
            crate::application::ports::AdapterFactoryError::WrongCategory {
                provider,
                expected,
            } => SubmitError::WrongCategory { provider, expected },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("unknown job")]
    UnknownJob,
    #[error("job events already consumed")]
    AlreadyTaken,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub max_local_jobs: usize,
    pub event_buffer: usize,
    pub retry_backoff: Duration,
    pub job_retention: Duration,
    pub sweep_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_local_jobs: 2,
            event_buffer: 64,
            retry_backoff: Duration::from_millis(500),
            job_retention: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

struct JobFailure {
    code: FailureCode,
    message: String,
}

impl From<TranscribeError> for JobFailure {
    fn from(e: TranscribeError) -> Self {
        let code = match &e {
            TranscribeError::Unavailable { .. } => FailureCode::Unavailable,
            TranscribeError::AuthRejected(_) => FailureCode::AuthRejected,
            TranscribeError::Malformed(_) => FailureCode::Malformed,
            TranscribeError::Timeout(_) => FailureCode::Timeout,
        };
        JobFailure {
            code,
            message: e.to_string(),
        }
    }
}

impl From<EnhanceError> for JobFailure {
    fn from(e: EnhanceError) -> Self {
        let code = match &e {
            EnhanceError::Unavailable { .. } => FailureCode::Unavailable,
            EnhanceError::AuthRejected(_) => FailureCode::AuthRejected,
            EnhanceError::Malformed(_) => FailureCode::Malformed,
            EnhanceError::Timeout(_) => FailureCode::Timeout,
            EnhanceError::Interrupted(_) => FailureCode::Interrupted,
        };
        JobFailure {
            code,
            message: e.to_string(),
        }
    }
}

impl From<NormalizeError> for JobFailure {
    fn from(e: NormalizeError) -> Self {
        JobFailure {
            code: FailureCode::Malformed,
            message: e.to_string(),
        }
    }
}

enum Step<T> {
    Done(T),
    Cancelled,
}

enum Pipeline<T> {
    Finished(T),
    Cancelled,
}

async fn cancellable<T>(cancel: &CancellationToken, fut: impl Future<Output = T>) -> Step<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Step::Cancelled,
        value = fut => Step::Done(value),
    }
}

async fn emit(
    tx: &mpsc::Sender<JobEvent>,
    cancel: &CancellationToken,
    event: JobEvent,
) -> Step<()> {
    match cancellable(cancel, tx.send(event)).await {
        Step::Cancelled => Step::Cancelled,
        Step::Done(_) => Step::Done(()),
    }
}

trait Transient: fmt::Display {
    fn transient(&self) -> bool;
}

impl Transient for TranscribeError {
    fn transient(&self) -> bool {
        self.is_transient()
    }
}

impl Transient for EnhanceError {
    fn transient(&self) -> bool {
        self.is_transient()
    }
}

struct JobEntry {
    record: Job,
    cancel: CancellationToken,
    events: Option<mpsc::Receiver<JobEvent>>,
    finished_at: Option<chrono::DateTime<Utc>>,
}

pub struct JobCoordinator {
    registry: Arc<ProviderRegistry>,
    factory: Arc<dyn AdapterFactory>,
    normalizer: Arc<dyn AudioNormalizer>,
    diarizer: Option<Arc<dyn Diarizer>>,
    note_store: Arc<dyn NoteStore>,
    webhooks: Arc<dyn WebhookDispatcher>,
    local_slots: Arc<Semaphore>,
    jobs: Mutex<HashMap<JobId, JobEntry>>,
    config: CoordinatorConfig,
}

impl JobCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<ProviderRegistry>,
        factory: Arc<dyn AdapterFactory>,
        normalizer: Arc<dyn AudioNormalizer>,
        diarizer: Option<Arc<dyn Diarizer>>,
        note_store: Arc<dyn NoteStore>,
        webhooks: Arc<dyn WebhookDispatcher>,
        config: CoordinatorConfig,
    ) -> Self {
        let local_slots = Arc::new(Semaphore::new(config.max_local_jobs.max(1)));
        Self {
            registry,
            factory,
            normalizer,
            diarizer,
            note_store,
            webhooks,
            local_slots,
            jobs: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub async fn submit_transcription(
        self: &Arc<Self>,
        request: SubmitTranscription,
    ) -> Result<JobHandle, SubmitError> {
        if request.payload.is_empty() {
            return Err(SubmitError::EmptyAudio);
        }

        let table = self.registry.snapshot().await;
        let descriptor = table
            .authorize(
                &request.provider,
                &request.user,
                ProviderCategory::SpeechToText,
            )?
            .clone();
        let transcriber = self.factory.speech_transcriber(&descriptor)?;

        let job = Job::new(
            JobKind::Transcription,
            descriptor.name.clone(),
            request.user.clone(),
        );
        let job_id = job.id;
        let (tx, rx) = mpsc::channel(self.config.event_buffer);
        let cancel = CancellationToken::new();

        self.insert_job(job, cancel.clone(), rx).await;
        tracing::info!(
            job_id = %job_id,
            provider = %descriptor.name,
            user = %request.user,
            "Transcription job accepted"
        );

        let span = tracing::info_span!(
            "transcription_job",
            job_id = %job_id,
            provider = %descriptor.name,
        );
        let this = Arc::clone(self);
        tokio::spawn(
            this.run_transcription(job_id, descriptor, transcriber, request, tx, cancel)
                .instrument(span),
        );

        Ok(JobHandle { job_id })
    }

    pub async fn submit_enhancement(
        self: &Arc<Self>,
        submission: SubmitEnhancement,
    ) -> Result<JobHandle, SubmitError> {
        if submission.request.text.trim().is_empty()
            || submission.request.instruction.trim().is_empty()
        {
            return Err(SubmitError::EmptyText);
        }

        let table = self.registry.snapshot().await;
        let descriptor = table
            .authorize(
                &submission.provider,
                &submission.user,
                ProviderCategory::Enhancement,
            )?
            .clone();
        let enhancer = self.factory.text_enhancer(&descriptor)?;

        let job = Job::new(
            JobKind::Enhancement,
            descriptor.name.clone(),
            submission.user.clone(),
        );
        let job_id = job.id;
        let (tx, rx) = mpsc::channel(self.config.event_buffer);
        let cancel = CancellationToken::new();

        self.insert_job(job, cancel.clone(), rx).await;
        tracing::info!(
            job_id = %job_id,
            provider = %descriptor.name,
            user = %submission.user,
            "Enhancement job accepted"
        );

        let span = tracing::info_span!(
            "enhancement_job",
            job_id = %job_id,
            provider = %descriptor.name,
        );
        let this = Arc::clone(self);
        tokio::spawn(
            this.run_enhancement(job_id, enhancer, submission.request, tx, cancel)
                .instrument(span),
        );

        Ok(JobHandle { job_id })
    }

    pub async fn job(&self, job_id: JobId) -> Option<Job> {
        self.jobs
            .lock()
            .await
            .get(&job_id)
            .map(|entry| entry.record.clone())
    }

    /// Takes the event receiver for a job. Events buffer until the first
    /// subscriber arrives; only one subscriber per job is supported.
    pub async fn subscribe(
        &self,
        job_id: JobId,
    ) -> Result<mpsc::Receiver<JobEvent>, SubscribeError> {
        let mut jobs = self.jobs.lock().await;
        let entry = jobs.get_mut(&job_id).ok_or(SubscribeError::UnknownJob)?;
        entry.events.take().ok_or(SubscribeError::AlreadyTaken)
    }

    /// Requests cancellation. Idempotent; a no-op once the job is terminal.
    pub async fn cancel(&self, job_id: JobId) -> Option<JobStatus> {
        let jobs = self.jobs.lock().await;
        let entry = jobs.get(&job_id)?;
        if !entry.record.status.is_terminal() {
            tracing::info!(job_id = %job_id, "Cancellation requested");
            entry.cancel.cancel();
        }
        Some(entry.record.status)
    }

    pub async fn sweep_finished(&self) -> usize {
        let cutoff = chrono::Duration::from_std(self.config.job_retention)
            .ok()
            .and_then(|retention| Utc::now().checked_sub_signed(retention));
        let Some(cutoff) = cutoff else { return 0 };

        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, entry| entry.finished_at.map(|t| t > cutoff).unwrap_or(true));
        before - jobs.len()
    }

    pub fn spawn_retention_reaper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.config.sweep_interval);
            loop {
                ticker.tick().await;
                let swept = this.sweep_finished().await;
                if swept > 0 {
                    tracing::debug!(swept, "Dropped finished jobs past retention");
                }
            }
        })
    }

    async fn insert_job(&self, job: Job, cancel: CancellationToken, rx: mpsc::Receiver<JobEvent>) {
        let mut jobs = self.jobs.lock().await;
        jobs.insert(
            job.id,
            JobEntry {
                record: job,
                cancel,
                events: Some(rx),
                finished_at: None,
            },
        );
    }

    async fn set_status(&self, job_id: JobId, status: JobStatus, error_message: Option<String>) {
        tracing::debug!(status = %status, "Job status transition");
        let mut jobs = self.jobs.lock().await;
        if let Some(entry) = jobs.get_mut(&job_id) {
            entry.record.status = status;
            entry.record.error_message = error_message;
            entry.record.updated_at = Utc::now();
            if status.is_terminal() {
                entry.finished_at = Some(Utc::now());
            }
        }
    }

    async fn run_transcription(
        self: Arc<Self>,
        job_id: JobId,
        descriptor: ProviderDescriptor,
        transcriber: Arc<dyn SpeechTranscriber>,
        request: SubmitTranscription,
        tx: mpsc::Sender<JobEvent>,
        cancel: CancellationToken,
    ) {
        self.set_status(job_id, JobStatus::Running, None).await;

        let result = self
            .transcription_pipeline(&descriptor, &transcriber, &request, &tx, &cancel)
            .await;

        match result {
            Ok(Pipeline::Finished(outcome)) => {
                self.set_status(job_id, JobStatus::Succeeded, None).await;
                let transcript = outcome.transcript.clone();
                let _ = tx
                    .send(JobEvent::Completed {
                        outcome: JobOutcome::Transcription(outcome),
                    })
                    .await;
                tracing::info!("Transcription job completed");
                if request.save_note {
                    self.spawn_note_hook(request.user.clone(), transcript);
                }
            }
            Ok(Pipeline::Cancelled) => {
                self.set_status(job_id, JobStatus::Cancelled, None).await;
                let _ = tx.send(JobEvent::Cancelled).await;
                tracing::info!("Transcription job cancelled");
            }
            Err(failure) => {
                self.set_status(job_id, JobStatus::Failed, Some(failure.message.clone()))
                    .await;
                tracing::error!(
                    code = failure.code.as_str(),
                    error = %failure.message,
                    "Transcription job failed"
                );
                let _ = tx
                    .send(JobEvent::Failed {
                        code: failure.code,
                        message: failure.message,
                    })
                    .await;
            }
        }
    }

    async fn transcription_pipeline(
        &self,
        descriptor: &ProviderDescriptor,
        transcriber: &Arc<dyn SpeechTranscriber>,
        request: &SubmitTranscription,
        tx: &mpsc::Sender<JobEvent>,
        cancel: &CancellationToken,
    ) -> Result<Pipeline<TranscriptionOutcome>, JobFailure> {
        if let Step::Cancelled = emit(
            tx,
            cancel,
            JobEvent::Progress {
                stage: JobStage::Normalizing,
            },
        )
        .await
        {
            return Ok(Pipeline::Cancelled);
        }

        let normalized = match cancellable(cancel, self.normalizer.normalize(&request.payload))
            .await
        {
            Step::Cancelled => return Ok(Pipeline::Cancelled),
            Step::Done(result) => result.map_err(JobFailure::from)?,
        };
        tracing::debug!(
            duration_ms = normalized.duration.as_millis() as u64,
            "Audio normalized"
        );

        if let Step::Cancelled = emit(
            tx,
            cancel,
            JobEvent::Progress {
                stage: JobStage::Transcribing,
            },
        )
        .await
        {
            return Ok(Pipeline::Cancelled);
        }

        let permit = if descriptor.kind.requires_local_slot() {
            match cancellable(cancel, Arc::clone(&self.local_slots).acquire_owned()).await {
                Step::Cancelled => return Ok(Pipeline::Cancelled),
                Step::Done(Ok(permit)) => Some(permit),
                Step::Done(Err(_)) => {
                    return Err(JobFailure {
                        code: FailureCode::Unavailable,
                        message: "local inference slots closed".to_string(),
                    });
                }
            }
        } else {
            None
        };

        let run_diarization = request.diarize;
        if run_diarization {
            if let Step::Cancelled = emit(
                tx,
                cancel,
                JobEvent::Progress {
                    stage: JobStage::Diarizing,
                },
            )
            .await
            {
                return Ok(Pipeline::Cancelled);
            }
        }

        let transcribe = async {
            let result = self
                .retry_once(cancel, || {
                    transcriber.transcribe(&normalized, &request.options)
                })
                .await;
            drop(permit);
            result
        };

        let diarize = async {
            if !run_diarization {
                return Step::Done(None);
            }
            match &self.diarizer {
                None => Step::Done(Some(Err(DiarizeError::Unavailable(
                    "no diarization backend configured".to_string(),
                )))),
                Some(diarizer) => match cancellable(cancel, diarizer.diarize(&normalized)).await {
                    Step::Cancelled => Step::Cancelled,
                    Step::Done(result) => Step::Done(Some(result)),
                },
            }
        };

        let (asr_step, diarize_step) = tokio::join!(transcribe, diarize);

        let mut segments = match asr_step {
            Step::Cancelled => return Ok(Pipeline::Cancelled),
            Step::Done(result) => result.map_err(JobFailure::from)?,
        };
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));

        match diarize_step {
            Step::Cancelled => return Ok(Pipeline::Cancelled),
            Step::Done(None) => {}
            Step::Done(Some(Ok(turns))) => assign_speakers(&mut segments, &turns),
            Step::Done(Some(Err(e))) => {
                tracing::warn!(error = %e, "Diarization failed; transcript stays unlabeled");
                if let Step::Cancelled = emit(
                    tx,
                    cancel,
                    JobEvent::Warning {
                        message: format!("diarization unavailable: {}", e),
                    },
                )
                .await
                {
                    return Ok(Pipeline::Cancelled);
                }
            }
        }

        for (index, segment) in segments.iter().enumerate() {
            if let Step::Cancelled = emit(
                tx,
                cancel,
                JobEvent::Segment {
                    index,
                    segment: segment.clone(),
                },
            )
            .await
            {
                return Ok(Pipeline::Cancelled);
            }
        }

        let transcript = render_transcript(&segments);
        let speakers = distinct_speakers(&segments);
        Ok(Pipeline::Finished(TranscriptionOutcome {
            segments,
            transcript,
            speakers,
        }))
    }

    async fn run_enhancement(
        self: Arc<Self>,
        job_id: JobId,
        enhancer: Arc<dyn TextEnhancer>,
        request: EnhancementRequest,
        tx: mpsc::Sender<JobEvent>,
        cancel: CancellationToken,
    ) {
        self.set_status(job_id, JobStatus::Running, None).await;

        let result = self
            .enhancement_pipeline(&enhancer, &request, &tx, &cancel)
            .await;

        match result {
            Ok(Pipeline::Finished(outcome)) => {
                self.set_status(job_id, JobStatus::Succeeded, None).await;
                let _ = tx
                    .send(JobEvent::Completed {
                        outcome: JobOutcome::Enhancement(outcome),
                    })
                    .await;
                tracing::info!("Enhancement job completed");
            }
            Ok(Pipeline::Cancelled) => {
                self.set_status(job_id, JobStatus::Cancelled, None).await;
                let _ = tx.send(JobEvent::Cancelled).await;
                tracing::info!("Enhancement job cancelled");
            }
            Err(failure) => {
                self.set_status(job_id, JobStatus::Failed, Some(failure.message.clone()))
                    .await;
                tracing::error!(
                    code = failure.code.as_str(),
                    error = %failure.message,
                    "Enhancement job failed"
                );
                let _ = tx
                    .send(JobEvent::Failed {
                        code: failure.code,
                        message: failure.message,
                    })
                    .await;
            }
        }
    }

    async fn enhancement_pipeline(
        &self,
        enhancer: &Arc<dyn TextEnhancer>,
        request: &EnhancementRequest,
        tx: &mpsc::Sender<JobEvent>,
        cancel: &CancellationToken,
    ) -> Result<Pipeline<EnhancementOutcome>, JobFailure> {
        if let Step::Cancelled = emit(
            tx,
            cancel,
            JobEvent::Progress {
                stage: JobStage::Enhancing,
            },
        )
        .await
        {
            return Ok(Pipeline::Cancelled);
        }

        // Retry applies to establishing the stream only; once deltas have
        // been delivered they must not be retracted by a replay.
        let mut stream = match self.retry_once(cancel, || enhancer.enhance(request)).await {
            Step::Cancelled => return Ok(Pipeline::Cancelled),
            Step::Done(result) => result.map_err(JobFailure::from)?,
        };

        let mut text = String::new();
        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Pipeline::Cancelled),
                item = stream.next() => item,
            };
            match item {
                None => break,
                Some(Ok(delta)) => {
                    if delta.is_empty() {
                        continue;
                    }
                    text.push_str(&delta);
                    if let Step::Cancelled =
                        emit(tx, cancel, JobEvent::Delta { text: delta }).await
                    {
                        return Ok(Pipeline::Cancelled);
                    }
                }
                Some(Err(e)) => return Err(JobFailure::from(e)),
            }
        }

        Ok(Pipeline::Finished(EnhancementOutcome { text }))
    }

    async fn retry_once<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Step<Result<T, E>>
    where
        E: Transient,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let first = match cancellable(cancel, attempt()).await {
            Step::Cancelled => return Step::Cancelled,
            Step::Done(result) => result,
        };
        match first {
            Err(e) if e.transient() => {
                tracing::warn!(error = %e, "Transient provider failure, retrying once");
                if let Step::Cancelled =
                    cancellable(cancel, sleep(self.config.retry_backoff)).await
                {
                    return Step::Cancelled;
                }
                cancellable(cancel, attempt()).await
            }
            result => Step::Done(result),
        }
    }

    fn spawn_note_hook(&self, user: String, transcript: String) {
        let note_store = Arc::clone(&self.note_store);
        let webhooks = Arc::clone(&self.webhooks);
        tokio::spawn(async move {
            let title = format!("Transcription {}", Utc::now().format("%Y-%m-%d %H:%M"));
            match note_store.save(&user, &title, &transcript).await {
                Ok(note_id) => {
                    if let Err(e) = webhooks.notify_note_saved(&user, &note_id).await {
                        tracing::warn!(error = %e, "Webhook dispatch failed after note save");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Saving transcription note failed"),
            }
        });
    }
}
