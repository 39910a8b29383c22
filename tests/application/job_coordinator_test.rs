use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;

use susurro::application::ports::{
    AdapterFactory, AdapterFactoryError, AudioNormalizer, DeltaStream, DiarizeError, Diarizer,
    EnhanceError, EnhancementRequest, NormalizeError, NoteStore, NoteStoreError,
    SpeechTranscriber, TextEnhancer, TranscribeError, TranscribeOptions, WebhookDispatcher,
    WebhookError,
};
use susurro::application::services::{
    CoordinatorConfig, FailureCode, JobCoordinator, JobEvent, JobOutcome, JobStage,
    ProviderRegistry, SubmitEnhancement, SubmitError, SubmitTranscription, SubscribeError,
};
use susurro::domain::{
    AllowList, AudioPayload, EngineKind, JobStatus, NormalizedAudio, ProviderDescriptor,
    SpeakerTurn, TranscriptSegment,
};

struct PassthroughNormalizer;

#[async_trait::async_trait]
impl AudioNormalizer for PassthroughNormalizer {
    async fn normalize(&self, payload: &AudioPayload) -> Result<NormalizedAudio, NormalizeError> {
        Ok(NormalizedAudio::new(
            payload.bytes.clone(),
            16_000,
            Duration::from_secs(6),
        ))
    }
}

/// Never finishes normalizing; jobs using it can only end by cancellation.
struct StallingNormalizer;

#[async_trait::async_trait]
impl AudioNormalizer for StallingNormalizer {
    async fn normalize(&self, _payload: &AudioPayload) -> Result<NormalizedAudio, NormalizeError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(NormalizeError::EmptyAudio)
    }
}

/// Pops one scripted result per call; an exhausted script returns no segments.
struct ScriptedTranscriber {
    script: Mutex<VecDeque<Result<Vec<TranscriptSegment>, TranscribeError>>>,
    calls: AtomicUsize,
}

impl ScriptedTranscriber {
    fn new(script: Vec<Result<Vec<TranscriptSegment>, TranscribeError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpeechTranscriber for ScriptedTranscriber {
    async fn transcribe(
        &self,
        _audio: &NormalizedAudio,
        _options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }
}

struct SlowTranscriber;

#[async_trait::async_trait]
impl SpeechTranscriber for SlowTranscriber {
    async fn transcribe(
        &self,
        _audio: &NormalizedAudio,
        _options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![])
    }
}

/// Tracks how many transcriptions overlap in flight.
struct GateTranscriber {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl GateTranscriber {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpeechTranscriber for GateTranscriber {
    async fn transcribe(
        &self,
        _audio: &NormalizedAudio,
        _options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![TranscriptSegment::new(0.0, 1.0, "ok".to_string())])
    }
}

struct ScriptedEnhancer {
    script: Mutex<VecDeque<Result<Vec<Result<String, EnhanceError>>, EnhanceError>>>,
    calls: AtomicUsize,
}

impl ScriptedEnhancer {
    fn new(script: Vec<Result<Vec<Result<String, EnhanceError>>, EnhanceError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TextEnhancer for ScriptedEnhancer {
    async fn enhance(&self, _request: &EnhancementRequest) -> Result<DeltaStream, EnhanceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]));
        next.map(|deltas| Box::pin(futures::stream::iter(deltas)) as DeltaStream)
    }
}

/// Emits two deltas and then hangs; jobs using it can only end by cancellation.
struct StallingEnhancer;

#[async_trait::async_trait]
impl TextEnhancer for StallingEnhancer {
    async fn enhance(&self, _request: &EnhancementRequest) -> Result<DeltaStream, EnhanceError> {
        let deltas =
            futures::stream::iter(vec![Ok("polished ".to_string()), Ok("so far".to_string())]);
        Ok(Box::pin(deltas.chain(futures::stream::pending())) as DeltaStream)
    }
}

struct FixedFactory {
    transcriber: Arc<dyn SpeechTranscriber>,
    enhancer: Arc<dyn TextEnhancer>,
}

impl AdapterFactory for FixedFactory {
    fn speech_transcriber(
        &self,
        _descriptor: &ProviderDescriptor,
    ) -> Result<Arc<dyn SpeechTranscriber>, AdapterFactoryError> {
        Ok(Arc::clone(&self.transcriber))
    }

    fn text_enhancer(
        &self,
        _descriptor: &ProviderDescriptor,
    ) -> Result<Arc<dyn TextEnhancer>, AdapterFactoryError> {
        Ok(Arc::clone(&self.enhancer))
    }
}

fn factory(transcriber: Arc<dyn SpeechTranscriber>) -> Arc<FixedFactory> {
    Arc::new(FixedFactory {
        transcriber,
        enhancer: ScriptedEnhancer::new(vec![]),
    })
}

fn enhancer_factory(enhancer: Arc<dyn TextEnhancer>) -> Arc<FixedFactory> {
    Arc::new(FixedFactory {
        transcriber: ScriptedTranscriber::new(vec![]),
        enhancer,
    })
}

struct FixedDiarizer {
    turns: Vec<SpeakerTurn>,
}

#[async_trait::async_trait]
impl Diarizer for FixedDiarizer {
    async fn diarize(&self, _audio: &NormalizedAudio) -> Result<Vec<SpeakerTurn>, DiarizeError> {
        Ok(self.turns.clone())
    }
}

struct FailingDiarizer;

#[async_trait::async_trait]
impl Diarizer for FailingDiarizer {
    async fn diarize(&self, _audio: &NormalizedAudio) -> Result<Vec<SpeakerTurn>, DiarizeError> {
        Err(DiarizeError::Unavailable("backend offline".to_string()))
    }
}

struct NullNoteStore;

#[async_trait::async_trait]
impl NoteStore for NullNoteStore {
    async fn save(&self, _user: &str, _title: &str, _body: &str) -> Result<String, NoteStoreError> {
        Ok("note-0".to_string())
    }
}

#[derive(Default)]
struct RecordingNoteStore {
    notes: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl NoteStore for RecordingNoteStore {
    async fn save(&self, user: &str, _title: &str, body: &str) -> Result<String, NoteStoreError> {
        self.notes
            .lock()
            .unwrap()
            .push((user.to_string(), body.to_string()));
        Ok("note-7".to_string())
    }
}

struct NullWebhooks;

#[async_trait::async_trait]
impl WebhookDispatcher for NullWebhooks {
    async fn notify_note_saved(&self, _user: &str, _note_id: &str) -> Result<(), WebhookError> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingWebhooks {
    notified: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl WebhookDispatcher for RecordingWebhooks {
    async fn notify_note_saved(&self, _user: &str, note_id: &str) -> Result<(), WebhookError> {
        self.notified.lock().unwrap().push(note_id.to_string());
        Ok(())
    }
}

fn descriptor(name: &str, kind: EngineKind, access: AllowList) -> ProviderDescriptor {
    ProviderDescriptor {
        name: name.to_string(),
        kind,
        endpoint: None,
        api_key: None,
        model: None,
        binary_path: None,
        model_path: None,
        enabled: true,
        access,
    }
}

fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig {
        max_local_jobs: 1,
        event_buffer: 64,
        retry_backoff: Duration::from_millis(10),
        job_retention: Duration::from_secs(60),
        sweep_interval: Duration::from_secs(60),
    }
}

fn build_coordinator(
    factory: Arc<dyn AdapterFactory>,
    diarizer: Option<Arc<dyn Diarizer>>,
    note_store: Arc<dyn NoteStore>,
    webhooks: Arc<dyn WebhookDispatcher>,
    config: CoordinatorConfig,
) -> Arc<JobCoordinator> {
    build_coordinator_with_normalizer(
        factory,
        Arc::new(PassthroughNormalizer),
        diarizer,
        note_store,
        webhooks,
        config,
    )
}

fn build_coordinator_with_normalizer(
    factory: Arc<dyn AdapterFactory>,
    normalizer: Arc<dyn AudioNormalizer>,
    diarizer: Option<Arc<dyn Diarizer>>,
    note_store: Arc<dyn NoteStore>,
    webhooks: Arc<dyn WebhookDispatcher>,
    config: CoordinatorConfig,
) -> Arc<JobCoordinator> {
    let registry = Arc::new(ProviderRegistry::new(vec![
        descriptor("stt", EngineKind::CloudWhisper, AllowList::All),
        descriptor("local-stt", EngineKind::WhisperCpp, AllowList::All),
        descriptor("llm", EngineKind::OpenAiCompatible, AllowList::All),
        descriptor(
            "vip-stt",
            EngineKind::CloudWhisper,
            AllowList::Members(HashSet::new()),
        ),
    ]));
    Arc::new(JobCoordinator::new(
        registry,
        factory,
        normalizer,
        diarizer,
        note_store,
        webhooks,
        config,
    ))
}

fn sample_payload() -> AudioPayload {
    AudioPayload::new(
        Bytes::from_static(b"fake audio"),
        Some("audio/wav".to_string()),
        Some("clip.wav".to_string()),
    )
}

fn transcription_request(provider: &str, diarize: bool, save_note: bool) -> SubmitTranscription {
    SubmitTranscription {
        user: "tester".to_string(),
        provider: provider.to_string(),
        payload: sample_payload(),
        options: TranscribeOptions::default(),
        diarize,
        save_note,
    }
}

fn enhancement_request(provider: &str) -> SubmitEnhancement {
    SubmitEnhancement {
        user: "tester".to_string(),
        provider: provider.to_string(),
        request: EnhancementRequest {
            text: "draft".to_string(),
            instruction: "fix".to_string(),
        },
    }
}

fn segments(texts: &[&str]) -> Vec<TranscriptSegment> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            TranscriptSegment::new(i as f32 * 2.0, (i as f32 + 1.0) * 2.0, text.to_string())
        })
        .collect()
}

async fn collect_events(mut rx: mpsc::Receiver<JobEvent>) -> Vec<JobEvent> {
    let mut events = Vec::new();
    loop {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(event)) => {
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => panic!("timed out waiting for job events, got {:?}", events),
        }
    }
    events
}

fn terminal_count(events: &[JobEvent]) -> usize {
    events.iter().filter(|e| e.is_terminal()).count()
}

#[tokio::test]
async fn given_successful_transcription_when_run_then_events_end_with_completed() {
    let transcriber = ScriptedTranscriber::new(vec![Ok(segments(&["one", "two"]))]);
    let coordinator = build_coordinator(
        factory(transcriber.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    assert!(matches!(
        events.first(),
        Some(JobEvent::Progress {
            stage: JobStage::Normalizing
        })
    ));
    assert!(events.iter().any(|e| matches!(
        e,
        JobEvent::Progress {
            stage: JobStage::Transcribing
        }
    )));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, JobEvent::Segment { .. }))
            .count(),
        2
    );
    assert_eq!(terminal_count(&events), 1);

    let Some(JobEvent::Completed {
        outcome: JobOutcome::Transcription(outcome),
    }) = events.last()
    else {
        panic!("expected transcription completion, got {:?}", events.last());
    };
    assert_eq!(outcome.transcript, "one two");
    assert!(outcome.speakers.is_empty());

    let job = coordinator.job(handle.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn given_transient_failure_when_transcribing_then_retries_once() {
    let transcriber = ScriptedTranscriber::new(vec![
        Err(TranscribeError::Unavailable {
            reason: "overloaded".to_string(),
            transient: true,
        }),
        Ok(segments(&["after retry"])),
    ]);
    let coordinator = build_coordinator(
        factory(transcriber.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    assert!(matches!(events.last(), Some(JobEvent::Completed { .. })));
    assert_eq!(transcriber.calls(), 2);
}

#[tokio::test]
async fn given_auth_rejection_when_transcribing_then_fails_without_retry() {
    let transcriber = ScriptedTranscriber::new(vec![Err(TranscribeError::AuthRejected(
        "bad key".to_string(),
    ))]);
    let coordinator = build_coordinator(
        factory(transcriber.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    let Some(JobEvent::Failed { code, message }) = events.last() else {
        panic!("expected failure, got {:?}", events.last());
    };
    assert_eq!(*code, FailureCode::AuthRejected);
    assert!(message.contains("bad key"));
    assert_eq!(transcriber.calls(), 1);

    let job = coordinator.job(handle.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("bad key"));
}

#[tokio::test]
async fn given_repeated_transient_failures_when_transcribing_then_job_fails() {
    let transcriber = ScriptedTranscriber::new(vec![
        Err(TranscribeError::Unavailable {
            reason: "overloaded".to_string(),
            transient: true,
        }),
        Err(TranscribeError::Unavailable {
            reason: "still overloaded".to_string(),
            transient: true,
        }),
    ]);
    let coordinator = build_coordinator(
        factory(transcriber.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    let Some(JobEvent::Failed { code, .. }) = events.last() else {
        panic!("expected failure, got {:?}", events.last());
    };
    assert_eq!(*code, FailureCode::Unavailable);
    assert_eq!(transcriber.calls(), 2);
}

#[tokio::test]
async fn given_out_of_order_segments_when_transcribing_then_emitted_sorted_by_start() {
    let scrambled = vec![
        TranscriptSegment::new(4.0, 5.0, "third".to_string()),
        TranscriptSegment::new(0.0, 2.0, "first".to_string()),
        TranscriptSegment::new(2.0, 4.0, "second".to_string()),
    ];
    let transcriber = ScriptedTranscriber::new(vec![Ok(scrambled)]);
    let coordinator = build_coordinator(
        factory(transcriber),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    let starts: Vec<f32> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Segment { segment, .. } => Some(segment.start),
            _ => None,
        })
        .collect();
    assert_eq!(starts, vec![0.0, 2.0, 4.0]);
    assert!(starts.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn given_cancellation_before_adapter_starts_then_no_adapter_call_is_made() {
    let transcriber = ScriptedTranscriber::new(vec![Ok(segments(&["never"]))]);
    let coordinator = build_coordinator_with_normalizer(
        factory(transcriber.clone()),
        Arc::new(StallingNormalizer),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    coordinator.cancel(handle.job_id).await;

    let events = collect_events(rx).await;
    assert!(matches!(events.last(), Some(JobEvent::Cancelled)));
    assert!(!events.iter().any(|e| matches!(e, JobEvent::Segment { .. })));
    assert_eq!(terminal_count(&events), 1);
    assert_eq!(transcriber.calls(), 0);
}

#[tokio::test]
async fn given_cancellation_mid_transcription_then_emits_cancelled_once() {
    let coordinator = build_coordinator(
        factory(Arc::new(SlowTranscriber)),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    coordinator.cancel(handle.job_id).await;

    let events = collect_events(rx).await;
    assert!(matches!(events.last(), Some(JobEvent::Cancelled)));
    assert_eq!(terminal_count(&events), 1);

    let job = coordinator.job(handle.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn given_cancellation_mid_enhancement_then_deltas_precede_single_cancelled() {
    let coordinator = build_coordinator(
        enhancer_factory(Arc::new(StallingEnhancer)),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_enhancement(enhancement_request("llm"))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    coordinator.cancel(handle.job_id).await;

    let events = collect_events(rx).await;

    let deltas: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Delta { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(deltas, vec!["polished ", "so far"]);
    assert!(matches!(events.last(), Some(JobEvent::Cancelled)));
    assert_eq!(terminal_count(&events), 1);

    let job = coordinator.job(handle.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn given_cancel_after_completion_then_status_stays_succeeded() {
    let transcriber = ScriptedTranscriber::new(vec![Ok(segments(&["done"]))]);
    let coordinator = build_coordinator(
        factory(transcriber),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    collect_events(rx).await;

    let status = coordinator.cancel(handle.job_id).await;
    assert_eq!(status, Some(JobStatus::Succeeded));

    let job = coordinator.job(handle.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn given_diarizer_failure_when_diarize_requested_then_warns_and_completes() {
    let transcriber = ScriptedTranscriber::new(vec![Ok(segments(&["alpha"]))]);
    let coordinator = build_coordinator(
        factory(transcriber),
        Some(Arc::new(FailingDiarizer)),
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", true, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    assert!(events.iter().any(
        |e| matches!(e, JobEvent::Warning { message } if message.contains("backend offline"))
    ));

    let Some(JobEvent::Completed {
        outcome: JobOutcome::Transcription(outcome),
    }) = events.last()
    else {
        panic!("expected completion, got {:?}", events.last());
    };
    assert!(outcome.segments.iter().all(|s| s.speaker.is_none()));
}

#[tokio::test]
async fn given_no_diarizer_configured_when_diarize_requested_then_warns_and_completes() {
    let transcriber = ScriptedTranscriber::new(vec![Ok(segments(&["alpha"]))]);
    let coordinator = build_coordinator(
        factory(transcriber),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", true, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    assert!(events.iter().any(|e| matches!(
        e,
        JobEvent::Warning { message } if message.contains("no diarization backend configured")
    )));
    assert!(matches!(events.last(), Some(JobEvent::Completed { .. })));
}

#[tokio::test]
async fn given_speaker_turns_when_transcribing_then_segments_are_labeled() {
    let transcriber = ScriptedTranscriber::new(vec![Ok(segments(&["one", "two", "three"]))]);
    let diarizer = FixedDiarizer {
        turns: vec![
            SpeakerTurn::new(0.0, 3.9, "S1"),
            SpeakerTurn::new(3.9, 6.0, "S2"),
        ],
    };
    let coordinator = build_coordinator(
        factory(transcriber),
        Some(Arc::new(diarizer)),
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", true, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    let Some(JobEvent::Completed {
        outcome: JobOutcome::Transcription(outcome),
    }) = events.last()
    else {
        panic!("expected completion, got {:?}", events.last());
    };
    assert_eq!(outcome.speakers, vec!["S1", "S2"]);
    assert_eq!(outcome.transcript, "S1: one two\n\nS2: three");

    let labeled: Vec<Option<&str>> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Segment { segment, .. } => Some(segment.speaker.as_deref()),
            _ => None,
        })
        .collect();
    assert_eq!(labeled, vec![Some("S1"), Some("S1"), Some("S2")]);
}

#[tokio::test]
async fn given_successful_enhancement_when_run_then_deltas_stream_in_order() {
    let enhancer = ScriptedEnhancer::new(vec![Ok(vec![
        Ok("polished ".to_string()),
        Ok("text".to_string()),
    ])]);
    let coordinator = build_coordinator(
        enhancer_factory(enhancer.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_enhancement(enhancement_request("llm"))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    assert!(matches!(
        events.first(),
        Some(JobEvent::Progress {
            stage: JobStage::Enhancing
        })
    ));

    let deltas: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Delta { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(deltas, vec!["polished ", "text"]);

    let Some(JobEvent::Completed {
        outcome: JobOutcome::Enhancement(outcome),
    }) = events.last()
    else {
        panic!("expected enhancement completion, got {:?}", events.last());
    };
    assert_eq!(outcome.text, "polished text");
}

#[tokio::test]
async fn given_interrupted_stream_when_enhancing_then_fails_without_retry() {
    let enhancer = ScriptedEnhancer::new(vec![Ok(vec![
        Ok("half ".to_string()),
        Err(EnhanceError::Interrupted("connection reset".to_string())),
    ])]);
    let coordinator = build_coordinator(
        enhancer_factory(enhancer.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_enhancement(enhancement_request("llm"))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    assert!(events
        .iter()
        .any(|e| matches!(e, JobEvent::Delta { text } if text == "half ")));

    let Some(JobEvent::Failed { code, .. }) = events.last() else {
        panic!("expected failure, got {:?}", events.last());
    };
    assert_eq!(*code, FailureCode::Interrupted);
    assert_eq!(enhancer.calls(), 1);
}

#[tokio::test]
async fn given_transient_establish_failure_when_enhancing_then_retries_once() {
    let enhancer = ScriptedEnhancer::new(vec![
        Err(EnhanceError::Unavailable {
            reason: "busy".to_string(),
            transient: true,
        }),
        Ok(vec![Ok("done".to_string())]),
    ]);
    let coordinator = build_coordinator(
        enhancer_factory(enhancer.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_enhancement(enhancement_request("llm"))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;

    assert!(matches!(events.last(), Some(JobEvent::Completed { .. })));
    assert_eq!(enhancer.calls(), 2);
}

#[tokio::test]
async fn given_empty_audio_when_submitting_then_rejected() {
    let coordinator = build_coordinator(
        factory(ScriptedTranscriber::new(vec![])),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let mut request = transcription_request("stt", false, false);
    request.payload = AudioPayload::new(Bytes::new(), None, None);

    let result = coordinator.submit_transcription(request).await;
    assert!(matches!(result, Err(SubmitError::EmptyAudio)));
}

#[tokio::test]
async fn given_blank_instruction_when_submitting_enhancement_then_rejected() {
    let coordinator = build_coordinator(
        enhancer_factory(ScriptedEnhancer::new(vec![])),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let mut submission = enhancement_request("llm");
    submission.request.instruction = "   ".to_string();

    let result = coordinator.submit_enhancement(submission).await;
    assert!(matches!(result, Err(SubmitError::EmptyText)));
}

#[tokio::test]
async fn given_unlisted_user_when_submitting_then_denied_before_any_adapter_call() {
    let transcriber = ScriptedTranscriber::new(vec![]);
    let coordinator = build_coordinator(
        factory(transcriber.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let result = coordinator
        .submit_transcription(transcription_request("vip-stt", false, false))
        .await;
    assert!(matches!(result, Err(SubmitError::PermissionDenied(_))));
    assert_eq!(transcriber.calls(), 0);
}

#[tokio::test]
async fn given_taken_receiver_when_subscribing_again_then_already_taken() {
    let coordinator = build_coordinator(
        factory(Arc::new(SlowTranscriber)),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();

    let first = coordinator.subscribe(handle.job_id).await;
    assert!(first.is_ok());

    let second = coordinator.subscribe(handle.job_id).await;
    assert!(matches!(second, Err(SubscribeError::AlreadyTaken)));

    coordinator.cancel(handle.job_id).await;
}

#[tokio::test]
async fn given_single_local_slot_when_two_local_jobs_then_they_serialize() {
    let gate = GateTranscriber::new();
    let coordinator = build_coordinator(
        factory(gate.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let first = coordinator
        .submit_transcription(transcription_request("local-stt", false, false))
        .await
        .unwrap();
    let second = coordinator
        .submit_transcription(transcription_request("local-stt", false, false))
        .await
        .unwrap();

    let rx1 = coordinator.subscribe(first.job_id).await.unwrap();
    let rx2 = coordinator.subscribe(second.job_id).await.unwrap();
    let events1 = collect_events(rx1).await;
    let events2 = collect_events(rx2).await;

    assert!(matches!(events1.last(), Some(JobEvent::Completed { .. })));
    assert!(matches!(events2.last(), Some(JobEvent::Completed { .. })));
    assert_eq!(gate.peak(), 1);
}

#[tokio::test]
async fn given_cloud_provider_when_two_jobs_then_they_run_concurrently() {
    let gate = GateTranscriber::new();
    let coordinator = build_coordinator(
        factory(gate.clone()),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        fast_config(),
    );

    let first = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let second = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();

    let rx1 = coordinator.subscribe(first.job_id).await.unwrap();
    let rx2 = coordinator.subscribe(second.job_id).await.unwrap();
    collect_events(rx1).await;
    collect_events(rx2).await;

    assert_eq!(gate.peak(), 2);
}

#[tokio::test]
async fn given_finished_job_past_retention_when_sweeping_then_dropped() {
    let transcriber = ScriptedTranscriber::new(vec![Ok(segments(&["done"]))]);
    let mut config = fast_config();
    config.job_retention = Duration::ZERO;
    let coordinator = build_coordinator(
        factory(transcriber),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        config,
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    collect_events(rx).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let swept = coordinator.sweep_finished().await;

    assert_eq!(swept, 1);
    assert!(coordinator.job(handle.job_id).await.is_none());
}

#[tokio::test]
async fn given_running_job_when_sweeping_then_retained() {
    let mut config = fast_config();
    config.job_retention = Duration::ZERO;
    let coordinator = build_coordinator(
        factory(Arc::new(SlowTranscriber)),
        None,
        Arc::new(NullNoteStore),
        Arc::new(NullWebhooks),
        config,
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, false))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let swept = coordinator.sweep_finished().await;

    assert_eq!(swept, 0);
    assert!(coordinator.job(handle.job_id).await.is_some());

    coordinator.cancel(handle.job_id).await;
}

#[tokio::test]
async fn given_save_note_when_transcription_completes_then_note_and_webhook_fire() {
    let note_store = Arc::new(RecordingNoteStore::default());
    let webhooks = Arc::new(RecordingWebhooks::default());
    let transcriber = ScriptedTranscriber::new(vec![Ok(segments(&["note me"]))]);
    let coordinator = build_coordinator(
        factory(transcriber),
        None,
        note_store.clone(),
        webhooks.clone(),
        fast_config(),
    );

    let handle = coordinator
        .submit_transcription(transcription_request("stt", false, true))
        .await
        .unwrap();
    let rx = coordinator.subscribe(handle.job_id).await.unwrap();
    let events = collect_events(rx).await;
    assert!(matches!(events.last(), Some(JobEvent::Completed { .. })));

    // The note hook runs on its own task after completion.
    for _ in 0..100 {
        if !webhooks.notified.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let notes = note_store.notes.lock().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, "tester");
    assert_eq!(notes[0].1, "note me");

    let notified = webhooks.notified.lock().unwrap();
    assert_eq!(notified.as_slice(), ["note-7"]);
}
