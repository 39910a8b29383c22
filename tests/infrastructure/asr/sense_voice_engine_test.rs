use std::time::Duration;

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::post;
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use susurro::application::ports::{SpeechTranscriber, TranscribeError, TranscribeOptions};
use susurro::domain::NormalizedAudio;
use susurro::infrastructure::asr::{AsrTimeouts, SenseVoiceEngine, strip_rich_tags};

#[test]
fn given_language_and_speech_tags_when_stripping_then_plain_text_without_tag() {
    let (text, tag) = strip_rich_tags("<|en|><|NEUTRAL|><|Speech|> hello there");

    assert_eq!(text, "hello there");
    assert!(tag.is_none());
}

#[test]
fn given_emotion_tag_when_stripping_then_emotion_reported() {
    let (text, tag) = strip_rich_tags("<|en|><|HAPPY|><|Speech|>great news");

    assert_eq!(text, "great news");
    assert_eq!(tag.as_deref(), Some("HAPPY"));
}

#[test]
fn given_neutral_emotion_and_event_when_stripping_then_event_reported() {
    let (_, tag) = strip_rich_tags("<|en|><|NEUTRAL|><|Laughter|>haha");

    assert_eq!(tag.as_deref(), Some("Laughter"));
}

#[test]
fn given_unknown_emotion_and_background_music_when_stripping_then_event_reported() {
    let (_, tag) = strip_rich_tags("<|zh|><|EMO_UNKNOWN|><|BGM|>la la la");

    assert_eq!(tag.as_deref(), Some("BGM"));
}

#[test]
fn given_real_emotion_and_event_when_stripping_then_emotion_wins() {
    let (_, tag) = strip_rich_tags("<|en|><|SAD|><|Laughter|>nervous laugh");

    assert_eq!(tag.as_deref(), Some("SAD"));
}

#[test]
fn given_untagged_text_when_stripping_then_passthrough() {
    let (text, tag) = strip_rich_tags("no tags here");

    assert_eq!(text, "no tags here");
    assert!(tag.is_none());
}

async fn start_mock_sidecar(
    response_status: u16,
    response_body: &'static str,
) -> (String, oneshot::Sender<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = Router::new().route(
        "/api/v1/transcribe",
        post(move || async move {
            let status = axum::http::StatusCode::from_u16(response_status).unwrap();
            (status, response_body).into_response()
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    (base_url, shutdown_tx)
}

fn engine(base_url: &str) -> SenseVoiceEngine {
    SenseVoiceEngine::new(
        reqwest::Client::new(),
        base_url.to_string(),
        AsrTimeouts {
            floor: Duration::from_secs(5),
            per_audio_minute: Duration::from_secs(5),
        },
    )
}

fn short_audio() -> NormalizedAudio {
    NormalizedAudio::new(Bytes::from_static(b"fake wav"), 16_000, Duration::from_secs(10))
}

#[tokio::test]
async fn given_tagged_segments_when_transcribing_then_tags_become_labels() {
    let response_body = r#"{
        "segments": [
            {"start": 0.0, "end": 2.5, "text": "<|en|><|HAPPY|><|Speech|>good morning"},
            {"start": 2.5, "end": 3.0, "text": "<|en|><|NEUTRAL|><|Speech|>"}
        ]
    }"#;
    let (base_url, shutdown_tx) = start_mock_sidecar(200, response_body).await;

    let result = engine(&base_url)
        .transcribe(&short_audio(), &TranscribeOptions::default())
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].text, "good morning");
    assert_eq!(result[0].tag.as_deref(), Some("HAPPY"));
    assert_eq!(result[0].end, 2.5);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_sidecar_overloaded_when_transcribing_then_transient_unavailable() {
    let (base_url, shutdown_tx) = start_mock_sidecar(503, "busy").await;

    let result = engine(&base_url)
        .transcribe(&short_audio(), &TranscribeOptions::default())
        .await;

    assert!(matches!(
        result,
        Err(TranscribeError::Unavailable { transient: true, .. })
    ));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_empty_endpoint_when_transcribing_then_unavailable() {
    let result = engine("")
        .transcribe(&short_audio(), &TranscribeOptions::default())
        .await;

    assert!(matches!(
        result,
        Err(TranscribeError::Unavailable { transient: false, .. })
    ));
}
