use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::application::ports::{SpeechTranscriber, TranscribeError, TranscribeOptions};
use crate::domain::{NormalizedAudio, TranscriptSegment};

use super::http::AsrTimeouts;

/// Runs the whisper.cpp CLI against a staged WAV file and reads back the
/// JSON transcript it writes. The child never outlives the job: the deadline
/// kills it, and a dropped future kills it through `kill_on_drop`.
pub struct WhisperCppEngine {
    binary: PathBuf,
    model: PathBuf,
    timeouts: AsrTimeouts,
    kill_grace: Duration,
}

impl WhisperCppEngine {
    pub fn new(
        binary: PathBuf,
        model: PathBuf,
        timeouts: AsrTimeouts,
        kill_grace: Duration,
    ) -> Self {
        Self {
            binary,
            model,
            timeouts,
            kill_grace,
        }
    }
}

#[derive(Deserialize)]
struct WhisperCppOutput {
    #[serde(default)]
    transcription: Vec<WhisperCppSegment>,
}

#[derive(Deserialize)]
struct WhisperCppSegment {
    offsets: SegmentOffsets,
    text: String,
}

#[derive(Deserialize)]
struct SegmentOffsets {
    from: u64,
    to: u64,
}

#[async_trait]
impl SpeechTranscriber for WhisperCppEngine {
    async fn transcribe(
        &self,
        audio: &NormalizedAudio,
        options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        if self.binary.as_os_str().is_empty() || !self.binary.exists() {
            return Err(TranscribeError::Unavailable {
                reason: format!("whisper.cpp binary not found: {}", self.binary.display()),
                transient: false,
            });
        }
        if self.model.as_os_str().is_empty() || !self.model.exists() {
            return Err(TranscribeError::Unavailable {
                reason: format!("model file not found: {}", self.model.display()),
                transient: false,
            });
        }

        let workdir = tempfile::tempdir().map_err(|e| TranscribeError::Unavailable {
            reason: format!("scratch dir: {}", e),
            transient: false,
        })?;
        let wav_path = workdir.path().join("input.wav");
        let output_stem = workdir.path().join("transcript");
        let stderr_path = workdir.path().join("stderr.log");

        tokio::fs::write(&wav_path, &audio.wav)
            .await
            .map_err(|e| TranscribeError::Unavailable {
                reason: format!("stage audio: {}", e),
                transient: false,
            })?;

        let stderr_file =
            std::fs::File::create(&stderr_path).map_err(|e| TranscribeError::Unavailable {
                reason: format!("stderr log: {}", e),
                transient: false,
            })?;

        let mut command = Command::new(&self.binary);
        command
            .arg("-m")
            .arg(&self.model)
            .arg("-f")
            .arg(&wav_path)
            .arg("-oj")
            .arg("-of")
            .arg(&output_stem)
            .arg("-np")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file))
            .kill_on_drop(true);
        if let Some(language) = &options.language {
            command.arg("-l").arg(language);
        }

        let timeout = self.timeouts.for_duration(audio.duration);
        tracing::debug!(
            binary = %self.binary.display(),
            timeout_secs = timeout.as_secs(),
            "Spawning whisper.cpp"
        );

        let mut child = command.spawn().map_err(|e| TranscribeError::Unavailable {
            reason: format!("spawn {}: {}", self.binary.display(), e),
            transient: false,
        })?;

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                return Err(TranscribeError::Unavailable {
                    reason: format!("wait: {}", e),
                    transient: false,
                });
            }
            Err(_) => {
                let _ = child.start_kill();
                if tokio::time::timeout(self.kill_grace, child.wait())
                    .await
                    .is_err()
                {
                    tracing::warn!("Timed-out whisper.cpp process did not exit after kill");
                }
                return Err(TranscribeError::Timeout(timeout));
            }
        };

        if !status.success() {
            let stderr_tail = tokio::fs::read_to_string(&stderr_path)
                .await
                .map(|s| tail(&s, 400))
                .unwrap_or_default();
            return Err(TranscribeError::Unavailable {
                reason: format!("whisper.cpp exited with {}: {}", status, stderr_tail),
                transient: false,
            });
        }

        let json_path = output_stem.with_extension("json");
        let raw = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            TranscribeError::Malformed(format!("transcript output missing: {}", e))
        })?;
        let output: WhisperCppOutput = serde_json::from_str(&raw)
            .map_err(|e| TranscribeError::Malformed(format!("transcript parse: {}", e)))?;

        let segments: Vec<TranscriptSegment> = output
            .transcription
            .into_iter()
            .map(|s| {
                TranscriptSegment::new(
                    s.offsets.from as f32 / 1000.0,
                    s.offsets.to as f32 / 1000.0,
                    s.text.trim().to_string(),
                )
            })
            .filter(|s| !s.text.is_empty())
            .collect();

        tracing::info!(segments = segments.len(), "whisper.cpp transcription completed");
        Ok(segments)
    }
}

fn tail(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let start = trimmed
        .char_indices()
        .rev()
        .nth(max_chars.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    trimmed[start..].to_string()
}
