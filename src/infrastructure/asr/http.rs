use std::time::Duration;

use reqwest::StatusCode;

use crate::application::ports::TranscribeError;

/// Per-request deadline scaled to the length of the audio being sent.
#[derive(Debug, Clone, Copy)]
pub struct AsrTimeouts {
    pub floor: Duration,
    pub per_audio_minute: Duration,
}

impl AsrTimeouts {
    pub fn for_duration(&self, audio: Duration) -> Duration {
        let minutes = audio.as_secs_f64() / 60.0;
        self.floor + self.per_audio_minute.mul_f64(minutes)
    }
}

impl Default for AsrTimeouts {
    fn default() -> Self {
        Self {
            floor: Duration::from_secs(30),
            per_audio_minute: Duration::from_secs(30),
        }
    }
}

pub fn map_status(status: StatusCode, body: String) -> TranscribeError {
    let reason = format!("status {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TranscribeError::AuthRejected(reason),
        StatusCode::TOO_MANY_REQUESTS => TranscribeError::Unavailable {
            reason,
            transient: true,
        },
        StatusCode::BAD_REQUEST
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNSUPPORTED_MEDIA_TYPE
        | StatusCode::UNPROCESSABLE_ENTITY => TranscribeError::Malformed(reason),
        s if s.is_server_error() => TranscribeError::Unavailable {
            reason,
            transient: true,
        },
        _ => TranscribeError::Unavailable {
            reason,
            transient: false,
        },
    }
}

pub fn map_request_error(e: reqwest::Error, timeout: Duration) -> TranscribeError {
    if e.is_timeout() {
        TranscribeError::Timeout(timeout)
    } else if e.is_connect() {
        TranscribeError::Unavailable {
            reason: e.to_string(),
            transient: true,
        }
    } else {
        TranscribeError::Unavailable {
            reason: e.to_string(),
            transient: false,
        }
    }
}
