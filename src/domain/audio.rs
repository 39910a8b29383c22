use std::time::Duration;

use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl AudioPayload {
    pub fn new(bytes: Bytes, content_type: Option<String>, filename: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
            filename,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedAudio {
    pub wav: Bytes,
    pub sample_rate: u32,
    pub duration: Duration,
}

impl NormalizedAudio {
    pub fn new(wav: Bytes, sample_rate: u32, duration: Duration) -> Self {
        Self {
            wav,
            sample_rate,
            duration,
        }
    }
}
