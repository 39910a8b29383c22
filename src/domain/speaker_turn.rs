#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerTurn {
    pub start: f32,
    pub end: f32,
    pub speaker: String,
}

impl SpeakerTurn {
    pub fn new(start: f32, end: f32, speaker: impl Into<String>) -> Self {
        Self {
            start,
            end,
            speaker: speaker.into(),
        }
    }
}
