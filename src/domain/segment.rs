#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f32,
    pub end: f32,
    pub text: String,
    pub speaker: Option<String>,
    pub tag: Option<String>,
}

impl TranscriptSegment {
    pub fn new(start: f32, end: f32, text: String) -> Self {
        Self {
            start,
            end,
            text,
            speaker: None,
            tag: None,
        }
    }

    pub fn with_tag(start: f32, end: f32, text: String, tag: Option<String>) -> Self {
        Self {
            start,
            end,
            text,
            speaker: None,
            tag,
        }
    }
}
