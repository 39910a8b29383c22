use crate::domain::{SpeakerTurn, TranscriptSegment};

/// Labels each segment with the speaker whose turn overlaps it the most.
/// Equal overlap goes to the turn that starts earlier; zero overlap leaves
/// the segment unlabeled. Segment order and count never change.
pub fn assign_speakers(segments: &mut [TranscriptSegment], turns: &[SpeakerTurn]) {
    let mut ordered: Vec<&SpeakerTurn> = turns.iter().collect();
    ordered.sort_by(|a, b| {
        a.start
            .total_cmp(&b.start)
            .then_with(|| a.end.total_cmp(&b.end))
    });

    for segment in segments.iter_mut() {
        let mut best: Option<(&SpeakerTurn, f32)> = None;
        for turn in &ordered {
            let shared = overlap(segment, turn);
            if shared <= 0.0 {
                continue;
            }
            match best {
                Some((_, best_overlap)) if shared <= best_overlap => {}
                _ => best = Some((turn, shared)),
            }
        }
        segment.speaker = best.map(|(turn, _)| turn.speaker.clone());
    }
}

fn overlap(segment: &TranscriptSegment, turn: &SpeakerTurn) -> f32 {
    (segment.end.min(turn.end) - segment.start.max(turn.start)).max(0.0)
}

/// Collapses consecutive segments by the same speaker into one block of text.
pub fn coalesce_turns(segments: &[TranscriptSegment]) -> Vec<(Option<String>, String)> {
    let mut blocks: Vec<(Option<String>, String)> = Vec::new();
    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }
        match blocks.last_mut() {
            Some((speaker, body)) if *speaker == segment.speaker => {
                body.push(' ');
                body.push_str(text);
            }
            _ => blocks.push((segment.speaker.clone(), text.to_string())),
        }
    }
    blocks
}

pub fn render_transcript(segments: &[TranscriptSegment]) -> String {
    let blocks = coalesce_turns(segments);
    let mut paragraphs = Vec::with_capacity(blocks.len());
    for (speaker, body) in blocks {
        match speaker {
            Some(speaker) => paragraphs.push(format!("{}: {}", speaker, body)),
            None => paragraphs.push(body),
        }
    }
    paragraphs.join("\n\n")
}

pub fn distinct_speakers(segments: &[TranscriptSegment]) -> Vec<String> {
    let mut speakers: Vec<String> = Vec::new();
    for segment in segments {
        if let Some(speaker) = &segment.speaker {
            if !speakers.iter().any(|s| s == speaker) {
                speakers.push(speaker.clone());
            }
        }
    }
    speakers
}
