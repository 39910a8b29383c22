mod pyannote_diarizer;

pub use pyannote_diarizer::PyannoteDiarizer;
