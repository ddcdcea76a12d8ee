use serde::{Deserialize, Serialize};

/// Output of the speech-to-text collaborator for an intake recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub transcript: String,
    pub confidence: f32,
    #[serde(default)]
    pub language: Option<String>,
}

impl Transcription {
    /// Transcripts below the threshold (or with no usable score) go to a human.
    pub fn needs_review(&self, threshold: f32) -> bool {
        self.confidence.is_nan() || self.confidence < threshold
    }
}
