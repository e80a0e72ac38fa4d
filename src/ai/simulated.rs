// simulated.rs — Offline stand-ins used when no Azure credential is configured.

use async_trait::async_trait;

use super::{AiError, AnalysisInput, ImageAnalyzer, SpeechError, SpeechTranscriber};

pub const SIMULATED_TRANSCRIPT: &str = "Simulation: This is a transcribed text from audio.";

/// Echoes the request back without touching the network.
pub struct SimulatedVisionClient;

/// Returns a canned transcript; the audio is never decoded.
pub struct SimulatedSpeechClient;

/// Absent values render as `null`, present ones verbatim.
fn or_null(value: Option<&str>) -> &str {
    value.unwrap_or("null")
}

pub fn simulated_description(input: &AnalysisInput) -> String {
    format!(
        "Simulation: Backend received image and audio. Detail level: {}. Audio text: {}",
        or_null(input.detail_level.as_deref()),
        or_null(input.audio_text.as_deref()),
    )
}

#[async_trait]
impl ImageAnalyzer for SimulatedVisionClient {
    async fn analyze(&self, input: &AnalysisInput) -> Result<String, AiError> {
        Ok(simulated_description(input))
    }

    fn name(&self) -> &str {
        "simulated-vision"
    }
}

#[async_trait]
impl SpeechTranscriber for SimulatedSpeechClient {
    async fn transcribe(&self, _base64_audio: &str) -> Result<String, SpeechError> {
        Ok(SIMULATED_TRANSCRIPT.to_string())
    }

    fn name(&self) -> &str {
        "simulated-speech"
    }
}
