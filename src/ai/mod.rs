use std::sync::Arc;

use async_trait::async_trait;

use crate::settings::Settings;

pub mod azure_speech;
pub mod azure_vision;
pub mod simulated;
pub mod types;
pub use types::*;

use azure_speech::AzureSpeechClient;
use azure_vision::AzureVisionClient;
use simulated::{SimulatedSpeechClient, SimulatedVisionClient};

/// Produces a haptics-oriented description from an image and/or audio context.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, input: &AnalysisInput) -> Result<String, AiError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Turns base64-encoded audio into text with a single recognition pass.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(&self, base64_audio: &str) -> Result<String, SpeechError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Pick the live Azure OpenAI client when a key is configured, otherwise the
/// simulation. Decided once, at startup.
pub fn image_analyzer(settings: &Settings) -> Arc<dyn ImageAnalyzer> {
    if !settings.openai_configured() {
        log::warn!("Azure OpenAI API key is missing or default. Running in simulation mode.");
        return Arc::new(SimulatedVisionClient);
    }

    let mut client = AzureVisionClient::new(
        &settings.openai_endpoint,
        &settings.openai_api_key,
        &settings.openai_deployment,
    )
    .with_api_version(&settings.openai_api_version);
    if settings.use_bearer {
        client = client.with_bearer();
    }
    log::info!(
        "Image analysis via {} (deployment {})",
        client.name(),
        settings.openai_deployment
    );
    Arc::new(client)
}

/// Same selection rule as [`image_analyzer`], for the speech service.
pub fn speech_transcriber(settings: &Settings) -> Arc<dyn SpeechTranscriber> {
    if !settings.speech_configured() {
        log::warn!("Azure Speech key is missing. Simulation mode.");
        return Arc::new(SimulatedSpeechClient);
    }

    let mut client = AzureSpeechClient::new(
        &settings.speech_key,
        &settings.speech_region,
        &settings.speech_language,
    );
    if let Some(endpoint) = settings.speech_endpoint.as_deref() {
        client = client.with_endpoint(endpoint);
    }
    log::info!(
        "Speech transcription via {} (region {})",
        client.name(),
        settings.speech_region
    );
    Arc::new(client)
}
