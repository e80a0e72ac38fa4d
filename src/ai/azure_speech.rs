use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{SpeechError, SpeechTranscriber};

const RECOGNITION_PATH: &str = "/speech/recognition/conversation/cognitiveservices/v1";
const AUDIO_CONTENT_TYPE: &str = "audio/wav; codecs=audio/pcm; samplerate=16000";

/// Azure Speech short-audio REST client. One request is one single-shot
/// recognition: at most one utterance comes back, nothing is segmented.
pub struct AzureSpeechClient {
    api_key: String,
    region: String,
    language: String,
    /// Overrides `https://{region}.stt.speech.microsoft.com`.
    endpoint: Option<String>,
    client: Client,
}

/// `format=simple` response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionResponse {
    recognition_status: String,
    #[serde(default)]
    display_text: Option<String>,
}

// ── helpers (also used by tests) ────────────────────────────────────

fn decode_audio(base64_audio: &str) -> Result<Vec<u8>, SpeechError> {
    if base64_audio.is_empty() {
        return Err(SpeechError::EmptyAudio);
    }
    Ok(BASE64.decode(base64_audio)?)
}

/// `Success` yields the display text; every other status is "not recognized".
fn parse_recognition(body: &str) -> Result<String, SpeechError> {
    let parsed: RecognitionResponse = serde_json::from_str(body)
        .map_err(|e| SpeechError::InvalidResponse(format!("bad JSON: {e}")))?;

    match parsed.recognition_status.as_str() {
        "Success" => Ok(parsed.display_text.unwrap_or_default()),
        _ => Err(SpeechError::NotRecognized(parsed.recognition_status)),
    }
}

impl AzureSpeechClient {
    pub fn new(
        api_key: impl Into<String>,
        region: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            region: region.into(),
            language: language.into(),
            endpoint: None,
            client: Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn recognition_url(&self) -> Result<Url, SpeechError> {
        let base = match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.stt.speech.microsoft.com", self.region),
        };
        let mut url = Url::parse(&format!("{base}{RECOGNITION_PATH}"))
            .map_err(|e| SpeechError::ConnectionError(format!("bad endpoint URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("language", &self.language)
            .append_pair("format", "simple");
        Ok(url)
    }

    async fn recognize_once(&self, audio: Vec<u8>) -> Result<String, SpeechError> {
        let url = self.recognition_url()?;

        let response = self
            .client
            .post(url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", AUDIO_CONTENT_TYPE)
            .header("Accept", "application/json")
            .body(audio)
            .send()
            .await
            .map_err(|e| SpeechError::ConnectionError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SpeechError::ConnectionError(format!("read body: {e}")))?;

        if !status.is_success() {
            return Err(SpeechError::ServiceError(format!("HTTP {status}: {body}")));
        }

        parse_recognition(&body)
    }
}

#[async_trait]
impl SpeechTranscriber for AzureSpeechClient {
    async fn transcribe(&self, base64_audio: &str) -> Result<String, SpeechError> {
        let audio = decode_audio(base64_audio).inspect_err(|e| {
            log::error!("Error in speech transcription: {e}");
        })?;
        log::debug!("Submitting {} bytes of audio for recognition", audio.len());

        match self.recognize_once(audio).await {
            Ok(text) => Ok(text),
            Err(e @ SpeechError::NotRecognized(_)) => {
                log::error!("Speech recognition failed: {e}");
                Err(e)
            }
            Err(e) => {
                log::error!("Error in speech transcription: {e:?}");
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "azure-speech"
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_valid_audio() {
        let encoded = BASE64.encode([0x52u8, 0x49, 0x46, 0x46]);
        assert_eq!(decode_audio(&encoded).unwrap(), b"RIFF");
    }

    #[test]
    fn decode_rejects_garbage() {
        match decode_audio("%%% not base64 %%%") {
            Err(SpeechError::Decode(_)) => {}
            other => panic!("expected Decode, got: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_empty_payload() {
        assert!(matches!(decode_audio(""), Err(SpeechError::EmptyAudio)));
    }

    #[test]
    fn parse_success_response() {
        let body = r#"{"RecognitionStatus":"Success","DisplayText":"Hello world.","Offset":300000,"Duration":12300000}"#;
        assert_eq!(parse_recognition(body).unwrap(), "Hello world.");
    }

    #[test]
    fn parse_no_match_response() {
        let body = r#"{"RecognitionStatus":"NoMatch","Offset":0,"Duration":0}"#;
        match parse_recognition(body) {
            Err(SpeechError::NotRecognized(status)) => assert_eq!(status, "NoMatch"),
            other => panic!("expected NotRecognized, got: {other:?}"),
        }
    }

    #[test]
    fn parse_initial_silence_is_not_recognized() {
        let body = r#"{"RecognitionStatus":"InitialSilenceTimeout"}"#;
        let err = parse_recognition(body).unwrap_err();
        assert_eq!(err.display_message(), "Error: Could not recognize speech.");
    }

    #[test]
    fn parse_invalid_json_returns_error() {
        match parse_recognition("not json") {
            Err(SpeechError::InvalidResponse(msg)) => assert!(msg.contains("bad JSON")),
            other => panic!("expected InvalidResponse, got: {other:?}"),
        }
    }

    #[test]
    fn regional_url_construction() {
        let client = AzureSpeechClient::new("key", "westeurope", "en-US");
        assert_eq!(
            client.recognition_url().unwrap().as_str(),
            "https://westeurope.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language=en-US&format=simple"
        );
    }

    #[test]
    fn endpoint_override_url_construction() {
        let client =
            AzureSpeechClient::new("key", "eastus", "de-DE").with_endpoint("http://127.0.0.1:9000/");
        assert_eq!(
            client.recognition_url().unwrap().as_str(),
            "http://127.0.0.1:9000/speech/recognition/conversation/cognitiveservices/v1?language=de-DE&format=simple"
        );
    }
}
