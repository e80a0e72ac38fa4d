/// Client-selected verbosity of the generated description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    #[default]
    Summary,
    Moderate,
    Verbose,
}

impl DetailLevel {
    /// Case-insensitive match on the raw request value. Anything that is not
    /// "verbose" or "moderate" (including absent or empty) is a summary.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("verbose") => Self::Verbose,
            Some(v) if v.eq_ignore_ascii_case("moderate") => Self::Moderate,
            _ => Self::Summary,
        }
    }

    /// Trailing clause of the system prompt.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Verbose => {
                "Provide a highly detailed, word-for-word description of the scene and audio context."
            }
            Self::Moderate => "Provide a moderate summary, capturing key elements and actions.",
            Self::Summary => "Provide a brief, high-level summary.",
        }
    }
}

/// Everything the analyzer sees of one image request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisInput {
    /// Base64 JPEG bytes, or an already formed `data:`/`http` URL.
    pub image: Option<String>,
    pub audio_text: Option<String>,
    /// Raw value from the request, kept verbatim for echoing.
    pub detail_level: Option<String>,
}

impl AnalysisInput {
    pub fn detail(&self) -> DetailLevel {
        DetailLevel::parse(self.detail_level.as_deref())
    }
}

/// Error type for chat-completion operations
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Connection failed: {0}")]
    ConnectionError(String),
    #[error("Authentication failed: {0}")]
    AuthError(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Model error: {0}")]
    ModelError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error type for speech recognition. Never reaches the client as a failure
/// status; see [`SpeechError::display_message`].
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("No audio data provided")]
    EmptyAudio,
    #[error("Invalid base64 audio: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Connection failed: {0}")]
    ConnectionError(String),
    #[error("Speech service error: {0}")]
    ServiceError(String),
    #[error("Speech not recognized ({0})")]
    NotRecognized(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SpeechError {
    /// Text returned in place of a transcript.
    pub fn display_message(&self) -> String {
        match self {
            Self::NotRecognized(_) => "Error: Could not recognize speech.".to_string(),
            other => format!("Error: {other}"),
        }
    }
}
