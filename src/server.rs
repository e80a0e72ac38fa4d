// server.rs — HTTP surface: two JSON endpoints in front of the AI clients.
//
// Every successful response is appended to the interaction log before it is
// returned. Image-analysis failures become a 500; speech failures are folded
// into the success envelope as an "Error: ..." transcription.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::ai::{self, AiError, AnalysisInput, ImageAnalyzer, SpeechTranscriber};
use crate::interaction_log::InteractionLog;
use crate::settings::Settings;

pub const IMAGE_ANALYSIS_LOG_TYPE: &str = "image_analysis";
pub const AUDIO_TRANSCRIPTION_LOG_TYPE: &str = "audio_transcription";
const STATUS_SUCCESS: &str = "success";

/// Body of `POST /api/analysis/image`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRequest {
    pub image: Option<String>,
    pub audio_text: Option<String>,
    /// Client capture time; string or number, only logged.
    pub timestamp: Option<Value>,
    pub detail_level: Option<String>,
}

/// Body of `POST /api/analysis/audio`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioRequest {
    /// Base64 audio. Null and absent are both treated as empty.
    pub audio_data: Option<String>,
    /// e.g. "wav", "mp3"; accepted but not used to pick a decoder.
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnalysisResponse {
    pub description: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub transcription: String,
    pub status: String,
}

impl From<AnalysisRequest> for AnalysisInput {
    fn from(request: AnalysisRequest) -> Self {
        Self {
            image: request.image,
            audio_text: request.audio_text,
            detail_level: request.detail_level,
        }
    }
}

/// A failed image analysis, surfaced as a server error.
#[derive(Debug)]
pub struct AnalysisFailure(AiError);

impl IntoResponse for AnalysisFailure {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": format!("Failed to process request: {}", self.0),
            })),
        )
            .into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<dyn ImageAnalyzer>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
    pub log: InteractionLog,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            analyzer: ai::image_analyzer(settings),
            transcriber: ai::speech_transcriber(settings),
            log: InteractionLog::new(&settings.log_file),
        }
    }
}

async fn analyze_image(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<ImageAnalysisResponse>, AnalysisFailure> {
    log::info!(
        "Processing request with detail level: {}",
        request.detail_level.as_deref().unwrap_or("null")
    );
    if let Some(timestamp) = request.timestamp.as_ref().filter(|t| !t.is_null()) {
        log::debug!("Client capture timestamp: {timestamp}");
    }

    let description = state
        .analyzer
        .analyze(&request.into())
        .await
        .map_err(AnalysisFailure)?;

    let response = ImageAnalysisResponse {
        description,
        status: STATUS_SUCCESS.to_string(),
    };
    state.log.record(IMAGE_ANALYSIS_LOG_TYPE, &response).await;
    Ok(Json(response))
}

async fn transcribe_audio(
    State(state): State<AppState>,
    Json(request): Json<AudioRequest>,
) -> Json<TranscriptionResponse> {
    let audio_data = request.audio_data.as_deref().unwrap_or("");
    log::debug!(
        "Audio request: {} base64 chars, format {}",
        audio_data.len(),
        request.format.as_deref().unwrap_or("unspecified")
    );

    let transcription = match state.transcriber.transcribe(audio_data).await {
        Ok(text) => text,
        Err(e) => e.display_message(),
    };

    let response = TranscriptionResponse {
        transcription,
        status: STATUS_SUCCESS.to_string(),
    };
    state.log.record(AUDIO_TRANSCRIPTION_LOG_TYPE, &response).await;
    Json(response)
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/analysis/image", post(analyze_image))
        .route("/api/analysis/audio", post(transcribe_audio))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .with_state(state)
}

/// Bind `settings.bind_address` and serve until Ctrl-C.
pub async fn serve(settings: Settings) -> std::io::Result<()> {
    let state = AppState::from_settings(&settings);
    let app = router(state, settings.max_body_bytes);

    let listener = TcpListener::bind(&settings.bind_address).await?;
    log::info!(
        "Listening on {} (interaction log: {})",
        listener.local_addr()?,
        settings.log_file.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
