use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use super::{AiError, AnalysisInput, DetailLevel, ImageAnalyzer};

pub const NO_INPUT_MESSAGE: &str = "No input provided.";
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

const MAX_TOKENS: u32 = 500;
const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";
const SYSTEM_PREAMBLE: &str = "You are an assistant for a deaf-blind user. \
    Analyze the provided image and audio text. \
    Output a description that will be converted to vibrations/haptics. ";

/// Azure OpenAI chat-completions client for image + audio-context analysis.
pub struct AzureVisionClient {
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    client: Client,
    /// When true, use `Authorization: Bearer` instead of `api-key` header.
    use_bearer: bool,
}

pub fn system_prompt(level: DetailLevel) -> String {
    format!("{SYSTEM_PREAMBLE}{}", level.instruction())
}

/// Raw base64 is assumed to be JPEG; URLs pass through untouched.
pub fn image_url(image: &str) -> String {
    if image.starts_with("http") || image.starts_with("data:") {
        image.to_string()
    } else {
        format!("{JPEG_DATA_URL_PREFIX}{image}")
    }
}

/// Build the system + user messages. Returns `None` when the request carries
/// neither audio text nor an image.
pub fn build_messages(input: &AnalysisInput) -> Option<Value> {
    let mut content = Vec::new();

    if let Some(text) = input.audio_text.as_deref().filter(|t| !t.is_empty()) {
        content.push(json!({ "type": "text", "text": format!("Audio Context: {text}") }));
    }
    if let Some(image) = input.image.as_deref().filter(|i| !i.is_empty()) {
        content.push(json!({ "type": "image_url", "image_url": { "url": image_url(image) } }));
    }

    if content.is_empty() {
        return None;
    }

    Some(json!([
        { "role": "system", "content": system_prompt(input.detail()) },
        { "role": "user", "content": content }
    ]))
}

fn parse_completion(body: &Value) -> Result<String, AiError> {
    if let Some(message) = body.pointer("/error/message").and_then(Value::as_str) {
        return Err(AiError::ModelError(message.to_string()));
    }
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AiError::InvalidResponse("missing choices[0].message.content".into()))
}

impl AzureVisionClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client: Client::new(),
            use_bearer: false,
        }
    }

    /// Create a client that uses Bearer token auth (for Entra ID / AAD).
    pub fn with_bearer(mut self) -> Self {
        self.use_bearer = true;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn completions_url(&self) -> Result<Url, AiError> {
        let mut url = Url::parse(&format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
        ))
        .map_err(|e| AiError::ConnectionError(format!("bad endpoint URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    fn build_request_body(&self, messages: Value) -> Value {
        json!({
            "messages": messages,
            "max_tokens": MAX_TOKENS
        })
    }

    async fn complete(&self, body: &Value) -> Result<String, AiError> {
        let url = self.completions_url()?;

        let mut req = self
            .client
            .post(url)
            .header("Content-Type", "application/json");

        req = if self.use_bearer {
            req.header("Authorization", format!("Bearer {}", self.api_key))
        } else {
            req.header("api-key", &self.api_key)
        };

        let response = req
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".into());

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AiError::AuthError(error_body));
            }
            if status.as_u16() == 429 {
                return Err(AiError::RateLimited(error_body));
            }
            return Err(AiError::ConnectionError(format!(
                "HTTP {}: {}",
                status, error_body
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(format!("bad JSON: {e}")))?;
        parse_completion(&parsed)
    }
}

#[async_trait]
impl ImageAnalyzer for AzureVisionClient {
    async fn analyze(&self, input: &AnalysisInput) -> Result<String, AiError> {
        let Some(messages) = build_messages(input) else {
            log::warn!("No content items provided in request.");
            return Ok(NO_INPUT_MESSAGE.to_string());
        };

        let body = self.build_request_body(messages);
        log::info!("Sending request to Azure OpenAI ({})", self.deployment);

        match self.complete(&body).await {
            Ok(text) => {
                log::info!("Received response from Azure OpenAI.");
                Ok(text)
            }
            Err(e) => {
                log::error!("Error processing request with Azure OpenAI: {e:?}");
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "azure-openai-chat"
    }
}
