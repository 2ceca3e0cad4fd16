use crate::config::AiConfig;
use serde_json::json;
use std::time::Duration;

/// Errors from the generative AI backend.
#[derive(Debug, thiserror::Error)]
pub enum DermatoError {
    #[error("AI API key is not configured")]
    NotConfigured,
    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI API error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("AI response contained no text")]
    EmptyResponse,
}

/// Client for the Gemini `generateContent` REST API, configured as a
/// dermatology assistant.
pub struct Dermato {
    base_url: String,
    model: String,
    api_key: Option<String>,
    instruction: String,
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
    client: reqwest::Client,
}

impl Dermato {
    pub fn new(config: &AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            instruction: config.instruction.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().map_or(false, |k| !k.is_empty())
    }

    fn endpoint(&self, action: &str) -> Result<String, DermatoError> {
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(DermatoError::NotConfigured)?;
        Ok(format!(
            "{}/v1beta/models/{}:{}?key={}",
            self.base_url, self.model, action, key
        ))
    }

    /// Ask for a text reply to a text question.
    pub async fn generate(&self, message: &str) -> Result<String, DermatoError> {
        let parts = vec![json!({ "text": message })];
        self.generate_content(parts).await
    }

    /// Ask about an image. `data` is the raw image already base64-encoded
    /// by the caller (it travels that way in the request body).
    pub async fn generate_with_image(
        &self,
        message: &str,
        mime_type: &str,
        data: &str,
    ) -> Result<String, DermatoError> {
        let parts = vec![
            json!({ "text": message }),
            json!({
                "inline_data": {
                    "mime_type": mime_type,
                    "data": data,
                }
            }),
        ];
        self.generate_content(parts).await
    }

    async fn generate_content(
        &self,
        parts: Vec<serde_json::Value>,
    ) -> Result<String, DermatoError> {
        let url = self.endpoint("generateContent")?;

        let body = json!({
            "system_instruction": {
                "parts": [{ "text": self.instruction }]
            },
            "contents": [{
                "role": "user",
                "parts": parts,
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "topP": self.top_p,
                "topK": self.top_k,
                "maxOutputTokens": self.max_output_tokens,
            },
        });

        let resp = self.client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(DermatoError::Api { status, body });
        }

        let json: serde_json::Value = resp.json().await?;
        json.pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(DermatoError::EmptyResponse)
    }

    /// Cheap round trip used by health checks.
    pub async fn count_tokens(&self) -> Result<i64, DermatoError> {
        let url = self.endpoint("countTokens")?;

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": "ping" }],
            }],
        });

        let resp = self.client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(DermatoError::Api { status, body });
        }

        let json: serde_json::Value = resp.json().await?;
        json.pointer("/totalTokens")
            .and_then(|v| v.as_i64())
            .ok_or(DermatoError::EmptyResponse)
    }
}
