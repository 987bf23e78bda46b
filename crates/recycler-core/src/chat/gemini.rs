//! ============================================================================
//! Gemini Client - generateContent via REST
//! ============================================================================
//! Single-turn calls: the persona prompt goes into `systemInstruction`, the
//! user message is the only content entry.
//! ============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatBackend, Persona};
use crate::config::{ShopConfig, DEFAULT_CHAT_MODEL};

/// Base URL for model endpoints
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Build from config; fails when no API key is configured
    pub fn from_config(config: &ShopConfig) -> Result<Self> {
        let api_key = config
            .chat_api_key
            .clone()
            .ok_or_else(|| anyhow!("GEMINI_API_KEY is not set"))?;
        Ok(Self::new(api_key).with_model(config.chat_model.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.model)
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn reply(&self, persona: &Persona, message: &str) -> Result<String> {
        debug!("Calling {} as {}", self.model, persona.name);

        let request = GenerateRequest::new(persona, message);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to call Gemini API: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error {}: {}", status, body));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse Gemini response: {}", e))?;

        Ok(generated.text())
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn new(persona: &Persona, message: &str) -> Self {
        Self {
            system_instruction: Content::text(None, &persona.system_prompt),
            contents: vec![Content::text(Some("user"), message)],
            generation_config: GenerationConfig {
                temperature: persona.temperature,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.to_string() }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated. Empty if none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_uses_model() {
        let client = GeminiClient::new("key".into()).with_model("gemini-test");
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(GeminiClient::from_config(&ShopConfig::default()).is_err());

        let config = ShopConfig {
            chat_api_key: Some("key".into()),
            ..ShopConfig::default()
        };
        let client = GeminiClient::from_config(&config).unwrap();
        assert_eq!(client.model(), DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn test_request_shape() {
        let persona = Persona::customer_service();
        let request = GenerateRequest::new(&persona, "ada RTX bekas?");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], json!(persona.system_prompt));
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], json!("user"));
        assert_eq!(value["contents"][0]["parts"][0]["text"], json!("ada RTX bekas?"));
        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "Watch " }, { "text": "this!" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(response.text(), "Watch this!");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), "");

        let blocked: GenerateResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap();
        assert_eq!(blocked.text(), "");
    }
}
