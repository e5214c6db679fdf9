//! Gemini client with sensible defaults.
//!
//! Thin wrapper over the generateContent REST API, shared by the summarizer
//! and the generative action-item extractor.

use crate::config::GeminiSettings;
use crate::error::{ReferatError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default timeout for Gemini API requests (2 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new client. The API key may be empty; it is checked at call
    /// time so mock-mode deployments can start without a credential.
    pub fn new(settings: &GeminiSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: settings.api_key.trim().to_string(),
            model: settings.model.clone(),
        }
    }

    /// Generate text from a system instruction and a user prompt.
    pub async fn generate(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(ReferatError::Capability(
                "GEMINI_API_KEY is required for generation".to_string(),
            ));
        }

        let request_body = GenerateContentRequest {
            system_instruction: Instruction {
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            contents: vec![Content {
                parts: vec![Part {
                    text: user.to_string(),
                }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        debug!("Calling Gemini generateContent with model {}", self.model);

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                GEMINI_API_BASE, self.model
            ))
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReferatError::Upstream(format!(
                "Gemini request failed ({}): {}",
                status, body
            )));
        }

        let content: GenerateContentResponse = response.json().await?;

        let text = content
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ReferatError::Upstream(
                "Gemini returned an empty response".to_string(),
            ));
        }

        debug!("Gemini returned {} characters", text.len());
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Instruction,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Instruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}
