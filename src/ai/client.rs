//! Gemini `generateContent` client.
//!
//! Blocking reqwest client (no async runtime required); called from the
//! analysis worker thread, never from the UI thread.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompt::{build_prompt, response_schema};
use super::types::{AiError, DashboardConfig, DashboardGenerator};
use crate::config::AiSettings;
use crate::data::model::Dataset;

const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_base: String,
    model: String,
    api_key_env: String,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &AiSettings) -> Result<Self, AiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key_env: settings.api_key_env.clone(),
        })
    }

    fn api_key(&self) -> Result<String, AiError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(AiError::MissingApiKey {
                var: self.api_key_env.clone(),
            }),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn send_json(&self, body: &impl Serialize) -> Result<String, AiError> {
        let api_key = self.api_key()?;
        let url = self.endpoint();
        log::debug!("POST {url}");

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .map_err(|e| AiError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| AiError::ApiRequest(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(AiError::ApiResponse { status, body: text });
        }
        Ok(text)
    }
}

impl DashboardGenerator for GeminiClient {
    fn generate(&self, dataset: &Dataset) -> Result<DashboardConfig, AiError> {
        let prompt = build_prompt(dataset);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        };
        let text = self.send_json(&body)?;
        parse_generate_response(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Extract the model text from a `generateContent` body and decode it.
fn parse_generate_response(body: &str) -> Result<DashboardConfig, AiError> {
    let resp: GenerateResponse =
        serde_json::from_str(body).map_err(|e| AiError::ApiParse(e.to_string()))?;

    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    parse_dashboard_text(&text)
}

/// Decode the JSON text the model produced. Tolerates a Markdown fence.
fn parse_dashboard_text(text: &str) -> Result<DashboardConfig, AiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    let json = strip_code_fence(trimmed);
    let config: DashboardConfig =
        serde_json::from_str(json).map_err(|e| AiError::ApiParse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
