//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! This module provides a reqwest-based implementation of the
//! [`PlanGenerator`](crate::PlanGenerator) and [`NutritionChat`](crate::NutritionChat) traits.

use crate::config::GeminiConfig;
use crate::retry::RetryPolicy;
use crate::utils::long_date_pt_br;
use crate::{DailyPlan, GenerationError, NutritionChat, PlanGenerator, UserProfile, prompts};
use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CHAT_FALLBACK_EMPTY: &str = "Desculpe, não consegui formular uma resposta agora.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for the Gemini API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestGeminiClient {
    base_url: String,
    model: String,
    api_key: SecretString,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl ReqwestGeminiClient {
    /// Create a new client from configuration.
    ///
    /// The configured timeout bounds every single attempt; retries are governed by
    /// `max_retries`.
    pub fn new(config: &GeminiConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Config(format!("building http client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                ..RetryPolicy::default()
            },
            client,
        })
    }

    /// Override the retry policy (tests use a near-zero base delay).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Send one prompt and return the concatenated text of the first candidate.
    async fn generate_text(
        &self,
        prompt: String,
        generation_config: Option<GenerationConfig>,
    ) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config,
        };
        let url = self.endpoint();
        self.retry
            .retry_async_if(|| self.send_once(&url, &body), GenerationError::is_retryable)
            .await
    }

    async fn send_once(
        &self,
        url: &str,
        body: &GenerateContentRequest,
    ) -> Result<String, GenerationError> {
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "generator request failed");
            return Err(error_from_body(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            let snippet: String = text.chars().take(256).collect();
            GenerationError::Decode(format!("{e} - body: {snippet}"))
        })?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyResponse)?;
        if let Some(reason) = candidate.finish_reason.as_deref() {
            debug!(finish_reason = reason, "generator finished");
        }
        let out: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();
        if out.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(out)
    }
}

/// Extract the service's error message when the body has the usual `{"error": {...}}` shape.
fn error_from_body(status: u16, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(256).collect());
    GenerationError::from_status(status, message)
}

/// Parse model output into a plan and enforce the breakfast-time invariant.
pub fn parse_plan(text: &str) -> Result<DailyPlan, GenerationError> {
    let plan: DailyPlan = serde_json::from_str(text.trim()).map_err(|e| {
        let snippet: String = text.chars().take(256).collect();
        GenerationError::Decode(format!("{e} - output: {snippet}"))
    })?;
    if !plan.is_schema_valid() {
        return Err(GenerationError::SchemaViolation);
    }
    Ok(plan)
}

#[async_trait]
impl PlanGenerator for ReqwestGeminiClient {
    async fn generate(
        &self,
        profile: &UserProfile,
        previous_plan: Option<&DailyPlan>,
        today: NaiveDate,
    ) -> Result<DailyPlan, GenerationError> {
        let prompt = prompts::plan_prompt(profile, previous_plan, &long_date_pt_br(today));
        let config = GenerationConfig {
            response_mime_type: "application/json",
            response_schema: prompts::plan_response_schema(),
        };
        let text = self.generate_text(prompt, Some(config)).await?;
        parse_plan(&text)
    }
}

#[async_trait]
impl NutritionChat for ReqwestGeminiClient {
    async fn ask(
        &self,
        profile: &UserProfile,
        plan: Option<&DailyPlan>,
        question: &str,
    ) -> Result<String, GenerationError> {
        let prompt = prompts::chat_prompt(profile, plan, question);
        match self.generate_text(prompt, None).await {
            Ok(text) => Ok(text.trim().to_string()),
            Err(GenerationError::EmptyResponse) => Ok(CHAT_FALLBACK_EMPTY.to_string()),
            Err(e) => Err(e),
        }
    }
}
