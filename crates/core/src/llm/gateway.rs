use crate::config::Settings;
use crate::domain::assessment::RiskAssessment;
use crate::domain::ratios::FinancialRatios;
use crate::llm::error::PredictError;
use crate::llm::json;
use crate::llm::prompt::{user_prompt, SYSTEM_PROMPT};
use crate::llm::LlmClient;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://ai.gateway.lovable.dev";
const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for an OpenAI-compatible chat-completion gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GatewayClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_ai_gateway_api_key()?.to_string();
        let base_url =
            std::env::var("AI_GATEWAY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model =
            std::env::var("AI_GATEWAY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_secs = std::env::var("AI_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(api_key, base_url, model, Duration::from_secs(timeout_secs))
    }

    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    async fn create_completion(
        &self,
        req: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionResponse, PredictError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await
            .context("AI Gateway request failed")?;

        let status = res.status();
        if !status.is_success() {
            // Status alone decides the error; the body is only logged.
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "AI Gateway error");
            return Err(PredictError::from_upstream_status(status.as_u16()));
        }

        let text = res
            .text()
            .await
            .context("failed to read AI Gateway response body")?;
        Self::decode_completion(&text)
    }

    fn decode_completion(text: &str) -> Result<ChatCompletionResponse, PredictError> {
        match serde_json::from_str::<ChatCompletionResponse>(text) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                tracing::error!(error = %e, body = %text, "AI Gateway returned undecodable JSON");
                Err(anyhow::Error::new(e)
                    .context("failed to decode AI Gateway response JSON")
                    .into())
            }
        }
    }

    fn response_text(res: &ChatCompletionResponse) -> Option<&str> {
        res.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

#[async_trait::async_trait]
impl LlmClient for GatewayClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn predict_risk(&self, ratios: &FinancialRatios) -> Result<RiskAssessment, PredictError> {
        let user = user_prompt(ratios);
        let req = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &user,
                },
            ],
        };

        tracing::info!(model = %self.model, "calling AI Gateway for risk prediction");
        let res = self.create_completion(&req).await?;

        let text = Self::response_text(&res).ok_or(PredictError::EmptyResponse)?;
        let assessment = json::parse_assessment(text).inspect_err(|e| {
            tracing::warn!(error = %e, raw_output = %text, "model reply is not a valid assessment");
        })?;

        tracing::info!(
            overall_risk = %assessment.overall_risk,
            risk_score = assessment.risk_score,
            factors = assessment.factors.len(),
            "parsed risk assessment"
        );
        Ok(assessment)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
