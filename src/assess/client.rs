//! Assessment client - scores a lead via the Anthropic Messages API.
//!
//! The public contract never fails: any transport, timeout, status, or parse
//! error is trapped and substituted with the fixed fallback assessment. Model
//! output format is not a controlled contract, so the JSON extraction is an
//! explicit, isolated step whose failure mode is the fallback.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AssessError;
use crate::assess::types::{Assessment, AssessmentOutcome};
use crate::store::Lead;

/// Max tokens for the assessment call (kept tight - runs on every lead).
const ASSESS_MAX_TOKENS: u32 = 500;

/// Temperature for assessment (deterministic-ish).
const ASSESS_TEMPERATURE: f32 = 0.1;

/// Messages API protocol version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Max chars of an error body kept for logging.
const ERROR_BODY_PREVIEW: usize = 200;

/// Anything that can score a lead. One attempt per lead per cycle; retry and
/// backoff are out of scope at this layer.
#[async_trait]
pub trait Assessor: Send + Sync {
    /// Assess one lead. Never fails - a failed attempt yields
    /// `AssessmentOutcome::Fallback`.
    async fn assess(&self, lead: &Lead) -> AssessmentOutcome;
}

/// Assessment client backed by the Anthropic Messages API.
pub struct AnthropicAssessor {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl AnthropicAssessor {
    /// Create a client. `timeout` bounds the single HTTP request.
    pub fn new(api_key: SecretString, model: String, timeout: std::time::Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key,
            model,
            base_url: "https://api.anthropic.com".to_string(),
        }
    }

    /// Override the provider base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// One full attempt: request, status check, text extraction, JSON parse.
    async fn try_assess(&self, lead: &Lead) -> Result<Assessment, AssessError> {
        let payload = serde_json::json!({
            "model": self.model,
            "max_tokens": ASSESS_MAX_TOKENS,
            "temperature": ASSESS_TEMPERATURE,
            "messages": [
                { "role": "user", "content": build_prompt(lead) }
            ]
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AssessError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssessError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssessError::Parse(format!("response body: {e}")))?;

        let text = body
            .get("content")
            .and_then(|c| c.get(0))
            .and_then(|block| block.get("text"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| AssessError::Parse("no text content in response".into()))?;

        let json_str = extract_json_object(text).ok_or(AssessError::NoJson)?;
        parse_assessment(&json_str)
    }
}

#[async_trait]
impl Assessor for AnthropicAssessor {
    async fn assess(&self, lead: &Lead) -> AssessmentOutcome {
        match self.try_assess(lead).await {
            Ok(assessment) => {
                info!(
                    lead_id = %lead.id,
                    priority = assessment.priority.label(),
                    urgency = assessment.urgency_score,
                    "Lead assessed"
                );
                AssessmentOutcome::Scored(assessment)
            }
            Err(e) => {
                warn!(lead_id = %lead.id, error = %e, "Assessment failed, using fallback");
                AssessmentOutcome::Fallback {
                    assessment: Assessment::fallback(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the assessment prompt from a lead.
fn build_prompt(lead: &Lead) -> String {
    let price = lead
        .property_price
        .map(|p| format!("{p:.2}"))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "LEAD FOR ANALYSIS:\n\n\
         Name: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Message: \"{message}\"\n\n\
         PROPERTY:\n\
         Title: {title}\n\
         Price: {price}\n\
         Type: {ptype}\n\n\
         TASK: Analyze this lead and answer with ONLY a single JSON object:\n\
         {{\n\
             \"priority\": \"HOT|WARM|COLD\",\n\
             \"urgency_score\": 1-10,\n\
             \"interest_level\": \"HIGH|MEDIUM|LOW\",\n\
             \"buying_intent\": \"BUY_NOW|RESEARCHING|CURIOUS\",\n\
             \"recommended_action\": \"CALL_URGENT|SCHEDULE_VISIT|SEND_INFO|FOLLOW_UP\",\n\
             \"summary\": \"1-2 sentence summary\",\n\
             \"key_points\": [\"point1\", \"point2\"]\n\
         }}\n\n\
         Consider urgency, completeness of contact data, property value, and buying intent.",
        name = lead.name,
        email = lead.email.as_deref().unwrap_or("N/A"),
        phone = lead.phone.as_deref().unwrap_or("N/A"),
        message = lead.message,
        title = lead.property_title.as_deref().unwrap_or("N/A"),
        ptype = lead.property_type.as_deref().unwrap_or("N/A"),
    )
}

// ── Response parsing ────────────────────────────────────────────────

/// Raw model output before range clamping.
#[derive(Debug, Deserialize)]
struct RawAssessment {
    priority: crate::assess::types::Priority,
    urgency_score: i64,
    interest_level: crate::assess::types::InterestLevel,
    buying_intent: crate::assess::types::BuyingIntent,
    recommended_action: crate::assess::types::RecommendedAction,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
}

/// Parse the extracted JSON into an `Assessment`, clamping the urgency score
/// to 1–10.
fn parse_assessment(json_str: &str) -> Result<Assessment, AssessError> {
    let raw: RawAssessment =
        serde_json::from_str(json_str).map_err(|e| AssessError::Parse(e.to_string()))?;

    Ok(Assessment {
        priority: raw.priority,
        urgency_score: raw.urgency_score.clamp(1, 10) as u8,
        interest_level: raw.interest_level,
        buying_intent: raw.buying_intent,
        recommended_action: raw.recommended_action,
        summary: raw.summary,
        key_points: raw.key_points,
    })
}

/// Extract a JSON object from free-form model output.
///
/// Handles markdown code fences and surrounding prose; falls back to the
/// substring between the first `{` and the last `}`.
fn extract_json_object(text: &str) -> Option<String> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed.to_string());
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return Some(inner.to_string());
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => Some(trimmed[start..=end].to_string()),
        _ => None,
    }
}
