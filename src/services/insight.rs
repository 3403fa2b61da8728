use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config;

/// Appended to every stored analysis, independent of what the model says.
pub const DISCLAIMER: &str = "This AI analysis is for informational purposes only and should not replace professional medical advice. Please consult with your healthcare provider for proper diagnosis and treatment.";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const PROMPT_TEMPLATE: &str = r#"You are a helpful medical assistant. Analyze this {report_type} and provide a comprehensive but easy-to-understand summary.

IMPORTANT: Respond ONLY with a valid JSON object. Do not include any markdown formatting, code blocks, or extra text.

The JSON must have exactly this structure:
{
  "summaryEnglish": "A clear, patient-friendly summary in English explaining what the report shows, what the results mean, and any concerns (2-3 paragraphs)",
  "summaryUrdu": "Same summary in Roman Urdu (not Arabic script) for patients who prefer Urdu. Example: 'Yeh report aapke khoon ki jaanch hai...'",
  "abnormalValues": ["List each abnormal value with its name, actual value, and normal range. Example: 'Hemoglobin: 10.2 g/dL (Normal: 12-16 g/dL) - LOW'"],
  "questionsToAsk": [{"question": "Important questions the patient should ask their doctor based on these results"}],
  "foodRecommendations": {
    "avoid": ["Foods to avoid based on the report findings"],
    "recommended": ["Foods that may help improve the health metrics shown"]
  },
  "homeRemedies": [{"remedy": "Natural remedy name", "description": "How to use it and expected benefits"}]
}

Guidelines:
- Be empathetic and reassuring while being accurate
- Explain medical terms in simple language
- If values are normal, mention that clearly
- For abnormal values, explain what they might indicate without causing alarm
- Provide practical, actionable advice
- Include a gentle reminder to consult with their doctor for proper diagnosis"#;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("analyzer API key is not configured")]
    NotConfigured,

    #[error("analyzer request failed: {0}")]
    Request(String),

    #[error("analyzer rejected the request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected analyzer reply: {0}")]
    BadResponse(String),
}

/// Structured analysis of one report document, ready to persist.
#[derive(Debug, Clone)]
pub struct InsightPayload {
    pub summary_english: String,
    pub summary_urdu: String,
    pub abnormal_values: Value,
    pub questions_to_ask: Value,
    pub food_recommendations: Value,
    pub home_remedies: Value,
    pub disclaimer: String,
}

/// Produces a bilingual summary for an uploaded report document.
#[async_trait]
pub trait ReportAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        bytes: &[u8],
        mime_type: &str,
        report_type: &str,
    ) -> Result<InsightPayload, AiError>;
}

/// Gemini-backed analyzer using the generateContent REST endpoint.
pub struct GeminiAnalyzer {
    client: reqwest::Client,
}

impl GeminiAnalyzer {
    pub fn new() -> Self {
        let timeout = Duration::from_secs(config::config().ai.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for GeminiAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportAnalyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        bytes: &[u8],
        mime_type: &str,
        report_type: &str,
    ) -> Result<InsightPayload, AiError> {
        let ai = &config::config().ai;
        let api_key = ai.api_key.as_deref().ok_or(AiError::NotConfigured)?;

        let body = json!({
            "contents": [{
                "parts": [
                    { "text": build_prompt(report_type) },
                    {
                        "inline_data": {
                            "mime_type": mime_type,
                            "data": STANDARD.encode(bytes),
                        }
                    }
                ]
            }]
        });

        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, ai.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AiError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|err| AiError::BadResponse(err.to_string()))?;

        let text = extract_reply_text(&reply)
            .ok_or_else(|| AiError::BadResponse("reply contained no candidate text".to_string()))?;

        parse_reply(&text)
    }
}

fn build_prompt(report_type: &str) -> String {
    PROMPT_TEMPLATE.replace("{report_type}", report_type)
}

/// Pull the first candidate's concatenated text parts out of a
/// generateContent reply.
fn extract_reply_text(reply: &Value) -> Option<String> {
    let parts = reply
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Models often wrap JSON in markdown fences despite instructions.
fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// The raw reply echoed by the model is untrusted: summaries must be
/// present and non-empty, list sections fall back to empty collections.
fn parse_reply(text: &str) -> Result<InsightPayload, AiError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Reply {
        #[serde(default)]
        summary_english: String,
        #[serde(default)]
        summary_urdu: String,
        #[serde(default)]
        abnormal_values: Option<Value>,
        #[serde(default)]
        questions_to_ask: Option<Value>,
        #[serde(default)]
        food_recommendations: Option<Value>,
        #[serde(default)]
        home_remedies: Option<Value>,
    }

    let cleaned = strip_code_fences(text);
    let reply: Reply = serde_json::from_str(&cleaned)
        .map_err(|err| AiError::BadResponse(format!("reply was not valid JSON: {}", err)))?;

    if reply.summary_english.trim().is_empty() || reply.summary_urdu.trim().is_empty() {
        return Err(AiError::BadResponse(
            "reply was missing one or both summaries".to_string(),
        ));
    }

    Ok(InsightPayload {
        summary_english: reply.summary_english,
        summary_urdu: reply.summary_urdu,
        abnormal_values: reply.abnormal_values.unwrap_or_else(|| json!([])),
        questions_to_ask: reply.questions_to_ask.unwrap_or_else(|| json!([])),
        food_recommendations: reply
            .food_recommendations
            .unwrap_or_else(|| json!({ "avoid": [], "recommended": [] })),
        home_remedies: reply.home_remedies.unwrap_or_else(|| json!([])),
        disclaimer: DISCLAIMER.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_the_report_type() {
        let prompt = build_prompt("CBC");
        assert!(prompt.contains("Analyze this CBC"));
        assert!(prompt.contains("Respond ONLY with a valid JSON object"));
        assert!(prompt.contains("summaryUrdu"));
    }

    #[test]
    fn fences_are_stripped_before_parsing() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"a\": 1}");
    }

    #[test]
    fn full_reply_parses() {
        let text = r#"{
            "summaryEnglish": "All values are within normal range.",
            "summaryUrdu": "Tamam values normal hain.",
            "abnormalValues": ["Hemoglobin: 10.2 g/dL (Normal: 12-16 g/dL) - LOW"],
            "questionsToAsk": [{"question": "Should I repeat this test?"}],
            "foodRecommendations": {"avoid": ["sugar"], "recommended": ["spinach"]},
            "homeRemedies": [{"remedy": "Hydration", "description": "Drink more water."}]
        }"#;

        let payload = parse_reply(text).unwrap();
        assert_eq!(payload.summary_urdu, "Tamam values normal hain.");
        assert_eq!(payload.abnormal_values.as_array().unwrap().len(), 1);
        assert_eq!(payload.disclaimer, DISCLAIMER);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let text = r#"{"summaryEnglish": "ok", "summaryUrdu": "theek"}"#;
        let payload = parse_reply(text).unwrap();
        assert_eq!(payload.abnormal_values, serde_json::json!([]));
        assert_eq!(payload.questions_to_ask, serde_json::json!([]));
        assert_eq!(
            payload.food_recommendations,
            serde_json::json!({ "avoid": [], "recommended": [] })
        );
        assert_eq!(payload.home_remedies, serde_json::json!([]));
    }

    #[test]
    fn non_json_reply_is_rejected() {
        assert!(matches!(
            parse_reply("I am sorry, I cannot analyze this."),
            Err(AiError::BadResponse(_))
        ));
    }

    #[test]
    fn empty_summaries_are_rejected() {
        let text = r#"{"summaryEnglish": "", "summaryUrdu": "theek"}"#;
        assert!(matches!(parse_reply(text), Err(AiError::BadResponse(_))));
    }

    #[test]
    fn candidate_text_is_extracted() {
        let reply = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "hello " }, { "text": "world" }] }
            }]
        });
        assert_eq!(extract_reply_text(&reply).unwrap(), "hello world");
        assert_eq!(extract_reply_text(&serde_json::json!({})), None);
    }
}
