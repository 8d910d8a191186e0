//! LLM-backed verification of uncertain detections.
//!
//! Detections in the uncertain confidence band are escalated to a live LLM
//! which judges whether the snippet really is an LLM API call. The contract
//! is [`VerificationRequest`] in, [`VerificationResult`] out; any transport
//! or format failure degrades to a negative result and never aborts a scan.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::model::LlmCall;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent";

/// Maximum number of in-flight verification requests.
pub const VERIFY_BATCH_SIZE: usize = 5;

/// Pause between verification batches, purely to respect provider rate
/// limits. Not part of any correctness contract.
const BATCH_DELAY: Duration = Duration::from_secs(1);

/// One uncertain detection sent out for verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationRequest {
    pub file: String,
    pub line: usize,
    pub code_snippet: String,
}

impl VerificationRequest {
    pub fn for_call(call: &LlmCall) -> Self {
        Self {
            file: call.file.clone(),
            line: call.line,
            code_snippet: call.code_snippet.clone(),
        }
    }
}

/// The verifier's judgement about one snippet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_llm_call: bool,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub confidence: u8,
}

impl VerificationResult {
    /// The result a failed verification degrades to: declines to confirm.
    pub fn negative() -> Self {
        Self {
            is_llm_call: false,
            provider: None,
            model: None,
            confidence: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("verification request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("verification provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("empty response from verification provider")]
    EmptyResponse,
    #[error("malformed verification response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// External service that can confirm or reject an uncertain detection.
#[async_trait]
pub trait Verifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn verify(&self, request: &VerificationRequest)
        -> Result<VerificationResult, VerifyError>;
}

/// Which hosted API performs the verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    OpenRouter,
    Gemini,
    OpenAi,
}

impl ApiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiProvider::OpenRouter => "openrouter",
            ApiProvider::Gemini => "gemini",
            ApiProvider::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ApiProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openrouter" => Ok(ApiProvider::OpenRouter),
            "gemini" => Ok(ApiProvider::Gemini),
            "openai" => Ok(ApiProvider::OpenAi),
            _ => Err(format!(
                "Unknown provider: {}. Use 'openrouter', 'gemini', or 'openai'",
                s
            )),
        }
    }
}

/// Reqwest-backed [`Verifier`] speaking the chat-completion dialects of
/// OpenRouter, Gemini, and OpenAI.
pub struct LlmVerifier {
    client: reqwest::Client,
    api_key: String,
    provider: ApiProvider,
}

impl LlmVerifier {
    pub fn new(api_key: impl Into<String>, provider: ApiProvider) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            provider,
        }
    }

    async fn verify_chat_completion(
        &self,
        url: &str,
        model: &str,
        prompt: String,
    ) -> Result<VerificationResult, VerifyError> {
        let body = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: 0.1,
            max_tokens: 200,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VerifyError::Status(response.status()));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(VerifyError::EmptyResponse)?;

        parse_verification_response(&content)
    }

    async fn verify_gemini(&self, prompt: String) -> Result<VerificationResult, VerifyError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.1,
                max_output_tokens: 200,
            },
        };

        let response = self
            .client
            .post(GEMINI_API_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VerifyError::Status(response.status()));
        }

        let parsed: GeminiResponse = response.json().await?;
        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(VerifyError::EmptyResponse)?;

        parse_verification_response(&content)
    }
}

#[async_trait]
impl Verifier for LlmVerifier {
    fn name(&self) -> &'static str {
        match self.provider {
            ApiProvider::OpenRouter => "OpenRouter",
            ApiProvider::Gemini => "Gemini",
            ApiProvider::OpenAi => "OpenAI",
        }
    }

    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, VerifyError> {
        let prompt = build_prompt(request);
        match self.provider {
            ApiProvider::OpenRouter => {
                self.verify_chat_completion(
                    OPENROUTER_API_URL,
                    "google/gemini-2.0-flash-exp:free",
                    prompt,
                )
                .await
            }
            ApiProvider::OpenAi => {
                self.verify_chat_completion(OPENAI_API_URL, "gpt-4o-mini", prompt)
                    .await
            }
            ApiProvider::Gemini => self.verify_gemini(prompt).await,
        }
    }
}

fn build_prompt(request: &VerificationRequest) -> String {
    format!(
        "Analyze this code snippet and determine if it contains an LLM \
         (Large Language Model) API call.\n\n\
         Code from {}:{}:\n```\n{}\n```\n\n\
         Respond with a JSON object (no markdown formatting) containing:\n\
         {{\n\
         \x20 \"isLLMCall\": true/false,\n\
         \x20 \"provider\": \"provider name\" (if applicable, e.g., \"OpenAI\", \"Anthropic\", \"Google AI\"),\n\
         \x20 \"model\": \"model name\" (if identifiable, e.g., \"gpt-4\", \"claude-3-opus\"),\n\
         \x20 \"confidence\": number between 0-100\n\
         }}\n\n\
         Only respond with the JSON object, nothing else.",
        request.file, request.line, request.code_snippet
    )
}

/// Parses the model's JSON answer. A missing confidence defaults to 50.
fn parse_verification_response(content: &str) -> Result<VerificationResult, VerifyError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RawVerification {
        #[serde(default, rename = "isLLMCall")]
        is_llm_call: bool,
        provider: Option<String>,
        model: Option<String>,
        confidence: Option<u8>,
    }

    let raw: RawVerification = serde_json::from_str(content.trim())?;
    Ok(VerificationResult {
        is_llm_call: raw.is_llm_call,
        provider: raw.provider,
        model: raw.model,
        confidence: raw.confidence.unwrap_or(50),
    })
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: String,
}

/// Verifies uncertain detections in bounded batches, keyed by (file, line).
///
/// A failed request degrades to [`VerificationResult::negative`] for that
/// key; the batch delay is the only throttling, there are no retries.
pub async fn batch_verify(
    verifier: &dyn Verifier,
    requests: &[VerificationRequest],
) -> HashMap<(String, usize), VerificationResult> {
    let mut results = HashMap::new();

    for (i, chunk) in requests.chunks(VERIFY_BATCH_SIZE).enumerate() {
        if i > 0 {
            tokio::time::sleep(BATCH_DELAY).await;
        }

        let outcomes = join_all(chunk.iter().map(|req| verifier.verify(req))).await;

        for (req, outcome) in chunk.iter().zip(outcomes) {
            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    warn!(file = %req.file, line = req.line, error = %e, "verification failed");
                    VerificationResult::negative()
                }
            };
            results.insert((req.file.clone(), req.line), result);
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verification_response_full() {
        let result = parse_verification_response(
            r#"{"isLLMCall": true, "provider": "OpenAI", "model": "gpt-4", "confidence": 92}"#,
        )
        .unwrap();

        assert!(result.is_llm_call);
        assert_eq!(result.provider.as_deref(), Some("OpenAI"));
        assert_eq!(result.model.as_deref(), Some("gpt-4"));
        assert_eq!(result.confidence, 92);
    }

    #[test]
    fn test_parse_verification_response_defaults() {
        let result = parse_verification_response(r#"{"isLLMCall": true}"#).unwrap();
        assert!(result.is_llm_call);
        assert!(result.provider.is_none());
        assert_eq!(result.confidence, 50);

        let result = parse_verification_response(r#"{"confidence": 10}"#).unwrap();
        assert!(!result.is_llm_call);
        assert_eq!(result.confidence, 10);
    }

    #[test]
    fn test_parse_verification_response_rejects_garbage() {
        assert!(parse_verification_response("I think it is an LLM call").is_err());
        assert!(parse_verification_response("").is_err());
    }

    #[test]
    fn test_api_provider_from_str() {
        assert_eq!("openrouter".parse::<ApiProvider>(), Ok(ApiProvider::OpenRouter));
        assert_eq!("Gemini".parse::<ApiProvider>(), Ok(ApiProvider::Gemini));
        assert_eq!("OPENAI".parse::<ApiProvider>(), Ok(ApiProvider::OpenAi));
        assert!("claude".parse::<ApiProvider>().is_err());
    }

    #[test]
    fn test_negative_result_declines_to_confirm() {
        let result = VerificationResult::negative();
        assert!(!result.is_llm_call);
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn test_prompt_includes_location_and_snippet() {
        let prompt = build_prompt(&VerificationRequest {
            file: "src/app.py".to_string(),
            line: 7,
            code_snippet: "openai.chat(...)".to_string(),
        });

        assert!(prompt.contains("src/app.py:7"));
        assert!(prompt.contains("openai.chat(...)"));
        assert!(prompt.contains("isLLMCall"));
    }
}
