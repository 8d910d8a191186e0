use serde::{Deserialize, Serialize};

/// How a detected call reaches the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallMethod {
    /// Direct SDK usage (client library call).
    Sdk,
    /// Raw HTTP request to a known provider endpoint.
    Http,
    /// Indirect usage through an orchestration/wrapper framework.
    Wrapper,
}

impl CallMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallMethod::Sdk => "sdk",
            CallMethod::Http => "http",
            CallMethod::Wrapper => "wrapper",
        }
    }
}

impl std::fmt::Display for CallMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One reported instance of code believed to invoke an LLM provider.
///
/// Produced by a parser, optionally adjusted once by the verification pass,
/// immutable afterwards. A (file, line) pair is not unique before dedup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmCall {
    /// Path relative to the scan root.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Literal endpoint URL, when one was parsed from the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// 0-100 estimate that this is a true LLM call.
    pub confidence: u8,
    pub code_snippet: String,
    pub method: CallMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_method_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&CallMethod::Sdk).unwrap(), "\"sdk\"");
        assert_eq!(serde_json::to_string(&CallMethod::Http).unwrap(), "\"http\"");
        assert_eq!(
            serde_json::to_string(&CallMethod::Wrapper).unwrap(),
            "\"wrapper\""
        );
    }

    #[test]
    fn test_call_serializes_camel_case() {
        let call = LlmCall {
            file: "src/app.ts".to_string(),
            line: 12,
            column: Some(4),
            provider: "OpenAI".to_string(),
            model: Some("gpt-4".to_string()),
            endpoint: None,
            confidence: 95,
            code_snippet: "openai.chat.completions.create".to_string(),
            method: CallMethod::Sdk,
        };

        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["codeSnippet"], "openai.chat.completions.create");
        assert_eq!(json["confidence"], 95);
        assert!(json.get("endpoint").is_none());
    }
}
