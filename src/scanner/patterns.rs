//! Provider catalog and pattern matcher.
//!
//! The catalog is pure static data: one [`ProviderEntry`] per known LLM
//! provider and one [`WrapperEntry`] per wrapper framework. Adding support
//! for a new provider is a data change here and nothing else; no parser
//! knows any provider by name.
//!
//! Matching is deliberately low-precision/high-recall: plain case-sensitive
//! substring containment, every hit returned. Precision is recovered by the
//! confidence scorer in [`crate::analyzer`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Identifying strings for one LLM provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderEntry {
    pub name: &'static str,
    /// Import specifiers. Quote- or statement-anchored so that a plain-prose
    /// mention of a provider name never matches.
    pub imports: &'static [&'static str],
    pub api_calls: &'static [&'static str],
    /// URL path fragments of the provider's API.
    pub endpoints: &'static [&'static str],
    pub domains: &'static [&'static str],
    pub env_vars: &'static [&'static str],
}

/// A framework that calls an LLM provider indirectly. Only its identifying
/// imports and calls are tracked, all at the same weight.
#[derive(Debug, Clone, Copy)]
pub struct WrapperEntry {
    pub name: &'static str,
    pub imports: &'static [&'static str],
    pub api_calls: &'static [&'static str],
}

pub static LLM_PROVIDERS: &[ProviderEntry] = &[
    ProviderEntry {
        name: "OpenAI",
        imports: &["'openai'", "\"openai\"", "from openai import", "import openai"],
        api_calls: &[
            "openai.chat.completions.create",
            "openai.completions.create",
            "new OpenAI(",
            "= OpenAI(",
            "createChatCompletion",
            "createCompletion",
        ],
        endpoints: &["/v1/chat/completions", "/v1/completions", "/v1/embeddings"],
        domains: &["api.openai.com", "openai.azure.com"],
        env_vars: &["OPENAI_API_KEY", "OPENAI_API_BASE"],
    },
    ProviderEntry {
        name: "Anthropic",
        imports: &["@anthropic-ai/sdk", "from anthropic import", "import anthropic"],
        api_calls: &[
            "anthropic.messages.create",
            "anthropic.completions.create",
            "new Anthropic(",
            "= Anthropic(",
            "messages.create",
        ],
        endpoints: &["/v1/messages", "/v1/complete"],
        domains: &["api.anthropic.com"],
        env_vars: &["ANTHROPIC_API_KEY"],
    },
    ProviderEntry {
        name: "Google AI",
        imports: &[
            "@google/generative-ai",
            "from google.generativeai import",
            "import google.generativeai",
        ],
        api_calls: &[
            "GenerativeModel",
            "generateContent",
            "model.generateContent",
            "genai.GenerativeModel",
        ],
        endpoints: &["/v1/models", "/v1beta/models"],
        domains: &["generativelanguage.googleapis.com", "aiplatform.googleapis.com"],
        env_vars: &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
    },
    ProviderEntry {
        name: "Cohere",
        imports: &["'cohere'", "\"cohere\"", "from cohere import", "import cohere"],
        api_calls: &["cohere.generate", "cohere.chat", "co.generate", "co.chat"],
        endpoints: &["/v1/generate", "/v1/chat", "/v1/embed"],
        domains: &["api.cohere.ai", "api.cohere.com"],
        env_vars: &["COHERE_API_KEY"],
    },
    ProviderEntry {
        name: "Hugging Face",
        imports: &[
            "@huggingface/inference",
            "from huggingface_hub import",
            "'transformers'",
            "\"transformers\"",
            "from transformers import",
        ],
        api_calls: &["HfInference", "InferenceClient", "pipeline(", "from_pretrained"],
        endpoints: &["/models/", "/api/models/"],
        domains: &["api-inference.huggingface.co", "huggingface.co"],
        env_vars: &["HUGGINGFACE_API_KEY", "HF_TOKEN"],
    },
    ProviderEntry {
        name: "OpenRouter",
        imports: &["'openrouter'", "\"openrouter\"", "import openrouter"],
        api_calls: &["openrouter.chat.completions", "OpenRouter("],
        endpoints: &["/api/v1/chat/completions"],
        domains: &["openrouter.ai"],
        env_vars: &["OPENROUTER_API_KEY"],
    },
    ProviderEntry {
        name: "Replicate",
        imports: &[
            "'replicate'",
            "\"replicate\"",
            "from replicate import",
            "import replicate",
        ],
        api_calls: &["replicate.run", "replicate.predictions.create"],
        endpoints: &["/v1/predictions", "/v1/models"],
        domains: &["api.replicate.com"],
        env_vars: &["REPLICATE_API_TOKEN"],
    },
    ProviderEntry {
        name: "Together AI",
        imports: &["'together'", "\"together\"", "from together import", "import together"],
        api_calls: &["together.Complete", "together.chat.completions"],
        endpoints: &["/inference", "/v1/chat/completions"],
        domains: &["api.together.xyz"],
        env_vars: &["TOGETHER_API_KEY"],
    },
    ProviderEntry {
        name: "Azure OpenAI",
        imports: &["@azure/openai", "azure.openai"],
        api_calls: &["OpenAIClient", "getChatCompletions", "getCompletions"],
        endpoints: &["/openai/deployments/"],
        domains: &[".openai.azure.com"],
        env_vars: &["AZURE_OPENAI_KEY", "AZURE_OPENAI_ENDPOINT"],
    },
];

pub static WRAPPER_FRAMEWORKS: &[WrapperEntry] = &[
    WrapperEntry {
        name: "LangChain",
        imports: &[
            "'langchain'",
            "\"langchain\"",
            "from langchain import",
            "from langchain.",
            "@langchain/",
        ],
        api_calls: &["ChatOpenAI", "ChatAnthropic"],
    },
    WrapperEntry {
        name: "LlamaIndex",
        imports: &["'llama-index'", "\"llama-index\"", "llama_index", "from llama_index"],
        api_calls: &["LLMPredictor", "ServiceContext", "GPTVectorStoreIndex"],
    },
    WrapperEntry {
        name: "Haystack",
        imports: &["'haystack'", "\"haystack\"", "from haystack import"],
        api_calls: &["PromptNode", "OpenAIAnswerGenerator"],
    },
];

/// The kind of textual evidence a pattern hit represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Import,
    ApiCall,
    Endpoint,
    EnvVar,
}

/// Fixed confidence weights per match kind.
pub mod weights {
    pub const IMPORT: u8 = 70;
    pub const API_CALL: u8 = 90;
    pub const ENDPOINT: u8 = 85;
    pub const WRAPPER: u8 = 75;
}

/// A single textual hit against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    pub pattern: &'static str,
    pub provider: &'static str,
    pub kind: MatchKind,
    pub weight: u8,
}

/// Tests `text` against every catalog entry and returns all hits.
///
/// Non-exclusive: one fragment can match several providers and several
/// kinds at once. Case-sensitive substring containment, no word boundaries.
pub fn match_patterns(text: &str) -> Vec<PatternMatch> {
    let mut matches = Vec::new();

    for provider in LLM_PROVIDERS {
        for pattern in provider.imports {
            if text.contains(pattern) {
                matches.push(PatternMatch {
                    pattern,
                    provider: provider.name,
                    kind: MatchKind::Import,
                    weight: weights::IMPORT,
                });
            }
        }
    }

    for provider in LLM_PROVIDERS {
        for pattern in provider.api_calls {
            if text.contains(pattern) {
                matches.push(PatternMatch {
                    pattern,
                    provider: provider.name,
                    kind: MatchKind::ApiCall,
                    weight: weights::API_CALL,
                });
            }
        }
    }

    for provider in LLM_PROVIDERS {
        for pattern in provider.endpoints {
            if text.contains(pattern) {
                matches.push(PatternMatch {
                    pattern,
                    provider: provider.name,
                    kind: MatchKind::Endpoint,
                    weight: weights::ENDPOINT,
                });
            }
        }
    }

    for wrapper in WRAPPER_FRAMEWORKS {
        for pattern in wrapper.imports.iter().chain(wrapper.api_calls) {
            if text.contains(pattern) {
                matches.push(PatternMatch {
                    pattern,
                    provider: wrapper.name,
                    kind: MatchKind::Import,
                    weight: weights::WRAPPER,
                });
            }
        }
    }

    matches
}

/// Returns the highest-weighted match, first one on ties.
pub fn best_match(matches: &[PatternMatch]) -> Option<&PatternMatch> {
    let mut best: Option<&PatternMatch> = None;
    for m in matches {
        if best.map_or(true, |b| m.weight > b.weight) {
            best = Some(m);
        }
    }
    best
}

/// True if `text` contains any domain or endpoint fragment of `provider`.
pub fn mentions_provider_url(provider: &ProviderEntry, text: &str) -> bool {
    provider.domains.iter().any(|d| text.contains(d))
        || provider.endpoints.iter().any(|e| text.contains(e))
}

static MODEL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)model["\s:=]+["']([^"']+)["']"#,
        r#"(?i)["']model["']\s*:\s*["']([^"']+)["']"#,
        r#"(?i)(gpt-4[^"'\s]*|gpt-3\.5[^"'\s]*)"#,
        r#"(?i)(claude-[^"'\s]*)"#,
        r#"(?i)(gemini-[^"'\s]*)"#,
        r#"(?i)(command[^"'\s]*)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid model pattern"))
    .collect()
});

/// Pulls an explicit model name out of a code fragment, if one is present.
pub fn extract_model(code: &str) -> Option<String> {
    for pattern in MODEL_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(code) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_match_has_import_weight() {
        let matches = match_patterns("import OpenAI from 'openai';");
        assert!(matches
            .iter()
            .any(|m| m.provider == "OpenAI" && m.kind == MatchKind::Import && m.weight == 70));
    }

    #[test]
    fn test_api_call_match_has_api_call_weight() {
        let matches = match_patterns("const r = await openai.chat.completions.create({});");
        assert!(matches
            .iter()
            .any(|m| m.provider == "OpenAI" && m.kind == MatchKind::ApiCall && m.weight == 90));
    }

    #[test]
    fn test_endpoint_match_has_endpoint_weight() {
        let matches = match_patterns("POST https://api.anthropic.com/v1/messages");
        assert!(matches
            .iter()
            .any(|m| m.provider == "Anthropic" && m.kind == MatchKind::Endpoint && m.weight == 85));
    }

    #[test]
    fn test_wrapper_match_has_wrapper_weight() {
        let matches = match_patterns("from langchain import LLMChain");
        assert!(matches
            .iter()
            .any(|m| m.provider == "LangChain" && m.weight == 75));
    }

    #[test]
    fn test_one_fragment_can_match_multiple_kinds() {
        let text = "import openai\nopenai.chat.completions.create(model='gpt-4')";
        let matches = match_patterns(text);
        let kinds: std::collections::HashSet<_> = matches.iter().map(|m| m.kind).collect();
        assert!(kinds.contains(&MatchKind::Import));
        assert!(kinds.contains(&MatchKind::ApiCall));
    }

    #[test]
    fn test_prose_mention_does_not_match() {
        assert!(match_patterns("# openai is a great company").is_empty());
        assert!(match_patterns("We compared cohere and together here.").is_empty());
    }

    #[test]
    fn test_best_match_takes_highest_weight_first_on_ties() {
        let matches = match_patterns("import openai\nopenai.completions.create()");
        let best = best_match(&matches).unwrap();
        assert_eq!(best.kind, MatchKind::ApiCall);
        assert_eq!(best.weight, 90);
        assert!(best_match(&[]).is_none());
    }

    #[test]
    fn test_extract_model_from_keyword_argument() {
        assert_eq!(
            extract_model("create(model=\"gpt-4-turbo\")").as_deref(),
            Some("gpt-4-turbo")
        );
        assert_eq!(
            extract_model("{\"model\": \"claude-3-opus\"}").as_deref(),
            Some("claude-3-opus")
        );
    }

    #[test]
    fn test_extract_model_from_bare_name() {
        assert_eq!(extract_model("uses claude-3-haiku here").as_deref(), Some("claude-3-haiku"));
        assert_eq!(extract_model("gemini-1.5-pro").as_deref(), Some("gemini-1.5-pro"));
        assert!(extract_model("no model here").is_none());
    }

    #[test]
    fn test_catalog_provider_names_are_unique() {
        let mut names: Vec<_> = LLM_PROVIDERS.iter().map(|p| p.name).collect();
        names.extend(WRAPPER_FRAMEWORKS.iter().map(|w| w.name));
        let distinct: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(distinct.len(), names.len());
    }
}
