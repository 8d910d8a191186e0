//! Per-language call-site parsers.
//!
//! All three strategies share the [`SourceParser`] contract: file content in,
//! candidate detections out. Selection is a file-extension lookup, never
//! inheritance:
//!
//! | Parser | Extensions | Strategy |
//! |--------|------------|----------|
//! | [`JavaScriptParser`] | js, jsx, ts, tsx | tree-sitter structural walk |
//! | [`PythonParser`] | py | two line-oriented passes |
//! | [`GenericParser`] | everything else | line-oriented, stricter threshold |

mod generic;
mod javascript;
mod python;

pub use generic::GenericParser;
pub use javascript::JavaScriptParser;
pub use python::PythonParser;

use crate::model::LlmCall;

/// A strategy for locating candidate LLM call sites in one file.
pub trait SourceParser: Send + Sync {
    /// Human-readable name of this parser.
    fn name(&self) -> &'static str;

    /// Walks `content` and returns candidate detections. `file` is the
    /// path (relative to the scan root) recorded on each detection.
    fn parse(&self, content: &str, file: &str) -> Vec<LlmCall>;
}

/// Selects the parser for a file extension.
///
/// # Example
///
/// ```
/// use llmscan::scanner::parsers::parser_for_extension;
///
/// assert_eq!(parser_for_extension("tsx").name(), "JavaScript/TypeScript");
/// assert_eq!(parser_for_extension("py").name(), "Python");
/// assert_eq!(parser_for_extension("go").name(), "Generic");
/// ```
pub fn parser_for_extension(extension: &str) -> Box<dyn SourceParser> {
    match extension {
        "js" | "jsx" | "ts" | "tsx" => Box::new(JavaScriptParser),
        "py" => Box::new(PythonParser),
        _ => Box::new(GenericParser::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_extension() {
        for ext in ["js", "jsx", "ts", "tsx"] {
            assert_eq!(parser_for_extension(ext).name(), "JavaScript/TypeScript");
        }
        assert_eq!(parser_for_extension("py").name(), "Python");
        for ext in ["rs", "go", "java", "rb"] {
            assert_eq!(parser_for_extension(ext).name(), "Generic");
        }
    }
}
