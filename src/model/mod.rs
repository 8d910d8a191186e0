//! Core data types for detections and scan reports.
//!
//! This module contains the fundamental types used throughout llmscan:
//!
//! - [`LlmCall`] - One detected LLM API call site
//! - [`CallMethod`] - How the call reaches the provider (sdk, http, wrapper)
//! - [`ScanReport`] - Complete scan results handed to the renderers
//!
//! # Example
//!
//! ```
//! use llmscan::model::{CallMethod, LlmCall, ScanReport};
//!
//! let call = LlmCall {
//!     file: "src/bot.py".to_string(),
//!     line: 42,
//!     column: None,
//!     provider: "OpenAI".to_string(),
//!     model: Some("gpt-4".to_string()),
//!     endpoint: None,
//!     confidence: 95,
//!     code_snippet: "openai.chat.completions.create(...)".to_string(),
//!     method: CallMethod::Sdk,
//! };
//!
//! let report = ScanReport::new("/my/project", vec![call], 1);
//! println!("Found {} calls", report.summary.total_calls);
//! ```

mod call;
mod report;

pub use call::*;
pub use report::*;
