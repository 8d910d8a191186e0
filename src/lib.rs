pub mod analyzer;
pub mod config;
pub mod model;
pub mod output;
pub mod scanner;

pub use analyzer::{ApiProvider, LlmVerifier, Verifier};
pub use config::Config;
pub use model::{CallMethod, LlmCall, ScanReport, ScanSummary};
pub use scanner::{run_scan, ScanOptions};
