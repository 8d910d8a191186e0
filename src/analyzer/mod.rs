//! Confidence scoring and LLM-backed verification.
//!
//! [`calculate_confidence`] turns raw pattern hits into a 0-100 score;
//! [`needs_verification`] picks the uncertain band worth escalating; the
//! [`Verifier`] trait and [`batch_verify`] define the verification boundary.

mod confidence;
mod verifier;

pub use confidence::{calculate_confidence, needs_verification};
pub use verifier::{
    batch_verify, ApiProvider, LlmVerifier, VerificationRequest, VerificationResult, Verifier,
    VerifyError, VERIFY_BATCH_SIZE,
};
