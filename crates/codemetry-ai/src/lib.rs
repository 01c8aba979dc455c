//! Optional AI explanation layer for codemetry.
//!
//! Turns one scored window's facts into short narrative bullets via an
//! OpenAI-compatible chat endpoint. Failure anywhere in this crate is soft
//! by design: the analyzer converts it into an `AI_UNAVAILABLE` confounder
//! and the deterministic scores stand on their own.

pub mod client;
pub mod explainer;
pub mod prompt;

pub use explainer::HttpExplainer;
