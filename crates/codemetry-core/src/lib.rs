//! Core types, configuration, and error handling for the codemetry platform.
//!
//! This crate provides the shared foundation used by all other codemetry
//! crates:
//! - [`CodemetryError`] — unified error type using `thiserror`
//! - [`CodemetryConfig`] — configuration loaded from `.codemetry.toml`
//! - Domain types: [`CommitRecord`], [`AnalysisWindow`], [`Signal`],
//!   [`BaselineDistribution`], [`Reason`], [`Confounder`], [`AiSummary`],
//!   [`MoodLabel`], [`MoodWindowResult`], [`AnalysisRequest`],
//!   [`AnalysisResult`], [`OutputFormat`]
//! - Collaborator seams: [`CommitHistoryProvider`] and [`AiExplainer`]

mod config;
mod error;
mod provider;
mod types;

pub use config::{
    AiConfig, AnalysisConfig, CodemetryConfig, ExternalConfig, KeywordConfig, KeywordPatterns,
    NormalHours, SignalConfig,
};
pub use error::CodemetryError;
pub use provider::{AiExplainer, CommitHistoryProvider, ExplainFuture, HistoryQuery, WindowDigest};
pub use types::{
    AiSummary, AnalysisRequest, AnalysisResult, AnalysisWindow, BaselineDistribution, CommitRecord,
    Confounder, FileChange, MoodLabel, MoodWindowResult, OutputFormat, Reason, Signal,
    SCHEMA_VERSION,
};

/// A convenience `Result` type for codemetry operations.
pub type Result<T> = std::result::Result<T, CodemetryError>;
