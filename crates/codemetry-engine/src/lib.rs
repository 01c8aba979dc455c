//! The codemetry scoring engine.
//!
//! Turns a stream of [`codemetry_core::CommitRecord`]s into explainable
//! per-day mood scores:
//!
//! 1. [`windows`] partitions the requested range into daily UTC buckets.
//! 2. [`signals`] extracts raw per-window signals from the commit slices.
//! 3. [`baseline`] builds per-signal distributions from strictly prior
//!    history and normalizes raw values into z-scores.
//! 4. [`scoring`] weights and aggregates the z-scores into a bounded mood
//!    score with ranked reasons; [`horizon`] feeds follow-up fixes back in.
//! 5. [`confidence`] and [`confounders`] qualify each score.
//! 6. [`analyzer::Analyzer`] drives the whole pipeline and the optional AI
//!    explanation phase.
//!
//! Everything below the analyzer is a pure function of its inputs, so the
//! same history always scores the same way.

pub mod analyzer;
pub mod assemble;
pub mod baseline;
pub mod confidence;
pub mod confounders;
pub mod horizon;
pub mod scoring;
pub mod signals;
pub mod windows;

pub use analyzer::Analyzer;
