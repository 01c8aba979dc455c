//! Assembly of scored windows into the serializable result document.

use codemetry_core::{
    AnalysisResult, AnalysisWindow, Confounder, MoodLabel, MoodWindowResult, SCHEMA_VERSION,
};

use crate::scoring::WindowScore;

/// Round to one decimal place for presentation.
pub fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// Combine one window's score, confidence, and confounders into its result
/// entry.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codemetry_core::{AnalysisWindow, KeywordConfig, MoodLabel, NormalHours};
/// use codemetry_engine::assemble::assemble_window;
/// use codemetry_engine::baseline::Baseline;
/// use codemetry_engine::scoring::score_window;
///
/// let window = AnalysisWindow {
///     label: "2024-01-15".into(),
///     start: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
///     end: Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap(),
/// };
/// let patterns = KeywordConfig::default().compile().unwrap();
/// let baseline = Baseline::build(&[], window.start, 14, &patterns, NormalHours { start: 8, end: 20 });
/// let score = score_window(&Default::default(), &baseline);
/// let result = assemble_window(&window, score, 0.0, vec![]);
/// assert_eq!(result.mood_label, MoodLabel::Steady);
/// assert_eq!(result.mood_score, 50.0);
/// ```
pub fn assemble_window(
    window: &AnalysisWindow,
    score: WindowScore,
    confidence: f64,
    confounders: Vec<Confounder>,
) -> MoodWindowResult {
    let mood_score = round_score(score.mood_score);
    MoodWindowResult {
        window_label: window.label.clone(),
        mood_label: MoodLabel::from_score(mood_score),
        mood_score,
        confidence: round_confidence(confidence),
        reasons: score.reasons,
        confounders,
        ai_summary: None,
    }
}

/// Stamp the schema version and wrap the chronological window results.
pub fn assemble_result(baseline_days: u32, windows: Vec<MoodWindowResult>) -> AnalysisResult {
    AnalysisResult {
        schema_version: SCHEMA_VERSION.into(),
        baseline_days,
        windows,
    }
}

fn round_confidence(confidence: f64) -> f64 {
    (confidence * 100.0).round() / 100.0
}
