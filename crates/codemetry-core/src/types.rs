use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CodemetryError;

/// Version stamp embedded in every [`AnalysisResult`] so downstream
/// consumers can detect format changes.
pub const SCHEMA_VERSION: &str = "1.0";

/// One commit as supplied by the history provider.
///
/// Immutable input to the engine; the engine never mutates repository state.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codemetry_core::CommitRecord;
///
/// let commit = CommitRecord {
///     id: "abc123".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
///     message: "fix: auth bug".into(),
///     files: vec![],
/// };
/// assert_eq!(commit.churn(), 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Short commit hash.
    pub id: String,
    /// Author name.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Commit timestamp in UTC.
    pub timestamp: DateTime<Utc>,
    /// First line of the commit message.
    pub message: String,
    /// Files modified in this commit.
    pub files: Vec<FileChange>,
}

impl CommitRecord {
    /// Total insertions + deletions across all files in this commit.
    pub fn churn(&self) -> u64 {
        self.files.iter().map(|f| f.insertions + f.deletions).sum()
    }

    /// Paths touched by this commit.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }
}

/// A single file change within a commit.
///
/// # Examples
///
/// ```
/// use codemetry_core::FileChange;
///
/// let change = FileChange {
///     path: "src/main.rs".into(),
///     insertions: 10,
///     deletions: 3,
/// };
/// assert_eq!(change.insertions, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    /// File path relative to repo root.
    pub path: String,
    /// Lines added in this commit.
    pub insertions: u64,
    /// Lines deleted in this commit.
    pub deletions: u64,
}

/// A contiguous, non-overlapping time bucket over which commits are scored.
///
/// `start` is inclusive, `end` is exclusive.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codemetry_core::AnalysisWindow;
///
/// let window = AnalysisWindow {
///     label: "2024-01-15".into(),
///     start: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
///     end: Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap(),
/// };
/// assert!(window.contains(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()));
/// assert!(!window.contains(window.end));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    /// Human-readable label, e.g. `"2024-01-15"`.
    pub label: String,
    /// Inclusive start of the window.
    pub start: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end: DateTime<Utc>,
}

impl AnalysisWindow {
    /// Whether `ts` falls inside `[start, end)`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// One measured quantity for a window.
///
/// `z` is `None` when the raw value could not be normalized (no usable
/// baseline for pseudo-signals such as the follow-up feedback).
///
/// # Examples
///
/// ```
/// use codemetry_core::Signal;
///
/// let signal = Signal {
///     name: "fix_rate".into(),
///     raw: 0.5,
///     z: Some(2.0),
///     weight: 12.0,
///     direction: -1.0,
/// };
/// assert!(signal.z.unwrap() > 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Signal name, e.g. `"fix_rate"`.
    pub name: String,
    /// Raw extracted value.
    pub raw: f64,
    /// Baseline-normalized z-score, if a usable baseline existed.
    pub z: Option<f64>,
    /// Fixed aggregation weight.
    pub weight: f64,
    /// `+1.0` when high values are favorable, `-1.0` when adverse.
    pub direction: f64,
}

/// Reference statistics for one signal, built from strictly prior history.
///
/// # Examples
///
/// ```
/// use codemetry_core::BaselineDistribution;
///
/// let dist = BaselineDistribution {
///     signal: "churn".into(),
///     mean: 120.0,
///     stddev: 40.0,
///     samples: 14,
/// };
/// assert_eq!(dist.samples, 14);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineDistribution {
    /// Signal this distribution describes.
    pub signal: String,
    /// Mean over the prior daily buckets.
    pub mean: f64,
    /// Population standard deviation over the prior daily buckets.
    pub stddev: f64,
    /// Number of daily buckets that contributed a value.
    pub samples: usize,
}

/// One scoring contributor, ranked by `abs(contribution)` descending.
///
/// # Examples
///
/// ```
/// use codemetry_core::Reason;
///
/// let reason = Reason {
///     summary: "sharply elevated fix-commit rate".into(),
///     signal: "fix_rate".into(),
///     contribution: -28.0,
/// };
/// assert!(reason.contribution < 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reason {
    /// Human-readable summary of the contribution.
    pub summary: String,
    /// Signal that produced this reason.
    pub signal: String,
    /// Signed score contribution (negative pulls the mood down).
    pub contribution: f64,
}

/// A flagged condition that degrades interpretability of a window's score
/// without invalidating it.
///
/// Serialized in the spelling downstream consumers expect, e.g.
/// `"LOW_VOLUME"`.
///
/// # Examples
///
/// ```
/// use codemetry_core::Confounder;
///
/// let json = serde_json::to_string(&Confounder::LowVolume).unwrap();
/// assert_eq!(json, "\"LOW_VOLUME\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confounder {
    /// Too few commits in the window for the score to mean much.
    LowVolume,
    /// Every commit in the window shares one author identity.
    SingleAuthor,
    /// Baseline sample size below the minimum for a scored signal.
    InsufficientBaseline,
    /// AI was requested but the explainer failed, timed out, or had no
    /// credential.
    AiUnavailable,
    /// Every commit in the window landed on a Saturday or Sunday.
    WeekendOnly,
}

impl fmt::Display for Confounder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confounder::LowVolume => "LOW_VOLUME",
            Confounder::SingleAuthor => "SINGLE_AUTHOR",
            Confounder::InsufficientBaseline => "INSUFFICIENT_BASELINE",
            Confounder::AiUnavailable => "AI_UNAVAILABLE",
            Confounder::WeekendOnly => "WEEKEND_ONLY",
        };
        write!(f, "{s}")
    }
}

/// Optional narrative explanation returned by the AI explainer.
///
/// # Examples
///
/// ```
/// use codemetry_core::AiSummary;
///
/// let summary = AiSummary {
///     explanation_bullets: vec!["Fix rate spiked after the release".into()],
/// };
/// assert_eq!(summary.explanation_bullets.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSummary {
    /// Ordered explanation bullets.
    pub explanation_bullets: Vec<String>,
}

/// Discrete mood bucket derived from the numeric score.
///
/// Thresholds: ≤20 drained, ≤40 strained, ≤60 steady, ≤80 upbeat,
/// else thriving.
///
/// # Examples
///
/// ```
/// use codemetry_core::MoodLabel;
///
/// assert_eq!(MoodLabel::from_score(50.0), MoodLabel::Steady);
/// assert_eq!(MoodLabel::from_score(12.0), MoodLabel::Drained);
/// assert_eq!(MoodLabel::from_score(100.0), MoodLabel::Thriving);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    /// Score in `[0, 20]`.
    Drained,
    /// Score in `(20, 40]`.
    Strained,
    /// Score in `(40, 60]`.
    Steady,
    /// Score in `(60, 80]`.
    Upbeat,
    /// Score in `(80, 100]`.
    Thriving,
}

impl MoodLabel {
    /// Map a mood score in `[0, 100]` to its label bucket.
    pub fn from_score(score: f64) -> Self {
        if score <= 20.0 {
            MoodLabel::Drained
        } else if score <= 40.0 {
            MoodLabel::Strained
        } else if score <= 60.0 {
            MoodLabel::Steady
        } else if score <= 80.0 {
            MoodLabel::Upbeat
        } else {
            MoodLabel::Thriving
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MoodLabel::Drained => "Drained",
            MoodLabel::Strained => "Strained",
            MoodLabel::Steady => "Steady",
            MoodLabel::Upbeat => "Upbeat",
            MoodLabel::Thriving => "Thriving",
        };
        write!(f, "{s}")
    }
}

/// Engine output for one analysis window.
///
/// Field names are part of the serialized contract and must stay stable.
///
/// # Examples
///
/// ```
/// use codemetry_core::{MoodLabel, MoodWindowResult};
///
/// let result = MoodWindowResult {
///     window_label: "2024-01-15".into(),
///     mood_label: MoodLabel::Steady,
///     mood_score: 50.0,
///     confidence: 0.0,
///     reasons: vec![],
///     confounders: vec![],
///     ai_summary: None,
/// };
/// let json = serde_json::to_value(&result).unwrap();
/// assert_eq!(json["mood_label"], "steady");
/// assert!(json.get("ai_summary").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodWindowResult {
    /// Label of the scored window.
    pub window_label: String,
    /// Discrete mood bucket.
    pub mood_label: MoodLabel,
    /// Mood score in `[0, 100]`.
    pub mood_score: f64,
    /// Confidence in `[0, 1]` derived from sample sufficiency.
    pub confidence: f64,
    /// Contributors sorted by `abs(contribution)` descending.
    pub reasons: Vec<Reason>,
    /// Deduplicated, order-stable interpretability caveats.
    pub confounders: Vec<Confounder>,
    /// Narrative explanation, absent when AI is disabled or failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<AiSummary>,
}

/// Top-level serializable analysis document.
///
/// # Examples
///
/// ```
/// use codemetry_core::{AnalysisResult, SCHEMA_VERSION};
///
/// let result = AnalysisResult {
///     schema_version: SCHEMA_VERSION.into(),
///     baseline_days: 56,
///     windows: vec![],
/// };
/// let json = result.to_json_pretty().unwrap();
/// assert!(json.contains("\"schema_version\": \"1.0\""));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Result format version, currently [`SCHEMA_VERSION`].
    pub schema_version: String,
    /// Effective baseline days, echoed for auditability.
    pub baseline_days: u32,
    /// Windows ordered chronologically ascending.
    pub windows: Vec<MoodWindowResult>,
}

impl AnalysisResult {
    /// Serialize the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::Serialization`] if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String, CodemetryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Validated engine input describing what to analyze.
///
/// Either `since`/`until` or `days` selects the range; `days` counts back
/// from "now" when the explicit bounds are absent.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codemetry_core::AnalysisRequest;
///
/// let request = AnalysisRequest {
///     days: Some(7),
///     ..AnalysisRequest::default()
/// };
/// let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
/// let (since, until) = request.resolve_range(now).unwrap();
/// assert_eq!(until, now);
/// assert_eq!((until - since).num_days(), 7);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Inclusive start of the analysis range.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive end of the analysis range.
    pub until: Option<DateTime<Utc>>,
    /// Number of days back from now, used when `since`/`until` are absent.
    pub days: Option<u32>,
    /// Only count commits whose author name or email matches.
    pub author: Option<String>,
    /// Branch to walk instead of HEAD.
    pub branch: Option<String>,
    /// Days of prior history used to build baselines.
    pub baseline_days: u32,
    /// Days past each window's end scanned for follow-up fixes.
    pub follow_up_horizon_days: u32,
    /// Whether to request AI explanations.
    pub ai_enabled: bool,
    /// AI engine name, e.g. `"openai"`.
    pub ai_engine: String,
    /// Requested output rendering (consumed by the adapter, echoed here).
    pub output_format: OutputFormat,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            since: None,
            until: None,
            days: Some(7),
            author: None,
            branch: None,
            baseline_days: 56,
            follow_up_horizon_days: 3,
            ai_enabled: false,
            ai_engine: "openai".into(),
            output_format: OutputFormat::Table,
        }
    }
}

impl AnalysisRequest {
    /// Validate the request and resolve it to a concrete `[since, until)`
    /// range.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::InvalidArgument`] when `since > until`,
    /// when only one explicit bound is given, or when `days`,
    /// `baseline_days`, or `follow_up_horizon_days` is non-positive.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use codemetry_core::AnalysisRequest;
    ///
    /// let request = AnalysisRequest {
    ///     since: Some(Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap()),
    ///     until: Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()),
    ///     ..AnalysisRequest::default()
    /// };
    /// assert!(request.resolve_range(Utc::now()).is_err());
    /// ```
    pub fn resolve_range(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), CodemetryError> {
        if self.baseline_days == 0 {
            return Err(CodemetryError::InvalidArgument(
                "baseline_days must be positive".into(),
            ));
        }
        if self.follow_up_horizon_days == 0 {
            return Err(CodemetryError::InvalidArgument(
                "follow_up_horizon_days must be positive".into(),
            ));
        }

        match (self.since, self.until) {
            (Some(since), Some(until)) => {
                if since > until {
                    return Err(CodemetryError::InvalidArgument(format!(
                        "since ({since}) is after until ({until})"
                    )));
                }
                Ok((since, until))
            }
            (None, None) => {
                let days = self.days.unwrap_or(7);
                if days == 0 {
                    return Err(CodemetryError::InvalidArgument(
                        "days must be positive".into(),
                    ));
                }
                Ok((now - Duration::days(i64::from(days)), now))
            }
            _ => Err(CodemetryError::InvalidArgument(
                "provide both --since and --until, or neither".into(),
            )),
        }
    }
}

/// Output format for rendered results.
///
/// # Examples
///
/// ```
/// use codemetry_core::OutputFormat;
///
/// let format: OutputFormat = "json".parse().unwrap();
/// assert_eq!(format, OutputFormat::Json);
/// assert_eq!(format.to_string(), "json");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// Machine-readable JSON with snake_case keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
