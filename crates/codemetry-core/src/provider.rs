use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CodemetryError;
use crate::types::{AiSummary, CommitRecord, MoodLabel, Reason, Signal};

/// Parameters for one history fetch.
///
/// The range may extend past the analysis request's nominal bounds: the
/// engine fetches extra history before `since` for baselines and past
/// `until` for the follow-up horizon.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codemetry_core::HistoryQuery;
///
/// let query = HistoryQuery {
///     repo_path: "/tmp/repo".into(),
///     branch: None,
///     author: Some("alice".into()),
///     since: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     until: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
/// };
/// assert!(query.since < query.until);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    /// Path to the repository.
    pub repo_path: PathBuf,
    /// Branch to walk instead of HEAD.
    pub branch: Option<String>,
    /// Only include commits whose author name or email contains this.
    pub author: Option<String>,
    /// Inclusive start of the range.
    pub since: DateTime<Utc>,
    /// Inclusive end of the range.
    pub until: DateTime<Utc>,
}

/// Source of ordered commit history.
///
/// Implementations own all version-control process details; the engine
/// stays testable with synthetic commit fixtures. Empty results are valid,
/// a repository without any history is not.
pub trait CommitHistoryProvider: Send + Sync {
    /// Fetch commits matching `query`, ordered by timestamp ascending.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::InvalidRepo`] when the path is not a valid
    /// repository with history, or [`CodemetryError::Git`] for failures
    /// after the repository was opened.
    fn fetch(&self, query: &HistoryQuery) -> Result<Vec<CommitRecord>, CodemetryError>;
}

/// The scored facts about one window handed to the AI explainer.
///
/// # Examples
///
/// ```
/// use codemetry_core::{MoodLabel, WindowDigest};
///
/// let digest = WindowDigest {
///     window_label: "2024-01-15".into(),
///     mood_label: MoodLabel::Strained,
///     mood_score: 32.0,
///     signals: vec![],
///     reasons: vec![],
/// };
/// assert_eq!(digest.mood_label, MoodLabel::Strained);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowDigest {
    /// Label of the window being explained.
    pub window_label: String,
    /// Discrete mood bucket.
    pub mood_label: MoodLabel,
    /// Numeric mood score.
    pub mood_score: f64,
    /// Signals present in the window.
    pub signals: Vec<Signal>,
    /// Ranked scoring reasons.
    pub reasons: Vec<Reason>,
}

/// Future returned by [`AiExplainer::explain`].
pub type ExplainFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AiSummary, CodemetryError>> + Send + 'a>>;

/// Optional narrative-explanation collaborator.
///
/// Failure is always soft: a timeout, auth, or network error becomes an
/// `AI_UNAVAILABLE` confounder on the window, never an analysis failure.
pub trait AiExplainer: Send + Sync {
    /// Produce explanation bullets for one scored window.
    fn explain(&self, digest: WindowDigest) -> ExplainFuture<'_>;
}
