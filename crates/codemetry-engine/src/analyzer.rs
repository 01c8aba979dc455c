//! The analysis pipeline: fetch, window, score, explain, assemble.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use codemetry_core::{
    AiExplainer, AiSummary, AnalysisRequest, AnalysisResult, CodemetryError,
    CommitHistoryProvider, Confounder, ExternalConfig, HistoryQuery, MoodLabel, MoodWindowResult,
    WindowDigest,
};

use crate::confounders::{self, WindowFacts};
use crate::{assemble, baseline::Baseline, confidence, horizon, scoring, signals, windows};

/// How many times one window's explanation is attempted before giving up.
pub const MAX_AI_ATTEMPTS: u32 = 2;

/// Read-only analysis over a repository's commit history.
///
/// Holds the history provider and optional AI explainer behind their traits,
/// so the whole pipeline runs against synthetic fixtures in tests. Scoring
/// is deterministic; only the optional AI phase talks to the network.
pub struct Analyzer {
    provider: Arc<dyn CommitHistoryProvider>,
    explainer: Option<Arc<dyn AiExplainer>>,
    external: ExternalConfig,
}

impl Analyzer {
    /// Create an analyzer without an AI explainer.
    pub fn new(provider: Arc<dyn CommitHistoryProvider>, external: ExternalConfig) -> Self {
        Self {
            provider,
            explainer: None,
            external,
        }
    }

    /// Attach an AI explainer for the optional explanation phase.
    pub fn with_explainer(mut self, explainer: Arc<dyn AiExplainer>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    /// Run the full pipeline for one request.
    ///
    /// Fetches history extended backward by `baseline_days` and forward by
    /// the follow-up horizon, scores every daily window in the requested
    /// range, and optionally attaches AI explanations. Running the same
    /// request against the same history twice yields identical scores.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::InvalidArgument`] for an invalid request
    /// and propagates provider errors. AI failures never surface here; they
    /// degrade to an `AI_UNAVAILABLE` confounder per window.
    pub async fn analyze(
        &self,
        repo_path: &Path,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, CodemetryError> {
        let (since, until) = request.resolve_range(Utc::now())?;
        let day_windows = windows::partition_daily(since, until);
        let (Some(first), Some(last)) = (day_windows.first(), day_windows.last()) else {
            return Ok(assemble::assemble_result(request.baseline_days, Vec::new()));
        };

        // Windows are day-aligned while the request bounds may fall mid-day,
        // so the fetch range is anchored on the partitioned windows: the
        // oldest window's full baseline and the newest window's full horizon
        // must both land inside it.
        let query = HistoryQuery {
            repo_path: repo_path.to_path_buf(),
            branch: request.branch.clone(),
            author: request.author.clone(),
            since: first.start - chrono::Duration::days(i64::from(request.baseline_days)),
            until: last.end + chrono::Duration::days(i64::from(request.follow_up_horizon_days)),
        };
        let mut commits = self.provider.fetch(&query)?;
        commits.sort_by_key(|c| c.timestamp);

        let mut results = Vec::new();
        let mut digests = Vec::new();

        for window in &day_windows {
            let lo = commits.partition_point(|c| c.timestamp < window.start);
            let hi = commits.partition_point(|c| c.timestamp < window.end);
            let slice = &commits[lo..hi];

            let raw = signals::extract(slice, &self.external.patterns, self.external.normal_hours);
            let baseline = Baseline::build(
                &commits,
                window.start,
                request.baseline_days,
                &self.external.patterns,
                self.external.normal_hours,
            );
            let mut score = scoring::score_window(&raw, &baseline);
            let regrets = horizon::count_regret_files(
                window,
                slice,
                &commits,
                request.follow_up_horizon_days,
                &self.external.patterns.fix,
            );
            scoring::apply_follow_up(&mut score, regrets, request.follow_up_horizon_days);

            let confidence = confidence::estimate(slice.len(), baseline.bucket_samples);
            let confounders = confounders::detect(&WindowFacts {
                commits: slice,
                insufficient_baseline: score.insufficient_baseline,
            });

            digests.push(WindowDigest {
                window_label: window.label.clone(),
                mood_label: MoodLabel::from_score(score.mood_score),
                mood_score: score.mood_score,
                signals: score.signals.clone(),
                reasons: score.reasons.clone(),
            });
            results.push(assemble::assemble_window(window, score, confidence, confounders));
        }

        if request.ai_enabled {
            self.attach_explanations(&mut results, digests).await;
        }

        Ok(assemble::assemble_result(request.baseline_days, results))
    }

    /// Explain all windows concurrently within one shared timeout budget.
    async fn attach_explanations(
        &self,
        results: &mut [MoodWindowResult],
        digests: Vec<WindowDigest>,
    ) {
        let Some(explainer) = self.explainer.clone() else {
            for result in results.iter_mut() {
                mark_ai_unavailable(result);
            }
            return;
        };

        let deadline = Instant::now() + Duration::from_secs(self.external.ai.timeout_secs);
        let handles: Vec<_> = digests
            .into_iter()
            .map(|digest| {
                let explainer = Arc::clone(&explainer);
                tokio::spawn(explain_with_retry(explainer, digest, deadline))
            })
            .collect();

        for (result, handle) in results.iter_mut().zip(handles) {
            match handle.await {
                Ok(Some(summary)) => result.ai_summary = Some(summary),
                _ => mark_ai_unavailable(result),
            }
        }
    }
}

async fn explain_with_retry(
    explainer: Arc<dyn AiExplainer>,
    digest: WindowDigest,
    deadline: Instant,
) -> Option<AiSummary> {
    for _ in 0..MAX_AI_ATTEMPTS {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return None;
        }
        match tokio::time::timeout(remaining, explainer.explain(digest.clone())).await {
            Ok(Ok(summary)) => return Some(summary),
            // Failed fast enough to retry inside the budget.
            Ok(Err(_)) => continue,
            // Timed out against the whole remaining budget.
            Err(_) => return None,
        }
    }
    None
}

fn mark_ai_unavailable(result: &mut MoodWindowResult) {
    if !result.confounders.contains(&Confounder::AiUnavailable) {
        result.confounders.push(Confounder::AiUnavailable);
    }
}
