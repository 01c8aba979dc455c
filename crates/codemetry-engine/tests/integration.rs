//! End-to-end pipeline tests over synthetic commit histories.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Utc, Weekday};
use codemetry_core::{
    AiExplainer, AiSummary, AnalysisRequest, AnalysisResult, CodemetryError,
    CommitHistoryProvider, Confounder, ExplainFuture, ExternalConfig, FileChange, HistoryQuery,
    CommitRecord, WindowDigest,
};
use codemetry_engine::Analyzer;

struct FixtureProvider {
    commits: Vec<CommitRecord>,
}

impl CommitHistoryProvider for FixtureProvider {
    fn fetch(&self, query: &HistoryQuery) -> Result<Vec<CommitRecord>, CodemetryError> {
        Ok(self
            .commits
            .iter()
            .filter(|c| c.timestamp >= query.since && c.timestamp <= query.until)
            .cloned()
            .collect())
    }
}

struct StubExplainer;

impl AiExplainer for StubExplainer {
    fn explain(&self, digest: WindowDigest) -> ExplainFuture<'_> {
        Box::pin(async move {
            Ok(AiSummary {
                explanation_bullets: vec![
                    format!("mood was {} on {}", digest.mood_label, digest.window_label),
                    "top reasons reflect commit-message patterns".into(),
                ],
            })
        })
    }
}

fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).unwrap()
}

fn commit(ts: DateTime<Utc>, message: &str, path: &str, churn: u64) -> CommitRecord {
    CommitRecord {
        id: format!("c{}", ts.timestamp()),
        author: "alice".into(),
        email: "alice@example.com".into(),
        timestamp: ts,
        message: message.into(),
        files: vec![FileChange {
            path: path.into(),
            insertions: churn,
            deletions: 0,
        }],
    }
}

/// Eight weeks of unremarkable weekday history ending before February.
fn steady_history() -> Vec<CommitRecord> {
    let mut commits = Vec::new();
    for day in 1..=56u32 {
        let (month, dom) = if day <= 31 { (1, day) } else { (2, day - 31) };
        let ts = at(month, dom, 10);
        if matches!(ts.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        commits.push(commit(ts, "routine work", "src/lib.rs", 30));
        commits.push(commit(at(month, dom, 14), "more routine work", "src/util.rs", 20));
    }
    commits
}

fn analyze_with(
    commits: Vec<CommitRecord>,
    request: &AnalysisRequest,
) -> AnalysisResult {
    let analyzer = Analyzer::new(
        Arc::new(FixtureProvider { commits }),
        ExternalConfig::default(),
    );
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(analyzer.analyze(Path::new("/tmp/fixture"), request))
        .unwrap()
}

fn request(since: DateTime<Utc>, until: DateTime<Utc>, baseline_days: u32) -> AnalysisRequest {
    AnalysisRequest {
        since: Some(since),
        until: Some(until),
        days: None,
        baseline_days,
        ..AnalysisRequest::default()
    }
}

#[test]
fn scores_and_confidence_stay_in_bounds() {
    let mut commits = steady_history();
    // Pile a pathological day on top of the steady history.
    for hour in 0..24 {
        commits.push(commit(at(3, 1, hour), "fix fix fix", "src/lib.rs", 5000));
    }
    let result = analyze_with(commits, &request(at(2, 20, 0), at(3, 3, 0), 56));
    assert!(!result.windows.is_empty());
    for window in &result.windows {
        assert!((0.0..=100.0).contains(&window.mood_score), "{}", window.mood_score);
        assert!((0.0..=1.0).contains(&window.confidence), "{}", window.confidence);
    }
}

#[test]
fn reasons_are_ranked_by_contribution_magnitude() {
    let mut commits = steady_history();
    commits.push(commit(at(2, 5, 2), "fix crash", "src/lib.rs", 400));
    commits.push(commit(at(2, 5, 3), "wip hack", "src/util.rs", 900));
    commits.push(commit(at(2, 5, 23), "Revert \"routine work\"", "src/lib.rs", 30));
    let result = analyze_with(commits, &request(at(2, 5, 0), at(2, 6, 0), 30));
    let reasons = &result.windows[0].reasons;
    assert!(!reasons.is_empty());
    for pair in reasons.windows(2) {
        assert!(pair[0].contribution.abs() >= pair[1].contribution.abs());
    }
}

#[test]
fn empty_window_scores_neutral_with_low_volume() {
    let result = analyze_with(steady_history(), &request(at(2, 10, 0), at(2, 11, 0), 30));
    let window = &result.windows[0];
    assert_eq!(window.mood_score, 50.0);
    assert_eq!(window.confidence, 0.0);
    assert!(window.reasons.is_empty());
    assert!(window.confounders.contains(&Confounder::LowVolume));
}

#[test]
fn confounders_never_duplicate() {
    let commits = vec![
        commit(at(1, 13, 2), "wip", "a.rs", 10),
        commit(at(1, 13, 3), "fix", "a.rs", 10),
    ];
    // 2024-01-13 is a Saturday with a single author and no prior history.
    let result = analyze_with(commits, &request(at(1, 13, 0), at(1, 14, 0), 14));
    let confounders = &result.windows[0].confounders;
    let unique: std::collections::HashSet<_> = confounders.iter().collect();
    assert_eq!(unique.len(), confounders.len());
    assert!(confounders.contains(&Confounder::WeekendOnly));
    assert!(confounders.contains(&Confounder::SingleAuthor));
}

#[test]
fn analysis_is_idempotent() {
    let commits = steady_history();
    let req = request(at(2, 1, 0), at(2, 8, 0), 30);
    let first = analyze_with(commits.clone(), &req);
    let second = analyze_with(commits, &req);
    let a = first.to_json_pretty().unwrap();
    let b = second.to_json_pretty().unwrap();
    assert_eq!(a, b);
}

#[test]
fn tiny_history_flags_insufficient_baseline_but_still_scores() {
    // Four days of history total; a fix-heavy final day is scored against
    // priors because the baseline has too few samples.
    let commits = vec![
        commit(at(1, 12, 10), "start project", "src/main.rs", 100),
        commit(at(1, 15, 9), "fix parser bug", "src/parser.rs", 40),
        commit(at(1, 15, 11), "fix another bug", "src/parser.rs", 25),
        commit(at(1, 15, 14), "add tests", "tests/parser.rs", 60),
        commit(at(1, 15, 16), "hotfix for the fix", "src/parser.rs", 10),
    ];
    let result = analyze_with(commits, &request(at(1, 15, 0), at(1, 16, 0), 56));
    let window = &result.windows[0];

    assert!(window.confounders.contains(&Confounder::InsufficientBaseline));
    assert!(window.confidence < 0.5);
    // A 75% fix rate is far above the prior, so it must surface as an
    // adverse reason even with almost no history.
    let fix_reason = window
        .reasons
        .iter()
        .find(|r| r.signal == "fix_rate")
        .expect("fix_rate reason present");
    assert!(fix_reason.contribution < 0.0);
    assert!(window.mood_score < 50.0);
}

#[test]
fn richer_baseline_raises_confidence() {
    let sparse = vec![
        commit(at(2, 1, 10), "work", "a.rs", 20),
        commit(at(2, 5, 10), "work", "a.rs", 20),
        commit(at(2, 6, 10), "target day", "a.rs", 20),
        commit(at(2, 6, 12), "target day again", "a.rs", 20),
    ];
    let sparse_result = analyze_with(sparse, &request(at(2, 6, 0), at(2, 7, 0), 30));

    let mut rich = steady_history();
    rich.push(commit(at(2, 6, 10), "target day", "a.rs", 20));
    rich.push(commit(at(2, 6, 12), "target day again", "a.rs", 20));
    let rich_result = analyze_with(rich, &request(at(2, 6, 0), at(2, 7, 0), 30));

    assert!(rich_result.windows[0].confidence > sparse_result.windows[0].confidence);
}

#[test]
fn follow_up_fixes_drag_the_window_down() {
    let base = steady_history();
    let req = request(at(2, 6, 0), at(2, 7, 0), 30);

    let without = analyze_with(base.clone(), &req);

    let mut with = base;
    // A fix the next day touching a file changed in the window.
    with.push(commit(at(2, 7, 9), "fix regression from yesterday", "src/lib.rs", 15));
    let with = analyze_with(with, &req);

    assert!(with.windows[0].mood_score < without.windows[0].mood_score);
    let reason = with.windows[0]
        .reasons
        .iter()
        .find(|r| r.signal == "follow_up_fixes")
        .expect("follow-up reason present");
    assert!(reason.summary.contains("follow-up fix"));
    assert_eq!(reason.contribution, -4.0);
}

#[test]
fn ai_summaries_attach_per_window() {
    let analyzer = Analyzer::new(
        Arc::new(FixtureProvider {
            commits: steady_history(),
        }),
        ExternalConfig::default(),
    )
    .with_explainer(Arc::new(StubExplainer));
    let req = AnalysisRequest {
        ai_enabled: true,
        ..request(at(2, 5, 0), at(2, 7, 0), 30)
    };
    let result = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(analyzer.analyze(Path::new("/tmp/fixture"), &req))
        .unwrap();

    for window in &result.windows {
        let summary = window.ai_summary.as_ref().expect("summary attached");
        assert!(summary.explanation_bullets[0].contains(&window.window_label));
        assert!(!window.confounders.contains(&Confounder::AiUnavailable));
    }
}

#[test]
fn ai_without_explainer_degrades_softly() {
    let req = AnalysisRequest {
        ai_enabled: true,
        ..request(at(2, 5, 0), at(2, 6, 0), 30)
    };
    let result = analyze_with(steady_history(), &req);
    let window = &result.windows[0];
    assert!(window.ai_summary.is_none());
    assert!(window.confounders.contains(&Confounder::AiUnavailable));
    // The deterministic scoring is untouched by AI failure.
    assert!((0.0..=100.0).contains(&window.mood_score));
}

#[test]
fn json_document_matches_the_contract() {
    let result = analyze_with(steady_history(), &request(at(2, 5, 0), at(2, 6, 0), 30));
    let json: serde_json::Value = serde_json::from_str(&result.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["schema_version"], "1.0");
    assert_eq!(json["baseline_days"], 30);
    let window = &json["windows"][0];
    assert!(window["window_label"].is_string());
    assert!(window["mood_label"].is_string());
    assert!(window["mood_score"].is_number());
    assert!(window["confidence"].is_number());
    assert!(window["reasons"].is_array());
    assert!(window["confounders"].is_array());
    assert!(window.get("ai_summary").is_none());
}
