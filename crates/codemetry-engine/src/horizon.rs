//! Follow-up horizon matching.
//!
//! The one deliberate exception to the no-future-leakage rule: after a
//! window is scored, commits in `(window.end, window.end + horizon]` whose
//! message matches the fix pattern are checked for file overlap with the
//! window. Each distinct overlapping file counts once toward the regret
//! count, however many follow-up commits touch it.

use std::collections::HashSet;

use chrono::Duration;
use codemetry_core::{AnalysisWindow, CommitRecord};
use regex::Regex;

/// Count distinct window files regretted by follow-up fixes.
///
/// `window_commits` are the commits inside the window; `all_commits` is the
/// full fetched history (which must extend past the window's end by the
/// horizon for the scan to see anything).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codemetry_core::AnalysisWindow;
/// use codemetry_engine::horizon::count_regret_files;
/// use regex::Regex;
///
/// let window = AnalysisWindow {
///     label: "2024-01-15".into(),
///     start: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
///     end: Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap(),
/// };
/// let fix = Regex::new(r"(?i)\bfix\b").unwrap();
/// assert_eq!(count_regret_files(&window, &[], &[], 3, &fix), 0);
/// ```
pub fn count_regret_files(
    window: &AnalysisWindow,
    window_commits: &[CommitRecord],
    all_commits: &[CommitRecord],
    horizon_days: u32,
    fix_pattern: &Regex,
) -> usize {
    if window_commits.is_empty() {
        return 0;
    }

    let touched: HashSet<&str> = window_commits.iter().flat_map(|c| c.paths()).collect();
    if touched.is_empty() {
        return 0;
    }

    let horizon_end = window.end + Duration::days(i64::from(horizon_days));
    let mut regretted: HashSet<&str> = HashSet::new();

    for commit in all_commits {
        if commit.timestamp <= window.end || commit.timestamp > horizon_end {
            continue;
        }
        if !fix_pattern.is_match(&commit.message) {
            continue;
        }
        for path in commit.paths() {
            if touched.contains(path) {
                regretted.insert(path);
            }
        }
    }

    regretted.len()
}
