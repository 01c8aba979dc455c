//! Signal extraction from a window's commit slice.
//!
//! Turns the commits assigned to one window into named raw signals. A window
//! with zero qualifying commits produces no signals at all — absent signals
//! are excluded from scoring rather than treated as zero, and surface as a
//! `LOW_VOLUME` confounder downstream.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Timelike};
use codemetry_core::{CommitRecord, KeywordPatterns, NormalHours};

/// Names of all extractable signals.
pub mod names {
    /// Number of commits in the window.
    pub const COMMIT_COUNT: &str = "commit_count";
    /// Fraction of messages matching the fix pattern.
    pub const FIX_RATE: &str = "fix_rate";
    /// Fraction of messages matching the revert pattern.
    pub const REVERT_RATE: &str = "revert_rate";
    /// Fraction of messages matching the wip pattern.
    pub const WIP_RATE: &str = "wip_rate";
    /// Total insertions + deletions.
    pub const CHURN: &str = "churn";
    /// Number of distinct files touched.
    pub const FILES_TOUCHED: &str = "files_touched";
    /// Fraction of commits outside the normal-hours band.
    pub const LATE_NIGHT_RATIO: &str = "late_night_ratio";
    /// Population stddev of per-commit churn.
    pub const SIZE_DISPERSION: &str = "size_dispersion";
    /// Population stddev of inter-commit gaps, in hours.
    pub const CADENCE_DISPERSION: &str = "cadence_dispersion";
    /// Horizon feedback pseudo-signal: distinct regretted files.
    pub const FOLLOW_UP_FIXES: &str = "follow_up_fixes";
}

/// Extract raw signals for one window's commits.
///
/// Pure function of the commit slice. Returns an empty map for an empty
/// slice; `cadence_dispersion` additionally needs at least two commits.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codemetry_core::{CommitRecord, KeywordConfig, NormalHours};
/// use codemetry_engine::signals::{self, names};
///
/// let patterns = KeywordConfig::default().compile().unwrap();
/// let hours = NormalHours { start: 8, end: 20 };
/// let commit = CommitRecord {
///     id: "c1".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 23, 0, 0).unwrap(),
///     message: "fix: off-by-one".into(),
///     files: vec![],
/// };
/// let raw = signals::extract(&[commit], &patterns, hours);
/// assert_eq!(raw[names::FIX_RATE], 1.0);
/// assert_eq!(raw[names::LATE_NIGHT_RATIO], 1.0);
/// ```
pub fn extract(
    commits: &[CommitRecord],
    patterns: &KeywordPatterns,
    hours: NormalHours,
) -> BTreeMap<&'static str, f64> {
    let mut raw = BTreeMap::new();
    if commits.is_empty() {
        return raw;
    }

    let n = commits.len() as f64;
    raw.insert(names::COMMIT_COUNT, n);

    let rate = |matched: usize| matched as f64 / n;
    raw.insert(
        names::FIX_RATE,
        rate(commits.iter().filter(|c| patterns.fix.is_match(&c.message)).count()),
    );
    raw.insert(
        names::REVERT_RATE,
        rate(
            commits
                .iter()
                .filter(|c| patterns.revert.is_match(&c.message))
                .count(),
        ),
    );
    raw.insert(
        names::WIP_RATE,
        rate(commits.iter().filter(|c| patterns.wip.is_match(&c.message)).count()),
    );

    let churns: Vec<f64> = commits.iter().map(|c| c.churn() as f64).collect();
    raw.insert(names::CHURN, churns.iter().sum());
    raw.insert(names::SIZE_DISPERSION, pop_stddev(&churns));

    let distinct: HashSet<&str> = commits.iter().flat_map(|c| c.paths()).collect();
    raw.insert(names::FILES_TOUCHED, distinct.len() as f64);

    raw.insert(
        names::LATE_NIGHT_RATIO,
        rate(
            commits
                .iter()
                .filter(|c| hours.is_late(c.timestamp.hour()))
                .count(),
        ),
    );

    if commits.len() >= 2 {
        let mut stamps: Vec<i64> = commits.iter().map(|c| c.timestamp.timestamp()).collect();
        stamps.sort_unstable();
        let gaps: Vec<f64> = stamps
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) as f64 / 3600.0)
            .collect();
        raw.insert(names::CADENCE_DISPERSION, pop_stddev(&gaps));
    }

    raw
}

/// Whether every commit in the slice landed on a Saturday or Sunday.
///
/// Returns `false` for an empty slice.
pub fn weekend_only(commits: &[CommitRecord]) -> bool {
    !commits.is_empty()
        && commits.iter().all(|c| {
            let wd = c.timestamp.weekday();
            wd == chrono::Weekday::Sat || wd == chrono::Weekday::Sun
        })
}

/// Arithmetic mean; 0.0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two values.
pub(crate) fn pop_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use codemetry_core::{FileChange, KeywordConfig};

    fn patterns() -> KeywordPatterns {
        KeywordConfig::default().compile().unwrap()
    }

    fn hours() -> NormalHours {
        NormalHours { start: 8, end: 20 }
    }

    fn make_commit(ts: DateTime<Utc>, message: &str, files: Vec<(&str, u64, u64)>) -> CommitRecord {
        CommitRecord {
            id: format!("c{}", ts.timestamp()),
            author: "alice".into(),
            email: "alice@example.com".into(),
            timestamp: ts,
            message: message.into(),
            files: files
                .into_iter()
                .map(|(path, insertions, deletions)| FileChange {
                    path: path.into(),
                    insertions,
                    deletions,
                })
                .collect(),
        }
    }

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, min, 0).unwrap()
    }

    #[test]
    fn empty_slice_yields_no_signals() {
        let raw = extract(&[], &patterns(), hours());
        assert!(raw.is_empty());
    }

    #[test]
    fn rates_count_matching_messages() {
        let commits = vec![
            make_commit(at(10, 0), "fix: crash", vec![("a.rs", 5, 1)]),
            make_commit(at(11, 0), "add feature", vec![("b.rs", 20, 0)]),
            make_commit(at(12, 0), "Revert \"add feature\"", vec![("b.rs", 0, 20)]),
            make_commit(at(13, 0), "wip on parser", vec![("c.rs", 3, 3)]),
        ];
        let raw = extract(&commits, &patterns(), hours());
        assert_eq!(raw[names::COMMIT_COUNT], 4.0);
        assert_eq!(raw[names::FIX_RATE], 0.25);
        assert_eq!(raw[names::REVERT_RATE], 0.25);
        assert_eq!(raw[names::WIP_RATE], 0.25);
    }

    #[test]
    fn churn_and_files_accumulate() {
        let commits = vec![
            make_commit(at(10, 0), "one", vec![("a.rs", 5, 1), ("b.rs", 2, 0)]),
            make_commit(at(11, 0), "two", vec![("a.rs", 3, 3)]),
        ];
        let raw = extract(&commits, &patterns(), hours());
        assert_eq!(raw[names::CHURN], 14.0);
        assert_eq!(raw[names::FILES_TOUCHED], 2.0);
    }

    #[test]
    fn late_night_ratio_uses_band() {
        let commits = vec![
            make_commit(at(2, 0), "night owl", vec![]),
            make_commit(at(12, 0), "midday", vec![]),
            make_commit(at(23, 0), "another late one", vec![]),
        ];
        let raw = extract(&commits, &patterns(), hours());
        assert!((raw[names::LATE_NIGHT_RATIO] - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn cadence_dispersion_needs_two_commits() {
        let one = vec![make_commit(at(10, 0), "solo", vec![])];
        let raw = extract(&one, &patterns(), hours());
        assert!(!raw.contains_key(names::CADENCE_DISPERSION));

        let two = vec![
            make_commit(at(10, 0), "first", vec![]),
            make_commit(at(12, 0), "second", vec![]),
        ];
        let raw = extract(&two, &patterns(), hours());
        // A single gap has zero dispersion.
        assert_eq!(raw[names::CADENCE_DISPERSION], 0.0);
    }

    #[test]
    fn uneven_gaps_have_positive_dispersion() {
        let commits = vec![
            make_commit(at(8, 0), "a", vec![]),
            make_commit(at(9, 0), "b", vec![]),
            make_commit(at(19, 0), "c", vec![]),
        ];
        let raw = extract(&commits, &patterns(), hours());
        assert!(raw[names::CADENCE_DISPERSION] > 0.0);
    }

    #[test]
    fn weekend_only_detects_saturday_and_sunday() {
        // 2024-01-13 is a Saturday, 2024-01-14 a Sunday.
        let sat = Utc.with_ymd_and_hms(2024, 1, 13, 10, 0, 0).unwrap();
        let sun = Utc.with_ymd_and_hms(2024, 1, 14, 10, 0, 0).unwrap();
        let mon = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();

        let weekend = vec![make_commit(sat, "a", vec![]), make_commit(sun, "b", vec![])];
        assert!(weekend_only(&weekend));

        let mixed = vec![make_commit(sat, "a", vec![]), make_commit(mon, "b", vec![])];
        assert!(!weekend_only(&mixed));
        assert!(!weekend_only(&[]));
    }

    #[test]
    fn pop_stddev_basics() {
        assert_eq!(pop_stddev(&[]), 0.0);
        assert_eq!(pop_stddev(&[5.0]), 0.0);
        assert_eq!(pop_stddev(&[2.0, 2.0, 2.0]), 0.0);
        assert!((pop_stddev(&[2.0, 4.0]) - 1.0).abs() < 1e-9);
    }
}
