//! Baseline distributions from strictly prior history.
//!
//! The preceding `baseline_days` are partitioned into the same daily buckets
//! the main analysis uses; each signal's per-bucket values become a
//! mean/stddev distribution. Buckets without commits contribute no samples.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use codemetry_core::{BaselineDistribution, CommitRecord, KeywordPatterns, NormalHours};

use crate::signals::{self, names};
use crate::windows::partition_daily;

/// Minimum daily samples before a distribution is trusted for
/// normalization. Below this the signal is scored against its prior and the
/// window gets an `INSUFFICIENT_BASELINE` confounder.
pub const MIN_BASELINE_SAMPLES: usize = 3;

/// Stddev below this is degenerate; normalization yields z = 0 instead of
/// dividing by zero.
pub const DEGENERATE_STDDEV: f64 = 1e-9;

/// Result of normalizing one raw value against the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    /// The z-score, unclamped.
    pub z: f64,
    /// Whether the prior distribution was used because the baseline sample
    /// was too small.
    pub insufficient: bool,
}

/// Per-signal reference statistics for one window.
///
/// Built only from commits dated strictly before the window's start; the
/// window's own commits never leak into its baseline.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codemetry_core::{KeywordConfig, NormalHours};
/// use codemetry_engine::baseline::Baseline;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
/// let patterns = KeywordConfig::default().compile().unwrap();
/// let hours = NormalHours { start: 8, end: 20 };
/// let baseline = Baseline::build(&[], start, 56, &patterns, hours);
/// assert_eq!(baseline.bucket_samples, 0);
/// ```
#[derive(Debug, Clone)]
pub struct Baseline {
    distributions: BTreeMap<&'static str, BaselineDistribution>,
    /// Number of prior daily buckets containing at least one commit; the
    /// baseline half of the confidence estimate.
    pub bucket_samples: usize,
}

impl Baseline {
    /// Build the baseline for a window starting at `window_start`.
    ///
    /// `commits` must be sorted by timestamp ascending and may span any
    /// range; only those inside `[window_start - baseline_days,
    /// window_start)` are used.
    pub fn build(
        commits: &[CommitRecord],
        window_start: DateTime<Utc>,
        baseline_days: u32,
        patterns: &KeywordPatterns,
        hours: NormalHours,
    ) -> Self {
        let since = window_start - Duration::days(i64::from(baseline_days));
        let buckets = partition_daily(since, window_start);

        let mut values: BTreeMap<&'static str, Vec<f64>> = BTreeMap::new();
        let mut bucket_samples = 0usize;

        for bucket in &buckets {
            let lo = commits.partition_point(|c| c.timestamp < bucket.start);
            let hi = commits.partition_point(|c| c.timestamp < bucket.end);
            let slice = &commits[lo..hi];
            if slice.is_empty() {
                continue;
            }
            bucket_samples += 1;
            for (name, value) in signals::extract(slice, patterns, hours) {
                values.entry(name).or_default().push(value);
            }
        }

        let distributions = values
            .into_iter()
            .map(|(name, samples)| {
                (
                    name,
                    BaselineDistribution {
                        signal: name.to_string(),
                        mean: signals::mean(&samples),
                        stddev: signals::pop_stddev(&samples),
                        samples: samples.len(),
                    },
                )
            })
            .collect();

        Self {
            distributions,
            bucket_samples,
        }
    }

    /// Look up the distribution for one signal, if any bucket produced it.
    pub fn distribution(&self, name: &str) -> Option<&BaselineDistribution> {
        self.distributions.get(name)
    }

    /// Normalize a raw value into a z-score.
    ///
    /// Uses the real distribution when it has at least
    /// [`MIN_BASELINE_SAMPLES`] samples; otherwise falls back to the
    /// signal's prior so the value still contributes to scoring, and flags
    /// the result as insufficient. Degenerate stddev yields z = 0.
    pub fn normalize(&self, name: &str, raw: f64) -> Normalized {
        match self.distribution(name) {
            Some(dist) if dist.samples >= MIN_BASELINE_SAMPLES => {
                let z = if dist.stddev < DEGENERATE_STDDEV {
                    0.0
                } else {
                    (raw - dist.mean) / dist.stddev
                };
                Normalized {
                    z,
                    insufficient: false,
                }
            }
            _ => {
                let (mean, stddev) = prior(name);
                Normalized {
                    z: (raw - mean) / stddev,
                    insufficient: true,
                }
            }
        }
    }
}

/// Fixed prior (mean, stddev) per signal, used when the real baseline is too
/// small. Values describe an unremarkable day in a small active repository.
pub fn prior(name: &str) -> (f64, f64) {
    match name {
        names::COMMIT_COUNT => (5.0, 4.0),
        names::FIX_RATE => (0.15, 0.15),
        names::REVERT_RATE => (0.02, 0.05),
        names::WIP_RATE => (0.05, 0.10),
        names::CHURN => (200.0, 300.0),
        names::FILES_TOUCHED => (5.0, 5.0),
        names::LATE_NIGHT_RATIO => (0.10, 0.15),
        names::SIZE_DISPERSION => (80.0, 120.0),
        names::CADENCE_DISPERSION => (3.0, 3.0),
        // Unknown signals stay neutral.
        _ => (0.0, 1.0),
    }
}
