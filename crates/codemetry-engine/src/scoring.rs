//! Window scoring: normalization, weighted aggregation, ranked reasons.
//!
//! Each present signal is normalized against its baseline, weighted by a
//! fixed direction/weight table, and summed. The sum is squashed through a
//! logistic curve centered at 50 so extreme weeks saturate smoothly instead
//! of clipping. A window with no signals scores a neutral 50.

use std::collections::BTreeMap;

use codemetry_core::{Reason, Signal};

use crate::baseline::Baseline;
use crate::signals::names;

/// Fixed direction and weight for one signal.
#[derive(Debug, Clone, Copy)]
pub struct SignalSpec {
    /// Signal name.
    pub name: &'static str,
    /// Aggregation weight.
    pub weight: f64,
    /// `+1.0` when high values lift the mood, `-1.0` when they drain it.
    pub direction: f64,
}

/// The scoring table. Everything except commit volume is adverse when
/// elevated; volume above baseline reads as healthy activity.
pub const SIGNAL_SPECS: &[SignalSpec] = &[
    SignalSpec {
        name: names::COMMIT_COUNT,
        weight: 3.0,
        direction: 1.0,
    },
    SignalSpec {
        name: names::FIX_RATE,
        weight: 12.0,
        direction: -1.0,
    },
    SignalSpec {
        name: names::REVERT_RATE,
        weight: 10.0,
        direction: -1.0,
    },
    SignalSpec {
        name: names::WIP_RATE,
        weight: 6.0,
        direction: -1.0,
    },
    SignalSpec {
        name: names::CHURN,
        weight: 5.0,
        direction: -1.0,
    },
    SignalSpec {
        name: names::FILES_TOUCHED,
        weight: 3.0,
        direction: -1.0,
    },
    SignalSpec {
        name: names::LATE_NIGHT_RATIO,
        weight: 8.0,
        direction: -1.0,
    },
    SignalSpec {
        name: names::SIZE_DISPERSION,
        weight: 4.0,
        direction: -1.0,
    },
    SignalSpec {
        name: names::CADENCE_DISPERSION,
        weight: 4.0,
        direction: -1.0,
    },
];

/// z-scores are clamped to this magnitude before weighting so one wild
/// signal cannot dominate the sum.
pub const Z_CLAMP: f64 = 3.0;

/// Weight per distinct regretted file from the follow-up horizon.
pub const FOLLOW_UP_WEIGHT: f64 = 4.0;

/// Cap on the total follow-up contribution magnitude.
pub const FOLLOW_UP_CAP: f64 = 20.0;

/// A scored window before labeling and confidence.
#[derive(Debug, Clone)]
pub struct WindowScore {
    /// Squashed mood score in `[0, 100]`.
    pub mood_score: f64,
    /// Raw sum of contributions before squashing.
    pub total_contribution: f64,
    /// All present signals with their normalization.
    pub signals: Vec<Signal>,
    /// Contributors sorted by `abs(contribution)` descending.
    pub reasons: Vec<Reason>,
    /// Whether any scored signal fell back to its prior distribution.
    pub insufficient_baseline: bool,
}

/// Look up the weight/direction entry for a signal name.
pub fn spec_for(name: &str) -> Option<&'static SignalSpec> {
    SIGNAL_SPECS.iter().find(|s| s.name == name)
}

/// Score one window's raw signals against its baseline.
///
/// Absent signals simply do not contribute; an empty map yields the neutral
/// score of 50 with no reasons. Every present signal with a nonzero
/// contribution gets a reason entry, however small; truncation is the
/// caller's business.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use chrono::{TimeZone, Utc};
/// use codemetry_core::{KeywordConfig, NormalHours};
/// use codemetry_engine::baseline::Baseline;
/// use codemetry_engine::scoring::score_window;
///
/// let patterns = KeywordConfig::default().compile().unwrap();
/// let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
/// let baseline = Baseline::build(&[], start, 14, &patterns, NormalHours { start: 8, end: 20 });
/// let score = score_window(&BTreeMap::new(), &baseline);
/// assert_eq!(score.mood_score, 50.0);
/// assert!(score.reasons.is_empty());
/// ```
pub fn score_window(raw: &BTreeMap<&'static str, f64>, baseline: &Baseline) -> WindowScore {
    let mut signals = Vec::new();
    let mut reasons = Vec::new();
    let mut total = 0.0;
    let mut insufficient = false;

    for (&name, &value) in raw {
        let Some(spec) = spec_for(name) else {
            continue;
        };
        let normalized = baseline.normalize(name, value);
        insufficient |= normalized.insufficient;

        let z = normalized.z.clamp(-Z_CLAMP, Z_CLAMP);
        let contribution = spec.direction * spec.weight * z;
        total += contribution;

        signals.push(Signal {
            name: name.to_string(),
            raw: value,
            z: Some(z),
            weight: spec.weight,
            direction: spec.direction,
        });

        if contribution != 0.0 {
            reasons.push(Reason {
                summary: summarize(name, z),
                signal: name.to_string(),
                contribution,
            });
        }
    }

    sort_reasons(&mut reasons);

    WindowScore {
        mood_score: squash(50.0 + total),
        total_contribution: total,
        signals,
        reasons,
        insufficient_baseline: insufficient,
    }
}

/// Fold the follow-up horizon's regret count back into an already scored
/// window.
///
/// Adds an adverse pseudo-signal and a reason, then re-squashes the score.
/// A zero regret count changes nothing.
pub fn apply_follow_up(score: &mut WindowScore, regret_count: usize, horizon_days: u32) {
    if regret_count == 0 {
        return;
    }

    let contribution = -(FOLLOW_UP_WEIGHT * regret_count as f64).min(FOLLOW_UP_CAP);

    score.signals.push(Signal {
        name: names::FOLLOW_UP_FIXES.to_string(),
        raw: regret_count as f64,
        z: None,
        weight: FOLLOW_UP_WEIGHT,
        direction: -1.0,
    });

    let noun = if regret_count == 1 { "fix" } else { "fixes" };
    score.reasons.push(Reason {
        summary: format!("{regret_count} follow-up {noun} within {horizon_days} days"),
        signal: names::FOLLOW_UP_FIXES.to_string(),
        contribution,
    });
    sort_reasons(&mut score.reasons);

    score.total_contribution += contribution;
    score.mood_score = squash(50.0 + score.total_contribution);
}

fn sort_reasons(reasons: &mut [Reason]) {
    reasons.sort_by(|a, b| {
        b.contribution
            .abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Logistic squash: midpoint 50, scale 20, bounded in (0, 100).
fn squash(v: f64) -> f64 {
    100.0 / (1.0 + (-(v - 50.0) / 20.0).exp())
}

/// Template a reason summary from the signal name and its deviation.
fn summarize(name: &str, z: f64) -> String {
    let descriptor = match name {
        names::COMMIT_COUNT => "commit volume",
        names::FIX_RATE => "fix-commit rate",
        names::REVERT_RATE => "revert rate",
        names::WIP_RATE => "work-in-progress rate",
        names::CHURN => "code churn",
        names::FILES_TOUCHED => "breadth of files touched",
        names::LATE_NIGHT_RATIO => "late-night commit ratio",
        names::SIZE_DISPERSION => "commit size spread",
        names::CADENCE_DISPERSION => "commit cadence jitter",
        other => other,
    };
    let magnitude = if z.abs() >= 2.0 {
        "sharply"
    } else if z.abs() >= 1.0 {
        "notably"
    } else {
        "slightly"
    };
    let tendency = if z >= 0.0 { "elevated" } else { "reduced" };
    format!("{magnitude} {tendency} {descriptor}")
}
