//! Rule-based confounder detection.
//!
//! Each rule is an independent pure predicate over the window's facts; the
//! detector evaluates them in a fixed order and concatenates the hits, so
//! output order is stable and no kind ever duplicates.

use codemetry_core::{CommitRecord, Confounder};

use crate::signals;

/// Windows with fewer commits than this are flagged `LOW_VOLUME`.
pub const LOW_VOLUME_THRESHOLD: usize = 3;

/// Everything the rules may inspect about one window.
#[derive(Debug, Clone, Copy)]
pub struct WindowFacts<'a> {
    /// Commits assigned to the window.
    pub commits: &'a [CommitRecord],
    /// Whether any scored signal fell back to its prior distribution.
    pub insufficient_baseline: bool,
}

type Rule = fn(&WindowFacts) -> Option<Confounder>;

const RULES: &[Rule] = &[low_volume, single_author, insufficient_baseline, weekend_only];

/// Evaluate all rules against one window.
///
/// # Examples
///
/// ```
/// use codemetry_core::Confounder;
/// use codemetry_engine::confounders::{detect, WindowFacts};
///
/// let facts = WindowFacts {
///     commits: &[],
///     insufficient_baseline: true,
/// };
/// let found = detect(&facts);
/// assert_eq!(
///     found,
///     vec![Confounder::LowVolume, Confounder::InsufficientBaseline]
/// );
/// ```
pub fn detect(facts: &WindowFacts) -> Vec<Confounder> {
    let mut found = Vec::new();
    for rule in RULES {
        if let Some(confounder) = rule(facts) {
            if !found.contains(&confounder) {
                found.push(confounder);
            }
        }
    }
    found
}

fn low_volume(facts: &WindowFacts) -> Option<Confounder> {
    (facts.commits.len() < LOW_VOLUME_THRESHOLD).then_some(Confounder::LowVolume)
}

fn single_author(facts: &WindowFacts) -> Option<Confounder> {
    let first = facts.commits.first()?;
    facts
        .commits
        .iter()
        .all(|c| c.email == first.email)
        .then_some(Confounder::SingleAuthor)
}

fn insufficient_baseline(facts: &WindowFacts) -> Option<Confounder> {
    facts
        .insufficient_baseline
        .then_some(Confounder::InsufficientBaseline)
}

fn weekend_only(facts: &WindowFacts) -> Option<Confounder> {
    signals::weekend_only(facts.commits).then_some(Confounder::WeekendOnly)
}
