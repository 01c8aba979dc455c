//! Confidence estimation from sample sufficiency.

/// Window commit count at which the window factor reaches ~0.86.
pub const TARGET_WINDOW_COMMITS: f64 = 5.0;

/// Baseline bucket count at which the baseline factor reaches ~0.86.
pub const TARGET_BASELINE_BUCKETS: f64 = 14.0;

/// Estimate confidence in `[0, 1]` for one window.
///
/// Both factors are `1 - exp(-2n/target)`: monotonically increasing,
/// saturating, and exactly 0 at n = 0, so zero commits in either the window
/// or the baseline yields confidence 0 rather than an error.
///
/// # Examples
///
/// ```
/// use codemetry_engine::confidence::estimate;
///
/// assert_eq!(estimate(0, 14), 0.0);
/// assert_eq!(estimate(5, 0), 0.0);
/// assert!(estimate(5, 14) > estimate(1, 14));
/// assert!(estimate(100, 100) <= 1.0);
/// ```
pub fn estimate(window_commits: usize, baseline_buckets: usize) -> f64 {
    let confidence = saturating(window_commits as f64, TARGET_WINDOW_COMMITS)
        * saturating(baseline_buckets as f64, TARGET_BASELINE_BUCKETS);
    confidence.clamp(0.0, 1.0)
}

fn saturating(n: f64, target: f64) -> f64 {
    1.0 - (-2.0 * n / target).exp()
}
