//! Daily window partitioning.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use codemetry_core::AnalysisWindow;

/// Partition `[since, until)` into contiguous daily UTC buckets.
///
/// The first bucket starts at midnight of `since`'s day so windows always
/// align to calendar days; a bucket is emitted for every day whose start
/// falls before `until`. Labels are `YYYY-MM-DD`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use codemetry_engine::windows::partition_daily;
///
/// let since = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
/// let until = Utc.with_ymd_and_hms(2024, 1, 17, 0, 0, 0).unwrap();
/// let windows = partition_daily(since, until);
/// assert_eq!(windows.len(), 2);
/// assert_eq!(windows[0].label, "2024-01-15");
/// assert_eq!(windows[0].end, windows[1].start);
/// ```
pub fn partition_daily(since: DateTime<Utc>, until: DateTime<Utc>) -> Vec<AnalysisWindow> {
    let mut windows = Vec::new();
    let mut day = since.date_naive();

    loop {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        if start >= until {
            break;
        }
        windows.push(AnalysisWindow {
            label: day.format("%Y-%m-%d").to_string(),
            start,
            end: start + Duration::days(1),
        });
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn windows_are_contiguous_and_non_overlapping() {
        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let windows = partition_daily(since, until);
        assert_eq!(windows.len(), 7);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn mid_day_since_floors_to_day_start() {
        let since = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap();
        let windows = partition_daily(since, until);
        assert_eq!(windows.len(), 1);
        assert_eq!(
            windows[0].start,
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn mid_day_until_still_covers_its_day() {
        let since = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap();
        let windows = partition_daily(since, until);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].label, "2024-01-16");
    }

    #[test]
    fn empty_range_gives_no_windows() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert!(partition_daily(at, at).is_empty());
    }
}
