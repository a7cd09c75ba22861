//! Report window and fixed-width interval splitting

use crate::error::WindowError;
use crate::units::HOUR_SECONDS;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Format of every interval and report period boundary
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S +0000 UTC";

/// Interval width for OCP reports
pub fn hourly() -> Duration {
    Duration::seconds(i64::from(HOUR_SECONDS))
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Half-open `[start, end)` range to report on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if end < start {
            return Err(WindowError::EndBeforeStart {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC),
    /// the report timestamp format, or a bare date (midnight UTC).
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        let start = parse_instant("start", start)?;
        let end = parse_instant("end", end)?;
        Self::new(start, end)
    }

    /// Window from optional bounds. A missing end falls one day after the
    /// start, a missing start one day before the end. With neither bound
    /// the window is the full day before `today`.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, WindowError> {
        let day = Duration::days(1);
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (parse_instant("start", start)?, parse_instant("end", end)?),
            (Some(start), None) => {
                let start = parse_instant("start", start)?;
                (start, start + day)
            }
            (None, Some(end)) => {
                let end = parse_instant("end", end)?;
                (end - day, end)
            }
            (None, None) => {
                let end = Utc.from_utc_datetime(&today.and_time(NaiveTime::MIN));
                (end - day, end)
            }
        };
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Contiguous intervals of `width` covering the window; a trailing
    /// partial interval is dropped.
    pub fn intervals(&self, width: Duration) -> Intervals {
        Intervals {
            next_start: self.start,
            end: self.end,
            width,
        }
    }

    /// `floor((end - start) / width)`
    pub fn interval_count(&self, width: Duration) -> usize {
        let width_secs = width.num_seconds();
        if width_secs <= 0 {
            return 0;
        }
        ((self.end - self.start).num_seconds() / width_secs) as usize
    }
}

fn parse_instant(field: &'static str, value: &str) -> Result<DateTime<Utc>, WindowError> {
    let trimmed = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in [TIMESTAMP_FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    Err(WindowError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// One reporting interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Calendar date used to match per-date usage overrides
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn seconds(&self) -> u32 {
        (self.end - self.start).num_seconds().max(0) as u32
    }

    /// First instant of the interval's calendar month
    pub fn report_period_start(&self) -> DateTime<Utc> {
        month_start(self.start.year(), self.start.month()).unwrap_or(self.start)
    }

    /// First instant of the following month
    pub fn report_period_end(&self) -> DateTime<Utc> {
        let (year, month) = match self.start.month() {
            12 => (self.start.year() + 1, 1),
            m => (self.start.year(), m + 1),
        };
        month_start(year, month).unwrap_or(self.end)
    }
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Iterator over the intervals of a window
#[derive(Debug, Clone)]
pub struct Intervals {
    next_start: DateTime<Utc>,
    end: DateTime<Utc>,
    width: Duration,
}

impl Iterator for Intervals {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        if self.width <= Duration::zero() {
            return None;
        }
        let end = self.next_start + self.width;
        if end > self.end {
            return None;
        }
        let interval = Interval {
            start: self.next_start,
            end,
        };
        self.next_start = end;
        Some(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_timestamp_format_is_fixed() {
        assert_eq!(
            format_timestamp(ts("2024-01-01T05:00:00Z")),
            "2024-01-01 05:00:00 +0000 UTC"
        );
    }

    #[test]
    fn test_parse_accepts_common_forms() {
        let expected = ts("2024-03-02T00:00:00Z");
        for value in [
            "2024-03-02",
            "2024-03-02T00:00:00Z",
            "2024-03-02 00:00:00",
            "2024-03-02 00:00:00 +0000 UTC",
            "2024-03-02T01:00:00+01:00",
        ] {
            let window = ReportWindow::parse(value, "2024-03-03").unwrap();
            assert_eq!(window.start(), expected, "{value}");
        }
    }

    #[test]
    fn test_parse_rejects_garbage_immediately() {
        let err = ReportWindow::parse("yesterday", "also-bad").unwrap_err();
        assert_eq!(
            err,
            WindowError::InvalidDate {
                field: "start",
                value: "yesterday".into()
            }
        );
    }

    #[test]
    fn test_end_before_start_rejected() {
        let err = ReportWindow::parse("2024-01-02", "2024-01-01").unwrap_err();
        assert!(matches!(err, WindowError::EndBeforeStart { .. }));
    }

    #[test]
    fn test_resolve_fills_missing_bounds() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        let both = ReportWindow::resolve(Some("2024-05-01"), Some("2024-05-03"), today).unwrap();
        assert_eq!(both.end(), ts("2024-05-03T00:00:00Z"));

        let start_only = ReportWindow::resolve(Some("2024-05-01T06:00:00Z"), None, today).unwrap();
        assert_eq!(start_only.end(), ts("2024-05-02T06:00:00Z"));

        let end_only = ReportWindow::resolve(None, Some("2024-05-03"), today).unwrap();
        assert_eq!(end_only.start(), ts("2024-05-02T00:00:00Z"));

        let neither = ReportWindow::resolve(None, None, today).unwrap();
        assert_eq!(neither.start(), ts("2024-05-09T00:00:00Z"));
        assert_eq!(neither.end(), ts("2024-05-10T00:00:00Z"));

        let err = ReportWindow::resolve(None, Some("soon"), today).unwrap_err();
        assert!(matches!(err, WindowError::InvalidDate { field: "end", .. }));
    }

    #[test]
    fn test_intervals_are_contiguous_and_cover_window() {
        let window = ReportWindow::parse("2024-01-01T00:00:00Z", "2024-01-02T03:30:00Z").unwrap();
        let intervals: Vec<Interval> = window.intervals(hourly()).collect();

        assert_eq!(intervals.len(), 27);
        assert_eq!(intervals.len(), window.interval_count(hourly()));
        assert_eq!(intervals[0].start, window.start());
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert!(intervals.iter().all(|i| i.seconds() == HOUR_SECONDS));
    }

    #[test]
    fn test_empty_window_has_no_intervals() {
        let window = ReportWindow::parse("2024-01-01", "2024-01-01").unwrap();
        assert_eq!(window.intervals(hourly()).count(), 0);
        assert_eq!(window.interval_count(Duration::zero()), 0);
    }

    #[test]
    fn test_report_period_spans_calendar_month() {
        let interval = Interval {
            start: ts("2023-12-31T23:00:00Z"),
            end: ts("2024-01-01T00:00:00Z"),
        };
        assert_eq!(interval.report_period_start(), ts("2023-12-01T00:00:00Z"));
        assert_eq!(interval.report_period_end(), ts("2024-01-01T00:00:00Z"));
        assert_eq!(interval.date(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }
}
