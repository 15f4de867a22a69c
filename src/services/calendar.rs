//! Day boundaries in the tracker's reference timezone.
//!
//! Every range query goes through [`Calendar::window`], so all four record
//! kinds agree on what "a day" is: the first instant of the start date up to
//! and including the last instant of the end date.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Quarter-hour steps searched past a DST gap (one day's worth).
const GAP_STEPS: usize = 96;

/// Closed interval `[start, end]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Calendar {
    tz: Tz,
}

impl Calendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now_local(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }

    pub fn current_hour(&self) -> u32 {
        self.now_local().hour()
    }

    /// Calendar day a timestamp falls on, in the reference timezone.
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.tz).date_naive()
    }

    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve(date, NaiveTime::MIN, true)
    }

    /// Last representable instant of `date` (23:59:59.999999 local).
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let end = match date.succ_opt() {
            Some(next) => self.start_of_day(next).checked_sub_signed(Duration::microseconds(1)),
            None => self
                .resolve(date, NaiveTime::MIN, false)
                .checked_add_signed(Duration::days(1) - Duration::microseconds(1)),
        };
        end.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> AppResult<TimeWindow> {
        if start > end {
            return Err(AppError::Validation(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
        Ok(TimeWindow {
            start: self.start_of_day(start),
            end: self.end_of_day(end),
        })
    }

    pub fn day(&self, date: NaiveDate) -> TimeWindow {
        TimeWindow {
            start: self.start_of_day(date),
            end: self.end_of_day(date),
        }
    }

    /// The trailing `days` days ending today, inclusive of today.
    pub fn trailing(&self, days: u32) -> (NaiveDate, NaiveDate) {
        let today = self.today();
        let span = i64::from(days.max(1)) - 1;
        (today - Duration::days(span), today)
    }

    fn resolve(&self, date: NaiveDate, time: NaiveTime, earliest: bool) -> DateTime<Utc> {
        let naive = date.and_time(time);
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(a, b) => {
                let dt = if earliest { a } else { b };
                dt.with_timezone(&Utc)
            }
            // Midnight fell into a DST gap; the day starts at the first valid instant after it.
            LocalResult::None => {
                let mut probe = naive;
                for _ in 0..GAP_STEPS {
                    probe += Duration::minutes(15);
                    if let Some(dt) = self.tz.from_local_datetime(&probe).earliest() {
                        return dt.with_timezone(&Utc);
                    }
                }
                naive.and_utc()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_utc_day_is_closed_interval() {
        let cal = Calendar::new(chrono_tz::UTC);
        let w = cal.day(date(2026, 2, 17));
        assert_eq!(w.start.to_rfc3339(), "2026-02-17T00:00:00+00:00");
        assert_eq!(w.end, w.start + Duration::days(1) - Duration::microseconds(1));
        assert!(w.contains(w.start));
        assert!(w.contains(w.end));
        assert!(!w.contains(w.end + Duration::microseconds(1)));
    }

    #[test]
    fn test_window_in_offset_timezone() {
        let cal = Calendar::new(chrono_tz::America::New_York);
        let w = cal.window(date(2026, 1, 10), date(2026, 1, 11)).unwrap();
        assert_eq!(w.start.to_rfc3339(), "2026-01-10T05:00:00+00:00");
        assert_eq!(w.end.to_rfc3339(), "2026-01-12T04:59:59.999999+00:00");
    }

    #[test]
    fn test_dst_day_is_23_hours() {
        let cal = Calendar::new(chrono_tz::Europe::Berlin);
        let w = cal.day(date(2026, 3, 29));
        assert_eq!(w.end - w.start + Duration::microseconds(1), Duration::hours(23));
    }

    #[test]
    fn test_single_day_window_nested_in_wider_one() {
        let cal = Calendar::new(chrono_tz::UTC);
        let single = cal.window(date(2026, 5, 2), date(2026, 5, 2)).unwrap();
        let wider = cal.window(date(2026, 5, 1), date(2026, 5, 2)).unwrap();
        assert_eq!(single, cal.day(date(2026, 5, 2)));
        assert!(wider.start < single.start);
        assert_eq!(wider.end, single.end);
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let cal = Calendar::new(chrono_tz::UTC);
        let err = cal.window(date(2026, 5, 3), date(2026, 5, 2)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_local_date_uses_reference_timezone() {
        let cal = Calendar::new(chrono_tz::Asia::Tokyo);
        let ts = "2026-04-01T16:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(cal.local_date(ts), date(2026, 4, 2));
    }

    #[test]
    fn test_last_representable_day_does_not_overflow() {
        let cal = Calendar::new(chrono_tz::UTC);
        let w = cal.day(NaiveDate::MAX);
        assert_eq!(
            w.end,
            w.start + (Duration::days(1) - Duration::microseconds(1))
        );
        assert!(w.contains(w.start));
    }

    #[test]
    fn test_trailing_includes_today() {
        let cal = Calendar::new(chrono_tz::UTC);
        let (start, end) = cal.trailing(7);
        assert_eq!(end, cal.today());
        assert_eq!((end - start).num_days(), 6);
        let (start, end) = cal.trailing(0);
        assert_eq!(start, end);
    }
}
