//! Date and urgency utilities.
//!
//! Every categorization in the email engine derives from the single
//! [`days_until_due`] truncation rule, so an item can never appear both
//! overdue and due-soon.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, Utc, Weekday};

/// Whole calendar days from `today` to `due`, both truncated to midnight.
///
/// Negative means overdue, 0 means due today. `None` when there is no
/// due date.
pub fn days_until_due(due: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    due.map(|d| (d - today).num_days())
}

/// True iff the due date is defined and strictly in the past.
pub fn is_overdue(due: Option<NaiveDate>, today: NaiveDate) -> bool {
    matches!(days_until_due(due, today), Some(d) if d < 0)
}

/// True iff the due date is defined and falls within `[today, today + window_days]`.
pub fn is_due_soon(due: Option<NaiveDate>, today: NaiveDate, window_days: i64) -> bool {
    matches!(days_until_due(due, today), Some(d) if d >= 0 && d <= window_days)
}

/// Truncate a UTC instant to its local calendar date.
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Date-range selector for composed emails. Weeks start on Sunday.
/// Unrecognized selectors resolve to `AllTime`, which disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    AllTime,
}

impl DateRange {
    pub fn parse(value: &str) -> Self {
        match value {
            "today" => DateRange::Today,
            "yesterday" => DateRange::Yesterday,
            "this-week" => DateRange::ThisWeek,
            "last-week" => DateRange::LastWeek,
            _ => DateRange::AllTime,
        }
    }

    /// Half-open `[start, end)` bounds in local time, or `None` for `AllTime`.
    pub fn bounds(&self, now: DateTime<Local>) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let today = now.date_naive();
        let (start, days) = match self {
            DateRange::Today => (today, 1),
            DateRange::Yesterday => (today - Duration::days(1), 1),
            DateRange::ThisWeek => (today.week(Weekday::Sun).first_day(), 7),
            DateRange::LastWeek => (
                today.week(Weekday::Sun).first_day() - Duration::days(7),
                7,
            ),
            DateRange::AllTime => return None,
        };
        let start = start.and_hms_opt(0, 0, 0)?;
        Some((start, start + Duration::days(days)))
    }

    /// True when `instant` falls inside the range (always true for `AllTime`).
    pub fn contains(&self, instant: DateTime<Utc>, now: DateTime<Local>) -> bool {
        match self.bounds(now) {
            None => true,
            Some((start, end)) => {
                let local = instant.with_timezone(&Local).naive_local();
                local >= start && local < end
            }
        }
    }
}

/// "Friday, August 29, 2025", used in email opening lines.
pub fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{}, {} {}, {}",
        date.format("%A"),
        date.format("%B"),
        date.day(),
        date.year()
    )
}

/// "8/29/2025", used in subject lines.
pub fn format_short_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// "today" / "tomorrow" / "in N days" phrasing for due-soon lines.
pub fn due_text(days_until: i64) -> String {
    match days_until {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {} days", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_until_due_sign() {
        let today = date(2025, 8, 29);
        assert_eq!(days_until_due(Some(date(2025, 8, 28)), today), Some(-1));
        assert_eq!(days_until_due(Some(date(2025, 8, 29)), today), Some(0));
        assert_eq!(days_until_due(Some(date(2025, 9, 1)), today), Some(3));
        assert_eq!(days_until_due(None, today), None);
    }

    #[test]
    fn test_overdue_and_due_soon_mutually_exclusive() {
        let today = date(2025, 8, 29);
        // Sweep a month of due dates against several windows.
        for offset in -15..15i64 {
            let due = Some(today + Duration::days(offset));
            for window in [0, 1, 7, 30] {
                assert!(
                    !(is_overdue(due, today) && is_due_soon(due, today, window)),
                    "due offset {} window {} classified both ways",
                    offset,
                    window
                );
            }
        }
    }

    #[test]
    fn test_time_of_day_does_not_change_truncation() {
        // Same calendar day, different clock times, identical result.
        let morning = Local.with_ymd_and_hms(2025, 8, 29, 0, 1, 0).unwrap();
        let evening = Local.with_ymd_and_hms(2025, 8, 29, 23, 59, 0).unwrap();
        let due = Some(date(2025, 8, 30));
        assert_eq!(
            days_until_due(due, morning.date_naive()),
            days_until_due(due, evening.date_naive())
        );
        assert_eq!(days_until_due(due, morning.date_naive()), Some(1));
    }

    #[test]
    fn test_same_day_is_due_soon_not_overdue() {
        let today = date(2025, 8, 29);
        let due = Some(today);
        assert!(!is_overdue(due, today));
        assert!(is_due_soon(due, today, 0));
        assert!(is_due_soon(due, today, 7));
    }

    #[test]
    fn test_date_range_parse() {
        assert_eq!(DateRange::parse("today"), DateRange::Today);
        assert_eq!(DateRange::parse("this-week"), DateRange::ThisWeek);
        assert_eq!(DateRange::parse("last-week"), DateRange::LastWeek);
        // Unrecognized selectors disable filtering entirely.
        assert_eq!(DateRange::parse("fortnight"), DateRange::AllTime);
        assert_eq!(DateRange::parse(""), DateRange::AllTime);
    }

    #[test]
    fn test_week_ranges_start_sunday() {
        // 2025-08-29 is a Friday; the week began Sunday 2025-08-24.
        let now = Local.with_ymd_and_hms(2025, 8, 29, 12, 0, 0).unwrap();
        let (start, end) = DateRange::ThisWeek.bounds(now).unwrap();
        assert_eq!(start.date(), date(2025, 8, 24));
        assert_eq!(end.date(), date(2025, 8, 31));

        let (last_start, last_end) = DateRange::LastWeek.bounds(now).unwrap();
        assert_eq!(last_start.date(), date(2025, 8, 17));
        assert_eq!(last_end.date(), start.date());
        assert_eq!(last_end - last_start, Duration::days(7));
    }

    #[test]
    fn test_all_time_contains_everything() {
        let now = Local.with_ymd_and_hms(2025, 8, 29, 12, 0, 0).unwrap();
        let ancient = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        assert!(DateRange::AllTime.contains(ancient, now));
        assert!(!DateRange::Today.contains(ancient, now));
    }

    #[test]
    fn test_due_text() {
        assert_eq!(due_text(0), "today");
        assert_eq!(due_text(1), "tomorrow");
        assert_eq!(due_text(3), "in 3 days");
    }

    #[test]
    fn test_format_dates() {
        assert_eq!(format_long_date(date(2025, 8, 29)), "Friday, August 29, 2025");
        assert_eq!(format_short_date(date(2025, 8, 29)), "8/29/2025");
    }
}
