use std::{cell::Cell, fmt::Display, rc::Rc};

use chrono::{Duration as ChronoDuration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

pub const DAY_MS: i64 = 86_400_000;

pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

// Clones share the same instant.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

/// When a DST transition skips midnight the first valid local time after the
/// gap is used; when midnight occurs twice the earlier one wins.
pub fn local_midnight_ms<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.timestamp_millis(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        LocalResult::None => (1..=96)
            .map(|quarter| midnight + ChronoDuration::minutes(15 * quarter))
            .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
            .map(|dt| dt.timestamp_millis())
            .unwrap_or_else(|| midnight.and_utc().timestamp_millis()),
    }
}

pub fn day_window<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (i64, i64) {
    let start = local_midnight_ms(date, tz);
    (start, start + DAY_MS - 1)
}

pub fn date_of<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> NaiveDate {
    match tz.timestamp_millis_opt(timestamp_ms) {
        LocalResult::Single(dt) => dt.date_naive(),
        LocalResult::Ambiguous(dt, _) => dt.date_naive(),
        LocalResult::None => NaiveDate::default(),
    }
}

pub fn format_timestamp<Tz>(timestamp_ms: i64, tz: &Tz, format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match tz.timestamp_millis_opt(timestamp_ms) {
        LocalResult::Single(dt) => dt.format(format).to_string(),
        LocalResult::Ambiguous(dt, _) => dt.format(format).to_string(),
        LocalResult::None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCursor {
    date: NaiveDate,
}

impl DayCursor {
    pub fn new(today: NaiveDate) -> Self {
        Self { date: today }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_today(&self, today: NaiveDate) -> bool {
        self.date >= today
    }

    pub fn prev(&mut self) -> NaiveDate {
        if let Some(date) = self.date.pred_opt() {
            self.date = date;
        }
        self.date
    }

    pub fn next(&mut self, today: NaiveDate) -> bool {
        if self.is_today(today) {
            return false;
        }
        match self.date.succ_opt() {
            Some(date) => {
                self.date = date;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self, today: NaiveDate) {
        self.date = today;
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    #[test]
    fn test_day_window_in_fixed_offset() {
        let date = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let (start, end) = day_window(date, &jst());

        let expected_start = Utc
            .with_ymd_and_hms(2026, 3, 31, 15, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(start, expected_start);
        assert_eq!(end - start, 86_399_999);
    }

    #[test]
    fn test_format_timestamp_uses_zone() {
        let ts = Utc
            .with_ymd_and_hms(2026, 3, 31, 15, 5, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(format_timestamp(ts, &jst(), "%Y/%m/%d %H:%M"), "2026/04/01 00:05");
        assert_eq!(format_timestamp(ts, &Utc, "%Y/%m/%d %H:%M"), "2026/03/31 15:05");
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let shared = clock.clone();
        clock.advance(500);
        assert_eq!(shared.now_ms(), 1_500);
        shared.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn test_day_cursor_never_passes_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut cursor = DayCursor::new(today);

        assert!(!cursor.next(today));
        assert_eq!(cursor.date(), today);

        cursor.prev();
        cursor.prev();
        assert_eq!(cursor.date(), NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
        assert!(!cursor.is_today(today));

        assert!(cursor.next(today));
        assert!(cursor.next(today));
        assert!(!cursor.next(today));
        assert!(cursor.is_today(today));
    }
}
