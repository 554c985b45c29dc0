//! Reference-timezone day boundaries
//!
//! Every "daily" figure is grouped by the calendar date in one fixed UTC
//! offset (UTC+9 unless configured otherwise).

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};

/// Default reference offset in hours (KST).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// Maps instants to reference-timezone days and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClock {
    offset: FixedOffset,
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl ReferenceClock {
    /// Clock for a whole-hour offset east of UTC. `None` outside ±23 hours.
    pub fn from_offset_hours(hours: i32) -> Option<Self> {
        if !(-23..=23).contains(&hours) {
            return None;
        }
        FixedOffset::east_opt(hours * 3600).map(|offset| Self { offset })
    }

    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar date of `ts` in the reference timezone.
    ///
    /// `None` when the local reading falls outside chrono's date range.
    pub fn day_of(&self, ts: DateTime<Utc>) -> Option<NaiveDate> {
        ts.naive_utc()
            .checked_add_signed(self.offset_duration())
            .map(|local| local.date())
    }

    /// Instant at which `date` begins in the reference timezone.
    pub fn day_start(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.localize(date.and_time(NaiveTime::MIN))
    }

    /// Half-open UTC interval `[start, end)` covering `date`.
    pub fn day_bounds(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.day_start(date)?;
        let end = start.checked_add_signed(Duration::days(1))?;
        Some((start, end))
    }

    /// Today's date in the reference timezone.
    pub fn today(&self) -> NaiveDate {
        let now = Utc::now();
        self.day_of(now).unwrap_or_else(|| now.date_naive())
    }

    /// Interpret a wall-clock reading as reference-timezone local time.
    pub fn localize(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        local
            .checked_sub_signed(self.offset_duration())
            .map(|utc| Utc.from_utc_datetime(&utc))
    }

    fn offset_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.offset.local_minus_utc()))
    }

    /// Render `ts` as reference-timezone wall-clock text.
    pub fn format(&self, ts: DateTime<Utc>, fmt: &str) -> String {
        ts.with_timezone(&self.offset).format(fmt).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_is_utc_plus_nine() {
        let clock = ReferenceClock::default();
        assert_eq!(clock.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_day_of_crosses_utc_midnight() {
        let clock = ReferenceClock::default();
        // 16:00 UTC on May 1 is 01:00 on May 2 in UTC+9
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap();
        assert_eq!(clock.day_of(ts), Some(date(2024, 5, 2)));

        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 14, 59, 59).unwrap();
        assert_eq!(clock.day_of(ts), Some(date(2024, 5, 1)));
    }

    #[test]
    fn test_day_bounds() {
        let clock = ReferenceClock::default();
        let (start, end) = clock.day_bounds(date(2024, 5, 2)).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 5, 2, 15, 0, 0).unwrap());
        assert_eq!(clock.day_of(start), Some(date(2024, 5, 2)));
        assert_eq!(clock.day_of(end - Duration::seconds(1)), Some(date(2024, 5, 2)));
        assert_eq!(clock.day_of(end), Some(date(2024, 5, 3)));
    }

    #[test]
    fn test_negative_offset() {
        let clock = ReferenceClock::from_offset_hours(-5).unwrap();
        let (start, _) = clock.day_bounds(date(2024, 1, 1)).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_offset_range_checked() {
        assert!(ReferenceClock::from_offset_hours(24).is_none());
        assert!(ReferenceClock::from_offset_hours(-24).is_none());
        assert!(ReferenceClock::from_offset_hours(0).is_some());
    }

    #[test]
    fn test_extreme_dates_do_not_overflow() {
        let clock = ReferenceClock::default();
        assert!(clock.day_start(NaiveDate::MIN).is_none());
        assert!(clock.day_bounds(NaiveDate::MIN).is_none());
        assert!(clock.localize(NaiveDate::MIN.and_time(NaiveTime::MIN)).is_none());

        let west = ReferenceClock::from_offset_hours(-5).unwrap();
        assert!(west.day_bounds(NaiveDate::MAX).is_none());
        assert!(west.day_of(DateTime::<Utc>::MIN_UTC).is_none());
        assert_eq!(clock.day_of(DateTime::<Utc>::MIN_UTC), Some(NaiveDate::MIN));
    }

    #[test]
    fn test_format_uses_reference_time() {
        let clock = ReferenceClock::default();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 16, 30, 0).unwrap();
        assert_eq!(clock.format(ts, "%Y-%m-%d %H:%M:%S"), "2024-05-02 01:30:00");
    }
}
