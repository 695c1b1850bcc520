//! Half-open UTC time intervals.
//!
//! A [`TimeSlot`] is the unit every scheduling computation works on. It can
//! only be built with `start < end`, so empty or inverted intervals never
//! reach the layout code.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSlot")]
pub struct TimeSlot {
    #[serde(rename = "start_time")]
    start: DateTime<Utc>,
    #[serde(rename = "end_time")]
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawSlot {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl TryFrom<RawSlot> for TimeSlot {
    type Error = Error;

    fn try_from(raw: RawSlot) -> Result<Self> {
        Self::new(raw.start_time, raw.end_time)
    }
}

impl TimeSlot {
    /// Create a slot, rejecting `end <= start`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimeRange`] if the interval is empty or inverted.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(Error::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a slot whose bounds are already known to be ordered.
    pub(crate) fn from_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end, "TimeSlot start must be before end");
        Self { start, end }
    }

    /// Start instant (inclusive).
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End instant (exclusive).
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the slot.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Two slots overlap if they share any instant. Touching slots do not.
    #[must_use]
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `t` falls inside the slot.
    #[must_use]
    pub fn contains_instant(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Returns true if `self` fully contains `other`.
    #[must_use]
    pub fn contains(&self, other: &TimeSlot) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The part of `self` that lies inside `window`, if any.
    #[must_use]
    pub fn clip_to(&self, window: &TimeSlot) -> Option<TimeSlot> {
        let start = self.start.max(window.start);
        let end = self.end.min(window.end);
        (start < end).then(|| Self::from_ordered(start, end))
    }

    /// The slot covering one whole calendar day in the given local offset.
    #[must_use]
    pub fn local_day(date: NaiveDate, offset: FixedOffset) -> Self {
        let start = local_to_utc(date.and_time(NaiveTime::MIN), offset);
        Self::from_ordered(start, start + Duration::days(1))
    }

    /// The slot covering `from..=to` whole local days.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimeRange`] if `to` is before `from`.
    pub fn local_days(from: NaiveDate, to: NaiveDate, offset: FixedOffset) -> Result<Self> {
        let start = Self::local_day(from, offset).start;
        let end = Self::local_day(to, offset).end;
        Self::new(start, end)
    }

    /// One local clock hour on a given day.
    #[must_use]
    pub fn local_hour(date: NaiveDate, hour: u32, offset: FixedOffset) -> Self {
        let day = Self::local_day(date, offset);
        let start = day.start + Duration::hours(i64::from(hour));
        Self::from_ordered(start, start + Duration::hours(1))
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Interpret a wall-clock time in a fixed offset as a UTC instant.
#[must_use]
pub fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    let shifted = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(shifted, Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn slot(h1: u32, h2: u32) -> TimeSlot {
        TimeSlot::new(at(h1, 0), at(h2, 0)).unwrap()
    }

    fn helsinki() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    #[test]
    fn test_new_rejects_empty() {
        let err = TimeSlot::new(at(10, 0), at(10, 0)).unwrap_err();
        assert!(matches!(err, Error::InvalidTimeRange { .. }));
    }

    #[test]
    fn test_new_rejects_inverted() {
        assert!(TimeSlot::new(at(10, 0), at(9, 0)).is_err());
    }

    #[test]
    fn test_duration() {
        assert_eq!(slot(8, 10).duration(), Duration::hours(2));
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = slot(8, 10);
        let b = slot(9, 11);
        let c = slot(10, 12);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // touching
        assert!(a.contains_instant(at(8, 0)));
        assert!(!a.contains_instant(at(10, 0)));
    }

    #[test]
    fn test_contains() {
        let outer = slot(8, 12);
        assert!(outer.contains(&slot(9, 10)));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&slot(7, 9)));
    }

    #[test]
    fn test_clip_to() {
        let window = slot(8, 12);
        assert_eq!(slot(6, 9).clip_to(&window), Some(slot(8, 9)));
        assert_eq!(slot(11, 14).clip_to(&window), Some(slot(11, 12)));
        assert_eq!(slot(12, 14).clip_to(&window), None);
    }

    #[test]
    fn test_local_day_window() {
        let day = TimeSlot::local_day(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), helsinki());
        assert_eq!(day.start(), Utc.with_ymd_and_hms(2025, 6, 1, 21, 0, 0).unwrap());
        assert_eq!(day.duration(), Duration::days(1));
    }

    #[test]
    fn test_local_days_rejects_inverted_range() {
        let from = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(TimeSlot::local_days(from, to, helsinki()).is_err());
        let week = TimeSlot::local_days(to, from, helsinki()).unwrap();
        assert_eq!(week.duration(), Duration::days(3));
    }

    #[test]
    fn test_local_hour() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let hour = TimeSlot::local_hour(date, 8, helsinki());
        assert_eq!(hour.start(), at(5, 0));
        assert_eq!(hour.end(), at(6, 0));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_value(slot(8, 9)).unwrap();
        assert!(json.get("start_time").is_some());
        assert!(json.get("end_time").is_some());
    }

    #[test]
    fn test_deserialize_rejects_inverted() {
        let json = r#"{"start_time":"2025-06-01T10:00:00Z","end_time":"2025-06-01T09:00:00Z"}"#;
        assert!(serde_json::from_str::<TimeSlot>(json).is_err());
    }
}
