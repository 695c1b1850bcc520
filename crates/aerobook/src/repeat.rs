//! Daily repeat series.

use chrono::{Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timeslot::{local_to_utc, TimeSlot};

/// Which rows a delete touches when the target belongs to a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteScope {
    /// Only the selected booking.
    #[default]
    Single,
    /// The selected booking and every later booking of its series.
    ThisAndFollowing,
}

/// Expand a template slot into one occurrence per local day.
///
/// The first occurrence is the template itself. Each following day repeats
/// its local clock start time and duration, up to and including `until`.
///
/// # Errors
///
/// Returns [`Error::InvalidField`] if `until` is before the template's local
/// start date, or the series would exceed `max_days` occurrences.
pub fn expand_daily(
    template: &TimeSlot,
    until: NaiveDate,
    offset: FixedOffset,
    max_days: u32,
) -> Result<Vec<TimeSlot>> {
    let local_start = template.start().with_timezone(&offset).naive_local();
    let first_day = local_start.date();
    if until < first_day {
        return Err(Error::invalid_field(
            "repeat_until",
            format!("must not be before {first_day}"),
        ));
    }

    let days = (until - first_day).num_days() + 1;
    if days > i64::from(max_days) {
        return Err(Error::invalid_field(
            "repeat_until",
            format!("series may span at most {max_days} days"),
        ));
    }

    let length = template.duration();
    let slots = (0..days)
        .map(|n| {
            let start = local_to_utc(local_start + Duration::days(n), offset);
            TimeSlot::from_ordered(start, start + length)
        })
        .collect();
    Ok(slots)
}
