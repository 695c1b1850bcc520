//! Calendar layout.
//!
//! Packs one aircraft's bookings into display columns, finds the gaps
//! between them and answers the per-hour questions the calendar grid asks.
//! Everything here is pure; the inputs are bookings already fetched from
//! storage.

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use crate::model::Booking;
use crate::timeslot::TimeSlot;

/// Anything that occupies a time slot.
pub trait HasSlot {
    /// The occupied interval.
    fn slot(&self) -> &TimeSlot;
}

impl HasSlot for TimeSlot {
    fn slot(&self) -> &TimeSlot {
        self
    }
}

impl HasSlot for Booking {
    fn slot(&self) -> &TimeSlot {
        &self.slot
    }
}

impl<T: HasSlot> HasSlot for &T {
    fn slot(&self) -> &TimeSlot {
        (**self).slot()
    }
}

/// Column index for every input item, plus the number of columns used.
///
/// Items are visited in `(start, end)` order; ties keep input order. Each
/// item goes into the first column whose last item ends at or before its
/// start, otherwise a new column is opened.
fn assign_columns<T: HasSlot>(items: &[T]) -> (Vec<usize>, usize) {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&i| {
        let s = items[i].slot();
        (s.start(), s.end())
    });

    let mut column_ends = Vec::new();
    let mut columns = vec![0; items.len()];
    for i in order {
        let slot = items[i].slot();
        match column_ends.iter().position(|end| *end <= slot.start()) {
            Some(c) => {
                column_ends[c] = slot.end();
                columns[i] = c;
            }
            None => {
                columns[i] = column_ends.len();
                column_ends.push(slot.end());
            }
        }
    }
    (columns, column_ends.len())
}

/// Partition items into the fewest columns with no overlap inside a column.
///
/// Within each column items are in start order.
#[must_use]
pub fn arrange_columns<T: HasSlot>(items: &[T]) -> Vec<Vec<&T>> {
    let (assigned, count) = assign_columns(items);
    let mut columns: Vec<Vec<&T>> = vec![Vec::new(); count];
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&i| {
        let s = items[i].slot();
        (s.start(), s.end())
    });
    for i in order {
        columns[assigned[i]].push(&items[i]);
    }
    columns
}

/// Peak number of simultaneously active items.
///
/// An item ending at `t` and one starting at `t` are never counted together.
#[must_use]
pub fn max_concurrency<T: HasSlot>(items: &[T]) -> usize {
    let mut events: Vec<(chrono::DateTime<chrono::Utc>, i8)> = Vec::with_capacity(items.len() * 2);
    for item in items {
        events.push((item.slot().start(), 1));
        events.push((item.slot().end(), -1));
    }
    // Ends sort before starts at the same instant.
    events.sort();

    let mut active: usize = 0;
    let mut peak = 0;
    for (_, delta) in events {
        if delta > 0 {
            active += 1;
            peak = peak.max(active);
        } else {
            active = active.saturating_sub(1);
        }
    }
    peak
}

/// Merge overlapping or touching slots into disjoint sorted spans.
#[must_use]
pub fn merge_overlapping(slots: &[TimeSlot]) -> Vec<TimeSlot> {
    let mut sorted = slots.to_vec();
    sorted.sort();

    let mut merged: Vec<TimeSlot> = Vec::with_capacity(sorted.len());
    for slot in sorted {
        if let Some(last) = merged.last_mut() {
            if slot.start() <= last.end() {
                if slot.end() > last.end() {
                    *last = TimeSlot::from_ordered(last.start(), slot.end());
                }
                continue;
            }
        }
        merged.push(slot);
    }
    merged
}

/// The parts of `window` not covered by any item.
#[must_use]
pub fn free_slots<T: HasSlot>(window: &TimeSlot, items: &[T]) -> Vec<TimeSlot> {
    let busy: Vec<TimeSlot> = items
        .iter()
        .filter_map(|item| item.slot().clip_to(window))
        .collect();
    let busy = merge_overlapping(&busy);

    let mut free = Vec::new();
    let mut cursor = window.start();
    for span in busy {
        if span.start() > cursor {
            free.push(TimeSlot::from_ordered(cursor, span.start()));
        }
        cursor = cursor.max(span.end());
    }
    if cursor < window.end() {
        free.push(TimeSlot::from_ordered(cursor, window.end()));
    }
    free
}

/// One booking placed on a day grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayEntry {
    /// The stored booking.
    pub booking: Booking,
    /// Display column, starting at 0.
    pub column: usize,
    /// The part of the booking inside this day.
    pub shown: TimeSlot,
    /// The booking started on an earlier day.
    pub continues_before: bool,
    /// The booking ends on a later day.
    pub continues_after: bool,
    /// Flight-type label for the cell.
    pub label: &'static str,
    /// Cell background colour.
    pub color: &'static str,
}

impl HasSlot for DayEntry {
    fn slot(&self) -> &TimeSlot {
        &self.shown
    }
}

/// One aircraft's bookings laid out for a single local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    /// The local calendar day.
    pub date: NaiveDate,
    /// Number of display columns.
    pub columns: usize,
    /// Bookings touching the day, in start order.
    pub entries: Vec<DayEntry>,
}

/// Lay out the bookings that touch `date` in local time.
///
/// Bookings crossing midnight are clipped to the day and flagged so the
/// calendar can draw them as continuing. Entries sharing a slot are ordered
/// by booking id, so the lower id takes the lower column.
#[must_use]
pub fn day_view(date: NaiveDate, offset: FixedOffset, bookings: &[Booking]) -> DayView {
    let window = TimeSlot::local_day(date, offset);

    let mut entries: Vec<DayEntry> = bookings
        .iter()
        .filter_map(|b| {
            b.slot.clip_to(&window).map(|shown| DayEntry {
                booking: b.clone(),
                column: 0,
                shown,
                continues_before: b.slot.start() < window.start(),
                continues_after: b.slot.end() > window.end(),
                label: b.flight_type.label(),
                color: b.flight_type.color(),
            })
        })
        .collect();
    entries.sort_by_key(|e| (e.shown.start(), e.shown.end(), e.booking.id));

    let (assigned, columns) = assign_columns(&entries);
    for (entry, column) in entries.iter_mut().zip(assigned) {
        entry.column = column;
    }

    DayView {
        date,
        columns,
        entries,
    }
}

/// Bookings covering local `hour` on `date`, highest flight-type priority
/// first. Equal priorities keep their input order.
#[must_use]
pub fn visible_in_hour<'a>(
    date: NaiveDate,
    hour: u32,
    offset: FixedOffset,
    bookings: &'a [Booking],
) -> Vec<&'a Booking> {
    let window = TimeSlot::local_hour(date, hour, offset);
    let mut visible: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.slot.overlaps(&window))
        .collect();
    visible.sort_by_key(|b| std::cmp::Reverse(b.flight_type.priority()));
    visible
}

/// Row labels for the calendar grid, `first..=last` as `"7:00"`, `"8:00"`, ...
#[must_use]
pub fn hour_labels(first: u32, last: u32) -> Vec<String> {
    (first..=last).map(|h| format!("{h}:00")).collect()
}

/// One row of the calendar's hour grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourRow {
    /// Local clock hour.
    pub hour: u32,
    /// Row label, e.g. `"7:00"`.
    pub label: String,
    /// Bookings covering the hour, highest priority first.
    pub bookings: Vec<Booking>,
}

/// Hour grid for `first..=last` on one local day.
#[must_use]
pub fn hour_rows(
    date: NaiveDate,
    first: u32,
    last: u32,
    offset: FixedOffset,
    bookings: &[Booking],
) -> Vec<HourRow> {
    (first..=last)
        .zip(hour_labels(first, last))
        .map(|(hour, label)| HourRow {
            hour,
            label,
            bookings: visible_in_hour(date, hour, offset, bookings)
                .into_iter()
                .cloned()
                .collect(),
        })
        .collect()
}

/// Compact owner name for narrow cells: `"Matti Meikäläinen"` becomes
/// `"Matti M."`.
#[must_use]
pub fn short_name(full_name: &str) -> String {
    let mut parts = full_name.split_whitespace();
    match (parts.next(), parts.next().and_then(|s| s.chars().next())) {
        (Some(first), Some(initial)) => format!("{first} {initial}."),
        _ => full_name.trim().to_string(),
    }
}
