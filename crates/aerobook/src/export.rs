//! iCalendar (RFC 5545) export.
//!
//! Bookings become `VEVENT`s with UTC times. Output uses CRLF line endings
//! and folds content lines longer than 75 octets.

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::CalendarConfig;
use crate::model::Booking;

const PRODID: &str = "-//Savonlinnan Lentokerho//Varauskalenteri//FI";
const TIMEZONE: &str = "Europe/Helsinki";
const MAX_LINE_OCTETS: usize = 75;

fn ical_time(t: DateTime<Utc>) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape TEXT values: backslash, semicolon, comma and newline.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Split a content line into 75-octet pieces without breaking a UTF-8
/// sequence. Continuation pieces start with a space.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut used = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            used = 1;
        }
        out.push(c);
        used += width;
    }
    out
}

fn event_lines(booking: &Booking, calendar: &CalendarConfig, stamp: DateTime<Utc>) -> Vec<String> {
    vec![
        "BEGIN:VEVENT".to_string(),
        format!("UID:booking-{}@{}", booking.id, calendar.uid_domain),
        format!("DTSTAMP:{}", ical_time(stamp)),
        format!("DTSTART:{}", ical_time(booking.slot.start())),
        format!("DTEND:{}", ical_time(booking.slot.end())),
        format!("SUMMARY:{}", escape_text(&booking.title)),
        format!("DESCRIPTION:{}", escape_text(&booking.description)),
        format!("LOCATION:{}", escape_text(booking.aircraft.as_str())),
        format!("CATEGORIES:{}", escape_text(booking.flight_type.label())),
        "STATUS:CONFIRMED".to_string(),
        "END:VEVENT".to_string(),
    ]
}

fn render(name: &str, events: Vec<String>) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        format!("X-WR-CALNAME:{}", escape_text(name)),
        format!("X-WR-TIMEZONE:{TIMEZONE}"),
    ];
    lines.extend(events);
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines
        .iter()
        .map(|l| fold_line(l))
        .collect::<Vec<_>>()
        .join("\r\n");
    out.push_str("\r\n");
    out
}

/// A calendar holding a single booking.
#[must_use]
pub fn ical_event(booking: &Booking, calendar: &CalendarConfig, stamp: DateTime<Utc>) -> String {
    render(&calendar.name, event_lines(booking, calendar, stamp))
}

/// A calendar holding every given booking.
#[must_use]
pub fn ical_calendar(bookings: &[Booking], calendar: &CalendarConfig, stamp: DateTime<Utc>) -> String {
    let events = bookings
        .iter()
        .flat_map(|b| event_lines(b, calendar, stamp))
        .collect();
    render(&calendar.name, events)
}

/// Download name for a single booking, e.g. `varaus-OH-CON-42.ics`.
#[must_use]
pub fn event_file_name(booking: &Booking) -> String {
    format!("varaus-{}-{}.ics", booking.aircraft, booking.id)
}

/// Download name for a calendar exported on `date`.
#[must_use]
pub fn calendar_file_name(date: NaiveDate) -> String {
    format!("varaukset-{}.ics", date.format("%Y-%m-%d"))
}
