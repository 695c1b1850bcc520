//! Input validation.
//!
//! Everything a caller hands the service passes through [`BookingRules`]
//! before any database call: aircraft and flight type whitelists, interval
//! shape, text limits and guest contact fields.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, SubsecRound, Timelike, Utc};
use regex::Regex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Aircraft, BookingRequest, Fleet, FlightType, GuestContact, NewBooking};
use crate::timeslot::TimeSlot;

/// Longest accepted contact name, in characters.
const MAX_CONTACT_NAME_LEN: usize = 100;

/// A named pattern a text field must match.
#[derive(Debug)]
pub struct FieldPattern {
    /// Field the pattern applies to.
    pub field: &'static str,
    /// What the pattern accepts, for error messages.
    pub description: &'static str,
    regex: Regex,
}

impl FieldPattern {
    /// Compile a field pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn new(field: &'static str, description: &'static str, pattern: &str) -> Self {
        Self {
            field,
            description,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Check the value against the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] if the value does not match.
    pub fn check(&self, value: &str) -> Result<()> {
        if self.regex.is_match(value) {
            Ok(())
        } else {
            Err(Error::invalid_field(self.field, self.description))
        }
    }
}

fn email_pattern() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        FieldPattern::new(
            "contact_email",
            "expected an email address",
            r"^[^\s@]+@[^\s@]+\.[^\s@]+$",
        )
    })
}

fn phone_pattern() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        FieldPattern::new(
            "contact_phone",
            "only digits, spaces, +, - and parentheses are allowed",
            r"^[+\d\s()-]+$",
        )
    })
}

/// Parse an RFC 3339 timestamp. A timestamp without an offset is UTC.
/// Fractional seconds are dropped.
///
/// # Errors
///
/// Returns [`Error::MalformedTime`] if the value is not a timestamp.
pub fn parse_instant(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(0));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc().trunc_subsecs(0));
        }
    }
    Err(Error::malformed_time(field, value))
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, or a full timestamp whose date is taken in the club's
/// local time.
///
/// # Errors
///
/// Returns [`Error::MalformedTime`] if the value is neither.
pub fn parse_local_date(value: &str, offset: FixedOffset) -> Result<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_instant("date", value)
        .map(|t| t.with_timezone(&offset).date_naive())
        .map_err(|_| Error::malformed_time("date", value))
}

/// Booking shape rules, built from [`Config`].
#[derive(Debug, Clone)]
pub struct BookingRules {
    fleet: Fleet,
    offset: FixedOffset,
    min_duration: Duration,
    whole_hours_only: bool,
    max_title_len: usize,
    max_description_len: usize,
    max_repeat_days: u32,
}

impl BookingRules {
    /// Rules from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            fleet: config.fleet(),
            offset: config.utc_offset(),
            min_duration: config.min_duration(),
            whole_hours_only: config.booking.whole_hours_only,
            max_title_len: config.booking.max_title_len,
            max_description_len: config.booking.max_description_len,
            max_repeat_days: config.booking.max_repeat_days,
        }
    }

    /// The club's local time offset.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The bookable fleet.
    #[must_use]
    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// Longest accepted repeat series, in days.
    #[must_use]
    pub fn max_repeat_days(&self) -> u32 {
        self.max_repeat_days
    }

    /// Check an aircraft registration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAircraft`] for registrations outside the fleet.
    pub fn aircraft(&self, registration: &str) -> Result<Aircraft> {
        self.fleet.resolve(registration)
    }

    /// Parse a local calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTime`] if the date cannot be parsed.
    pub fn date(&self, value: &str) -> Result<NaiveDate> {
        parse_local_date(value, self.offset)
    }

    /// Parse and check a booking interval.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is malformed, `end <= start`, the
    /// slot is shorter than the minimum, or it is not on whole local hours
    /// when that rule is on.
    pub fn slot(&self, start: &str, end: &str) -> Result<TimeSlot> {
        let start = parse_instant("start_time", start)?;
        let end = parse_instant("end_time", end)?;
        let slot = TimeSlot::new(start, end)?;
        self.check_slot(&slot)?;
        Ok(slot)
    }

    /// Apply duration and alignment rules to an already-built slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] when a rule fails.
    pub fn check_slot(&self, slot: &TimeSlot) -> Result<()> {
        if slot.duration() < self.min_duration {
            return Err(Error::invalid_field(
                "end_time",
                format!(
                    "booking must last at least {} minutes",
                    self.min_duration.num_minutes()
                ),
            ));
        }
        if self.whole_hours_only {
            for (field, t) in [("start_time", slot.start()), ("end_time", slot.end())] {
                let local = t.with_timezone(&self.offset);
                if local.minute() != 0 || local.second() != 0 || local.nanosecond() != 0 {
                    return Err(Error::invalid_field(field, "must be on a full hour"));
                }
            }
        }
        Ok(())
    }

    /// Validate a booking request for an owner.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure: owner, aircraft, flight type,
    /// interval, then text limits.
    pub fn booking(&self, owner: &str, request: &BookingRequest) -> Result<NewBooking> {
        if owner.trim().is_empty() {
            return Err(Error::invalid_field("user_id", "must not be empty"));
        }
        let aircraft = self.aircraft(&request.aircraft)?;
        let flight_type: FlightType = request.flight_type.parse()?;
        let slot = self.slot(&request.start_time, &request.end_time)?;
        self.text(request)?;

        Ok(NewBooking {
            user_id: owner.to_string(),
            aircraft,
            slot,
            flight_type,
            title: request.title.trim().to_string(),
            description: request.description.clone(),
            repeat_group: None,
        })
    }

    fn text(&self, request: &BookingRequest) -> Result<()> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(Error::invalid_field("title", "must not be empty"));
        }
        if title.chars().count() > self.max_title_len {
            return Err(Error::invalid_field(
                "title",
                format!("at most {} characters", self.max_title_len),
            ));
        }
        if request.description.chars().count() > self.max_description_len {
            return Err(Error::invalid_field(
                "description",
                format!("at most {} characters", self.max_description_len),
            ));
        }
        Ok(())
    }

    /// Title of a guest booking: the visitor's name is appended in
    /// parentheses and the result must still fit the title limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] if the combined title is too long.
    pub fn guest_title(&self, title: &str, contact_name: &str) -> Result<String> {
        let combined = format!("{} ({})", title.trim(), contact_name.trim());
        if combined.chars().count() > self.max_title_len {
            return Err(Error::invalid_field(
                "title",
                format!(
                    "at most {} characters including the contact name",
                    self.max_title_len
                ),
            ));
        }
        Ok(combined)
    }

    /// Validate guest contact details.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] for an empty or malformed field.
    pub fn contact(&self, contact: &GuestContact) -> Result<()> {
        let name = contact.name.trim();
        if name.is_empty() {
            return Err(Error::invalid_field("contact_name", "must not be empty"));
        }
        if name.chars().count() > MAX_CONTACT_NAME_LEN {
            return Err(Error::invalid_field(
                "contact_name",
                format!("at most {MAX_CONTACT_NAME_LEN} characters"),
            ));
        }
        email_pattern().check(contact.email.trim())?;
        phone_pattern().check(contact.phone.trim())?;
        Ok(())
    }
}
