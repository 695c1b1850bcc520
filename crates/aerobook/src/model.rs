//! Core booking types.
//!
//! This module defines the aircraft and flight-type reference data, the
//! booking records read back from storage, and the inputs used to create
//! them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::access::Role;
use crate::error::{Error, Result};
use crate::timeslot::TimeSlot;

/// Surrogate key of a stored booking.
pub type BookingId = i64;

/// Default fleet registrations.
pub const DEFAULT_FLEET: &[&str] = &["OH-CON", "OH-PDX", "OH-816", "OH-829", "OH-475", "OH-386"];

/// A registration that has been checked against the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aircraft(String);

impl Aircraft {
    /// The registration, e.g. `OH-CON`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a registration read back from storage.
    pub(crate) fn from_stored(registration: String) -> Self {
        Self(registration)
    }
}

impl std::fmt::Display for Aircraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of aircraft that may be booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fleet {
    registrations: Vec<String>,
}

impl Fleet {
    /// Build a fleet from registrations.
    #[must_use]
    pub fn new<I, S>(registrations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registrations: registrations.into_iter().map(Into::into).collect(),
        }
    }

    /// Check a registration against the fleet.
    ///
    /// Matching is exact; `oh-con` is not `OH-CON`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAircraft`] if the registration is not in the fleet.
    pub fn resolve(&self, registration: &str) -> Result<Aircraft> {
        self.registrations
            .iter()
            .find(|r| r.as_str() == registration)
            .map(|r| Aircraft(r.clone()))
            .ok_or_else(|| Error::UnknownAircraft(registration.to_string()))
    }

    /// All registrations in configured order.
    #[must_use]
    pub fn registrations(&self) -> &[String] {
        &self.registrations
    }
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new(DEFAULT_FLEET.iter().copied())
    }
}

/// What a booking is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightType {
    /// Local flight around the field.
    Local,
    /// Cross-country trip.
    Trip,
    /// Flight training.
    Training,
    /// Aircraft maintenance.
    Maintenance,
    /// Forest fire patrol.
    Fire,
    /// Anything else.
    Other,
}

impl FlightType {
    /// Every flight type, in display order.
    pub const ALL: [FlightType; 6] = [
        Self::Local,
        Self::Trip,
        Self::Training,
        Self::Maintenance,
        Self::Fire,
        Self::Other,
    ];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Trip => "trip",
            Self::Training => "training",
            Self::Maintenance => "maintenance",
            Self::Fire => "fire",
            Self::Other => "other",
        }
    }

    /// Calendar label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Local => "Paikallislento",
            Self::Trip => "Matkalento",
            Self::Training => "Koululento",
            Self::Maintenance => "Huolto",
            Self::Fire => "Palolento",
            Self::Other => "Muu lento",
        }
    }

    /// Calendar colour as a hex triplet.
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Self::Local => "#90EE90",
            Self::Trip => "#87CEEB",
            Self::Training => "#ADD8E6",
            Self::Maintenance => "#FFB6C1",
            Self::Fire => "#FFA500",
            Self::Other => "#D3D3D3",
        }
    }

    /// Display priority; higher wins when bookings share an hour.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Self::Local | Self::Trip => 3,
            Self::Training | Self::Other => 2,
            Self::Maintenance | Self::Fire => 1,
        }
    }
}

impl std::fmt::Display for FlightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownFlightType(s.to_string()))
    }
}

/// Identifier shared by every booking created from one repeat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepeatGroupId(Ulid);

impl RepeatGroupId {
    /// Allocate a fresh group id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

impl std::fmt::Display for RepeatGroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RepeatGroupId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|e| Error::invalid_field("repeat_group", e.to_string()))
    }
}

/// A stored booking, joined with its owner's display name.
///
/// Serializes to the row shape the calendar consumes:
/// `{id, plane, start_time, end_time, full_name, type, title, description}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Surrogate key.
    pub id: BookingId,
    /// Owning user.
    pub user_id: String,
    /// Booked aircraft.
    #[serde(rename = "plane")]
    pub aircraft: Aircraft,
    /// Booked interval.
    #[serde(flatten)]
    pub slot: TimeSlot,
    /// Owner's full name.
    pub full_name: String,
    /// What the flight is for.
    #[serde(rename = "type")]
    pub flight_type: FlightType,
    /// Short title.
    pub title: String,
    /// Free text.
    pub description: String,
    /// Series the booking belongs to, if it was created by a repeat request.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repeat_group: Option<RepeatGroupId>,
    /// Whether the booking was made through the guest path.
    #[serde(default)]
    pub is_guest: bool,
}

/// A validated booking ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    /// Owning user.
    pub user_id: String,
    /// Booked aircraft.
    pub aircraft: Aircraft,
    /// Booked interval.
    pub slot: TimeSlot,
    /// What the flight is for.
    pub flight_type: FlightType,
    /// Short title.
    pub title: String,
    /// Free text.
    pub description: String,
    /// Series id when part of a repeat request.
    pub repeat_group: Option<RepeatGroupId>,
}

/// Unvalidated booking input as it arrives from a caller.
///
/// Times are RFC 3339 strings; the aircraft and flight type are checked
/// against the fleet and the known types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Aircraft registration.
    #[serde(rename = "plane")]
    pub aircraft: String,
    /// Flight type wire name.
    #[serde(rename = "type")]
    pub flight_type: String,
    /// Start timestamp.
    pub start_time: String,
    /// End timestamp.
    pub end_time: String,
    /// Short title.
    pub title: String,
    /// Free text.
    #[serde(default)]
    pub description: String,
}

/// Contact details attached to a guest booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestContact {
    /// Contact person.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
}

/// An account row bookings are joined against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account id, assigned by the authentication provider.
    pub id: String,
    /// Display name.
    pub full_name: String,
    /// Login email, unique.
    pub email: String,
    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Account role.
    pub role: Role,
}
