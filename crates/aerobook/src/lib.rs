//! `aerobook` - Aircraft reservations for a flying club
//!
//! This library holds the booking core behind the club's reservation
//! calendar: the time-slot model, validation, the column layout of
//! overlapping bookings, guest and repeating bookings, and `SQLite`
//! persistence. [`BookingService`] is the entry point.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod access;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod logging;
pub mod model;
pub mod repeat;
pub mod service;
pub mod storage;
pub mod timeslot;
pub mod validate;

pub use access::{Actor, Permission, Role};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use layout::{DayEntry, DayView, HourRow};
pub use logging::{init_logging, Verbosity};
pub use model::{
    Aircraft, Booking, BookingId, BookingRequest, Fleet, FlightType, GuestContact, NewBooking,
    RepeatGroupId, User,
};
pub use repeat::DeleteScope;
pub use service::{BookingService, Series};
pub use storage::Storage;
pub use timeslot::TimeSlot;
