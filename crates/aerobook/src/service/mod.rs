//! Booking service.
//!
//! [`BookingService`] is the crate's public API. It owns an explicitly
//! opened [`Storage`] handle and the loaded [`Config`]; every call validates
//! its input, applies the access rules for the acting user and then makes
//! one synchronous round trip to the database.

mod guest;
mod series;

pub use series::Series;

use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::access::{Actor, Permission};
use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::export;
use crate::layout::{self, DayView, HourRow};
use crate::model::{Aircraft, Booking, BookingId, BookingRequest};
use crate::repeat::DeleteScope;
use crate::storage::Storage;
use crate::timeslot::TimeSlot;
use crate::validate::BookingRules;

/// Log failures that need attention before handing them back.
fn logged<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        match e.kind() {
            ErrorKind::Database => error!("{} failed: {}", operation, e),
            ErrorKind::Configuration => warn!("{} failed: {}", operation, e),
            ErrorKind::Validation => debug!("{} rejected: {}", operation, e),
        }
    }
    result
}

/// Aircraft booking service.
#[derive(Debug)]
pub struct BookingService {
    storage: Storage,
    config: Config,
    rules: BookingRules,
}

impl BookingService {
    /// Create a service over an opened database.
    #[must_use]
    pub fn new(storage: Storage, config: Config) -> Self {
        let rules = BookingRules::from_config(&config);
        Self {
            storage,
            config,
            rules,
        }
    }

    /// Open the configured database and build a service over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the database
    /// cannot be opened.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let storage = Storage::open(config.database_path())?;
        Ok(Self::new(storage, config))
    }

    /// The underlying storage handle.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The validation rules in effect.
    #[must_use]
    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    fn check_overlap(&self) -> bool {
        !self.config.booking.allow_overlapping
    }

    /// Bookings of `aircraft` that start on local `date`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown aircraft or malformed date.
    pub fn fetch_day_bookings(&self, aircraft: &str, date: &str) -> Result<Vec<Booking>> {
        let aircraft = self.rules.aircraft(aircraft)?;
        let date = self.rules.date(date)?;
        let window = TimeSlot::local_day(date, self.rules.offset());
        logged(
            "fetch_day_bookings",
            self.storage.bookings_starting_in(&aircraft, &window),
        )
    }

    /// Bookings of `aircraft` overlapping local days `from..=to`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown aircraft, a malformed date
    /// or `to` before `from`.
    pub fn fetch_range_bookings(&self, aircraft: &str, from: &str, to: &str) -> Result<Vec<Booking>> {
        let aircraft = self.rules.aircraft(aircraft)?;
        let window = self.date_range(from, to)?;
        logged(
            "fetch_range_bookings",
            self.storage.bookings_overlapping(Some(&aircraft), &window),
        )
    }

    fn date_range(&self, from: &str, to: &str) -> Result<TimeSlot> {
        let from = self.rules.date(from)?;
        let to = self.rules.date(to)?;
        TimeSlot::local_days(from, to, self.rules.offset())
    }

    /// Fetch one booking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no booking with that id.
    pub fn booking(&self, id: BookingId) -> Result<Booking> {
        logged("booking", self.storage.get_booking(id))?.ok_or(Error::NotFound(id))
    }

    /// Create a booking owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad request, [`Error::Conflict`] when
    /// overlaps are disallowed and the slot is taken, or a database error.
    pub fn add_booking(&self, request: &BookingRequest, actor: &Actor) -> Result<BookingId> {
        actor.require(Permission::CreateOwnBooking)?;
        let booking = self.rules.booking(&actor.user_id, request)?;
        let id = logged(
            "add_booking",
            self.storage.insert_booking(&booking, self.check_overlap()),
        )?;
        info!(
            "Booking {} created on {} at {} by {}",
            id, booking.aircraft, booking.slot, actor.user_id
        );
        Ok(id)
    }

    /// Change a booking's aircraft, time, type or text.
    ///
    /// The request is validated before the booking is looked up. Only the
    /// owner or an admin may edit; anyone else gets [`Error::NotFound`], the
    /// same as for a missing booking.
    ///
    /// # Errors
    ///
    /// Returns a validation error, [`Error::NotFound`], [`Error::Conflict`]
    /// or a database error.
    pub fn update_booking(
        &self,
        id: BookingId,
        request: &BookingRequest,
        actor: &Actor,
    ) -> Result<Booking> {
        actor.require(Permission::EditOwnBooking)?;
        let mut changed = self.rules.booking(&actor.user_id, request)?;

        let existing = self.booking(id)?;
        if !actor.can_edit_booking(&existing.user_id) {
            debug!("{} may not edit booking {}", actor.user_id, id);
            return Err(Error::NotFound(id));
        }
        changed.user_id = existing.user_id;

        let updated = logged(
            "update_booking",
            self.storage.update_booking(id, &changed, self.check_overlap()),
        )?;
        if !updated {
            return Err(Error::NotFound(id));
        }
        info!("Booking {} updated by {}", id, actor.user_id);
        self.booking(id)
    }

    /// Delete a booking, or it and the rest of its series.
    ///
    /// Returns the number of bookings deleted. With
    /// [`DeleteScope::ThisAndFollowing`] every booking of the series whose
    /// start falls on or after the selected booking's local date goes; a
    /// booking outside any series is deleted alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing was deleted and
    /// [`Error::PermissionDenied`] if the actor may not delete the booking.
    pub fn remove_booking(&self, id: BookingId, actor: &Actor, scope: DeleteScope) -> Result<usize> {
        actor.require(Permission::DeleteOwnBooking)?;
        let existing = self.booking(id)?;
        actor.require_delete(&existing.user_id)?;

        let deleted = match (scope, existing.repeat_group) {
            (DeleteScope::ThisAndFollowing, Some(group)) => {
                let offset = self.rules.offset();
                let date = existing.slot.start().with_timezone(&offset).date_naive();
                let from = TimeSlot::local_day(date, offset).start();
                logged("remove_booking", self.storage.delete_series_from(group, from))?
            }
            _ => usize::from(logged("remove_booking", self.storage.delete_booking(id))?),
        };
        if deleted == 0 {
            return Err(Error::NotFound(id));
        }
        info!("Deleted {} booking(s) starting from {} by {}", deleted, id, actor.user_id);
        Ok(deleted)
    }

    /// Bookings owned by `owner`, or by the actor when `owner` is `None`.
    ///
    /// Everyone may list their own bookings; listing someone else's needs
    /// the admin's view-all right.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] or a database error.
    pub fn user_bookings(&self, owner: Option<&str>, actor: &Actor) -> Result<Vec<Booking>> {
        let owner = owner.unwrap_or(&actor.user_id);
        actor.require_view(owner)?;
        logged("user_bookings", self.storage.bookings_by_user(owner))
    }

    /// Lay out `aircraft`'s bookings for a local day.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown aircraft or malformed date.
    pub fn day_view(&self, aircraft: &str, date: &str) -> Result<DayView> {
        let (date, bookings) = self.day_bookings(aircraft, date)?;
        Ok(layout::day_view(date, self.rules.offset(), &bookings))
    }

    /// The calendar hour grid for `aircraft` on a local day.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown aircraft or malformed date.
    pub fn hour_rows(&self, aircraft: &str, date: &str) -> Result<Vec<HourRow>> {
        let (date, bookings) = self.day_bookings(aircraft, date)?;
        let calendar = &self.config.calendar;
        Ok(layout::hour_rows(
            date,
            calendar.first_hour,
            calendar.last_hour,
            self.rules.offset(),
            &bookings,
        ))
    }

    /// Unbooked time of `aircraft` within the calendar's opening hours.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown aircraft or malformed date.
    pub fn free_slots(&self, aircraft: &str, date: &str) -> Result<Vec<TimeSlot>> {
        let (date, bookings) = self.day_bookings(aircraft, date)?;
        let window = self.opening_hours(date);
        Ok(layout::free_slots(&window, &bookings))
    }

    fn opening_hours(&self, date: NaiveDate) -> TimeSlot {
        let calendar = &self.config.calendar;
        let offset = self.rules.offset();
        let open = TimeSlot::local_hour(date, calendar.first_hour, offset);
        let close = TimeSlot::local_hour(date, calendar.last_hour, offset);
        TimeSlot::from_ordered(open.start(), close.end())
    }

    /// Bookings overlapping a local day, with the parsed date.
    fn day_bookings(&self, aircraft: &str, date: &str) -> Result<(NaiveDate, Vec<Booking>)> {
        let aircraft: Aircraft = self.rules.aircraft(aircraft)?;
        let date = self.rules.date(date)?;
        let window = TimeSlot::local_day(date, self.rules.offset());
        let bookings = logged(
            "day_bookings",
            self.storage.bookings_overlapping(Some(&aircraft), &window),
        )?;
        Ok((date, bookings))
    }

    /// iCalendar export of bookings overlapping local days `from..=to`.
    ///
    /// `aircraft` limits the export to one aircraft; `None` exports the
    /// whole fleet.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown aircraft or bad dates.
    pub fn export_range(&self, aircraft: Option<&str>, from: &str, to: &str) -> Result<String> {
        let aircraft = aircraft.map(|a| self.rules.aircraft(a)).transpose()?;
        let window = self.date_range(from, to)?;
        let bookings = logged(
            "export_range",
            self.storage.bookings_overlapping(aircraft.as_ref(), &window),
        )?;
        debug!("Exporting {} bookings", bookings.len());
        Ok(export::ical_calendar(
            &bookings,
            &self.config.calendar,
            Utc::now(),
        ))
    }

    /// iCalendar export of a single booking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no booking with that id.
    pub fn export_booking(&self, id: BookingId) -> Result<String> {
        let booking = self.booking(id)?;
        Ok(export::ical_event(&booking, &self.config.calendar, Utc::now()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::access::Role;
    use crate::logging::init_test_logging;
    use crate::model::{FlightType, User};

    pub(crate) const GUEST_EMAIL: &str = "vieras@savonlinnanlentokerho.fi";

    pub(crate) fn user(id: &str, name: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            full_name: name.to_string(),
            email: format!("{id}@example.org"),
            phone: None,
            role,
        }
    }

    pub(crate) fn service_with(config: Config) -> BookingService {
        init_test_logging();
        let storage = Storage::open_in_memory().expect("failed to create test storage");
        storage.insert_user(&user("u1", "Matti Meikäläinen", Role::User)).unwrap();
        storage.insert_user(&user("u2", "Maija Mehiläinen", Role::User)).unwrap();
        storage.insert_user(&user("admin", "Pekka Pääkäyttäjä", Role::Admin)).unwrap();
        let mut guest = user("guest", "Vieras", Role::Guest);
        guest.email = GUEST_EMAIL.to_string();
        storage.insert_user(&guest).unwrap();
        BookingService::new(storage, config)
    }

    /// Service in UTC+3 so local dates and hours are easy to follow.
    pub(crate) fn service() -> BookingService {
        let mut config = Config::default();
        config.calendar.utc_offset_minutes = 180;
        service_with(config)
    }

    /// Request for `start..end` local hours (UTC+3) on June `day`, 2025.
    pub(crate) fn request(day: u32, start: u32, end: u32) -> BookingRequest {
        BookingRequest {
            aircraft: "OH-CON".to_string(),
            flight_type: "local".to_string(),
            start_time: format!("2025-06-{day:02}T{start:02}:00:00+03:00"),
            end_time: format!("2025-06-{day:02}T{end:02}:00:00+03:00"),
            title: "Kierros".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_add_and_fetch_day() {
        let svc = service();
        let member = Actor::member("u1");
        let id = svc.add_booking(&request(1, 8, 10), &member).unwrap();
        svc.add_booking(&request(2, 8, 10), &member).unwrap();

        let day = svc.fetch_day_bookings("OH-CON", "2025-06-01").unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].id, id);
        assert_eq!(day[0].full_name, "Matti Meikäläinen");
        assert_eq!(day[0].flight_type, FlightType::Local);

        assert!(svc.fetch_day_bookings("OH-PDX", "2025-06-01").unwrap().is_empty());
    }

    #[test]
    fn test_fetch_day_uses_local_start_date() {
        let svc = service();
        // 01:00 local on 06-02 is 22:00 UTC on 06-01.
        svc.add_booking(&request(2, 1, 2), &Actor::member("u1")).unwrap();
        assert!(svc.fetch_day_bookings("OH-CON", "2025-06-01").unwrap().is_empty());
        assert_eq!(svc.fetch_day_bookings("OH-CON", "2025-06-02").unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_day_validation() {
        let svc = service();
        assert!(matches!(
            svc.fetch_day_bookings("OH-XXX", "2025-06-01"),
            Err(Error::UnknownAircraft(_))
        ));
        assert!(matches!(
            svc.fetch_day_bookings("OH-CON", "June 1st"),
            Err(Error::MalformedTime { .. })
        ));
    }

    #[test]
    fn test_add_rejects_invalid_intervals() {
        let svc = service();
        let member = Actor::member("u1");
        assert!(matches!(
            svc.add_booking(&request(1, 10, 10), &member),
            Err(Error::InvalidTimeRange { .. })
        ));
        assert!(matches!(
            svc.add_booking(&request(1, 10, 9), &member),
            Err(Error::InvalidTimeRange { .. })
        ));
        assert_eq!(svc.storage().count().unwrap(), 0);
    }

    #[test]
    fn test_add_rejects_aircraft_outside_fleet() {
        let svc = service();
        let member = Actor::member("u1");
        for reg in ["OH-CON", "OH-PDX", "OH-816", "OH-829", "OH-475", "OH-386"] {
            let mut req = request(1, 8, 9);
            req.aircraft = reg.to_string();
            assert!(svc.add_booking(&req, &member).is_ok(), "{reg}");
        }
        let mut req = request(1, 8, 9);
        req.aircraft = "OH-U2".to_string();
        assert!(matches!(
            svc.add_booking(&req, &member),
            Err(Error::UnknownAircraft(_))
        ));
    }

    #[test]
    fn test_overlap_policy() {
        let svc = service();
        let member = Actor::member("u1");
        svc.add_booking(&request(1, 8, 10), &member).unwrap();
        assert!(svc.add_booking(&request(1, 9, 11), &member).is_ok());

        let mut config = Config::default();
        config.booking.allow_overlapping = false;
        let strict = service_with(config);
        strict.add_booking(&request(1, 8, 10), &member).unwrap();
        let err = strict.add_booking(&request(1, 9, 11), &member).unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        assert!(err.is_validation());
        assert!(strict.add_booking(&request(1, 10, 11), &member).is_ok());
    }

    #[test]
    fn test_update_by_owner_and_admin() {
        let svc = service();
        let id = svc.add_booking(&request(1, 8, 10), &Actor::member("u1")).unwrap();

        let mut change = request(1, 12, 14);
        change.title = "Iltalento".to_string();
        let updated = svc.update_booking(id, &change, &Actor::member("u1")).unwrap();
        assert_eq!(updated.title, "Iltalento");

        change.flight_type = "maintenance".to_string();
        let updated = svc.update_booking(id, &change, &Actor::admin("admin")).unwrap();
        assert_eq!(updated.flight_type, FlightType::Maintenance);
        assert_eq!(updated.user_id, "u1");
    }

    #[test]
    fn test_update_by_other_member_is_not_found() {
        let svc = service();
        let id = svc.add_booking(&request(1, 8, 10), &Actor::member("u1")).unwrap();
        let err = svc
            .update_booking(id, &request(1, 12, 14), &Actor::member("u2"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(n) if n == id));
        assert!(matches!(
            svc.update_booking(999, &request(1, 12, 14), &Actor::member("u1")),
            Err(Error::NotFound(999))
        ));
    }

    #[test]
    fn test_remove_booking() {
        let svc = service();
        let id = svc.add_booking(&request(1, 8, 10), &Actor::member("u1")).unwrap();

        assert!(matches!(
            svc.remove_booking(id, &Actor::member("u2"), DeleteScope::Single),
            Err(Error::PermissionDenied(_))
        ));
        assert!(matches!(
            svc.remove_booking(id, &Actor::new("guest", Role::Guest), DeleteScope::Single),
            Err(Error::PermissionDenied(_))
        ));

        assert_eq!(svc.remove_booking(id, &Actor::member("u1"), DeleteScope::Single).unwrap(), 1);
        assert!(matches!(
            svc.remove_booking(id, &Actor::member("u1"), DeleteScope::Single),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_validates_before_lookup() {
        let svc = service();
        let mut bad = request(1, 12, 14);
        bad.aircraft = "OH-XXX".to_string();
        // Id 999 does not exist, but the bad request is reported first.
        assert!(matches!(
            svc.update_booking(999, &bad, &Actor::member("u1")),
            Err(Error::UnknownAircraft(_))
        ));
    }

    #[test]
    fn test_user_bookings() {
        let svc = service();
        svc.add_booking(&request(2, 8, 10), &Actor::member("u1")).unwrap();
        svc.add_booking(&request(1, 8, 10), &Actor::member("u1")).unwrap();
        svc.add_booking(&request(1, 12, 14), &Actor::member("u2")).unwrap();

        let mine = svc.user_bookings(None, &Actor::member("u1")).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].slot.start() < mine[1].slot.start());

        assert!(matches!(
            svc.user_bookings(Some("u2"), &Actor::member("u1")),
            Err(Error::PermissionDenied(_))
        ));
        let theirs = svc.user_bookings(Some("u2"), &Actor::admin("admin")).unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].user_id, "u2");
    }

    #[test]
    fn test_admin_removes_any_booking() {
        let svc = service();
        let id = svc.add_booking(&request(1, 8, 10), &Actor::member("u1")).unwrap();
        let scope = DeleteScope::ThisAndFollowing;
        assert_eq!(svc.remove_booking(id, &Actor::admin("admin"), scope).unwrap(), 1);
        assert_eq!(svc.storage().count().unwrap(), 0);
    }

    #[test]
    fn test_day_view_and_free_slots() {
        let svc = service();
        let member = Actor::member("u1");
        svc.add_booking(&request(1, 8, 10), &member).unwrap();
        svc.add_booking(&request(1, 9, 11), &member).unwrap();
        svc.add_booking(&request(1, 14, 15), &member).unwrap();

        let view = svc.day_view("OH-CON", "2025-06-01").unwrap();
        assert_eq!(view.columns, 2);
        assert_eq!(view.entries.len(), 3);

        let free = svc.free_slots("OH-CON", "2025-06-01").unwrap();
        let offset = svc.rules().offset();
        let hours: Vec<_> = free
            .iter()
            .map(|s| {
                use chrono::Timelike;
                (
                    s.start().with_timezone(&offset).hour(),
                    s.end().with_timezone(&offset).hour(),
                )
            })
            .collect();
        // Opening hours 7:00-23:00 local.
        assert_eq!(hours, vec![(7, 8), (11, 14), (15, 23)]);

        let rows = svc.hour_rows("OH-CON", "2025-06-01").unwrap();
        assert_eq!(rows.len(), 16);
        assert_eq!(rows[2].label, "9:00");
        assert_eq!(rows[2].bookings.len(), 2);
    }

    #[test]
    fn test_range_and_export() {
        let svc = service();
        let member = Actor::member("u1");
        svc.add_booking(&request(1, 8, 10), &member).unwrap();
        svc.add_booking(&request(3, 8, 10), &member).unwrap();
        let mut other = request(2, 8, 10);
        other.aircraft = "OH-PDX".to_string();
        svc.add_booking(&other, &member).unwrap();

        assert_eq!(
            svc.fetch_range_bookings("OH-CON", "2025-06-01", "2025-06-02").unwrap().len(),
            1
        );
        assert!(svc
            .fetch_range_bookings("OH-CON", "2025-06-03", "2025-06-01")
            .is_err());

        let all = svc.export_range(None, "2025-06-01", "2025-06-03").unwrap();
        assert_eq!(all.matches("BEGIN:VEVENT").count(), 3);
        let one = svc.export_range(Some("OH-PDX"), "2025-06-01", "2025-06-03").unwrap();
        assert_eq!(one.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn test_export_booking() {
        let svc = service();
        let id = svc.add_booking(&request(1, 8, 10), &Actor::member("u1")).unwrap();
        let ics = svc.export_booking(id).unwrap();
        assert!(ics.contains(&format!("UID:booking-{id}@savonlinnanlentokerho.fi")));
        assert!(ics.contains("DTSTART:20250601T050000Z"));
        assert!(matches!(svc.export_booking(id + 1), Err(Error::NotFound(_))));
    }
}
