//! Storage layer for aerobook.
//!
//! `SQLite`-backed persistence for users, bookings and guest contact
//! records. Multi-row writes run inside a single transaction; when overlap
//! checking is requested it happens inside that same transaction.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::access::Role;
use crate::error::{Error, Result};
use crate::model::{
    Aircraft, Booking, BookingId, FlightType, GuestContact, NewBooking, RepeatGroupId, User,
};
use crate::timeslot::TimeSlot;

const SELECT_BOOKING: &str = r"
    SELECT b.id, b.user_id, b.plane, b.start_time, b.end_time, u.full_name,
           b.type, b.title, b.description, b.repeat_group,
           g.booking_id IS NOT NULL
    FROM bookings b
    JOIN users u ON u.id = b.user_id
    LEFT JOIN guest_bookings g ON g.booking_id = b.id
";

const ORDER_BY_TIME: &str = "ORDER BY b.start_time, b.end_time, b.id";

/// Format an instant the way it is stored.
fn to_sql_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

fn parse_sql_time(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, format!("bad timestamp {value:?}: {e}")))
}

/// Storage engine for bookings.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    conn: Connection,
}

impl Storage {
    /// Open or create a booking database at the given path.
    ///
    /// Creates parent directories as needed and brings the schema up to
    /// date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory database, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // ---- users ----

    /// Insert an account row.
    ///
    /// # Errors
    ///
    /// Returns an error if the id or email is already taken.
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, full_name, email, phone, role) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.full_name,
                user.email,
                user.phone,
                user.role.as_str()
            ],
        )?;
        debug!("Inserted user {} ({})", user.id, user.role);
        Ok(())
    }

    /// Look up an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, full_name, email, phone, role FROM users WHERE id = ?1",
                [id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Find the shared guest account by its email.
    ///
    /// Only accounts with the `guest` role match.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_guest_account(&self, email: &str) -> Result<Option<User>> {
        Self::guest_account(&self.conn, email)
    }

    fn guest_account(conn: &Connection, email: &str) -> Result<Option<User>> {
        let user = conn
            .query_row(
                "SELECT id, full_name, email, phone, role FROM users
                 WHERE email = ?1 AND role = 'guest'",
                [email],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    // ---- writes ----

    /// Insert one booking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if `check_overlap` is set and the slot
    /// intersects an existing booking of the same aircraft, or a database
    /// error.
    pub fn insert_booking(&self, booking: &NewBooking, check_overlap: bool) -> Result<BookingId> {
        let tx = self.conn.unchecked_transaction()?;
        let id = Self::insert_booking_row(&tx, booking, check_overlap)?;
        tx.commit()?;
        debug!("Inserted booking {} on {}", id, booking.aircraft);
        Ok(id)
    }

    /// Insert every booking of a series, or none of them.
    ///
    /// # Errors
    ///
    /// Returns the first failure; nothing is written in that case.
    pub fn insert_series(
        &self,
        bookings: &[NewBooking],
        check_overlap: bool,
    ) -> Result<Vec<BookingId>> {
        let tx = self.conn.unchecked_transaction()?;
        let ids = bookings
            .iter()
            .map(|b| Self::insert_booking_row(&tx, b, check_overlap))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;
        info!("Inserted series of {} bookings", ids.len());
        Ok(ids)
    }

    /// Insert a guest booking and its contact record together.
    ///
    /// The shared guest account is looked up by `guest_email` (role `guest`
    /// only) inside the same transaction, and the booking is stored under
    /// its id whatever `booking.user_id` says.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GuestAccountMissing`] if there is no such account,
    /// or the first insert failure; no row is kept in either case.
    pub fn insert_guest_booking(
        &self,
        guest_email: &str,
        booking: &NewBooking,
        contact: &GuestContact,
        check_overlap: bool,
    ) -> Result<BookingId> {
        let tx = self.conn.unchecked_transaction()?;
        let guest = Self::guest_account(&tx, guest_email)?.ok_or_else(|| {
            Error::GuestAccountMissing {
                email: guest_email.to_string(),
            }
        })?;
        let booking = NewBooking {
            user_id: guest.id,
            ..booking.clone()
        };

        let id = Self::insert_booking_row(&tx, &booking, check_overlap)?;
        tx.execute(
            r"
            INSERT INTO guest_bookings (booking_id, contact_name, contact_email, contact_phone)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![id, contact.name, contact.email, contact.phone],
        )?;
        tx.commit()?;
        debug!("Inserted guest booking {}", id);
        Ok(id)
    }

    fn insert_booking_row(
        conn: &Connection,
        booking: &NewBooking,
        check_overlap: bool,
    ) -> Result<BookingId> {
        if check_overlap {
            Self::reject_conflict(conn, &booking.aircraft, &booking.slot, None)?;
        }
        conn.execute(
            r"
            INSERT INTO bookings (user_id, plane, start_time, end_time, type, title, description, repeat_group)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                booking.user_id,
                booking.aircraft.as_str(),
                to_sql_time(booking.slot.start()),
                to_sql_time(booking.slot.end()),
                booking.flight_type.as_str(),
                booking.title,
                booking.description,
                booking.repeat_group.map(|g| g.to_string()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn reject_conflict(
        conn: &Connection,
        aircraft: &Aircraft,
        slot: &TimeSlot,
        exclude: Option<BookingId>,
    ) -> Result<()> {
        match Self::first_overlapping(conn, aircraft, slot, exclude)? {
            Some(existing) => Err(Error::Conflict {
                aircraft: aircraft.to_string(),
                existing,
            }),
            None => Ok(()),
        }
    }

    fn first_overlapping(
        conn: &Connection,
        aircraft: &Aircraft,
        slot: &TimeSlot,
        exclude: Option<BookingId>,
    ) -> Result<Option<BookingId>> {
        let id = conn
            .query_row(
                r"
                SELECT id FROM bookings
                WHERE plane = ?1 AND start_time < ?3 AND end_time > ?2
                  AND (?4 IS NULL OR id != ?4)
                ORDER BY start_time LIMIT 1
                ",
                params![
                    aircraft.as_str(),
                    to_sql_time(slot.start()),
                    to_sql_time(slot.end()),
                    exclude,
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Replace the editable fields of a booking.
    ///
    /// Owner and series membership are kept. Returns `false` if no row has
    /// that id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] under `check_overlap`, or a database error.
    pub fn update_booking(
        &self,
        id: BookingId,
        booking: &NewBooking,
        check_overlap: bool,
    ) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        if check_overlap {
            Self::reject_conflict(&tx, &booking.aircraft, &booking.slot, Some(id))?;
        }
        let affected = tx.execute(
            r"
            UPDATE bookings
            SET plane = ?2, start_time = ?3, end_time = ?4, type = ?5, title = ?6, description = ?7
            WHERE id = ?1
            ",
            params![
                id,
                booking.aircraft.as_str(),
                to_sql_time(booking.slot.start()),
                to_sql_time(booking.slot.end()),
                booking.flight_type.as_str(),
                booking.title,
                booking.description,
            ],
        )?;
        tx.commit()?;
        Ok(affected > 0)
    }

    /// Delete a booking by id. Its guest contact goes with it.
    ///
    /// Returns `true` if a booking was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_booking(&self, id: BookingId) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM bookings WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Delete every booking of a series that starts at or after `from`.
    ///
    /// Returns the number of bookings deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_series_from(&self, group: RepeatGroupId, from: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM bookings WHERE repeat_group = ?1 AND start_time >= ?2",
            params![group.to_string(), to_sql_time(from)],
        )?;
        if affected > 0 {
            info!("Deleted {} bookings from series {}", affected, group);
        }
        Ok(affected)
    }

    // ---- reads ----

    /// Get a booking by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let sql = format!("{SELECT_BOOKING} WHERE b.id = ?1");
        let booking = self
            .conn
            .query_row(&sql, [id], Self::row_to_booking)
            .optional()?;
        Ok(booking)
    }

    /// Bookings of `aircraft` whose start lies inside `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn bookings_starting_in(&self, aircraft: &Aircraft, window: &TimeSlot) -> Result<Vec<Booking>> {
        let sql = format!(
            "{SELECT_BOOKING} WHERE b.plane = ?1 AND b.start_time >= ?2 AND b.start_time < ?3 {ORDER_BY_TIME}"
        );
        self.query_bookings(
            &sql,
            params![
                aircraft.as_str(),
                to_sql_time(window.start()),
                to_sql_time(window.end())
            ],
        )
    }

    /// Bookings that overlap `window`, for one aircraft or the whole fleet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn bookings_overlapping(
        &self,
        aircraft: Option<&Aircraft>,
        window: &TimeSlot,
    ) -> Result<Vec<Booking>> {
        let sql = format!(
            "{SELECT_BOOKING} WHERE (?1 IS NULL OR b.plane = ?1) AND b.start_time < ?3 AND b.end_time > ?2 {ORDER_BY_TIME}"
        );
        self.query_bookings(
            &sql,
            params![
                aircraft.map(Aircraft::as_str),
                to_sql_time(window.start()),
                to_sql_time(window.end())
            ],
        )
    }

    /// Bookings owned by `user_id`, in time order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn bookings_by_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        let sql = format!("{SELECT_BOOKING} WHERE b.user_id = ?1 {ORDER_BY_TIME}");
        self.query_bookings(&sql, params![user_id])
    }

    /// Every booking of a series, in time order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn series(&self, group: RepeatGroupId) -> Result<Vec<Booking>> {
        let sql = format!("{SELECT_BOOKING} WHERE b.repeat_group = ?1 {ORDER_BY_TIME}");
        self.query_bookings(&sql, params![group.to_string()])
    }

    fn query_bookings(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Booking>> {
        let mut stmt = self.conn.prepare(sql)?;
        let bookings = stmt
            .query_map(params, Self::row_to_booking)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(bookings)
    }

    /// Contact record of a guest booking, `None` for member bookings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn guest_contact(&self, booking_id: BookingId) -> Result<Option<GuestContact>> {
        let contact = self
            .conn
            .query_row(
                "SELECT contact_name, contact_email, contact_phone FROM guest_bookings WHERE booking_id = ?1",
                [booking_id],
                |row| {
                    Ok(GuestContact {
                        name: row.get(0)?,
                        email: row.get(1)?,
                        phone: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(contact)
    }

    /// Count stored bookings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let role: String = row.get(4)?;
        Ok(User {
            id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            role: role
                .parse::<Role>()
                .map_err(|_| conversion_error(4, format!("unknown role {role:?}")))?,
        })
    }

    fn row_to_booking(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
        let start: String = row.get(3)?;
        let end: String = row.get(4)?;
        let start = parse_sql_time(3, &start)?;
        let end = parse_sql_time(4, &end)?;
        let slot = TimeSlot::new(start, end)
            .map_err(|e| conversion_error(4, e.to_string()))?;

        let flight_type: String = row.get(6)?;
        let flight_type = flight_type
            .parse::<FlightType>()
            .map_err(|e| conversion_error(6, e.to_string()))?;

        let repeat_group: Option<String> = row.get(9)?;
        let repeat_group = repeat_group
            .map(|g| g.parse::<RepeatGroupId>())
            .transpose()
            .map_err(|e| conversion_error(9, e.to_string()))?;

        Ok(Booking {
            id: row.get(0)?,
            user_id: row.get(1)?,
            aircraft: Aircraft::from_stored(row.get(2)?),
            slot,
            full_name: row.get(5)?,
            flight_type,
            title: row.get(7)?,
            description: row.get(8)?,
            repeat_group,
            is_guest: row.get(10)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn create_test_storage() -> Storage {
        let storage = Storage::open_in_memory().expect("failed to create test storage");
        storage
            .insert_user(&User {
                id: "u1".to_string(),
                full_name: "Matti Meikäläinen".to_string(),
                email: "matti@example.org".to_string(),
                phone: None,
                role: Role::User,
            })
            .unwrap();
        storage
    }

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, h, 0, 0).unwrap()
    }

    fn aircraft(reg: &str) -> Aircraft {
        Aircraft::from_stored(reg.to_string())
    }

    fn new_booking(reg: &str, start: DateTime<Utc>, hours: i64) -> NewBooking {
        NewBooking {
            user_id: "u1".to_string(),
            aircraft: aircraft(reg),
            slot: TimeSlot::new(start, start + Duration::hours(hours)).unwrap(),
            flight_type: FlightType::Local,
            title: "Kierros".to_string(),
            description: String::new(),
            repeat_group: None,
        }
    }

    fn contact() -> GuestContact {
        GuestContact {
            name: "Liisa Vieras".to_string(),
            email: "liisa@example.org".to_string(),
            phone: "040 123".to_string(),
        }
    }

    #[test]
    fn test_open_in_memory() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.path(), Path::new(":memory:"));
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_and_get_booking() {
        let storage = create_test_storage();
        let id = storage
            .insert_booking(&new_booking("OH-CON", at(1, 8), 2), false)
            .unwrap();

        let booking = storage.get_booking(id).unwrap().unwrap();
        assert_eq!(booking.id, id);
        assert_eq!(booking.aircraft.as_str(), "OH-CON");
        assert_eq!(booking.slot.start(), at(1, 8));
        assert_eq!(booking.slot.end(), at(1, 10));
        assert_eq!(booking.full_name, "Matti Meikäläinen");
        assert_eq!(booking.flight_type, FlightType::Local);
        assert!(!booking.is_guest);
        assert!(storage.get_booking(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_unknown_owner_rejected_by_foreign_key() {
        let storage = create_test_storage();
        let mut booking = new_booking("OH-CON", at(1, 8), 1);
        booking.user_id = "nobody".to_string();
        let err = storage.insert_booking(&booking, false).unwrap_err();
        assert!(err.is_database());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_overlaps_allowed_without_check() {
        let storage = create_test_storage();
        storage.insert_booking(&new_booking("OH-CON", at(1, 8), 2), false).unwrap();
        storage.insert_booking(&new_booking("OH-CON", at(1, 9), 2), false).unwrap();
        assert_eq!(storage.count().unwrap(), 2);
    }

    #[test]
    fn test_overlap_check_rejects_conflict() {
        let storage = create_test_storage();
        let first = storage.insert_booking(&new_booking("OH-CON", at(1, 8), 2), true).unwrap();

        let err = storage
            .insert_booking(&new_booking("OH-CON", at(1, 9), 2), true)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { existing, .. } if existing == first));

        // Touching and other aircraft are fine.
        storage.insert_booking(&new_booking("OH-CON", at(1, 10), 1), true).unwrap();
        storage.insert_booking(&new_booking("OH-PDX", at(1, 9), 1), true).unwrap();
        assert_eq!(storage.count().unwrap(), 3);
    }

    #[test]
    fn test_series_is_all_or_nothing() {
        let storage = create_test_storage();
        storage.insert_booking(&new_booking("OH-CON", at(3, 8), 1), false).unwrap();

        let group = RepeatGroupId::generate();
        let series: Vec<_> = (1..=3)
            .map(|d| {
                let mut b = new_booking("OH-CON", at(d, 8), 1);
                b.repeat_group = Some(group);
                b
            })
            .collect();

        assert!(storage.insert_series(&series, true).is_err());
        assert_eq!(storage.count().unwrap(), 1);

        let ids = storage.insert_series(&series, false).unwrap();
        assert_eq!(ids.len(), 3);
        let stored = storage.series(group).unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|b| b.repeat_group == Some(group)));
    }

    #[test]
    fn test_delete_series_from() {
        let storage = create_test_storage();
        let group = RepeatGroupId::generate();
        let series: Vec<_> = (1..=4)
            .map(|d| {
                let mut b = new_booking("OH-CON", at(d, 8), 1);
                b.repeat_group = Some(group);
                b
            })
            .collect();
        storage.insert_series(&series, false).unwrap();
        storage.insert_booking(&new_booking("OH-CON", at(5, 8), 1), false).unwrap();

        assert_eq!(storage.delete_series_from(group, at(3, 8)).unwrap(), 2);
        let left: Vec<_> = storage.series(group).unwrap().iter().map(|b| b.slot.start()).collect();
        assert_eq!(left, vec![at(1, 8), at(2, 8)]);
        assert_eq!(storage.count().unwrap(), 3);
    }

    const GUEST_EMAIL: &str = "vieras@example.org";

    fn add_guest_account(storage: &Storage) {
        storage
            .insert_user(&User {
                id: "guest".to_string(),
                full_name: "Vieras".to_string(),
                email: GUEST_EMAIL.to_string(),
                phone: None,
                role: Role::Guest,
            })
            .unwrap();
    }

    #[test]
    fn test_guest_booking_with_contact() {
        let storage = create_test_storage();
        add_guest_account(&storage);
        let id = storage
            .insert_guest_booking(GUEST_EMAIL, &new_booking("OH-CON", at(1, 8), 1), &contact(), false)
            .unwrap();

        let booking = storage.get_booking(id).unwrap().unwrap();
        assert!(booking.is_guest);
        assert_eq!(booking.user_id, "guest");
        assert_eq!(storage.guest_contact(id).unwrap(), Some(contact()));
    }

    #[test]
    fn test_guest_booking_without_guest_account() {
        let storage = create_test_storage();
        let err = storage
            .insert_guest_booking(GUEST_EMAIL, &new_booking("OH-CON", at(1, 8), 1), &contact(), false)
            .unwrap_err();
        assert!(matches!(err, Error::GuestAccountMissing { .. }));
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_contact_deleted_with_booking() {
        let storage = create_test_storage();
        add_guest_account(&storage);
        let id = storage
            .insert_guest_booking(GUEST_EMAIL, &new_booking("OH-CON", at(1, 8), 1), &contact(), false)
            .unwrap();
        assert!(storage.delete_booking(id).unwrap());
        assert!(storage.guest_contact(id).unwrap().is_none());
        let rows: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM guest_bookings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_delete_missing_returns_false() {
        let storage = create_test_storage();
        assert!(!storage.delete_booking(99).unwrap());
    }

    #[test]
    fn test_update_booking() {
        let storage = create_test_storage();
        let id = storage.insert_booking(&new_booking("OH-CON", at(1, 8), 1), false).unwrap();

        let mut changed = new_booking("OH-PDX", at(1, 12), 2);
        changed.title = "Matka".to_string();
        changed.flight_type = FlightType::Trip;
        assert!(storage.update_booking(id, &changed, true).unwrap());

        let booking = storage.get_booking(id).unwrap().unwrap();
        assert_eq!(booking.aircraft.as_str(), "OH-PDX");
        assert_eq!(booking.slot.start(), at(1, 12));
        assert_eq!(booking.title, "Matka");
        assert_eq!(booking.flight_type, FlightType::Trip);

        assert!(!storage.update_booking(id + 100, &changed, false).unwrap());
    }

    #[test]
    fn test_update_does_not_conflict_with_itself() {
        let storage = create_test_storage();
        let id = storage.insert_booking(&new_booking("OH-CON", at(1, 8), 2), true).unwrap();
        let longer = new_booking("OH-CON", at(1, 8), 3);
        assert!(storage.update_booking(id, &longer, true).unwrap());
    }

    #[test]
    fn test_bookings_starting_in_window() {
        let storage = create_test_storage();
        storage.insert_booking(&new_booking("OH-CON", at(1, 22), 4), false).unwrap();
        storage.insert_booking(&new_booking("OH-CON", at(2, 10), 1), false).unwrap();
        storage.insert_booking(&new_booking("OH-CON", at(2, 8), 1), false).unwrap();
        storage.insert_booking(&new_booking("OH-PDX", at(2, 9), 1), false).unwrap();

        let day = TimeSlot::new(at(2, 0), at(3, 0)).unwrap();
        let starts: Vec<_> = storage
            .bookings_starting_in(&aircraft("OH-CON"), &day)
            .unwrap()
            .iter()
            .map(|b| b.slot.start())
            .collect();
        assert_eq!(starts, vec![at(2, 8), at(2, 10)]);

        let overlapping = storage.bookings_overlapping(Some(&aircraft("OH-CON")), &day).unwrap();
        assert_eq!(overlapping.len(), 3);
        assert_eq!(overlapping[0].slot.start(), at(1, 22));

        let all = storage.bookings_overlapping(None, &day).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_bookings_by_user() {
        let storage = create_test_storage();
        add_guest_account(&storage);
        storage.insert_booking(&new_booking("OH-CON", at(2, 8), 1), false).unwrap();
        storage.insert_booking(&new_booking("OH-PDX", at(1, 8), 1), false).unwrap();
        let mut other = new_booking("OH-CON", at(1, 12), 1);
        other.user_id = "guest".to_string();
        storage.insert_booking(&other, false).unwrap();

        let mine: Vec<_> = storage
            .bookings_by_user("u1")
            .unwrap()
            .iter()
            .map(|b| b.slot.start())
            .collect();
        assert_eq!(mine, vec![at(1, 8), at(2, 8)]);
        assert!(storage.bookings_by_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_find_guest_account_requires_guest_role() {
        let storage = create_test_storage();
        assert!(storage.find_guest_account("matti@example.org").unwrap().is_none());

        storage
            .insert_user(&User {
                id: "guest".to_string(),
                full_name: "Vieras".to_string(),
                email: "vieras@example.org".to_string(),
                phone: None,
                role: Role::Guest,
            })
            .unwrap();
        let guest = storage.find_guest_account("vieras@example.org").unwrap().unwrap();
        assert_eq!(guest.id, "guest");
        assert_eq!(guest.role, Role::Guest);
        assert_eq!(storage.get_user("guest").unwrap(), Some(guest));
    }

    #[test]
    fn test_duplicate_user_email_rejected() {
        let storage = create_test_storage();
        let err = storage
            .insert_user(&User {
                id: "u2".to_string(),
                full_name: "Toinen".to_string(),
                email: "matti@example.org".to_string(),
                phone: None,
                role: Role::User,
            })
            .unwrap_err();
        assert!(err.is_database());
    }

    #[test]
    fn test_open_file_database() {
        let dir = std::env::temp_dir().join(format!("aerobook-test-{}", std::process::id()));
        let path = dir.join("nested").join("bookings.db");
        {
            let storage = Storage::open(&path).unwrap();
            assert_eq!(storage.path(), path.as_path());
        }
        assert!(path.exists());
        let reopened = Storage::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 0);
        drop(reopened);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
