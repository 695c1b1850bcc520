//! `SQLite` schema definitions for aerobook.
//!
//! These statements create the base (version 1) schema. Later changes are
//! applied by [`super::migrations`].

/// Accounts bookings are owned by.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user', 'guest')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Aircraft bookings. Times are RFC 3339 UTC text, so string order is
/// time order.
pub const CREATE_BOOKINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS bookings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES users(id),
    plane TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    type TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (end_time > start_time)
)
";

/// Per-aircraft time lookups.
pub const CREATE_PLANE_START_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_bookings_plane_start ON bookings(plane, start_time)
";

/// Owner lookups.
pub const CREATE_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id)
";

/// Contact details for bookings made through the guest account.
pub const CREATE_GUEST_BOOKINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS guest_bookings (
    booking_id INTEGER PRIMARY KEY REFERENCES bookings(id) ON DELETE CASCADE,
    contact_name TEXT NOT NULL,
    contact_email TEXT NOT NULL,
    contact_phone TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Key-value pairs, including the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_BOOKINGS_TABLE,
    CREATE_PLANE_START_INDEX,
    CREATE_USER_INDEX,
    CREATE_GUEST_BOOKINGS_TABLE,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_bookings_table_rejects_empty_intervals() {
        assert!(CREATE_BOOKINGS_TABLE.contains("CHECK (end_time > start_time)"));
        assert!(CREATE_BOOKINGS_TABLE.contains("user_id TEXT NOT NULL REFERENCES users(id)"));
    }

    #[test]
    fn test_guest_contact_cascades() {
        assert!(CREATE_GUEST_BOOKINGS_TABLE.contains("ON DELETE CASCADE"));
    }
}
