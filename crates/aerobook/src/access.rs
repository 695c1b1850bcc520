//! Role-based access rules.
//!
//! Every mutating service call takes an [`Actor`]: the authenticated user
//! on whose behalf the call is made. Authentication itself happens outside
//! this crate.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Club administrator.
    Admin,
    /// Club member.
    User,
    /// Shared guest account.
    Guest,
}

impl Role {
    /// Stored name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }

    /// Name shown in the member UI.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Admin => "Järjestelmänvalvoja",
            Self::User => "Käyttäjä",
            Self::Guest => "Vieras",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            other => Err(Error::invalid_field("role", format!("unknown role {other:?}"))),
        }
    }
}

/// Things a role may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Create a booking owned by oneself.
    CreateOwnBooking,
    /// Read one's own bookings.
    ViewOwnBooking,
    /// Change one's own bookings.
    EditOwnBooking,
    /// Delete one's own bookings.
    DeleteOwnBooking,
    /// Read everyone's bookings.
    ViewAllBookings,
    /// Change anyone's bookings.
    EditAnyBooking,
    /// Delete anyone's bookings.
    DeleteAnyBooking,
    /// Read the contact details of guest bookings.
    ViewBookingContactInfo,
}

impl Permission {
    fn roles(self) -> &'static [Role] {
        use Role::{Admin, Guest, User};
        match self {
            Self::CreateOwnBooking | Self::ViewOwnBooking => &[Admin, User, Guest],
            Self::EditOwnBooking | Self::DeleteOwnBooking => &[Admin, User],
            Self::ViewAllBookings
            | Self::EditAnyBooking
            | Self::DeleteAnyBooking
            | Self::ViewBookingContactInfo => &[Admin],
        }
    }
}

/// Returns true if `role` holds `permission`.
#[must_use]
pub fn has_permission(role: Role, permission: Permission) -> bool {
    permission.roles().contains(&role)
}

/// The user a service call acts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Account id.
    pub user_id: String,
    /// Account role.
    pub role: Role,
}

impl Actor {
    /// Actor with an explicit role.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// A club member.
    #[must_use]
    pub fn member(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::User)
    }

    /// A club administrator.
    #[must_use]
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Admin)
    }

    /// Returns true if the actor holds `permission`.
    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        has_permission(self.role, permission)
    }

    /// Fail with [`Error::PermissionDenied`] unless the actor holds `permission`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] if the role lacks the permission.
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(Error::permission_denied(format!(
                "{} may not {permission:?}",
                self.role
            )))
        }
    }

    /// Pick the permission that covers a booking owned by `owner_id`.
    fn own_or_any(&self, owner_id: &str, own: Permission, any: Permission) -> Permission {
        if self.user_id == owner_id {
            own
        } else {
            any
        }
    }

    /// Require the right to list bookings owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] if the role lacks it.
    pub fn require_view(&self, owner_id: &str) -> Result<()> {
        self.require(self.own_or_any(
            owner_id,
            Permission::ViewOwnBooking,
            Permission::ViewAllBookings,
        ))
    }

    /// Returns true if the actor may change a booking owned by `owner_id`.
    #[must_use]
    pub fn can_edit_booking(&self, owner_id: &str) -> bool {
        self.can(self.own_or_any(
            owner_id,
            Permission::EditOwnBooking,
            Permission::EditAnyBooking,
        ))
    }

    /// Require the right to delete a booking owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] if the role lacks it.
    pub fn require_delete(&self, owner_id: &str) -> Result<()> {
        self.require(self.own_or_any(
            owner_id,
            Permission::DeleteOwnBooking,
            Permission::DeleteAnyBooking,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        for role in [Role::Admin, Role::User, Role::Guest] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::Guest.display_name(), "Vieras");
    }

    #[test]
    fn test_permission_table() {
        assert!(has_permission(Role::Guest, Permission::CreateOwnBooking));
        assert!(!has_permission(Role::Guest, Permission::EditOwnBooking));
        assert!(!has_permission(Role::Guest, Permission::DeleteOwnBooking));
        assert!(has_permission(Role::User, Permission::DeleteOwnBooking));
        assert!(!has_permission(Role::User, Permission::DeleteAnyBooking));
        assert!(!has_permission(Role::User, Permission::ViewBookingContactInfo));
        assert!(has_permission(Role::Admin, Permission::ViewBookingContactInfo));
    }

    #[test]
    fn test_edit_rights_follow_permission_table() {
        assert!(Actor::admin("a").can_edit_booking("someone"));
        assert!(Actor::member("u1").can_edit_booking("u1"));
        assert!(!Actor::member("u1").can_edit_booking("u2"));
        // Guests may create but never change, not even their own.
        assert!(!Actor::new("g", Role::Guest).can_edit_booking("g"));
    }

    #[test]
    fn test_delete_rights_follow_permission_table() {
        assert!(Actor::admin("a").require_delete("someone").is_ok());
        assert!(Actor::member("u1").require_delete("u1").is_ok());
        assert!(matches!(
            Actor::member("u1").require_delete("u2"),
            Err(Error::PermissionDenied(_))
        ));
        assert!(Actor::new("g", Role::Guest).require_delete("g").is_err());
    }

    #[test]
    fn test_view_rights() {
        assert!(Actor::new("g", Role::Guest).require_view("g").is_ok());
        assert!(Actor::member("u1").require_view("u1").is_ok());
        assert!(Actor::member("u1").require_view("u2").is_err());
        assert!(Actor::admin("a").require_view("u2").is_ok());
    }

    #[test]
    fn test_require() {
        let member = Actor::member("u1");
        assert!(member.require(Permission::CreateOwnBooking).is_ok());
        let err = member.require(Permission::ViewBookingContactInfo).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }
}
