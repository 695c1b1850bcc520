//! Guest bookings.
//!
//! Visitors book under one shared guest account. Their contact details are
//! stored next to the booking and are visible to admins only.

use tracing::info;

use super::{logged, BookingService};
use crate::access::{Actor, Permission};
use crate::error::Result;
use crate::model::{BookingId, BookingRequest, GuestContact};

impl BookingService {
    /// Book on behalf of a visitor.
    ///
    /// The booking is owned by the configured guest account and its title
    /// becomes `"{title} ({contact name})"`. All input is checked before the
    /// database is touched; the guest account lookup, the booking and the
    /// contact record then share one transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input and
    /// [`crate::Error::GuestAccountMissing`] if the guest account does not exist.
    pub fn add_guest_booking(
        &self,
        request: &BookingRequest,
        contact: &GuestContact,
    ) -> Result<BookingId> {
        self.rules.contact(contact)?;
        let email = &self.config.guest.account_email;
        // Owner is a placeholder until storage resolves the guest account.
        let mut booking = self.rules.booking(email, request)?;
        booking.title = self.rules.guest_title(&booking.title, &contact.name)?;

        let contact = GuestContact {
            name: contact.name.trim().to_string(),
            email: contact.email.trim().to_string(),
            phone: contact.phone.trim().to_string(),
        };
        let id = logged(
            "add_guest_booking",
            self.storage
                .insert_guest_booking(email, &booking, &contact, self.check_overlap()),
        )?;
        info!("Guest booking {} created on {} at {}", id, booking.aircraft, booking.slot);
        Ok(id)
    }

    /// Contact details of a guest booking, `None` for member bookings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PermissionDenied`] unless `actor` is an admin, and
    /// [`crate::Error::NotFound`] for a missing booking.
    pub fn guest_contact(&self, id: BookingId, actor: &Actor) -> Result<Option<GuestContact>> {
        actor.require(Permission::ViewBookingContactInfo)?;
        let booking = self.booking(id)?;
        if !booking.is_guest {
            return Ok(None);
        }
        logged("guest_contact", self.storage.guest_contact(id))
    }
}
