//! Repeating bookings.

use serde::Serialize;
use tracing::info;

use super::{logged, BookingService};
use crate::access::{Actor, Permission};
use crate::error::Result;
use crate::model::{BookingId, BookingRequest, NewBooking, RepeatGroupId};
use crate::repeat;

/// Result of creating a repeat series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    /// Id shared by every booking of the series.
    pub group: RepeatGroupId,
    /// Booking ids in date order.
    pub ids: Vec<BookingId>,
}

impl BookingService {
    /// Book the same local time slot every day from the request's start
    /// date through `until`, inclusive.
    ///
    /// The series is written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad request, an `until` before the
    /// start date or a series that is too long, [`crate::Error::Conflict`]
    /// when overlaps are disallowed, or a database error.
    pub fn add_repeating_bookings(
        &self,
        request: &BookingRequest,
        until: &str,
        actor: &Actor,
    ) -> Result<Series> {
        actor.require(Permission::CreateOwnBooking)?;
        let template = self.rules.booking(&actor.user_id, request)?;
        let until = self.rules.date(until)?;
        let slots = repeat::expand_daily(
            &template.slot,
            until,
            self.rules.offset(),
            self.rules.max_repeat_days(),
        )?;

        let group = RepeatGroupId::generate();
        let bookings: Vec<NewBooking> = slots
            .into_iter()
            .map(|slot| NewBooking {
                slot,
                repeat_group: Some(group),
                ..template.clone()
            })
            .collect();

        let ids = logged(
            "add_repeating_bookings",
            self.storage.insert_series(&bookings, self.check_overlap()),
        )?;
        info!(
            "Series {} of {} bookings created on {} by {}",
            group,
            ids.len(),
            template.aircraft,
            actor.user_id
        );
        Ok(Series { group, ids })
    }
}
