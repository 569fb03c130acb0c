use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::booking::{Booking as DomainBooking, NewBooking as DomainNewBooking};
use crate::domain::types::{DurationMinutes, Price, TypeConstraintError};

/// Diesel model representing the `bookings` table.
///
/// Transition timestamps are typed nullable columns; the repository stamps
/// the matching column on every status change.
#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct Booking {
    pub id: i32,
    pub business_id: i32,
    pub service_id: i32,
    pub customer_id: i32,
    pub booking_time: NaiveDateTime,
    pub duration_minutes: i32,
    pub price: f64,
    pub status: String,
    pub payment_method: String,
    pub payment_received: bool,
    pub payment_received_at: Option<NaiveDateTime>,
    pub payment_received_by: Option<i32>,
    pub notes: Option<String>,
    pub requested_at: Option<NaiveDateTime>,
    pub accepted_at: Option<NaiveDateTime>,
    pub rejected_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Booking`]. New bookings always start `requested`.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct NewBooking {
    pub business_id: i32,
    pub service_id: i32,
    pub customer_id: i32,
    pub booking_time: NaiveDateTime,
    pub duration_minutes: i32,
    pub price: f64,
    pub status: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub requested_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Booking> for DomainBooking {
    type Error = TypeConstraintError;

    fn try_from(booking: Booking) -> Result<Self, Self::Error> {
        Ok(Self {
            id: booking.id.try_into()?,
            business_id: booking.business_id.try_into()?,
            service_id: booking.service_id.try_into()?,
            customer_id: booking.customer_id.try_into()?,
            booking_time: booking.booking_time,
            duration_minutes: DurationMinutes::new(booking.duration_minutes)?,
            price: Price::new(booking.price)?,
            status: booking.status.try_into()?,
            payment_method: booking.payment_method.try_into()?,
            payment_received: booking.payment_received,
            payment_received_at: booking.payment_received_at,
            payment_received_by: booking
                .payment_received_by
                .map(TryInto::try_into)
                .transpose()?,
            notes: booking.notes,
            requested_at: booking.requested_at,
            accepted_at: booking.accepted_at,
            rejected_at: booking.rejected_at,
            cancelled_at: booking.cancelled_at,
            completed_at: booking.completed_at,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        })
    }
}

impl From<DomainNewBooking> for NewBooking {
    fn from(booking: DomainNewBooking) -> Self {
        Self {
            business_id: booking.business_id.get(),
            service_id: booking.service_id.get(),
            customer_id: booking.customer_id.get(),
            booking_time: booking.booking_time,
            duration_minutes: booking.duration_minutes.get(),
            price: booking.price.get(),
            status: crate::domain::types::BookingStatus::Requested
                .as_str()
                .to_string(),
            payment_method: booking.payment_method.as_str().to_string(),
            notes: booking.notes,
            requested_at: Some(booking.created_at),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}
