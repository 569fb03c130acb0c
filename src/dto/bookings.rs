use serde::Serialize;

use crate::domain::booking::Booking;

/// Booking row shown on customer, owner and admin pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDto {
    pub id: i32,
    pub business_id: i32,
    pub business_name: String,
    pub service_name: String,
    pub customer_name: String,
    pub booking_time: String,
    pub duration_minutes: i32,
    pub price: f64,
    pub status: String,
    pub payment_method: String,
    pub payment_received: bool,
    pub notes: String,
}

impl BookingDto {
    pub fn new(
        booking: &Booking,
        business_name: &str,
        service_name: &str,
        customer_name: &str,
    ) -> Self {
        Self {
            id: booking.id.get(),
            business_id: booking.business_id.get(),
            business_name: business_name.to_string(),
            service_name: service_name.to_string(),
            customer_name: customer_name.to_string(),
            booking_time: booking.booking_time.format("%Y-%m-%d %H:%M").to_string(),
            duration_minutes: booking.duration_minutes.get(),
            price: booking.price.get(),
            status: booking.status.as_str().to_string(),
            payment_method: booking.payment_method.as_str().to_string(),
            payment_received: booking.payment_received,
            notes: booking.notes.clone().unwrap_or_default(),
        }
    }
}
