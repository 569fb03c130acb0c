use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    BookingId, BookingStatus, BusinessId, DurationMinutes, PaymentMethod, Price, ServiceId, UserId,
};

/// First bookable hour of a business day.
pub const OPENING_HOUR: u32 = 9;
/// Hour after the last bookable slot.
pub const CLOSING_HOUR: u32 = 18;

/// Reservation of a service at a time slot, tracked through a status
/// lifecycle. Price and duration are copied from the service at creation and
/// never re-read afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub business_id: BusinessId,
    pub service_id: ServiceId,
    pub customer_id: UserId,
    pub booking_time: NaiveDateTime,
    pub duration_minutes: DurationMinutes,
    pub price: Price,
    pub status: BookingStatus,
    pub payment_method: PaymentMethod,
    pub payment_received: bool,
    pub payment_received_at: Option<NaiveDateTime>,
    pub payment_received_by: Option<UserId>,
    pub notes: Option<String>,
    pub requested_at: Option<NaiveDateTime>,
    pub accepted_at: Option<NaiveDateTime>,
    pub rejected_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// End of the reserved interval.
    pub fn end_time(&self) -> NaiveDateTime {
        self.booking_time + Duration::minutes(self.duration_minutes.get() as i64)
    }

    /// Whether this booking still occupies its time slot.
    pub fn blocks_slot(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Half-open interval overlap against `[start, end)`.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.booking_time < end && start < self.end_time()
    }
}

/// Data required to insert a new [`Booking`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub business_id: BusinessId,
    pub service_id: ServiceId,
    pub customer_id: UserId,
    pub booking_time: NaiveDateTime,
    pub duration_minutes: DurationMinutes,
    pub price: Price,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Hourly start times still free on `date` for a slot of `duration`.
///
/// The grid runs over business hours; a slot is taken when any booking that
/// still blocks its slot overlaps the candidate interval.
pub fn available_slots(
    date: NaiveDate,
    duration: DurationMinutes,
    bookings: &[Booking],
) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    for hour in OPENING_HOUR..CLOSING_HOUR {
        let start_time = match NaiveTime::from_hms_opt(hour, 0, 0) {
            Some(time) => time,
            None => continue,
        };
        let start = date.and_time(start_time);
        let end = start + Duration::minutes(duration.get() as i64);
        let taken = bookings
            .iter()
            .any(|booking| booking.blocks_slot() && booking.overlaps(start, end));
        if !taken {
            slots.push(start_time);
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_booking(hour: u32, minutes: i32, status: BookingStatus) -> Booking {
        let time = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Booking {
            id: BookingId::new(1).unwrap(),
            business_id: BusinessId::new(1).unwrap(),
            service_id: ServiceId::new(1).unwrap(),
            customer_id: UserId::new(1).unwrap(),
            booking_time: time,
            duration_minutes: DurationMinutes::new(minutes).unwrap(),
            price: Price::new(40.0).unwrap(),
            status,
            payment_method: PaymentMethod::Cash,
            payment_received: false,
            payment_received_at: None,
            payment_received_by: None,
            notes: None,
            requested_at: Some(time),
            accepted_at: None,
            rejected_at: None,
            cancelled_at: None,
            completed_at: None,
            created_at: time,
            updated_at: time,
        }
    }

    #[test]
    fn overlap_is_half_open() {
        let booking = sample_booking(10, 60, BookingStatus::Requested);
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        // Touching intervals do not overlap.
        assert!(!booking.overlaps(
            date.and_hms_opt(11, 0, 0).unwrap(),
            date.and_hms_opt(12, 0, 0).unwrap()
        ));
        assert!(!booking.overlaps(
            date.and_hms_opt(9, 0, 0).unwrap(),
            date.and_hms_opt(10, 0, 0).unwrap()
        ));
        // Any shared minute does.
        assert!(booking.overlaps(
            date.and_hms_opt(10, 30, 0).unwrap(),
            date.and_hms_opt(11, 30, 0).unwrap()
        ));
        assert!(booking.overlaps(
            date.and_hms_opt(9, 30, 0).unwrap(),
            date.and_hms_opt(10, 30, 0).unwrap()
        ));
    }

    #[test]
    fn terminal_bookings_release_their_slot() {
        assert!(sample_booking(10, 60, BookingStatus::Accepted).blocks_slot());
        assert!(sample_booking(10, 60, BookingStatus::Requested).blocks_slot());
        assert!(!sample_booking(10, 60, BookingStatus::Cancelled).blocks_slot());
        assert!(!sample_booking(10, 60, BookingStatus::Rejected).blocks_slot());
        assert!(!sample_booking(10, 60, BookingStatus::Completed).blocks_slot());
    }

    #[test]
    fn slots_exclude_blocked_hours() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let bookings = vec![
            sample_booking(10, 60, BookingStatus::Accepted),
            sample_booking(14, 90, BookingStatus::Requested),
            sample_booking(16, 60, BookingStatus::Cancelled),
        ];

        let slots = available_slots(date, DurationMinutes::new(60).unwrap(), &bookings);
        let hours: Vec<u32> = slots.iter().map(|t| chrono::Timelike::hour(t)).collect();

        assert!(!hours.contains(&10));
        // The 90-minute booking at 14:00 blocks both the 14:00 and 15:00 grid slots.
        assert!(!hours.contains(&14));
        assert!(!hours.contains(&15));
        // Cancelled bookings free their hour.
        assert!(hours.contains(&16));
        assert!(hours.contains(&9));
        assert!(hours.contains(&17));
    }

    #[test]
    fn longer_durations_block_trailing_slots() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let bookings = vec![sample_booking(11, 60, BookingStatus::Accepted)];

        // A two-hour slot starting at 10:00 would run into the 11:00 booking.
        let slots = available_slots(date, DurationMinutes::new(120).unwrap(), &bookings);
        let hours: Vec<u32> = slots.iter().map(|t| chrono::Timelike::hour(t)).collect();
        assert!(!hours.contains(&10));
        assert!(!hours.contains(&11));
        assert!(hours.contains(&9));
        assert!(hours.contains(&12));
    }
}
