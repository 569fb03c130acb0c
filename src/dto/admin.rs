use serde::Serialize;

use crate::repository::{BookingCounts, BusinessCounts, UserCounts};

/// Aggregate counters shown on the admin dashboard and `/api/v1/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub users: UserCounts,
    pub businesses: BusinessCounts,
    pub bookings: BookingCounts,
}
