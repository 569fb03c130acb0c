use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{BusinessId, DurationMinutes, Price, ServiceId, ServiceName};

/// A bookable offering belonging to a business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub business_id: BusinessId,
    pub name: ServiceName,
    pub description: Option<String>,
    pub price: Price,
    pub duration_minutes: DurationMinutes,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Data required to insert a new [`Service`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewService {
    pub business_id: BusinessId,
    pub name: ServiceName,
    pub description: Option<String>,
    pub price: Price,
    pub duration_minutes: DurationMinutes,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Mutable fields of an existing service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceUpdate {
    pub name: ServiceName,
    pub description: Option<String>,
    pub price: Price,
    pub duration_minutes: DurationMinutes,
}
