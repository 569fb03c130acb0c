use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::service::{NewService as DomainNewService, Service as DomainService};
use crate::domain::types::{DurationMinutes, Price, ServiceName, TypeConstraintError};

/// Diesel model representing the `services` table.
#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::services)]
pub struct Service {
    pub id: i32,
    pub business_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Service`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::services)]
pub struct NewService {
    pub business_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Service> for DomainService {
    type Error = TypeConstraintError;

    fn try_from(service: Service) -> Result<Self, Self::Error> {
        Ok(Self {
            id: service.id.try_into()?,
            business_id: service.business_id.try_into()?,
            name: ServiceName::new(service.name)?,
            description: service.description,
            price: Price::new(service.price)?,
            duration_minutes: DurationMinutes::new(service.duration_minutes)?,
            is_active: service.is_active,
            created_at: service.created_at,
            updated_at: service.updated_at,
        })
    }
}

impl From<DomainNewService> for NewService {
    fn from(service: DomainNewService) -> Self {
        Self {
            business_id: service.business_id.get(),
            name: service.name.into_inner(),
            description: service.description,
            price: service.price.get(),
            duration_minutes: service.duration_minutes.get(),
            created_at: service.created_at,
            updated_at: service.updated_at,
        }
    }
}
