use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::types::{
    BookingStatus, PaymentMethod, ServiceId, TypeConstraintError,
};
use crate::forms::normalize_optional;

/// Accepted datetime layouts: `datetime-local` inputs and the plain form.
const BOOKING_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

fn parse_booking_time(value: &str) -> Result<NaiveDateTime, CreateBookingFormError> {
    let trimmed = value.trim();
    for format in BOOKING_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    Err(CreateBookingFormError::InvalidTime(trimmed.to_string()))
}

#[derive(Deserialize, Validate)]
pub struct CreateBookingForm {
    #[validate(range(min = 1))]
    pub service_id: i32,
    #[validate(length(min = 1))]
    pub booking_time: String,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateBookingFormPayload {
    pub service_id: ServiceId,
    pub booking_time: NaiveDateTime,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Error)]
pub enum CreateBookingFormError {
    #[error("Booking form validation failed: {0}")]
    Validation(String),
    #[error("Booking form contains invalid data: {0}")]
    TypeConstraint(String),
    #[error("Unrecognized booking time: {0}")]
    InvalidTime(String),
}

impl From<ValidationErrors> for CreateBookingFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for CreateBookingFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<CreateBookingForm> for CreateBookingFormPayload {
    type Error = CreateBookingFormError;

    fn try_from(value: CreateBookingForm) -> Result<Self, Self::Error> {
        value.validate()?;

        let payment_method = match value.payment_method.as_deref() {
            None | Some("") => PaymentMethod::Cash,
            Some(raw) => PaymentMethod::try_from(raw)?,
        };

        Ok(Self {
            service_id: ServiceId::new(value.service_id)?,
            booking_time: parse_booking_time(&value.booking_time)?,
            notes: normalize_optional(value.notes),
            payment_method,
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct RejectBookingForm {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectBookingFormPayload {
    pub reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum RejectBookingFormError {
    #[error("Reject form validation failed: {0}")]
    Validation(String),
}

impl From<ValidationErrors> for RejectBookingFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl TryFrom<RejectBookingForm> for RejectBookingFormPayload {
    type Error = RejectBookingFormError;

    fn try_from(value: RejectBookingForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            reason: normalize_optional(value.reason),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct UpdateBookingStatusForm {
    #[validate(length(min = 1))]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBookingStatusFormPayload {
    pub status: BookingStatus,
}

#[derive(Debug, Error)]
pub enum UpdateBookingStatusFormError {
    #[error("Status form validation failed: {0}")]
    Validation(String),
    #[error("Status form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for UpdateBookingStatusFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for UpdateBookingStatusFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<UpdateBookingStatusForm> for UpdateBookingStatusFormPayload {
    type Error = UpdateBookingStatusFormError;

    fn try_from(value: UpdateBookingStatusForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            status: BookingStatus::try_from(value.status)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_datetime_local_input() {
        let form = CreateBookingForm {
            service_id: 3,
            booking_time: "2025-06-02T10:30".to_string(),
            notes: Some(" ".to_string()),
            payment_method: None,
        };
        let payload: CreateBookingFormPayload = form.try_into().unwrap();
        assert_eq!(payload.service_id.get(), 3);
        assert_eq!(
            payload.booking_time.format("%Y-%m-%d %H:%M").to_string(),
            "2025-06-02 10:30"
        );
        assert_eq!(payload.payment_method, PaymentMethod::Cash);
        assert!(payload.notes.is_none());
    }

    #[test]
    fn rejects_unparseable_times() {
        let form = CreateBookingForm {
            service_id: 3,
            booking_time: "next tuesday".to_string(),
            notes: None,
            payment_method: None,
        };
        let err = CreateBookingFormPayload::try_from(form).unwrap_err();
        assert!(matches!(err, CreateBookingFormError::InvalidTime(_)));
    }

    #[test]
    fn parses_status_updates() {
        let form = UpdateBookingStatusForm {
            status: "accepted".to_string(),
        };
        let payload: UpdateBookingStatusFormPayload = form.try_into().unwrap();
        assert_eq!(payload.status, BookingStatus::Accepted);

        let form = UpdateBookingStatusForm {
            status: "on-hold".to_string(),
        };
        assert!(UpdateBookingStatusFormPayload::try_from(form).is_err());
    }
}
