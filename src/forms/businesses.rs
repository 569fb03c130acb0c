use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::business::{BusinessUpdate, NewBusiness};
use crate::domain::service::{NewService, ServiceUpdate};
use crate::domain::types::{
    BusinessId, BusinessName, CategorySlug, CityName, DistrictName, DurationMinutes, EmailAddress,
    ImageUrl, PhoneNumber, Price, ServiceName, StreetAddress, TypeConstraintError, UserId,
};
use crate::forms::normalize_optional;

#[derive(Deserialize, Validate)]
pub struct BusinessForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub street_house: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub district: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub category: String,
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusinessFormPayload {
    pub name: BusinessName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub street_house: StreetAddress,
    pub city: CityName,
    pub district: DistrictName,
    pub description: Option<String>,
    pub category: CategorySlug,
    pub owner_name: Option<String>,
}

impl BusinessFormPayload {
    pub fn into_new_business(self, owner_id: Option<UserId>) -> NewBusiness {
        let now = Utc::now().naive_utc();
        NewBusiness {
            owner_id,
            owner_name: self.owner_name,
            name: self.name,
            email: self.email,
            phone: self.phone,
            street_house: self.street_house,
            city: self.city,
            district: self.district,
            description: self.description,
            category: self.category,
            created_at: now,
            updated_at: now,
        }
    }

    /// The profile picture is changed through a separate upload, so updates
    /// carry the currently stored URL through.
    pub fn into_business_update(self, profile_pic_url: Option<ImageUrl>) -> BusinessUpdate {
        BusinessUpdate {
            name: self.name,
            email: self.email,
            phone: self.phone,
            street_house: self.street_house,
            city: self.city,
            district: self.district,
            description: self.description,
            category: self.category,
            profile_pic_url,
        }
    }
}

#[derive(Debug, Error)]
pub enum BusinessFormError {
    #[error("Business form validation failed: {0}")]
    Validation(String),
    #[error("Business form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for BusinessFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for BusinessFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<BusinessForm> for BusinessFormPayload {
    type Error = BusinessFormError;

    fn try_from(value: BusinessForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            name: BusinessName::new(value.name)?,
            email: EmailAddress::new(value.email)?,
            phone: PhoneNumber::new(value.phone)?,
            street_house: StreetAddress::new(value.street_house)?,
            city: CityName::new(value.city)?,
            district: DistrictName::new(value.district)?,
            description: normalize_optional(value.description),
            category: CategorySlug::new(value.category)?,
            owner_name: normalize_optional(value.owner_name),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct ServiceForm {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceFormPayload {
    pub name: ServiceName,
    pub description: Option<String>,
    pub price: Price,
    pub duration_minutes: DurationMinutes,
}

impl ServiceFormPayload {
    pub fn into_new_service(self, business_id: BusinessId) -> NewService {
        let now = Utc::now().naive_utc();
        NewService {
            business_id,
            name: self.name,
            description: self.description,
            price: self.price,
            duration_minutes: self.duration_minutes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_service_update(self) -> ServiceUpdate {
        ServiceUpdate {
            name: self.name,
            description: self.description,
            price: self.price,
            duration_minutes: self.duration_minutes,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceFormError {
    #[error("Service form validation failed: {0}")]
    Validation(String),
    #[error("Service form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for ServiceFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for ServiceFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<ServiceForm> for ServiceFormPayload {
    type Error = ServiceFormError;

    fn try_from(value: ServiceForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            name: ServiceName::new(value.name)?,
            description: normalize_optional(value.description),
            price: Price::new(value.price)?,
            duration_minutes: DurationMinutes::new(value.duration_minutes)?,
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct DeleteGalleryImageForm {
    #[validate(url)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteGalleryImageFormPayload {
    pub url: ImageUrl,
}

#[derive(Debug, Error)]
pub enum DeleteGalleryImageFormError {
    #[error("Gallery form validation failed: {0}")]
    Validation(String),
    #[error("Gallery form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for DeleteGalleryImageFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for DeleteGalleryImageFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<DeleteGalleryImageForm> for DeleteGalleryImageFormPayload {
    type Error = DeleteGalleryImageFormError;

    fn try_from(value: DeleteGalleryImageForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            url: ImageUrl::new(value.url)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business_form() -> BusinessForm {
        BusinessForm {
            name: " Smith Plumbing ".to_string(),
            email: "smith@plumbing.com".to_string(),
            phone: "555-1234".to_string(),
            street_house: "2 Pipe Rd".to_string(),
            city: "Springfield".to_string(),
            district: "North".to_string(),
            description: Some("  ".to_string()),
            category: "Plumbing".to_string(),
            owner_name: None,
        }
    }

    #[test]
    fn business_form_normalizes_fields() {
        let payload: BusinessFormPayload = business_form().try_into().unwrap();
        assert_eq!(payload.name.as_str(), "Smith Plumbing");
        assert_eq!(payload.category.as_str(), "plumbing");
        assert!(payload.description.is_none());
    }

    #[test]
    fn service_form_rejects_zero_duration() {
        let form = ServiceForm {
            name: "Drain cleaning".to_string(),
            description: None,
            price: 25.0,
            duration_minutes: 0,
        };
        assert!(ServiceFormPayload::try_from(form).is_err());
    }

    #[test]
    fn service_form_allows_free_services() {
        let form = ServiceForm {
            name: "Estimate visit".to_string(),
            description: Some("Free on-site estimate".to_string()),
            price: 0.0,
            duration_minutes: 30,
        };
        let payload = ServiceFormPayload::try_from(form).unwrap();
        assert_eq!(payload.price.get(), 0.0);
    }
}
