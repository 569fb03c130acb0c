use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    BusinessId, BusinessName, CategorySlug, CityName, DistrictName, EmailAddress, ImageUrl,
    PhoneNumber, StreetAddress, UserId,
};

/// Service-provider entity owned by a user and placed in a category.
///
/// The owner link is optional so that admin-registered businesses without a
/// user account can exist; `owner_name` carries a free-text contact instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub owner_id: Option<UserId>,
    pub owner_name: Option<String>,
    pub name: BusinessName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub street_house: StreetAddress,
    pub city: CityName,
    pub district: DistrictName,
    pub description: Option<String>,
    pub profile_pic_url: Option<ImageUrl>,
    pub gallery: Vec<ImageUrl>,
    pub category: CategorySlug,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Business {
    /// Comma-joined display address.
    pub fn address(&self) -> String {
        format!("{}, {}, {}", self.street_house, self.city, self.district)
    }
}

/// Data required to insert a new [`Business`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewBusiness {
    pub owner_id: Option<UserId>,
    pub owner_name: Option<String>,
    pub name: BusinessName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub street_house: StreetAddress,
    pub city: CityName,
    pub district: DistrictName,
    pub description: Option<String>,
    pub category: CategorySlug,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Mutable fields of an existing business.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessUpdate {
    pub name: BusinessName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub street_house: StreetAddress,
    pub city: CityName,
    pub district: DistrictName,
    pub description: Option<String>,
    pub category: CategorySlug,
    pub profile_pic_url: Option<ImageUrl>,
}
