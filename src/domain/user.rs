use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    CityName, DistrictName, EmailAddress, ImageUrl, PhoneNumber, StreetAddress, UserId, UserName,
    UserRole,
};

/// Registered account. Passwords are stored as argon2 PHC strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: EmailAddress,
    pub phone: Option<PhoneNumber>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub street_house: StreetAddress,
    pub city: CityName,
    pub district: DistrictName,
    pub profile_pic_url: Option<ImageUrl>,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Data required to insert a new [`User`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: UserName,
    pub email: EmailAddress,
    pub phone: Option<PhoneNumber>,
    pub password_hash: String,
    pub street_house: StreetAddress,
    pub city: CityName,
    pub district: DistrictName,
    pub role: UserRole,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Mutable profile fields a user may change about themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfileUpdate {
    pub name: UserName,
    pub phone: Option<PhoneNumber>,
    pub street_house: StreetAddress,
    pub city: CityName,
    pub district: DistrictName,
    pub profile_pic_url: Option<ImageUrl>,
}
