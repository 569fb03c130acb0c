use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{
    CityName, DistrictName, EmailAddress, ImageUrl, PhoneNumber, StreetAddress, TypeConstraintError,
    UserName,
};
use crate::domain::user::{NewUser as DomainNewUser, User as DomainUser};

/// Diesel model representing the `users` table.
#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub street_house: String,
    pub city: String,
    pub district: String,
    pub profile_pic_url: Option<String>,
    pub role: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`User`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub street_house: String,
    pub city: String,
    pub district: String,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<User> for DomainUser {
    type Error = TypeConstraintError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: user.id.try_into()?,
            name: UserName::new(user.name)?,
            email: EmailAddress::new(user.email)?,
            phone: user.phone.map(PhoneNumber::new).transpose()?,
            password_hash: user.password_hash,
            street_house: StreetAddress::new(user.street_house)?,
            city: CityName::new(user.city)?,
            district: DistrictName::new(user.district)?,
            profile_pic_url: user.profile_pic_url.map(ImageUrl::new).transpose()?,
            role: user.role.try_into()?,
            is_verified: user.is_verified,
            is_active: user.is_active,
            reset_token: user.reset_token,
            reset_token_expires: user.reset_token_expires,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }
}

impl From<DomainNewUser> for NewUser {
    fn from(user: DomainNewUser) -> Self {
        Self {
            name: user.name.into_inner(),
            email: user.email.into_inner(),
            phone: user.phone.map(PhoneNumber::into_inner),
            password_hash: user.password_hash,
            street_house: user.street_house.into_inner(),
            city: user.city.into_inner(),
            district: user.district.into_inner(),
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
