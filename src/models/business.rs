use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::business::{Business as DomainBusiness, NewBusiness as DomainNewBusiness};
use crate::domain::types::{
    BusinessName, CategorySlug, CityName, DistrictName, EmailAddress, ImageUrl, PhoneNumber,
    StreetAddress, TypeConstraintError,
};
use crate::models::{join_lines, split_lines};

/// Diesel model representing the `businesses` table.
///
/// The gallery is stored as a newline-joined text column.
#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::businesses)]
pub struct Business {
    pub id: i32,
    pub owner_id: Option<i32>,
    pub owner_name: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub street_house: String,
    pub city: String,
    pub district: String,
    pub description: Option<String>,
    pub profile_pic_url: Option<String>,
    pub gallery: String,
    pub category: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Business`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::businesses)]
pub struct NewBusiness {
    pub owner_id: Option<i32>,
    pub owner_name: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub street_house: String,
    pub city: String,
    pub district: String,
    pub description: Option<String>,
    pub category: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Business> for DomainBusiness {
    type Error = TypeConstraintError;

    fn try_from(business: Business) -> Result<Self, Self::Error> {
        let gallery = split_lines(&business.gallery)
            .into_iter()
            .map(ImageUrl::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: business.id.try_into()?,
            owner_id: business.owner_id.map(TryInto::try_into).transpose()?,
            owner_name: business.owner_name,
            name: BusinessName::new(business.name)?,
            email: EmailAddress::new(business.email)?,
            phone: PhoneNumber::new(business.phone)?,
            street_house: StreetAddress::new(business.street_house)?,
            city: CityName::new(business.city)?,
            district: DistrictName::new(business.district)?,
            description: business.description,
            profile_pic_url: business.profile_pic_url.map(ImageUrl::new).transpose()?,
            gallery,
            category: CategorySlug::new(business.category)?,
            is_active: business.is_active,
            created_at: business.created_at,
            updated_at: business.updated_at,
        })
    }
}

impl From<DomainNewBusiness> for NewBusiness {
    fn from(business: DomainNewBusiness) -> Self {
        Self {
            owner_id: business.owner_id.map(Into::into),
            owner_name: business.owner_name,
            name: business.name.into_inner(),
            email: business.email.into_inner(),
            phone: business.phone.into_inner(),
            street_house: business.street_house.into_inner(),
            city: business.city.into_inner(),
            district: business.district.into_inner(),
            description: business.description,
            category: business.category.into_inner(),
            created_at: business.created_at,
            updated_at: business.updated_at,
        }
    }
}

/// Render a gallery for storage.
pub fn gallery_column(urls: &[ImageUrl]) -> String {
    join_lines(urls.iter().map(ImageUrl::as_str))
}
