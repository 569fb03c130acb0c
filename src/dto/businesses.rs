use serde::Serialize;

use crate::domain::business::Business;
use crate::domain::service::Service;
use crate::domain::types::ImageUrl;
use crate::media::{transformed_url, Transform};

/// Business card shown on listing pages, with CDN-transformed image variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessCardDto {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub description: String,
    pub is_active: bool,
    /// Original hosted URL, when any image exists.
    pub profile_image: Option<String>,
    /// Card-sized variant.
    pub profile_image_full: Option<String>,
    /// Tiny blurred placeholder for lazy loading.
    pub profile_image_lazy: Option<String>,
}

impl BusinessCardDto {
    /// Build a card; when the business has no picture, the owner's profile
    /// picture serves as a fallback.
    pub fn new(business: &Business, owner_pic: Option<&ImageUrl>) -> Self {
        let original = business.profile_pic_url.as_ref().or(owner_pic);
        let profile_image = original.map(|url| url.as_str().to_string());
        let profile_image_full =
            original.map(|url| transformed_url(url.as_str(), &Transform::card()));
        let profile_image_lazy =
            original.map(|url| transformed_url(url.as_str(), &Transform::lazy_placeholder()));

        Self {
            id: business.id.get(),
            name: business.name.as_str().to_string(),
            category: business.category.as_str().to_string(),
            address: business.address(),
            city: business.city.as_str().to_string(),
            phone: business.phone.as_str().to_string(),
            description: business.description.clone().unwrap_or_default(),
            is_active: business.is_active,
            profile_image,
            profile_image_full,
            profile_image_lazy,
        }
    }
}

/// Business detail page: the card plus gallery and bookable services.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessDetailDto {
    #[serde(flatten)]
    pub card: BusinessCardDto,
    pub email: String,
    pub gallery: Vec<String>,
    pub services: Vec<ServiceDto>,
}

impl BusinessDetailDto {
    pub fn new(business: &Business, owner_pic: Option<&ImageUrl>, services: Vec<ServiceDto>) -> Self {
        Self {
            card: BusinessCardDto::new(business, owner_pic),
            email: business.email.as_str().to_string(),
            gallery: business
                .gallery
                .iter()
                .map(|url| transformed_url(url.as_str(), &Transform::card()))
                .collect(),
            services,
        }
    }
}

/// Service row on business pages and booking forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDto {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_minutes: i32,
    pub is_active: bool,
}

impl From<Service> for ServiceDto {
    fn from(value: Service) -> Self {
        Self {
            id: value.id.get(),
            name: value.name.into_inner(),
            description: value.description.unwrap_or_default(),
            price: value.price.get(),
            duration_minutes: value.duration_minutes.get(),
            is_active: value.is_active,
        }
    }
}
