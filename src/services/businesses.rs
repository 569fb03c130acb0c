use crate::auth::{check_role, AuthenticatedUser};
use crate::domain::booking::Booking;
use crate::domain::business::Business;
use crate::domain::category::builtin_category;
use crate::domain::types::{
    BookingStatus, BusinessId, CategorySlug, ImageUrl, ServiceId, UserId, UserRole,
};
use crate::dto::bookings::BookingDto;
use crate::dto::businesses::{BusinessCardDto, ServiceDto};
use crate::forms::businesses::{
    BusinessFormPayload, DeleteGalleryImageFormPayload, ServiceFormPayload,
};
use crate::repository::{
    BookingListQuery, BookingReader, BusinessListQuery, BusinessReader, BusinessWriter,
    CategoryReader, ServiceListQuery, ServiceReader, ServiceWriter, UserReader,
};
use crate::services::bookings::booking_dto;

use super::{ServiceError, ServiceResult};

/// Recent bookings shown on the owner dashboard.
const DASHBOARD_RECENT_BOOKINGS: usize = 10;

fn session_user_id(user: &AuthenticatedUser) -> ServiceResult<UserId> {
    user.user_id().map_err(|e| {
        log::error!("Invalid user id in session claims: {e}");
        ServiceError::Internal
    })
}

/// Whether a slug resolves against the merged category registry.
fn category_exists<R>(slug: &CategorySlug, repo: &R) -> ServiceResult<bool>
where
    R: CategoryReader,
{
    if builtin_category(slug.as_str()).is_some() {
        return Ok(true);
    }
    match repo.get_category_by_slug(slug) {
        Ok(found) => Ok(found.is_some()),
        Err(e) => {
            log::error!("Failed to look up category: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Resolve a business and verify the acting user owns it.
fn owned_business<R>(
    id: BusinessId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<Business>
where
    R: BusinessReader,
{
    if !check_role(UserRole::BusinessOwner, user) {
        return Err(ServiceError::Unauthorized);
    }
    let user_id = session_user_id(user)?;

    let business = match repo.get_business_by_id(id) {
        Ok(Some(business)) => business,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get business: {e}");
            return Err(ServiceError::Internal);
        }
    };

    if business.owner_id != Some(user_id) {
        log::warn!("Unauthorized business access by {user_id} on business {id}");
        return Err(ServiceError::Unauthorized);
    }

    Ok(business)
}

/// Per-status booking counters for the owner dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnerBookingSummary {
    pub requested: usize,
    pub accepted: usize,
    pub completed: usize,
}

/// Data for the owner dashboard.
#[derive(Debug, Clone)]
pub struct OwnerDashboard {
    pub businesses: Vec<BusinessCardDto>,
    pub summary: OwnerBookingSummary,
    pub recent_bookings: Vec<BookingDto>,
}

pub fn owner_dashboard<R>(user: &AuthenticatedUser, repo: &R) -> ServiceResult<OwnerDashboard>
where
    R: BusinessReader + BookingReader + ServiceReader + UserReader,
{
    if !check_role(UserRole::BusinessOwner, user) {
        return Err(ServiceError::Unauthorized);
    }
    let user_id = session_user_id(user)?;

    let businesses = match repo
        .list_businesses(BusinessListQuery::default().owner(user_id).include_inactive())
    {
        Ok((_total, businesses)) => businesses,
        Err(e) => {
            log::error!("Failed to list owned businesses: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let business_ids: Vec<BusinessId> = businesses.iter().map(|b| b.id).collect();
    let cards = businesses
        .iter()
        .map(|b| BusinessCardDto::new(b, None))
        .collect();

    if business_ids.is_empty() {
        return Ok(OwnerDashboard {
            businesses: cards,
            summary: OwnerBookingSummary::default(),
            recent_bookings: vec![],
        });
    }

    let bookings: Vec<Booking> = match repo
        .list_bookings(BookingListQuery::default().businesses(business_ids))
    {
        Ok((_total, bookings)) => bookings,
        Err(e) => {
            log::error!("Failed to list bookings: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let summary = OwnerBookingSummary {
        requested: bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Requested)
            .count(),
        accepted: bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Accepted)
            .count(),
        completed: bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .count(),
    };

    let recent_bookings = bookings
        .iter()
        .take(DASHBOARD_RECENT_BOOKINGS)
        .map(|b| booking_dto(b, repo))
        .collect();

    Ok(OwnerDashboard {
        businesses: cards,
        summary,
        recent_bookings,
    })
}

pub fn create_business<R>(
    payload: BusinessFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<Business>
where
    R: BusinessWriter + CategoryReader,
{
    if !check_role(UserRole::BusinessOwner, user) {
        return Err(ServiceError::Unauthorized);
    }
    let user_id = session_user_id(user)?;

    if !category_exists(&payload.category, repo)? {
        return Err(ServiceError::Form(format!(
            "Unknown category: {}",
            payload.category
        )));
    }

    match repo.create_business(&payload.into_new_business(Some(user_id))) {
        Ok(business) => Ok(business),
        Err(e) => {
            log::error!("Failed to create business: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Owner management view: the business plus all of its services.
pub fn business_manage<R>(
    id: BusinessId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<(Business, Vec<ServiceDto>)>
where
    R: BusinessReader + ServiceReader,
{
    let business = owned_business(id, user, repo)?;

    let services = match repo.list_services(ServiceListQuery::new(business.id).include_inactive())
    {
        Ok(services) => services.into_iter().map(ServiceDto::from).collect(),
        Err(e) => {
            log::error!("Failed to list services: {e}");
            return Err(ServiceError::Internal);
        }
    };

    Ok((business, services))
}

pub fn update_business<R>(
    id: BusinessId,
    payload: BusinessFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BusinessReader + BusinessWriter + CategoryReader,
{
    let business = owned_business(id, user, repo)?;

    if !category_exists(&payload.category, repo)? {
        return Err(ServiceError::Form(format!(
            "Unknown category: {}",
            payload.category
        )));
    }

    match repo.update_business(id, &payload.into_business_update(business.profile_pic_url)) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to update business: {e}");
            Ok(false)
        }
    }
}

pub fn deactivate_business<R>(
    id: BusinessId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BusinessReader + BusinessWriter,
{
    owned_business(id, user, repo)?;

    match repo.set_business_active(id, false) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to deactivate business: {e}");
            Ok(false)
        }
    }
}

/// Store an uploaded profile picture URL.
pub fn set_business_photo<R>(
    id: BusinessId,
    url: ImageUrl,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BusinessReader + BusinessWriter,
{
    owned_business(id, user, repo)?;

    match repo.set_business_profile_pic(id, Some(&url)) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to set business photo: {e}");
            Ok(false)
        }
    }
}

/// Append an uploaded image URL to the gallery.
pub fn add_gallery_image<R>(
    id: BusinessId,
    url: ImageUrl,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BusinessReader + BusinessWriter,
{
    let business = owned_business(id, user, repo)?;

    let mut gallery = business.gallery;
    if !gallery.contains(&url) {
        gallery.push(url);
    }

    match repo.set_business_gallery(id, &gallery) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to update gallery: {e}");
            Ok(false)
        }
    }
}

pub fn delete_gallery_image<R>(
    id: BusinessId,
    payload: DeleteGalleryImageFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BusinessReader + BusinessWriter,
{
    let business = owned_business(id, user, repo)?;

    let mut gallery = business.gallery;
    let before = gallery.len();
    gallery.retain(|url| url != &payload.url);
    if gallery.len() == before {
        return Err(ServiceError::NotFound);
    }

    match repo.set_business_gallery(id, &gallery) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to update gallery: {e}");
            Ok(false)
        }
    }
}

pub fn create_service<R>(
    business_id: BusinessId,
    payload: ServiceFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BusinessReader + ServiceWriter,
{
    owned_business(business_id, user, repo)?;

    match repo.create_service(&payload.into_new_service(business_id)) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to create service: {e}");
            Ok(false)
        }
    }
}

/// Resolve a service and verify the acting user owns its business.
fn owned_service<R>(
    id: ServiceId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<crate::domain::service::Service>
where
    R: BusinessReader + ServiceReader,
{
    let service = match repo.get_service_by_id(id) {
        Ok(Some(service)) => service,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get service: {e}");
            return Err(ServiceError::Internal);
        }
    };

    owned_business(service.business_id, user, repo)?;
    Ok(service)
}

pub fn update_service<R>(
    id: ServiceId,
    payload: ServiceFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BusinessReader + ServiceReader + ServiceWriter,
{
    owned_service(id, user, repo)?;

    match repo.update_service(id, &payload.into_service_update()) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to update service: {e}");
            Ok(false)
        }
    }
}

pub fn deactivate_service<R>(
    id: ServiceId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BusinessReader + ServiceReader + ServiceWriter,
{
    owned_service(id, user, repo)?;

    match repo.set_service_active(id, false) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to deactivate service: {e}");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        BusinessName, CityName, DistrictName, EmailAddress, PhoneNumber, StreetAddress,
    };
    use crate::repository::test::TestRepository;
    use chrono::DateTime;

    fn owner_claims() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: 2,
            email: "owner@example.com".into(),
            name: "Owen".into(),
            role: "business_owner".into(),
        }
    }

    fn sample_business(id: i32, owner: i32) -> Business {
        let at = DateTime::from_timestamp(0, 0).unwrap().naive_utc();
        Business {
            id: BusinessId::new(id).unwrap(),
            owner_id: Some(UserId::new(owner).unwrap()),
            owner_name: None,
            name: BusinessName::new("Smith Plumbing").unwrap(),
            email: EmailAddress::new("smith@plumbing.com").unwrap(),
            phone: PhoneNumber::new("555-0000").unwrap(),
            street_house: StreetAddress::new("2 Pipe Rd").unwrap(),
            city: CityName::new("Springfield").unwrap(),
            district: DistrictName::new("North").unwrap(),
            description: None,
            profile_pic_url: None,
            gallery: vec![ImageUrl::new("https://cdn.example.com/upload/v1/a.jpg").unwrap()],
            category: CategorySlug::new("plumbing").unwrap(),
            is_active: true,
            created_at: at,
            updated_at: at,
        }
    }

    fn business_payload(category: &str) -> BusinessFormPayload {
        BusinessFormPayload {
            name: BusinessName::new("Smith Plumbing").unwrap(),
            email: EmailAddress::new("smith@plumbing.com").unwrap(),
            phone: PhoneNumber::new("555-0000").unwrap(),
            street_house: StreetAddress::new("2 Pipe Rd").unwrap(),
            city: CityName::new("Springfield").unwrap(),
            district: DistrictName::new("North").unwrap(),
            description: None,
            category: CategorySlug::new(category).unwrap(),
            owner_name: None,
        }
    }

    #[test]
    fn create_business_accepts_builtin_categories() {
        let repo = TestRepository::new();
        let business = create_business(business_payload("plumbing"), &owner_claims(), &repo)
            .unwrap();
        assert_eq!(business.owner_id, Some(UserId::new(2).unwrap()));
    }

    #[test]
    fn create_business_rejects_unknown_categories() {
        let repo = TestRepository::new();
        let err =
            create_business(business_payload("astrology"), &owner_claims(), &repo).unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn customers_cannot_create_businesses() {
        let repo = TestRepository::new();
        let customer = AuthenticatedUser {
            sub: 1,
            email: "alice@example.com".into(),
            name: "Alice".into(),
            role: "customer".into(),
        };
        let err = create_business(business_payload("plumbing"), &customer, &repo).unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized);
    }

    #[test]
    fn management_requires_ownership() {
        let repo = TestRepository::new().with_businesses(vec![sample_business(1, 9)]);
        let err = business_manage(BusinessId::new(1).unwrap(), &owner_claims(), &repo).unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized);
    }

    #[test]
    fn deleting_unknown_gallery_image_is_not_found() {
        let repo = TestRepository::new().with_businesses(vec![sample_business(1, 2)]);
        let payload = DeleteGalleryImageFormPayload {
            url: ImageUrl::new("https://cdn.example.com/upload/v1/missing.jpg").unwrap(),
        };
        let err = delete_gallery_image(BusinessId::new(1).unwrap(), payload, &owner_claims(), &repo)
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[test]
    fn deleting_existing_gallery_image_succeeds() {
        let repo = TestRepository::new().with_businesses(vec![sample_business(1, 2)]);
        let payload = DeleteGalleryImageFormPayload {
            url: ImageUrl::new("https://cdn.example.com/upload/v1/a.jpg").unwrap(),
        };
        assert!(delete_gallery_image(
            BusinessId::new(1).unwrap(),
            payload,
            &owner_claims(),
            &repo
        )
        .unwrap());
    }
}
