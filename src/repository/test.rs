use std::sync::Mutex;

use chrono::NaiveDateTime;

use crate::domain::audit::{AuditEntry, NewAuditEntry};
use crate::domain::booking::{Booking, NewBooking};
use crate::domain::business::{Business, BusinessUpdate, NewBusiness};
use crate::domain::category::{Category, CategoryUpdate, NewCategory};
use crate::domain::service::{NewService, Service, ServiceUpdate};
use crate::domain::types::{
    BookingId, BookingStatus, BusinessId, CategorySlug, EmailAddress, ImageUrl, ServiceId, UserId,
    UserRole,
};
use crate::domain::user::{NewUser, User, UserProfileUpdate};
use crate::pagination::Pagination;
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    AuditLogReader, AuditLogWriter, BookingCounts, BookingListQuery, BookingReader, BookingWriter,
    BusinessCounts, BusinessListQuery, BusinessReader, BusinessWriter, CategoryReader,
    CategoryWriter, ServiceListQuery, ServiceReader, ServiceWriter, UserCounts, UserListQuery,
    UserReader, UserWriter,
};

/// Simple in-memory repository used for unit tests.
///
/// Readers serve the seeded fixtures; writers are stubs that hand back
/// plausible results, with an audit trail recorded for assertions.
#[derive(Default)]
pub struct TestRepository {
    users: Vec<User>,
    businesses: Vec<Business>,
    services: Vec<Service>,
    bookings: Vec<Booking>,
    categories: Vec<Category>,
    audit: Mutex<Vec<NewAuditEntry>>,
}

impl TestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }

    pub fn with_businesses(mut self, businesses: Vec<Business>) -> Self {
        self.businesses = businesses;
        self
    }

    pub fn with_services(mut self, services: Vec<Service>) -> Self {
        self.services = services;
        self
    }

    pub fn with_bookings(mut self, bookings: Vec<Booking>) -> Self {
        self.bookings = bookings;
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Audit entries appended through the writer trait.
    pub fn audit_entries(&self) -> Vec<NewAuditEntry> {
        self.audit.lock().unwrap().clone()
    }
}

impl UserReader for TestRepository {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    fn get_user_by_email(&self, email: &EmailAddress) -> RepositoryResult<Option<User>> {
        Ok(self.users.iter().find(|u| &u.email == email).cloned())
    }

    fn get_user_by_reset_token(&self, token: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)> {
        let mut items: Vec<User> = self.users.clone();
        if let Some(role) = query.role {
            items.retain(|u| u.role == role);
        }
        if let Some(search) = &query.search {
            let search = search.to_lowercase();
            items.retain(|u| {
                u.name.to_lowercase().contains(&search)
                    || u.email.as_str().contains(&search)
            });
        }
        let total = items.len();
        Ok((total, items))
    }

    fn user_counts(&self) -> RepositoryResult<UserCounts> {
        Ok(UserCounts {
            total: self.users.len(),
            active: self.users.iter().filter(|u| u.is_active).count(),
            customers: self
                .users
                .iter()
                .filter(|u| u.role == UserRole::Customer)
                .count(),
            business_owners: self
                .users
                .iter()
                .filter(|u| u.role == UserRole::BusinessOwner)
                .count(),
        })
    }
}

impl UserWriter for TestRepository {
    fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        Ok(User {
            id: UserId::new(self.users.len() as i32 + 1).expect("positive id"),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            password_hash: user.password_hash.clone(),
            street_house: user.street_house.clone(),
            city: user.city.clone(),
            district: user.district.clone(),
            profile_pic_url: None,
            role: user.role,
            is_verified: false,
            is_active: true,
            reset_token: None,
            reset_token_expires: None,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }

    fn update_user_profile(
        &self,
        _id: UserId,
        _update: &UserProfileUpdate,
    ) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn set_user_password(&self, _id: UserId, _password_hash: &str) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn set_user_verified(&self, _id: UserId, _verified: bool) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn set_user_active(&self, _id: UserId, _active: bool) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn set_reset_token(
        &self,
        _id: UserId,
        _token: Option<(&str, NaiveDateTime)>,
    ) -> RepositoryResult<usize> {
        Ok(1)
    }
}

impl BusinessReader for TestRepository {
    fn list_businesses(
        &self,
        query: BusinessListQuery,
    ) -> RepositoryResult<(usize, Vec<Business>)> {
        let mut items: Vec<Business> = self.businesses.clone();
        if !query.include_inactive {
            items.retain(|b| b.is_active);
        }
        if let Some(owner_id) = query.owner_id {
            items.retain(|b| b.owner_id == Some(owner_id));
        }
        if let Some(category) = &query.category {
            items.retain(|b| &b.category == category);
        }
        if let Some(city) = &query.city {
            let city = city.to_lowercase();
            items.retain(|b| b.city.to_lowercase() == city);
        }
        if let Some(search) = &query.search {
            let search = search.to_lowercase();
            items.retain(|b| {
                b.name.to_lowercase().contains(&search)
                    || b.category.as_str().contains(&search)
                    || b.city.to_lowercase().contains(&search)
                    || b.district.to_lowercase().contains(&search)
            });
        }
        let total = items.len();
        Ok((total, items))
    }

    fn get_business_by_id(&self, id: BusinessId) -> RepositoryResult<Option<Business>> {
        Ok(self.businesses.iter().find(|b| b.id == id).cloned())
    }

    fn list_cities(&self) -> RepositoryResult<Vec<String>> {
        let mut cities: Vec<String> = self
            .businesses
            .iter()
            .filter(|b| b.is_active)
            .map(|b| b.city.as_str().to_string())
            .collect();
        cities.sort();
        cities.dedup();
        Ok(cities)
    }

    fn business_counts(&self) -> RepositoryResult<BusinessCounts> {
        Ok(BusinessCounts {
            total: self.businesses.len(),
            active: self.businesses.iter().filter(|b| b.is_active).count(),
        })
    }
}

impl BusinessWriter for TestRepository {
    fn create_business(&self, business: &NewBusiness) -> RepositoryResult<Business> {
        Ok(Business {
            id: BusinessId::new(self.businesses.len() as i32 + 1).expect("positive id"),
            owner_id: business.owner_id,
            owner_name: business.owner_name.clone(),
            name: business.name.clone(),
            email: business.email.clone(),
            phone: business.phone.clone(),
            street_house: business.street_house.clone(),
            city: business.city.clone(),
            district: business.district.clone(),
            description: business.description.clone(),
            profile_pic_url: None,
            gallery: vec![],
            category: business.category.clone(),
            is_active: true,
            created_at: business.created_at,
            updated_at: business.updated_at,
        })
    }

    fn update_business(
        &self,
        _id: BusinessId,
        _update: &BusinessUpdate,
    ) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn set_business_active(&self, _id: BusinessId, _active: bool) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn set_business_gallery(
        &self,
        _id: BusinessId,
        _gallery: &[ImageUrl],
    ) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn set_business_profile_pic(
        &self,
        _id: BusinessId,
        _url: Option<&ImageUrl>,
    ) -> RepositoryResult<usize> {
        Ok(1)
    }
}

impl ServiceReader for TestRepository {
    fn list_services(&self, query: ServiceListQuery) -> RepositoryResult<Vec<Service>> {
        let mut items: Vec<Service> = self
            .services
            .iter()
            .filter(|s| s.business_id == query.business_id)
            .cloned()
            .collect();
        if !query.include_inactive {
            items.retain(|s| s.is_active);
        }
        Ok(items)
    }

    fn get_service_by_id(&self, id: ServiceId) -> RepositoryResult<Option<Service>> {
        Ok(self.services.iter().find(|s| s.id == id).cloned())
    }
}

impl ServiceWriter for TestRepository {
    fn create_service(&self, _service: &NewService) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn update_service(&self, _id: ServiceId, _update: &ServiceUpdate) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn set_service_active(&self, _id: ServiceId, _active: bool) -> RepositoryResult<usize> {
        Ok(1)
    }
}

impl BookingReader for TestRepository {
    fn list_bookings(&self, query: BookingListQuery) -> RepositoryResult<(usize, Vec<Booking>)> {
        let mut items: Vec<Booking> = self.bookings.clone();
        if let Some(customer_id) = query.customer_id {
            items.retain(|b| b.customer_id == customer_id);
        }
        if let Some(business_id) = query.business_id {
            items.retain(|b| b.business_id == business_id);
        }
        if let Some(business_ids) = &query.business_ids {
            items.retain(|b| business_ids.contains(&b.business_id));
        }
        if let Some(status) = query.status {
            items.retain(|b| b.status == status);
        }
        if let Some(date) = query.on_date {
            items.retain(|b| b.booking_time.date() == date);
        }
        let total = items.len();
        Ok((total, items))
    }

    fn get_booking_by_id(&self, id: BookingId) -> RepositoryResult<Option<Booking>> {
        Ok(self.bookings.iter().find(|b| b.id == id).cloned())
    }

    fn find_conflicting_booking(
        &self,
        business_id: BusinessId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<Option<Booking>> {
        Ok(self
            .bookings
            .iter()
            .find(|b| b.business_id == business_id && b.blocks_slot() && b.overlaps(start, end))
            .cloned())
    }

    fn booking_counts(&self) -> RepositoryResult<BookingCounts> {
        let count = |status: BookingStatus| {
            self.bookings.iter().filter(|b| b.status == status).count()
        };
        Ok(BookingCounts {
            total: self.bookings.len(),
            requested: count(BookingStatus::Requested),
            accepted: count(BookingStatus::Accepted),
            rejected: count(BookingStatus::Rejected),
            cancelled: count(BookingStatus::Cancelled),
            completed: count(BookingStatus::Completed),
            revenue: self
                .bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Completed)
                .map(|b| b.price.get())
                .sum(),
        })
    }
}

impl BookingWriter for TestRepository {
    fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<Booking> {
        Ok(Booking {
            id: BookingId::new(self.bookings.len() as i32 + 1).expect("positive id"),
            business_id: booking.business_id,
            service_id: booking.service_id,
            customer_id: booking.customer_id,
            booking_time: booking.booking_time,
            duration_minutes: booking.duration_minutes,
            price: booking.price,
            status: BookingStatus::Requested,
            payment_method: booking.payment_method,
            payment_received: false,
            payment_received_at: None,
            payment_received_by: None,
            notes: booking.notes.clone(),
            requested_at: Some(booking.created_at),
            accepted_at: None,
            rejected_at: None,
            cancelled_at: None,
            completed_at: None,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        })
    }

    fn transition_booking(
        &self,
        _id: BookingId,
        _status: BookingStatus,
        _at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn mark_payment_received(
        &self,
        _id: BookingId,
        _by: UserId,
        _at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        Ok(1)
    }
}

impl CategoryReader for TestRepository {
    fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        Ok(self.categories.clone())
    }

    fn get_category_by_slug(&self, slug: &CategorySlug) -> RepositoryResult<Option<Category>> {
        Ok(self.categories.iter().find(|c| &c.slug == slug).cloned())
    }
}

impl CategoryWriter for TestRepository {
    fn create_category(&self, _category: &NewCategory) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn update_category(
        &self,
        _slug: &CategorySlug,
        _update: &CategoryUpdate,
    ) -> RepositoryResult<usize> {
        Ok(1)
    }

    fn delete_category(&self, _slug: &CategorySlug) -> RepositoryResult<usize> {
        Ok(1)
    }
}

impl AuditLogReader for TestRepository {
    fn list_audit_entries(
        &self,
        _pagination: Option<Pagination>,
    ) -> RepositoryResult<(usize, Vec<AuditEntry>)> {
        Ok((0, vec![]))
    }
}

impl AuditLogWriter for TestRepository {
    fn append_audit_entry(&self, entry: &NewAuditEntry) -> RepositoryResult<usize> {
        self.audit.lock().unwrap().push(entry.clone());
        Ok(1)
    }
}
