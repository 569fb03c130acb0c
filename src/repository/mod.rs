use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::db::{DbConnection, DbPool};
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

pub mod audit;
pub mod booking;
pub mod business;
pub mod category;
pub mod errors;
pub mod service;
#[cfg(test)]
pub mod test;
pub mod user;

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be passed around freely between handlers.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Query parameters used when listing or searching businesses.
#[derive(Debug, Clone, Default)]
pub struct BusinessListQuery {
    /// Restrict to businesses owned by a user.
    pub owner_id: Option<UserId>,
    /// Filter by category slug.
    pub category: Option<CategorySlug>,
    /// Filter by city (case-insensitive exact match).
    pub city: Option<String>,
    /// Free-text search over name, category, city and district.
    pub search: Option<String>,
    /// Include deactivated businesses (moderation views).
    pub include_inactive: bool,
    /// Pagination parameters.
    pub pagination: Option<Pagination>,
}

impl BusinessListQuery {
    pub fn owner(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
    pub fn category(mut self, category: CategorySlug) -> Self {
        self.category = Some(category);
        self
    }
    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Query parameters used when listing bookings.
#[derive(Debug, Clone, Default)]
pub struct BookingListQuery {
    /// Restrict to one customer's bookings.
    pub customer_id: Option<UserId>,
    /// Restrict to one business.
    pub business_id: Option<BusinessId>,
    /// Restrict to a set of businesses (an owner's portfolio).
    pub business_ids: Option<Vec<BusinessId>>,
    /// Filter by lifecycle status.
    pub status: Option<BookingStatus>,
    /// Restrict to bookings starting on a calendar date.
    pub on_date: Option<NaiveDate>,
    /// Pagination parameters.
    pub pagination: Option<Pagination>,
}

impl BookingListQuery {
    pub fn customer(mut self, customer_id: UserId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }
    pub fn business(mut self, business_id: BusinessId) -> Self {
        self.business_id = Some(business_id);
        self
    }
    pub fn businesses(mut self, business_ids: Vec<BusinessId>) -> Self {
        self.business_ids = Some(business_ids);
        self
    }
    pub fn status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.on_date = Some(date);
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Query parameters used when listing users.
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    /// Filter by role.
    pub role: Option<UserRole>,
    /// Free-text search over name and email.
    pub search: Option<String>,
    /// Pagination parameters.
    pub pagination: Option<Pagination>,
}

impl UserListQuery {
    pub fn role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Query parameters used when listing a business's services.
#[derive(Debug, Clone)]
pub struct ServiceListQuery {
    /// Business identifier.
    pub business_id: BusinessId,
    /// Include deactivated services (owner/admin views).
    pub include_inactive: bool,
}

impl ServiceListQuery {
    pub fn new(business_id: BusinessId) -> Self {
        Self {
            business_id,
            include_inactive: false,
        }
    }
    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }
}

/// Aggregate user counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserCounts {
    pub total: usize,
    pub active: usize,
    pub customers: usize,
    pub business_owners: usize,
}

/// Aggregate business counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusinessCounts {
    pub total: usize,
    pub active: usize,
}

/// Aggregate booking counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BookingCounts {
    pub total: usize,
    pub requested: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub cancelled: usize,
    pub completed: usize,
    /// Sum of completed booking prices.
    pub revenue: f64,
}

/// Read-only operations for user accounts.
pub trait UserReader {
    /// Retrieve a user by identifier.
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    /// Retrieve a user by unique email.
    fn get_user_by_email(&self, email: &EmailAddress) -> RepositoryResult<Option<User>>;
    /// Retrieve a user holding an unexpired-or-not reset token.
    fn get_user_by_reset_token(&self, token: &str) -> RepositoryResult<Option<User>>;
    /// List users matching the supplied query parameters.
    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)>;
    /// Aggregate counters for the admin dashboard.
    fn user_counts(&self) -> RepositoryResult<UserCounts>;
}

/// Write operations for user accounts.
pub trait UserWriter {
    /// Persist a new user and return the stored row.
    fn create_user(&self, user: &NewUser) -> RepositoryResult<User>;
    /// Update a user's own profile fields.
    fn update_user_profile(
        &self,
        id: UserId,
        update: &UserProfileUpdate,
    ) -> RepositoryResult<usize>;
    /// Replace the stored password hash.
    fn set_user_password(&self, id: UserId, password_hash: &str) -> RepositoryResult<usize>;
    /// Mark a user's contact as verified.
    fn set_user_verified(&self, id: UserId, verified: bool) -> RepositoryResult<usize>;
    /// Activate or deactivate an account.
    fn set_user_active(&self, id: UserId, active: bool) -> RepositoryResult<usize>;
    /// Store or clear a password-reset token with its expiry.
    fn set_reset_token(
        &self,
        id: UserId,
        token: Option<(&str, NaiveDateTime)>,
    ) -> RepositoryResult<usize>;
}

/// Read-only operations for businesses.
pub trait BusinessReader {
    /// List businesses matching the supplied query parameters.
    fn list_businesses(&self, query: BusinessListQuery)
    -> RepositoryResult<(usize, Vec<Business>)>;
    /// Retrieve a business by its identifier.
    fn get_business_by_id(&self, id: BusinessId) -> RepositoryResult<Option<Business>>;
    /// Distinct cities of active businesses, for filter dropdowns.
    fn list_cities(&self) -> RepositoryResult<Vec<String>>;
    /// Aggregate counters for the admin dashboard.
    fn business_counts(&self) -> RepositoryResult<BusinessCounts>;
}

/// Write operations for businesses.
pub trait BusinessWriter {
    /// Persist a new business and return the stored row.
    fn create_business(&self, business: &NewBusiness) -> RepositoryResult<Business>;
    /// Update a business's mutable fields.
    fn update_business(&self, id: BusinessId, update: &BusinessUpdate) -> RepositoryResult<usize>;
    /// Activate or deactivate a business.
    fn set_business_active(&self, id: BusinessId, active: bool) -> RepositoryResult<usize>;
    /// Replace the stored gallery URL list.
    fn set_business_gallery(&self, id: BusinessId, gallery: &[ImageUrl])
    -> RepositoryResult<usize>;
    /// Replace the business profile picture.
    fn set_business_profile_pic(
        &self,
        id: BusinessId,
        url: Option<&ImageUrl>,
    ) -> RepositoryResult<usize>;
}

/// Read-only operations for services.
pub trait ServiceReader {
    /// List a business's services.
    fn list_services(&self, query: ServiceListQuery) -> RepositoryResult<Vec<Service>>;
    /// Retrieve a service by its identifier.
    fn get_service_by_id(&self, id: ServiceId) -> RepositoryResult<Option<Service>>;
}

/// Write operations for services.
pub trait ServiceWriter {
    /// Persist a new service.
    fn create_service(&self, service: &NewService) -> RepositoryResult<usize>;
    /// Update a service's mutable fields.
    fn update_service(&self, id: ServiceId, update: &ServiceUpdate) -> RepositoryResult<usize>;
    /// Activate or deactivate a service.
    fn set_service_active(&self, id: ServiceId, active: bool) -> RepositoryResult<usize>;
}

/// Read-only operations for bookings.
pub trait BookingReader {
    /// List bookings matching the supplied query parameters.
    fn list_bookings(&self, query: BookingListQuery) -> RepositoryResult<(usize, Vec<Booking>)>;
    /// Retrieve a booking by its identifier.
    fn get_booking_by_id(&self, id: BookingId) -> RepositoryResult<Option<Booking>>;
    /// Find a non-terminal booking of `business_id` overlapping `[start, end)`.
    fn find_conflicting_booking(
        &self,
        business_id: BusinessId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<Option<Booking>>;
    /// Aggregate counters for the admin dashboard.
    fn booking_counts(&self) -> RepositoryResult<BookingCounts>;
}

/// Write operations for bookings.
pub trait BookingWriter {
    /// Persist a new booking (status `requested`) and return the stored row.
    fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<Booking>;
    /// Move a booking to `status`, stamping the matching transition column.
    fn transition_booking(
        &self,
        id: BookingId,
        status: BookingStatus,
        at: NaiveDateTime,
    ) -> RepositoryResult<usize>;
    /// Record that payment for a booking was received.
    fn mark_payment_received(
        &self,
        id: BookingId,
        by: UserId,
        at: NaiveDateTime,
    ) -> RepositoryResult<usize>;
}

/// Read-only operations for admin-registered categories.
pub trait CategoryReader {
    /// All registered categories ordered by name.
    fn list_categories(&self) -> RepositoryResult<Vec<Category>>;
    /// Retrieve a category by its slug.
    fn get_category_by_slug(&self, slug: &CategorySlug) -> RepositoryResult<Option<Category>>;
}

/// Write operations for admin-registered categories.
pub trait CategoryWriter {
    /// Persist a new category.
    fn create_category(&self, category: &NewCategory) -> RepositoryResult<usize>;
    /// Update a category's display fields.
    fn update_category(
        &self,
        slug: &CategorySlug,
        update: &CategoryUpdate,
    ) -> RepositoryResult<usize>;
    /// Delete a registered category. Businesses keep their slug; the merged
    /// registry falls back to a built-in when one exists.
    fn delete_category(&self, slug: &CategorySlug) -> RepositoryResult<usize>;
}

/// Read-only operations for the audit log.
pub trait AuditLogReader {
    /// Audit entries, newest first.
    fn list_audit_entries(
        &self,
        pagination: Option<Pagination>,
    ) -> RepositoryResult<(usize, Vec<AuditEntry>)>;
}

/// Write operations for the audit log.
pub trait AuditLogWriter {
    /// Append one audit entry.
    fn append_audit_entry(&self, entry: &NewAuditEntry) -> RepositoryResult<usize>;
}
