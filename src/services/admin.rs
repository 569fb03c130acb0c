use chrono::Utc;

use crate::auth::{check_role, AuthenticatedUser};
use crate::domain::audit::{AuditEntry, NewAuditEntry};
use crate::domain::category::builtin_category;
use crate::domain::types::{BookingId, BusinessId, CategorySlug, UserId, UserRole};
use crate::domain::user::User;
use crate::dto::admin::DashboardStats;
use crate::dto::bookings::BookingDto;
use crate::dto::businesses::BusinessCardDto;
use crate::dto::categories::CategoryDto;
use crate::forms::admin::{CreateCategoryFormPayload, EditCategoryFormPayload};
use crate::forms::bookings::UpdateBookingStatusFormPayload;
use crate::notify::BookingNotifier;
use crate::pagination::{Pagination, DEFAULT_ITEMS_PER_PAGE};
use crate::repository::{
    AuditLogReader, AuditLogWriter, BookingListQuery, BookingReader, BookingWriter,
    BusinessListQuery, BusinessReader, BusinessWriter, CategoryReader, CategoryWriter, ServiceReader, UserListQuery,
    UserReader, UserWriter,
};
use crate::services::bookings::booking_dto;
use crate::services::main::merged_categories;

use super::{ServiceError, ServiceResult};

fn require_admin(user: &AuthenticatedUser) -> ServiceResult<UserId> {
    if !check_role(UserRole::Admin, user) {
        return Err(ServiceError::Unauthorized);
    }
    user.user_id().map_err(|e| {
        log::error!("Invalid user id in session claims: {e}");
        ServiceError::Internal
    })
}

fn record<R>(
    repo: &R,
    user: &AuthenticatedUser,
    action: &str,
    target_type: &str,
    target_id: String,
    details: serde_json::Value,
) where
    R: AuditLogWriter,
{
    let Ok(actor_id) = user.user_id() else {
        return;
    };
    let entry = NewAuditEntry {
        action: action.to_string(),
        actor_id,
        actor_role: UserRole::Admin,
        target_type: Some(target_type.to_string()),
        target_id: Some(target_id),
        details: details.to_string(),
        created_at: Utc::now().naive_utc(),
    };
    if let Err(e) = repo.append_audit_entry(&entry) {
        log::error!("Failed to append audit entry: {e}");
    }
}

pub fn dashboard_stats<R>(user: &AuthenticatedUser, repo: &R) -> ServiceResult<DashboardStats>
where
    R: UserReader + BusinessReader + BookingReader,
{
    require_admin(user)?;

    let users = repo.user_counts().map_err(|e| {
        log::error!("Failed to count users: {e}");
        ServiceError::Internal
    })?;
    let businesses = repo.business_counts().map_err(|e| {
        log::error!("Failed to count businesses: {e}");
        ServiceError::Internal
    })?;
    let bookings = repo.booking_counts().map_err(|e| {
        log::error!("Failed to count bookings: {e}");
        ServiceError::Internal
    })?;

    Ok(DashboardStats {
        users,
        businesses,
        bookings,
    })
}

pub fn list_users<R>(
    user: &AuthenticatedUser,
    search: Option<String>,
    page: usize,
    repo: &R,
) -> ServiceResult<(usize, Vec<User>)>
where
    R: UserReader,
{
    require_admin(user)?;

    let mut query = UserListQuery::default().paginate(page.max(1), DEFAULT_ITEMS_PER_PAGE);
    if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
        query = query.search(search.trim());
    }

    match repo.list_users(query) {
        Ok(result) => Ok(result),
        Err(e) => {
            log::error!("Failed to list users: {e}");
            Err(ServiceError::Internal)
        }
    }
}

pub fn user_detail<R>(id: UserId, user: &AuthenticatedUser, repo: &R) -> ServiceResult<User>
where
    R: UserReader,
{
    require_admin(user)?;

    match repo.get_user_by_id(id) {
        Ok(Some(found)) => Ok(found),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get user: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Flip a user's active flag. Admins cannot deactivate themselves.
pub fn toggle_user_active<R>(
    id: UserId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: UserReader + UserWriter + AuditLogWriter,
{
    let actor_id = require_admin(user)?;
    if actor_id == id {
        return Err(ServiceError::Form(
            "You cannot deactivate your own account.".to_string(),
        ));
    }

    let target = match repo.get_user_by_id(id) {
        Ok(Some(target)) => target,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get user: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let next_active = !target.is_active;
    match repo.set_user_active(id, next_active) {
        Ok(_) => {
            let action = if next_active {
                "user.activated"
            } else {
                "user.deactivated"
            };
            record(
                repo,
                user,
                action,
                "user",
                id.to_string(),
                serde_json::json!({ "email": target.email.as_str() }),
            );
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to toggle user status: {e}");
            Ok(false)
        }
    }
}

pub fn list_businesses<R>(
    user: &AuthenticatedUser,
    search: Option<String>,
    page: usize,
    repo: &R,
) -> ServiceResult<(usize, Vec<BusinessCardDto>)>
where
    R: BusinessReader + UserReader,
{
    require_admin(user)?;

    let mut query = BusinessListQuery::default()
        .include_inactive()
        .paginate(page.max(1), DEFAULT_ITEMS_PER_PAGE);
    if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
        query = query.search(search.trim());
    }

    match repo.list_businesses(query) {
        Ok((total, businesses)) => Ok((
            total,
            businesses
                .iter()
                .map(|b| BusinessCardDto::new(b, None))
                .collect(),
        )),
        Err(e) => {
            log::error!("Failed to list businesses: {e}");
            Err(ServiceError::Internal)
        }
    }
}

pub fn toggle_business_active<R>(
    id: BusinessId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BusinessReader + BusinessWriter + AuditLogWriter,
{
    require_admin(user)?;

    let target = match repo.get_business_by_id(id) {
        Ok(Some(target)) => target,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get business: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let next_active = !target.is_active;
    match repo.set_business_active(id, next_active) {
        Ok(_) => {
            let action = if next_active {
                "business.activated"
            } else {
                "business.deactivated"
            };
            record(
                repo,
                user,
                action,
                "business",
                id.to_string(),
                serde_json::json!({ "name": target.name.as_str() }),
            );
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to toggle business status: {e}");
            Ok(false)
        }
    }
}

pub fn list_bookings<R>(
    user: &AuthenticatedUser,
    status: Option<crate::domain::types::BookingStatus>,
    page: usize,
    repo: &R,
) -> ServiceResult<(usize, Vec<BookingDto>)>
where
    R: BookingReader + BusinessReader + ServiceReader + UserReader,
{
    require_admin(user)?;

    let mut query = BookingListQuery::default().paginate(page.max(1), DEFAULT_ITEMS_PER_PAGE);
    if let Some(status) = status {
        query = query.status(status);
    }

    match repo.list_bookings(query) {
        Ok((total, bookings)) => Ok((
            total,
            bookings.iter().map(|b| booking_dto(b, repo)).collect(),
        )),
        Err(e) => {
            log::error!("Failed to list bookings: {e}");
            Err(ServiceError::Internal)
        }
    }
}

pub fn booking_detail<R>(
    id: BookingId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<BookingDto>
where
    R: BookingReader + BusinessReader + ServiceReader + UserReader,
{
    require_admin(user)?;

    match repo.get_booking_by_id(id) {
        Ok(Some(booking)) => Ok(booking_dto(&booking, repo)),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get booking: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Admin override: drive any transition the state machine allows.
pub fn update_booking_status<R>(
    id: BookingId,
    payload: UpdateBookingStatusFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
    notifier: &BookingNotifier,
) -> ServiceResult<bool>
where
    R: BookingReader + BookingWriter + BusinessReader + UserReader + AuditLogWriter,
{
    require_admin(user)?;

    let booking = match repo.get_booking_by_id(id) {
        Ok(Some(booking)) => booking,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get booking: {e}");
            return Err(ServiceError::Internal);
        }
    };

    if !booking.status.can_transition_to(payload.status) {
        return Err(ServiceError::Form(format!(
            "Cannot move booking from {} to {}",
            booking.status, payload.status
        )));
    }

    match repo.transition_booking(id, payload.status, Utc::now().naive_utc()) {
        Ok(_) => {
            record(
                repo,
                user,
                "booking.status_changed",
                "booking",
                id.to_string(),
                serde_json::json!({
                    "from": booking.status.as_str(),
                    "to": payload.status.as_str(),
                }),
            );
            crate::services::bookings::dispatch_event(&booking, payload.status, repo, notifier);
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to update booking status: {e}");
            Ok(false)
        }
    }
}

/// Admin view of one business, including inactive services.
pub fn business_detail<R>(
    id: BusinessId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<(BusinessCardDto, Vec<crate::dto::businesses::ServiceDto>)>
where
    R: BusinessReader + ServiceReader,
{
    require_admin(user)?;

    let business = match repo.get_business_by_id(id) {
        Ok(Some(business)) => business,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get business: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let services = match repo.list_services(
        crate::repository::ServiceListQuery::new(business.id).include_inactive(),
    ) {
        Ok(services) => services
            .into_iter()
            .map(crate::dto::businesses::ServiceDto::from)
            .collect(),
        Err(e) => {
            log::error!("Failed to list services: {e}");
            return Err(ServiceError::Internal);
        }
    };

    Ok((BusinessCardDto::new(&business, None), services))
}

/// The merged registry, for the admin categories page.
pub fn categories<R>(user: &AuthenticatedUser, repo: &R) -> ServiceResult<Vec<CategoryDto>>
where
    R: CategoryReader,
{
    require_admin(user)?;
    merged_categories(repo)
}

pub fn create_category<R>(
    payload: CreateCategoryFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: CategoryReader + CategoryWriter + AuditLogWriter,
{
    require_admin(user)?;

    match repo.get_category_by_slug(&payload.slug) {
        Ok(Some(_)) => {
            return Err(ServiceError::Form(format!(
                "Category '{}' is already registered.",
                payload.slug
            )));
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Failed to look up category: {e}");
            return Err(ServiceError::Internal);
        }
    }

    let slug = payload.slug.clone();
    match repo.create_category(&payload.into_new_category()) {
        Ok(_) => {
            record(
                repo,
                user,
                "category.created",
                "category",
                slug.to_string(),
                serde_json::json!({}),
            );
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to create category: {e}");
            Ok(false)
        }
    }
}

/// Edit a registered category. Editing a built-in creates an overriding row.
pub fn edit_category<R>(
    raw_slug: &str,
    payload: EditCategoryFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: CategoryReader + CategoryWriter + AuditLogWriter,
{
    require_admin(user)?;
    let slug = CategorySlug::new(raw_slug).map_err(|_| ServiceError::NotFound)?;

    let registered = match repo.get_category_by_slug(&slug) {
        Ok(registered) => registered,
        Err(e) => {
            log::error!("Failed to look up category: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let outcome = if registered.is_some() {
        repo.update_category(&slug, &payload.into_category_update())
    } else if builtin_category(slug.as_str()).is_some() {
        let now = Utc::now().naive_utc();
        let override_row = crate::domain::category::NewCategory {
            slug: slug.clone(),
            name: payload.name,
            description: payload.description,
            icon: payload.icon,
            tags: payload.tags,
            created_at: now,
            updated_at: now,
        };
        repo.create_category(&override_row)
    } else {
        return Err(ServiceError::NotFound);
    };

    match outcome {
        Ok(_) => {
            record(
                repo,
                user,
                "category.updated",
                "category",
                slug.to_string(),
                serde_json::json!({}),
            );
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to update category: {e}");
            Ok(false)
        }
    }
}

/// Remove a registered category row. Built-ins without an overriding row
/// cannot be removed from the registry.
pub fn delete_category<R>(
    raw_slug: &str,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: CategoryReader + CategoryWriter + AuditLogWriter,
{
    require_admin(user)?;
    let slug = CategorySlug::new(raw_slug).map_err(|_| ServiceError::NotFound)?;

    match repo.get_category_by_slug(&slug) {
        Ok(Some(_)) => {}
        Ok(None) => {
            if builtin_category(slug.as_str()).is_some() {
                return Err(ServiceError::Form(
                    "Built-in categories cannot be removed.".to_string(),
                ));
            }
            return Err(ServiceError::NotFound);
        }
        Err(e) => {
            log::error!("Failed to look up category: {e}");
            return Err(ServiceError::Internal);
        }
    }

    match repo.delete_category(&slug) {
        Ok(_) => {
            record(
                repo,
                user,
                "category.deleted",
                "category",
                slug.to_string(),
                serde_json::json!({}),
            );
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to delete category: {e}");
            Ok(false)
        }
    }
}

pub fn audit_log<R>(
    user: &AuthenticatedUser,
    page: usize,
    repo: &R,
) -> ServiceResult<(usize, Vec<AuditEntry>)>
where
    R: AuditLogReader,
{
    require_admin(user)?;

    match repo.list_audit_entries(Some(Pagination::new(page.max(1), DEFAULT_ITEMS_PER_PAGE))) {
        Ok(result) => Ok(result),
        Err(e) => {
            log::error!("Failed to list audit entries: {e}");
            Err(ServiceError::Internal)
        }
    }
}
