use chrono::{Duration, NaiveDate, Utc};

use crate::auth::{check_role, AuthenticatedUser};
use crate::domain::booking::{available_slots as slot_grid, Booking, NewBooking};
use crate::domain::business::Business;
use crate::domain::types::{BookingId, BookingStatus, BusinessId, ServiceId, UserId, UserRole};
use crate::dto::bookings::BookingDto;
use crate::forms::bookings::{CreateBookingFormPayload, RejectBookingFormPayload};
use crate::notify::{BookingEvent, BookingNotifier};
use crate::pagination::DEFAULT_ITEMS_PER_PAGE;
use crate::repository::{
    AuditLogWriter, BookingListQuery, BookingReader, BookingWriter, BusinessListQuery,
    BusinessReader, ServiceReader, UserReader,
};

use super::{ServiceError, ServiceResult};

fn session_user_id(user: &AuthenticatedUser) -> ServiceResult<UserId> {
    user.user_id().map_err(|e| {
        log::error!("Invalid user id in session claims: {e}");
        ServiceError::Internal
    })
}

/// Fan a status change out to the notifier. Missing related records are
/// logged and swallowed so notification trouble never fails the operation.
pub(crate) fn dispatch_event<R>(booking: &Booking, status: BookingStatus, repo: &R, notifier: &BookingNotifier)
where
    R: UserReader + BusinessReader,
{
    let customer = match repo.get_user_by_id(booking.customer_id) {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            log::error!("Booking {} has no customer record", booking.id);
            return;
        }
        Err(e) => {
            log::error!("Failed to load booking customer: {e}");
            return;
        }
    };

    let business = match repo.get_business_by_id(booking.business_id) {
        Ok(Some(business)) => business,
        Ok(None) => {
            log::error!("Booking {} has no business record", booking.id);
            return;
        }
        Err(e) => {
            log::error!("Failed to load booking business: {e}");
            return;
        }
    };

    let owner = business
        .owner_id
        .and_then(|owner_id| repo.get_user_by_id(owner_id).ok().flatten());

    notifier.notify(&BookingEvent {
        booking: booking.clone(),
        status,
        customer,
        business,
        owner,
    });
}

fn record_decision<R>(
    repo: &R,
    user: &AuthenticatedUser,
    action: &str,
    booking: &Booking,
    details: serde_json::Value,
) where
    R: AuditLogWriter,
{
    let Ok(actor_id) = user.user_id() else {
        return;
    };
    let Some(actor_role) = user.parsed_role() else {
        return;
    };
    let entry = crate::domain::audit::NewAuditEntry {
        action: action.to_string(),
        actor_id,
        actor_role,
        target_type: Some("booking".to_string()),
        target_id: Some(booking.id.to_string()),
        details: details.to_string(),
        created_at: Utc::now().naive_utc(),
    };
    if let Err(e) = repo.append_audit_entry(&entry) {
        log::error!("Failed to append audit entry: {e}");
    }
}

/// Create a booking for an active service, rejecting time conflicts with
/// non-terminal bookings of the same business.
pub fn create_booking<R>(
    payload: CreateBookingFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
    notifier: &BookingNotifier,
) -> ServiceResult<Booking>
where
    R: ServiceReader + BusinessReader + BookingReader + BookingWriter + UserReader,
{
    if !check_role(UserRole::Customer, user) {
        return Err(ServiceError::Unauthorized);
    }
    let customer_id = session_user_id(user)?;

    let service = match repo.get_service_by_id(payload.service_id) {
        Ok(Some(service)) => service,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get service: {e}");
            return Err(ServiceError::Internal);
        }
    };
    if !service.is_active {
        return Err(ServiceError::Form(
            "This service is no longer offered.".to_string(),
        ));
    }

    let business = match repo.get_business_by_id(service.business_id) {
        Ok(Some(business)) => business,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get business: {e}");
            return Err(ServiceError::Internal);
        }
    };
    if !business.is_active {
        return Err(ServiceError::Form(
            "This business is not taking bookings right now.".to_string(),
        ));
    }

    let start = payload.booking_time;
    let end = start + Duration::minutes(service.duration_minutes.get() as i64);
    match repo.find_conflicting_booking(business.id, start, end) {
        Ok(Some(_)) => {
            return Err(ServiceError::Form(
                "The selected time conflicts with an existing booking.".to_string(),
            ));
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Failed to check booking conflicts: {e}");
            return Err(ServiceError::Internal);
        }
    }

    let now = Utc::now().naive_utc();
    let new_booking = NewBooking {
        business_id: business.id,
        service_id: service.id,
        customer_id,
        booking_time: start,
        duration_minutes: service.duration_minutes,
        price: service.price,
        payment_method: payload.payment_method,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    let booking = match repo.create_booking(&new_booking) {
        Ok(booking) => booking,
        Err(e) => {
            log::error!("Failed to create booking: {e}");
            return Err(ServiceError::Internal);
        }
    };

    dispatch_event(&booking, BookingStatus::Requested, repo, notifier);
    Ok(booking)
}

/// Customer cancels their own booking while it is still cancellable.
pub fn cancel_booking<R>(
    id: BookingId,
    user: &AuthenticatedUser,
    repo: &R,
    notifier: &BookingNotifier,
) -> ServiceResult<bool>
where
    R: BookingReader + BookingWriter + BusinessReader + UserReader + AuditLogWriter,
{
    let user_id = session_user_id(user)?;

    let booking = match repo.get_booking_by_id(id) {
        Ok(Some(booking)) => booking,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get booking: {e}");
            return Err(ServiceError::Internal);
        }
    };

    if booking.customer_id != user_id {
        log::warn!("User {user_id} attempted to cancel booking {id} they do not own");
        return Err(ServiceError::Unauthorized);
    }

    if !booking.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(ServiceError::Form(format!(
            "Cannot cancel booking with status: {}",
            booking.status
        )));
    }

    match repo.transition_booking(id, BookingStatus::Cancelled, Utc::now().naive_utc()) {
        Ok(_) => {
            record_decision(
                repo,
                user,
                "booking.cancelled",
                &booking,
                serde_json::json!({ "previous_status": booking.status.as_str() }),
            );
            dispatch_event(&booking, BookingStatus::Cancelled, repo, notifier);
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to cancel booking: {e}");
            Ok(false)
        }
    }
}

/// Resolve a booking and verify the acting owner controls its business.
fn owned_booking<R>(
    id: BookingId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<(Booking, Business)>
where
    R: BookingReader + BusinessReader,
{
    if !check_role(UserRole::BusinessOwner, user) {
        return Err(ServiceError::Unauthorized);
    }
    let user_id = session_user_id(user)?;

    let booking = match repo.get_booking_by_id(id) {
        Ok(Some(booking)) => booking,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get booking: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let business = match repo.get_business_by_id(booking.business_id) {
        Ok(Some(business)) => business,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get business: {e}");
            return Err(ServiceError::Internal);
        }
    };

    if business.owner_id != Some(user_id) {
        log::warn!("Unauthorized booking access by {user_id} on booking {id}");
        return Err(ServiceError::Unauthorized);
    }

    Ok((booking, business))
}

fn owner_transition<R>(
    id: BookingId,
    next: BookingStatus,
    action: &str,
    details: serde_json::Value,
    user: &AuthenticatedUser,
    repo: &R,
    notifier: &BookingNotifier,
) -> ServiceResult<bool>
where
    R: BookingReader + BookingWriter + BusinessReader + UserReader + AuditLogWriter,
{
    let (booking, _business) = owned_booking(id, user, repo)?;

    if !booking.status.can_transition_to(next) {
        return Err(ServiceError::Form(format!(
            "Cannot move booking from {} to {}",
            booking.status, next
        )));
    }

    match repo.transition_booking(id, next, Utc::now().naive_utc()) {
        Ok(_) => {
            record_decision(repo, user, action, &booking, details);
            dispatch_event(&booking, next, repo, notifier);
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to update booking status: {e}");
            Ok(false)
        }
    }
}

/// `requested -> accepted`, owner only.
pub fn accept_booking<R>(
    id: BookingId,
    user: &AuthenticatedUser,
    repo: &R,
    notifier: &BookingNotifier,
) -> ServiceResult<bool>
where
    R: BookingReader + BookingWriter + BusinessReader + UserReader + AuditLogWriter,
{
    owner_transition(
        id,
        BookingStatus::Accepted,
        "booking.accepted",
        serde_json::json!({}),
        user,
        repo,
        notifier,
    )
}

/// `requested -> rejected`, owner only, with an optional reason.
pub fn reject_booking<R>(
    id: BookingId,
    payload: RejectBookingFormPayload,
    user: &AuthenticatedUser,
    repo: &R,
    notifier: &BookingNotifier,
) -> ServiceResult<bool>
where
    R: BookingReader + BookingWriter + BusinessReader + UserReader + AuditLogWriter,
{
    owner_transition(
        id,
        BookingStatus::Rejected,
        "booking.rejected",
        serde_json::json!({ "reason": payload.reason }),
        user,
        repo,
        notifier,
    )
}

/// `accepted -> completed`, owner only.
pub fn complete_booking<R>(
    id: BookingId,
    user: &AuthenticatedUser,
    repo: &R,
    notifier: &BookingNotifier,
) -> ServiceResult<bool>
where
    R: BookingReader + BookingWriter + BusinessReader + UserReader + AuditLogWriter,
{
    owner_transition(
        id,
        BookingStatus::Completed,
        "booking.completed",
        serde_json::json!({}),
        user,
        repo,
        notifier,
    )
}

/// Record payment received for an accepted or completed booking.
pub fn mark_payment_received<R>(
    id: BookingId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<bool>
where
    R: BookingReader + BookingWriter + BusinessReader + AuditLogWriter,
{
    let (booking, _business) = owned_booking(id, user, repo)?;

    if !matches!(
        booking.status,
        BookingStatus::Accepted | BookingStatus::Completed
    ) {
        return Err(ServiceError::Form(format!(
            "Cannot record payment for booking with status: {}",
            booking.status
        )));
    }

    let user_id = session_user_id(user)?;
    match repo.mark_payment_received(id, user_id, Utc::now().naive_utc()) {
        Ok(_) => {
            record_decision(
                repo,
                user,
                "booking.payment_received",
                &booking,
                serde_json::json!({ "method": booking.payment_method.as_str() }),
            );
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to record payment: {e}");
            Ok(false)
        }
    }
}

/// Resolve display names for a booking row.
pub fn booking_dto<R>(booking: &Booking, repo: &R) -> BookingDto
where
    R: BusinessReader + ServiceReader + UserReader,
{
    let business_name = repo
        .get_business_by_id(booking.business_id)
        .ok()
        .flatten()
        .map(|b| b.name.into_inner())
        .unwrap_or_default();
    let service_name = repo
        .get_service_by_id(booking.service_id)
        .ok()
        .flatten()
        .map(|s| s.name.into_inner())
        .unwrap_or_default();
    let customer_name = repo
        .get_user_by_id(booking.customer_id)
        .ok()
        .flatten()
        .map(|u| u.name.into_inner())
        .unwrap_or_default();
    BookingDto::new(booking, &business_name, &service_name, &customer_name)
}

/// The signed-in customer's bookings.
pub fn my_bookings<R>(
    user: &AuthenticatedUser,
    status: Option<BookingStatus>,
    page: usize,
    repo: &R,
) -> ServiceResult<(usize, Vec<BookingDto>)>
where
    R: BookingReader + BusinessReader + ServiceReader + UserReader,
{
    if !check_role(UserRole::Customer, user) {
        return Err(ServiceError::Unauthorized);
    }
    let customer_id = session_user_id(user)?;

    let mut query = BookingListQuery::default()
        .customer(customer_id)
        .paginate(page.max(1), DEFAULT_ITEMS_PER_PAGE);
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

/// Identifiers of the acting owner's businesses.
fn owned_business_ids<R>(user_id: UserId, repo: &R) -> ServiceResult<Vec<BusinessId>>
where
    R: BusinessReader,
{
    match repo.list_businesses(BusinessListQuery::default().owner(user_id).include_inactive()) {
        Ok((_total, businesses)) => Ok(businesses.into_iter().map(|b| b.id).collect()),
        Err(e) => {
            log::error!("Failed to list owned businesses: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Bookings across the acting owner's businesses, optionally narrowed to one
/// business and one status.
pub fn owner_bookings<R>(
    user: &AuthenticatedUser,
    business_id: Option<BusinessId>,
    status: Option<BookingStatus>,
    page: usize,
    repo: &R,
) -> ServiceResult<(usize, Vec<BookingDto>)>
where
    R: BookingReader + BusinessReader + ServiceReader + UserReader,
{
    if !check_role(UserRole::BusinessOwner, user) {
        return Err(ServiceError::Unauthorized);
    }
    let user_id = session_user_id(user)?;
    let owned = owned_business_ids(user_id, repo)?;

    let mut query = BookingListQuery::default().paginate(page.max(1), DEFAULT_ITEMS_PER_PAGE);
    match business_id {
        Some(business_id) => {
            if !owned.contains(&business_id) {
                return Err(ServiceError::Unauthorized);
            }
            query = query.business(business_id);
        }
        None => {
            if owned.is_empty() {
                return Ok((0, vec![]));
            }
            query = query.businesses(owned);
        }
    }
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

/// Owner view of one booking.
pub fn owner_booking_detail<R>(
    id: BookingId,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<BookingDto>
where
    R: BookingReader + BusinessReader + ServiceReader + UserReader,
{
    let (booking, _business) = owned_booking(id, user, repo)?;
    Ok(booking_dto(&booking, repo))
}

/// Free hourly start times for a service on a date.
pub fn available_slots<R>(
    service_id: ServiceId,
    date: NaiveDate,
    repo: &R,
) -> ServiceResult<Vec<String>>
where
    R: ServiceReader + BookingReader,
{
    let service = match repo.get_service_by_id(service_id) {
        Ok(Some(service)) => service,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get service: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let (_total, bookings) = match repo.list_bookings(
        BookingListQuery::default()
            .business(service.business_id)
            .on_date(date),
    ) {
        Ok(result) => result,
        Err(e) => {
            log::error!("Failed to list bookings: {e}");
            return Err(ServiceError::Internal);
        }
    };

    Ok(slot_grid(date, service.duration_minutes, &bookings)
        .into_iter()
        .map(|slot| slot.format("%H:%M").to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::service::Service;
    use crate::domain::types::{
        BusinessName, CategorySlug, CityName, DistrictName, DurationMinutes, EmailAddress,
        PaymentMethod, PhoneNumber, Price, ServiceName, StreetAddress, UserName,
    };
    use crate::domain::user::User;
    use crate::repository::test::TestRepository;
    use chrono::{DateTime, NaiveDate};

    fn at_epoch() -> chrono::NaiveDateTime {
        DateTime::from_timestamp(0, 0).unwrap().naive_utc()
    }

    fn customer_claims() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: 1,
            email: "alice@example.com".into(),
            name: "Alice".into(),
            role: "customer".into(),
        }
    }

    fn owner_claims() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: 2,
            email: "owner@example.com".into(),
            name: "Owen".into(),
            role: "business_owner".into(),
        }
    }

    fn sample_user(id: i32, role: UserRole) -> User {
        User {
            id: UserId::new(id).unwrap(),
            name: UserName::new("Someone").unwrap(),
            email: EmailAddress::new(format!("user{id}@example.com")).unwrap(),
            phone: None,
            password_hash: String::new(),
            street_house: StreetAddress::new("1 Main St").unwrap(),
            city: CityName::new("Springfield").unwrap(),
            district: DistrictName::new("Center").unwrap(),
            profile_pic_url: None,
            role,
            is_verified: true,
            is_active: true,
            reset_token: None,
            reset_token_expires: None,
            created_at: at_epoch(),
            updated_at: at_epoch(),
        }
    }

    fn sample_business(id: i32, owner: Option<i32>) -> Business {
        Business {
            id: BusinessId::new(id).unwrap(),
            owner_id: owner.map(|o| UserId::new(o).unwrap()),
            owner_name: None,
            name: BusinessName::new("Smith Plumbing").unwrap(),
            email: EmailAddress::new("smith@plumbing.com").unwrap(),
            phone: PhoneNumber::new("555-0000").unwrap(),
            street_house: StreetAddress::new("2 Pipe Rd").unwrap(),
            city: CityName::new("Springfield").unwrap(),
            district: DistrictName::new("North").unwrap(),
            description: None,
            profile_pic_url: None,
            gallery: vec![],
            category: CategorySlug::new("plumbing").unwrap(),
            is_active: true,
            created_at: at_epoch(),
            updated_at: at_epoch(),
        }
    }

    fn sample_service(id: i32, business_id: i32, active: bool) -> Service {
        Service {
            id: ServiceId::new(id).unwrap(),
            business_id: BusinessId::new(business_id).unwrap(),
            name: ServiceName::new("Drain cleaning").unwrap(),
            description: None,
            price: Price::new(40.0).unwrap(),
            duration_minutes: DurationMinutes::new(60).unwrap(),
            is_active: active,
            created_at: at_epoch(),
            updated_at: at_epoch(),
        }
    }

    fn sample_booking(id: i32, hour: u32, status: BookingStatus) -> Booking {
        let time = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Booking {
            id: BookingId::new(id).unwrap(),
            business_id: BusinessId::new(1).unwrap(),
            service_id: ServiceId::new(1).unwrap(),
            customer_id: UserId::new(1).unwrap(),
            booking_time: time,
            duration_minutes: DurationMinutes::new(60).unwrap(),
            price: Price::new(40.0).unwrap(),
            status,
            payment_method: PaymentMethod::Cash,
            payment_received: false,
            payment_received_at: None,
            payment_received_by: None,
            notes: None,
            requested_at: Some(time),
            accepted_at: None,
            rejected_at: None,
            cancelled_at: None,
            completed_at: None,
            created_at: time,
            updated_at: time,
        }
    }

    fn payload_at(hour: u32) -> CreateBookingFormPayload {
        CreateBookingFormPayload {
            service_id: ServiceId::new(1).unwrap(),
            booking_time: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            notes: None,
            payment_method: PaymentMethod::Cash,
        }
    }

    fn booking_repo() -> TestRepository {
        TestRepository::new()
            .with_users(vec![
                sample_user(1, UserRole::Customer),
                sample_user(2, UserRole::BusinessOwner),
            ])
            .with_businesses(vec![sample_business(1, Some(2))])
            .with_services(vec![sample_service(1, 1, true)])
    }

    #[test]
    fn creates_booking_copying_service_terms() {
        let repo = booking_repo();
        let booking = create_booking(
            payload_at(10),
            &customer_claims(),
            &repo,
            &BookingNotifier::new(),
        )
        .unwrap();

        assert_eq!(booking.status, BookingStatus::Requested);
        assert_eq!(booking.price.get(), 40.0);
        assert_eq!(booking.duration_minutes.get(), 60);
        assert!(booking.requested_at.is_some());
    }

    #[test]
    fn rejects_overlapping_bookings() {
        let repo = booking_repo().with_bookings(vec![sample_booking(1, 10, BookingStatus::Accepted)]);

        let err = create_booking(
            payload_at(10),
            &customer_claims(),
            &repo,
            &BookingNotifier::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn terminal_bookings_do_not_block_new_ones() {
        let repo =
            booking_repo().with_bookings(vec![sample_booking(1, 10, BookingStatus::Cancelled)]);

        assert!(create_booking(
            payload_at(10),
            &customer_claims(),
            &repo,
            &BookingNotifier::new(),
        )
        .is_ok());
    }

    #[test]
    fn inactive_services_cannot_be_booked() {
        let repo = TestRepository::new()
            .with_users(vec![sample_user(1, UserRole::Customer)])
            .with_businesses(vec![sample_business(1, Some(2))])
            .with_services(vec![sample_service(1, 1, false)]);

        let err = create_booking(
            payload_at(10),
            &customer_claims(),
            &repo,
            &BookingNotifier::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn owners_cannot_create_customer_bookings() {
        let repo = booking_repo();
        let err = create_booking(
            payload_at(10),
            &owner_claims(),
            &repo,
            &BookingNotifier::new(),
        )
        .unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized);
    }

    #[test]
    fn accept_requires_requested_status() {
        let repo = booking_repo().with_bookings(vec![sample_booking(1, 10, BookingStatus::Accepted)]);

        let err = accept_booking(
            BookingId::new(1).unwrap(),
            &owner_claims(),
            &repo,
            &BookingNotifier::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn accept_records_an_audit_entry() {
        let repo =
            booking_repo().with_bookings(vec![sample_booking(1, 10, BookingStatus::Requested)]);

        assert!(accept_booking(
            BookingId::new(1).unwrap(),
            &owner_claims(),
            &repo,
            &BookingNotifier::new(),
        )
        .unwrap());

        let entries = repo.audit_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "booking.accepted");
    }

    #[test]
    fn only_the_owner_may_accept() {
        let repo = booking_repo().with_bookings(vec![sample_booking(1, 10, BookingStatus::Requested)]);
        let stranger = AuthenticatedUser {
            sub: 9,
            email: "other@example.com".into(),
            name: "Other".into(),
            role: "business_owner".into(),
        };

        let err = accept_booking(
            BookingId::new(1).unwrap(),
            &stranger,
            &repo,
            &BookingNotifier::new(),
        )
        .unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized);
    }

    #[test]
    fn customers_cancel_only_their_own_bookings() {
        let repo = booking_repo().with_bookings(vec![sample_booking(1, 10, BookingStatus::Requested)]);
        let other_customer = AuthenticatedUser {
            sub: 7,
            email: "mallory@example.com".into(),
            name: "Mallory".into(),
            role: "customer".into(),
        };

        let err = cancel_booking(
            BookingId::new(1).unwrap(),
            &other_customer,
            &repo,
            &BookingNotifier::new(),
        )
        .unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized);
    }

    #[test]
    fn completed_bookings_cannot_be_cancelled() {
        let repo = booking_repo().with_bookings(vec![sample_booking(1, 10, BookingStatus::Completed)]);

        let err = cancel_booking(
            BookingId::new(1).unwrap(),
            &customer_claims(),
            &repo,
            &BookingNotifier::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn payment_requires_accepted_or_completed() {
        let repo = booking_repo().with_bookings(vec![sample_booking(1, 10, BookingStatus::Requested)]);

        let err =
            mark_payment_received(BookingId::new(1).unwrap(), &owner_claims(), &repo).unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn slots_reflect_existing_bookings() {
        let repo = booking_repo().with_bookings(vec![sample_booking(1, 10, BookingStatus::Accepted)]);

        let slots = available_slots(
            ServiceId::new(1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            &repo,
        )
        .unwrap();

        assert!(!slots.contains(&"10:00".to_string()));
        assert!(slots.contains(&"09:00".to_string()));
        assert!(slots.contains(&"11:00".to_string()));
    }

    #[test]
    fn my_bookings_filters_by_status() {
        let repo = booking_repo().with_bookings(vec![
            sample_booking(1, 10, BookingStatus::Requested),
            sample_booking(2, 12, BookingStatus::Completed),
        ]);

        let (total, rows) =
            my_bookings(&customer_claims(), Some(BookingStatus::Completed), 1, &repo).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].status, "completed");
        assert_eq!(rows[0].business_name, "Smith Plumbing");
    }

    #[test]
    fn owner_bookings_reject_foreign_business_filter() {
        let repo = booking_repo();
        let err = owner_bookings(
            &owner_claims(),
            Some(BusinessId::new(99).unwrap()),
            None,
            1,
            &repo,
        )
        .unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized);
    }
}
