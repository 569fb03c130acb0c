use chrono::{Duration, NaiveDate, Utc};
use localserve::domain::booking::NewBooking;
use localserve::domain::business::NewBusiness;
use localserve::domain::category::{CategoryUpdate, NewCategory};
use localserve::domain::service::NewService;
use localserve::domain::types::{
    BookingStatus, BusinessName, CategoryName, CategorySlug, CityName, DistrictName,
    DurationMinutes, EmailAddress, PaymentMethod, PhoneNumber, Price, ServiceName, StreetAddress,
    UserName, UserRole,
};
use localserve::domain::user::NewUser;
use localserve::repository::{
    BookingReader, BookingWriter, BusinessListQuery, BusinessReader, BusinessWriter,
    CategoryReader, CategoryWriter, DieselRepository, ServiceReader, ServiceWriter, UserReader,
    UserWriter,
};

mod common;

fn new_user(email: &str, role: UserRole) -> NewUser {
    let now = Utc::now().naive_utc();
    NewUser {
        name: UserName::new("Test User").expect("valid name"),
        email: EmailAddress::new(email).expect("valid email"),
        phone: None,
        password_hash: "$argon2id$stub".to_string(),
        street_house: StreetAddress::new("1 Main St").expect("valid street"),
        city: CityName::new("Springfield").expect("valid city"),
        district: DistrictName::new("Center").expect("valid district"),
        role,
        created_at: now,
        updated_at: now,
    }
}

fn new_business(owner_id: localserve::domain::types::UserId) -> NewBusiness {
    let now = Utc::now().naive_utc();
    NewBusiness {
        owner_id: Some(owner_id),
        owner_name: None,
        name: BusinessName::new("Smith Plumbing").expect("valid name"),
        email: EmailAddress::new("smith@plumbing.com").expect("valid email"),
        phone: PhoneNumber::new("555-0000").expect("valid phone"),
        street_house: StreetAddress::new("2 Pipe Rd").expect("valid street"),
        city: CityName::new("Springfield").expect("valid city"),
        district: DistrictName::new("North").expect("valid district"),
        description: Some("Licensed plumbers".to_string()),
        category: CategorySlug::new("plumbing").expect("valid slug"),
        created_at: now,
        updated_at: now,
    }
}

fn new_service(business_id: localserve::domain::types::BusinessId) -> NewService {
    let now = Utc::now().naive_utc();
    NewService {
        business_id,
        name: ServiceName::new("Drain cleaning").expect("valid name"),
        description: None,
        price: Price::new(40.0).expect("valid price"),
        duration_minutes: DurationMinutes::new(60).expect("valid duration"),
        created_at: now,
        updated_at: now,
    }
}

fn new_booking(
    business_id: localserve::domain::types::BusinessId,
    service_id: localserve::domain::types::ServiceId,
    customer_id: localserve::domain::types::UserId,
    hour: u32,
) -> NewBooking {
    let now = Utc::now().naive_utc();
    let time = NaiveDate::from_ymd_opt(2025, 6, 2)
        .expect("valid date")
        .and_hms_opt(hour, 0, 0)
        .expect("valid time");
    NewBooking {
        business_id,
        service_id,
        customer_id,
        booking_time: time,
        duration_minutes: DurationMinutes::new(60).expect("valid duration"),
        price: Price::new(40.0).expect("valid price"),
        payment_method: PaymentMethod::Cash,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn user_round_trip_and_activation() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let stored = repo
        .create_user(&new_user("alice@example.com", UserRole::Customer))
        .expect("should create user");
    assert!(!stored.is_verified);
    assert!(stored.is_active);

    let by_email = repo
        .get_user_by_email(&EmailAddress::new("alice@example.com").expect("valid email"))
        .expect("lookup should succeed")
        .expect("user should exist");
    assert_eq!(by_email.id, stored.id);

    repo.set_user_active(stored.id, false)
        .expect("should deactivate");
    let reloaded = repo
        .get_user_by_id(stored.id)
        .expect("lookup should succeed")
        .expect("user should exist");
    assert!(!reloaded.is_active);

    repo.set_user_verified(stored.id, true)
        .expect("should verify");
    let reloaded = repo
        .get_user_by_id(stored.id)
        .expect("lookup should succeed")
        .expect("user should exist");
    assert!(reloaded.is_verified);
}

#[test]
fn duplicate_emails_are_rejected_by_the_unique_index() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    repo.create_user(&new_user("alice@example.com", UserRole::Customer))
        .expect("first insert should succeed");
    assert!(repo
        .create_user(&new_user("alice@example.com", UserRole::Customer))
        .is_err());
}

#[test]
fn conflicting_bookings_are_detected_by_interval_overlap() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let owner = repo
        .create_user(&new_user("owner@example.com", UserRole::BusinessOwner))
        .expect("should create owner");
    let customer = repo
        .create_user(&new_user("alice@example.com", UserRole::Customer))
        .expect("should create customer");
    let business = repo
        .create_business(&new_business(owner.id))
        .expect("should create business");
    repo.create_service(&new_service(business.id))
        .expect("should create service");
    let service = repo
        .list_services(localserve::repository::ServiceListQuery::new(business.id))
        .expect("should list services")
        .pop()
        .expect("service should exist");

    let booking = repo
        .create_booking(&new_booking(business.id, service.id, customer.id, 10))
        .expect("should create booking");
    assert_eq!(booking.status, BookingStatus::Requested);
    assert!(booking.requested_at.is_some());

    let date = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");
    // Overlapping interval is reported.
    let conflict = repo
        .find_conflicting_booking(
            business.id,
            date.and_hms_opt(10, 30, 0).expect("valid time"),
            date.and_hms_opt(11, 30, 0).expect("valid time"),
        )
        .expect("conflict check should succeed");
    assert!(conflict.is_some());

    // Touching interval is not a conflict.
    let touching = repo
        .find_conflicting_booking(
            business.id,
            date.and_hms_opt(11, 0, 0).expect("valid time"),
            date.and_hms_opt(12, 0, 0).expect("valid time"),
        )
        .expect("conflict check should succeed");
    assert!(touching.is_none());

    // Terminal bookings release their slot.
    repo.transition_booking(booking.id, BookingStatus::Cancelled, Utc::now().naive_utc())
        .expect("should cancel booking");
    let after_cancel = repo
        .find_conflicting_booking(
            business.id,
            date.and_hms_opt(10, 30, 0).expect("valid time"),
            date.and_hms_opt(11, 30, 0).expect("valid time"),
        )
        .expect("conflict check should succeed");
    assert!(after_cancel.is_none());
}

#[test]
fn transitions_stamp_their_timestamp_columns() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let owner = repo
        .create_user(&new_user("owner@example.com", UserRole::BusinessOwner))
        .expect("should create owner");
    let customer = repo
        .create_user(&new_user("alice@example.com", UserRole::Customer))
        .expect("should create customer");
    let business = repo
        .create_business(&new_business(owner.id))
        .expect("should create business");
    repo.create_service(&new_service(business.id))
        .expect("should create service");
    let service = repo
        .list_services(localserve::repository::ServiceListQuery::new(business.id))
        .expect("should list services")
        .pop()
        .expect("service should exist");
    let booking = repo
        .create_booking(&new_booking(business.id, service.id, customer.id, 10))
        .expect("should create booking");

    let accepted_at = Utc::now().naive_utc();
    repo.transition_booking(booking.id, BookingStatus::Accepted, accepted_at)
        .expect("should accept");
    let reloaded = repo
        .get_booking_by_id(booking.id)
        .expect("lookup should succeed")
        .expect("booking should exist");
    assert_eq!(reloaded.status, BookingStatus::Accepted);
    assert!(reloaded.accepted_at.is_some());
    assert!(reloaded.completed_at.is_none());

    let completed_at = accepted_at + Duration::hours(1);
    repo.transition_booking(booking.id, BookingStatus::Completed, completed_at)
        .expect("should complete");
    let reloaded = repo
        .get_booking_by_id(booking.id)
        .expect("lookup should succeed")
        .expect("booking should exist");
    assert_eq!(reloaded.status, BookingStatus::Completed);
    assert!(reloaded.completed_at.is_some());

    let counts = repo.booking_counts().expect("counts should succeed");
    assert_eq!(counts.total, 1);
    assert_eq!(counts.completed, 1);
    assert!((counts.revenue - 40.0).abs() < f64::EPSILON);
}

#[test]
fn payment_bookkeeping_is_persisted() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let owner = repo
        .create_user(&new_user("owner@example.com", UserRole::BusinessOwner))
        .expect("should create owner");
    let customer = repo
        .create_user(&new_user("alice@example.com", UserRole::Customer))
        .expect("should create customer");
    let business = repo
        .create_business(&new_business(owner.id))
        .expect("should create business");
    repo.create_service(&new_service(business.id))
        .expect("should create service");
    let service = repo
        .list_services(localserve::repository::ServiceListQuery::new(business.id))
        .expect("should list services")
        .pop()
        .expect("service should exist");
    let booking = repo
        .create_booking(&new_booking(business.id, service.id, customer.id, 10))
        .expect("should create booking");

    repo.mark_payment_received(booking.id, owner.id, Utc::now().naive_utc())
        .expect("should record payment");
    let reloaded = repo
        .get_booking_by_id(booking.id)
        .expect("lookup should succeed")
        .expect("booking should exist");
    assert!(reloaded.payment_received);
    assert_eq!(reloaded.payment_received_by, Some(owner.id));
}

#[test]
fn business_listing_filters_and_soft_deletion() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let owner = repo
        .create_user(&new_user("owner@example.com", UserRole::BusinessOwner))
        .expect("should create owner");
    let business = repo
        .create_business(&new_business(owner.id))
        .expect("should create business");

    let (total, by_category) = repo
        .list_businesses(
            BusinessListQuery::default()
                .category(CategorySlug::new("plumbing").expect("valid slug")),
        )
        .expect("should list");
    assert_eq!(total, 1);
    assert_eq!(by_category[0].id, business.id);

    let (total, _) = repo
        .list_businesses(BusinessListQuery::default().search("smith"))
        .expect("should list");
    assert_eq!(total, 1);

    repo.set_business_active(business.id, false)
        .expect("should deactivate");
    let (total, _) = repo
        .list_businesses(BusinessListQuery::default())
        .expect("should list");
    assert_eq!(total, 0);
    let (total, _) = repo
        .list_businesses(BusinessListQuery::default().include_inactive())
        .expect("should list");
    assert_eq!(total, 1);

    // The row is still there, just flagged.
    let reloaded = repo
        .get_business_by_id(business.id)
        .expect("lookup should succeed")
        .expect("business should exist");
    assert!(!reloaded.is_active);
}

#[test]
fn category_registry_crud() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let now = Utc::now().naive_utc();
    let slug = CategorySlug::new("pest-control").expect("valid slug");
    repo.create_category(&NewCategory {
        slug: slug.clone(),
        name: CategoryName::new("Pest Control").expect("valid name"),
        description: Some("Rodents and insects".to_string()),
        icon: "bug-fill".to_string(),
        tags: vec!["rats".to_string(), "wasps".to_string()],
        created_at: now,
        updated_at: now,
    })
    .expect("should create category");

    let stored = repo
        .get_category_by_slug(&slug)
        .expect("lookup should succeed")
        .expect("category should exist");
    assert_eq!(stored.tags, vec!["rats".to_string(), "wasps".to_string()]);

    repo.update_category(
        &slug,
        &CategoryUpdate {
            name: CategoryName::new("Pest Removal").expect("valid name"),
            description: None,
            icon: "bug-fill".to_string(),
            tags: vec!["mice".to_string()],
        },
    )
    .expect("should update category");
    let stored = repo
        .get_category_by_slug(&slug)
        .expect("lookup should succeed")
        .expect("category should exist");
    assert_eq!(stored.name.as_str(), "Pest Removal");
    assert_eq!(stored.tags, vec!["mice".to_string()]);

    repo.delete_category(&slug).expect("should delete category");
    assert!(repo
        .get_category_by_slug(&slug)
        .expect("lookup should succeed")
        .is_none());
    assert!(repo.list_categories().expect("should list").is_empty());
}
