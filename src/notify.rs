//! Booking status notifications.
//!
//! Every status change is fanned out to a registered set of observers:
//! customer email, customer SMS (stubbed to a structured log line) and the
//! business owner for the statuses that concern them. Observer failures are
//! logged and never abort the operation that triggered them.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::domain::booking::Booking;
use crate::domain::business::Business;
use crate::domain::types::BookingStatus;
use crate::domain::user::User;
use crate::models::config::SmtpSettings;

/// A booking status change with the parties it concerns.
#[derive(Debug, Clone)]
pub struct BookingEvent {
    pub booking: Booking,
    pub status: BookingStatus,
    pub customer: User,
    pub business: Business,
    pub owner: Option<User>,
}

impl BookingEvent {
    /// Customer-facing wording for this status change.
    pub fn customer_message(&self) -> String {
        let business = self.business.name.as_str();
        match self.status {
            BookingStatus::Requested => {
                format!("Your booking request at {business} has been submitted.")
            }
            BookingStatus::Accepted => {
                format!("Great news! Your booking at {business} has been accepted.")
            }
            BookingStatus::Rejected => {
                format!("Unfortunately, your booking at {business} has been rejected.")
            }
            BookingStatus::Cancelled => {
                format!("Your booking at {business} has been cancelled.")
            }
            BookingStatus::Completed => {
                format!("Thank you! Your service at {business} is complete.")
            }
        }
    }

    /// Owner-facing wording; only `requested` and `cancelled` concern owners.
    pub fn owner_message(&self) -> Option<String> {
        let customer = self.customer.name.as_str();
        let time = self.booking.booking_time.format("%Y-%m-%d %H:%M");
        match self.status {
            BookingStatus::Requested => {
                Some(format!("New booking request from {customer} for {time}"))
            }
            BookingStatus::Cancelled => {
                Some(format!("Customer {customer} cancelled booking for {time}"))
            }
            _ => None,
        }
    }

    /// Subject line for transactional mail.
    pub fn subject(&self) -> String {
        let status = self.status.as_str();
        let mut chars = status.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };
        format!("Booking {capitalized}")
    }
}

/// Receives booking status changes.
pub trait BookingObserver: Send + Sync {
    fn booking_changed(&self, event: &BookingEvent);
}

fn build_mailer(settings: &SmtpSettings) -> Option<(SmtpTransport, Mailbox)> {
    let from: Mailbox = match settings.from.parse() {
        Ok(from) => from,
        Err(e) => {
            log::error!("Invalid SMTP from address '{}': {e}", settings.from);
            return None;
        }
    };
    let transport = match SmtpTransport::relay(&settings.relay) {
        Ok(builder) => builder
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build(),
        Err(e) => {
            log::error!("Failed to build SMTP transport for {}: {e}", settings.relay);
            return None;
        }
    };
    Some((transport, from))
}

fn send_mail(mailer: &Option<(SmtpTransport, Mailbox)>, to: &str, subject: &str, body: &str) {
    let Some((transport, from)) = mailer else {
        log::info!("[EMAIL] To: {to}, Subject: {subject}, Message: {body}");
        return;
    };

    let recipient: Mailbox = match to.parse() {
        Ok(recipient) => recipient,
        Err(e) => {
            log::error!("Invalid recipient address '{to}': {e}");
            return;
        }
    };

    let message = Message::builder()
        .from(from.clone())
        .to(recipient)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string());

    match message {
        Ok(message) => {
            if let Err(e) = transport.send(&message) {
                log::error!("Failed to send email to {to}: {e}");
            }
        }
        Err(e) => log::error!("Failed to build email to {to}: {e}"),
    }
}

/// Emails the customer about every status change.
pub struct EmailNotifier {
    mailer: Option<(SmtpTransport, Mailbox)>,
}

impl EmailNotifier {
    pub fn new(settings: Option<&SmtpSettings>) -> Self {
        Self {
            mailer: settings.and_then(build_mailer),
        }
    }
}

impl BookingObserver for EmailNotifier {
    fn booking_changed(&self, event: &BookingEvent) {
        send_mail(
            &self.mailer,
            event.customer.email.as_str(),
            &event.subject(),
            &event.customer_message(),
        );
    }
}

/// SMS delivery stub; logs the message that a gateway integration would send.
pub struct SmsNotifier;

impl BookingObserver for SmsNotifier {
    fn booking_changed(&self, event: &BookingEvent) {
        let Some(phone) = &event.customer.phone else {
            return;
        };
        log::info!("[SMS] To: {phone}, Message: {}", event.customer_message());
    }
}

/// Notifies the business owner about requests and cancellations.
pub struct OwnerNotifier {
    mailer: Option<(SmtpTransport, Mailbox)>,
}

impl OwnerNotifier {
    pub fn new(settings: Option<&SmtpSettings>) -> Self {
        Self {
            mailer: settings.and_then(build_mailer),
        }
    }
}

impl BookingObserver for OwnerNotifier {
    fn booking_changed(&self, event: &BookingEvent) {
        let Some(message) = event.owner_message() else {
            return;
        };
        let Some(owner) = &event.owner else {
            log::info!(
                "[BUSINESS] {} has no linked owner account; skipping: {message}",
                event.business.name
            );
            return;
        };
        send_mail(&self.mailer, owner.email.as_str(), &event.subject(), &message);
    }
}

/// Subject that fans booking events out to registered observers.
#[derive(Default)]
pub struct BookingNotifier {
    observers: Vec<Box<dyn BookingObserver>>,
}

impl BookingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.
    pub fn register(mut self, observer: impl BookingObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Deliver an event to every registered observer.
    pub fn notify(&self, event: &BookingEvent) {
        for observer in &self.observers {
            observer.booking_changed(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        BookingId, BusinessId, BusinessName, CategorySlug, CityName, DistrictName,
        DurationMinutes, EmailAddress, PaymentMethod, PhoneNumber, Price, ServiceId,
        StreetAddress, UserId, UserName, UserRole,
    };
    use chrono::DateTime;
    use std::sync::{Arc, Mutex};

    struct RecordingObserver {
        seen: Arc<Mutex<Vec<BookingStatus>>>,
    }

    impl BookingObserver for RecordingObserver {
        fn booking_changed(&self, event: &BookingEvent) {
            self.seen.lock().unwrap().push(event.status);
        }
    }

    fn sample_event(status: BookingStatus) -> BookingEvent {
        let at = DateTime::from_timestamp(0, 0).unwrap().naive_utc();
        let customer = User {
            id: UserId::new(1).unwrap(),
            name: UserName::new("Alice").unwrap(),
            email: EmailAddress::new("alice@example.com").unwrap(),
            phone: Some(PhoneNumber::new("555-1234").unwrap()),
            password_hash: String::new(),
            street_house: StreetAddress::new("1 Main St").unwrap(),
            city: CityName::new("Springfield").unwrap(),
            district: DistrictName::new("Center").unwrap(),
            profile_pic_url: None,
            role: UserRole::Customer,
            is_verified: true,
            is_active: true,
            reset_token: None,
            reset_token_expires: None,
            created_at: at,
            updated_at: at,
        };
        let business = Business {
            id: BusinessId::new(1).unwrap(),
            owner_id: None,
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
            created_at: at,
            updated_at: at,
        };
        let booking = Booking {
            id: BookingId::new(1).unwrap(),
            business_id: business.id,
            service_id: ServiceId::new(1).unwrap(),
            customer_id: customer.id,
            booking_time: at,
            duration_minutes: DurationMinutes::new(60).unwrap(),
            price: Price::new(40.0).unwrap(),
            status,
            payment_method: PaymentMethod::Cash,
            payment_received: false,
            payment_received_at: None,
            payment_received_by: None,
            notes: None,
            requested_at: Some(at),
            accepted_at: None,
            rejected_at: None,
            cancelled_at: None,
            completed_at: None,
            created_at: at,
            updated_at: at,
        };
        BookingEvent {
            booking,
            status,
            customer,
            business,
            owner: None,
        }
    }

    #[test]
    fn fans_out_to_all_observers() {
        let seen = Arc::new(Mutex::new(vec![]));
        let notifier = BookingNotifier::new()
            .register(RecordingObserver { seen: seen.clone() })
            .register(SmsNotifier);

        notifier.notify(&sample_event(BookingStatus::Accepted));
        notifier.notify(&sample_event(BookingStatus::Completed));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![BookingStatus::Accepted, BookingStatus::Completed]
        );
    }

    #[test]
    fn customer_wording_follows_status() {
        assert!(sample_event(BookingStatus::Accepted)
            .customer_message()
            .contains("has been accepted"));
        assert!(sample_event(BookingStatus::Completed)
            .customer_message()
            .contains("is complete"));
    }

    #[test]
    fn owners_hear_about_requests_and_cancellations_only() {
        assert!(sample_event(BookingStatus::Requested).owner_message().is_some());
        assert!(sample_event(BookingStatus::Cancelled).owner_message().is_some());
        assert!(sample_event(BookingStatus::Accepted).owner_message().is_none());
        assert!(sample_event(BookingStatus::Completed).owner_message().is_none());
    }

    #[test]
    fn subject_capitalizes_status() {
        assert_eq!(sample_event(BookingStatus::Requested).subject(), "Booking Requested");
    }
}
