use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde::Deserialize;
use tera::Tera;

use crate::auth::AuthenticatedUser;
use crate::domain::types::{BookingId, BookingStatus};
use crate::forms::bookings::{CreateBookingForm, CreateBookingFormPayload};
use crate::notify::BookingNotifier;
use crate::repository::DieselRepository;
use crate::routes::{base_context, is_ajax, redirect, referer_or, render_template};
use crate::services::bookings::{
    cancel_booking as cancel_booking_service, create_booking as create_booking_service,
    my_bookings as my_bookings_service,
};
use crate::services::ServiceError;

#[post("/bookings")]
pub async fn create_booking(
    request: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<BookingNotifier>,
    web::Form(form): web::Form<CreateBookingForm>,
) -> impl Responder {
    let redirect_to = referer_or(&request, "/services").to_string();

    let payload: CreateBookingFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect(&redirect_to);
        }
    };

    match create_booking_service(payload, &user, repo.get_ref(), notifier.get_ref()) {
        Ok(booking) => {
            FlashMessage::success(format!(
                "Booking requested for {}. The business will confirm shortly.",
                booking.booking_time.format("%Y-%m-%d %H:%M")
            ))
            .send();
            redirect("/my-bookings")
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Service not found.").send();
            redirect(&redirect_to)
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(&redirect_to)
        }
        Err(err) => {
            log::error!("Failed to create booking: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct MyBookingsQueryParams {
    pub status: Option<String>,
    pub page: Option<usize>,
}

#[get("/my-bookings")]
pub async fn my_bookings(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    params: web::Query<MyBookingsQueryParams>,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let params = params.into_inner();
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match BookingStatus::try_from(raw) {
            Ok(status) => Some(status),
            Err(e) => {
                FlashMessage::error(e.to_string()).send();
                return redirect("/my-bookings");
            }
        },
        None => None,
    };

    match my_bookings_service(&user, status, params.page.unwrap_or(1), repo.get_ref()) {
        Ok((total, bookings)) => {
            let mut context = base_context(&flash_messages, Some(&user), "my-bookings");
            context.insert("bookings", &bookings);
            context.insert("total", &total);
            context.insert(
                "selected_status",
                &status.map(|s| s.as_str()).unwrap_or_default(),
            );
            render_template(&tera, "bookings/my_bookings.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to render bookings page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/bookings/{booking_id}/cancel")]
pub async fn cancel_booking(
    request: HttpRequest,
    booking_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<BookingNotifier>,
) -> impl Responder {
    let booking_id = match BookingId::new(booking_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    match cancel_booking_service(booking_id, &user, repo.get_ref(), notifier.get_ref()) {
        Ok(true) => {
            if is_ajax(&request) {
                return HttpResponse::Ok().json(serde_json::json!({
                    "success": true,
                    "message": "Booking cancelled successfully",
                }));
            }
            FlashMessage::success("Booking cancelled.").send();
            redirect("/my-bookings")
        }
        Ok(false) => {
            if is_ajax(&request) {
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "success": false,
                    "message": "Could not cancel the booking",
                }));
            }
            FlashMessage::error("Could not cancel the booking.").send();
            redirect("/my-bookings")
        }
        Err(ServiceError::Unauthorized) => {
            if is_ajax(&request) {
                return HttpResponse::Forbidden()
                    .json(serde_json::json!({ "success": false, "message": "Unauthorized" }));
            }
            redirect("/login")
        }
        Err(ServiceError::NotFound) => {
            if is_ajax(&request) {
                return HttpResponse::NotFound().json(
                    serde_json::json!({ "success": false, "message": "Booking not found" }),
                );
            }
            FlashMessage::error("Booking not found.").send();
            redirect("/my-bookings")
        }
        Err(ServiceError::Form(message)) => {
            if is_ajax(&request) {
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({ "success": false, "message": message }));
            }
            FlashMessage::error(message).send();
            redirect("/my-bookings")
        }
        Err(err) => {
            log::error!("Failed to cancel booking: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
