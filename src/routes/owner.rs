use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde::Deserialize;
use tera::Tera;

use crate::auth::AuthenticatedUser;
use crate::domain::types::{BookingId, BookingStatus, BusinessId, ServiceId};
use crate::forms::bookings::{RejectBookingForm, RejectBookingFormPayload};
use crate::forms::businesses::{
    BusinessForm, BusinessFormPayload, DeleteGalleryImageForm, DeleteGalleryImageFormPayload,
    ServiceForm, ServiceFormPayload,
};
use crate::media::MediaClient;
use crate::notify::BookingNotifier;
use crate::repository::DieselRepository;
use crate::routes::{base_context, is_ajax, read_temp_file, redirect, referer_or, render_template};
use crate::services::bookings::{
    accept_booking as accept_booking_service, complete_booking as complete_booking_service,
    mark_payment_received as mark_payment_service, owner_booking_detail, owner_bookings,
    reject_booking as reject_booking_service,
};
use crate::services::businesses::{
    add_gallery_image, business_manage, create_business as create_business_service,
    create_service as create_service_service, deactivate_business, deactivate_service,
    delete_gallery_image, owner_dashboard as owner_dashboard_service, set_business_photo,
    update_business as update_business_service, update_service as update_service_service,
};
use crate::services::main::merged_categories;
use crate::services::ServiceError;

#[get("/dashboard")]
pub async fn dashboard(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match owner_dashboard_service(&user, repo.get_ref()) {
        Ok(dashboard) => {
            let mut context = base_context(&flash_messages, Some(&user), "owner-dashboard");
            context.insert("businesses", &dashboard.businesses);
            context.insert("requested_count", &dashboard.summary.requested);
            context.insert("accepted_count", &dashboard.summary.accepted);
            context.insert("completed_count", &dashboard.summary.completed);
            context.insert("recent_bookings", &dashboard.recent_bookings);
            render_template(&tera, "owner/dashboard.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to render owner dashboard: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/businesses/create")]
pub async fn create_business_page(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match merged_categories(repo.get_ref()) {
        Ok(categories) => {
            let mut context = base_context(&flash_messages, Some(&user), "owner-businesses");
            context.insert("categories", &categories);
            render_template(&tera, "owner/business_form.html", &context)
        }
        Err(err) => {
            log::error!("Failed to render business form: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/businesses/create")]
pub async fn create_business(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<BusinessForm>,
) -> impl Responder {
    let payload: BusinessFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/owner/businesses/create");
        }
    };

    match create_business_service(payload, &user, repo.get_ref()) {
        Ok(business) => {
            FlashMessage::success("Business created.").send();
            redirect(&format!("/owner/businesses/{}", business.id))
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/owner/businesses/create")
        }
        Err(err) => {
            log::error!("Failed to create business: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/businesses/{business_id}")]
pub async fn manage_business(
    business_id: web::Path<i32>,
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let business_id = match BusinessId::new(business_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    match business_manage(business_id, &user, repo.get_ref()) {
        Ok((business, services)) => {
            let categories = match merged_categories(repo.get_ref()) {
                Ok(categories) => categories,
                Err(err) => {
                    log::error!("Failed to list categories: {err}");
                    return HttpResponse::InternalServerError().finish();
                }
            };
            let mut context = base_context(&flash_messages, Some(&user), "owner-businesses");
            context.insert("business", &business);
            context.insert("services", &services);
            context.insert("categories", &categories);
            render_template(&tera, "owner/business_manage.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to render business management page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/businesses/{business_id}/update")]
pub async fn update_business(
    business_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<BusinessForm>,
) -> impl Responder {
    let business_id = match BusinessId::new(business_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let back = format!("/owner/businesses/{business_id}");

    let payload: BusinessFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect(&back);
        }
    };

    match update_business_service(business_id, payload, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Business updated.").send(),
        Ok(false) => FlashMessage::error("Could not update the business.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => return HttpResponse::NotFound().finish(),
        Err(ServiceError::Form(message)) => FlashMessage::error(message).send(),
        Err(err) => {
            log::error!("Failed to update business: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect(&back)
}

#[post("/businesses/{business_id}/deactivate")]
pub async fn deactivate_business_route(
    business_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let business_id = match BusinessId::new(business_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    match deactivate_business(business_id, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Business deactivated.").send(),
        Ok(false) => FlashMessage::error("Could not deactivate the business.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => return HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to deactivate business: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect("/owner/dashboard")
}

#[derive(MultipartForm)]
pub struct ImageUploadForm {
    #[multipart(limit = "5MB")]
    pub image: TempFile,
}

async fn upload_image_from_form(
    form: &mut ImageUploadForm,
    media: &MediaClient,
    folder: &str,
) -> Result<crate::domain::types::ImageUrl, String> {
    let file_name = form
        .image
        .file_name
        .clone()
        .unwrap_or_else(|| "image".to_string());
    let bytes = read_temp_file(&mut form.image)
        .map_err(|e| format!("Could not read the uploaded image: {e}"))?;
    media
        .upload_image(bytes, &file_name, folder)
        .await
        .map_err(|e| format!("Image upload failed: {e}"))
}

#[post("/businesses/{business_id}/photo")]
pub async fn upload_business_photo(
    business_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    media: web::Data<MediaClient>,
    MultipartForm(mut form): MultipartForm<ImageUploadForm>,
) -> impl Responder {
    let business_id = match BusinessId::new(business_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let back = format!("/owner/businesses/{business_id}");

    let url = match upload_image_from_form(&mut form, media.get_ref(), "businesses").await {
        Ok(url) => url,
        Err(message) => {
            log::error!("{message}");
            FlashMessage::error(message).send();
            return redirect(&back);
        }
    };

    match set_business_photo(business_id, url, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Business photo updated.").send(),
        Ok(false) => FlashMessage::error("Could not update the photo.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => return HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to set business photo: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect(&back)
}

#[post("/businesses/{business_id}/gallery/add")]
pub async fn add_gallery(
    business_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    media: web::Data<MediaClient>,
    MultipartForm(mut form): MultipartForm<ImageUploadForm>,
) -> impl Responder {
    let business_id = match BusinessId::new(business_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let back = format!("/owner/businesses/{business_id}");

    let url = match upload_image_from_form(&mut form, media.get_ref(), "galleries").await {
        Ok(url) => url,
        Err(message) => {
            log::error!("{message}");
            FlashMessage::error(message).send();
            return redirect(&back);
        }
    };

    match add_gallery_image(business_id, url, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Image added to the gallery.").send(),
        Ok(false) => FlashMessage::error("Could not update the gallery.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => return HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to add gallery image: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect(&back)
}

#[post("/businesses/{business_id}/gallery/delete")]
pub async fn delete_gallery(
    business_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<DeleteGalleryImageForm>,
) -> impl Responder {
    let business_id = match BusinessId::new(business_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let back = format!("/owner/businesses/{business_id}");

    let payload: DeleteGalleryImageFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect(&back);
        }
    };

    match delete_gallery_image(business_id, payload, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Image removed from the gallery.").send(),
        Ok(false) => FlashMessage::error("Could not update the gallery.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => FlashMessage::error("Image not found.").send(),
        Err(err) => {
            log::error!("Failed to delete gallery image: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect(&back)
}

#[post("/businesses/{business_id}/services")]
pub async fn create_service(
    business_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<ServiceForm>,
) -> impl Responder {
    let business_id = match BusinessId::new(business_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let back = format!("/owner/businesses/{business_id}");

    let payload: ServiceFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect(&back);
        }
    };

    match create_service_service(business_id, payload, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Service added.").send(),
        Ok(false) => FlashMessage::error("Could not add the service.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => return HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to create service: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect(&back)
}

#[post("/services/{service_id}/update")]
pub async fn update_service(
    request: HttpRequest,
    service_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<ServiceForm>,
) -> impl Responder {
    let service_id = match ServiceId::new(service_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let back = referer_or(&request, "/owner/dashboard").to_string();

    let payload: ServiceFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect(&back);
        }
    };

    match update_service_service(service_id, payload, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Service updated.").send(),
        Ok(false) => FlashMessage::error("Could not update the service.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => FlashMessage::error("Service not found.").send(),
        Err(err) => {
            log::error!("Failed to update service: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect(&back)
}

#[post("/services/{service_id}/deactivate")]
pub async fn deactivate_service_route(
    request: HttpRequest,
    service_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let service_id = match ServiceId::new(service_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let back = referer_or(&request, "/owner/dashboard").to_string();

    match deactivate_service(service_id, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Service deactivated.").send(),
        Ok(false) => FlashMessage::error("Could not deactivate the service.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => FlashMessage::error("Service not found.").send(),
        Err(err) => {
            log::error!("Failed to deactivate service: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect(&back)
}

#[derive(Deserialize, Debug)]
pub struct OwnerBookingsQueryParams {
    pub business_id: Option<i32>,
    pub status: Option<String>,
    pub page: Option<usize>,
}

#[get("/bookings")]
pub async fn bookings(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    params: web::Query<OwnerBookingsQueryParams>,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let params = params.into_inner();

    let business_id = match params.business_id {
        Some(raw) => match BusinessId::new(raw) {
            Ok(id) => Some(id),
            Err(_) => return HttpResponse::NotFound().finish(),
        },
        None => None,
    };
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match BookingStatus::try_from(raw) {
            Ok(status) => Some(status),
            Err(e) => {
                FlashMessage::error(e.to_string()).send();
                return redirect("/owner/bookings");
            }
        },
        None => None,
    };

    match owner_bookings(
        &user,
        business_id,
        status,
        params.page.unwrap_or(1),
        repo.get_ref(),
    ) {
        Ok((total, bookings)) => {
            let mut context = base_context(&flash_messages, Some(&user), "owner-bookings");
            context.insert("bookings", &bookings);
            context.insert("total", &total);
            context.insert(
                "selected_status",
                &status.map(|s| s.as_str()).unwrap_or_default(),
            );
            render_template(&tera, "owner/bookings.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to render owner bookings: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/bookings/{booking_id}")]
pub async fn booking_detail(
    booking_id: web::Path<i32>,
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let booking_id = match BookingId::new(booking_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    match owner_booking_detail(booking_id, &user, repo.get_ref()) {
        Ok(booking) => {
            let mut context = base_context(&flash_messages, Some(&user), "owner-bookings");
            context.insert("booking", &booking);
            render_template(&tera, "owner/booking_detail.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to render booking detail: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn decision_response(
    request: &HttpRequest,
    outcome: crate::services::ServiceResult<bool>,
    booking_id: BookingId,
    success_message: &str,
    failure_message: &str,
) -> HttpResponse {
    let ajax = is_ajax(request);
    match outcome {
        Ok(true) => {
            if ajax {
                return HttpResponse::Ok().json(serde_json::json!({
                    "success": true,
                    "message": success_message,
                    "booking_id": booking_id.get(),
                    "redirect_url": "/owner/bookings",
                }));
            }
            FlashMessage::success(success_message.to_string()).send();
            redirect(referer_or(request, "/owner/bookings"))
        }
        Ok(false) => {
            if ajax {
                return HttpResponse::InternalServerError().json(
                    serde_json::json!({ "success": false, "error": failure_message }),
                );
            }
            FlashMessage::error(failure_message.to_string()).send();
            redirect("/owner/bookings")
        }
        Err(ServiceError::Unauthorized) => {
            if ajax {
                return HttpResponse::Forbidden()
                    .json(serde_json::json!({ "success": false, "error": "Unauthorized" }));
            }
            redirect("/login")
        }
        Err(ServiceError::NotFound) => {
            if ajax {
                return HttpResponse::NotFound()
                    .json(serde_json::json!({ "success": false, "error": "Booking not found" }));
            }
            FlashMessage::error("Booking not found.").send();
            redirect("/owner/bookings")
        }
        Err(ServiceError::Form(message)) => {
            if ajax {
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({ "success": false, "error": message }));
            }
            FlashMessage::error(message).send();
            redirect(&format!("/owner/bookings/{booking_id}"))
        }
        Err(err) => {
            log::error!("Booking decision failed: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/bookings/{booking_id}/accept")]
pub async fn accept_booking(
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

    let outcome = accept_booking_service(booking_id, &user, repo.get_ref(), notifier.get_ref());
    decision_response(
        &request,
        outcome,
        booking_id,
        "Booking accepted. The customer will be notified.",
        "Could not accept the booking.",
    )
}

#[post("/bookings/{booking_id}/reject")]
pub async fn reject_booking(
    request: HttpRequest,
    booking_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<BookingNotifier>,
    web::Form(form): web::Form<RejectBookingForm>,
) -> impl Responder {
    let booking_id = match BookingId::new(booking_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    let payload: RejectBookingFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/owner/bookings");
        }
    };

    let outcome =
        reject_booking_service(booking_id, payload, &user, repo.get_ref(), notifier.get_ref());
    decision_response(
        &request,
        outcome,
        booking_id,
        "Booking rejected. The customer will be notified.",
        "Could not reject the booking.",
    )
}

#[post("/bookings/{booking_id}/complete")]
pub async fn complete_booking(
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

    let outcome = complete_booking_service(booking_id, &user, repo.get_ref(), notifier.get_ref());
    decision_response(
        &request,
        outcome,
        booking_id,
        "Booking marked as completed.",
        "Could not complete the booking.",
    )
}

#[post("/bookings/{booking_id}/mark-payment")]
pub async fn mark_payment(
    request: HttpRequest,
    booking_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let booking_id = match BookingId::new(booking_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    let outcome = mark_payment_service(booking_id, &user, repo.get_ref());
    decision_response(
        &request,
        outcome,
        booking_id,
        "Payment recorded.",
        "Could not record the payment.",
    )
}
