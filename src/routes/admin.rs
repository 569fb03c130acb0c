use actix_multipart::form::MultipartForm;
use actix_web::{get, post, web, HttpResponse, Responder};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde::Deserialize;
use tera::Tera;

use crate::auth::AuthenticatedUser;
use crate::domain::types::{BookingId, BookingStatus, BusinessId, UserId};
use crate::forms::admin::{
    CreateCategoryForm, CreateCategoryFormPayload, EditCategoryForm, EditCategoryFormPayload,
};
use crate::forms::bookings::{UpdateBookingStatusForm, UpdateBookingStatusFormPayload};
use crate::forms::import_export::{parse_upload, UploadImportForm};
use crate::notify::BookingNotifier;
use crate::repository::DieselRepository;
use crate::routes::{base_context, redirect, render_template};
use crate::services::admin::{
    audit_log as audit_log_service, booking_detail as booking_detail_service,
    business_detail as business_detail_service, categories as categories_service,
    create_category as create_category_service, dashboard_stats,
    delete_category as delete_category_service, edit_category as edit_category_service,
    list_bookings as list_bookings_service, list_businesses as list_businesses_service,
    list_users as list_users_service, toggle_business_active, toggle_user_active,
    update_booking_status as update_booking_status_service, user_detail as user_detail_service,
};
use crate::services::import_export::{
    export_bookings as export_bookings_service, import_categories as import_categories_service,
    DownloadFormat,
};
use crate::services::ServiceError;

#[derive(Deserialize, Debug)]
pub struct ListQueryParams {
    pub q: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
}

#[get("/dashboard")]
pub async fn dashboard(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let stats = match dashboard_stats(&user, repo.get_ref()) {
        Ok(stats) => stats,
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(err) => {
            log::error!("Failed to compute dashboard stats: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let (_, recent_audit) = match audit_log_service(&user, 1, repo.get_ref()) {
        Ok(result) => result,
        Err(err) => {
            log::error!("Failed to list audit entries: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let mut context = base_context(&flash_messages, Some(&user), "admin-dashboard");
    context.insert("stats", &stats);
    context.insert("recent_audit", &recent_audit);
    render_template(&tera, "admin/dashboard.html", &context)
}

#[get("/users")]
pub async fn users(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    params: web::Query<ListQueryParams>,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let params = params.into_inner();
    match list_users_service(&user, params.q.clone(), params.page.unwrap_or(1), repo.get_ref()) {
        Ok((total, users)) => {
            let mut context = base_context(&flash_messages, Some(&user), "admin-users");
            context.insert("users", &users);
            context.insert("total", &total);
            context.insert("search_query", &params.q.unwrap_or_default());
            render_template(&tera, "admin/users.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to render users page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/users/{user_id}")]
pub async fn user_detail(
    user_id: web::Path<i32>,
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let user_id = match UserId::new(user_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    match user_detail_service(user_id, &user, repo.get_ref()) {
        Ok(detail) => {
            let mut context = base_context(&flash_messages, Some(&user), "admin-users");
            context.insert("detail", &detail);
            render_template(&tera, "admin/user_detail.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to render user detail: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/users/{user_id}/toggle-status")]
pub async fn toggle_user_status(
    user_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let user_id = match UserId::new(user_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    match toggle_user_active(user_id, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("User status updated.").send(),
        Ok(false) => FlashMessage::error("Could not update the user status.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => FlashMessage::error("User not found.").send(),
        Err(ServiceError::Form(message)) => FlashMessage::error(message).send(),
        Err(err) => {
            log::error!("Failed to toggle user status: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect("/admin/users")
}

#[get("/businesses")]
pub async fn businesses(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    params: web::Query<ListQueryParams>,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let params = params.into_inner();
    match list_businesses_service(&user, params.q.clone(), params.page.unwrap_or(1), repo.get_ref())
    {
        Ok((total, businesses)) => {
            let mut context = base_context(&flash_messages, Some(&user), "admin-businesses");
            context.insert("businesses", &businesses);
            context.insert("total", &total);
            context.insert("search_query", &params.q.unwrap_or_default());
            render_template(&tera, "admin/businesses.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to render businesses page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/businesses/{business_id}")]
pub async fn business_detail(
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

    match business_detail_service(business_id, &user, repo.get_ref()) {
        Ok((business, services)) => {
            let mut context = base_context(&flash_messages, Some(&user), "admin-businesses");
            context.insert("business", &business);
            context.insert("services", &services);
            render_template(&tera, "admin/business_detail.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to render business detail: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/businesses/{business_id}/toggle-status")]
pub async fn toggle_business_status(
    business_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let business_id = match BusinessId::new(business_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    match toggle_business_active(business_id, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Business status updated.").send(),
        Ok(false) => FlashMessage::error("Could not update the business status.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => FlashMessage::error("Business not found.").send(),
        Err(err) => {
            log::error!("Failed to toggle business status: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect("/admin/businesses")
}

#[get("/bookings")]
pub async fn bookings(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    params: web::Query<ListQueryParams>,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let params = params.into_inner();
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match BookingStatus::try_from(raw) {
            Ok(status) => Some(status),
            Err(e) => {
                FlashMessage::error(e.to_string()).send();
                return redirect("/admin/bookings");
            }
        },
        None => None,
    };

    match list_bookings_service(&user, status, params.page.unwrap_or(1), repo.get_ref()) {
        Ok((total, bookings)) => {
            let mut context = base_context(&flash_messages, Some(&user), "admin-bookings");
            context.insert("bookings", &bookings);
            context.insert("total", &total);
            context.insert(
                "selected_status",
                &status.map(|s| s.as_str()).unwrap_or_default(),
            );
            render_template(&tera, "admin/bookings.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to render bookings page: {err}");
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

    match booking_detail_service(booking_id, &user, repo.get_ref()) {
        Ok(booking) => {
            let mut context = base_context(&flash_messages, Some(&user), "admin-bookings");
            context.insert("booking", &booking);
            render_template(&tera, "admin/booking_detail.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to render booking detail: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/bookings/{booking_id}/update-status")]
pub async fn update_booking_status(
    booking_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    notifier: web::Data<BookingNotifier>,
    web::Form(form): web::Form<UpdateBookingStatusForm>,
) -> impl Responder {
    let booking_id = match BookingId::new(booking_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let back = format!("/admin/bookings/{booking_id}");

    let payload: UpdateBookingStatusFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect(&back);
        }
    };

    match update_booking_status_service(booking_id, payload, &user, repo.get_ref(), notifier.get_ref())
    {
        Ok(true) => FlashMessage::success("Booking status updated.").send(),
        Ok(false) => FlashMessage::error("Could not update the booking status.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => FlashMessage::error("Booking not found.").send(),
        Err(ServiceError::Form(message)) => FlashMessage::error(message).send(),
        Err(err) => {
            log::error!("Failed to update booking status: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect(&back)
}

#[get("/categories")]
pub async fn categories(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match categories_service(&user, repo.get_ref()) {
        Ok(categories) => {
            let mut context = base_context(&flash_messages, Some(&user), "admin-categories");
            context.insert("categories", &categories);
            render_template(&tera, "admin/categories.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to render categories page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/categories/create")]
pub async fn create_category(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<CreateCategoryForm>,
) -> impl Responder {
    let payload: CreateCategoryFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/admin/categories");
        }
    };

    match create_category_service(payload, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Category added.").send(),
        Ok(false) => FlashMessage::error("Could not add the category.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::Form(message)) => FlashMessage::error(message).send(),
        Err(err) => {
            log::error!("Failed to create category: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect("/admin/categories")
}

#[post("/categories/{slug}/edit")]
pub async fn edit_category(
    slug: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<EditCategoryForm>,
) -> impl Responder {
    let payload: EditCategoryFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/admin/categories");
        }
    };

    match edit_category_service(&slug.into_inner(), payload, &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Category updated.").send(),
        Ok(false) => FlashMessage::error("Could not update the category.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => FlashMessage::error("Category not found.").send(),
        Err(ServiceError::Form(message)) => FlashMessage::error(message).send(),
        Err(err) => {
            log::error!("Failed to update category: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect("/admin/categories")
}

#[post("/categories/{slug}/delete")]
pub async fn delete_category(
    slug: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match delete_category_service(&slug.into_inner(), &user, repo.get_ref()) {
        Ok(true) => FlashMessage::success("Category deleted.").send(),
        Ok(false) => FlashMessage::error("Could not delete the category.").send(),
        Err(ServiceError::Unauthorized) => return redirect("/login"),
        Err(ServiceError::NotFound) => FlashMessage::error("Category not found.").send(),
        Err(ServiceError::Form(message)) => FlashMessage::error(message).send(),
        Err(err) => {
            log::error!("Failed to delete category: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    redirect("/admin/categories")
}

#[post("/categories/import")]
pub async fn import_categories(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    MultipartForm(mut form): MultipartForm<UploadImportForm>,
) -> impl Responder {
    let parsed = match parse_upload(&mut form) {
        Ok(parsed) => parsed,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/admin/categories");
        }
    };

    match import_categories_service(parsed, &user, repo.get_ref()) {
        Ok(report) => {
            FlashMessage::success(format!(
                "Import finished: {} created, {} updated, {} skipped.",
                report.created, report.updated, report.skipped
            ))
            .send();
            for error in report.errors.iter().take(5) {
                FlashMessage::warning(format!("Row {}: {}", error.row_number, error.message))
                    .send();
            }
            redirect("/admin/categories")
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to import categories: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ExportQueryParams {
    pub format: Option<String>,
}

#[get("/export/bookings")]
pub async fn export_bookings(
    user: AuthenticatedUser,
    params: web::Query<ExportQueryParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let format = match params
        .format
        .as_deref()
        .map(DownloadFormat::try_from)
        .unwrap_or(Ok(DownloadFormat::Csv))
    {
        Ok(format) => format,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/admin/bookings");
        }
    };

    match export_bookings_service(format, &user, repo.get_ref()) {
        Ok(file) => HttpResponse::Ok()
            .content_type(file.content_type)
            .insert_header((
                actix_web::http::header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ))
            .body(file.bytes),
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to export bookings: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/audit")]
pub async fn audit(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    params: web::Query<ListQueryParams>,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match audit_log_service(&user, params.page.unwrap_or(1), repo.get_ref()) {
        Ok((total, entries)) => {
            let mut context = base_context(&flash_messages, Some(&user), "admin-audit");
            context.insert("entries", &entries);
            context.insert("total", &total);
            render_template(&tera, "admin/audit.html", &context)
        }
        Err(ServiceError::Unauthorized) => redirect("/login"),
        Err(err) => {
            log::error!("Failed to render audit page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
