use actix_web::{get, web, HttpResponse, Responder};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde::Deserialize;
use tera::Tera;

use crate::auth::{check_role, AuthenticatedUser};
use crate::domain::types::{BusinessId, UserRole};
use crate::repository::DieselRepository;
use crate::routes::{base_context, redirect, render_template};
use crate::services::main::{
    browse_businesses as browse_businesses_service, business_detail as business_detail_service,
    category_page as category_page_service, landing_page as landing_page_service, BrowseFilters,
};
use crate::services::ServiceError;

#[get("/")]
pub async fn index(
    user: Option<AuthenticatedUser>,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    // Business owners land on their dashboard instead of the marketing page.
    if let Some(user) = &user {
        if check_role(UserRole::BusinessOwner, user) {
            return redirect("/owner/dashboard");
        }
    }

    match landing_page_service(repo.get_ref()) {
        Ok(page) => {
            let mut context = base_context(&flash_messages, user.as_ref(), "home");
            context.insert("categories", &page.categories);
            context.insert("popular_businesses", &page.popular);
            render_template(&tera, "main/landing.html", &context)
        }
        Err(err) => {
            log::error!("Failed to render landing page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct BrowseQueryParams {
    pub category: Option<String>,
    pub city: Option<String>,
    pub q: Option<String>,
    pub page: Option<usize>,
}

#[get("/services")]
pub async fn services_list(
    user: Option<AuthenticatedUser>,
    flash_messages: IncomingFlashMessages,
    params: web::Query<BrowseQueryParams>,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let params = params.into_inner();
    let filters = BrowseFilters {
        category: params.category.clone(),
        city: params.city.clone(),
        query: params.q.clone(),
        page: params.page.unwrap_or(1),
    };

    match browse_businesses_service(filters, repo.get_ref()) {
        Ok(page) => {
            let mut context = base_context(&flash_messages, user.as_ref(), "services");
            context.insert("businesses", &page.businesses);
            context.insert("total", &page.total);
            context.insert("page", &page.page);
            context.insert("categories", &page.categories);
            context.insert("cities", &page.cities);
            context.insert("selected_category", &params.category.unwrap_or_default());
            context.insert("selected_city", &params.city.unwrap_or_default());
            context.insert("search_query", &params.q.unwrap_or_default());
            render_template(&tera, "main/services.html", &context)
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Category not found.").send();
            redirect("/")
        }
        Err(err) => {
            log::error!("Failed to render services page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/category/")]
pub async fn category_root() -> impl Responder {
    redirect("/")
}

#[get("/category/{slug}")]
pub async fn category_list(
    slug: web::Path<String>,
    user: Option<AuthenticatedUser>,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match category_page_service(&slug.into_inner(), repo.get_ref()) {
        Ok((category, businesses)) => {
            let mut context = base_context(&flash_messages, user.as_ref(), "services");
            context.insert("category", &category);
            context.insert("businesses", &businesses);
            render_template(&tera, "main/category.html", &context)
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Category not found.").send();
            redirect("/")
        }
        Err(err) => {
            log::error!("Failed to render category page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/businesses/{business_id}")]
pub async fn business_detail(
    business_id: web::Path<i32>,
    user: Option<AuthenticatedUser>,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let business_id = match BusinessId::new(business_id.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };

    match business_detail_service(business_id, repo.get_ref()) {
        Ok(detail) => {
            let mut context = base_context(&flash_messages, user.as_ref(), "services");
            context.insert("business", &detail);
            render_template(&tera, "main/business_detail.html", &context)
        }
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to render business page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/about")]
pub async fn about(
    user: Option<AuthenticatedUser>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let context = base_context(&flash_messages, user.as_ref(), "about");
    render_template(&tera, "main/about.html", &context)
}

#[get("/dashboard")]
pub async fn dashboard(user: AuthenticatedUser) -> impl Responder {
    match user.parsed_role() {
        Some(UserRole::Admin) => redirect("/admin/dashboard"),
        Some(UserRole::BusinessOwner) => redirect("/owner/dashboard"),
        Some(UserRole::Customer) => redirect("/my-bookings"),
        None => redirect("/login"),
    }
}
