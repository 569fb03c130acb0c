use actix_web::{get, web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::domain::types::ServiceId;
use crate::repository::DieselRepository;
use crate::services::admin::dashboard_stats;
use crate::services::bookings::available_slots as available_slots_service;
use crate::services::main::{browse_businesses, merged_categories, BrowseFilters};
use crate::services::ServiceError;

#[get("/v1/stats")]
pub async fn api_v1_stats(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match dashboard_stats(&user, repo.get_ref()) {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(ServiceError::Unauthorized) => HttpResponse::Unauthorized().finish(),
        Err(err) => {
            log::error!("Failed to compute stats: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ApiV1SlotsQueryParams {
    pub service_id: i32,
    pub date: String,
}

#[get("/v1/slots")]
pub async fn api_v1_slots(
    _user: AuthenticatedUser,
    params: web::Query<ApiV1SlotsQueryParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let service_id = match ServiceId::new(params.service_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::NotFound().finish(),
    };
    let date = match NaiveDate::parse_from_str(&params.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "date must be YYYY-MM-DD" }));
        }
    };

    match available_slots_service(service_id, date, repo.get_ref()) {
        Ok(slots) => HttpResponse::Ok().json(serde_json::json!({ "available_slots": slots })),
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to compute available slots: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ApiV1CategoriesQueryParams {
    pub q: Option<String>,
}

/// Category suggestions for search boxes; matches slug, name, description
/// and tags.
#[get("/v1/categories")]
pub async fn api_v1_categories(
    params: web::Query<ApiV1CategoriesQueryParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match merged_categories(repo.get_ref()) {
        Ok(categories) => {
            let filtered: Vec<_> = match params.q.as_deref().filter(|q| !q.trim().is_empty()) {
                Some(query) => categories
                    .into_iter()
                    .filter(|category| category.matches(query.trim()))
                    .collect(),
                None => categories,
            };
            HttpResponse::Ok().json(filtered)
        }
        Err(err) => {
            log::error!("Failed to list categories: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ApiV1BusinessesQueryParams {
    pub category: Option<String>,
    pub city: Option<String>,
    pub q: Option<String>,
    pub page: Option<usize>,
}

#[get("/v1/businesses")]
pub async fn api_v1_businesses(
    _user: AuthenticatedUser,
    params: web::Query<ApiV1BusinessesQueryParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let params = params.into_inner();
    let filters = BrowseFilters {
        category: params.category,
        city: params.city,
        query: params.q,
        page: params.page.unwrap_or(1),
    };

    match browse_businesses(filters, repo.get_ref()) {
        Ok(page) => HttpResponse::Ok().json(serde_json::json!({
            "total": page.total,
            "page": page.page,
            "businesses": page.businesses,
        })),
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to list businesses: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
