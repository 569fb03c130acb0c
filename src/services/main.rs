use std::collections::BTreeMap;

use crate::domain::business::Business;
use crate::domain::category::BUILTIN_CATEGORIES;
use crate::domain::types::{BusinessId, CategorySlug, ImageUrl};
use crate::dto::businesses::{BusinessCardDto, BusinessDetailDto, ServiceDto};
use crate::dto::categories::CategoryDto;
use crate::pagination::DEFAULT_ITEMS_PER_PAGE;
use crate::repository::{
    BusinessListQuery, BusinessReader, CategoryReader, ServiceListQuery, ServiceReader, UserReader,
};

use super::{ServiceError, ServiceResult};

/// Number of businesses highlighted on the landing page.
const POPULAR_BUSINESSES: usize = 6;

/// The public category registry: built-ins merged with admin-registered rows.
/// A database row whose slug matches a built-in overrides it.
pub fn merged_categories<R>(repo: &R) -> ServiceResult<Vec<CategoryDto>>
where
    R: CategoryReader,
{
    let mut merged: BTreeMap<String, CategoryDto> = BUILTIN_CATEGORIES
        .iter()
        .map(|builtin| (builtin.slug.to_string(), CategoryDto::from(builtin)))
        .collect();

    match repo.list_categories() {
        Ok(categories) => {
            for category in categories {
                let dto = CategoryDto::from(category);
                merged.insert(dto.slug.clone(), dto);
            }
        }
        Err(e) => {
            log::error!("Failed to list categories: {e}");
            return Err(ServiceError::Internal);
        }
    }

    let mut categories: Vec<CategoryDto> = merged.into_values().collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(categories)
}

/// Look one category up in the merged registry.
pub fn find_category<R>(slug: &CategorySlug, repo: &R) -> ServiceResult<Option<CategoryDto>>
where
    R: CategoryReader,
{
    Ok(merged_categories(repo)?
        .into_iter()
        .find(|category| category.slug == slug.as_str()))
}

fn owner_profile_pic<R>(business: &Business, repo: &R) -> Option<ImageUrl>
where
    R: UserReader,
{
    let owner_id = business.owner_id?;
    match repo.get_user_by_id(owner_id) {
        Ok(owner) => owner.and_then(|owner| owner.profile_pic_url),
        Err(e) => {
            log::error!("Failed to load owner for business {}: {e}", business.id);
            None
        }
    }
}

fn business_cards<R>(businesses: Vec<Business>, repo: &R) -> Vec<BusinessCardDto>
where
    R: UserReader,
{
    businesses
        .into_iter()
        .map(|business| {
            let owner_pic = owner_profile_pic(&business, repo);
            BusinessCardDto::new(&business, owner_pic.as_ref())
        })
        .collect()
}

/// Data for the public landing page.
#[derive(Debug, Clone)]
pub struct LandingPage {
    pub categories: Vec<CategoryDto>,
    pub popular: Vec<BusinessCardDto>,
}

pub fn landing_page<R>(repo: &R) -> ServiceResult<LandingPage>
where
    R: CategoryReader + BusinessReader + UserReader,
{
    let categories = merged_categories(repo)?;

    let popular = match repo.list_businesses(
        BusinessListQuery::default().paginate(1, POPULAR_BUSINESSES),
    ) {
        Ok((_total, businesses)) => business_cards(businesses, repo),
        Err(e) => {
            log::error!("Failed to list businesses: {e}");
            return Err(ServiceError::Internal);
        }
    };

    Ok(LandingPage {
        categories,
        popular,
    })
}

/// Filters accepted by the public browse page.
#[derive(Debug, Clone, Default)]
pub struct BrowseFilters {
    pub category: Option<String>,
    pub city: Option<String>,
    pub query: Option<String>,
    pub page: usize,
}

/// Data for the public browse page.
#[derive(Debug, Clone)]
pub struct BrowsePage {
    pub total: usize,
    pub page: usize,
    pub businesses: Vec<BusinessCardDto>,
    pub categories: Vec<CategoryDto>,
    pub cities: Vec<String>,
}

pub fn browse_businesses<R>(filters: BrowseFilters, repo: &R) -> ServiceResult<BrowsePage>
where
    R: BusinessReader + CategoryReader + UserReader,
{
    let page = filters.page.max(1);
    let mut query = BusinessListQuery::default().paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(category) = filters.category.as_deref().filter(|c| !c.trim().is_empty()) {
        match CategorySlug::new(category) {
            Ok(slug) => query = query.category(slug),
            Err(_) => return Err(ServiceError::NotFound),
        }
    }
    if let Some(city) = filters.city.as_deref().filter(|c| !c.trim().is_empty()) {
        query = query.city(city.trim());
    }
    if let Some(search) = filters.query.as_deref().filter(|q| !q.trim().is_empty()) {
        query = query.search(search.trim());
    }

    let (total, businesses) = match repo.list_businesses(query) {
        Ok(result) => result,
        Err(e) => {
            log::error!("Failed to list businesses: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let cities = match repo.list_cities() {
        Ok(cities) => cities,
        Err(e) => {
            log::error!("Failed to list cities: {e}");
            return Err(ServiceError::Internal);
        }
    };

    Ok(BrowsePage {
        total,
        page,
        businesses: business_cards(businesses, repo),
        categories: merged_categories(repo)?,
        cities,
    })
}

/// Businesses within one category of the merged registry.
pub fn category_page<R>(
    raw_slug: &str,
    repo: &R,
) -> ServiceResult<(CategoryDto, Vec<BusinessCardDto>)>
where
    R: BusinessReader + CategoryReader + UserReader,
{
    let slug = CategorySlug::new(raw_slug).map_err(|_| ServiceError::NotFound)?;
    let category = find_category(&slug, repo)?.ok_or(ServiceError::NotFound)?;

    let businesses = match repo.list_businesses(BusinessListQuery::default().category(slug)) {
        Ok((_total, businesses)) => business_cards(businesses, repo),
        Err(e) => {
            log::error!("Failed to list businesses: {e}");
            return Err(ServiceError::Internal);
        }
    };

    Ok((category, businesses))
}

/// Public business detail page. Deactivated businesses are not found.
pub fn business_detail<R>(id: BusinessId, repo: &R) -> ServiceResult<BusinessDetailDto>
where
    R: BusinessReader + ServiceReader + UserReader,
{
    let business = match repo.get_business_by_id(id) {
        Ok(Some(business)) => business,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get business: {e}");
            return Err(ServiceError::Internal);
        }
    };

    if !business.is_active {
        return Err(ServiceError::NotFound);
    }

    let services = match repo.list_services(ServiceListQuery::new(business.id)) {
        Ok(services) => services.into_iter().map(ServiceDto::from).collect(),
        Err(e) => {
            log::error!("Failed to list services: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let owner_pic = owner_profile_pic(&business, repo);
    Ok(BusinessDetailDto::new(&business, owner_pic.as_ref(), services))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::types::{
        BusinessName, CategoryId, CategoryName, CityName, DistrictName, EmailAddress, PhoneNumber,
        StreetAddress,
    };
    use crate::repository::test::TestRepository;
    use chrono::DateTime;

    fn sample_business(id: i32, category: &str, city: &str, active: bool) -> Business {
        let at = DateTime::from_timestamp(0, 0).unwrap().naive_utc();
        Business {
            id: BusinessId::new(id).unwrap(),
            owner_id: None,
            owner_name: None,
            name: BusinessName::new(format!("Business {id}")).unwrap(),
            email: EmailAddress::new(format!("biz{id}@example.com")).unwrap(),
            phone: PhoneNumber::new("555-0000").unwrap(),
            street_house: StreetAddress::new("1 Main St").unwrap(),
            city: CityName::new(city).unwrap(),
            district: DistrictName::new("Center").unwrap(),
            description: None,
            profile_pic_url: None,
            gallery: vec![],
            category: CategorySlug::new(category).unwrap(),
            is_active: active,
            created_at: at,
            updated_at: at,
        }
    }

    fn sample_category(slug: &str, name: &str) -> Category {
        let at = DateTime::from_timestamp(0, 0).unwrap().naive_utc();
        Category {
            id: CategoryId::new(1).unwrap(),
            slug: CategorySlug::new(slug).unwrap(),
            name: CategoryName::new(name).unwrap(),
            description: None,
            icon: String::new(),
            tags: vec![],
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn merged_registry_contains_builtins() {
        let repo = TestRepository::new();
        let categories = merged_categories(&repo).unwrap();
        assert!(categories.iter().any(|c| c.slug == "plumbing" && c.builtin));
        assert_eq!(categories.len(), BUILTIN_CATEGORIES.len());
    }

    #[test]
    fn registered_rows_override_builtins() {
        let repo = TestRepository::new()
            .with_categories(vec![sample_category("plumbing", "Pipes and More")]);
        let categories = merged_categories(&repo).unwrap();

        let plumbing = categories.iter().find(|c| c.slug == "plumbing").unwrap();
        assert_eq!(plumbing.name, "Pipes and More");
        assert!(!plumbing.builtin);
        // Overriding does not add a duplicate entry.
        assert_eq!(categories.len(), BUILTIN_CATEGORIES.len());
    }

    #[test]
    fn browse_filters_by_category_and_city() {
        let repo = TestRepository::new().with_businesses(vec![
            sample_business(1, "plumbing", "Springfield", true),
            sample_business(2, "cleaning", "Springfield", true),
            sample_business(3, "plumbing", "Shelbyville", true),
            sample_business(4, "plumbing", "Springfield", false),
        ]);

        let page = browse_businesses(
            BrowseFilters {
                category: Some("plumbing".to_string()),
                city: Some("springfield".to_string()),
                query: None,
                page: 1,
            },
            &repo,
        )
        .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.businesses[0].id, 1);
    }

    #[test]
    fn category_page_rejects_unknown_slugs() {
        let repo = TestRepository::new();
        let err = category_page("astrology", &repo).unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[test]
    fn deactivated_businesses_are_not_publicly_visible() {
        let repo =
            TestRepository::new().with_businesses(vec![sample_business(1, "plumbing", "X", false)]);
        let err = business_detail(BusinessId::new(1).unwrap(), &repo).unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }
}
