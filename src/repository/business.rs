use diesel::prelude::*;

use crate::domain::business::{Business, BusinessUpdate, NewBusiness};
use crate::domain::types::{BusinessId, ImageUrl};
use crate::models::business::{gallery_column, Business as DbBusiness, NewBusiness as DbNewBusiness};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    BusinessCounts, BusinessListQuery, BusinessReader, BusinessWriter, DieselRepository,
};

impl BusinessReader for DieselRepository {
    fn list_businesses(
        &self,
        query: BusinessListQuery,
    ) -> RepositoryResult<(usize, Vec<Business>)> {
        use crate::schema::businesses;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = businesses::table.into_boxed::<diesel::sqlite::Sqlite>();
            if !query.include_inactive {
                items = items.filter(businesses::is_active.eq(true));
            }
            if let Some(owner_id) = query.owner_id {
                items = items.filter(businesses::owner_id.eq(Some(owner_id.get())));
            }
            if let Some(category) = &query.category {
                items = items.filter(businesses::category.eq(category.as_str()));
            }
            if let Some(city) = &query.city {
                // SQLite LIKE without wildcards gives a case-insensitive match.
                items = items.filter(businesses::city.like(city.clone()));
            }
            if let Some(search) = &query.search {
                let pattern = format!("%{search}%");
                items = items.filter(
                    businesses::name
                        .like(pattern.clone())
                        .or(businesses::category.like(pattern.clone()))
                        .or(businesses::city.like(pattern.clone()))
                        .or(businesses::district.like(pattern)),
                );
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();
        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let items = items
            .order(businesses::name.asc())
            .load::<DbBusiness>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Business>, _>>()?;

        Ok((total, items))
    }

    fn get_business_by_id(&self, id: BusinessId) -> RepositoryResult<Option<Business>> {
        use crate::schema::businesses;

        let mut conn = self.conn()?;

        let business = businesses::table
            .filter(businesses::id.eq(id.get()))
            .first::<DbBusiness>(&mut conn)
            .optional()?;

        Ok(business.map(TryInto::try_into).transpose()?)
    }

    fn list_cities(&self) -> RepositoryResult<Vec<String>> {
        use crate::schema::businesses;

        let mut conn = self.conn()?;

        let cities = businesses::table
            .filter(businesses::is_active.eq(true))
            .select(businesses::city)
            .distinct()
            .order(businesses::city.asc())
            .load::<String>(&mut conn)?;

        Ok(cities)
    }

    fn business_counts(&self) -> RepositoryResult<BusinessCounts> {
        use crate::schema::businesses;

        let mut conn = self.conn()?;

        let total = businesses::table.count().get_result::<i64>(&mut conn)? as usize;
        let active = businesses::table
            .filter(businesses::is_active.eq(true))
            .count()
            .get_result::<i64>(&mut conn)? as usize;

        Ok(BusinessCounts { total, active })
    }
}

impl BusinessWriter for DieselRepository {
    fn create_business(&self, business: &NewBusiness) -> RepositoryResult<Business> {
        use crate::schema::businesses;

        let mut conn = self.conn()?;
        let db_business: DbNewBusiness = business.clone().into();

        let stored = diesel::insert_into(businesses::table)
            .values(db_business)
            .get_result::<DbBusiness>(&mut conn)?;

        Ok(stored.try_into()?)
    }

    fn update_business(&self, id: BusinessId, update: &BusinessUpdate) -> RepositoryResult<usize> {
        use crate::schema::businesses;

        let mut conn = self.conn()?;

        let affected = diesel::update(businesses::table.filter(businesses::id.eq(id.get())))
            .set((
                businesses::name.eq(update.name.as_str()),
                businesses::email.eq(update.email.as_str()),
                businesses::phone.eq(update.phone.as_str()),
                businesses::street_house.eq(update.street_house.as_str()),
                businesses::city.eq(update.city.as_str()),
                businesses::district.eq(update.district.as_str()),
                businesses::description.eq(update.description.clone()),
                businesses::category.eq(update.category.as_str()),
                businesses::profile_pic_url
                    .eq(update.profile_pic_url.as_ref().map(|u| u.as_str().to_string())),
                businesses::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_business_active(&self, id: BusinessId, active: bool) -> RepositoryResult<usize> {
        use crate::schema::businesses;

        let mut conn = self.conn()?;

        let affected = diesel::update(businesses::table.filter(businesses::id.eq(id.get())))
            .set((
                businesses::is_active.eq(active),
                businesses::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_business_gallery(
        &self,
        id: BusinessId,
        gallery: &[ImageUrl],
    ) -> RepositoryResult<usize> {
        use crate::schema::businesses;

        let mut conn = self.conn()?;

        let affected = diesel::update(businesses::table.filter(businesses::id.eq(id.get())))
            .set((
                businesses::gallery.eq(gallery_column(gallery)),
                businesses::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_business_profile_pic(
        &self,
        id: BusinessId,
        url: Option<&ImageUrl>,
    ) -> RepositoryResult<usize> {
        use crate::schema::businesses;

        let mut conn = self.conn()?;

        let affected = diesel::update(businesses::table.filter(businesses::id.eq(id.get())))
            .set((
                businesses::profile_pic_url.eq(url.map(|u| u.as_str().to_string())),
                businesses::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
