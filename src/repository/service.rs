use diesel::prelude::*;

use crate::domain::service::{NewService, Service, ServiceUpdate};
use crate::domain::types::ServiceId;
use crate::models::service::{NewService as DbNewService, Service as DbService};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, ServiceListQuery, ServiceReader, ServiceWriter};

impl ServiceReader for DieselRepository {
    fn list_services(&self, query: ServiceListQuery) -> RepositoryResult<Vec<Service>> {
        use crate::schema::services;

        let mut conn = self.conn()?;

        let mut items = services::table
            .filter(services::business_id.eq(query.business_id.get()))
            .into_boxed::<diesel::sqlite::Sqlite>();
        if !query.include_inactive {
            items = items.filter(services::is_active.eq(true));
        }

        let items = items
            .order(services::name.asc())
            .load::<DbService>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Service>, _>>()?;

        Ok(items)
    }

    fn get_service_by_id(&self, id: ServiceId) -> RepositoryResult<Option<Service>> {
        use crate::schema::services;

        let mut conn = self.conn()?;

        let service = services::table
            .filter(services::id.eq(id.get()))
            .first::<DbService>(&mut conn)
            .optional()?;

        Ok(service.map(TryInto::try_into).transpose()?)
    }
}

impl ServiceWriter for DieselRepository {
    fn create_service(&self, service: &NewService) -> RepositoryResult<usize> {
        use crate::schema::services;

        let mut conn = self.conn()?;
        let db_service: DbNewService = service.clone().into();

        let affected = diesel::insert_into(services::table)
            .values(db_service)
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn update_service(&self, id: ServiceId, update: &ServiceUpdate) -> RepositoryResult<usize> {
        use crate::schema::services;

        let mut conn = self.conn()?;

        let affected = diesel::update(services::table.filter(services::id.eq(id.get())))
            .set((
                services::name.eq(update.name.as_str()),
                services::description.eq(update.description.clone()),
                services::price.eq(update.price.get()),
                services::duration_minutes.eq(update.duration_minutes.get()),
                services::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_service_active(&self, id: ServiceId, active: bool) -> RepositoryResult<usize> {
        use crate::schema::services;

        let mut conn = self.conn()?;

        let affected = diesel::update(services::table.filter(services::id.eq(id.get())))
            .set((
                services::is_active.eq(active),
                services::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
