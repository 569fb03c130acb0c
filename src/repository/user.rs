use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{EmailAddress, UserId, UserRole};
use crate::domain::user::{NewUser, User, UserProfileUpdate};
use crate::models::user::{NewUser as DbNewUser, User as DbUser};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, UserCounts, UserListQuery, UserReader, UserWriter};

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let user = users::table
            .filter(users::id.eq(id.get()))
            .first::<DbUser>(&mut conn)
            .optional()?;

        Ok(user.map(TryInto::try_into).transpose()?)
    }

    fn get_user_by_email(&self, email: &EmailAddress) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let user = users::table
            .filter(users::email.eq(email.as_str()))
            .first::<DbUser>(&mut conn)
            .optional()?;

        Ok(user.map(TryInto::try_into).transpose()?)
    }

    fn get_user_by_reset_token(&self, token: &str) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let user = users::table
            .filter(users::reset_token.eq(Some(token)))
            .first::<DbUser>(&mut conn)
            .optional()?;

        Ok(user.map(TryInto::try_into).transpose()?)
    }

    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = users::table.into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(role) = query.role {
                items = items.filter(users::role.eq(role.as_str()));
            }
            if let Some(search) = &query.search {
                let pattern = format!("%{search}%");
                items = items.filter(
                    users::name
                        .like(pattern.clone())
                        .or(users::email.like(pattern)),
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
            .order(users::created_at.desc())
            .load::<DbUser>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<User>, _>>()?;

        Ok((total, items))
    }

    fn user_counts(&self) -> RepositoryResult<UserCounts> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let total = users::table.count().get_result::<i64>(&mut conn)? as usize;
        let active = users::table
            .filter(users::is_active.eq(true))
            .count()
            .get_result::<i64>(&mut conn)? as usize;
        let customers = users::table
            .filter(users::role.eq(UserRole::Customer.as_str()))
            .count()
            .get_result::<i64>(&mut conn)? as usize;
        let business_owners = users::table
            .filter(users::role.eq(UserRole::BusinessOwner.as_str()))
            .count()
            .get_result::<i64>(&mut conn)? as usize;

        Ok(UserCounts {
            total,
            active,
            customers,
            business_owners,
        })
    }
}

impl UserWriter for DieselRepository {
    fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let db_user: DbNewUser = user.clone().into();

        let stored = diesel::insert_into(users::table)
            .values(db_user)
            .get_result::<DbUser>(&mut conn)?;

        Ok(stored.try_into()?)
    }

    fn update_user_profile(
        &self,
        id: UserId,
        update: &UserProfileUpdate,
    ) -> RepositoryResult<usize> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let affected = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set((
                users::name.eq(update.name.as_str()),
                users::phone.eq(update.phone.as_ref().map(|p| p.as_str().to_string())),
                users::street_house.eq(update.street_house.as_str()),
                users::city.eq(update.city.as_str()),
                users::district.eq(update.district.as_str()),
                users::profile_pic_url
                    .eq(update.profile_pic_url.as_ref().map(|u| u.as_str().to_string())),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_user_password(&self, id: UserId, password_hash: &str) -> RepositoryResult<usize> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let affected = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set((
                users::password_hash.eq(password_hash),
                users::reset_token.eq(None::<String>),
                users::reset_token_expires.eq(None::<NaiveDateTime>),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_user_verified(&self, id: UserId, verified: bool) -> RepositoryResult<usize> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let affected = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set((
                users::is_verified.eq(verified),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_user_active(&self, id: UserId, active: bool) -> RepositoryResult<usize> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let affected = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set((
                users::is_active.eq(active),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_reset_token(
        &self,
        id: UserId,
        token: Option<(&str, NaiveDateTime)>,
    ) -> RepositoryResult<usize> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let affected = match token {
            Some((token, expires)) => {
                diesel::update(users::table.filter(users::id.eq(id.get())))
                    .set((
                        users::reset_token.eq(Some(token.to_string())),
                        users::reset_token_expires.eq(Some(expires)),
                        users::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(&mut conn)?
            }
            None => diesel::update(users::table.filter(users::id.eq(id.get())))
                .set((
                    users::reset_token.eq(None::<String>),
                    users::reset_token_expires.eq(None::<NaiveDateTime>),
                    users::updated_at.eq(diesel::dsl::now),
                ))
                .execute(&mut conn)?,
        };

        Ok(affected)
    }
}
