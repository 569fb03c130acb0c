use chrono::{Duration, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::booking::{Booking, NewBooking};
use crate::domain::types::{BookingId, BookingStatus, BusinessId, UserId};
use crate::models::booking::{Booking as DbBooking, NewBooking as DbNewBooking};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    BookingCounts, BookingListQuery, BookingReader, BookingWriter, DieselRepository,
};

impl BookingReader for DieselRepository {
    fn list_bookings(&self, query: BookingListQuery) -> RepositoryResult<(usize, Vec<Booking>)> {
        use crate::schema::bookings;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = bookings::table.into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(customer_id) = query.customer_id {
                items = items.filter(bookings::customer_id.eq(customer_id.get()));
            }
            if let Some(business_id) = query.business_id {
                items = items.filter(bookings::business_id.eq(business_id.get()));
            }
            if let Some(business_ids) = &query.business_ids {
                let raw: Vec<i32> = business_ids.iter().map(|id| id.get()).collect();
                items = items.filter(bookings::business_id.eq_any(raw));
            }
            if let Some(status) = query.status {
                items = items.filter(bookings::status.eq(status.as_str()));
            }
            if let Some(date) = query.on_date {
                let start = date.and_time(chrono::NaiveTime::MIN);
                let end = start + Duration::days(1);
                items = items
                    .filter(bookings::booking_time.ge(start))
                    .filter(bookings::booking_time.lt(end));
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
            .order(bookings::booking_time.desc())
            .load::<DbBooking>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Booking>, _>>()?;

        Ok((total, items))
    }

    fn get_booking_by_id(&self, id: BookingId) -> RepositoryResult<Option<Booking>> {
        use crate::schema::bookings;

        let mut conn = self.conn()?;

        let booking = bookings::table
            .filter(bookings::id.eq(id.get()))
            .first::<DbBooking>(&mut conn)
            .optional()?;

        Ok(booking.map(TryInto::try_into).transpose()?)
    }

    fn find_conflicting_booking(
        &self,
        business_id: BusinessId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<Option<Booking>> {
        use crate::schema::bookings;

        let mut conn = self.conn()?;

        // The end of a stored booking is derived from its duration, so the
        // second half of the overlap test runs in Rust.
        let candidates = bookings::table
            .filter(bookings::business_id.eq(business_id.get()))
            .filter(bookings::status.eq_any([
                BookingStatus::Requested.as_str(),
                BookingStatus::Accepted.as_str(),
            ]))
            .filter(bookings::booking_time.lt(end))
            .order(bookings::booking_time.asc())
            .load::<DbBooking>(&mut conn)?;

        for candidate in candidates {
            let booking: Booking = candidate.try_into()?;
            if booking.end_time() > start {
                return Ok(Some(booking));
            }
        }

        Ok(None)
    }

    fn booking_counts(&self) -> RepositoryResult<BookingCounts> {
        use crate::schema::bookings;

        let mut conn = self.conn()?;

        let total = bookings::table.count().get_result::<i64>(&mut conn)? as usize;

        let mut by_status = [0usize; 5];
        let statuses = [
            BookingStatus::Requested,
            BookingStatus::Accepted,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ];
        for (slot, status) in by_status.iter_mut().zip(statuses) {
            *slot = bookings::table
                .filter(bookings::status.eq(status.as_str()))
                .count()
                .get_result::<i64>(&mut conn)? as usize;
        }

        let revenue = bookings::table
            .filter(bookings::status.eq(BookingStatus::Completed.as_str()))
            .select(diesel::dsl::sum(bookings::price))
            .get_result::<Option<f64>>(&mut conn)?
            .unwrap_or(0.0);

        Ok(BookingCounts {
            total,
            requested: by_status[0],
            accepted: by_status[1],
            rejected: by_status[2],
            cancelled: by_status[3],
            completed: by_status[4],
            revenue,
        })
    }
}

impl BookingWriter for DieselRepository {
    fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<Booking> {
        use crate::schema::bookings;

        let mut conn = self.conn()?;
        let db_booking: DbNewBooking = booking.clone().into();

        let stored = diesel::insert_into(bookings::table)
            .values(db_booking)
            .get_result::<DbBooking>(&mut conn)?;

        Ok(stored.try_into()?)
    }

    fn transition_booking(
        &self,
        id: BookingId,
        status: BookingStatus,
        at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        use crate::schema::bookings;

        let mut conn = self.conn()?;
        let target = bookings::table.filter(bookings::id.eq(id.get()));

        let affected = match status {
            BookingStatus::Requested => diesel::update(target)
                .set((
                    bookings::status.eq(status.as_str()),
                    bookings::requested_at.eq(Some(at)),
                    bookings::updated_at.eq(at),
                ))
                .execute(&mut conn)?,
            BookingStatus::Accepted => diesel::update(target)
                .set((
                    bookings::status.eq(status.as_str()),
                    bookings::accepted_at.eq(Some(at)),
                    bookings::updated_at.eq(at),
                ))
                .execute(&mut conn)?,
            BookingStatus::Rejected => diesel::update(target)
                .set((
                    bookings::status.eq(status.as_str()),
                    bookings::rejected_at.eq(Some(at)),
                    bookings::updated_at.eq(at),
                ))
                .execute(&mut conn)?,
            BookingStatus::Cancelled => diesel::update(target)
                .set((
                    bookings::status.eq(status.as_str()),
                    bookings::cancelled_at.eq(Some(at)),
                    bookings::updated_at.eq(at),
                ))
                .execute(&mut conn)?,
            BookingStatus::Completed => diesel::update(target)
                .set((
                    bookings::status.eq(status.as_str()),
                    bookings::completed_at.eq(Some(at)),
                    bookings::updated_at.eq(at),
                ))
                .execute(&mut conn)?,
        };

        Ok(affected)
    }

    fn mark_payment_received(
        &self,
        id: BookingId,
        by: UserId,
        at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        use crate::schema::bookings;

        let mut conn = self.conn()?;

        let affected = diesel::update(bookings::table.filter(bookings::id.eq(id.get())))
            .set((
                bookings::payment_received.eq(true),
                bookings::payment_received_at.eq(Some(at)),
                bookings::payment_received_by.eq(Some(by.get())),
                bookings::updated_at.eq(at),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
