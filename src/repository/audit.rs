use diesel::prelude::*;

use crate::domain::audit::{AuditEntry, NewAuditEntry};
use crate::models::audit::{AuditEntry as DbAuditEntry, NewAuditEntry as DbNewAuditEntry};
use crate::pagination::Pagination;
use crate::repository::errors::RepositoryResult;
use crate::repository::{AuditLogReader, AuditLogWriter, DieselRepository};

impl AuditLogReader for DieselRepository {
    fn list_audit_entries(
        &self,
        pagination: Option<Pagination>,
    ) -> RepositoryResult<(usize, Vec<AuditEntry>)> {
        use crate::schema::audit_logs;

        let mut conn = self.conn()?;

        let total = audit_logs::table.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = audit_logs::table.into_boxed::<diesel::sqlite::Sqlite>();
        if let Some(pagination) = &pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let items = items
            .order(audit_logs::created_at.desc())
            .load::<DbAuditEntry>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<AuditEntry>, _>>()?;

        Ok((total, items))
    }
}

impl AuditLogWriter for DieselRepository {
    fn append_audit_entry(&self, entry: &NewAuditEntry) -> RepositoryResult<usize> {
        use crate::schema::audit_logs;

        let mut conn = self.conn()?;
        let db_entry: DbNewAuditEntry = entry.clone().into();

        let affected = diesel::insert_into(audit_logs::table)
            .values(db_entry)
            .execute(&mut conn)?;

        Ok(affected)
    }
}
