use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::audit::{AuditEntry as DomainAuditEntry, NewAuditEntry as DomainNewAuditEntry};
use crate::domain::types::TypeConstraintError;

/// Diesel model representing the `audit_logs` table.
#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::audit_logs)]
pub struct AuditEntry {
    pub id: i32,
    pub action: String,
    pub actor_id: i32,
    pub actor_role: String,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub details: String,
    pub created_at: NaiveDateTime,
}

/// Insertable form of [`AuditEntry`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::audit_logs)]
pub struct NewAuditEntry {
    pub action: String,
    pub actor_id: i32,
    pub actor_role: String,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub details: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<AuditEntry> for DomainAuditEntry {
    type Error = TypeConstraintError;

    fn try_from(entry: AuditEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entry.id.try_into()?,
            action: entry.action,
            actor_id: entry.actor_id.try_into()?,
            actor_role: entry.actor_role.try_into()?,
            target_type: entry.target_type,
            target_id: entry.target_id,
            details: entry.details,
            created_at: entry.created_at,
        })
    }
}

impl From<DomainNewAuditEntry> for NewAuditEntry {
    fn from(entry: DomainNewAuditEntry) -> Self {
        Self {
            action: entry.action,
            actor_id: entry.actor_id.get(),
            actor_role: entry.actor_role.as_str().to_string(),
            target_type: entry.target_type,
            target_id: entry.target_id,
            details: entry.details,
            created_at: entry.created_at,
        }
    }
}
