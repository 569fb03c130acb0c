use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{AuditLogId, UserId, UserRole};

/// Append-only record of a moderation or booking decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditLogId,
    pub action: String,
    pub actor_id: UserId,
    pub actor_role: UserRole,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    /// JSON document describing the action.
    pub details: String,
    pub created_at: NaiveDateTime,
}

/// Data required to append a new [`AuditEntry`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub action: String,
    pub actor_id: UserId,
    pub actor_role: UserRole,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub details: String,
    pub created_at: NaiveDateTime,
}
