use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit payloads for share grant changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShareEvent {
    Granted {
        share_uuid: Uuid,
        resource_kind: String,
        resource_uuid: Uuid,
        recipient_id: Option<i64>,
        permission: String,
        expires_at: Option<DateTime<Utc>>,
    },
    Updated {
        share_uuid: Uuid,
        permission: String,
    },
    Revoked {
        resource_kind: String,
        resource_uuid: Option<Uuid>,
        revoked: u64,
    },
}
