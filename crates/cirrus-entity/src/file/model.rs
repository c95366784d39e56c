use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::state::NodeState;

/// A file row.
///
/// The row holds metadata only; the bytes live behind `storage_key` in
/// whichever backend `storage_provider` names. The key is internal and must
/// never appear in share-facing output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct File {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub owner_id: i64,
    pub parent_id: Option<i64>,
    pub size: i64,
    pub mime_type: Option<String>,
    pub storage_key: String,
    pub storage_provider: String,
    pub is_starred: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    pub fn state(&self) -> NodeState {
        NodeState::from_deleted_at(self.deleted_at)
    }

    pub fn is_trashed(&self) -> bool {
        self.state() == NodeState::Trashed
    }
}

/// Fields required to insert a file row after its bytes are stored.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub uuid: Uuid,
    pub name: String,
    pub owner_id: i64,
    pub parent_id: Option<i64>,
    pub size: i64,
    pub mime_type: Option<String>,
    pub storage_key: String,
    pub storage_provider: String,
}
