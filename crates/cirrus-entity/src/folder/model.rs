use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::state::NodeState;

/// A folder row.
///
/// `parent_id` is `None` for folders at the root of the owner's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub owner_id: i64,
    pub parent_id: Option<i64>,
    pub is_starred: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn state(&self) -> NodeState {
        NodeState::from_deleted_at(self.deleted_at)
    }

    pub fn is_trashed(&self) -> bool {
        self.state() == NodeState::Trashed
    }
}

/// Fields required to insert a folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    pub uuid: Uuid,
    pub name: String,
    pub owner_id: i64,
    pub parent_id: Option<i64>,
}
