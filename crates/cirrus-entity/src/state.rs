use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tree node.
///
/// Purged nodes have no state; their rows are gone. The state of a live row
/// is derived from its `deleted_at` column rather than stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Live,
    Trashed,
}

impl NodeState {
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(_) => NodeState::Trashed,
            None => NodeState::Live,
        }
    }
}
