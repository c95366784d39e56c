use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit payloads for folder and file mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceEvent {
    FolderCreated {
        folder_uuid: Uuid,
        name: String,
        parent_uuid: Option<Uuid>,
    },
    FileUploaded {
        file_uuid: Uuid,
        name: String,
        size: i64,
        mime_type: Option<String>,
        storage_provider: String,
    },
    Renamed {
        node_uuid: Uuid,
        old_name: String,
        new_name: String,
    },
    Moved {
        node_uuid: Uuid,
        parent_uuid: Option<Uuid>,
    },
    StarToggled {
        node_uuid: Uuid,
        starred: bool,
    },
    Trashed {
        node_uuid: Uuid,
    },
    Restored {
        node_uuid: Uuid,
    },
    Purged {
        node_uuid: Uuid,
        name: String,
    },
    TrashEmptied {
        purged: u64,
    },
}
