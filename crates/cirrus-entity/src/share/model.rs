use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What a grant allows the holder to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SharePermission {
    Viewer,
    Editor,
}

impl SharePermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePermission::Viewer => "viewer",
            SharePermission::Editor => "editor",
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single resource a grant points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ShareResource {
    File(i64),
    Folder(i64),
}

impl ShareResource {
    pub fn file_id(&self) -> Option<i64> {
        match self {
            ShareResource::File(id) => Some(*id),
            ShareResource::Folder(_) => None,
        }
    }

    pub fn folder_id(&self) -> Option<i64> {
        match self {
            ShareResource::File(_) => None,
            ShareResource::Folder(id) => Some(*id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ShareResource::File(_) => "file",
            ShareResource::Folder(_) => "folder",
        }
    }
}

/// A share grant row.
///
/// Exactly one of `file_id` and `folder_id` is set. A missing
/// `recipient_id` makes this a public link. Grants are never hard-deleted;
/// revocation and expiry clear `is_active` and the row stays behind as
/// history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Share {
    pub id: i64,
    pub uuid: Uuid,
    pub token: String,
    pub file_id: Option<i64>,
    pub folder_id: Option<i64>,
    pub created_by: i64,
    pub recipient_id: Option<i64>,
    pub permission: SharePermission,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub download_enabled: bool,
    pub views: i64,
    /// Unused by current flows; grants deactivate instead of deleting.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Share {
    pub fn resource(&self) -> Option<ShareResource> {
        match (self.file_id, self.folder_id) {
            (Some(id), _) => Some(ShareResource::File(id)),
            (None, Some(id)) => Some(ShareResource::Folder(id)),
            (None, None) => None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// A public link has no fixed recipient.
    pub fn is_public(&self) -> bool {
        self.recipient_id.is_none()
    }
}

/// Fields required to insert a grant.
#[derive(Debug, Clone)]
pub struct NewShare {
    pub uuid: Uuid,
    pub token: String,
    pub resource: ShareResource,
    pub created_by: i64,
    pub recipient_id: Option<i64>,
    pub permission: SharePermission,
    pub expires_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    pub download_enabled: bool,
}
