use serde::{Deserialize, Serialize};

use super::sorting::{NodeSortKey, SortDirection};

/// Filters applied to folder and file listings.
///
/// Listings return live nodes by default. With `trashed` set, only
/// soft-deleted nodes are returned and the parent scope is ignored so the
/// whole trash is visible at once. A `search` term also ignores the parent
/// scope and matches names case-insensitively across the owner's tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeListOptions {
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: NodeSortKey,
    #[serde(default)]
    pub order: SortDirection,
}

impl NodeListOptions {
    /// Options for a flat view of the trash.
    pub fn trashed_only() -> Self {
        Self {
            trashed: true,
            ..Self::default()
        }
    }
}
