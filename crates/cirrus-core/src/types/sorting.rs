use serde::{Deserialize, Serialize};

/// Sort direction rendered into `ORDER BY` clauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sortable column for tree listings.
///
/// The variants form a closed set so listing queries never interpolate
/// caller-supplied column names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSortKey {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
    Size,
}

impl NodeSortKey {
    pub fn file_column(&self) -> &'static str {
        match self {
            NodeSortKey::Name => "name",
            NodeSortKey::CreatedAt => "created_at",
            NodeSortKey::UpdatedAt => "updated_at",
            NodeSortKey::Size => "size",
        }
    }

    /// Folders have no size column, so size sorting falls back to name.
    pub fn folder_column(&self) -> &'static str {
        match self {
            NodeSortKey::Size => "name",
            other => other.file_column(),
        }
    }
}
