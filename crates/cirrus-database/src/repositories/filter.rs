//! Shared WHERE-clause assembly for folder and file listings.

use cirrus_core::types::NodeListOptions;

/// A listing WHERE clause plus the values its placeholders expect.
///
/// Bind order: owner id first, then `pattern` when present, then
/// `parent_bind` when present. Both repositories follow this order for the
/// count and the page query.
pub(crate) struct ListingFilter {
    pub clause: String,
    pub pattern: Option<String>,
    pub parent_bind: Option<i64>,
}

impl ListingFilter {
    pub fn new(parent_id: Option<i64>, options: &NodeListOptions) -> Self {
        let mut clause = String::from("WHERE owner_id = ?");
        let mut pattern = None;
        let mut parent_bind = None;

        clause.push_str(if options.trashed {
            " AND deleted_at IS NOT NULL"
        } else {
            " AND deleted_at IS NULL"
        });

        if options.starred {
            clause.push_str(" AND is_starred = 1");
        }

        if let Some(term) = options.search.as_deref() {
            // Search spans the whole tree: the parent scope is dropped on
            // purpose so one query finds a name anywhere.
            clause.push_str(" AND LOWER(name) LIKE ? ESCAPE '\\'");
            pattern = Some(search_pattern(term));
        } else if !options.trashed {
            // The trash is a flat view, so the parent scope only applies to
            // live listings.
            match parent_id {
                Some(id) => {
                    clause.push_str(" AND parent_id = ?");
                    parent_bind = Some(id);
                }
                None => clause.push_str(" AND parent_id IS NULL"),
            }
        }

        Self {
            clause,
            pattern,
            parent_bind,
        }
    }
}

/// Lowercases the term and escapes LIKE metacharacters, then wraps it for a
/// substring match.
fn search_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}
