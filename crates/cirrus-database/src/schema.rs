//! Embedded schema.
//!
//! Every statement is idempotent via `IF NOT EXISTS`, so the whole list
//! runs on each startup and there is no separate migration step. UUIDs are
//! stored as 16-byte blobs and timestamps as RFC 3339 text, both set by the
//! application rather than SQL defaults.

use sqlx::SqlitePool;

use cirrus_core::{AppError, AppResult, ErrorKind};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid BLOB NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS folders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid BLOB NOT NULL UNIQUE,
        name TEXT NOT NULL,
        owner_id INTEGER NOT NULL REFERENCES users(id),
        parent_id INTEGER REFERENCES folders(id) ON DELETE CASCADE,
        is_starred INTEGER NOT NULL DEFAULT 0,
        deleted_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_folders_owner ON folders(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_folders_parent ON folders(parent_id)",
    "CREATE TABLE IF NOT EXISTS files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid BLOB NOT NULL UNIQUE,
        name TEXT NOT NULL,
        owner_id INTEGER NOT NULL REFERENCES users(id),
        parent_id INTEGER REFERENCES folders(id) ON DELETE CASCADE,
        size INTEGER NOT NULL DEFAULT 0,
        mime_type TEXT,
        storage_key TEXT NOT NULL,
        storage_provider TEXT NOT NULL,
        is_starred INTEGER NOT NULL DEFAULT 0,
        deleted_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_files_owner ON files(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_files_parent ON files(parent_id)",
    // No foreign keys on file_id/folder_id: revoked grants outlive their
    // resource and stay behind as history.
    "CREATE TABLE IF NOT EXISTS shares (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid BLOB NOT NULL UNIQUE,
        token TEXT NOT NULL UNIQUE,
        file_id INTEGER,
        folder_id INTEGER,
        created_by INTEGER NOT NULL REFERENCES users(id),
        recipient_id INTEGER REFERENCES users(id),
        permission TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        expires_at TEXT,
        password_hash TEXT,
        download_enabled INTEGER NOT NULL DEFAULT 1,
        views INTEGER NOT NULL DEFAULT 0,
        deleted_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK ((file_id IS NULL) <> (folder_id IS NULL))
    )",
    "CREATE INDEX IF NOT EXISTS idx_shares_file ON shares(file_id)",
    "CREATE INDEX IF NOT EXISTS idx_shares_folder ON shares(folder_id)",
    "CREATE INDEX IF NOT EXISTS idx_shares_recipient ON shares(recipient_id)",
    "CREATE TABLE IF NOT EXISTS audit_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        actor_id INTEGER NOT NULL,
        action TEXT NOT NULL,
        target_type TEXT NOT NULL,
        target_id INTEGER NOT NULL,
        details TEXT,
        created_at TEXT NOT NULL
    )",
];

/// Applies the schema to the given pool.
pub async fn apply(pool: &SqlitePool) -> AppResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to apply schema", e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::connection::DatabasePool;

    #[tokio::test]
    async fn schema_application_is_idempotent() {
        let db = DatabasePool::open_in_memory().await.unwrap();
        // open_in_memory already applied it once.
        super::apply(db.pool()).await.unwrap();
    }
}
