//! SQLite access layer: pool management, the embedded schema, and one
//! repository per table.

pub mod connection;
pub mod repositories;
pub mod schema;

pub use connection::DatabasePool;
pub use repositories::{
    AuditLogRepository, FileRepository, FolderRepository, ShareRepository, SqlAuditSink,
    UserRepository,
};
