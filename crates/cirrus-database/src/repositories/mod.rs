pub mod audit;
pub mod file;
mod filter;
pub mod folder;
pub mod share;
pub mod user;

pub use audit::{AuditLogRepository, SqlAuditSink};
pub use file::FileRepository;
pub use folder::FolderRepository;
pub use share::ShareRepository;
pub use user::UserRepository;
