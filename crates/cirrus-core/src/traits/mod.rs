pub mod audit;
pub mod storage;

pub use audit::{AuditEvent, AuditSink};
pub use storage::{ByteStream, ObjectStore, StorageObjectRef};
