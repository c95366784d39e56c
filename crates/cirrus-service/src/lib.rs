//! Domain services for Cirrus Drive.
//!
//! Everything here is owner-scoped through a [`RequestContext`], with two
//! exceptions: [`ShareAccessService`], where the share token itself is the
//! credential, and the [`AuditRecorder`], which runs on behalf of whoever
//! triggered the operation.

pub mod audit;
pub mod context;
pub mod file;
pub mod folder;
pub mod share;
pub mod trash;

pub use audit::AuditRecorder;
pub use context::RequestContext;
pub use file::{Download, FileService, UploadRequest};
pub use folder::{CreateFolderRequest, FolderService};
pub use share::{
    ResolvedShare, ResourceSnapshot, ShareAccessService, SharePasswordHasher, ShareRequest,
    ShareService, SharedEntry, TokenGenerator,
};
pub use trash::TrashService;
