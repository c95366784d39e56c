//! Row types mapped by the repositories, plus the insert payloads the
//! services hand them.

pub mod audit;
pub mod file;
pub mod folder;
pub mod share;
pub mod state;
pub mod user;

pub use audit::AuditEntry;
pub use file::{File, NewFile};
pub use folder::{Folder, NewFolder};
pub use share::{NewShare, Share, SharePermission, ShareResource};
pub use state::NodeState;
pub use user::{NewUser, User};
