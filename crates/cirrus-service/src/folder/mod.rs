mod service;

pub(crate) use service::MAX_TREE_DEPTH;
pub use service::{CreateFolderRequest, FolderService};
