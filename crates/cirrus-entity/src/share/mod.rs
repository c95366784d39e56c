mod model;

pub use model::{NewShare, Share, SharePermission, ShareResource};
