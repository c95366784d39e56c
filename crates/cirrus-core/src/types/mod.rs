pub mod listing;
pub mod pagination;
pub mod sorting;

pub use listing::NodeListOptions;
pub use pagination::{PageRequest, PageResponse};
pub use sorting::{NodeSortKey, SortDirection};
