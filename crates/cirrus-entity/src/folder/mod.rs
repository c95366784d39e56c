mod model;

pub use model::{Folder, NewFolder};
