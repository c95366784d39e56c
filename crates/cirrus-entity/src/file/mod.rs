mod model;

pub use model::{File, NewFile};
