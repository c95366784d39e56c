mod model;

pub use model::{NewUser, User};
