pub mod user;

pub use user::{CreateGrant, UserService};
