pub mod extractor;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod rate_limit;
pub mod session;
pub mod state;
pub mod test_utils;
pub mod validation;

pub use state::AppState;
