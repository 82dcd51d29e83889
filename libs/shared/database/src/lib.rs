//! SQLite connection pool, embedded migrations and constraint-violation helpers
//! shared by every cell.

pub mod errors;
pub mod pool;

pub use errors::{constraint_violation, ConstraintViolation};
pub use pool::{begin_write, connect, connect_in_memory, run_migrations, DbPool};
