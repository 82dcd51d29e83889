use std::sync::Arc;
use std::time::Duration;

use shared_config::AppConfig;
use shared_database::DbPool;

use crate::rate_limit::RateLimiter;

/// Shared application state handed to every cell router.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let rate_limiter = RateLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        );

        Self {
            config: Arc::new(config),
            db,
            rate_limiter,
        }
    }
}
