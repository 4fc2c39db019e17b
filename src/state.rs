use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::repositories::{availability::PgAvailabilityStore, session::PgSessionStore};
use crate::scheduling::calendar::SystemClock;
use crate::services::booking::BookingService;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The Redis connection manager.
    pub redis: ConnectionManager,
    /// The application's configuration.
    pub config: Config,
    /// Availability and booking, backed by Postgres.
    pub booking: BookingService,
}

impl AppState {
    /// Connects to Postgres and Redis, applies the schema and wires the
    /// booking service.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url, config.database_max_connections)?;
        tracing::info!(
            "✅ PostgreSQL pool initialized (max {} connections)",
            config.database_max_connections
        );

        crate::db::migrate(&db).await?;

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis Connection Manager initialized");

        let booking = BookingService::new(
            Arc::new(PgAvailabilityStore::new(db.clone())),
            Arc::new(PgSessionStore::new(db.clone())),
            Arc::new(SystemClock),
        );
        tracing::info!("✅ Booking service ready");

        Ok(AppState {
            db,
            redis,
            config: config.clone(),
            booking,
        })
    }
}
