use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::store::PgEventStore;

/// Shared handle to the PostgreSQL database. Constructed once by the entry
/// point and closed on shutdown.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        tracing::info!(max_connections, "Successfully connected to database");

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await?;
        tracing::info!("Migrations run successfully");
        Ok(())
    }

    /// Accessor for the `events` collection.
    pub fn events(&self) -> PgEventStore {
        PgEventStore::new(self.pool.clone())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connections closed");
    }
}
