use crate::config::DatabaseConfig;
use crate::error::DeliveryError;
use crate::reading::Reading;
use crate::sink::Sink;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::time::Duration;

pub type DbPool = Pool<Postgres>;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(15);

pub fn connect_options(cfg: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.username)
        .password(&cfg.password)
        .database(&cfg.dbname)
}

/// Open the pool used for the whole process lifetime. Called once at
/// startup when the relational sink is enabled.
pub async fn connect(cfg: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(connect_options(cfg))
        .await
}

pub struct PostgresSink {
    pool: DbPool,
    table: String,
}

impl PostgresSink {
    pub fn new(pool: DbPool, table: String) -> Self {
        Self { pool, table }
    }
}

#[async_trait]
impl Sink for PostgresSink {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn publish(&self, reading: &Reading) -> Result<(), DeliveryError> {
        let sql = format!(
            "INSERT INTO {} (ts, ts_epoch, outside_temp, water_temp, heat_pump_state) VALUES ($1, $2, $3, $4, $5)",
            self.table
        );
        sqlx::query(&sql)
            .bind(reading.ts)
            .bind(reading.ts_epoch())
            .bind(reading.outside_temp)
            .bind(reading.water_temp)
            .bind(reading.state.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
