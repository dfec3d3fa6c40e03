use crate::config::DbConfig;
use crate::error::AppError;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::info;

pub type DbPool = Pool<Postgres>;

pub async fn connect(cfg: &DbConfig) -> Result<DbPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect(&cfg.url)
        .await?;
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_idx ON users (LOWER(email))",
    r#"
    CREATE TABLE IF NOT EXISTS devices (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        location TEXT NOT NULL DEFAULT 'unknown',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS readings (
        id UUID PRIMARY KEY,
        seq BIGSERIAL NOT NULL,
        device_id UUID NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
        ts TIMESTAMPTZ NOT NULL,
        watts DOUBLE PRECISION NOT NULL,
        voltage_v DOUBLE PRECISION,
        current_a DOUBLE PRECISION,
        energy_kwh DOUBLE PRECISION
    )
    "#,
    // Insertion order breaks ties between readings sharing a timestamp.
    "ALTER TABLE readings ADD COLUMN IF NOT EXISTS seq BIGSERIAL NOT NULL",
    "CREATE INDEX IF NOT EXISTS readings_device_ts_seq_idx ON readings (device_id, ts, seq)",
];

/// Creates tables and indexes when missing. Safe to run on every start.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), AppError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}
