//! Database initialization
//!
//! Opens (creating if needed) the SQLite telemetry database and creates the
//! five record tables. Table creation is idempotent and runs on every start.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Tables created by [`create_telemetry_tables`], one per record kind
pub const TELEMETRY_TABLES: [&str; 5] = [
    "arguments",
    "bandwidth",
    "device_info",
    "function_trace",
    "program_usage",
];

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets readers run alongside the single writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_telemetry_tables(&pool).await?;

    Ok(pool)
}

/// Create all record tables (safe to call repeatedly)
pub async fn create_telemetry_tables(pool: &SqlitePool) -> Result<()> {
    create_arguments_table(pool).await?;
    create_bandwidth_table(pool).await?;
    create_device_info_table(pool).await?;
    create_function_trace_table(pool).await?;
    create_program_usage_table(pool).await?;

    Ok(())
}

async fn create_arguments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS arguments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            arguments TEXT NOT NULL,
            recorded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bandwidth_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bandwidth (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sent_kb REAL NOT NULL,
            received_kb REAL NOT NULL,
            recorded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_device_info_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS device_info (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            language TEXT NOT NULL DEFAULT '',
            operating_system TEXT NOT NULL DEFAULT '',
            public_ip_address TEXT NOT NULL DEFAULT '',
            recorded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Function trace rows; every measurement column is nullable
async fn create_function_trace_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS function_trace (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            result TEXT,
            function_name TEXT NOT NULL,
            execution_time REAL,
            cpu_usage_change REAL,
            ram_usage_change REAL,
            function_arguments TEXT,
            recorded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_program_usage_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS program_usage (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cpu_usage REAL,
            ram_usage REAL,
            recorded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
