//! SQLite-backed telemetry store

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{StoreError, TelemetryStore};

/// Writes each record as one row in its kind's table
#[derive(Clone)]
pub struct SqliteTelemetryStore {
    db: SqlitePool,
}

impl SqliteTelemetryStore {
    /// Wrap a pool whose tables were created by `pocketlife_common::db`
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TelemetryStore for SqliteTelemetryStore {
    async fn insert_arguments(&self, arguments: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO arguments (arguments) VALUES (?)")
            .bind(arguments)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn insert_bandwidth(&self, sent_kb: f64, received_kb: f64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO bandwidth (sent_kb, received_kb) VALUES (?, ?)")
            .bind(sent_kb)
            .bind(received_kb)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn insert_device_info(
        &self,
        language: &str,
        operating_system: &str,
        public_ip_address: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO device_info (language, operating_system, public_ip_address) VALUES (?, ?, ?)",
        )
        .bind(language)
        .bind(operating_system)
        .bind(public_ip_address)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn insert_function_trace(
        &self,
        result: Option<&str>,
        function_name: &str,
        execution_time: Option<f64>,
        cpu_usage_change: Option<f64>,
        ram_usage_change: Option<f64>,
        function_arguments: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO function_trace
                (result, function_name, execution_time, cpu_usage_change, ram_usage_change, function_arguments)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(result)
        .bind(function_name)
        .bind(execution_time)
        .bind(cpu_usage_change)
        .bind(ram_usage_change)
        .bind(function_arguments)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn insert_program_usage(
        &self,
        cpu_usage: Option<f64>,
        ram_usage: Option<f64>,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO program_usage (cpu_usage, ram_usage) VALUES (?, ?)")
            .bind(cpu_usage)
            .bind(ram_usage)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketlife_common::db::create_telemetry_tables;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Single-connection in-memory database with the record tables
    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_telemetry_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_insert_arguments() {
        let pool = setup_test_db().await;
        let store = SqliteTelemetryStore::new(pool.clone());

        store.insert_arguments("['app.py', '-v']").await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT arguments FROM arguments")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, "['app.py', '-v']");
    }

    #[tokio::test]
    async fn test_insert_function_trace_keeps_nulls() {
        let pool = setup_test_db().await;
        let store = SqliteTelemetryStore::new(pool.clone());

        store
            .insert_function_trace(None, "foo", Some(1.5), None, None, None)
            .await
            .unwrap();

        let row: (Option<String>, String, Option<f64>, Option<f64>, Option<f64>, Option<String>) =
            sqlx::query_as(
                "SELECT result, function_name, execution_time, cpu_usage_change, \
                 ram_usage_change, function_arguments FROM function_trace",
            )
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(row, (None, "foo".to_string(), Some(1.5), None, None, None));
    }

    #[tokio::test]
    async fn test_insert_program_usage_and_bandwidth() {
        let pool = setup_test_db().await;
        let store = SqliteTelemetryStore::new(pool.clone());

        store.insert_program_usage(Some(12.5), None).await.unwrap();
        store.insert_bandwidth(1.0, 2.5).await.unwrap();

        let usage: (Option<f64>, Option<f64>) =
            sqlx::query_as("SELECT cpu_usage, ram_usage FROM program_usage")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(usage, (Some(12.5), None));

        let bandwidth: (f64, f64) = sqlx::query_as("SELECT sent_kb, received_kb FROM bandwidth")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(bandwidth, (1.0, 2.5));
    }

    #[tokio::test]
    async fn test_missing_table_surfaces_database_error() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteTelemetryStore::new(pool);

        let err = store.insert_device_info("en", "Linux", "").await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(err.to_string().contains("no such table"));
    }
}
