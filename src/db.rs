//! PostgreSQL implementation of the database surface.
//!
//! Pool policy: few connections, bounded lifetime. The probe is polled
//! frequently by orchestrators and must never become a load source on the
//! database it watches.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo, ValueRef};

use crate::checks::{Database, ScalarValue};
use crate::config::{DatabaseConfig, POOL_MAX_CONNECTIONS, POOL_MAX_LIFETIME_SECS};
use crate::error::DbError;

/// Build the shared connection pool.
///
/// Connections are established lazily on first use, so a database that is
/// down at startup surfaces as an unhealthy probe rather than a crash loop.
/// Construction only fails on an unparseable connection URL.
pub fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(POOL_MAX_CONNECTIONS)
        .max_lifetime(Duration::from_secs(POOL_MAX_LIFETIME_SECS))
        .connect_lazy(&config.url)
}

/// [`Database`] backed by a sqlx connection pool.
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn table_count(&self, table: &str) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = $1",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn fetch_scalar(&self, query: &str) -> Result<ScalarValue, DbError> {
        // First row only; anything past the first cell is ignored.
        let row = sqlx::query(query).fetch_one(&self.pool).await?;
        decode_scalar(&row)
    }
}

/// Decode the first cell of a row into a JSON-representable scalar, keyed on
/// the column type the driver reports.
fn decode_scalar(row: &PgRow) -> Result<ScalarValue, DbError> {
    let column = row
        .columns()
        .first()
        .ok_or_else(|| DbError::new("query returned no columns"))?;

    if row.try_get_raw(0)?.is_null() {
        return Ok(ScalarValue::Null);
    }

    let value = match column.type_info().name() {
        "BOOL" => ScalarValue::Bool(row.try_get(0)?),
        "INT2" => ScalarValue::Int(i64::from(row.try_get::<i16, _>(0)?)),
        "INT4" => ScalarValue::Int(i64::from(row.try_get::<i32, _>(0)?)),
        "INT8" => ScalarValue::Int(row.try_get(0)?),
        "FLOAT4" => ScalarValue::Float(f64::from(row.try_get::<f32, _>(0)?)),
        "FLOAT8" => ScalarValue::Float(row.try_get(0)?),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => ScalarValue::Text(row.try_get(0)?),
        other => return Err(DbError::new(format!("unsupported scalar type {other}"))),
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            host: "db.invalid".to_string(),
            port: "5432".to_string(),
            database: "postgres".to_string(),
        }
    }

    #[tokio::test]
    async fn pool_construction_is_lazy() {
        // No server behind the address; lazy construction must still succeed.
        let pool = connect(&config(
            "postgres://probe@db.invalid:5432/postgres?sslmode=disable",
        ));
        assert!(pool.is_ok());
    }

    #[test]
    fn malformed_url_fails_at_construction() {
        assert!(connect(&config("not a connection url")).is_err());
    }
}
