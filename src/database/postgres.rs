use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool, Row,
};
use tracing::info;

use super::models::UserDocument;
use super::store::{Sequence, StoreError, UserStore};
use crate::config::DatabaseConfig;

/// Postgres `query_canceled`, raised when `statement_timeout` fires
const QUERY_CANCELED: &str = "57014";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Timeout("timed out acquiring a connection".to_string()),
            sqlx::Error::PoolClosed => StoreError::Connection("connection pool closed".to_string()),
            sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::Configuration(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::Database(e) if e.code().as_deref() == Some(QUERY_CANCELED) => {
                StoreError::Timeout(e.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

const CREATE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        subject_id TEXT PRIMARY KEY,
        doc JSONB NOT NULL
    )
"#;

// Every mutation is one UPDATE on one row, so each is atomic per document.
// $1 subject id, $2 sequence field, then operation arguments, last the refreshed updated_at.

const PUSH_ENTRY: &str = r#"
    UPDATE users
    SET doc = jsonb_set(
            jsonb_set(doc, ARRAY[$2::text],
                COALESCE(doc -> $2::text, '[]'::jsonb) || jsonb_build_array($3::jsonb)),
            '{updated_at}', $4::jsonb)
    WHERE subject_id = $1
"#;

const UPDATE_ENTRY: &str = r#"
    UPDATE users
    SET doc = jsonb_set(
            jsonb_set(doc, ARRAY[$2::text], (
                SELECT jsonb_agg(
                    CASE WHEN e ->> '_id' = $3 THEN e || $4::jsonb ELSE e END
                    ORDER BY ord)
                FROM jsonb_array_elements(doc -> $2::text) WITH ORDINALITY AS t(e, ord))),
            '{updated_at}', $5::jsonb)
    WHERE subject_id = $1
      AND doc -> $2::text @> jsonb_build_array(jsonb_build_object('_id', $3::text))
"#;

const PULL_ENTRY: &str = r#"
    UPDATE users
    SET doc = jsonb_set(
            jsonb_set(doc, ARRAY[$2::text], COALESCE((
                SELECT jsonb_agg(e ORDER BY ord)
                FROM jsonb_array_elements(doc -> $2::text) WITH ORDINALITY AS t(e, ord)
                WHERE e ->> '_id' <> $3), '[]'::jsonb)),
            '{updated_at}', $4::jsonb)
    WHERE subject_id = $1
      AND doc -> $2::text @> jsonb_build_array(jsonb_build_object('_id', $3::text))
"#;

/// Document store on Postgres: one JSONB document per user row
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, apply timeouts and make sure the table exists
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = PgConnectOptions::from_str(url)?
            .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;

        info!("Connected Postgres document store ({} max connections)", config.max_connections);
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    fn now() -> Value {
        json!(Utc::now())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find(&self, subject_id: &str) -> Result<Option<UserDocument>, StoreError> {
        let row = sqlx::query("SELECT doc FROM users WHERE subject_id = $1")
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let doc: Value = row.try_get("doc")?;
                Ok(Some(serde_json::from_value(doc)?))
            }
            None => Ok(None),
        }
    }

    async fn insert_if_absent(&self, document: &UserDocument) -> Result<bool, StoreError> {
        let doc = serde_json::to_value(document)?;
        let result = sqlx::query(
            "INSERT INTO users (subject_id, doc) VALUES ($1, $2) ON CONFLICT (subject_id) DO NOTHING",
        )
        .bind(&document.subject_id)
        .bind(doc)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_fields(&self, subject_id: &str, mut fields: Map<String, Value>) -> Result<u64, StoreError> {
        fields.insert("updated_at".to_string(), Self::now());
        let result = sqlx::query("UPDATE users SET doc = doc || $2::jsonb WHERE subject_id = $1")
            .bind(subject_id)
            .bind(Value::Object(fields))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn push_entry(&self, subject_id: &str, sequence: Sequence, entry: Value) -> Result<u64, StoreError> {
        let result = sqlx::query(PUSH_ENTRY)
            .bind(subject_id)
            .bind(sequence.field())
            .bind(entry)
            .bind(Self::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn update_entry(
        &self,
        subject_id: &str,
        sequence: Sequence,
        entry_id: &str,
        fields: Map<String, Value>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(UPDATE_ENTRY)
            .bind(subject_id)
            .bind(sequence.field())
            .bind(entry_id)
            .bind(Value::Object(fields))
            .bind(Self::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn pull_entry(&self, subject_id: &str, sequence: Sequence, entry_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(PULL_ENTRY)
            .bind(subject_id)
            .bind(sequence.field())
            .bind(entry_id)
            .bind(Self::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Pings the pool to ensure connectivity
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_are_retryable_timeouts() {
        assert!(matches!(StoreError::from(sqlx::Error::PoolTimedOut), StoreError::Timeout(_)));
        assert!(matches!(StoreError::from(sqlx::Error::PoolClosed), StoreError::Connection(_)));
        assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::Query(_)));
    }

    #[tokio::test]
    async fn invalid_url_is_a_connection_error() {
        let config = crate::config::AppConfig::from_lookup(|_| None).database;
        let err = match PgStore::connect("not a url", &config).await {
            Ok(_) => panic!("connect should fail"),
            Err(e) => e,
        };
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
