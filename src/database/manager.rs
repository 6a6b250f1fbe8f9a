use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid schema name: {0}")]
    InvalidSchemaName(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns pool construction and schema migration for the forum database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool and verify connectivity.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let options = Self::connect_options(&config.url)?;
        let pool = Self::pool_options(config).connect_with(options).await?;

        info!("Connected to database {}", Self::redact_url(&config.url));
        Ok(pool)
    }

    /// Build a pool without touching the network; connections open on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let options = Self::connect_options(&config.url)?;
        Ok(Self::pool_options(config).connect_lazy_with(options))
    }

    /// Open a pool whose connections resolve unqualified names in `schema` first.
    pub async fn connect_to_schema(
        config: &DatabaseConfig,
        schema: &str,
    ) -> Result<PgPool, DatabaseError> {
        if !Self::is_valid_schema_name(schema) {
            return Err(DatabaseError::InvalidSchemaName(schema.to_string()));
        }
        let options = Self::connect_options(&config.url)?.options([("search_path", schema)]);
        Ok(Self::pool_options(config).connect_with(options).await?)
    }

    /// Create a schema if missing. Name must pass `is_valid_schema_name`.
    pub async fn create_schema(pool: &PgPool, schema: &str) -> Result<(), DatabaseError> {
        if !Self::is_valid_schema_name(schema) {
            return Err(DatabaseError::InvalidSchemaName(schema.to_string()));
        }
        let query = format!("CREATE SCHEMA IF NOT EXISTS {}", Self::quote_identifier(schema));
        sqlx::query(&query).execute(pool).await?;
        Ok(())
    }

    pub async fn drop_schema(pool: &PgPool, schema: &str) -> Result<(), DatabaseError> {
        if !Self::is_valid_schema_name(schema) {
            return Err(DatabaseError::InvalidSchemaName(schema.to_string()));
        }
        let query = format!("DROP SCHEMA IF EXISTS {} CASCADE", Self::quote_identifier(schema));
        sqlx::query(&query).execute(pool).await?;
        Ok(())
    }

    /// Apply pending migrations from ./migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    fn connect_options(url: &str) -> Result<PgConnectOptions, DatabaseError> {
        if url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        PgConnectOptions::from_str(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    /// Strip credentials so the URL can be logged
    pub fn redact_url(raw: &str) -> String {
        match url::Url::parse(raw) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.into()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }

    /// Quote SQL identifier to prevent injection
    fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Schema names are restricted to [a-z0-9_], starting with a letter.
    fn is_valid_schema_name(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            && name.len() <= 63
    }
}
