//! Document storage.
//!
//! `DocumentStore` is the only thing the handlers know about, `DbManager` implements it on top of
//! postgres where every collection is a table holding `JSONB` documents.

use async_trait::async_trait;
use chrono::Utc;
use lazy_regex::regex_is_match;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::DbConfig;

/// Collection holding one document per received submission.
pub const APPLICANT_COLLECTION: &str = "applicant";

/// Something that can store JSON documents into named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Inserts a single document into `collection`.
    async fn insert_one(&self, collection: &str, document: Value) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct DbManager {
    db: PgPool,
}

impl DbManager {
    pub async fn init(db_config: &DbConfig) -> Result<Self> {
        info!("{:<20} - Initializing the DB pool", "init_db");
        let con_opts = db_config
            .connection_options()
            .map_err(|er| Error::FailToCreatePool(er.to_string()))?;

        let db_pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(db_config.acquire_timeout())
            .connect_with(con_opts)
            .await
            .map_err(|er| Error::FailToCreatePool(er.to_string()))?;

        Ok(Self { db: db_pool })
    }

    /// Creates the collection tables if they don't exist yet.
    pub async fn migrate(&self) -> Result<()> {
        info!("{:<20} - Running the DB migrations", "migrate_db");
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for DbManager {
    async fn insert_one(&self, collection: &str, document: Value) -> Result<()> {
        // Table names can't be bound, so only plain identifiers get through.
        if !regex_is_match!(r"^[a-z_][a-z0-9_]{0,62}$", collection) {
            return Err(Error::InvalidCollection(collection.to_string()));
        }

        let sql = format!(
            r#"INSERT INTO "{collection}" (id, document, created_at) VALUES ($1, $2, $3)"#
        );
        sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(Json(document))
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create db pool: {0}")]
    FailToCreatePool(String),
    #[error("invalid collection name: {0}")]
    InvalidCollection(String),
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// Failure of a `DocumentStore` implementation without a dedicated variant.
    #[error("{0}")]
    Other(String),

    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
}
