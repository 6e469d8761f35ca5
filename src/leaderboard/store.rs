use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("could not prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: i64,
    pub updated_at: i64,
}

/// High scores keyed by username; each row keeps the best score seen.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    pool: SqlitePool,
}

impl ScoreStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        ensure_db_dir(database_url)?;
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Private in-memory database; a single connection that never recycles keeps it alive.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn upsert_high_score(&self, username: &str, score: u32) -> Result<(), StoreError> {
        let now = chrono::Utc::now().timestamp_millis();
        sqlx::query(
            "INSERT INTO high_scores (username, score, created_at, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(username) DO UPDATE SET \
             updated_at = CASE WHEN excluded.score > high_scores.score \
               THEN excluded.updated_at ELSE high_scores.updated_at END, \
             score = MAX(high_scores.score, excluded.score)",
        )
        .bind(username)
        .bind(i64::from(score))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn top_scores(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let rows = sqlx::query(
            "SELECT username, score, updated_at FROM high_scores \
             ORDER BY score DESC, updated_at ASC, username ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<LeaderboardEntry, StoreError> {
                Ok(LeaderboardEntry {
                    username: row.try_get("username")?,
                    score: row.try_get("score")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn ensure_db_dir(database_url: &str) -> std::io::Result<()> {
    if database_url.starts_with("sqlite::memory:") {
        return Ok(());
    }
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"));
    let Some(path) = path else { return Ok(()) };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
