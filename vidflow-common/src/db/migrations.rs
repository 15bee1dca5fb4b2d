//! Database schema migrations
//!
//! Versioned, idempotent schema changes tracked in `schema_version`.
//! Tables are created by [`super::init::create_tables`]; migrations only
//! cover changes to databases created by older builds.
//!
//! Never modify an existing migration; add a new one and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Latest applied version, 0 when nothing was recorded yet
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// v1: send-to-optimize remembers the target project
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    if !has_column(pool, "titulin_videos", "sent_to_optimize_project_id").await? {
        sqlx::query("ALTER TABLE titulin_videos ADD COLUMN sent_to_optimize_project_id INTEGER")
            .execute(pool)
            .await?;
        info!("Migration v1: Added sent_to_optimize_project_id to titulin_videos");
    }
    Ok(())
}

/// v2: per-user limits
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    for column in ["max_assigned_videos", "max_monthly_videos"] {
        if !has_column(pool, "users", column).await? {
            sqlx::query(&format!("ALTER TABLE users ADD COLUMN {} INTEGER", column))
                .execute(pool)
                .await?;
            info!("Migration v2: Added {} to users", column);
        }
    }
    Ok(())
}
