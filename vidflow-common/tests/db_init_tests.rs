//! Tests for database creation, schema and default settings

use vidflow_common::db::init::{get_setting_i64, init_database};
use vidflow_common::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("vidflow.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("vidflow.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_all_tables_created() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("vidflow.db")).await.unwrap();

    for table in [
        "schema_version",
        "settings",
        "users",
        "sessions",
        "projects",
        "project_access",
        "videos",
        "notifications",
        "notification_settings",
        "affiliate_companies",
        "affiliate_matches",
        "titulin_channels",
        "titulin_videos",
        "training_examples",
        "suggestions",
    ] {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1, "table {} missing", table);
    }
}

#[tokio::test]
async fn test_schema_version_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("vidflow.db")).await.unwrap();

    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("vidflow.db")).await.unwrap();

    assert_eq!(get_setting_i64(&pool, "bulk_create_max_titles", 0).await.unwrap(), 50);
    assert_eq!(get_setting_i64(&pool, "notification_heartbeat_secs", 0).await.unwrap(), 30);
    assert_eq!(get_setting_i64(&pool, "notification_idle_timeout_secs", 0).await.unwrap(), 60);
    assert_eq!(get_setting_i64(&pool, "missing_key", 7).await.unwrap(), 7);
}

#[tokio::test]
async fn test_null_setting_is_reset_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("vidflow.db");
    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("UPDATE settings SET value = NULL WHERE key = 'notification_list_limit'")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    assert_eq!(get_setting_i64(&pool, "notification_list_limit", 0).await.unwrap(), 50);
}
