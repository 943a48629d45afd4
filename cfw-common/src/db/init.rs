//! Database initialization
//!
//! Creates the database on first run with the full schema and default
//! settings. All statements are idempotent; init is safe to call on every
//! startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

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

    configure_and_migrate(&pool).await?;

    Ok(pool)
}

/// Initialize an in-memory database (used by tests)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    configure_and_migrate(&pool).await?;
    Ok(pool)
}

async fn configure_and_migrate(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer; reviewer tabs read
    // while an autosave writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    // Migrations (idempotent - safe to call multiple times)
    create_settings_table(pool).await?;
    create_folders_table(pool).await?;
    create_folder_sections_table(pool).await?;
    create_folder_feedback_table(pool).await?;
    create_folder_decisions_table(pool).await?;

    init_default_settings(pool).await?;

    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_folders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS folders (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'DRAFT',
            first_activity_completed INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_folder_sections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS folder_sections (
            folder_guid TEXT NOT NULL REFERENCES folders(guid),
            section TEXT NOT NULL,
            content TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (folder_guid, section)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_folder_feedback_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS folder_feedback (
            folder_guid TEXT NOT NULL REFERENCES folders(guid),
            section TEXT NOT NULL,
            channel TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            saved_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (folder_guid, section, channel)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_folder_decisions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS folder_decisions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            folder_guid TEXT NOT NULL REFERENCES folders(guid),
            actor_role TEXT NOT NULL,
            action TEXT NOT NULL,
            from_status TEXT NOT NULL,
            to_status TEXT NOT NULL,
            notes TEXT,
            decided_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert default settings if not already present
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    let defaults: [(&str, &str); 3] = [
        // Idle window before a buffered edit is persisted
        ("autosave_debounce_ms", "2000"),
        ("event_bus_capacity", "100"),
        ("http_port", "5740"),
    ];

    for (key, value) in defaults {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await?;
    }

    Ok(())
}
