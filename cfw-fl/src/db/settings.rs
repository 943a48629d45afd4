//! Settings database access
//!
//! Read/write settings from the settings table (key-value store). All
//! settings are global/system-wide.

use crate::error::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Load HTTP port from settings (default: 5740)
pub async fn load_http_port(db: &Pool<Sqlite>) -> Result<u16> {
    match get_setting::<u16>(db, "http_port").await? {
        Some(port) => Ok(port),
        None => Ok(5740),
    }
}

/// Load event bus capacity from settings (default: 100)
pub async fn load_event_bus_capacity(db: &Pool<Sqlite>) -> Result<usize> {
    match get_setting::<usize>(db, "event_bus_capacity").await? {
        // Clamp to valid range: 10-10000
        Some(capacity) => Ok(capacity.clamp(10, 10_000)),
        None => Ok(100),
    }
}

/// Generic setting getter
///
/// Returns None if key doesn't exist in database. Parses value from string
/// using FromStr trait.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfw_common::db::init_memory_database;

    #[tokio::test]
    async fn test_generic_setting_get_set() {
        let db = init_memory_database().await.unwrap();

        set_setting(&db, "test_int", 42).await.unwrap();
        let value: Option<i32> = get_setting(&db, "test_int").await.unwrap();
        assert_eq!(value, Some(42));

        let value: Option<String> = get_setting(&db, "nonexistent").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_setting_update_uses_upsert() {
        let db = init_memory_database().await.unwrap();

        set_setting(&db, "test_key", "value1".to_string()).await.unwrap();
        set_setting(&db, "test_key", "value2".to_string()).await.unwrap();

        let value: Option<String> = get_setting(&db, "test_key").await.unwrap();
        assert_eq!(value, Some("value2".to_string()));
    }

    #[tokio::test]
    async fn test_defaults_initialized_by_init() {
        let db = init_memory_database().await.unwrap();

        assert_eq!(load_http_port(&db).await.unwrap(), 5740);
        assert_eq!(load_event_bus_capacity(&db).await.unwrap(), 100);

        let debounce: Option<u64> = get_setting(&db, "autosave_debounce_ms").await.unwrap();
        assert_eq!(debounce, Some(2000));
    }

    #[tokio::test]
    async fn test_event_bus_capacity_clamped() {
        let db = init_memory_database().await.unwrap();
        set_setting(&db, "event_bus_capacity", 2).await.unwrap();
        assert_eq!(load_event_bus_capacity(&db).await.unwrap(), 10);
    }
}
