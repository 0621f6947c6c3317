use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use tracing::info;

use crate::config::{self, DatabaseConfig};
use crate::validator::ValueType;

/// Read and write handles on one database.
///
/// Reads share the configured pool. Every write transaction runs on the
/// single connection of `writer`, so writers queue in the pool instead of
/// failing with `SQLITE_BUSY` when a deferred transaction upgrades to a write
/// lock. In-memory databases are per connection set; both handles are then
/// the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl Database {
    pub async fn open(cfg: &DatabaseConfig) -> anyhow::Result<Self> {
        let reader = connect(cfg).await?;
        let writer = if is_in_memory(&cfg.url) { reader.clone() } else { pool(cfg, 1).await? };
        Ok(Self { reader, writer })
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Opens the pool described by `cfg`, creating the database file if needed.
///
/// Foreign keys are switched on for every pooled connection; restrict-on-delete
/// depends on it.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let url = &cfg.url;
    config::ensure_sqlite_parent_dir(url)?;
    if !Sqlite::database_exists(url).await.unwrap_or(false) {
        info!("Creating SQLite database at {}", url);
        Sqlite::create_database(url).await?;
    }
    pool(cfg, cfg.max_connections).await
}

async fn pool(cfg: &DatabaseConfig, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&cfg.url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys=ON;").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect_with(options)
        .await?;
    Ok(pool)
}

fn type_check(column: &str) -> String {
    let allowed: Vec<String> = ValueType::ALL.iter().map(|t| format!("'{}'", t.as_str())).collect();
    format!("CHECK ({} IN ({}))", column, allowed.join(","))
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    // Foreign keys are critical - fail if this doesn't work
    sqlx::query("PRAGMA foreign_keys=ON;").execute(pool).await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS "user" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    let data_table = format!(
        r#"CREATE TABLE IF NOT EXISTS data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_by_user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            name TEXT NOT NULL UNIQUE,
            description TEXT NULL,
            data_type TEXT NOT NULL,
            CONSTRAINT check_data_type_value {},
            FOREIGN KEY(created_by_user_id) REFERENCES "user"(id) ON DELETE RESTRICT
        )"#,
        type_check("data_type")
    );
    sqlx::query(&data_table).execute(pool).await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS data_point (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            data_id INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            value TEXT NOT NULL,
            FOREIGN KEY(data_id) REFERENCES data(id) ON DELETE RESTRICT
        )"#,
    )
    .execute(pool)
    .await?;

    let meta_table = format!(
        r#"CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            meta_type TEXT NOT NULL,
            CONSTRAINT check_meta_type_value {}
        )"#,
        type_check("meta_type")
    );
    sqlx::query(&meta_table).execute(pool).await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS data_meta (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            data_id INTEGER NOT NULL,
            meta_id INTEGER NOT NULL,
            value TEXT NOT NULL,
            UNIQUE(data_id, meta_id),
            FOREIGN KEY(data_id) REFERENCES data(id) ON DELETE RESTRICT,
            FOREIGN KEY(meta_id) REFERENCES meta(id) ON DELETE RESTRICT
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_data_owner", "CREATE INDEX IF NOT EXISTS idx_data_owner ON data(created_by_user_id)"),
        ("idx_data_point_data", "CREATE INDEX IF NOT EXISTS idx_data_point_data ON data_point(data_id, id)"),
        ("idx_data_meta_meta", "CREATE INDEX IF NOT EXISTS idx_data_meta_meta ON data_meta(meta_id)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            tracing::warn!("Failed to create index {}: {}", name, e);
        }
    }

    Ok(())
}
