//! Database module for SQLite persistence.
//!
//! Campaign rows are owned by the campaign service; this backend reads their status and
//! writes content, field links, hyperlinks, preview images and promo codes.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Basic subscriber fields available to every account.
const BASIC_FIELDS: [(i64, &str); 7] = [
    (319, "FIRST_NAME"),
    (320, "LAST_NAME"),
    (321, "EMAIL"),
    (322, "GENDER"),
    (323, "BIRTHDAY"),
    (324, "COUNTRY"),
    (325, "CONSENT"),
];

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS campaigns (
            id_campaign INTEGER PRIMARY KEY,
            account_name TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            status INTEGER,
            current_step INTEGER NOT NULL DEFAULT 1,
            content_type INTEGER,
            preview_image TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contents (
            id_campaign INTEGER PRIMARY KEY REFERENCES campaigns(id_campaign),
            editor_type INTEGER NOT NULL,
            html TEXT NOT NULL,
            meta TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS templates (
            id_template INTEGER PRIMARY KEY AUTOINCREMENT,
            account_name TEXT,
            is_public INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            name TEXT NOT NULL,
            editor_type INTEGER NOT NULL,
            html_code TEXT NOT NULL,
            meta TEXT NOT NULL,
            preview_image TEXT,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fields (
            id_field INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            account_name TEXT
        );

        CREATE TABLE IF NOT EXISTS content_fields (
            id_content INTEGER NOT NULL REFERENCES contents(id_campaign),
            id_field INTEGER NOT NULL REFERENCES fields(id_field),
            PRIMARY KEY (id_content, id_field)
        );

        CREATE TABLE IF NOT EXISTS content_hyperlinks (
            id_link INTEGER PRIMARY KEY AUTOINCREMENT,
            id_content INTEGER NOT NULL REFERENCES contents(id_campaign),
            url TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (id_content, url)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS promo_codes (
            id_promo_code INTEGER PRIMARY KEY AUTOINCREMENT,
            id_campaign INTEGER NOT NULL REFERENCES campaigns(id_campaign),
            type TEXT NOT NULL,
            value REAL NOT NULL,
            include_shipping INTEGER NOT NULL DEFAULT 0,
            first_purchase INTEGER NOT NULL DEFAULT 0,
            min_price REAL,
            start_date TEXT,
            end_date TEXT,
            categories TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    for (id, name) in BASIC_FIELDS {
        sqlx::query("INSERT OR IGNORE INTO fields (id_field, name, account_name) VALUES (?, ?, NULL)")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;
    }

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_campaigns_account ON campaigns(account_name);
        CREATE INDEX IF NOT EXISTS idx_templates_account ON templates(account_name);
        CREATE INDEX IF NOT EXISTS idx_fields_account ON fields(account_name);
        CREATE INDEX IF NOT EXISTS idx_promo_codes_campaign ON promo_codes(id_campaign);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
