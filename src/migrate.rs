//! Schema migrations.
//!
//! All statements are idempotent, so `cmdcat init` can be run repeatedly
//! and every other command can migrate on open.
//!
//! | Table | Contents |
//! |-------|----------|
//! | `commands` | One row per record; `AUTOINCREMENT` so ids are never reused |
//! | `command_arguments` | Ordered argument list, keyed by `(command_id, position)` |
//! | `command_related` | Related record ids, keyed by `(command_id, position)` |
//! | `command_embeddings` | One vector per record plus model, dims and content hash |
//! | `commands_fts` | FTS5 index over name, description, keywords, category |
//!
//! `commands_fts` is written only by the triggers created here, never by
//! application code.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Connect to the configured database, migrate it and close the pool.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS commands (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            category TEXT NOT NULL,
            version TEXT,
            keywords TEXT NOT NULL DEFAULT '',
            mode TEXT NOT NULL,
            command_type TEXT NOT NULL,
            device TEXT NOT NULL,
            executable INTEGER NOT NULL DEFAULT 1,
            impact TEXT NOT NULL,
            deprecated INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS command_arguments (
            command_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            argument TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (command_id, position),
            FOREIGN KEY (command_id) REFERENCES commands(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS command_related (
            command_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            related_id INTEGER NOT NULL,
            PRIMARY KEY (command_id, position),
            FOREIGN KEY (command_id) REFERENCES commands(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS command_embeddings (
            command_id INTEGER PRIMARY KEY,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            content_hash TEXT NOT NULL,
            vector BLOB NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (command_id) REFERENCES commands(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='commands_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE commands_fts USING fts5(
                name,
                description,
                keywords,
                category
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS commands_fts_insert AFTER INSERT ON commands BEGIN
            INSERT INTO commands_fts (rowid, name, description, keywords, category)
            VALUES (new.id, new.name, COALESCE(new.description, ''), new.keywords, new.category);
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS commands_fts_delete AFTER DELETE ON commands BEGIN
            DELETE FROM commands_fts WHERE rowid = old.id;
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS commands_fts_update AFTER UPDATE ON commands BEGIN
            DELETE FROM commands_fts WHERE rowid = old.id;
            INSERT INTO commands_fts (rowid, name, description, keywords, category)
            VALUES (new.id, new.name, COALESCE(new.description, ''), new.keywords, new.category);
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_commands_name_category ON commands(name, category)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_commands_deprecated ON commands(deprecated)")
        .execute(pool)
        .await?;

    tracing::debug!("schema migrated");
    Ok(())
}
