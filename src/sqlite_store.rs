//! SQLite-backed [`CatalogStore`] and [`EmbeddingStore`].
//!
//! Every record write (the `commands` row plus its argument and related
//! child rows) runs in one transaction. The FTS5 index is maintained by
//! the triggers created in [`migrate`](crate::migrate); nothing here
//! writes to `commands_fts` directly.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use command_catalog_core::embedding::{blob_to_vec, vec_to_blob, Embedding};
use command_catalog_core::models::{CommandArgument, CommandRecord, NewCommand, SearchFilters};
use command_catalog_core::store::{CatalogStore, EmbeddingStore};
use command_catalog_core::CatalogError;

/// Upper bound on bound parameters per `IN (...)` list.
const IN_BATCH: usize = 500;

const RECORD_COLUMNS: &str = "id, name, description, category, version, keywords, mode, \
     command_type, device, executable, impact, deprecated, created_at, updated_at";

/// SQLite implementation of both store traits.
///
/// Wraps a [`SqlitePool`]; cloning the pool is cheap, so callers usually
/// build one store per process and share it behind an `Arc`.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Attach argument and related-id child rows to `rows`.
    async fn hydrate(&self, rows: Vec<SqliteRow>) -> Result<Vec<CommandRecord>> {
        let ids: Vec<i64> = rows
            .iter()
            .map(|r| r.try_get::<i64, _>("id"))
            .collect::<std::result::Result<_, _>>()?;

        let mut arguments: HashMap<i64, Vec<CommandArgument>> = HashMap::new();
        let mut related: HashMap<i64, Vec<i64>> = HashMap::new();

        for batch in ids.chunks(IN_BATCH) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT command_id, argument, description FROM command_arguments WHERE command_id IN (",
            );
            push_ids(&mut qb, batch);
            qb.push(") ORDER BY command_id, position");
            for row in qb.build().fetch_all(&self.pool).await? {
                arguments
                    .entry(row.try_get("command_id")?)
                    .or_default()
                    .push(CommandArgument {
                        argument: row.try_get("argument")?,
                        description: row.try_get("description")?,
                    });
            }

            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT command_id, related_id FROM command_related WHERE command_id IN (",
            );
            push_ids(&mut qb, batch);
            qb.push(") ORDER BY command_id, position");
            for row in qb.build().fetch_all(&self.pool).await? {
                related
                    .entry(row.try_get("command_id")?)
                    .or_default()
                    .push(row.try_get("related_id")?);
            }
        }

        rows.iter()
            .map(|row| {
                let mut record = record_from_row(row)?;
                record.arguments = arguments.remove(&record.id).unwrap_or_default();
                record.related = related.remove(&record.id).unwrap_or_default();
                Ok(record)
            })
            .collect()
    }
}

fn push_ids(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Parse a stored enum column; an unknown value means the row was written
/// by something other than this crate.
fn parse_column<T>(row: &SqliteRow, column: &str, id: i64) -> Result<T>
where
    T: FromStr<Err = CatalogError>,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(|e| {
        CatalogError::IntegrityViolation(format!("command {} column {}: {}", id, column, e)).into()
    })
}

/// Build a record from a `commands` row. Child collections are left empty.
fn record_from_row(row: &SqliteRow) -> Result<CommandRecord> {
    let id: i64 = row.try_get("id")?;
    Ok(CommandRecord {
        id,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        arguments: Vec::new(),
        category: row.try_get("category")?,
        version: row.try_get("version")?,
        keywords: row.try_get("keywords")?,
        mode: parse_column(row, "mode", id)?,
        command_type: parse_column(row, "command_type", id)?,
        device: parse_column(row, "device", id)?,
        executable: row.try_get("executable")?,
        impact: parse_column(row, "impact", id)?,
        related: Vec::new(),
        deprecated: row.try_get("deprecated")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn replace_children(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    id: i64,
    arguments: &[CommandArgument],
    related: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM command_arguments WHERE command_id = ?")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM command_related WHERE command_id = ?")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    for (position, arg) in arguments.iter().enumerate() {
        sqlx::query(
            "INSERT INTO command_arguments (command_id, position, argument, description) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(position as i64)
        .bind(&arg.argument)
        .bind(&arg.description)
        .execute(&mut **tx)
        .await?;
    }

    for (position, related_id) in related.iter().enumerate() {
        sqlx::query(
            "INSERT INTO command_related (command_id, position, related_id) VALUES (?, ?, ?)",
        )
        .bind(id)
        .bind(position as i64)
        .bind(*related_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// FTS5 query: each token as a quoted prefix term, OR-joined.
fn fts_match_expr(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| format!("\"{}\"*", t.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn insert_command(&self, cmd: &NewCommand) -> Result<CommandRecord> {
        let ts = now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO commands (name, description, category, version, keywords, mode,
                                  command_type, device, executable, impact, deprecated,
                                  created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&cmd.name)
        .bind(&cmd.description)
        .bind(&cmd.category)
        .bind(&cmd.version)
        .bind(&cmd.keywords)
        .bind(cmd.mode.as_str())
        .bind(cmd.command_type.as_str())
        .bind(cmd.device.as_str())
        .bind(cmd.executable)
        .bind(cmd.impact.as_str())
        .bind(cmd.deprecated)
        .bind(ts)
        .bind(ts)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        replace_children(&mut tx, id, &cmd.arguments, &cmd.related).await?;
        tx.commit().await?;

        Ok(CommandRecord {
            id,
            name: cmd.name.clone(),
            description: cmd.description.clone(),
            arguments: cmd.arguments.clone(),
            category: cmd.category.clone(),
            version: cmd.version.clone(),
            keywords: cmd.keywords.clone(),
            mode: cmd.mode,
            command_type: cmd.command_type,
            device: cmd.device,
            executable: cmd.executable,
            impact: cmd.impact,
            related: cmd.related.clone(),
            deprecated: cmd.deprecated,
            created_at: ts,
            updated_at: ts,
        })
    }

    async fn get_command(&self, id: i64) -> Result<Option<CommandRecord>> {
        let row = sqlx::query(&format!("SELECT {} FROM commands WHERE id = ?", RECORD_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn get_commands(&self, ids: &[i64]) -> Result<Vec<CommandRecord>> {
        let mut rows = Vec::with_capacity(ids.len());
        for batch in ids.chunks(IN_BATCH) {
            let mut qb: QueryBuilder<Sqlite> =
                QueryBuilder::new(format!("SELECT {} FROM commands WHERE id IN (", RECORD_COLUMNS));
            push_ids(&mut qb, batch);
            qb.push(")");
            rows.extend(qb.build().fetch_all(&self.pool).await?);
        }

        let mut records = self.hydrate(rows).await?;
        records.sort_by_key(|r| r.id);
        records.dedup_by_key(|r| r.id);
        Ok(records)
    }

    async fn update_command(&self, record: &CommandRecord) -> Result<Option<CommandRecord>> {
        let mut tx = self.pool.begin().await?;

        let affected = sqlx::query(
            r#"
            UPDATE commands SET
                name = ?, description = ?, category = ?, version = ?, keywords = ?,
                mode = ?, command_type = ?, device = ?, executable = ?, impact = ?,
                deprecated = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.category)
        .bind(&record.version)
        .bind(&record.keywords)
        .bind(record.mode.as_str())
        .bind(record.command_type.as_str())
        .bind(record.device.as_str())
        .bind(record.executable)
        .bind(record.impact.as_str())
        .bind(record.deprecated)
        .bind(now())
        .bind(record.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if affected == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        replace_children(&mut tx, record.id, &record.arguments, &record.related).await?;
        tx.commit().await?;

        self.get_command(record.id).await
    }

    async fn delete_command(&self, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM commands WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn find_by_name_category(&self, name: &str, category: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar(
            "SELECT id FROM commands WHERE name = ? AND category = ? ORDER BY id LIMIT 1",
        )
        .bind(name)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn list_commands(&self) -> Result<Vec<CommandRecord>> {
        let rows = sqlx::query(&format!("SELECT {} FROM commands ORDER BY id", RECORD_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn active_ids(&self, filters: &SearchFilters) -> Result<Vec<i64>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT c.id FROM commands c WHERE 1 = 1");
        push_filters(&mut qb, filters);
        qb.push(" ORDER BY c.id");
        let ids = qb.build_query_scalar::<i64>().fetch_all(&self.pool).await?;
        Ok(ids)
    }

    async fn match_keywords(
        &self,
        tokens: &[String],
        filters: &SearchFilters,
        cap: usize,
    ) -> Result<Vec<i64>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT c.id
            FROM commands c
            JOIN (
                SELECT rowid AS rid, rank AS score
                FROM commands_fts
                WHERE commands_fts MATCH "#,
        );
        qb.push_bind(fts_match_expr(tokens));
        qb.push(") m ON m.rid = c.id WHERE 1 = 1");
        push_filters(&mut qb, filters);
        qb.push(" ORDER BY m.score, c.id LIMIT ");
        qb.push_bind(cap as i64);

        let ids = qb
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await
            .context("FTS5 query failed")?;
        Ok(ids)
    }
}

/// Append the search filters as `AND` clauses over the `c` alias.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filters: &SearchFilters) {
    if !filters.include_deprecated {
        qb.push(" AND c.deprecated = 0");
    }
    if let Some(category) = &filters.category {
        qb.push(" AND c.category = ");
        qb.push_bind(category.clone());
        qb.push(" COLLATE NOCASE");
    }
    if let Some(device) = filters.device {
        qb.push(" AND (c.device = ");
        qb.push_bind(device.as_str());
        qb.push(" OR c.device = 'any')");
    }
    if let Some(mode) = filters.mode {
        qb.push(" AND (c.mode = ");
        qb.push_bind(mode.as_str());
        qb.push(" OR c.mode = 'both')");
    }
}

fn embedding_from_row(row: &SqliteRow, id: i64) -> Result<Embedding> {
    let blob: Vec<u8> = row.try_get("vector")?;
    let vector = blob_to_vec(&blob).ok_or_else(|| {
        CatalogError::IntegrityViolation(format!(
            "embedding of command {} is {} bytes, not a whole number of components",
            id,
            blob.len()
        ))
    })?;
    Ok(Embedding {
        vector,
        model: row.try_get("model")?,
        content_hash: row.try_get("content_hash")?,
    })
}

#[async_trait]
impl EmbeddingStore for SqliteStore {
    async fn put(&self, id: i64, embedding: &Embedding) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO command_embeddings (command_id, model, dims, content_hash, vector, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(command_id) DO UPDATE SET
                model = excluded.model,
                dims = excluded.dims,
                content_hash = excluded.content_hash,
                vector = excluded.vector,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(&embedding.model)
        .bind(embedding.vector.len() as i64)
        .bind(&embedding.content_hash)
        .bind(vec_to_blob(&embedding.vector))
        .bind(now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<Embedding>> {
        let row = sqlx::query(
            "SELECT model, content_hash, vector FROM command_embeddings WHERE command_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| embedding_from_row(&r, id)).transpose()
    }

    async fn get_many(&self, ids: &[i64]) -> Result<HashMap<i64, Embedding>> {
        let mut found = HashMap::with_capacity(ids.len());
        for batch in ids.chunks(IN_BATCH) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT command_id, model, content_hash, vector FROM command_embeddings WHERE command_id IN (",
            );
            push_ids(&mut qb, batch);
            qb.push(")");
            for row in qb.build().fetch_all(&self.pool).await? {
                let id: i64 = row.try_get("command_id")?;
                found.insert(id, embedding_from_row(&row, id)?);
            }
        }
        Ok(found)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM command_embeddings WHERE command_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn ids(&self) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar("SELECT command_id FROM command_embeddings ORDER BY command_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn corrupt_ids(&self) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar(
            "SELECT command_id FROM command_embeddings WHERE length(vector) % 8 != 0 ORDER BY command_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::migrate;
    use command_catalog_core::models::{ExecutionMode, Impact, TargetDevice};
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use tempfile::TempDir;

    async fn store(tmp: &TempDir) -> SqliteStore {
        let options = SqliteConnectOptions::new()
            .filename(tmp.path().join("catalog.sqlite"))
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        migrate(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn active() -> SearchFilters {
        SearchFilters::default()
    }

    fn with_deprecated() -> SearchFilters {
        SearchFilters {
            include_deprecated: true,
            ..Default::default()
        }
    }

    fn sample() -> NewCommand {
        let mut cmd = NewCommand::new("cphaprob", "clusterxl")
            .with_description("show cluster member state")
            .with_keywords("ha,failover");
        cmd.arguments = vec![
            CommandArgument {
                argument: "state".into(),
                description: "member state".into(),
            },
            CommandArgument {
                argument: "-a if".into(),
                description: "interfaces".into(),
            },
        ];
        cmd.mode = ExecutionMode::Both;
        cmd.device = TargetDevice::Gateway;
        cmd.impact = Impact::None;
        cmd.related = vec![5, 3];
        cmd
    }

    #[test]
    fn test_fts_match_expr() {
        assert_eq!(
            fts_match_expr(&["cluster".into(), "say\"hi".into()]),
            "\"cluster\"* OR \"say\"\"hi\"*"
        );
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip_children() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let inserted = store.insert_command(&sample()).await.unwrap();
        let fetched = store.get_command(inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched, inserted);
        assert_eq!(fetched.arguments[1].argument, "-a if");
        assert_eq!(fetched.related, vec![5, 3]);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let a = store.insert_command(&sample()).await.unwrap();
        assert!(store.delete_command(a.id).await.unwrap());
        assert!(!store.delete_command(a.id).await.unwrap());
        let b = store.insert_command(&sample()).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_fts_follows_updates_and_deletes() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let rec = store.insert_command(&sample()).await.unwrap();

        let hits = store.match_keywords(&["clus".into()], &active(), 10).await.unwrap();
        assert_eq!(hits, vec![rec.id]);
        let hits = store.match_keywords(&["failover".into()], &active(), 10).await.unwrap();
        assert_eq!(hits, vec![rec.id]);

        let mut changed = rec.clone();
        changed.description = Some("print interface status".into());
        changed.keywords = String::new();
        changed.category = "ha".into();
        store.update_command(&changed).await.unwrap().unwrap();
        assert!(store
            .match_keywords(&["failover".into()], &active(), 10)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store.match_keywords(&["interface".into()], &active(), 10).await.unwrap(),
            vec![rec.id]
        );

        store.delete_command(rec.id).await.unwrap();
        assert!(store
            .match_keywords(&["interface".into()], &active(), 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_match_keywords_skips_deprecated_unless_asked() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let mut old = sample();
        old.deprecated = true;
        let rec = store.insert_command(&old).await.unwrap();
        assert!(store.match_keywords(&["cluster".into()], &active(), 10).await.unwrap().is_empty());
        assert_eq!(
            store.match_keywords(&["cluster".into()], &with_deprecated(), 10).await.unwrap(),
            vec![rec.id]
        );
        assert!(store.active_ids(&active()).await.unwrap().is_empty());
        assert_eq!(store.active_ids(&with_deprecated()).await.unwrap(), vec![rec.id]);
    }

    #[tokio::test]
    async fn test_filters_apply_before_limit() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let cluster = store.insert_command(&sample()).await.unwrap();
        let mut vpn = NewCommand::new("vpn tu", "VPN").with_description("cluster tunnel state");
        vpn.device = TargetDevice::Any;
        vpn.mode = ExecutionMode::Expert;
        let vpn = store.insert_command(&vpn).await.unwrap();

        let by_category = SearchFilters {
            category: Some("vpn".into()),
            ..Default::default()
        };
        assert_eq!(
            store.match_keywords(&["cluster".into()], &active(), 1).await.unwrap().len(),
            1
        );
        assert_eq!(
            store.match_keywords(&["cluster".into()], &by_category, 1).await.unwrap(),
            vec![vpn.id]
        );
        assert_eq!(store.active_ids(&by_category).await.unwrap(), vec![vpn.id]);

        let management = SearchFilters {
            device: Some(TargetDevice::Management),
            ..Default::default()
        };
        assert_eq!(store.active_ids(&management).await.unwrap(), vec![vpn.id]);

        let clish = SearchFilters {
            mode: Some(ExecutionMode::Clish),
            ..Default::default()
        };
        assert_eq!(
            store.match_keywords(&["state".into()], &clish, 10).await.unwrap(),
            vec![cluster.id]
        );
    }

    #[tokio::test]
    async fn test_joined_token_matches_split_words() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let rec = store
            .insert_command(&NewCommand::new("fw ctl pstat", "firewall"))
            .await
            .unwrap();
        assert_eq!(
            store.match_keywords(&["fw_ctl".into()], &active(), 10).await.unwrap(),
            vec![rec.id]
        );
        assert!(store
            .match_keywords(&["ctl_fw".into()], &active(), 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_children_and_missing_id() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let mut rec = store.insert_command(&sample()).await.unwrap();
        rec.arguments.truncate(1);
        rec.related = vec![9];
        let updated = store.update_command(&rec).await.unwrap().unwrap();
        assert_eq!(updated.arguments.len(), 1);
        assert_eq!(updated.related, vec![9]);

        rec.id = 404;
        assert!(store.update_command(&rec).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_embedding_put_get_and_cascade() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let rec = store.insert_command(&sample()).await.unwrap();
        let e = Embedding::new(vec![0.25, -1.0, f64::MIN_POSITIVE], "m", "text");
        store.put(rec.id, &e).await.unwrap();
        assert_eq!(store.get(rec.id).await.unwrap(), Some(e.clone()));

        let e2 = Embedding::new(vec![1.0, 2.0, 3.0], "m", "other");
        store.put(rec.id, &e2).await.unwrap();
        assert_eq!(store.get_many(&[rec.id, 99]).await.unwrap().len(), 1);
        assert_eq!(store.ids().await.unwrap(), vec![rec.id]);

        // The foreign key removes the vector if a record is deleted directly.
        store.delete_command(rec.id).await.unwrap();
        assert!(store.ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_integrity_violation() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let rec = store.insert_command(&sample()).await.unwrap();
        sqlx::query(
            "INSERT INTO command_embeddings (command_id, model, dims, content_hash, vector, updated_at) VALUES (?, 'm', 1, 'h', ?, 0)",
        )
        .bind(rec.id)
        .bind(vec![1u8, 2, 3])
        .execute(store.pool())
        .await
        .unwrap();

        let err = CatalogError::from(store.get(rec.id).await.unwrap_err());
        assert!(matches!(err, CatalogError::IntegrityViolation(_)));
        assert_eq!(store.corrupt_ids().await.unwrap(), vec![rec.id]);

        let e = Embedding::new(vec![1.0], "m", "text");
        store.put(rec.id, &e).await.unwrap();
        assert!(store.corrupt_ids().await.unwrap().is_empty());
        assert_eq!(store.get(rec.id).await.unwrap(), Some(e));
    }

    #[tokio::test]
    async fn test_find_by_name_category_returns_lowest_id() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;
        let first = store.insert_command(&sample()).await.unwrap();
        store.insert_command(&sample()).await.unwrap();
        assert_eq!(
            store.find_by_name_category("cphaprob", "clusterxl").await.unwrap(),
            Some(first.id)
        );
        assert_eq!(store.find_by_name_category("cphaprob", "vpn").await.unwrap(), None);
    }
}
