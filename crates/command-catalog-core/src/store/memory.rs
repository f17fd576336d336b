//! In-memory store for tests and embedded use.
//!
//! Uses `BTreeMap`s behind `std::sync::RwLock`. The text index is not
//! materialized; [`match_keywords`](CatalogStore::match_keywords) splits
//! the indexed fields of each record into words on the fly, the same way
//! an FTS5 `unicode61` tokenizer would.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::Embedding;
use crate::models::{CommandRecord, NewCommand, SearchFilters};

use super::{CatalogStore, EmbeddingStore};

#[derive(Default)]
struct Records {
    next_id: i64,
    rows: BTreeMap<i64, CommandRecord>,
}

/// In-memory implementation of both store traits.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Records>,
    vectors: RwLock<BTreeMap<i64, Embedding>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `parts` occur as consecutive words, the last one as a prefix.
fn phrase_prefix_match(words: &[String], parts: &[String]) -> bool {
    let Some((last, init)) = parts.split_last() else {
        return false;
    };
    words.windows(parts.len()).any(|window| {
        window[..init.len()] == *init && window[init.len()].starts_with(last.as_str())
    })
}

/// Whether any token matches the record's indexed fields.
fn matches_any(record: &CommandRecord, tokens: &[Vec<String>]) -> bool {
    let fields = [
        record.name.as_str(),
        record.description.as_deref().unwrap_or(""),
        record.keywords.as_str(),
        record.category.as_str(),
    ];
    fields.iter().any(|field| {
        let field_words = words(field);
        tokens
            .iter()
            .any(|parts| phrase_prefix_match(&field_words, parts))
    })
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_command(&self, cmd: &NewCommand) -> Result<CommandRecord> {
        let mut records = write(&self.records);
        records.next_id += 1;
        let id = records.next_id;
        let ts = now();
        let record = CommandRecord {
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
        };
        records.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn get_command(&self, id: i64) -> Result<Option<CommandRecord>> {
        Ok(read(&self.records).rows.get(&id).cloned())
    }

    async fn get_commands(&self, ids: &[i64]) -> Result<Vec<CommandRecord>> {
        let records = read(&self.records);
        let mut found: Vec<CommandRecord> = ids
            .iter()
            .filter_map(|id| records.rows.get(id).cloned())
            .collect();
        found.sort_by_key(|r| r.id);
        found.dedup_by_key(|r| r.id);
        Ok(found)
    }

    async fn update_command(&self, record: &CommandRecord) -> Result<Option<CommandRecord>> {
        let mut records = write(&self.records);
        let Some(existing) = records.rows.get_mut(&record.id) else {
            return Ok(None);
        };
        let created_at = existing.created_at;
        *existing = CommandRecord {
            created_at,
            updated_at: now(),
            ..record.clone()
        };
        Ok(Some(existing.clone()))
    }

    async fn delete_command(&self, id: i64) -> Result<bool> {
        Ok(write(&self.records).rows.remove(&id).is_some())
    }

    async fn find_by_name_category(&self, name: &str, category: &str) -> Result<Option<i64>> {
        Ok(read(&self.records)
            .rows
            .values()
            .find(|r| r.name == name && r.category == category)
            .map(|r| r.id))
    }

    async fn list_commands(&self) -> Result<Vec<CommandRecord>> {
        Ok(read(&self.records).rows.values().cloned().collect())
    }

    async fn active_ids(&self, filters: &SearchFilters) -> Result<Vec<i64>> {
        Ok(read(&self.records)
            .rows
            .values()
            .filter(|r| filters.matches(r))
            .map(|r| r.id)
            .collect())
    }

    async fn match_keywords(
        &self,
        tokens: &[String],
        filters: &SearchFilters,
        cap: usize,
    ) -> Result<Vec<i64>> {
        let tokens: Vec<Vec<String>> = tokens
            .iter()
            .map(|t| words(t))
            .filter(|parts| !parts.is_empty())
            .collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        Ok(read(&self.records)
            .rows
            .values()
            .filter(|r| filters.matches(r))
            .filter(|r| matches_any(r, &tokens))
            .map(|r| r.id)
            .take(cap)
            .collect())
    }
}

#[async_trait]
impl EmbeddingStore for InMemoryStore {
    async fn put(&self, id: i64, embedding: &Embedding) -> Result<()> {
        write(&self.vectors).insert(id, embedding.clone());
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<Embedding>> {
        Ok(read(&self.vectors).get(&id).cloned())
    }

    async fn get_many(&self, ids: &[i64]) -> Result<HashMap<i64, Embedding>> {
        let vectors = read(&self.vectors);
        Ok(ids
            .iter()
            .filter_map(|id| vectors.get(id).map(|e| (*id, e.clone())))
            .collect())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(write(&self.vectors).remove(&id).is_some())
    }

    async fn ids(&self) -> Result<Vec<i64>> {
        Ok(read(&self.vectors).keys().copied().collect())
    }
}
