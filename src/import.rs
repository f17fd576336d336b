//! `cmdcat import`: bulk-load records from a JSON file.
//!
//! The file holds either an array of command objects or an object with a
//! `commands` array. Field names match `cmdcat get --json` output (`type`
//! for the command type); omitted fields take their defaults.
//!
//! ```json
//! [
//!   {"name": "cphaprob", "category": "clusterxl",
//!    "description": "Show cluster member state",
//!    "arguments": [{"argument": "state"}], "device": "gateway"}
//! ]
//! ```
//!
//! Each entry is added independently: duplicates and invalid entries are
//! skipped and reported, embedding failures are counted, and the batch
//! always runs to the end.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use command_catalog_core::models::NewCommand;
use command_catalog_core::store::{CatalogStore, EmbeddingStore};
use command_catalog_core::{Catalog, CatalogError};

use crate::catalog;
use crate::config::Config;

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    List(Vec<NewCommand>),
    Wrapped { commands: Vec<NewCommand> },
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    /// Ids of records created, including those whose embedding failed.
    pub imported: Vec<i64>,
    pub skipped_duplicates: Vec<SkippedDuplicate>,
    /// Ids of created records that still need an embedding.
    pub embedding_failures: Vec<i64>,
    pub invalid: Vec<InvalidEntry>,
}

#[derive(Debug, Serialize)]
pub struct SkippedDuplicate {
    pub index: usize,
    pub name: String,
    pub category: String,
    pub existing_id: i64,
}

#[derive(Debug, Serialize)]
pub struct InvalidEntry {
    pub index: usize,
    pub reason: String,
}

pub fn read_import_file(path: &Path) -> Result<Vec<NewCommand>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    let parsed: ImportFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse import file: {}", path.display()))?;
    Ok(match parsed {
        ImportFile::List(commands) | ImportFile::Wrapped { commands } => commands,
    })
}

/// Add every command in order. Only storage failures abort the batch.
pub async fn import_records<S: CatalogStore + EmbeddingStore>(
    catalog: &Catalog<S>,
    commands: Vec<NewCommand>,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for (index, cmd) in commands.into_iter().enumerate() {
        match catalog.add(cmd).await {
            Ok(record) => summary.imported.push(record.id),
            Err(CatalogError::Duplicate {
                existing_id,
                name,
                category,
            }) => {
                tracing::info!(index, existing_id, "skipping duplicate {}/{}", category, name);
                summary.skipped_duplicates.push(SkippedDuplicate {
                    index,
                    name,
                    category,
                    existing_id,
                });
            }
            Err(CatalogError::RetrievalUnavailable {
                record_id: Some(id),
                ..
            })
            | Err(CatalogError::DimensionMismatch { id: Some(id), .. }) => {
                summary.imported.push(id);
                summary.embedding_failures.push(id);
            }
            Err(CatalogError::Validation(reason)) => {
                summary.invalid.push(InvalidEntry { index, reason });
            }
            Err(other) => return Err(other.into()),
        }
    }

    tracing::info!(
        imported = summary.imported.len(),
        duplicates = summary.skipped_duplicates.len(),
        invalid = summary.invalid.len(),
        "import finished"
    );
    Ok(summary)
}

pub async fn run_import(config: &Config, path: &Path, json: bool) -> Result<()> {
    let commands = read_import_file(path)?;
    let total = commands.len();

    let catalog = catalog::open(config).await?;
    let result = import_records(&catalog, commands).await;
    catalog::close(catalog).await;
    let summary = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("import {}", path.display());
    println!("  entries: {}", total);
    println!("  imported: {}", summary.imported.len());
    println!("  skipped duplicates: {}", summary.skipped_duplicates.len());
    println!("  invalid: {}", summary.invalid.len());
    println!("  missing embeddings: {}", summary.embedding_failures.len());
    for dup in &summary.skipped_duplicates {
        println!(
            "    duplicate #{}: {} ({}) exists as id {}",
            dup.index, dup.name, dup.category, dup.existing_id
        );
    }
    for bad in &summary.invalid {
        println!("    invalid #{}: {}", bad.index, bad.reason);
    }
    if !summary.embedding_failures.is_empty() {
        println!("  run `cmdcat embed pending` once the embedding provider is reachable");
    }

    Ok(())
}
