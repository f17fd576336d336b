//! `cmdcat embed rebuild | pending`: batch embedding maintenance.
//!
//! Per-record failures are reported in the summary and never abort the
//! run; a failed record keeps whatever embedding it had before.

use anyhow::{bail, Result};

use command_catalog_core::RebuildSummary;

use crate::catalog;
use crate::config::Config;

fn require_provider(config: &Config) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }
    Ok(())
}

fn print_summary(label: &str, summary: &RebuildSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{}", label);
    if summary.success_count == 0 && summary.failure_count == 0 {
        println!("  nothing to embed");
        return Ok(());
    }
    println!("  embedded: {}", summary.success_count);
    println!("  failed: {}", summary.failure_count);
    for failure in &summary.failures {
        println!("    [{}] {}", failure.id, failure.reason);
    }
    Ok(())
}

/// Embed records whose embedding is missing or stale.
pub async fn run_embed_pending(config: &Config, dry_run: bool, json: bool) -> Result<()> {
    require_provider(config)?;
    let catalog = catalog::open(config).await?;

    if dry_run {
        let pending = catalog.pending_records().await;
        catalog::close(catalog).await;
        let pending = pending?;
        if json {
            let ids: Vec<i64> = pending.iter().map(|r| r.id).collect();
            println!("{}", serde_json::json!({ "pending": ids }));
        } else {
            println!("embed pending (dry-run)");
            println!("  records needing embeddings: {}", pending.len());
        }
        return Ok(());
    }

    let result = catalog.embed_pending().await;
    catalog::close(catalog).await;
    print_summary("embed pending", &result?, json)
}

/// Regenerate one record's embedding, or every record's when `id` is `None`.
pub async fn run_embed_rebuild(config: &Config, id: Option<i64>, json: bool) -> Result<()> {
    require_provider(config)?;
    let catalog = catalog::open(config).await?;

    match id {
        Some(id) => {
            let result = catalog.rebuild_embedding(id).await;
            catalog::close(catalog).await;
            result?;
            if json {
                println!("{}", serde_json::json!({ "rebuilt": id }));
            } else {
                println!("embed rebuild");
                println!("  command {} re-embedded", id);
            }
            Ok(())
        }
        None => {
            let result = catalog.rebuild_all().await;
            catalog::close(catalog).await;
            print_summary("embed rebuild", &result?, json)
        }
    }
}
