//! `cmdcat duplicates | validate`: read-only consistency reports.

use anyhow::Result;

use command_catalog_core::{DuplicateGroup, IntegrityReport};

use crate::catalog;
use crate::config::Config;

pub async fn find_duplicates(config: &Config) -> Result<Vec<DuplicateGroup>> {
    let catalog = catalog::open(config).await?;
    let result = catalog.find_duplicates().await;
    catalog::close(catalog).await;
    Ok(result?)
}

pub async fn validate(config: &Config) -> Result<IntegrityReport> {
    let catalog = catalog::open(config).await?;
    let result = catalog.validate_integrity().await;
    catalog::close(catalog).await;
    Ok(result?)
}

pub async fn run_duplicates(config: &Config, json: bool) -> Result<()> {
    let groups = find_duplicates(config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No duplicates.");
        return Ok(());
    }
    for group in &groups {
        let ids: Vec<String> = group.ids.iter().map(|id| id.to_string()).collect();
        println!(
            "{} ({}): {} records, ids {}",
            group.name,
            group.category,
            group.count,
            ids.join(", ")
        );
    }
    Ok(())
}

fn id_list(ids: &[i64]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print the integrity report. With `strict`, a non-clean report is an error.
pub async fn run_validate(config: &Config, strict: bool, json: bool) -> Result<()> {
    let report = validate(config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("validate");
        println!("  missing embeddings: {}", id_list(&report.missing_embeddings));
        println!("  orphaned embeddings: {}", id_list(&report.orphaned_embeddings));
        println!("  stale embeddings: {}", id_list(&report.stale_embeddings));
        println!(
            "  dimension mismatches: {}",
            id_list(&report.dimension_mismatches)
        );
        println!("  corrupt embeddings: {}", id_list(&report.corrupt_embeddings));
        if report.invalid_records.is_empty() {
            println!("  invalid records: none");
        } else {
            println!("  invalid records:");
            for invalid in &report.invalid_records {
                println!("    [{}] {}", invalid.id, invalid.problems.join("; "));
            }
        }
        if report.is_clean() {
            println!("  status: ok");
        }
    }

    if strict {
        report.into_result()?;
    }
    Ok(())
}
