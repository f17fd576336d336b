//! `cmdcat search`: hybrid retrieval from the command line.
//!
//! Limit and threshold fall back to `[retrieval]` config defaults. Output
//! is either a numbered listing or, with `--json`, the raw hit array.

use anyhow::Result;

use command_catalog_core::models::SearchHit;
use command_catalog_core::{SearchFilters, SearchRequest};

use crate::catalog;
use crate::config::Config;

pub struct SearchArgs<'a> {
    pub query: &'a str,
    pub limit: Option<usize>,
    pub threshold: Option<f64>,
    pub filters: SearchFilters,
}

/// Run a search against the configured catalog and return the hits.
pub async fn search_commands(config: &Config, args: SearchArgs<'_>) -> Result<Vec<SearchHit>> {
    let catalog = catalog::open(config).await?;

    let request = SearchRequest {
        query: args.query,
        limit: args.limit.unwrap_or(config.retrieval.default_limit),
        threshold: args
            .threshold
            .unwrap_or(config.retrieval.default_threshold),
        filters: args.filters,
    };
    let result = catalog.search(&request).await;

    catalog::close(catalog).await;
    Ok(result?)
}

pub async fn run_search(config: &Config, args: SearchArgs<'_>, json: bool) -> Result<()> {
    let hits = search_commands(config, args).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{:.3}] {} ({})", i + 1, hit.score, hit.name, hit.category);
        if let Some(ref description) = hit.description {
            println!("    {}", description.replace('\n', " ").trim());
        }
        if !hit.arguments.is_empty() {
            let args: Vec<&str> = hit.arguments.iter().map(|a| a.argument.as_str()).collect();
            println!("    args: {}", args.join(" | "));
        }
        println!(
            "    mode: {}  type: {}  device: {}  impact: {}",
            hit.mode, hit.command_type, hit.device, hit.impact
        );
        println!("    id: {}", hit.id);
        println!();
    }

    Ok(())
}
