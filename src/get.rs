//! `cmdcat get`: print one record with its related commands resolved.

use anyhow::Result;

use command_catalog_core::CommandDetail;

use crate::catalog;
use crate::config::Config;

/// Render Unix seconds as `%Y-%m-%dT%H:%M:%SZ`.
pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Serialize a value and rewrite its `created_at`/`updated_at` fields as
/// ISO-8601 strings.
pub fn to_json_with_iso_timestamps<T: serde::Serialize>(value: &T) -> Result<serde_json::Value> {
    let mut json = serde_json::to_value(value)?;
    if let Some(map) = json.as_object_mut() {
        for key in ["created_at", "updated_at"] {
            if let Some(ts) = map.get(key).and_then(|v| v.as_i64()) {
                map.insert(key.to_string(), serde_json::Value::String(format_ts_iso(ts)));
            }
        }
    }
    Ok(json)
}

pub async fn get_command(config: &Config, id: i64) -> Result<CommandDetail> {
    let catalog = catalog::open(config).await?;
    let result = catalog.get_detail(id).await;
    catalog::close(catalog).await;
    Ok(result?)
}

pub async fn run_get(config: &Config, id: i64, json: bool) -> Result<()> {
    let detail = get_command(config, id).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&to_json_with_iso_timestamps(&detail)?)?
        );
        return Ok(());
    }

    let r = &detail.record;
    println!("--- Command ---");
    println!("id:          {}", r.id);
    println!("name:        {}", r.name);
    println!("category:    {}", r.category);
    if let Some(ref description) = r.description {
        println!("description: {}", description);
    }
    if let Some(ref version) = r.version {
        println!("version:     {}", version);
    }
    if !r.keywords.is_empty() {
        println!("keywords:    {}", r.keywords);
    }
    println!("mode:        {}", r.mode);
    println!("type:        {}", r.command_type);
    println!("device:      {}", r.device);
    println!("impact:      {}", r.impact);
    println!("executable:  {}", r.executable);
    println!("deprecated:  {}", r.deprecated);
    println!("embedding:   {}", if detail.has_embedding { "yes" } else { "missing" });
    println!("created_at:  {}", format_ts_iso(r.created_at));
    println!("updated_at:  {}", format_ts_iso(r.updated_at));
    println!();

    println!("--- Arguments ({}) ---", r.arguments.len());
    for arg in &r.arguments {
        if arg.description.is_empty() {
            println!("  {}", arg.argument);
        } else {
            println!("  {}  {}", arg.argument, arg.description);
        }
    }

    if !detail.related_commands.is_empty() || !detail.stale_related.is_empty() {
        println!();
        println!("--- Related ---");
        for related in &detail.related_commands {
            println!("  [{}] {} ({})", related.id, related.name, related.category);
        }
        for id in &detail.stale_related {
            println!("  [{}] (no longer exists)", id);
        }
    }

    Ok(())
}
