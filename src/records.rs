//! `cmdcat add | update | delete`: record mutations from the command line.
//!
//! All three go through the catalog's consistency rules, so the embedding
//! and text index follow every change. When a record is written but its
//! embedding is not, the command exits non-zero with an error naming the
//! record id; `cmdcat embed pending` repairs it later.

use anyhow::{bail, Result};

use command_catalog_core::models::{CommandRecord, CommandUpdate, NewCommand};

use crate::catalog;
use crate::config::Config;
use crate::get::to_json_with_iso_timestamps;

pub async fn add_command(config: &Config, cmd: NewCommand) -> Result<CommandRecord> {
    let catalog = catalog::open(config).await?;
    let result = catalog.add(cmd).await;
    catalog::close(catalog).await;
    Ok(result?)
}

pub async fn update_command(config: &Config, id: i64, update: &CommandUpdate) -> Result<CommandRecord> {
    let catalog = catalog::open(config).await?;
    let result = catalog.update(id, update).await;
    catalog::close(catalog).await;
    Ok(result?)
}

pub async fn delete_command(config: &Config, id: i64) -> Result<()> {
    let catalog = catalog::open(config).await?;
    let result = catalog.delete(id).await;
    catalog::close(catalog).await;
    Ok(result?)
}

fn print_record(action: &str, record: &CommandRecord, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&to_json_with_iso_timestamps(record)?)?
        );
    } else {
        println!(
            "{} command {}: {} ({})",
            action, record.id, record.name, record.category
        );
    }
    Ok(())
}

pub async fn run_add(config: &Config, cmd: NewCommand, json: bool) -> Result<()> {
    let record = add_command(config, cmd).await?;
    print_record("Added", &record, json)
}

pub async fn run_update(config: &Config, id: i64, update: CommandUpdate, json: bool) -> Result<()> {
    if update.is_empty() {
        bail!("nothing to update: pass at least one field flag");
    }
    let record = update_command(config, id, &update).await?;
    print_record("Updated", &record, json)
}

pub async fn run_delete(config: &Config, id: i64, json: bool) -> Result<()> {
    delete_command(config, id).await?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted command {}", id);
    }
    Ok(())
}
