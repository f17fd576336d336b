//! # Command Catalog CLI (`cmdcat`)
//!
//! ## Usage
//!
//! ```bash
//! cmdcat --config ./config/cmdcat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cmdcat init` | Create the SQLite database and run schema migrations |
//! | `cmdcat add <name> <category>` | Add a command record and embed it |
//! | `cmdcat update <id>` | Change fields of a record |
//! | `cmdcat delete <id>` | Delete a record and its embedding |
//! | `cmdcat get <id>` | Print a record with related commands |
//! | `cmdcat search "<query>"` | Ranked natural-language search |
//! | `cmdcat import <file.json>` | Bulk-add records from JSON |
//! | `cmdcat embed pending` | Embed records with missing or stale vectors |
//! | `cmdcat embed rebuild` | Re-embed every record (or one with `--id`) |
//! | `cmdcat duplicates` | List (name, category) collisions |
//! | `cmdcat validate` | Report missing, orphaned, stale embeddings |

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use command_catalog::{
    config, embed_cmd, get, import, integrity, logging, migrate, records, search,
};
use command_catalog_core::models::{
    CommandArgument, CommandType, CommandUpdate, ExecutionMode, Impact, NewCommand, TargetDevice,
};
use command_catalog_core::SearchFilters;

/// Command Catalog: natural-language search over an operator command catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "cmdcat",
    about = "Command Catalog: hybrid keyword + embedding search over operator commands",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cmdcat.toml")]
    config: PathBuf,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Add a command record.
    ///
    /// The embedding is computed immediately. If the provider is
    /// unavailable the record is still stored and the command fails with
    /// an error naming its id.
    Add {
        name: String,
        category: String,
        #[command(flatten)]
        fields: RecordFields,
    },

    /// Update fields of an existing record.
    ///
    /// Only the flags given are changed. Pass an empty string to
    /// `--description` or `--version` to clear it.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[command(flatten)]
        fields: RecordFields,
        /// Remove all arguments.
        #[arg(long, conflicts_with = "args")]
        clear_args: bool,
        /// Remove all related ids.
        #[arg(long, conflicts_with = "related")]
        clear_related: bool,
        #[arg(long)]
        executable: Option<bool>,
        #[arg(long)]
        deprecated: Option<bool>,
    },

    /// Delete a record and its embedding.
    Delete { id: i64 },

    /// Print a record, its arguments and related commands.
    Get { id: i64 },

    /// Search the catalog with a natural-language query.
    Search {
        query: String,

        /// Maximum number of results (default: `[retrieval] default_limit`).
        #[arg(long)]
        limit: Option<usize>,

        /// Minimum cosine score in [0, 1] (default: `[retrieval] default_threshold`).
        #[arg(long)]
        threshold: Option<f64>,

        /// Only commands in this category.
        #[arg(long)]
        category: Option<String>,

        /// Only commands for this device (`any` records always match).
        #[arg(long)]
        device: Option<TargetDevice>,

        /// Only commands runnable in this mode (`both` records always match).
        #[arg(long)]
        mode: Option<ExecutionMode>,

        /// Include deprecated commands.
        #[arg(long)]
        include_deprecated: bool,
    },

    /// Bulk-add records from a JSON file.
    ///
    /// Duplicates are skipped and reported; the batch never stops early.
    Import { path: PathBuf },

    /// Manage embedding vectors.
    Embed {
        #[command(subcommand)]
        action: EmbedAction,
    },

    /// List groups of records sharing the same name and category.
    Duplicates,

    /// Check records against embeddings.
    Validate {
        /// Exit non-zero if any problem is found.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum EmbedAction {
    /// Embed records whose embedding is missing or stale.
    Pending {
        /// Show counts without embedding anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Regenerate embeddings from current record text.
    Rebuild {
        /// Only this record.
        #[arg(long)]
        id: Option<i64>,
    },
}

/// Optional record fields shared by `add` and `update`.
#[derive(Args)]
struct RecordFields {
    #[arg(long)]
    description: Option<String>,

    /// Argument as `ARG` or `ARG=DESCRIPTION`; repeat in order.
    #[arg(long = "arg", id = "args", value_parser = parse_argument)]
    args: Vec<CommandArgument>,

    /// Comma-separated keyword tags.
    #[arg(long)]
    keywords: Option<String>,

    #[arg(long = "cmd-version")]
    version: Option<String>,

    #[arg(long)]
    mode: Option<ExecutionMode>,

    #[arg(long = "type")]
    command_type: Option<CommandType>,

    #[arg(long)]
    device: Option<TargetDevice>,

    #[arg(long)]
    impact: Option<Impact>,

    /// Related command id; repeat for several.
    #[arg(long = "related", id = "related")]
    related: Vec<i64>,
}

/// Parse `ARG` or `ARG=DESCRIPTION`.
fn parse_argument(s: &str) -> Result<CommandArgument, String> {
    let (argument, description) = match s.find('=') {
        Some(pos) => (&s[..pos], &s[pos + 1..]),
        None => (s, ""),
    };
    if argument.trim().is_empty() {
        return Err(format!("invalid argument '{}': empty ARG", s));
    }
    Ok(CommandArgument {
        argument: argument.trim().to_string(),
        description: description.trim().to_string(),
    })
}

fn new_command(name: String, category: String, fields: RecordFields) -> NewCommand {
    let mut cmd = NewCommand::new(name, category);
    cmd.description = fields.description;
    cmd.arguments = fields.args;
    cmd.keywords = fields.keywords.unwrap_or_default();
    cmd.version = fields.version;
    cmd.mode = fields.mode.unwrap_or_default();
    cmd.command_type = fields.command_type.unwrap_or_default();
    cmd.device = fields.device.unwrap_or_default();
    cmd.impact = fields.impact.unwrap_or_default();
    cmd.related = fields.related;
    cmd
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging.filter);
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Add {
            name,
            category,
            fields,
        } => {
            records::run_add(&cfg, new_command(name, category, fields), json).await?;
        }
        Commands::Update {
            id,
            name,
            category,
            fields,
            clear_args,
            clear_related,
            executable,
            deprecated,
        } => {
            let update = CommandUpdate {
                name,
                category,
                description: fields.description,
                arguments: if clear_args {
                    Some(Vec::new())
                } else if fields.args.is_empty() {
                    None
                } else {
                    Some(fields.args)
                },
                version: fields.version,
                keywords: fields.keywords,
                mode: fields.mode,
                command_type: fields.command_type,
                device: fields.device,
                executable,
                impact: fields.impact,
                related: if clear_related {
                    Some(Vec::new())
                } else if fields.related.is_empty() {
                    None
                } else {
                    Some(fields.related)
                },
                deprecated,
            };
            records::run_update(&cfg, id, update, json).await?;
        }
        Commands::Delete { id } => {
            records::run_delete(&cfg, id, json).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, id, json).await?;
        }
        Commands::Search {
            query,
            limit,
            threshold,
            category,
            device,
            mode,
            include_deprecated,
        } => {
            let args = search::SearchArgs {
                query: &query,
                limit,
                threshold,
                filters: SearchFilters {
                    category,
                    device,
                    mode,
                    include_deprecated,
                },
            };
            search::run_search(&cfg, args, json).await?;
        }
        Commands::Import { path } => {
            import::run_import(&cfg, &path, json).await?;
        }
        Commands::Embed { action } => match action {
            EmbedAction::Pending { dry_run } => {
                embed_cmd::run_embed_pending(&cfg, dry_run, json).await?;
            }
            EmbedAction::Rebuild { id } => {
                embed_cmd::run_embed_rebuild(&cfg, id, json).await?;
            }
        },
        Commands::Duplicates => {
            integrity::run_duplicates(&cfg, json).await?;
        }
        Commands::Validate { strict } => {
            integrity::run_validate(&cfg, strict, json).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_argument() {
        let a = parse_argument("state=show member state").unwrap();
        assert_eq!(a.argument, "state");
        assert_eq!(a.description, "show member state");

        let b = parse_argument("-a if").unwrap();
        assert_eq!(b.argument, "-a if");
        assert_eq!(b.description, "");

        assert!(parse_argument("=nothing").is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
