//! # Command Catalog
//!
//! A local-first hybrid retrieval engine for operator command catalogs.
//!
//! Operators ask in natural language ("how do I check cluster state?") and
//! get back ranked catalog entries. Retrieval combines an FTS5 prefix
//! filter with cosine ranking over stored embeddings; the storage-agnostic
//! logic lives in [`command_catalog_core`], this crate adds SQLite,
//! embedding providers, and the `cmdcat` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────────┐   ┌─────────────────┐
//! │   CLI    │──▶│  Catalog (core)    │──▶│ SQLite          │
//! │ (cmdcat) │   │ filter+rank+consist│   │ FTS5 + vectors  │
//! └──────────┘   └─────────┬──────────┘   └─────────────────┘
//!                          ▼
//!                ┌────────────────────┐
//!                │ Embedding provider │
//!                │ OpenAI/Ollama/local│
//!                └────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cmdcat init
//! cmdcat import ./catalog.json
//! cmdcat search "show cluster member state"
//! cmdcat validate --strict
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite implementation of the store traits |
//! | [`embedding`] | Embedding providers |
//! | [`catalog`] | Build a catalog from configuration |
//! | [`search`], [`get`], [`records`], [`import`] | Record commands |
//! | [`embed_cmd`], [`integrity`] | Maintenance commands |
//! | [`logging`] | Tracing setup |

pub mod catalog;
pub mod config;
pub mod db;
pub mod embed_cmd;
pub mod embedding;
pub mod get;
pub mod import;
pub mod integrity;
pub mod logging;
pub mod migrate;
pub mod records;
pub mod search;
pub mod sqlite_store;
