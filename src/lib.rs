//! Gmail Bulk Delete
//!
//! Permanently deletes the Gmail messages matching a search query.
//!
//! # Overview
//!
//! A run lists the account's labels, collects a query, pages through every
//! matching message id, ranks the matches by size and then either:
//! - previews the ten largest, asks for one `yes`, and deletes everything in
//!   batches of 100 ([`batch_delete`]), or
//! - walks the matches one at a time asking delete/skip/quit ([`interactive`]).
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_bulk_delete::{auth, cli, client::ProductionGmailClient, config::Config};
//! use gmail_bulk_delete::console::LineConsole;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let secret = auth::load_application_secret("credentials.json".as_ref()).await?;
//!     let cache = auth::TokenCache::new(".gmail-bulk-delete/token.json");
//!     let hub = auth::initialize_gmail_hub(secret, &cache).await?;
//!     let client = ProductionGmailClient::new(hub, &config.client);
//!
//!     let options = cli::DeleteOptions {
//!         query: Some("older_than:5y larger:5M".to_string()),
//!         interactive: false,
//!         dry_run: true,
//!         page_size: config.search.page_size,
//!     };
//!     cli::run_delete(&client, &mut LineConsole::stdio(), &options).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and the token cache
//! - [`batch_delete`] - Preview, confirmation and chunked deletion
//! - [`cli`] - Command-line interface and workflow orchestration
//! - [`client`] - Gmail API client with retry logic
//! - [`config`] - Configuration management
//! - [`console`] - Operator prompts and query collection
//! - [`error`] - Error types and result aliases
//! - [`interactive`] - Per-message delete/skip/quit review
//! - [`models`] - Core data structures
//! - [`ranker`] - Result ordering
//! - [`search`] - Paginated search

pub mod auth;
pub mod batch_delete;
pub mod cli;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod interactive;
pub mod models;
pub mod ranker;
pub mod search;

pub use error::{GmailError, Result};

pub use models::{Email, LabelInfo, MessageDetail, MessagePage};

pub use client::{GmailClient, ProductionGmailClient, BATCH_DELETE_LIMIT};

pub use config::{ClientConfig, Config, SearchConfig};

pub use batch_delete::{BatchDeleter, BatchOutcome, PREVIEW_LIMIT};
pub use interactive::{Choice, InteractiveDeleter, InteractiveSummary};

pub use cli::{Cli, Commands, DeleteOptions, RunOutcome};
