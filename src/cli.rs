//! Command-line interface and the delete workflow

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::batch_delete::{BatchDeleter, BatchOutcome};
use crate::client::GmailClient;
use crate::console::{read_query, Console};
use crate::error::Result;
use crate::interactive::{InteractiveDeleter, InteractiveSummary};
use crate::ranker::rank_by_size;
use crate::search::{enrich_all, search_messages};

#[derive(Parser, Debug)]
#[command(name = "gmail-bulk-delete")]
#[command(version)]
#[command(about = "Permanently delete Gmail messages matching a search query", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 credentials file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to token cache file
    #[arg(long, default_value = ".gmail-bulk-delete/token.json")]
    pub token_cache: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with Gmail API
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// List the labels of the account
    Labels,

    /// Search for messages and permanently delete them
    Delete {
        /// Gmail search query (prompted for when omitted)
        #[arg(short, long)]
        query: Option<String>,

        /// Review matches one at a time instead of one batch confirmation
        #[arg(short, long, conflicts_with = "dry_run")]
        interactive: bool,

        /// Preview matches without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options for one run of the delete workflow
#[derive(Debug, Clone)]
pub struct DeleteOptions {
    pub query: Option<String>,
    pub interactive: bool,
    pub dry_run: bool,
    pub page_size: u32,
}

/// How the delete workflow ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoLabels,
    Batch(BatchOutcome),
    Interactive(InteractiveSummary),
}

/// Print the account's labels. Returns false when the account has none.
pub async fn print_labels<C, K>(client: &C, console: &mut K) -> Result<bool>
where
    C: GmailClient + ?Sized,
    K: Console + ?Sized,
{
    let labels = client.list_labels().await?;
    if labels.is_empty() {
        console.say("No labels found.")?;
        return Ok(false);
    }

    console.say("Labels:")?;
    for label in &labels {
        console.say(&format!("- {}", label.name))?;
    }
    Ok(true)
}

/// Labels, query, search, rank, then batch or interactive deletion
pub async fn run_delete<C, K>(
    client: &C,
    console: &mut K,
    options: &DeleteOptions,
) -> Result<RunOutcome>
where
    C: GmailClient + ?Sized,
    K: Console + ?Sized,
{
    if !print_labels(client, console).await? {
        return Ok(RunOutcome::NoLabels);
    }

    let query = match options.query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => read_query(console)?,
    };
    console.say(&format!("You entered the query: '{}'", query))?;
    info!("Searching with query: {}", query);

    let emails = search_messages(client, &query, options.page_size).await?;

    if options.interactive {
        if emails.is_empty() {
            console.say("No messages match the query.")?;
            return Ok(RunOutcome::Interactive(InteractiveSummary::default()));
        }

        info!("Fetching details for {} messages before review", emails.len());
        let ranked = rank_by_size(enrich_all(client, emails).await?);
        let summary = InteractiveDeleter::new(client, console).run(ranked).await?;
        console.say(&format!("Done. {}", summary))?;
        return Ok(RunOutcome::Interactive(summary));
    }

    let ranked = rank_by_size(emails);
    let outcome = BatchDeleter::new(client, console)
        .dry_run(options.dry_run)
        .run(ranked)
        .await?;
    Ok(RunOutcome::Batch(outcome))
}
