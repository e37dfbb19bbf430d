use anyhow::Result;
use clap::Parser;
use gmail_bulk_delete::auth::{self, TokenCache};
use gmail_bulk_delete::batch_delete::BatchOutcome;
use gmail_bulk_delete::cli::{self, Cli, Commands, DeleteOptions, RunOutcome};
use gmail_bulk_delete::client::ProductionGmailClient;
use gmail_bulk_delete::config::Config;
use gmail_bulk_delete::console::LineConsole;
use gmail_bulk_delete::error::GmailError;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        display_hint(&e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Install default crypto provider for rustls
    // On non-Windows platforms, use aws-lc-rs; on Windows, use ring
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_bulk_delete=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_bulk_delete=info,warn"))
    };

    // Logs go to stderr so stdout carries only operator-facing lines
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let cache = TokenCache::new(&cli.token_cache);

    match cli.command {
        Commands::Auth { force } => {
            tracing::info!("Authenticating with Gmail API...");
            let config = auth::prepare_reauth(&cli.config, &cache, force).await?;
            let client = connect(&config, &cli.credentials, &cache).await?;

            println!("Successfully authenticated with Gmail API");
            println!("Token cached at: {:?}", cache.path());
            println!("Connected to account: {}", client.account_email().await?);
            Ok(())
        }

        Commands::Labels => {
            let config = Config::load(&cli.config).await?;
            let client = connect(&config, &cli.credentials, &cache).await?;

            let mut console = LineConsole::stdio();
            cli::print_labels(&client, &mut console).await?;
            Ok(())
        }

        Commands::Delete {
            query,
            interactive,
            dry_run,
        } => {
            let config = Config::load(&cli.config).await?;
            let client = connect(&config, &cli.credentials, &cache).await?;

            if dry_run {
                println!("Running in DRY RUN mode - no messages will be deleted");
            }

            let options = DeleteOptions {
                query,
                interactive,
                dry_run,
                page_size: config.search.page_size,
            };
            let mut console = LineConsole::stdio();
            let outcome = cli::run_delete(&client, &mut console, &options).await?;

            match outcome {
                RunOutcome::Batch(BatchOutcome::Deleted { count }) => {
                    tracing::info!("Permanently deleted {} messages", count);
                }
                RunOutcome::Interactive(summary) if summary.quit => {
                    tracing::info!("Interactive review stopped by operator");
                }
                other => tracing::debug!("Delete run finished: {:?}", other),
            }
            Ok(())
        }

        Commands::InitConfig { output, force } => {
            tracing::info!("Generating example configuration file");

            if output.exists() && !force {
                return Err(GmailError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(&output).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nKey settings to review:");
            println!("  - search.page_size: ids fetched per search request (1-500)");
            println!("  - client.max_retries: retries for transient read failures");
            println!("  - client.request_timeout_secs: per-request timeout");
            Ok(())
        }
    }
}

/// Authenticate and build the production client
async fn connect(
    config: &Config,
    credentials: &Path,
    cache: &TokenCache,
) -> Result<ProductionGmailClient> {
    let secret = auth::load_application_secret(credentials).await?;
    let hub = auth::initialize_gmail_hub(secret, cache).await?;
    Ok(ProductionGmailClient::new(hub, &config.client))
}

/// Display helpful hints based on error type
fn display_hint(error: &anyhow::Error) {
    if let Some(hint) = error.downcast_ref::<GmailError>().and_then(GmailError::hint) {
        eprintln!("\nHint: {}", hint);
    }
}
