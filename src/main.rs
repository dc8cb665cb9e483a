use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod acquisition;
mod analyzer;
mod api;
mod categories;
mod config;
mod controller;
mod countries;
mod dedup;
mod domain;
mod error;
mod fetch;
mod models;
mod places;
mod router;
mod scorer;
mod store;

use crate::controller::{Pipeline, RunController, RunSettings, StartRequest};
use crate::models::Lead;
use crate::store::{JsonlStore, MemoryStore, TabularStore};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: config::ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, score and record leads for one city
    Run {
        /// Country name or ISO code
        #[arg(long)]
        country: String,

        /// City to search in
        #[arg(long)]
        city: String,

        /// Comma-separated categories (defaults to the configured list)
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Stop after the configured session limit instead of running to completion
        #[arg(long, default_value_t = false)]
        long_running: bool,

        /// Keep leads in memory instead of writing them to the data directory
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
    /// List supported countries, optionally filtered
    Countries {
        query: Option<String>,
    },
    /// Print the default category list
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            country,
            city,
            categories,
            long_running,
            dry_run,
        } => {
            let config = config::build_config(&cli.config)?;
            let store: Arc<dyn TabularStore> = if dry_run {
                info!("Dry run: leads are kept in memory");
                Arc::new(MemoryStore::new())
            } else {
                Arc::new(
                    JsonlStore::open(&config.data_dir)
                        .await
                        .with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?,
                )
            };

            let (tx, rx) = mpsc::channel(config.lead_channel_capacity);
            let controller = RunController::new(
                Pipeline::from_config(&config, store)?,
                RunSettings::from_config(&config),
            )
            .with_notifier(tx);

            let mut handle = controller
                .start(StartRequest {
                    country,
                    city,
                    categories: Some(categories),
                    long_running,
                })
                .await?;
            let printer = tokio::spawn(print_leads(rx));

            let summary = tokio::select! {
                result = &mut handle => result?,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received, stopping after the current lead");
                    controller.stop().await;
                    handle.await?
                }
            };
            drop(controller);
            printer.await?;

            println!(
                "Run {} finished ({:?}): {} leads saved from {} categories",
                summary.run_id, summary.outcome, summary.leads_saved, summary.categories_processed
            );
            if summary.notifications_dropped > 0 {
                println!("{} saved leads were not shown (output fell behind)", summary.notifications_dropped);
            }
        }
        Commands::Serve { port } => {
            let config = config::build_config(&cli.config)?;
            let store = JsonlStore::open(&config.data_dir)
                .await
                .with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?;
            let controller = RunController::new(
                Pipeline::from_config(&config, Arc::new(store))?,
                RunSettings::from_config(&config),
            );
            info!("Starting API server on port {}", port);
            api::start_api_server(controller, port).await;
        }
        Commands::Countries { query } => {
            let names = match query.as_deref() {
                Some(q) => countries::search_countries(q),
                None => countries::list_countries(),
            };
            for name in names {
                println!("{}", name);
            }
        }
        Commands::Categories => {
            let config = config::build_config(&cli.config)?;
            for category in &config.default_categories {
                println!("{}", category);
            }
        }
    }

    Ok(())
}

async fn print_leads(mut rx: mpsc::Receiver<Lead>) {
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Searching...");

    let mut saved = 0usize;
    while let Some(lead) = rx.recv().await {
        saved += 1;
        spinner.println(format!(
            "[{:>3}] {} ({}) score {} - {}",
            saved, lead.business_name, lead.category, lead.lead_score, lead.value_justification
        ));
        spinner.set_message(format!("{} leads saved", saved));
    }
    spinner.finish_with_message(format!("{} leads saved", saved));
}
