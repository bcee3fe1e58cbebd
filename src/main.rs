use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use listing_harvester::{
    AppConfig, ListingManager, PageContext,
    export::ExportFormat,
    render::HEADERS,
    store::SqliteStore,
    utils::logging::init_tracing,
    web::{AppState, create_router, spawn_change_logger},
};

#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(about = "Extracts business listings from saved map-search pages and exports them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract listings from saved result pages and merge them into the store
    Scrape {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// URL the pages were saved from; relative links resolve against it
        #[arg(long)]
        page_url: Option<String>,

        /// Search text to use instead of the page's search box
        #[arg(long)]
        search: Option<String>,
    },
    /// Print the stored listings
    List {
        #[arg(long)]
        json: bool,
    },
    /// Write the stored listings to a spreadsheet file
    Export {
        #[arg(long)]
        filename: Option<String>,

        #[arg(long, value_enum, default_value = "xls")]
        format: ExportFormat,

        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Remove every stored listing
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Start the web interface
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;

    if let Commands::Config = cli.command {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let store = SqliteStore::connect(&config.store)
        .await
        .with_context(|| format!("Failed to open store at {}", config.store.database_url))?;
    let manager = Arc::new(ListingManager::new(&config, Arc::new(store))?);

    match cli.command {
        Commands::Scrape {
            files,
            page_url,
            search,
        } => {
            let pages = futures::future::try_join_all(files.iter().map(|path| async move {
                tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))
            }))
            .await?;

            let context = PageContext { page_url, search };
            for (path, html) in files.iter().zip(pages) {
                let report = manager.scrape_page(&html, &context).await;
                println!(
                    "{}: extracted {}, skipped {} permanently closed, added {} ({} stored){}",
                    path.display(),
                    report.extracted,
                    report.skipped_closed,
                    report.added,
                    report.total,
                    if report.persisted { "" } else { " [not saved]" }
                );
            }
        }
        Commands::List { json } => {
            let listings = manager.load().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&listings)?);
            } else {
                println!("{}", HEADERS.join("\t"));
                for row in manager.rows().await {
                    let cells: Vec<&str> = row.cells.iter().map(|c| c.text.as_str()).collect();
                    println!("{}", cells.join("\t"));
                }
                println!("Total Extracted: {}", listings.len());
            }
        }
        Commands::Export {
            filename,
            format,
            out_dir,
        } => {
            // Returned rather than exiting so the log guard flushes.
            let path = manager
                .export_to_dir(filename.as_deref(), format, out_dir.as_deref())
                .await
                .map_err(|e| anyhow::anyhow!("Export failed: {}", e))?;
            println!("Exported to {}", path.display());
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("Refusing to clear stored listings without --yes");
            }
            manager.clear().await?;
            println!("Cleared all stored listings");
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let logger = spawn_change_logger(manager.subscribe());
            let app = create_router(AppState { manager });

            let listener = tokio::net::TcpListener::bind((host.as_str(), port))
                .await
                .with_context(|| format!("Failed to bind {}:{}", host, port))?;
            info!("Listening on http://{}:{}", host, port);

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.ok();
                    info!("Shutting down...");
                })
                .await?;
            logger.abort();
        }
        Commands::Config => {}
    }

    Ok(())
}
