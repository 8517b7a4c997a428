//! shopcheck command-line entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use page_probe::{BrowserSession, PageDriver, PageProbe};
use selector_catalog::SelectorCatalog;
use shopcheck_cli::config::{load_config, Config};
use shopcheck_cli::flow::SearchFlow;

#[derive(Parser)]
#[command(
    name = "shopcheck",
    version,
    about = "Retail search acceptance checks with self-healing locators"
)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Shortcut for --log-level debug
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the search acceptance scenario
    Run(RunArgs),
    /// Inspect the persisted selector catalog
    Catalog(CatalogArgs),
    /// Show version and configuration summary
    Info,
}

#[derive(Args)]
struct RunArgs {
    /// Search term to exercise
    #[arg(long)]
    term: String,

    /// Run with a visible browser window
    #[arg(long)]
    headed: bool,
}

#[derive(Args)]
struct CatalogArgs {
    #[command(subcommand)]
    action: CatalogAction,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Print every key and its selector list, in priority order
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug)?;

    info!("Starting shopcheck v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref()).await?;

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args, config.clone()).await,
        Commands::Catalog(args) => cmd_catalog(args, &config),
        Commands::Info => cmd_info(&config),
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

async fn cmd_run(args: RunArgs, mut config: Config) -> Result<()> {
    if args.headed {
        config.headless = false;
    }

    let catalog = Arc::new(
        SelectorCatalog::load(&config.catalog_path)
            .context("selector catalog is required to run the scenario")?,
    );

    let session = BrowserSession::launch(&config.session_config())
        .await
        .context("browser launch failed")?;
    let page = Arc::new(session.probe());
    let flow = SearchFlow::new(catalog, page, config);

    let outcome = run_scenario(&flow, &args.term).await;

    if let Err(e) = session.close().await {
        warn!("Browser teardown failed: {}", e);
    }

    outcome
}

async fn run_scenario<P: PageProbe + PageDriver + 'static>(
    flow: &SearchFlow<P>,
    term: &str,
) -> Result<()> {
    flow.open_homepage().await?;
    flow.run_search(term).await?;

    let title = flow.verify_results(term).await?;
    info!("Matched product title: {}", title);

    let price = flow.verify_first_price().await?;
    info!("First product price: {}", price.display);

    Ok(())
}

fn cmd_catalog(args: CatalogArgs, config: &Config) -> Result<()> {
    match args.action {
        CatalogAction::Show => {
            let catalog = SelectorCatalog::load(&config.catalog_path)?;
            for (key, selectors) in catalog.snapshot() {
                println!("{key}:");
                for (index, selector) in selectors.iter().enumerate() {
                    println!("  {index}. {selector}");
                }
            }
            Ok(())
        }
    }
}

fn cmd_info(config: &Config) -> Result<()> {
    println!("shopcheck v{}", env!("CARGO_PKG_VERSION"));
    println!("storefront:      {}", config.base_url);
    println!("catalog:         {}", config.catalog_path.display());
    println!("screenshots:     {}", config.screenshot_dir.display());
    println!("headless:        {}", config.headless);
    println!("search attempts: {}", config.search_attempts);
    Ok(())
}
