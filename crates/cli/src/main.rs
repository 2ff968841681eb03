//! Storebridge CLI - channel sync entry points.
//!
//! # Usage
//!
//! ```bash
//! # Probe the remote endpoint with the channel credentials
//! sb-cli test-connection
//!
//! # Pull the remote vocabulary and store hierarchy
//! sb-cli import states
//! sb-cli import carriers
//! sb-cli import hierarchy
//!
//! # Pull the catalog and the open orders
//! sb-cli import catalog
//! sb-cli import orders
//!
//! # Push local state back out
//! sb-cli export inventory
//! sb-cli export tiers
//! sb-cli export orders
//! sb-cli export shipments
//! sb-cli export product
//! ```
//!
//! # Commands
//!
//! - `test-connection` - Probe the remote API with the channel credentials
//! - `import` - Run the import pipelines (states, carriers, hierarchy,
//!   catalog, orders, all)
//! - `export` - Run the export pipelines (inventory, tiers, orders,
//!   shipments, product)
//!
//! Commands run against an in-memory store and an in-process demo remote,
//! seeded with fixture data so every pipeline can be exercised end to end.
//! Set the `BRIDGE_*` variables to drive your own channel configuration.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod demo;

#[derive(Parser)]
#[command(name = "sb-cli")]
#[command(author, version, about = "Storebridge channel sync CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the remote API with the channel credentials
    TestConnection,
    /// Run import pipelines
    Import {
        #[command(subcommand)]
        target: ImportTarget,
    },
    /// Run export pipelines
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },
}

#[derive(Subcommand)]
enum ImportTarget {
    /// Import the remote order state vocabulary
    States,
    /// Import the remote shipping carriers
    Carriers,
    /// Import the website / store / store view hierarchy
    Hierarchy,
    /// Import the category tree and the product catalog
    Catalog,
    /// Import open orders across every store view
    Orders,
    /// Run every import pipeline in dependency order
    All,
}

#[derive(Subcommand)]
enum ExportTarget {
    /// Push inventory levels for every listed product
    Inventory,
    /// Push tier prices for every listed product
    Tiers,
    /// Push order workflow states
    Orders,
    /// Push dispatched shipments and their tracking numbers
    Shipments,
    /// Register a local product on the remote platform
    Product {
        /// Local product id to export (defaults to a seeded demo product)
        #[arg(long)]
        product: Option<i32>,

        /// Linked local category to file the product under
        #[arg(long)]
        category: Option<i32>,

        /// Remote attribute set id for the new product
        #[arg(long, default_value_t = 4)]
        attribute_set: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing with EnvFilter
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storebridge_engine=info,sb_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::TestConnection => commands::connection::test().await?,
        Commands::Import { target } => match target {
            ImportTarget::States => commands::import::states().await?,
            ImportTarget::Carriers => commands::import::carriers().await?,
            ImportTarget::Hierarchy => commands::import::hierarchy().await?,
            ImportTarget::Catalog => commands::import::catalog().await?,
            ImportTarget::Orders => commands::import::orders().await?,
            ImportTarget::All => commands::import::all().await?,
        },
        Commands::Export { target } => match target {
            ExportTarget::Inventory => commands::export::inventory().await?,
            ExportTarget::Tiers => commands::export::tiers().await?,
            ExportTarget::Orders => commands::export::orders().await?,
            ExportTarget::Shipments => commands::export::shipments().await?,
            ExportTarget::Product {
                product,
                category,
                attribute_set,
            } => commands::export::product(product, category, attribute_set).await?,
        },
    }
    Ok(())
}
