mod data;
mod pricing;
mod vendors;
mod zones;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use glowdrop_core::{AppConfig, CartLine, Catalog, CatalogStore};
use rust_decimal::Decimal;

#[derive(Debug, Parser)]
#[command(name = "glowdrop-cli")]
#[command(about = "Glowdrop store discovery and pricing command line interface")]
struct Cli {
    /// Reference data YAML; the embedded launch market is used when unset
    #[arg(long, global = true, env = "GLOWDROP_REFERENCE_DATA_PATH")]
    data: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List configured areas in configuration order
    Areas,
    /// Show the index entry and area for a postal code
    Lookup {
        /// Five-digit postal code
        code: String,
    },
    /// Rank vendors around a customer postal code
    Discover {
        #[arg(long)]
        postal_code: String,
        /// Search radius in miles; must be one of the configured radii
        #[arg(long, default_value = "5")]
        radius: u32,
        /// Include national chain retailers
        #[arg(long)]
        include_chains: bool,
    },
    /// Compute the authorization hold for a cart at one vendor
    Quote {
        #[arg(long)]
        vendor: String,
        /// Customer postal code used for the delivery distance
        #[arg(long)]
        postal_code: Option<String>,
        /// Cart line as UNIT_PRICE_HIGH:QUANTITY (repeatable)
        #[arg(long = "line", value_parser = pricing::parse_cart_line)]
        lines: Vec<CartLine>,
    },
    /// Apply a vendor's display multiplier to a price range
    DisplayPrice {
        #[arg(long)]
        vendor: String,
        #[arg(long)]
        min: Decimal,
        #[arg(long)]
        max: Decimal,
    },
    /// Validate and apply an area import file against the loaded catalog
    ImportAreas { file: PathBuf },
    /// Validate and apply a newline-delimited vendor JSON file
    ImportVendors { file: PathBuf },
    /// Load the reference data and report what it contains
    CheckData,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("glowdrop-cli: run with --help to list commands");
        return Ok(());
    };

    let config = glowdrop_core::load_app_config_from_env()?;
    let catalog = load(cli.data.as_deref(), &config)?;

    match command {
        Commands::Areas => zones::run_areas(&catalog, cli.json)?,
        Commands::Lookup { code } => zones::run_lookup(&catalog, &code, cli.json)?,
        Commands::Discover {
            postal_code,
            radius,
            include_chains,
        } => {
            let store = CatalogStore::new(catalog, config.discovery_settings(), 1);
            vendors::run_discover(
                &store,
                &config.allowed_radii,
                &postal_code,
                radius,
                include_chains,
                cli.json,
            )?;
        }
        Commands::Quote {
            vendor,
            postal_code,
            lines,
        } => pricing::run_quote(
            &catalog,
            &config,
            &vendor,
            postal_code.as_deref(),
            &lines,
            cli.json,
        )?,
        Commands::DisplayPrice { vendor, min, max } => {
            pricing::run_display_price(&catalog, &vendor, min, max, cli.json)?;
        }
        Commands::ImportAreas { file } => {
            let store = CatalogStore::new(catalog, config.discovery_settings(), 1);
            data::run_import_areas(&store, &file)?;
        }
        Commands::ImportVendors { file } => {
            let store = CatalogStore::new(catalog, config.discovery_settings(), 1);
            data::run_import_vendors(&store, &file)?;
        }
        Commands::CheckData => data::run_check_data(&catalog, &config),
    }

    Ok(())
}

fn load(data: Option<&Path>, config: &AppConfig) -> anyhow::Result<Catalog> {
    let path = data.or(config.reference_data_path.as_deref());
    Ok(glowdrop_core::load_catalog(path)?)
}
