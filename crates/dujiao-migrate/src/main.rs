//! dujiao-migrate CLI
//!
//! CLI tool for migrating a legacy dujiaoka catalog into the new shop API.
//! Pedantic lints relaxed for CLI ergonomics.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dujiao_migrate::{CliOverrides, Config, MigrationStats, Migrator};

#[derive(Parser)]
#[command(name = "dujiao-migrate")]
#[command(version)]
#[command(about = "Migrate a legacy dujiaoka catalog into the new shop API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    overrides: OverrideArgs,
}

/// Command-line overrides for config file values.
#[derive(Args, Default)]
struct OverrideArgs {
    /// Legacy database host
    #[arg(long, value_name = "HOST")]
    old_host: Option<String>,

    /// Legacy database port
    #[arg(long, value_name = "PORT")]
    old_port: Option<u16>,

    /// Legacy database user
    #[arg(long, value_name = "USER")]
    old_user: Option<String>,

    /// Legacy database password
    #[arg(long, value_name = "PASSWORD")]
    old_password: Option<String>,

    /// Legacy database name (file path for sqlite)
    #[arg(long, value_name = "NAME")]
    old_database: Option<String>,

    /// Legacy database driver (mysql/postgres/sqlite)
    #[arg(long, value_name = "DRIVER")]
    old_driver: Option<String>,

    /// New admin API base URL
    #[arg(long, value_name = "URL")]
    new_api: Option<String>,

    /// New admin API username
    #[arg(long, value_name = "USER")]
    new_user: Option<String>,

    /// New admin API password
    #[arg(long, value_name = "PASSWORD")]
    new_password: Option<String>,

    /// Do not skip entities that already exist on the new side
    #[arg(long)]
    no_skip: bool,

    /// Do not migrate card secrets
    #[arg(long)]
    no_cards: bool,

    /// Legacy site root on disk, for image relocation
    #[arg(long, value_name = "DIR")]
    old_site_path: Option<String>,

    /// Card secrets per import batch
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,
}

impl From<&OverrideArgs> for CliOverrides {
    fn from(args: &OverrideArgs) -> Self {
        Self {
            old_host: args.old_host.clone(),
            old_port: args.old_port,
            old_user: args.old_user.clone(),
            old_password: args.old_password.clone(),
            old_database: args.old_database.clone(),
            old_driver: args.old_driver.clone(),
            new_api: args.new_api.clone(),
            new_user: args.new_user.clone(),
            new_password: args.new_password.clone(),
            no_skip: args.no_skip,
            no_cards: args.no_cards,
            old_site_path: args.old_site_path.clone(),
            batch_size: args.batch_size,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migration
    Run {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Write a sample configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "migration.yaml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let overrides = CliOverrides::from(&cli.overrides);

    match cli.command {
        Some(Commands::Run { config }) => {
            let config = config.or(cli.config);
            run_migration(config.as_deref(), &overrides).await?;
        }
        Some(Commands::Validate { config }) => {
            validate_config(&config)?;
        }
        Some(Commands::Init { output }) => {
            generate_config(&output)?;
        }
        None => {
            run_migration(cli.config.as_deref(), &overrides).await?;
        }
    }

    Ok(())
}

async fn run_migration(config_path: Option<&Path>, overrides: &CliOverrides) -> anyhow::Result<()> {
    if let Some(path) = config_path {
        info!("loading configuration from {}", path.display());
    }

    let cfg = Config::load(config_path, overrides)?;
    cfg.validate()?;

    info!("starting migration");

    let mut migrator = Migrator::connect(cfg).await?;
    let result = migrator.run().await;
    migrator.close().await;
    let stats = result?;

    print_summary(&stats);
    Ok(())
}

fn print_summary(stats: &MigrationStats) {
    println!("\n==================================================");
    println!("Migration summary");
    println!("==================================================");
    println!(
        "Categories:   {} migrated, {} skipped, {} failed",
        stats.categories.success, stats.categories.skipped, stats.categories.failed
    );
    println!(
        "Products:     {} migrated, {} skipped, {} failed",
        stats.products.success, stats.products.skipped, stats.products.failed
    );
    println!(
        "Card secrets: {} imported, {} failed",
        stats.cards.success, stats.cards.failed
    );
    println!("==================================================");
}

fn validate_config(config_path: &Path) -> anyhow::Result<()> {
    let cfg = Config::load(Some(config_path), &CliOverrides::default())?;
    cfg.validate()?;

    println!("Configuration is valid.");
    println!("   Driver:   {}", cfg.old_db.driver);
    println!("   Database: {}", cfg.old_db.database);
    println!("   API:      {}", cfg.new_api.base_url);
    println!(
        "   Options:  skip_existing={}, migrate_cards={}, batch_size={}",
        cfg.options.skip_existing, cfg.options.migrate_cards, cfg.options.batch_size
    );

    Ok(())
}

fn generate_config(output: &Path) -> anyhow::Result<()> {
    std::fs::write(output, SAMPLE_CONFIG)?;
    println!("Generated configuration: {}", output.display());
    println!(
        "   Edit the file and run: dujiao-migrate run --config {}",
        output.display()
    );
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# dujiao-migrate configuration

# Legacy database
old_db:
  driver: "mysql"          # mysql, postgres or sqlite
  host: "127.0.0.1"
  port: 3306
  user: "root"
  password: "your_password"
  database: "dujiaoka"
  charset: "utf8mb4"
  ssl_mode: "disable"      # postgres only: disable, require, verify-ca, verify-full

# SQLite example:
# old_db:
#   driver: "sqlite"
#   database: "/path/to/dujiaoka.db"

# New admin API
new_api:
  base_url: "http://127.0.0.1:8080/api/v1/admin"
  username: "admin"
  password: "admin123"

# Migration options
options:
  retry_times: 3        # attempts per API call
  retry_delay: 1        # seconds between attempts
  skip_existing: true   # skip entities whose slug already exists
  migrate_cards: true   # migrate card secrets after products
  only_active: true     # only migrate enabled rows
  batch_size: 500       # card secrets per import batch
  old_site_path: ""     # legacy site root for image relocation, e.g. /www/wwwroot/dujiaoka
  currency: "CNY"       # price currency applied to every product
"#;
