use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use col_data::{PriceParityLoader, StateBracketLoader, StateProfileLoader};
use col_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load cost-of-living reference data from CSV files into the database.
///
/// Files are loaded in dependency order: states, then price parities, then
/// bracket tables.
///
/// states CSV columns: code, name, cost_of_living_index, housing_index,
/// utilities_index, grocery_index, transportation_index, income_tax_min,
/// income_tax_max, sales_tax_rate, property_tax_rate, [data_source]
///
/// price parity CSV columns: state, index_all_items
///
/// brackets CSV columns: state_code, filing_status, upper_bound (empty for
/// the top bracket), rate, base_tax, base_lower_bound
#[derive(Parser, Debug)]
#[command(name = "col-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// SQLite database URL (e.g., sqlite:col.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:col.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(long)]
    seeds: Option<PathBuf>,

    /// CSV file of state profiles
    #[arg(long)]
    states: Option<PathBuf>,

    /// CSV file of regional price parities
    #[arg(long)]
    rpp: Option<PathBuf>,

    /// CSV file of state income tax brackets
    #[arg(long)]
    brackets: Option<PathBuf>,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open: {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    if let Some(path) = &args.states {
        let records = StateProfileLoader::parse(open(path)?)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let loaded = StateProfileLoader::load(&repo, &records)
            .await
            .context("Failed to load state profiles into database")?;
        println!("Loaded {} state profiles.", loaded);
    }

    if let Some(path) = &args.rpp {
        let records = PriceParityLoader::parse(open(path)?)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let loaded = PriceParityLoader::load(&repo, &records)
            .await
            .context("Failed to load price parities into database")?;
        println!("Loaded {} price parities.", loaded);
    }

    if let Some(path) = &args.brackets {
        let records = StateBracketLoader::parse(open(path)?)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let inserted = StateBracketLoader::load(&repo, &records)
            .await
            .context("Failed to load tax brackets into database")?;
        println!("Loaded {} tax brackets.", inserted);
    }

    Ok(())
}
