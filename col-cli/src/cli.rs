//! Command-line definition for the `relocate` binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use col_core::{EstimationInput, MonthlyExpenses, RelocationScenario};
use rust_decimal::Decimal;

use crate::config::AppConfig;
use crate::csv_loader;
use crate::utils::parse_decimal;

/// Cost-of-living relocation estimator.
///
/// Compares states, projects monthly expenses onto a target state, and keeps
/// saved scenarios per user. Results print to stdout as JSON.
#[derive(Debug, Parser)]
#[command(name = "relocate", version, about)]
pub struct Cli {
    /// Path to a TOML config file (default: ./relocate.toml if present).
    #[arg(long, env = "RELOCATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, env = "RELOCATE_DB_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `relocation.db`) or `:memory:`.
    #[arg(long, env = "RELOCATE_DB", global = true)]
    pub db: Option<String>,

    /// Log level or filter directive.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies flags given on the command line over `config`.
    pub fn apply_overrides(
        &self,
        config: &mut AppConfig,
    ) {
        if let Some(backend) = &self.backend {
            config.database.backend = backend.clone();
        }
        if let Some(db) = &self.db {
            config.database.connection_string = db.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse state reference data.
    States {
        #[command(subcommand)]
        command: StatesCommand,
    },

    /// Compare the cost indices of two states.
    Compare {
        /// Origin state code (e.g. MA).
        from: String,
        /// Target state code (e.g. ME).
        to: String,
    },

    /// Project six monthly expenses onto another state.
    Relocate(RelocateArgs),

    /// Full estimate with price parities, sales tax and income tax.
    Estimate(EstimateArgs),

    /// Summary of a user's saved calculations.
    Dashboard {
        #[arg(long)]
        user: i64,
    },

    /// Manage saved calculations.
    Calc {
        #[command(subcommand)]
        command: CalcCommand,
    },
}

/// Every calculation command acts only on calculations owned by `--user`.
#[derive(Debug, Subcommand)]
pub enum CalcCommand {
    /// A user's saved calculations, most recently updated first.
    List {
        #[arg(long)]
        user: i64,
    },
    /// One saved calculation with its notes.
    Show(CalcRef),
    /// Change inputs and re-estimate against current state data.
    Update(CalcUpdateArgs),
    /// Save a copy named "Copy of <name>".
    Duplicate(CalcRef),
    Delete(CalcRef),
    /// Toggle the favorite flag.
    Favorite(CalcRef),
    /// Notes attached to a calculation.
    Note {
        #[command(subcommand)]
        command: NoteCommand,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CalcRef {
    /// Calculation id.
    pub id: i64,
    #[arg(long)]
    pub user: i64,
}

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    Add {
        calculation: i64,
        text: String,
        #[arg(long)]
        user: i64,
    },
    /// Newest first.
    List {
        calculation: i64,
        #[arg(long)]
        user: i64,
    },
    Edit {
        calculation: i64,
        note: i64,
        text: String,
        #[arg(long)]
        user: i64,
    },
    Delete {
        calculation: i64,
        note: i64,
        #[arg(long)]
        user: i64,
    },
}

/// Flags left out keep the stored value.
#[derive(Debug, Clone, Args)]
pub struct CalcUpdateArgs {
    /// Calculation id.
    pub id: i64,
    #[arg(long)]
    pub user: i64,

    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,

    #[arg(long, value_parser = parse_decimal)]
    pub rent: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal)]
    pub utilities: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal)]
    pub groceries: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal)]
    pub transportation: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal)]
    pub healthcare: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal)]
    pub entertainment: Option<Decimal>,

    #[arg(long, value_parser = parse_decimal)]
    pub income: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal)]
    pub military_retirement: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal)]
    pub disability: Option<Decimal>,
}

impl CalcUpdateArgs {
    /// Overlays the given flags on a stored scenario.
    pub fn apply(
        &self,
        scenario: &mut RelocationScenario,
    ) {
        let overlay = |slot: &mut Decimal, value: Option<Decimal>| {
            if let Some(value) = value {
                *slot = value;
            }
        };

        if let Some(from) = &self.from {
            scenario.from_state = from.clone();
        }
        if let Some(to) = &self.to {
            scenario.target_state = to.clone();
        }

        let expenses = &mut scenario.expenses;
        overlay(&mut expenses.rent, self.rent);
        overlay(&mut expenses.utilities, self.utilities);
        overlay(&mut expenses.groceries, self.groceries);
        overlay(&mut expenses.transportation, self.transportation);
        overlay(&mut expenses.healthcare, self.healthcare);
        overlay(&mut expenses.entertainment, self.entertainment);

        overlay(&mut scenario.gross_annual_income, self.income);
        overlay(&mut scenario.military_retirement_income, self.military_retirement);
        overlay(&mut scenario.disability_income, self.disability);
    }
}

#[derive(Debug, Subcommand)]
pub enum StatesCommand {
    /// All states, ordered by name.
    List,
    /// One state by code.
    Show { code: String },
}

#[derive(Debug, Clone, Args)]
pub struct ExpenseArgs {
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub rent: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub utilities: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub groceries: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub transportation: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub healthcare: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub entertainment: Decimal,
}

impl From<&ExpenseArgs> for MonthlyExpenses {
    fn from(args: &ExpenseArgs) -> Self {
        Self {
            rent: args.rent,
            utilities: args.utilities,
            groceries: args.groceries,
            transportation: args.transportation,
            healthcare: args.healthcare,
            entertainment: args.entertainment,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RelocateArgs {
    /// Origin state code.
    pub from: String,
    /// Target state code.
    pub to: String,

    #[command(flatten)]
    pub expenses: ExpenseArgs,

    /// Gross annual income, stored with a saved calculation.
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub income: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub military_retirement: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub disability: Decimal,

    /// Save the result under `--user` and `--name`.
    #[arg(long, requires_all = ["user", "name"])]
    pub save: bool,
    #[arg(long)]
    pub user: Option<i64>,
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["request", "expenses"])))]
pub struct EstimateArgs {
    /// JSON request file.
    #[arg(long, conflicts_with_all = ["from", "to", "taxable_spend"])]
    pub request: Option<PathBuf>,

    /// Expense profile CSV (`category,amount_monthly[,taxable]`).
    #[arg(long, requires_all = ["from", "to"])]
    pub expenses: Option<PathBuf>,

    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,

    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub income: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub military_retirement: Decimal,
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    pub disability: Decimal,

    /// SINGLE, MFJ, MFS or HOH.
    #[arg(long, default_value = "SINGLE")]
    pub filing_status: String,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub dependents: i64,

    /// Monthly spend subject to sales tax (default: sum of taxable lines).
    #[arg(long, value_parser = parse_decimal)]
    pub taxable_spend: Option<Decimal>,
}

impl EstimateArgs {
    /// Builds the request from the JSON file, or from the expense CSV plus
    /// the remaining flags.
    pub fn to_input(&self) -> anyhow::Result<EstimationInput> {
        if let Some(path) = &self.request {
            let payload = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request: {}", path.display()))?;
            return Ok(EstimationInput::from_json(&payload)?);
        }

        let (Some(path), Some(from), Some(to)) = (&self.expenses, &self.from, &self.to) else {
            anyhow::bail!("either --request or --expenses with --from and --to is required");
        };
        let expenses = csv_loader::load_from_file(path)
            .with_context(|| format!("Failed to load expenses: {}", path.display()))?;

        Ok(EstimationInput {
            from_state: from.clone(),
            target_state: to.clone(),
            gross_annual_income: self.income,
            military_retirement_income: self.military_retirement,
            disability_income: self.disability,
            filing_status: self.filing_status.clone(),
            dependents: self.dependents,
            taxable_monthly_spend: self.taxable_spend,
            expenses,
        })
    }
}
