//! CSV loader for flat expense profiles.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does not matter.
//!
//! | Column           | Required | Type    | Notes                                             |
//! |------------------|----------|---------|---------------------------------------------------|
//! | `category`       | yes      | string  | `HOUSING`, `FOOD`, `UTILITIES`, `TRANSPORT`, `HEALTH`, `MISC` |
//! | `amount_monthly` | yes      | decimal | e.g. `1500.00`; must not be negative              |
//! | `taxable`        | no       | bool    | `true`/`false`; empty or missing means `true`     |
//!
//! ### Example
//!
//! ```csv
//! category,amount_monthly,taxable
//! HOUSING,1500.00,false
//! FOOD,400.00,true
//! MISC,250.00,
//! ```
use rust_decimal::Decimal;
use serde::Deserialize;
use col_core::{ExpenseCategory, ExpenseItem};

#[derive(Debug, Deserialize)]
struct CsvRow {
    category: String,
    #[serde(deserialize_with = "decimal_from_text")]
    amount_monthly: Decimal,
    #[serde(default)]
    taxable: Option<bool>,
}

/// Parses the raw field text so the written scale and every digit survive.
fn decimal_from_text<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    text.trim()
        .parse::<Decimal>()
        .map_err(|e| serde::de::Error::custom(format!("invalid decimal '{}': {}", text.trim(), e)))
}

/// Errors that can occur while loading or converting CSV data.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    /// Bad structure, missing required column, type mismatch, etc.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// `row` is 1-based (header = row 0).
    #[error("unrecognised expense category '{category}' on row {row}")]
    InvalidCategory { category: String, row: usize },

    #[error("negative amount {amount} on row {row}")]
    NegativeAmount { amount: Decimal, row: usize },
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<ExpenseItem, CsvLoadError> {
    let category =
        ExpenseCategory::parse(&row.category).ok_or_else(|| CsvLoadError::InvalidCategory {
            category: row.category,
            row: row_number,
        })?;

    if row.amount_monthly < Decimal::ZERO {
        return Err(CsvLoadError::NegativeAmount {
            amount: row.amount_monthly,
            row: row_number,
        });
    }

    Ok(ExpenseItem {
        category,
        amount_monthly: row.amount_monthly,
        taxable: row.taxable.unwrap_or(true),
    })
}

/// Parse CSV text and return the expense lines in file order.
///
/// # Errors
///
/// * [CsvLoadError::Parse] if the CSV is structurally invalid or a field
///   cannot be deserialised.
/// * [CsvLoadError::InvalidCategory] for an unknown category.
/// * [CsvLoadError::NegativeAmount] for a negative monthly amount.
pub fn load_from_str(input: &str) -> Result<Vec<ExpenseItem>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

/// Read a file from disk and delegate to [load_from_str].
pub fn load_from_file(path: &std::path::Path) -> anyhow::Result<Vec<ExpenseItem>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(load_from_str(&contents)?)
}
