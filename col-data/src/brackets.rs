use std::collections::BTreeMap;
use std::io::Read;

use col_core::calculations::bracket_tax::validate_bracket_table;
use col_core::service::normalize_state_code;
use col_core::{FilingStatus, RepositoryError, StateRepository, StateTaxBracket};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::LoaderError;
use crate::fields::{deserialize_decimal, deserialize_optional_decimal};

/// A single record from the state income tax brackets CSV file.
///
/// - `state_code`: two-letter state code
/// - `filing_status`: `SINGLE`, `MFJ`, `MFS` or `HOH`
/// - `upper_bound`: top of the bracket (empty for the open-ended bracket)
/// - `rate`: marginal rate as a fraction (e.g. 0.0675)
/// - `base_tax`: tax owed at `base_lower_bound`
/// - `base_lower_bound`: income at which this bracket starts
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateBracketRecord {
    pub state_code: String,
    pub filing_status: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub rate: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub base_tax: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub base_lower_bound: Decimal,
}

impl StateBracketRecord {
    fn to_bracket(
        &self,
        line: usize,
    ) -> Result<StateTaxBracket, LoaderError> {
        let state_code = normalize_state_code(&self.state_code)
            .map_err(|e| LoaderError::invalid(line, e.to_string()))?;
        let filing_status = FilingStatus::parse(&self.filing_status).ok_or_else(|| {
            LoaderError::invalid(
                line,
                format!("unknown filing status '{}'", self.filing_status),
            )
        })?;

        Ok(StateTaxBracket {
            state_code,
            filing_status,
            upper_bound: self.upper_bound,
            rate: self.rate,
            base_tax: self.base_tax,
            base_lower_bound: self.base_lower_bound,
        })
    }
}

/// Loader for state income tax bracket tables.
///
/// Works through the [`StateRepository`] trait, so any backend will do.
pub struct StateBracketLoader;

impl StateBracketLoader {
    /// Parse bracket records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<StateBracketRecord>, LoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: StateBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records into per (state, filing status) tables and check each.
    pub fn tables(
        records: &[StateBracketRecord]
    ) -> Result<BTreeMap<(String, FilingStatus), Vec<StateTaxBracket>>, LoaderError> {
        let mut tables: BTreeMap<(String, FilingStatus), Vec<StateTaxBracket>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            let bracket = record.to_bracket(idx + 1)?;
            tables
                .entry((bracket.state_code.clone(), bracket.filing_status))
                .or_default()
                .push(bracket);
        }

        for ((state_code, _), table) in &tables {
            validate_bracket_table(state_code, table).map_err(LoaderError::InvalidTable)?;
        }

        Ok(tables)
    }

    /// Load bracket records into the database.
    ///
    /// For each (state, filing status) table in the records:
    /// 1. Check the state exists.
    /// 2. Delete any existing brackets for that state and status.
    /// 3. Insert the new brackets.
    ///
    /// Every table is validated before anything is written, and reloading the
    /// same file leaves the same rows behind.
    pub async fn load(
        repo: &dyn StateRepository,
        records: &[StateBracketRecord],
    ) -> Result<usize, LoaderError> {
        let tables = Self::tables(records)?;
        let mut inserted = 0;

        for ((state_code, filing_status), table) in tables {
            repo.get_state(&state_code).await.map_err(|e| match e {
                RepositoryError::NotFound => LoaderError::StateNotFound(state_code.clone()),
                other => LoaderError::Repository(other),
            })?;

            repo.delete_state_tax_brackets(&state_code, filing_status)
                .await?;

            for bracket in &table {
                repo.insert_state_tax_bracket(bracket).await?;
                inserted += 1;
            }
            tracing::info!(state = %state_code, %filing_status, rows = table.len(), "loaded bracket table");
        }

        Ok(inserted)
    }
}
