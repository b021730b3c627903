use std::io::Read;

use col_core::service::normalize_state_code;
use col_core::{StateProfile, StateRepository};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::LoaderError;
use crate::fields::deserialize_decimal;

/// A row of the state reference CSV. Indices are relative to a national
/// average of 100; tax columns are percentages.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateRecord {
    pub code: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub cost_of_living_index: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub housing_index: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub utilities_index: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub grocery_index: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub transportation_index: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub income_tax_min: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub income_tax_max: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub sales_tax_rate: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub property_tax_rate: Decimal,
    #[serde(default)]
    pub data_source: Option<String>,
}

impl StateRecord {
    /// Converts the row into a checked profile. `line` is the 1-based data row.
    pub fn to_profile(
        &self,
        line: usize,
    ) -> Result<StateProfile, LoaderError> {
        let code = normalize_state_code(&self.code)
            .map_err(|e| LoaderError::invalid(line, e.to_string()))?;
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LoaderError::invalid(line, "state name is empty"));
        }

        let profile = StateProfile {
            code,
            name: name.to_string(),
            cost_of_living_index: self.cost_of_living_index,
            housing_index: self.housing_index,
            utilities_index: self.utilities_index,
            grocery_index: self.grocery_index,
            transportation_index: self.transportation_index,
            income_tax_min: self.income_tax_min,
            income_tax_max: self.income_tax_max,
            sales_tax_rate: self.sales_tax_rate,
            property_tax_rate: self.property_tax_rate,
            data_source: self
                .data_source
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("csv")
                .to_string(),
        };
        profile
            .validate_indices()
            .and_then(|()| profile.validate_rates())
            .map_err(|e| LoaderError::invalid(line, e.to_string()))?;

        Ok(profile)
    }
}

/// Loader for the per-state cost and tax reference table.
pub struct StateProfileLoader;

impl StateProfileLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<StateRecord>, LoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();
        for result in csv_reader.deserialize() {
            records.push(result?);
        }
        Ok(records)
    }

    /// Validates every row, then upserts them all. Returns the row count.
    pub async fn load(
        repo: &dyn StateRepository,
        records: &[StateRecord],
    ) -> Result<usize, LoaderError> {
        let profiles = records
            .iter()
            .enumerate()
            .map(|(idx, record)| record.to_profile(idx + 1))
            .collect::<Result<Vec<_>, _>>()?;

        for profile in &profiles {
            repo.upsert_state(profile).await?;
        }
        tracing::info!(rows = profiles.len(), "loaded state profiles");

        Ok(profiles.len())
    }
}
