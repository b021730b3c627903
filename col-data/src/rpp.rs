use std::io::Read;

use col_core::service::normalize_state_code;
use col_core::{RepositoryError, StateRepository};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::LoaderError;
use crate::fields::deserialize_decimal;

/// A row of the regional price parity CSV (`state,index_all_items`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PriceParityRecord {
    pub state: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub index_all_items: Decimal,
}

/// Loader for regional price parities (all-items RPP, national = 100).
pub struct PriceParityLoader;

impl PriceParityLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<PriceParityRecord>, LoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();
        for result in csv_reader.deserialize() {
            records.push(result?);
        }
        Ok(records)
    }

    /// Checks every row, then upserts each parity. States must already exist.
    pub async fn load(
        repo: &dyn StateRepository,
        records: &[PriceParityRecord],
    ) -> Result<usize, LoaderError> {
        let mut rows = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let line = idx + 1;
            let code = normalize_state_code(&record.state)
                .map_err(|e| LoaderError::invalid(line, e.to_string()))?;
            if record.index_all_items <= Decimal::ZERO {
                return Err(LoaderError::invalid(
                    line,
                    format!("price parity for {code} must be positive"),
                ));
            }
            rows.push((code, record.index_all_items));
        }

        for (code, rpp) in &rows {
            repo.get_state(code).await.map_err(|e| match e {
                RepositoryError::NotFound => LoaderError::StateNotFound(code.clone()),
                other => LoaderError::Repository(other),
            })?;
            repo.upsert_price_parity(code, *rpp).await?;
        }
        tracing::info!(rows = rows.len(), "loaded price parities");

        Ok(rows.len())
    }
}
