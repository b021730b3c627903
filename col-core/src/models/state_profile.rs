use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;

/// Per-state cost and tax reference record.
///
/// Index fields are relative to the national average (100). Tax fields are
/// percentages, e.g. `5.5` for a 5.5% sales tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateProfile {
    pub code: String,
    pub name: String,

    // Cost indices
    pub cost_of_living_index: Decimal,
    pub housing_index: Decimal,
    pub utilities_index: Decimal,
    pub grocery_index: Decimal,
    pub transportation_index: Decimal,

    // Tax rates (percent)
    pub income_tax_min: Decimal,
    pub income_tax_max: Decimal,
    pub sales_tax_rate: Decimal,
    pub property_tax_rate: Decimal,

    #[serde(default)]
    pub data_source: String,
}

impl StateProfile {
    /// Named view over the five cost indices, in comparison order.
    pub fn indices(&self) -> [(&'static str, Decimal); 5] {
        [
            ("housing_index", self.housing_index),
            ("utilities_index", self.utilities_index),
            ("grocery_index", self.grocery_index),
            ("transportation_index", self.transportation_index),
            ("cost_of_living_index", self.cost_of_living_index),
        ]
    }

    pub fn has_no_state_income_tax(&self) -> bool {
        self.income_tax_max.is_zero()
    }

    /// Sales tax as a fraction (5.5% -> 0.055).
    pub fn sales_tax_fraction(&self) -> Decimal {
        self.sales_tax_rate / Decimal::ONE_HUNDRED
    }

    /// Checks that every cost index can be used as a divisor.
    ///
    /// # Errors
    ///
    /// [`EstimationError::InvalidStateData`] naming the first index that is
    /// zero or negative.
    pub fn validate_indices(&self) -> Result<(), EstimationError> {
        match self.indices().iter().find(|(_, value)| *value <= Decimal::ZERO) {
            Some((field, _)) => Err(EstimationError::invalid_state_data(&self.code, field)),
            None => Ok(()),
        }
    }

    /// Checks the tax percentages are non-negative and the income tax range
    /// is ordered.
    pub fn validate_rates(&self) -> Result<(), EstimationError> {
        let rates = [
            ("income_tax_min", self.income_tax_min),
            ("income_tax_max", self.income_tax_max),
            ("sales_tax_rate", self.sales_tax_rate),
            ("property_tax_rate", self.property_tax_rate),
        ];
        if let Some((field, _)) = rates.iter().find(|(_, value)| *value < Decimal::ZERO) {
            return Err(EstimationError::invalid_state_data(&self.code, field));
        }
        if self.income_tax_min > self.income_tax_max {
            return Err(EstimationError::invalid_state_data(&self.code, "income_tax_min"));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_decimal_macros::dec;

    use super::StateProfile;

    /// A state sitting exactly on the national average.
    pub fn national_average(code: &str) -> StateProfile {
        StateProfile {
            code: code.to_string(),
            name: format!("Average {code}"),
            cost_of_living_index: dec!(100),
            housing_index: dec!(100),
            utilities_index: dec!(100),
            grocery_index: dec!(100),
            transportation_index: dec!(100),
            income_tax_min: dec!(5.0),
            income_tax_max: dec!(5.0),
            sales_tax_rate: dec!(6.25),
            property_tax_rate: dec!(1.17),
            data_source: String::new(),
        }
    }

    pub fn maine() -> StateProfile {
        StateProfile {
            code: "ME".to_string(),
            name: "Maine".to_string(),
            cost_of_living_index: dec!(98.0),
            housing_index: dec!(89.0),
            utilities_index: dec!(108.0),
            grocery_index: dec!(102.0),
            transportation_index: dec!(95.0),
            income_tax_min: dec!(5.8),
            income_tax_max: dec!(7.15),
            sales_tax_rate: dec!(5.5),
            property_tax_rate: dec!(1.35),
            data_source: String::new(),
        }
    }

    pub fn texas() -> StateProfile {
        StateProfile {
            code: "TX".to_string(),
            name: "Texas".to_string(),
            cost_of_living_index: dec!(91.5),
            housing_index: dec!(84.3),
            utilities_index: dec!(99.1),
            grocery_index: dec!(90.7),
            transportation_index: dec!(96.7),
            income_tax_min: dec!(0.0),
            income_tax_max: dec!(0.0),
            sales_tax_rate: dec!(6.25),
            property_tax_rate: dec!(1.86),
            data_source: String::new(),
        }
    }
}
