use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MonthlyExpenses, RelocationEstimate};

/// A relocation estimate a user chose to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCalculation {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub origin_state: String,
    pub target_state: String,

    // User-provided values
    pub expenses: MonthlyExpenses,
    pub gross_annual_income: Decimal,
    pub military_retirement_income: Decimal,
    pub disability_income: Decimal,

    // Calculated values
    pub estimate: RelocationEstimate,

    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new calculations (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSavedCalculation {
    pub user_id: i64,
    pub name: String,
    pub expenses: MonthlyExpenses,
    pub gross_annual_income: Decimal,
    pub military_retirement_income: Decimal,
    pub disability_income: Decimal,
    pub estimate: RelocationEstimate,
}

impl NewSavedCalculation {
    pub fn origin_state(&self) -> &str {
        &self.estimate.origin_state
    }

    pub fn target_state(&self) -> &str {
        &self.estimate.target_state
    }
}

/// Free-text note attached to a saved calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationNote {
    pub id: i64,
    pub calculation_id: i64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}
