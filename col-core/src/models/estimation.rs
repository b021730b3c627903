use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ExpenseCategory, ExpenseItem, FilingStatus, StateProfile, VeteranBenefit};
use crate::calculations::common::validate_amount;
use crate::error::EstimationError;

// ─────────────────────────────────────────────────────────────────────────────
// inputs
// ─────────────────────────────────────────────────────────────────────────────

/// Fully resolved input for the tax/expense estimate.
///
/// Built by the caller from two state records and the user's figures; the
/// engine never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationRequest {
    pub origin: StateProfile,
    pub target: StateProfile,
    pub expenses: Vec<ExpenseItem>,
    pub gross_annual_income: Decimal,
    pub military_retirement_income: Decimal,
    pub disability_income: Decimal,
    pub filing_status: FilingStatus,
    pub dependents: u32,
    pub taxable_monthly_spend: Decimal,
}

impl EstimationRequest {
    /// Rejects negative or out-of-range money fields and unusable state
    /// records before any computation runs.
    pub fn validate(&self) -> Result<(), EstimationError> {
        let amounts = [
            ("gross_annual_income", self.gross_annual_income),
            ("military_retirement_income", self.military_retirement_income),
            ("disability_income", self.disability_income),
            ("taxable_monthly_spend", self.taxable_monthly_spend),
        ];
        for (field, amount) in amounts {
            validate_amount(field, amount)?;
        }

        for (idx, item) in self.expenses.iter().enumerate() {
            validate_amount(
                &format!("expense #{} ({})", idx + 1, item.category),
                item.amount_monthly,
            )?;
        }

        self.origin.validate_indices()?;
        self.target.validate_indices()?;
        self.origin.validate_rates()?;
        self.target.validate_rates()?;
        Ok(())
    }
}

/// Lookups that accompany an [`EstimationRequest`]: regional price parity
/// indices and veteran benefits for both states. `None` means no record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub origin_rpp: Option<Decimal>,
    pub target_rpp: Option<Decimal>,
    pub origin_benefits: Option<VeteranBenefit>,
    pub target_benefits: Option<VeteranBenefit>,
}

/// Wire shape of an estimate request: states by code, enum values as text.
///
/// Converted into an [`EstimationRequest`] once the state records have been
/// looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationInput {
    pub from_state: String,
    pub target_state: String,
    pub gross_annual_income: Decimal,
    #[serde(default)]
    pub military_retirement_income: Decimal,
    #[serde(default)]
    pub disability_income: Decimal,
    pub filing_status: String,
    #[serde(default)]
    pub dependents: i64,
    /// Defaults to the sum of the taxable expense lines.
    #[serde(default)]
    pub taxable_monthly_spend: Option<Decimal>,
    pub expenses: Vec<ExpenseItem>,
}

impl EstimationInput {
    /// Parses a JSON payload; malformed payloads are validation errors.
    pub fn from_json(payload: &str) -> Result<Self, EstimationError> {
        serde_json::from_str(payload)
            .map_err(|e| EstimationError::Validation(format!("malformed request: {e}")))
    }

    pub fn parsed_filing_status(&self) -> Result<FilingStatus, EstimationError> {
        self.filing_status.parse()
    }

    pub fn parsed_dependents(&self) -> Result<u32, EstimationError> {
        u32::try_from(self.dependents).map_err(|_| {
            EstimationError::Validation(format!(
                "dependents must be a non-negative count (got {})",
                self.dependents
            ))
        })
    }

    pub fn effective_taxable_spend(&self) -> Decimal {
        self.taxable_monthly_spend
            .unwrap_or_else(|| ExpenseItem::taxable_total(&self.expenses))
    }

    /// Combines this payload with the looked-up state records.
    pub fn into_request(
        self,
        origin: StateProfile,
        target: StateProfile,
    ) -> Result<EstimationRequest, EstimationError> {
        let filing_status = self.parsed_filing_status()?;
        let dependents = self.parsed_dependents()?;
        let taxable_monthly_spend = self.effective_taxable_spend();

        Ok(EstimationRequest {
            origin,
            target,
            expenses: self.expenses,
            gross_annual_income: self.gross_annual_income,
            military_retirement_income: self.military_retirement_income,
            disability_income: self.disability_income,
            filing_status,
            dependents,
            taxable_monthly_spend,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// outputs
// ─────────────────────────────────────────────────────────────────────────────

/// One value per compared cost category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryIndices {
    pub housing: Decimal,
    pub utilities: Decimal,
    pub groceries: Decimal,
    pub transportation: Decimal,
    pub overall_cost_of_living: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexComparison {
    pub origin_state: String,
    pub target_state: String,
    /// target / origin, 3 decimal places.
    pub ratios: CategoryIndices,
    /// (ratio - 1) * 100, 1 decimal place.
    pub percentage_changes: CategoryIndices,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEstimate {
    pub current_amount: Decimal,
    pub new_amount: Decimal,
}

/// Result of scaling the six named expenses by per-category indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationEstimate {
    pub origin_state: String,
    pub target_state: String,
    pub rent: LineEstimate,
    pub utilities: LineEstimate,
    pub groceries: LineEstimate,
    pub transportation: LineEstimate,
    pub healthcare: LineEstimate,
    pub entertainment: LineEstimate,
    pub current_total: Decimal,
    pub target_total: Decimal,
    /// Positive means the target state is cheaper.
    pub total_monthly_savings: Decimal,
    pub total_annual_savings: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEstimate {
    pub category: ExpenseCategory,
    pub current_amount: Decimal,
    pub new_amount: Decimal,
}

/// Result of the tax/expense estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub origin_state: String,
    pub target_state: String,
    pub categories: Vec<CategoryEstimate>,
    pub price_parity_ratio: Decimal,
    /// The origin had no recorded price parity index; 100 was used.
    pub origin_rpp_defaulted: bool,
    /// The target had no recorded price parity index; 100 was used.
    pub target_rpp_defaulted: bool,
    pub annual_income_tax_origin: Decimal,
    pub annual_income_tax_target: Decimal,
    pub monthly_tax_delta: Decimal,
    pub monthly_sales_tax_from: Decimal,
    pub monthly_sales_tax_target: Decimal,
    pub total_now: Decimal,
    pub total_target: Decimal,
    /// Positive means the target state costs more per month.
    pub delta: Decimal,
}
