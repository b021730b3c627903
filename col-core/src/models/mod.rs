mod estimation;
mod expense;
mod filing_status;
mod saved_calculation;
pub(crate) mod state_profile;
mod state_tax_bracket;
mod veteran_benefit;

pub use estimation::{
    CategoryEstimate, CategoryIndices, EstimationInput, EstimationRequest, EstimationResult,
    IndexComparison, LineEstimate, ReferenceData, RelocationEstimate,
};
pub use expense::{ExpenseCategory, ExpenseItem, MonthlyExpenses};
pub use filing_status::FilingStatus;
pub use saved_calculation::{CalculationNote, NewSavedCalculation, SavedCalculation};
pub use state_profile::StateProfile;
pub use state_tax_bracket::StateTaxBracket;
pub use veteran_benefit::VeteranBenefit;
