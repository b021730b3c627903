use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FilingStatus;

/// One row of a state's progressive income tax schedule.
///
/// Tax inside the bracket is `base_tax + (income - base_lower_bound) * rate`.
/// `upper_bound` of `None` marks the open-ended top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxBracket {
    pub state_code: String,
    pub filing_status: FilingStatus,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub base_tax: Decimal,
    pub base_lower_bound: Decimal,
}
