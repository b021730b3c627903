//! Index-based relocation estimate over six named monthly expenses.
//!
//! | Expense        | Scaled by                  |
//! |----------------|----------------------------|
//! | rent           | housing index              |
//! | utilities      | utilities index            |
//! | groceries      | grocery index              |
//! | transportation | transportation index       |
//! | healthcare     | unchanged                  |
//! | entertainment  | overall cost-of-living     |

use rust_decimal::Decimal;

use crate::calculations::common::{checked_mul, checked_sub, checked_sum, round_half_up, scale};
use crate::error::EstimationError;
use crate::models::{LineEstimate, MonthlyExpenses, RelocationEstimate, StateProfile};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

fn scaled_line(
    current_amount: Decimal,
    target_index: Decimal,
    origin_index: Decimal,
) -> Result<LineEstimate, EstimationError> {
    Ok(LineEstimate {
        current_amount: round_half_up(current_amount),
        new_amount: scale(current_amount, target_index, origin_index)?,
    })
}

/// Projects `current` monthly expenses from `origin` onto `target`.
///
/// # Errors
///
/// * [`EstimationError::Validation`] if any expense is negative or above
///   the accepted maximum, or a scaled total does not fit a decimal.
/// * [`EstimationError::InvalidStateData`] if either state has a zero or
///   negative index. Current values are never reported as estimates.
pub fn estimate_relocation(
    current: &MonthlyExpenses,
    origin: &StateProfile,
    target: &StateProfile,
) -> Result<RelocationEstimate, EstimationError> {
    current.validate()?;
    origin.validate_indices()?;
    target.validate_indices()?;

    let rent = scaled_line(current.rent, target.housing_index, origin.housing_index)?;
    let utilities = scaled_line(
        current.utilities,
        target.utilities_index,
        origin.utilities_index,
    )?;
    let groceries = scaled_line(current.groceries, target.grocery_index, origin.grocery_index)?;
    let transportation = scaled_line(
        current.transportation,
        target.transportation_index,
        origin.transportation_index,
    )?;
    // Healthcare is assumed to cost the same everywhere
    let healthcare = LineEstimate {
        current_amount: round_half_up(current.healthcare),
        new_amount: round_half_up(current.healthcare),
    };
    let entertainment = scaled_line(
        current.entertainment,
        target.cost_of_living_index,
        origin.cost_of_living_index,
    )?;

    let lines = [&rent, &utilities, &groceries, &transportation, &healthcare, &entertainment];
    let current_total = round_half_up(current.total());
    let target_total = round_half_up(checked_sum(lines.iter().map(|line| line.new_amount))?);
    let total_monthly_savings = round_half_up(checked_sub(current_total, target_total)?);
    let total_annual_savings = round_half_up(checked_mul(total_monthly_savings, MONTHS_PER_YEAR)?);

    tracing::debug!(
        origin = %origin.code,
        target = %target.code,
        %total_monthly_savings,
        "estimated relocation"
    );

    Ok(RelocationEstimate {
        origin_state: origin.code.clone(),
        target_state: target.code.clone(),
        rent,
        utilities,
        groceries,
        transportation,
        healthcare,
        entertainment,
        current_total,
        target_total,
        total_monthly_savings,
        total_annual_savings,
    })
}
