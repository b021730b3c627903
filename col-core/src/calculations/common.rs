//! Common utility functions for relocation calculations.
//!
//! This module provides the rounding rules and the ratio-scaling primitive
//! shared by every estimate in the engine.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::EstimationError;

/// Decimal places carried by currency values.
pub const CURRENCY_DP: u32 = 2;

/// Decimal places carried by index ratios.
pub const RATIO_DP: u32 = 3;

/// Decimal places carried by percentage changes.
pub const PERCENT_DP: u32 = 1;

/// Largest accepted input amount, 9999999999.99: twelve digits with two
/// decimal places.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Rounds a decimal value to `dp` places using half-up rounding and pads the
/// scale so the value always renders with exactly `dp` digits.
///
/// Values at exactly the midpoint are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use col_core::calculations::common::round_dp_half_up;
///
/// assert_eq!(round_dp_half_up(dec!(0.8945), 3), dec!(0.895));
/// assert_eq!(round_dp_half_up(dec!(-10.95), 1), dec!(-11.0));
/// assert_eq!(round_dp_half_up(dec!(1), 3).to_string(), "1.000");
/// ```
pub fn round_dp_half_up(
    value: Decimal,
    dp: u32,
) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use col_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    round_dp_half_up(value, CURRENCY_DP)
}

/// Scales `amount` by the ratio `numerator_index / denominator_index` and
/// rounds the result to a currency value.
///
/// Each scaled line item is rounded on its own; totals are built from the
/// rounded parts.
///
/// # Errors
///
/// Returns [`EstimationError::DivisionByZero`] when `denominator_index` is zero
/// and [`EstimationError::Validation`] when the result does not fit a decimal.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use col_core::calculations::common::scale;
///
/// assert_eq!(scale(dec!(1500.00), dec!(89), dec!(100)), Ok(dec!(1335.00)));
/// assert!(scale(dec!(1500.00), dec!(89), dec!(0)).is_err());
/// ```
pub fn scale(
    amount: Decimal,
    numerator_index: Decimal,
    denominator_index: Decimal,
) -> Result<Decimal, EstimationError> {
    if denominator_index.is_zero() {
        return Err(EstimationError::DivisionByZero);
    }

    let ratio = numerator_index
        .checked_div(denominator_index)
        .ok_or_else(out_of_range)?;
    Ok(round_half_up(checked_mul(amount, ratio)?))
}

pub(crate) fn out_of_range() -> EstimationError {
    EstimationError::Validation("amount out of range".to_string())
}

pub(crate) fn checked_mul(
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, EstimationError> {
    a.checked_mul(b).ok_or_else(out_of_range)
}

pub(crate) fn checked_add(
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, EstimationError> {
    a.checked_add(b).ok_or_else(out_of_range)
}

pub(crate) fn checked_sub(
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, EstimationError> {
    a.checked_sub(b).ok_or_else(out_of_range)
}

pub(crate) fn checked_sum<I>(values: I) -> Result<Decimal, EstimationError>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, checked_add)
}

/// Rejects negative amounts and amounts above [`MAX_AMOUNT`].
pub(crate) fn validate_amount(
    field: &str,
    amount: Decimal,
) -> Result<(), EstimationError> {
    if amount < Decimal::ZERO {
        return Err(EstimationError::Validation(format!(
            "{field} must not be negative (got {amount})"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(EstimationError::Validation(format!(
            "{field} must not exceed {MAX_AMOUNT} (got {amount})"
        )));
    }
    Ok(())
}
