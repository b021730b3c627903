//! State-to-state cost index comparison.

use rust_decimal::Decimal;

use crate::calculations::common::{
    PERCENT_DP, RATIO_DP, checked_mul, checked_sub, out_of_range, round_dp_half_up,
};
use crate::error::EstimationError;
use crate::models::{CategoryIndices, IndexComparison, StateProfile};

/// Ratio of a target index to an origin index, rounded for display, together
/// with the percentage change computed from the unrounded ratio.
fn ratio_and_change(
    target_index: Decimal,
    origin_index: Decimal,
) -> Result<(Decimal, Decimal), EstimationError> {
    if origin_index.is_zero() {
        return Err(EstimationError::DivisionByZero);
    }

    let ratio = target_index
        .checked_div(origin_index)
        .ok_or_else(out_of_range)?;
    let change = checked_mul(checked_sub(ratio, Decimal::ONE)?, Decimal::ONE_HUNDRED)?;

    Ok((
        round_dp_half_up(ratio, RATIO_DP),
        round_dp_half_up(change, PERCENT_DP),
    ))
}

/// Compares the five cost indices of two states.
///
/// # Errors
///
/// [`EstimationError::InvalidStateData`] if either state has a zero or
/// negative index.
pub fn compare(
    origin: &StateProfile,
    target: &StateProfile,
) -> Result<IndexComparison, EstimationError> {
    origin.validate_indices()?;
    target.validate_indices()?;

    let (housing, housing_change) = ratio_and_change(target.housing_index, origin.housing_index)?;
    let (utilities, utilities_change) =
        ratio_and_change(target.utilities_index, origin.utilities_index)?;
    let (groceries, groceries_change) = ratio_and_change(target.grocery_index, origin.grocery_index)?;
    let (transportation, transportation_change) =
        ratio_and_change(target.transportation_index, origin.transportation_index)?;
    let (overall, overall_change) =
        ratio_and_change(target.cost_of_living_index, origin.cost_of_living_index)?;

    tracing::debug!(
        origin = %origin.code,
        target = %target.code,
        %overall,
        "compared state cost indices"
    );

    Ok(IndexComparison {
        origin_state: origin.code.clone(),
        target_state: target.code.clone(),
        ratios: CategoryIndices {
            housing,
            utilities,
            groceries,
            transportation,
            overall_cost_of_living: overall,
        },
        percentage_changes: CategoryIndices {
            housing: housing_change,
            utilities: utilities_change,
            groceries: groceries_change,
            transportation: transportation_change,
            overall_cost_of_living: overall_change,
        },
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::state_profile::fixtures::{maine, national_average};

    #[test]
    fn housing_drop_matches_expected_ratio_and_change() {
        let comparison = compare(&national_average("MA"), &maine()).unwrap();

        assert_eq!(comparison.ratios.housing, dec!(0.890));
        assert_eq!(comparison.percentage_changes.housing, dec!(-11.0));
        assert_eq!(comparison.ratios.housing.to_string(), "0.890");
        assert_eq!(comparison.percentage_changes.housing.to_string(), "-11.0");
    }

    #[test]
    fn all_categories_against_national_average() {
        let comparison = compare(&national_average("MA"), &maine()).unwrap();

        assert_eq!(
            comparison.ratios,
            CategoryIndices {
                housing: dec!(0.890),
                utilities: dec!(1.080),
                groceries: dec!(1.020),
                transportation: dec!(0.950),
                overall_cost_of_living: dec!(0.980),
            }
        );
        assert_eq!(
            comparison.percentage_changes,
            CategoryIndices {
                housing: dec!(-11.0),
                utilities: dec!(8.0),
                groceries: dec!(2.0),
                transportation: dec!(-5.0),
                overall_cost_of_living: dec!(-2.0),
            }
        );
    }

    #[test]
    fn same_state_is_neutral() {
        let comparison = compare(&maine(), &maine()).unwrap();

        for value in [
            comparison.ratios.housing,
            comparison.ratios.utilities,
            comparison.ratios.groceries,
            comparison.ratios.transportation,
            comparison.ratios.overall_cost_of_living,
        ] {
            assert_eq!(value.to_string(), "1.000");
        }
        for value in [
            comparison.percentage_changes.housing,
            comparison.percentage_changes.utilities,
            comparison.percentage_changes.groceries,
            comparison.percentage_changes.transportation,
            comparison.percentage_changes.overall_cost_of_living,
        ] {
            assert_eq!(value.to_string(), "0.0");
        }
    }

    #[test]
    fn percent_change_sign_follows_index_direction() {
        let origin = national_average("MA");
        let mut target = national_average("NH");
        target.housing_index = dec!(118.6);
        target.grocery_index = dec!(88.4);

        let comparison = compare(&origin, &target).unwrap();

        assert!(comparison.percentage_changes.housing > Decimal::ZERO);
        assert!(comparison.percentage_changes.groceries < Decimal::ZERO);
    }

    #[test]
    fn percent_change_uses_unrounded_ratio() {
        // 99.95 / 100 = 0.9995: the ratio rounds to 1.000, but the change is
        // -0.05 and rounds away from zero to -0.1.
        let origin = national_average("MA");
        let mut target = national_average("RI");
        target.utilities_index = dec!(99.95);

        let comparison = compare(&origin, &target).unwrap();

        assert_eq!(comparison.ratios.utilities, dec!(1.000));
        assert_eq!(comparison.percentage_changes.utilities, dec!(-0.1));
    }

    #[test]
    fn zero_origin_index_is_invalid_state_data() {
        let mut origin = national_average("MA");
        origin.transportation_index = Decimal::ZERO;

        let result = compare(&origin, &maine());

        assert_eq!(
            result,
            Err(EstimationError::invalid_state_data("MA", "transportation_index"))
        );
    }

    #[test]
    fn extreme_ratio_is_an_error_not_a_panic() {
        let mut origin = national_average("MA");
        origin.cost_of_living_index = dec!(0.0000001);
        let mut target = maine();
        target.cost_of_living_index = Decimal::MAX;

        let result = compare(&origin, &target);

        assert!(matches!(result, Err(EstimationError::Validation(_))));
    }
}
