//! Full tax-and-expense estimate for a move between two states.

use rust_decimal::Decimal;

use crate::calculations::bracket_tax::TaxPolicy;
use crate::calculations::common::{
    RATIO_DP, checked_add, checked_mul, checked_sub, checked_sum, out_of_range, round_dp_half_up,
    round_half_up, scale,
};
use crate::calculations::{comparison, relocation};
use crate::error::EstimationError;
use crate::models::{
    CategoryEstimate, EstimationRequest, EstimationResult, IndexComparison, MonthlyExpenses,
    ReferenceData, RelocationEstimate, StateProfile, VeteranBenefit,
};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Price parity used when a state has no recorded index.
pub const DEFAULT_RPP: Decimal = Decimal::ONE_HUNDRED;

/// Entry point for the estimation engine.
///
/// Holds only a borrowed [`TaxPolicy`]; every method is a pure function of
/// its arguments.
#[derive(Debug, Clone, Copy)]
pub struct Estimator<'a> {
    policy: &'a TaxPolicy,
}

impl<'a> Estimator<'a> {
    pub fn new(policy: &'a TaxPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TaxPolicy {
        self.policy
    }

    pub fn compare(
        &self,
        origin: &StateProfile,
        target: &StateProfile,
    ) -> Result<IndexComparison, EstimationError> {
        comparison::compare(origin, target)
    }

    pub fn estimate_relocation(
        &self,
        current: &MonthlyExpenses,
        origin: &StateProfile,
        target: &StateProfile,
    ) -> Result<RelocationEstimate, EstimationError> {
        relocation::estimate_relocation(current, origin, target)
    }

    /// Annual income tax `state` levies on the request's income, after the
    /// state's veteran income exemptions.
    pub fn annual_income_tax(
        &self,
        request: &EstimationRequest,
        state: &StateProfile,
        benefits: Option<&VeteranBenefit>,
    ) -> Result<Decimal, EstimationError> {
        let taxable_income = taxable_income(request, state, benefits)?;
        self.policy
            .annual_income_tax(state, request.filing_status, taxable_income)
    }

    /// Runs the full estimate.
    ///
    /// # Errors
    ///
    /// * [`EstimationError::Validation`] for negative or out-of-range
    ///   amounts.
    /// * [`EstimationError::InvalidStateData`] for unusable indices, a
    ///   non-positive price parity or a broken bracket table.
    pub fn estimate(
        &self,
        request: &EstimationRequest,
        reference: &ReferenceData,
    ) -> Result<EstimationResult, EstimationError> {
        request.validate()?;

        let (origin_rpp, origin_rpp_defaulted) = resolve_rpp(&request.origin, reference.origin_rpp)?;
        let (target_rpp, target_rpp_defaulted) = resolve_rpp(&request.target, reference.target_rpp)?;

        let categories = request
            .expenses
            .iter()
            .map(|item| {
                Ok(CategoryEstimate {
                    category: item.category,
                    current_amount: round_half_up(item.amount_monthly),
                    new_amount: scale(item.amount_monthly, target_rpp, origin_rpp)?,
                })
            })
            .collect::<Result<Vec<_>, EstimationError>>()?;

        let price_parity_ratio = round_dp_half_up(
            target_rpp.checked_div(origin_rpp).ok_or_else(out_of_range)?,
            RATIO_DP,
        );

        let monthly_sales_tax_from = round_half_up(checked_mul(
            request.taxable_monthly_spend,
            request.origin.sales_tax_fraction(),
        )?);
        let monthly_sales_tax_target = round_half_up(checked_mul(
            request.taxable_monthly_spend,
            request.target.sales_tax_fraction(),
        )?);

        let annual_income_tax_origin = self.annual_income_tax(
            request,
            &request.origin,
            reference.origin_benefits.as_ref(),
        )?;
        let annual_income_tax_target = self.annual_income_tax(
            request,
            &request.target,
            reference.target_benefits.as_ref(),
        )?;

        let monthly_tax_origin = round_half_up(annual_income_tax_origin / MONTHS_PER_YEAR);
        let monthly_tax_target = round_half_up(annual_income_tax_target / MONTHS_PER_YEAR);
        let monthly_tax_delta = round_half_up(
            checked_sub(annual_income_tax_target, annual_income_tax_origin)? / MONTHS_PER_YEAR,
        );

        let current_sum = checked_sum(categories.iter().map(|c| c.current_amount))?;
        let new_sum = checked_sum(categories.iter().map(|c| c.new_amount))?;
        let total_now =
            round_half_up(checked_sum([current_sum, monthly_tax_origin, monthly_sales_tax_from])?);
        let total_target =
            round_half_up(checked_sum([new_sum, monthly_tax_target, monthly_sales_tax_target])?);
        let delta = round_half_up(checked_sub(total_target, total_now)?);

        tracing::debug!(
            origin = %request.origin.code,
            target = %request.target.code,
            %price_parity_ratio,
            %total_now,
            %total_target,
            %delta,
            "estimated move"
        );

        Ok(EstimationResult {
            origin_state: request.origin.code.clone(),
            target_state: request.target.code.clone(),
            categories,
            price_parity_ratio,
            origin_rpp_defaulted,
            target_rpp_defaulted,
            annual_income_tax_origin,
            annual_income_tax_target,
            monthly_tax_delta,
            monthly_sales_tax_from,
            monthly_sales_tax_target,
            total_now,
            total_target,
            delta,
        })
    }
}

/// Uses the recorded price parity, or [`DEFAULT_RPP`] when there is none.
/// The flag reports whether the default was used.
fn resolve_rpp(
    state: &StateProfile,
    recorded: Option<Decimal>,
) -> Result<(Decimal, bool), EstimationError> {
    match recorded {
        Some(rpp) if rpp <= Decimal::ZERO => {
            Err(EstimationError::invalid_state_data(&state.code, "rpp"))
        }
        Some(rpp) => Ok((rpp, false)),
        None => {
            tracing::warn!(state = %state.code, "no price parity recorded, assuming {DEFAULT_RPP}");
            Ok((DEFAULT_RPP, true))
        }
    }
}

/// Income `state` would tax: gross income plus military retirement and VA
/// disability income unless the state exempts them.
fn taxable_income(
    request: &EstimationRequest,
    state: &StateProfile,
    benefits: Option<&VeteranBenefit>,
) -> Result<Decimal, EstimationError> {
    let assumed;
    let benefits = match benefits {
        Some(benefits) => benefits,
        None => {
            assumed = VeteranBenefit::assumed(&state.code);
            &assumed
        }
    };

    let mut income = request.gross_annual_income;
    if !benefits.military_retirement_exempt {
        income = checked_add(income, request.military_retirement_income)?;
    }
    if !benefits.disability_compensation_exempt {
        income = checked_add(income, request.disability_income)?;
    }
    Ok(income)
}
