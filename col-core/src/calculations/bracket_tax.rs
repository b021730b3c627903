//! State income tax: progressive bracket evaluation and the policy that picks
//! between no-tax, bracket and flat-rate treatment for a state.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use col_core::calculations::bracket_tax::evaluate_bracket_tax;
//! use col_core::{FilingStatus, StateTaxBracket};
//!
//! let bracket = |upper, rate, base_tax, base_lower_bound| StateTaxBracket {
//!     state_code: "ME".to_string(),
//!     filing_status: FilingStatus::Single,
//!     upper_bound: upper,
//!     rate,
//!     base_tax,
//!     base_lower_bound,
//! };
//! let brackets = vec![
//!     bracket(Some(dec!(24500)), dec!(0.058), dec!(0), dec!(0)),
//!     bracket(Some(dec!(58650)), dec!(0.0675), dec!(1421), dec!(24500)),
//!     bracket(None, dec!(0.0715), dec!(3726.125), dec!(58650)),
//! ];
//!
//! assert_eq!(evaluate_bracket_tax(dec!(30000), &brackets), Ok(dec!(1792.25)));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{checked_add, checked_mul, checked_sub, round_half_up};
use crate::error::EstimationError;
use crate::models::{FilingStatus, StateProfile, StateTaxBracket};

/// Field named in errors about a state's bracket table.
pub const BRACKETS_FIELD: &str = "income_tax_brackets";

/// Orders brackets by ascending upper bound with the unbounded bracket last.
fn ordered(brackets: &[StateTaxBracket]) -> Vec<&StateTaxBracket> {
    let mut sorted: Vec<_> = brackets.iter().collect();
    sorted.sort_by_key(|b| (b.upper_bound.is_none(), b.upper_bound));
    sorted
}

/// Calculates tax on `taxable_income` from a progressive bracket table.
///
/// The first bracket (by ascending upper bound) whose upper bound is at least
/// the income applies; tax is `base_tax + (income - base_lower_bound) * rate`.
///
/// # Errors
///
/// [`EstimationError::NoMatchingBracket`] if the table is empty or the income
/// exceeds every bounded bracket and there is no open-ended one.
pub fn evaluate_bracket_tax(
    taxable_income: Decimal,
    brackets: &[StateTaxBracket],
) -> Result<Decimal, EstimationError> {
    if taxable_income <= Decimal::ZERO {
        return Ok(round_half_up(Decimal::ZERO));
    }

    let bracket = ordered(brackets)
        .into_iter()
        .find(|b| b.upper_bound.is_none_or(|upper| taxable_income <= upper))
        .ok_or(EstimationError::NoMatchingBracket(taxable_income))?;

    let over_base = checked_sub(taxable_income, bracket.base_lower_bound)?;
    let tax = checked_add(bracket.base_tax, checked_mul(over_base, bracket.rate)?)?;

    Ok(round_half_up(tax))
}

/// Checks a single state's table: strictly ascending bounds, at most one
/// open-ended bracket, non-negative rates, and each lower bound equal to the
/// previous bracket's upper bound.
pub fn validate_bracket_table(
    state_code: &str,
    brackets: &[StateTaxBracket],
) -> Result<(), EstimationError> {
    let invalid = || EstimationError::invalid_state_data(state_code, BRACKETS_FIELD);

    if brackets.is_empty() {
        return Err(invalid());
    }

    let sorted = ordered(brackets);
    let mut previous_upper: Option<Decimal> = None;
    for (idx, bracket) in sorted.iter().enumerate() {
        if bracket.rate < Decimal::ZERO || bracket.base_tax < Decimal::ZERO {
            return Err(invalid());
        }
        if bracket.upper_bound.is_none() && idx + 1 != sorted.len() {
            return Err(invalid());
        }
        if let Some(prev) = previous_upper {
            if bracket.base_lower_bound != prev {
                return Err(invalid());
            }
            if bracket.upper_bound.is_some_and(|upper| upper <= prev) {
                return Err(invalid());
            }
        }
        previous_upper = bracket.upper_bound;
    }

    Ok(())
}

/// Data-driven state income tax policy.
///
/// The evaluator itself knows nothing about particular states: which states
/// levy no income tax, their flat rates and their bracket tables all come
/// from configuration or the reference store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxPolicy {
    pub no_income_tax_states: BTreeSet<String>,
    /// Approximate flat rates (fractions) for states without a bracket table.
    pub flat_rates: BTreeMap<String, Decimal>,
    /// Flat rate for states with neither a table nor a configured rate.
    pub default_flat_rate: Decimal,
    #[serde(skip)]
    bracket_tables: HashMap<(String, FilingStatus), Vec<StateTaxBracket>>,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            no_income_tax_states: ["AK", "FL", "NV", "NH", "SD", "TN", "TX", "WA", "WY"]
                .into_iter()
                .map(String::from)
                .collect(),
            flat_rates: BTreeMap::from([
                ("MA".to_string(), Decimal::new(5, 2)),
                ("NC".to_string(), Decimal::new(475, 4)),
            ]),
            default_flat_rate: Decimal::new(45, 3),
            bracket_tables: HashMap::new(),
        }
    }
}

impl TaxPolicy {
    /// Registers bracket rows, grouped by state and filing status. A group
    /// replaces any table previously registered for the same key.
    ///
    /// # Errors
    ///
    /// [`EstimationError::InvalidStateData`] if any group fails
    /// [`validate_bracket_table`]; nothing is registered in that case.
    pub fn register_brackets(
        &mut self,
        brackets: Vec<StateTaxBracket>,
    ) -> Result<(), EstimationError> {
        let mut groups: HashMap<(String, FilingStatus), Vec<StateTaxBracket>> = HashMap::new();
        for mut bracket in brackets {
            bracket.state_code = bracket.state_code.to_ascii_uppercase();
            groups
                .entry((bracket.state_code.clone(), bracket.filing_status))
                .or_default()
                .push(bracket);
        }

        for ((state_code, _), table) in &groups {
            validate_bracket_table(state_code, table)?;
        }

        for (key, table) in groups {
            tracing::debug!(state = %key.0, filing_status = %key.1, rows = table.len(), "registered bracket table");
            self.bracket_tables.insert(key, table);
        }
        Ok(())
    }

    /// Number of registered (state, filing status) tables.
    pub fn bracket_table_count(&self) -> usize {
        self.bracket_tables.len()
    }

    /// The table for `state_code` and `filing_status`, falling back to the
    /// state's `Single` table.
    pub fn brackets_for(
        &self,
        state_code: &str,
        filing_status: FilingStatus,
    ) -> Option<&[StateTaxBracket]> {
        let code = state_code.to_ascii_uppercase();
        self.bracket_tables
            .get(&(code.clone(), filing_status))
            .or_else(|| self.bracket_tables.get(&(code, FilingStatus::Single)))
            .map(Vec::as_slice)
    }

    pub fn is_no_income_tax_state(
        &self,
        state_code: &str,
    ) -> bool {
        self.no_income_tax_states
            .contains(&state_code.to_ascii_uppercase())
    }

    pub fn flat_rate_for(
        &self,
        state_code: &str,
    ) -> Decimal {
        self.flat_rates
            .get(&state_code.to_ascii_uppercase())
            .copied()
            .unwrap_or(self.default_flat_rate)
    }

    /// Annual state income tax on `taxable_income` for `state`.
    ///
    /// 1. No-tax states (configured, or a zero top rate on the profile) pay 0.
    /// 2. States with a registered bracket table use [`evaluate_bracket_tax`].
    /// 3. Everything else pays the state's flat rate, or the default rate.
    ///
    /// No deductions or exemptions are modeled; the taxable income is applied
    /// as given.
    pub fn annual_income_tax(
        &self,
        state: &StateProfile,
        filing_status: FilingStatus,
        taxable_income: Decimal,
    ) -> Result<Decimal, EstimationError> {
        if self.is_no_income_tax_state(&state.code) || state.has_no_state_income_tax() {
            return Ok(round_half_up(Decimal::ZERO));
        }
        if taxable_income <= Decimal::ZERO {
            return Ok(round_half_up(Decimal::ZERO));
        }

        if let Some(brackets) = self.brackets_for(&state.code, filing_status) {
            return evaluate_bracket_tax(taxable_income, brackets).map_err(|e| match e {
                EstimationError::NoMatchingBracket(_) => {
                    EstimationError::invalid_state_data(&state.code, BRACKETS_FIELD)
                }
                other => other,
            });
        }

        let rate = self.flat_rate_for(&state.code);
        Ok(round_half_up(checked_mul(taxable_income, rate)?))
    }
}
