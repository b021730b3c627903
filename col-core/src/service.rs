//! Async facade that resolves state codes through a [`StateRepository`] and
//! runs the estimation engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::validate_amount;
use crate::calculations::{DashboardSummary, Estimator, TaxPolicy};
use crate::db::{RepositoryError, StateRepository};
use crate::error::EstimationError;
use crate::models::{
    CalculationNote, EstimationInput, EstimationResult, IndexComparison, MonthlyExpenses,
    NewSavedCalculation, ReferenceData, RelocationEstimate, SavedCalculation, StateProfile,
};

#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    #[error(transparent)]
    Estimation(#[from] EstimationError),

    #[error("repository failure: {0}")]
    Repository(#[from] RepositoryError),
}

/// Input for the six-expense relocation estimate, optionally saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationScenario {
    pub from_state: String,
    pub target_state: String,
    pub expenses: MonthlyExpenses,
    #[serde(default)]
    pub gross_annual_income: Decimal,
    #[serde(default)]
    pub military_retirement_income: Decimal,
    #[serde(default)]
    pub disability_income: Decimal,
}

impl From<&SavedCalculation> for RelocationScenario {
    fn from(calc: &SavedCalculation) -> Self {
        Self {
            from_state: calc.origin_state.clone(),
            target_state: calc.target_state.clone(),
            expenses: calc.expenses.clone(),
            gross_annual_income: calc.gross_annual_income,
            military_retirement_income: calc.military_retirement_income,
            disability_income: calc.disability_income,
        }
    }
}

fn non_blank<'s>(
    what: &str,
    text: &'s str,
) -> Result<&'s str, EstimationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(EstimationError::Validation(format!("{what} must not be empty")));
    }
    Ok(text)
}

/// Upper-cases a state code and checks it is two ASCII letters.
pub fn normalize_state_code(code: &str) -> Result<String, EstimationError> {
    let code = code.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(EstimationError::Validation(format!(
            "state code must be two letters (got '{code}')"
        )))
    }
}

pub struct EstimationService<'a> {
    repo: &'a dyn StateRepository,
    policy: TaxPolicy,
}

impl<'a> EstimationService<'a> {
    pub fn new(
        repo: &'a dyn StateRepository,
        policy: TaxPolicy,
    ) -> Self {
        Self { repo, policy }
    }

    /// Builds a service whose policy also carries every bracket table in
    /// the repository.
    pub async fn with_stored_brackets(
        repo: &'a dyn StateRepository,
        base: TaxPolicy,
    ) -> Result<Self, ServiceError> {
        let policy = Self::load_policy(repo, base).await?;
        Ok(Self::new(repo, policy))
    }

    /// Registers every bracket table held by `repo` into `base`.
    pub async fn load_policy(
        repo: &dyn StateRepository,
        mut base: TaxPolicy,
    ) -> Result<TaxPolicy, ServiceError> {
        let brackets = repo.list_state_tax_brackets(None).await?;
        let rows = brackets.len();
        base.register_brackets(brackets)?;
        tracing::info!(
            rows,
            tables = base.bracket_table_count(),
            "loaded income tax brackets"
        );
        Ok(base)
    }

    pub fn policy(&self) -> &TaxPolicy {
        &self.policy
    }

    /// Looks up a state, mapping a missing record to
    /// [`EstimationError::UnknownState`].
    pub async fn state(
        &self,
        code: &str,
    ) -> Result<StateProfile, ServiceError> {
        let code = normalize_state_code(code)?;
        match self.repo.get_state(&code).await {
            Ok(state) => Ok(state),
            Err(RepositoryError::NotFound) => Err(EstimationError::UnknownState(code).into()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_states(&self) -> Result<Vec<StateProfile>, ServiceError> {
        Ok(self.repo.list_states().await?)
    }

    pub async fn compare_states(
        &self,
        from: &str,
        to: &str,
    ) -> Result<IndexComparison, ServiceError> {
        let origin = self.state(from).await?;
        let target = self.state(to).await?;
        Ok(Estimator::new(&self.policy).compare(&origin, &target)?)
    }

    pub async fn estimate_relocation(
        &self,
        from: &str,
        to: &str,
        expenses: &MonthlyExpenses,
    ) -> Result<RelocationEstimate, ServiceError> {
        let origin = self.state(from).await?;
        let target = self.state(to).await?;
        Ok(Estimator::new(&self.policy).estimate_relocation(expenses, &origin, &target)?)
    }

    /// Resolves both states, their price parities and veteran benefits, then
    /// runs the full estimate.
    pub async fn estimate(
        &self,
        input: EstimationInput,
    ) -> Result<EstimationResult, ServiceError> {
        let origin = self.state(&input.from_state).await?;
        let target = self.state(&input.target_state).await?;

        let reference = ReferenceData {
            origin_rpp: self.repo.get_price_parity(&origin.code).await?,
            target_rpp: self.repo.get_price_parity(&target.code).await?,
            origin_benefits: self.repo.get_veteran_benefit(&origin.code).await?,
            target_benefits: self.repo.get_veteran_benefit(&target.code).await?,
        };

        let request = input.into_request(origin, target)?;
        Ok(Estimator::new(&self.policy).estimate(&request, &reference)?)
    }

    async fn build_calculation(
        &self,
        user_id: i64,
        name: &str,
        scenario: RelocationScenario,
    ) -> Result<NewSavedCalculation, ServiceError> {
        let name = non_blank("calculation name", name)?;
        for (field, amount) in [
            ("gross_annual_income", scenario.gross_annual_income),
            ("military_retirement_income", scenario.military_retirement_income),
            ("disability_income", scenario.disability_income),
        ] {
            validate_amount(field, amount)?;
        }

        let estimate = self
            .estimate_relocation(&scenario.from_state, &scenario.target_state, &scenario.expenses)
            .await?;

        Ok(NewSavedCalculation {
            user_id,
            name: name.to_string(),
            expenses: scenario.expenses,
            gross_annual_income: scenario.gross_annual_income,
            military_retirement_income: scenario.military_retirement_income,
            disability_income: scenario.disability_income,
            estimate,
        })
    }

    /// Estimates `scenario` and stores the result for `user_id`.
    pub async fn save_relocation(
        &self,
        user_id: i64,
        name: &str,
        scenario: RelocationScenario,
    ) -> Result<SavedCalculation, ServiceError> {
        let calc = self.build_calculation(user_id, name, scenario).await?;
        let saved = self.repo.create_calculation(calc).await?;

        tracing::info!(id = saved.id, user_id, name = %saved.name, "saved calculation");
        Ok(saved)
    }

    pub async fn calculation(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<SavedCalculation, ServiceError> {
        Ok(self.repo.get_calculation(user_id, id).await?)
    }

    pub async fn calculations(
        &self,
        user_id: i64,
    ) -> Result<Vec<SavedCalculation>, ServiceError> {
        Ok(self.repo.list_calculations(user_id).await?)
    }

    /// Re-estimates calculation `id` from `scenario` against the current
    /// state data and stores the new inputs and result.
    pub async fn update_relocation(
        &self,
        user_id: i64,
        id: i64,
        name: &str,
        scenario: RelocationScenario,
    ) -> Result<SavedCalculation, ServiceError> {
        self.repo.get_calculation(user_id, id).await?;
        let calc = self.build_calculation(user_id, name, scenario).await?;
        let updated = self.repo.update_calculation(id, calc).await?;

        tracing::info!(id, user_id, "updated calculation");
        Ok(updated)
    }

    /// Saves a re-estimated copy named "Copy of <name>". Notes and the
    /// favorite flag are not copied.
    pub async fn duplicate_calculation(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<SavedCalculation, ServiceError> {
        let original = self.repo.get_calculation(user_id, id).await?;
        let name = format!("Copy of {}", original.name);
        self.save_relocation(user_id, &name, RelocationScenario::from(&original))
            .await
    }

    pub async fn delete_calculation(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<(), ServiceError> {
        self.repo.delete_calculation(user_id, id).await?;
        tracing::info!(id, user_id, "deleted calculation");
        Ok(())
    }

    pub async fn toggle_favorite(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<SavedCalculation, ServiceError> {
        Ok(self.repo.toggle_favorite(user_id, id).await?)
    }

    pub async fn add_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note: &str,
    ) -> Result<CalculationNote, ServiceError> {
        let note = non_blank("note", note)?;
        Ok(self.repo.add_note(user_id, calculation_id, note).await?)
    }

    pub async fn notes(
        &self,
        user_id: i64,
        calculation_id: i64,
    ) -> Result<Vec<CalculationNote>, ServiceError> {
        Ok(self.repo.list_notes(user_id, calculation_id).await?)
    }

    pub async fn update_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
        note: &str,
    ) -> Result<CalculationNote, ServiceError> {
        let note = non_blank("note", note)?;
        Ok(self
            .repo
            .update_note(user_id, calculation_id, note_id, note)
            .await?)
    }

    pub async fn delete_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
    ) -> Result<(), ServiceError> {
        Ok(self
            .repo
            .delete_note(user_id, calculation_id, note_id)
            .await?)
    }

    pub async fn dashboard(
        &self,
        user_id: i64,
    ) -> Result<DashboardSummary, ServiceError> {
        let calculations = self.repo.list_calculations(user_id).await?;
        Ok(DashboardSummary::from_calculations(&calculations))
    }
}
