//! In-process [`StateRepository`] used by unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::repository::{RepositoryError, StateRepository};
use crate::models::{
    CalculationNote, FilingStatus, NewSavedCalculation, SavedCalculation, StateProfile,
    StateTaxBracket, VeteranBenefit,
};

#[derive(Default)]
struct Tables {
    states: BTreeMap<String, StateProfile>,
    rpp: BTreeMap<String, Decimal>,
    benefits: BTreeMap<String, VeteranBenefit>,
    brackets: Vec<StateTaxBracket>,
    calculations: BTreeMap<i64, SavedCalculation>,
    notes: BTreeMap<i64, CalculationNote>,
    next_id: i64,
}

impl Tables {
    fn owned_mut(
        &mut self,
        user_id: i64,
        id: i64,
    ) -> Result<&mut SavedCalculation, RepositoryError> {
        self.calculations
            .get_mut(&id)
            .filter(|c| c.user_id == user_id)
            .ok_or(RepositoryError::NotFound)
    }

    fn owned_note_mut(
        &mut self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
    ) -> Result<&mut CalculationNote, RepositoryError> {
        self.owned_mut(user_id, calculation_id)?;
        self.notes
            .get_mut(&note_id)
            .filter(|n| n.calculation_id == calculation_id)
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn with_states(states: impl IntoIterator<Item = StateProfile>) -> Self {
        let repo = Self::default();
        {
            let mut tables = repo.lock();
            for state in states {
                tables.states.insert(state.code.clone(), state);
            }
        }
        repo
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StateRepository for MemoryRepository {
    async fn get_state(&self, code: &str) -> Result<StateProfile, RepositoryError> {
        self.lock().states.get(code).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn list_states(&self) -> Result<Vec<StateProfile>, RepositoryError> {
        let mut states: Vec<_> = self.lock().states.values().cloned().collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(states)
    }

    async fn upsert_state(&self, state: &StateProfile) -> Result<(), RepositoryError> {
        self.lock().states.insert(state.code.clone(), state.clone());
        Ok(())
    }

    async fn delete_state(&self, code: &str) -> Result<(), RepositoryError> {
        self.lock()
            .states
            .remove(code)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_price_parity(&self, code: &str) -> Result<Option<Decimal>, RepositoryError> {
        Ok(self.lock().rpp.get(code).copied())
    }

    async fn upsert_price_parity(
        &self,
        code: &str,
        rpp: Decimal,
    ) -> Result<(), RepositoryError> {
        self.lock().rpp.insert(code.to_string(), rpp);
        Ok(())
    }

    async fn get_veteran_benefit(
        &self,
        code: &str,
    ) -> Result<Option<VeteranBenefit>, RepositoryError> {
        Ok(self.lock().benefits.get(code).cloned())
    }

    async fn upsert_veteran_benefit(
        &self,
        benefit: &VeteranBenefit,
    ) -> Result<(), RepositoryError> {
        self.lock()
            .benefits
            .insert(benefit.state_code.clone(), benefit.clone());
        Ok(())
    }

    async fn list_state_tax_brackets(
        &self,
        code: Option<&str>,
    ) -> Result<Vec<StateTaxBracket>, RepositoryError> {
        Ok(self
            .lock()
            .brackets
            .iter()
            .filter(|b| code.is_none_or(|c| b.state_code == c))
            .cloned()
            .collect())
    }

    async fn insert_state_tax_bracket(
        &self,
        bracket: &StateTaxBracket,
    ) -> Result<(), RepositoryError> {
        self.lock().brackets.push(bracket.clone());
        Ok(())
    }

    async fn delete_state_tax_brackets(
        &self,
        code: &str,
        filing_status: FilingStatus,
    ) -> Result<(), RepositoryError> {
        self.lock()
            .brackets
            .retain(|b| !(b.state_code == code && b.filing_status == filing_status));
        Ok(())
    }

    async fn create_calculation(
        &self,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError> {
        let mut tables = self.lock();
        tables.next_id += 1;
        let now = Utc::now();
        let saved = SavedCalculation {
            id: tables.next_id,
            user_id: calc.user_id,
            name: calc.name,
            origin_state: calc.estimate.origin_state.clone(),
            target_state: calc.estimate.target_state.clone(),
            expenses: calc.expenses,
            gross_annual_income: calc.gross_annual_income,
            military_retirement_income: calc.military_retirement_income,
            disability_income: calc.disability_income,
            estimate: calc.estimate,
            is_favorite: false,
            created_at: now,
            updated_at: now,
        };
        tables.calculations.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn get_calculation(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<SavedCalculation, RepositoryError> {
        Ok(self.lock().owned_mut(user_id, id)?.clone())
    }

    async fn list_calculations(
        &self,
        user_id: i64,
    ) -> Result<Vec<SavedCalculation>, RepositoryError> {
        let mut calcs: Vec<_> = self
            .lock()
            .calculations
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        calcs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(calcs)
    }

    async fn update_calculation(
        &self,
        id: i64,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError> {
        let mut tables = self.lock();
        let saved = tables.owned_mut(calc.user_id, id)?;
        saved.name = calc.name;
        saved.origin_state = calc.estimate.origin_state.clone();
        saved.target_state = calc.estimate.target_state.clone();
        saved.expenses = calc.expenses;
        saved.gross_annual_income = calc.gross_annual_income;
        saved.military_retirement_income = calc.military_retirement_income;
        saved.disability_income = calc.disability_income;
        saved.estimate = calc.estimate;
        saved.updated_at = Utc::now();
        Ok(saved.clone())
    }

    async fn delete_calculation(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        tables.owned_mut(user_id, id)?;
        tables.calculations.remove(&id);
        tables.notes.retain(|_, note| note.calculation_id != id);
        Ok(())
    }

    async fn toggle_favorite(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<SavedCalculation, RepositoryError> {
        let mut tables = self.lock();
        let calc = tables.owned_mut(user_id, id)?;
        calc.is_favorite = !calc.is_favorite;
        calc.updated_at = Utc::now();
        Ok(calc.clone())
    }

    async fn add_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note: &str,
    ) -> Result<CalculationNote, RepositoryError> {
        let mut tables = self.lock();
        tables.owned_mut(user_id, calculation_id)?;
        tables.next_id += 1;
        let saved = CalculationNote {
            id: tables.next_id,
            calculation_id,
            note: note.to_string(),
            created_at: Utc::now(),
        };
        tables.notes.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn list_notes(
        &self,
        user_id: i64,
        calculation_id: i64,
    ) -> Result<Vec<CalculationNote>, RepositoryError> {
        let mut tables = self.lock();
        tables.owned_mut(user_id, calculation_id)?;
        let mut notes: Vec<_> = tables
            .notes
            .values()
            .filter(|n| n.calculation_id == calculation_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notes)
    }

    async fn update_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
        note: &str,
    ) -> Result<CalculationNote, RepositoryError> {
        let mut tables = self.lock();
        let saved = tables.owned_note_mut(user_id, calculation_id, note_id)?;
        saved.note = note.to_string();
        Ok(saved.clone())
    }

    async fn delete_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        tables.owned_note_mut(user_id, calculation_id, note_id)?;
        tables.notes.remove(&note_id);
        Ok(())
    }
}
