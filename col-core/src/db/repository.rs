use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    CalculationNote, FilingStatus, NewSavedCalculation, SavedCalculation, StateProfile,
    StateTaxBracket, VeteranBenefit,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Reference store and saved-calculation store behind the estimation service.
#[async_trait]
pub trait StateRepository: Send + Sync {
    // States
    async fn get_state(&self, code: &str) -> Result<StateProfile, RepositoryError>;
    /// All states ordered by name.
    async fn list_states(&self) -> Result<Vec<StateProfile>, RepositoryError>;
    async fn upsert_state(&self, state: &StateProfile) -> Result<(), RepositoryError>;
    async fn delete_state(&self, code: &str) -> Result<(), RepositoryError>;

    // Regional price parities
    async fn get_price_parity(&self, code: &str) -> Result<Option<Decimal>, RepositoryError>;
    async fn upsert_price_parity(
        &self,
        code: &str,
        rpp: Decimal,
    ) -> Result<(), RepositoryError>;

    // Veteran benefits
    async fn get_veteran_benefit(
        &self,
        code: &str,
    ) -> Result<Option<VeteranBenefit>, RepositoryError>;
    async fn upsert_veteran_benefit(
        &self,
        benefit: &VeteranBenefit,
    ) -> Result<(), RepositoryError>;

    // Income tax brackets
    /// Brackets for one state, or every state when `code` is `None`.
    async fn list_state_tax_brackets(
        &self,
        code: Option<&str>,
    ) -> Result<Vec<StateTaxBracket>, RepositoryError>;
    async fn insert_state_tax_bracket(
        &self,
        bracket: &StateTaxBracket,
    ) -> Result<(), RepositoryError>;
    async fn delete_state_tax_brackets(
        &self,
        code: &str,
        filing_status: FilingStatus,
    ) -> Result<(), RepositoryError>;

    // Saved calculations
    //
    // Every lookup is scoped to the owning user: a calculation that exists
    // but belongs to someone else is reported as `NotFound`.
    async fn create_calculation(
        &self,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError>;

    async fn get_calculation(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<SavedCalculation, RepositoryError>;

    /// A user's calculations, most recently updated first.
    async fn list_calculations(
        &self,
        user_id: i64,
    ) -> Result<Vec<SavedCalculation>, RepositoryError>;

    /// Replaces the inputs and estimate of calculation `id` owned by
    /// `calc.user_id`. The favorite flag and creation time are kept.
    async fn update_calculation(
        &self,
        id: i64,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError>;

    /// Deletes the calculation and its notes.
    async fn delete_calculation(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<(), RepositoryError>;

    /// Flips the favorite flag and returns the updated record.
    async fn toggle_favorite(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<SavedCalculation, RepositoryError>;

    // Calculation notes
    async fn add_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note: &str,
    ) -> Result<CalculationNote, RepositoryError>;

    /// Notes on one calculation, newest first.
    async fn list_notes(
        &self,
        user_id: i64,
        calculation_id: i64,
    ) -> Result<Vec<CalculationNote>, RepositoryError>;

    async fn update_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
        note: &str,
    ) -> Result<CalculationNote, RepositoryError>;

    async fn delete_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
    ) -> Result<(), RepositoryError>;
}
