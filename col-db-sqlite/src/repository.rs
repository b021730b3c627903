use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use col_core::{
    CalculationNote, FilingStatus, MonthlyExpenses, NewSavedCalculation, RelocationEstimate,
    RepositoryError, SavedCalculation, StateProfile, StateRepository, StateTaxBracket,
    VeteranBenefit,
};
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let mut options = SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            // Every connection to `:memory:` opens a separate database.
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            tracing::debug!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn get_column<'r, T>(
    row: &'r sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {}: {}", column, e)))
}

fn get_json<T: serde::de::DeserializeOwned>(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<T, RepositoryError> {
    let text: String = get_column(row, column)?;
    serde_json::from_str(&text)
        .map_err(|e| RepositoryError::Database(format!("Invalid JSON in {}: {}", column, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Database(e.to_string()))
}

fn row_to_state(row: &sqlx::sqlite::SqliteRow) -> Result<StateProfile, RepositoryError> {
    Ok(StateProfile {
        code: get_column(row, "code")?,
        name: get_column(row, "name")?,
        cost_of_living_index: get_decimal(row, "cost_of_living_index")?,
        housing_index: get_decimal(row, "housing_index")?,
        utilities_index: get_decimal(row, "utilities_index")?,
        grocery_index: get_decimal(row, "grocery_index")?,
        transportation_index: get_decimal(row, "transportation_index")?,
        income_tax_min: get_decimal(row, "income_tax_min")?,
        income_tax_max: get_decimal(row, "income_tax_max")?,
        sales_tax_rate: get_decimal(row, "sales_tax_rate")?,
        property_tax_rate: get_decimal(row, "property_tax_rate")?,
        data_source: get_column(row, "data_source")?,
    })
}

fn row_to_veteran_benefit(row: &sqlx::sqlite::SqliteRow) -> Result<VeteranBenefit, RepositoryError> {
    Ok(VeteranBenefit {
        state_code: get_column(row, "state_code")?,
        property_tax_exemption: get_column(row, "property_tax_exemption")?,
        property_tax_exemption_amount: get_optional_decimal(row, "property_tax_exemption_amount")?,
        homestead_exemption: get_optional_decimal(row, "homestead_exemption")?,
        military_retirement_exempt: get_column(row, "military_retirement_exempt")?,
        disability_compensation_exempt: get_column(row, "disability_compensation_exempt")?,
        vehicle_registration_discount: get_column(row, "vehicle_registration_discount")?,
        hunting_fishing_license_free: get_column(row, "hunting_fishing_license_free")?,
        notes: get_column(row, "notes")?,
    })
}

fn row_to_bracket(row: &sqlx::sqlite::SqliteRow) -> Result<StateTaxBracket, RepositoryError> {
    let status: String = get_column(row, "filing_status")?;
    let filing_status = FilingStatus::parse(&status)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid filing status: {}", status)))?;

    Ok(StateTaxBracket {
        state_code: get_column(row, "state_code")?,
        filing_status,
        upper_bound: get_optional_decimal(row, "upper_bound")?,
        rate: get_decimal(row, "rate")?,
        base_tax: get_decimal(row, "base_tax")?,
        base_lower_bound: get_decimal(row, "base_lower_bound")?,
    })
}

fn row_to_calculation(row: &sqlx::sqlite::SqliteRow) -> Result<SavedCalculation, RepositoryError> {
    let expenses: MonthlyExpenses = get_json(row, "expenses")?;
    let estimate: RelocationEstimate = get_json(row, "estimate")?;

    Ok(SavedCalculation {
        id: get_column(row, "id")?,
        user_id: get_column(row, "user_id")?,
        name: get_column(row, "name")?,
        origin_state: get_column(row, "origin_state")?,
        target_state: get_column(row, "target_state")?,
        expenses,
        gross_annual_income: get_decimal(row, "gross_annual_income")?,
        military_retirement_income: get_decimal(row, "military_retirement_income")?,
        disability_income: get_decimal(row, "disability_income")?,
        estimate,
        is_favorite: get_column(row, "is_favorite")?,
        created_at: get_column(row, "created_at")?,
        updated_at: get_column(row, "updated_at")?,
    })
}

fn row_to_note(row: &sqlx::sqlite::SqliteRow) -> Result<CalculationNote, RepositoryError> {
    Ok(CalculationNote {
        id: get_column(row, "id")?,
        calculation_id: get_column(row, "calculation_id")?,
        note: get_column(row, "note")?,
        created_at: get_column(row, "created_at")?,
    })
}

const CALCULATION_COLUMNS: &str = "id, user_id, name, origin_state, target_state, expenses,
    gross_annual_income, military_retirement_income, disability_income, estimate,
    is_favorite, created_at, updated_at";

#[async_trait]
impl StateRepository for SqliteRepository {
    async fn get_state(
        &self,
        code: &str,
    ) -> Result<StateProfile, RepositoryError> {
        let row = sqlx::query("SELECT * FROM states WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_state(&row)
    }

    async fn list_states(&self) -> Result<Vec<StateProfile>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM states ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_state).collect()
    }

    async fn upsert_state(
        &self,
        state: &StateProfile,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO states (
                code, name, cost_of_living_index, housing_index, utilities_index,
                grocery_index, transportation_index, income_tax_min, income_tax_max,
                sales_tax_rate, property_tax_rate, data_source
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (code) DO UPDATE SET
                name = excluded.name,
                cost_of_living_index = excluded.cost_of_living_index,
                housing_index = excluded.housing_index,
                utilities_index = excluded.utilities_index,
                grocery_index = excluded.grocery_index,
                transportation_index = excluded.transportation_index,
                income_tax_min = excluded.income_tax_min,
                income_tax_max = excluded.income_tax_max,
                sales_tax_rate = excluded.sales_tax_rate,
                property_tax_rate = excluded.property_tax_rate,
                data_source = excluded.data_source",
        )
        .bind(&state.code)
        .bind(&state.name)
        .bind(decimal_to_text(state.cost_of_living_index))
        .bind(decimal_to_text(state.housing_index))
        .bind(decimal_to_text(state.utilities_index))
        .bind(decimal_to_text(state.grocery_index))
        .bind(decimal_to_text(state.transportation_index))
        .bind(decimal_to_text(state.income_tax_min))
        .bind(decimal_to_text(state.income_tax_max))
        .bind(decimal_to_text(state.sales_tax_rate))
        .bind(decimal_to_text(state.property_tax_rate))
        .bind(&state.data_source)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_state(
        &self,
        code: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM states WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_price_parity(
        &self,
        code: &str,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let row = sqlx::query("SELECT rpp FROM price_parities WHERE state_code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(|row| get_decimal(&row, "rpp")).transpose()
    }

    async fn upsert_price_parity(
        &self,
        code: &str,
        rpp: Decimal,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO price_parities (state_code, rpp) VALUES (?, ?)
             ON CONFLICT (state_code) DO UPDATE SET rpp = excluded.rpp",
        )
        .bind(code)
        .bind(decimal_to_text(rpp))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_veteran_benefit(
        &self,
        code: &str,
    ) -> Result<Option<VeteranBenefit>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM veteran_benefits WHERE state_code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(row_to_veteran_benefit).transpose()
    }

    async fn upsert_veteran_benefit(
        &self,
        benefit: &VeteranBenefit,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO veteran_benefits (
                state_code, property_tax_exemption, property_tax_exemption_amount,
                homestead_exemption, military_retirement_exempt,
                disability_compensation_exempt, vehicle_registration_discount,
                hunting_fishing_license_free, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (state_code) DO UPDATE SET
                property_tax_exemption = excluded.property_tax_exemption,
                property_tax_exemption_amount = excluded.property_tax_exemption_amount,
                homestead_exemption = excluded.homestead_exemption,
                military_retirement_exempt = excluded.military_retirement_exempt,
                disability_compensation_exempt = excluded.disability_compensation_exempt,
                vehicle_registration_discount = excluded.vehicle_registration_discount,
                hunting_fishing_license_free = excluded.hunting_fishing_license_free,
                notes = excluded.notes",
        )
        .bind(&benefit.state_code)
        .bind(benefit.property_tax_exemption)
        .bind(benefit.property_tax_exemption_amount.map(decimal_to_text))
        .bind(benefit.homestead_exemption.map(decimal_to_text))
        .bind(benefit.military_retirement_exempt)
        .bind(benefit.disability_compensation_exempt)
        .bind(benefit.vehicle_registration_discount)
        .bind(benefit.hunting_fishing_license_free)
        .bind(&benefit.notes)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_state_tax_brackets(
        &self,
        code: Option<&str>,
    ) -> Result<Vec<StateTaxBracket>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT state_code, filing_status, upper_bound, rate, base_tax, base_lower_bound
             FROM state_tax_brackets
             WHERE ?1 IS NULL OR state_code = ?1
             ORDER BY state_code, filing_status, id",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_bracket).collect()
    }

    async fn insert_state_tax_bracket(
        &self,
        bracket: &StateTaxBracket,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO state_tax_brackets
                (state_code, filing_status, upper_bound, rate, base_tax, base_lower_bound)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&bracket.state_code)
        .bind(bracket.filing_status.as_str())
        .bind(bracket.upper_bound.map(decimal_to_text))
        .bind(decimal_to_text(bracket.rate))
        .bind(decimal_to_text(bracket.base_tax))
        .bind(decimal_to_text(bracket.base_lower_bound))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_state_tax_brackets(
        &self,
        code: &str,
        filing_status: FilingStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM state_tax_brackets WHERE state_code = ? AND filing_status = ?")
            .bind(code)
            .bind(filing_status.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn create_calculation(
        &self,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO saved_calculations (
                user_id, name, origin_state, target_state, expenses,
                gross_annual_income, military_retirement_income, disability_income,
                estimate, is_favorite, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(calc.user_id)
        .bind(&calc.name)
        .bind(calc.origin_state())
        .bind(calc.target_state())
        .bind(to_json(&calc.expenses)?)
        .bind(decimal_to_text(calc.gross_annual_income))
        .bind(decimal_to_text(calc.military_retirement_income))
        .bind(decimal_to_text(calc.disability_income))
        .bind(to_json(&calc.estimate)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();
        self.get_calculation(calc.user_id, id).await
    }

    async fn get_calculation(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<SavedCalculation, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CALCULATION_COLUMNS} FROM saved_calculations WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_calculation(&row)
    }

    async fn list_calculations(
        &self,
        user_id: i64,
    ) -> Result<Vec<SavedCalculation>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CALCULATION_COLUMNS} FROM saved_calculations
             WHERE user_id = ?
             ORDER BY updated_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_calculation).collect()
    }

    async fn update_calculation(
        &self,
        id: i64,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError> {
        let result = sqlx::query(
            "UPDATE saved_calculations
             SET name = ?, origin_state = ?, target_state = ?, expenses = ?,
                 gross_annual_income = ?, military_retirement_income = ?,
                 disability_income = ?, estimate = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(&calc.name)
        .bind(calc.origin_state())
        .bind(calc.target_state())
        .bind(to_json(&calc.expenses)?)
        .bind(decimal_to_text(calc.gross_annual_income))
        .bind(decimal_to_text(calc.military_retirement_income))
        .bind(decimal_to_text(calc.disability_income))
        .bind(to_json(&calc.estimate)?)
        .bind(Utc::now())
        .bind(id)
        .bind(calc.user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_calculation(calc.user_id, id).await
    }

    async fn delete_calculation(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM saved_calculations WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn toggle_favorite(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<SavedCalculation, RepositoryError> {
        let result = sqlx::query(
            "UPDATE saved_calculations
             SET is_favorite = NOT is_favorite, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_calculation(user_id, id).await
    }

    async fn add_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note: &str,
    ) -> Result<CalculationNote, RepositoryError> {
        self.get_calculation(user_id, calculation_id).await?;

        let result = sqlx::query(
            "INSERT INTO calculation_notes (calculation_id, note, created_at) VALUES (?, ?, ?)",
        )
        .bind(calculation_id)
        .bind(note)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.note(user_id, calculation_id, result.last_insert_rowid())
            .await
    }

    async fn list_notes(
        &self,
        user_id: i64,
        calculation_id: i64,
    ) -> Result<Vec<CalculationNote>, RepositoryError> {
        self.get_calculation(user_id, calculation_id).await?;

        let rows = sqlx::query(
            "SELECT id, calculation_id, note, created_at FROM calculation_notes
             WHERE calculation_id = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(calculation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_note).collect()
    }

    async fn update_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
        note: &str,
    ) -> Result<CalculationNote, RepositoryError> {
        let result = sqlx::query(&format!(
            "UPDATE calculation_notes SET note = ?
             WHERE id = ? AND calculation_id = ? AND {NOTE_OWNER}"
        ))
        .bind(note)
        .bind(note_id)
        .bind(calculation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.note(user_id, calculation_id, note_id).await
    }

    async fn delete_note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!(
            "DELETE FROM calculation_notes
             WHERE id = ? AND calculation_id = ? AND {NOTE_OWNER}"
        ))
        .bind(note_id)
        .bind(calculation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Restricts a `calculation_notes` statement to notes on calculations owned
/// by the bound user id.
const NOTE_OWNER: &str = "calculation_id IN (SELECT id FROM saved_calculations WHERE user_id = ?)";

impl SqliteRepository {
    async fn note(
        &self,
        user_id: i64,
        calculation_id: i64,
        note_id: i64,
    ) -> Result<CalculationNote, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT id, calculation_id, note, created_at FROM calculation_notes
             WHERE id = ? AND calculation_id = ? AND {NOTE_OWNER}"
        ))
        .bind(note_id)
        .bind(calculation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_note(&row)
    }
}
