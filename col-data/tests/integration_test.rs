//! Loads the test CSVs into an in-memory SQLite database and runs estimates
//! against the stored reference data.

use col_core::{EstimationInput, EstimationService, FilingStatus, StateRepository, TaxPolicy};
use col_data::{LoaderError, PriceParityLoader, StateBracketLoader, StateProfileLoader};
use col_db_sqlite::SqliteRepository;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const STATES_CSV: &str = include_str!("../test-data/states.csv");
const RPP_CSV: &str = include_str!("../test-data/price_parities.csv");
const BRACKETS_CSV: &str = include_str!("../test-data/state_tax_brackets.csv");

/// Migrated database with no reference rows.
async fn setup_empty_db() -> SqliteRepository {
    let repo = SqliteRepository::new("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");
    repo
}

async fn load_states(repo: &SqliteRepository) {
    let records = StateProfileLoader::parse(STATES_CSV.as_bytes()).expect("Failed to parse states");
    StateProfileLoader::load(repo, &records)
        .await
        .expect("Failed to load states");
}

async fn setup_loaded_db() -> SqliteRepository {
    let repo = setup_empty_db().await;
    load_states(&repo).await;

    let rpp = PriceParityLoader::parse(RPP_CSV.as_bytes()).expect("Failed to parse rpp");
    PriceParityLoader::load(&repo, &rpp)
        .await
        .expect("Failed to load rpp");

    let brackets = StateBracketLoader::parse(BRACKETS_CSV.as_bytes()).expect("Failed to parse brackets");
    StateBracketLoader::load(&repo, &brackets)
        .await
        .expect("Failed to load brackets");

    repo
}

#[tokio::test]
async fn loads_every_table() {
    let repo = setup_loaded_db().await;

    let states = repo.list_states().await.unwrap();
    let names: Vec<_> = states.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Maine", "Massachusetts", "New Hampshire", "North Carolina", "Texas"]
    );
    assert_eq!(states[0].data_source, "test");

    assert_eq!(repo.get_price_parity("MA").await.unwrap(), Some(dec!(108.9)));

    let brackets = repo.list_state_tax_brackets(Some("ME")).await.unwrap();
    assert_eq!(brackets.len(), 3);
    assert!(brackets.iter().all(|b| b.filing_status == FilingStatus::Single));
    assert_eq!(brackets[2].base_tax.to_string(), "3726.125");
}

#[tokio::test]
async fn reloading_brackets_replaces_rows() {
    let repo = setup_loaded_db().await;
    let records = StateBracketLoader::parse(BRACKETS_CSV.as_bytes()).unwrap();

    let inserted = StateBracketLoader::load(&repo, &records).await.unwrap();

    assert_eq!(inserted, 3);
    assert_eq!(repo.list_state_tax_brackets(Some("ME")).await.unwrap().len(), 3);
}

#[tokio::test]
async fn brackets_require_loaded_state() {
    let repo = setup_empty_db().await;
    let records = StateBracketLoader::parse(BRACKETS_CSV.as_bytes()).unwrap();

    let err = StateBracketLoader::load(&repo, &records).await.unwrap_err();

    let LoaderError::StateNotFound(code) = err else {
        panic!("Expected StateNotFound, got: {:?}", err);
    };
    assert_eq!(code, "ME");
}

#[tokio::test]
async fn rpp_requires_loaded_state() {
    let repo = setup_empty_db().await;
    let records = PriceParityLoader::parse("state,index_all_items\nVT,101.2\n".as_bytes()).unwrap();

    let err = PriceParityLoader::load(&repo, &records).await.unwrap_err();

    assert!(matches!(err, LoaderError::StateNotFound(code) if code == "VT"));
}

#[tokio::test]
async fn invalid_state_row_writes_nothing() {
    let repo = setup_empty_db().await;
    let csv = STATES_CSV.replace("Texas,91.5", "Texas,0");
    let records = StateProfileLoader::parse(csv.as_bytes()).unwrap();

    let err = StateProfileLoader::load(&repo, &records).await.unwrap_err();

    assert!(matches!(err, LoaderError::InvalidRecord { line: 5, .. }), "got {err:?}");
    assert!(repo.list_states().await.unwrap().is_empty());
}

#[tokio::test]
async fn estimate_uses_loaded_brackets_and_parities() {
    let repo = setup_loaded_db().await;
    let service = EstimationService::with_stored_brackets(&repo, TaxPolicy::default())
        .await
        .expect("Failed to build service");
    let input = EstimationInput::from_json(
        r#"{
            "from_state": "tx",
            "target_state": "ME",
            "gross_annual_income": "60000",
            "filing_status": "SINGLE",
            "expenses": [
                {"category": "HOUSING", "amount_monthly": "1500", "taxable": false},
                {"category": "FOOD", "amount_monthly": "400"}
            ]
        }"#,
    )
    .unwrap();

    let result = service.estimate(input).await.expect("estimate failed");

    assert_eq!(result.origin_state, "TX");
    assert_eq!(result.target_state, "ME");
    assert_eq!(result.price_parity_ratio, dec!(1.013));
    assert!(!result.origin_rpp_defaulted);
    assert!(!result.target_rpp_defaulted);
    assert_eq!(result.annual_income_tax_origin, dec!(0.00));
    assert_eq!(result.annual_income_tax_target, dec!(3822.65));
    assert_eq!(result.categories.len(), 2);
}

#[tokio::test]
async fn missing_parity_defaults_to_national_average() {
    let repo = setup_empty_db().await;
    load_states(&repo).await;
    let service = EstimationService::new(&repo, TaxPolicy::default());
    let input = EstimationInput::from_json(
        r#"{
            "from_state": "NH",
            "target_state": "NC",
            "gross_annual_income": "50000",
            "filing_status": "SINGLE",
            "expenses": []
        }"#,
    )
    .unwrap();

    let result = service.estimate(input).await.unwrap();

    assert!(result.origin_rpp_defaulted);
    assert!(result.target_rpp_defaulted);
    assert_eq!(result.price_parity_ratio, dec!(1.000));
}
