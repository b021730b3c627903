//! Wiring between the parsed command line and the estimation service.

use anyhow::{Context, Result};
use col_core::db::RepositoryRegistry;
use col_core::{EstimationService, MonthlyExpenses, RelocationScenario};
use col_db_sqlite::SqliteRepositoryFactory;
use serde_json::json;
use tracing::info;

use crate::cli::{CalcCommand, Command, NoteCommand, RelocateArgs, StatesCommand};
use crate::utils::to_pretty_json;

/// Registry holding every backend this binary is built with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Runs `command` and returns its output as pretty JSON.
pub async fn execute(
    command: &Command,
    service: &EstimationService<'_>,
) -> Result<String> {
    match command {
        Command::States {
            command: StatesCommand::List,
        } => to_pretty_json(&service.list_states().await?),
        Command::States {
            command: StatesCommand::Show { code },
        } => to_pretty_json(&service.state(code).await?),
        Command::Compare { from, to } => {
            let comparison = service.compare_states(from, to).await?;
            info!(from = %comparison.origin_state, to = %comparison.target_state, "compared states");
            to_pretty_json(&comparison)
        }
        Command::Relocate(args) => relocate(args, service).await,
        Command::Estimate(args) => {
            let input = args.to_input()?;
            let result = service.estimate(input).await?;
            info!(
                from = %result.origin_state,
                to = %result.target_state,
                delta = %result.delta,
                "estimated relocation"
            );
            to_pretty_json(&result)
        }
        Command::Dashboard { user } => to_pretty_json(&service.dashboard(*user).await?),
        Command::Calc { command } => calc(command, service).await,
    }
}

async fn calc(
    command: &CalcCommand,
    service: &EstimationService<'_>,
) -> Result<String> {
    match command {
        CalcCommand::List { user } => to_pretty_json(&service.calculations(*user).await?),
        CalcCommand::Show(calc) => {
            let saved = service.calculation(calc.user, calc.id).await?;
            let notes = service.notes(calc.user, calc.id).await?;
            to_pretty_json(&json!({ "calculation": saved, "notes": notes }))
        }
        CalcCommand::Update(args) => {
            let stored = service.calculation(args.user, args.id).await?;
            let mut scenario = RelocationScenario::from(&stored);
            args.apply(&mut scenario);
            let name = args.name.as_deref().unwrap_or(&stored.name);
            to_pretty_json(&service.update_relocation(args.user, args.id, name, scenario).await?)
        }
        CalcCommand::Duplicate(calc) => {
            to_pretty_json(&service.duplicate_calculation(calc.user, calc.id).await?)
        }
        CalcCommand::Delete(calc) => {
            service.delete_calculation(calc.user, calc.id).await?;
            to_pretty_json(&json!({ "deleted": calc.id }))
        }
        CalcCommand::Favorite(calc) => {
            to_pretty_json(&service.toggle_favorite(calc.user, calc.id).await?)
        }
        CalcCommand::Note { command } => note(command, service).await,
    }
}

async fn note(
    command: &NoteCommand,
    service: &EstimationService<'_>,
) -> Result<String> {
    match command {
        NoteCommand::Add {
            calculation,
            text,
            user,
        } => to_pretty_json(&service.add_note(*user, *calculation, text).await?),
        NoteCommand::List { calculation, user } => {
            to_pretty_json(&service.notes(*user, *calculation).await?)
        }
        NoteCommand::Edit {
            calculation,
            note,
            text,
            user,
        } => to_pretty_json(&service.update_note(*user, *calculation, *note, text).await?),
        NoteCommand::Delete {
            calculation,
            note,
            user,
        } => {
            service.delete_note(*user, *calculation, *note).await?;
            to_pretty_json(&json!({ "deleted": note }))
        }
    }
}

async fn relocate(
    args: &RelocateArgs,
    service: &EstimationService<'_>,
) -> Result<String> {
    let expenses = MonthlyExpenses::from(&args.expenses);

    if !args.save {
        return to_pretty_json(&service.estimate_relocation(&args.from, &args.to, &expenses).await?);
    }

    let user_id = args.user.context("--save requires --user")?;
    let name = args.name.as_deref().context("--save requires --name")?;
    let scenario = RelocationScenario {
        from_state: args.from.clone(),
        target_state: args.to.clone(),
        expenses,
        gross_annual_income: args.income,
        military_retirement_income: args.military_retirement,
        disability_income: args.disability,
    };
    let saved = service.save_relocation(user_id, name, scenario).await?;
    to_pretty_json(&saved)
}
