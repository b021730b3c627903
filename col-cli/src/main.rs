use clap::Parser;
use tracing::debug;

use col_cli::app;
use col_cli::cli::Cli;
use col_cli::config::AppConfig;
use col_cli::logging;
use col_core::EstimationService;

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    logging::init_logging(&config.logging.level, config.logging.file.as_deref())?;

    let db_config = config.db_config();
    debug!("connecting to {} backend", db_config.backend);
    let registry = app::build_registry();
    let repo = registry.create(&db_config).await?;

    let service = EstimationService::with_stored_brackets(&*repo, config.tax).await?;
    let output = app::execute(&cli.command, &service).await?;
    println!("{output}");

    Ok(())
}
