use std::path::PathBuf;

use async_trait::async_trait;

use col_core::db::repository::{RepositoryError, StateRepository};
use col_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`COL_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **Crate manifest dir**: `$CARGO_MANIFEST_DIR/seeds`.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("COL_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// Map a connection string to a sqlx URL.
///
/// * `:memory:` becomes `sqlite::memory:`.
/// * Strings already starting with `sqlite:` pass through.
/// * Anything else is a file path, created if missing.
pub fn database_url(connection_string: &str) -> String {
    match connection_string {
        ":memory:" => "sqlite::memory:".to_string(),
        url if url.starts_with("sqlite:") => url.to_string(),
        path => format!("sqlite:{path}?mode=rwc"),
    }
}

/// [`RepositoryFactory`] for SQLite.
///
/// ```rust,no_run
/// use col_core::db::RepositoryRegistry;
/// use col_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database, run migrations and apply the seed files (see
    /// [`seeds_dir`]).
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn StateRepository>, RepositoryError> {
        let url = database_url(&config.connection_string);
        let repo = SqliteRepository::new(&url)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        repo.run_seeds(&seeds_dir())
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        tracing::info!(url = %url, "opened sqlite repository");
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use col_core::db::{DbConfig, RepositoryFactory};
    use pretty_assertions::assert_eq;

    use super::{SqliteRepositoryFactory, database_url};

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRepositoryFactory.backend_name(), "sqlite");
    }

    #[test]
    fn database_url_mapping() {
        assert_eq!(database_url(":memory:"), "sqlite::memory:");
        assert_eq!(database_url("sqlite:data.db"), "sqlite:data.db");
        assert_eq!(database_url("relocation.db"), "sqlite:relocation.db?mode=rwc");
    }

    #[tokio::test]
    async fn creates_seeded_in_memory_repository() {
        let config = DbConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        let repo = SqliteRepositoryFactory
            .create(&config)
            .await
            .expect("failed to create in-memory repository");

        let texas = repo.get_state("TX").await.expect("seeded state");
        assert_eq!(texas.name, "Texas");
    }
}
