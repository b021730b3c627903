//! `relocate.toml` configuration.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "relocation.db"
//!
//! [logging]
//! level = "info"
//! file = "relocate.log"
//!
//! [tax]
//! no_income_tax_states = ["AK", "FL", "NV", "NH", "SD", "TN", "TX", "WA", "WY"]
//! default_flat_rate = "0.045"
//!
//! [tax.flat_rates]
//! MA = "0.05"
//! ```
//!
//! Every section and key is optional. Command-line flags win over the file.

use std::path::{Path, PathBuf};

use col_core::TaxPolicy;
use col_core::db::DbConfig;
use serde::Deserialize;
use thiserror::Error;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "relocate.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "relocation.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Bare level or any `EnvFilter` directive. `RUST_LOG` overrides it.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSection,
    pub logging: LoggingSection,
    pub tax: TaxPolicy,
}

impl AppConfig {
    pub fn from_toml_str(
        input: &str,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`, or [`DEFAULT_CONFIG_FILE`] when `path` is `None`.
    ///
    /// A missing default file yields the defaults; a missing file that was
    /// asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml_str(&contents, &path),
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.database.backend.clone(),
            connection_string: self.database.connection_string.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn parse(input: &str) -> AppConfig {
        AppConfig::from_toml_str(input, Path::new("test.toml")).expect("config should parse")
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse(""), AppConfig::default());
        assert_eq!(AppConfig::default().tax, TaxPolicy::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse(
            r#"
            [database]
            connection_string = ":memory:"

            [logging]
            level = "debug"
            file = "/tmp/relocate.log"
            "#,
        );

        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/relocate.log")));
        assert_eq!(
            config.db_config(),
            DbConfig {
                backend: "sqlite".to_string(),
                connection_string: ":memory:".to_string(),
            }
        );
    }

    #[test]
    fn tax_section_replaces_policy_fields() {
        let config = parse(
            r#"
            [tax]
            no_income_tax_states = ["TX"]
            default_flat_rate = "0.04"

            [tax.flat_rates]
            MA = "0.05"
            "#,
        );

        assert!(config.tax.is_no_income_tax_state("TX"));
        assert!(!config.tax.is_no_income_tax_state("FL"));
        assert_eq!(config.tax.flat_rate_for("MA"), dec!(0.05));
        assert_eq!(config.tax.flat_rate_for("ME"), dec!(0.04));
    }

    #[test]
    fn bad_toml_names_file() {
        let err = AppConfig::from_toml_str("[database", Path::new("broken.toml")).unwrap_err();

        assert!(err.to_string().contains("broken.toml"), "got: {err}");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let missing = Path::new("definitely/not/here/relocate.toml");

        assert!(matches!(
            AppConfig::load(Some(missing)),
            Err(ConfigError::Read { .. })
        ));
    }
}
