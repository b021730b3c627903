//! SQLite backend for the [`col_core::StateRepository`] trait.

mod decimal;
pub mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
