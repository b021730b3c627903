//! Cost-of-living and state tax estimation for moves between U.S. states.
//!
//! * [`calculations`]: the synchronous estimation engine.
//! * [`models`]: state reference records, requests and results.
//! * [`db`]: the async [`StateRepository`] seam and backend registry.
//! * [`service`]: repository-backed entry points used by the binaries.

pub mod calculations;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use calculations::{DashboardSummary, Estimator, TaxPolicy};
pub use db::repository::{RepositoryError, StateRepository};
pub use error::EstimationError;
pub use models::*;
pub use service::{EstimationService, RelocationScenario, ServiceError};
