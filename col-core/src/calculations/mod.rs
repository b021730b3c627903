//! The estimation engine.
//!
//! Everything here is synchronous and pure: callers hand in fully resolved
//! state records and get a typed result or an [`EstimationError`] back.
//!
//! [`EstimationError`]: crate::error::EstimationError

pub mod bracket_tax;
pub mod common;
pub mod comparison;
pub mod dashboard;
pub mod estimate;
pub mod relocation;

pub use bracket_tax::{TaxPolicy, evaluate_bracket_tax};
pub use common::scale;
pub use comparison::compare;
pub use dashboard::{CalculationSummary, DashboardSummary};
pub use estimate::Estimator;
pub use relocation::estimate_relocation;
