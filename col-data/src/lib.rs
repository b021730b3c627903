//! CSV loaders for the cost-of-living reference tables.
//!
//! Each loader parses a CSV file into plain records, validates the whole
//! file, and only then writes through a [`col_core::StateRepository`].
//! Load order matters: states first, then price parities and bracket
//! tables, which reference them.

mod brackets;
mod error;
mod fields;
mod rpp;
mod states;

pub use brackets::{StateBracketLoader, StateBracketRecord};
pub use error::LoaderError;
pub use rpp::{PriceParityLoader, PriceParityRecord};
pub use states::{StateProfileLoader, StateRecord};
