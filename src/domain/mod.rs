//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - the two input sheets (`RevenueRecord`, `TagTable`) and the loaded `Dataset`
//! - forecaster outputs (`ForecastResult`, `ForecastPoint`, `ModelSummary`)
//! - the tag lookup output (`TagSummary`)
//! - configuration (`ForecastConfig`, `SearchConfig`)

pub mod types;

pub use types::*;
