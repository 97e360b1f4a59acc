//! Model fitting orchestration.
//!
//! Responsibilities:
//!
//! - choose the differencing order (KPSS)
//! - generate candidate (p, q) orders (grid or stepwise)
//! - evaluate each candidate (parallel)
//! - select the best model by information criterion

pub mod differencing;
pub mod order_grid;
pub mod selection;

pub use differencing::*;
pub use order_grid::*;
pub use selection::*;
