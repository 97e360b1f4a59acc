//! Input/output helpers.
//!
//! - workbook (two CSV sheets) read/write (`workbook`)
//! - forecast exports (CSV/JSON) (`export`)

pub mod export;
pub mod workbook;

pub use export::*;
pub use workbook::*;
