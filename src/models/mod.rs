//! Time-series model implementations.
//!
//! Each model estimates itself from a plain `&[f64]` and forecasts with
//! standard errors, so the search code in `fit` can stay generic.

pub mod arima;

pub use arima::*;
