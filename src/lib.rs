//! `revenue-dash` library crate.
//!
//! The binary (`rdash`) is a thin wrapper around this library so that:
//!
//! - core logic (`forecast`, `tags`) is testable without spawning processes
//! - the CLI and the TUI share one pipeline (`app::pipeline`)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tags;
pub mod tui;
