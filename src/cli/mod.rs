//! Command-line parsing for the revenue forecast dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::DEFAULT_SEED;
use crate::domain::{Criterion, DEFAULT_CONFIDENCE, DEFAULT_HORIZON, SearchMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rdash", version, about = "Movie revenue forecast dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(TuiArgs),
    /// Forecast one movie (or a country total) and print the result.
    Forecast(ForecastArgs),
    /// Print the tag line of a movie.
    Tags(TagsArgs),
    /// List countries, or the movies shown in one country.
    List(ListArgs),
    /// Write the built-in dummy dataset as a workbook directory.
    Sample(SampleArgs),
}

/// Where the dataset comes from.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Workbook directory holding `Sheet1.csv` and `Sheet2.csv`.
    ///
    /// Falls back to `RDASH_DATA`, then to the built-in dummy dataset.
    #[arg(short = 'd', long, value_name = "DIR")]
    pub data: Option<PathBuf>,

    /// Seed of the built-in dummy dataset.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

/// Forecaster and order-search settings.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Months to forecast.
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: usize,

    /// Confidence level of the forecast interval.
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    pub confidence: f64,

    /// Order search strategy.
    #[arg(long, value_enum, default_value_t = SearchMode::Stepwise)]
    pub search: SearchMode,

    /// Information criterion minimized by the search.
    #[arg(long, value_enum, default_value_t = Criterion::Aic)]
    pub criterion: Criterion,

    /// Maximum AR order.
    #[arg(long, default_value_t = 3)]
    pub max_p: usize,

    /// Maximum differencing order.
    #[arg(long, default_value_t = 2)]
    pub max_d: usize,

    /// Maximum MA order.
    #[arg(long, default_value_t = 3)]
    pub max_q: usize,

    /// Maximum p + q.
    #[arg(long, default_value_t = 5)]
    pub max_order: usize,

    /// Stop the order search after this many milliseconds (best model so far wins).
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Initially selected country.
    #[arg(short = 'c', long)]
    pub country: Option<String>,

    /// Initially selected movie.
    #[arg(short = 'm', long)]
    pub movie: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Country to forecast.
    #[arg(short = 'c', long)]
    pub country: String,

    /// Movie to forecast; omit for the country total.
    #[arg(short = 'm', long, default_value = "")]
    pub movie: String,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the forecast (`.json` for JSON, anything else CSV).
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TagsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Movie title.
    #[arg(short = 'm', long)]
    pub movie: String,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// List the movies of this country instead of the countries.
    #[arg(short = 'c', long)]
    pub country: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output workbook directory.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub out: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of months in the panel.
    #[arg(long, default_value_t = 36)]
    pub months: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_defaults_to_country_total() {
        let cli = Cli::parse_from(["rdash", "forecast", "-c", "France"]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.country, "France");
        assert!(args.movie.is_empty());
        assert_eq!(args.model.horizon, 3);
        assert_eq!(args.model.search, SearchMode::Stepwise);
        assert!(args.data.data.is_none());
    }

    #[test]
    fn model_flags_parse() {
        let cli = Cli::parse_from([
            "rdash",
            "forecast",
            "-c",
            "Japan",
            "-m",
            "Title B",
            "--search",
            "grid",
            "--criterion",
            "bic",
            "--timeout-ms",
            "250",
        ]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.movie, "Title B");
        assert_eq!(args.model.search, SearchMode::Grid);
        assert_eq!(args.model.criterion, Criterion::Bic);
        assert_eq!(args.model.timeout_ms, Some(250));
    }
}
