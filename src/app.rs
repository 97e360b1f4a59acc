//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves and loads the dataset
//! - runs forecasts / tag lookups
//! - prints reports/plots and writes optional exports

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, DataArgs, ForecastArgs, ListArgs, ModelArgs, SampleArgs, TagsArgs, TuiArgs};
use crate::data::{SampleConfig, generate_dummy_dataset};
use crate::domain::{ForecastConfig, MIN_PERIODS, SearchConfig};
use crate::error::AppError;

pub mod pipeline;

use pipeline::{DataSource, LoadedData};

/// Entry point for the `rdash` binary.
pub fn run() -> Result<(), AppError> {
    // `rdash` and `rdash -c France` behave like `rdash tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Forecast(args) => {
            init_tracing();
            handle_forecast(args)
        }
        Command::Tags(args) => {
            init_tracing();
            handle_tags(args)
        }
        Command::List(args) => {
            init_tracing();
            handle_list(args)
        }
        Command::Sample(args) => {
            init_tracing();
            handle_sample(args)
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: this crate at `info`).
///
/// Not used by the TUI: log lines would corrupt the alternate screen.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("revenue_dash=info"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn load(args: &DataArgs) -> Result<LoadedData, AppError> {
    let source = DataSource::from_env(args.data.clone(), args.seed);
    pipeline::load_dataset(&source)
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args.model);
    let data = load(&args.data)?;
    crate::tui::run(data, config, args.country.as_deref(), args.movie.as_deref())
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args.model);
    let data = load(&args.data)?;

    let result = crate::forecast::forecast(&data.dataset.revenue, &args.country, &args.movie, &config)?;

    println!(
        "{}",
        crate::report::format_forecast_summary(&result, &data.source_label)
    );
    if !args.no_plot {
        println!(
            "{}",
            crate::plot::render_forecast_plot(&result, args.width, args.height)
        );
    }

    if !args.movie.is_empty() {
        // Tags are informational here; a movie without a tag row is not an error.
        match crate::tags::movie_tags(&data.dataset.tags, &args.movie) {
            Ok(summary) => println!("{}", crate::report::format_tags(&summary)),
            Err(err) => println!("{}", pipeline::fallback_message(&err)),
        }
    }

    if let Some(path) = &args.export {
        crate::io::write_forecast(path, &result)?;
        tracing::info!(path = %path.display(), "forecast exported");
    }

    Ok(())
}

fn handle_tags(args: TagsArgs) -> Result<(), AppError> {
    let data = load(&args.data)?;
    println!("{}", crate::tags::tag_line(&data.dataset.tags, &args.movie)?);
    Ok(())
}

fn handle_list(args: ListArgs) -> Result<(), AppError> {
    let data = load(&args.data)?;
    let records = &data.dataset.revenue;
    let text = match &args.country {
        Some(country) => {
            let movies = pipeline::movies_for_country(records, country);
            if movies.is_empty() {
                return Err(AppError::new(3, format!("No movies for country '{country}'.")));
            }
            crate::report::format_name_list(&format!("Movies in {country}"), &movies)
        }
        None => crate::report::format_name_list("Countries", &pipeline::countries(records)),
    };
    print!("{text}");
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        seed: args.seed,
        months: args.months,
        ..SampleConfig::default()
    };
    let dataset = generate_dummy_dataset(&config)?;
    crate::io::write_workbook(&args.out, &dataset)?;
    println!(
        "Wrote {} revenue rows and {} tag rows to {}",
        dataset.revenue.len(),
        dataset.tags.rows.len(),
        args.out.display()
    );
    Ok(())
}

pub fn forecast_config_from_args(args: &ModelArgs) -> ForecastConfig {
    ForecastConfig {
        horizon: args.horizon,
        confidence: args.confidence,
        min_periods: MIN_PERIODS,
        search: SearchConfig {
            mode: args.search,
            max_p: args.max_p,
            max_q: args.max_q,
            max_d: args.max_d,
            max_order: args.max_order,
            criterion: args.criterion,
            time_budget: args.timeout_ms.map(Duration::from_millis),
        },
    }
}

/// Rewrite argv so `rdash` defaults to `rdash tui`.
///
/// Rules:
/// - `rdash`                      -> `rdash tui`
/// - `rdash -c France ...`        -> `rdash tui -c France ...`
/// - `rdash --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "tui" | "forecast" | "tags" | "list" | "sample"
    );
    if is_subcommand {
        return argv;
    }

    // A leading flag means "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_command_defaults_to_tui() {
        assert_eq!(rewrite_args(args(&["rdash"])), args(&["rdash", "tui"]));
        assert_eq!(
            rewrite_args(args(&["rdash", "-c", "France"])),
            args(&["rdash", "tui", "-c", "France"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for argv in [
            args(&["rdash", "--help"]),
            args(&["rdash", "forecast", "-c", "France"]),
            args(&["rdash", "sample", "-o", "out"]),
        ] {
            assert_eq!(rewrite_args(argv.clone()), argv);
        }
    }

    #[test]
    fn model_flags_map_to_config() {
        let cli = crate::cli::Cli::parse_from(["rdash", "tui", "--timeout-ms", "1500", "--max-p", "1"]);
        let Command::Tui(tui) = cli.command else {
            panic!("expected tui");
        };
        let config = forecast_config_from_args(&tui.model);
        assert_eq!(config.search.time_budget, Some(Duration::from_millis(1500)));
        assert_eq!(config.search.max_p, 1);
        assert_eq!(config.horizon, 3);
        assert_eq!(config.min_periods, 2);
    }
}
