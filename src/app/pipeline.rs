//! Shared dashboard logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! resolve data source -> load dataset -> selection lists -> forecasts + tags
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::PathBuf;

use tracing::info;

use crate::data::{SampleConfig, generate_dummy_dataset};
use crate::domain::{Dataset, ForecastConfig, ForecastResult, RevenueRecord, TagSummary};
use crate::error::{AppError, CoreError};
use crate::io::{RowError, load_workbook};

/// Environment variable naming the default workbook directory.
pub const DATA_ENV: &str = "RDASH_DATA";

/// Where the dashboard reads its data from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Workbook(PathBuf),
    Sample(SampleConfig),
}

impl DataSource {
    /// Resolve `--data`, then `env_value` (usually `RDASH_DATA`), then the sample.
    pub fn resolve(flag: Option<PathBuf>, env_value: Option<String>, seed: u64) -> Self {
        if let Some(path) = flag {
            return DataSource::Workbook(path);
        }
        match env_value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => DataSource::Workbook(PathBuf::from(v)),
            _ => DataSource::Sample(SampleConfig {
                seed,
                ..SampleConfig::default()
            }),
        }
    }

    /// `resolve` with the process environment (after loading `.env`).
    pub fn from_env(flag: Option<PathBuf>, seed: u64) -> Self {
        dotenvy::dotenv().ok();
        Self::resolve(flag, std::env::var(DATA_ENV).ok(), seed)
    }

    pub fn label(&self) -> String {
        match self {
            DataSource::Workbook(path) => path.display().to_string(),
            DataSource::Sample(config) => format!("dummy data (seed {})", config.seed),
        }
    }
}

/// A dataset plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub dataset: Dataset,
    pub source_label: String,
    pub row_errors: Vec<RowError>,
}

pub fn load_dataset(source: &DataSource) -> Result<LoadedData, AppError> {
    let (dataset, row_errors) = match source {
        DataSource::Workbook(dir) => {
            let loaded = load_workbook(dir)?;
            (loaded.dataset, loaded.row_errors)
        }
        DataSource::Sample(config) => (generate_dummy_dataset(config)?, Vec::new()),
    };

    info!(
        source = %source.label(),
        revenue_rows = dataset.revenue.len(),
        movies_tagged = dataset.tags.rows.len(),
        "dataset loaded"
    );

    Ok(LoadedData {
        dataset,
        source_label: source.label(),
        row_errors,
    })
}

/// Distinct countries in first-appearance order.
pub fn countries(records: &[RevenueRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.country.as_str()))
}

/// Distinct movies shown in `country`, in first-appearance order.
pub fn movies_for_country(records: &[RevenueRecord], country: &str) -> Vec<String> {
    distinct(
        records
            .iter()
            .filter(|r| r.country == country)
            .map(|r| r.movie.as_str()),
    )
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Initial (country, movie): the requested ones when present, else the first
/// country and its first movie.
pub fn initial_selection(
    records: &[RevenueRecord],
    country: Option<&str>,
    movie: Option<&str>,
) -> Option<(String, String)> {
    let all = countries(records);
    let country = country
        .and_then(|c| all.iter().find(|x| x.as_str() == c))
        .or_else(|| all.first())?
        .clone();

    let movies = movies_for_country(records, &country);
    let movie = movie
        .and_then(|m| movies.iter().find(|x| x.as_str() == m))
        .or_else(|| movies.first())
        .cloned()
        .unwrap_or_default();

    Some((country, movie))
}

/// Everything the dashboard shows for one (country, movie) selection.
///
/// Each panel keeps its own `Result` so one failure (e.g. a movie with a
/// single month of data) does not blank the others.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub country: String,
    pub movie: String,
    pub movie_forecast: Result<ForecastResult, CoreError>,
    pub country_forecast: Result<ForecastResult, CoreError>,
    pub tags: Result<TagSummary, CoreError>,
}

impl DashboardView {
    pub fn build(dataset: &Dataset, country: &str, movie: &str, config: &ForecastConfig) -> Self {
        let records = &dataset.revenue;
        let (movie_forecast, country_forecast) = rayon::join(
            || crate::forecast::forecast(records, country, movie, config),
            || crate::forecast::forecast(records, country, "", config),
        );
        let tags = crate::tags::movie_tags(&dataset.tags, movie);

        Self {
            country: country.to_string(),
            movie: movie.to_string(),
            movie_forecast,
            country_forecast,
            tags,
        }
    }

    /// Tag text, or the fallback message.
    pub fn tags_line(&self) -> String {
        match &self.tags {
            Ok(summary) => summary.to_string(),
            Err(err) => fallback_message(err),
        }
    }
}

/// What a panel shows instead of a chart when its computation failed.
pub fn fallback_message(err: &CoreError) -> String {
    format!("No data available: {err}")
}
