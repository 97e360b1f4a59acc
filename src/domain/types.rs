//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during forecasting
//! - exported to JSON/CSV
//! - rendered by the terminal front-ends

use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default number of forecast periods (months).
pub const DEFAULT_HORIZON: usize = 3;

/// Default two-sided confidence level of the forecast interval.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Fewest distinct monthly periods a series needs before we try to model it.
pub const MIN_PERIODS: usize = 2;

/// One row of the revenue sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub country: String,
    pub movie: String,
    pub year: i32,
    /// Calendar month, 1–12.
    pub month: u32,
    /// Non-negative revenue for the month.
    pub revenue: f64,
}

/// One row of the tag sheet: a movie and its 0/1 indicators.
///
/// `flags[i]` belongs to column `TagTable::tag_names[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieTagRecord {
    pub movie: String,
    pub flags: Vec<bool>,
}

/// The tag sheet: column names (in declaration order) plus one row per movie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagTable {
    pub tag_names: Vec<String>,
    pub rows: Vec<MovieTagRecord>,
}

/// Both sheets of the input workbook, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub revenue: Vec<RevenueRecord>,
    pub tags: TagTable,
}

/// A single month of (possibly aggregated) revenue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// First day of the month.
    pub date: NaiveDate,
    pub revenue: f64,
}

/// One point of the anchored forecast series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// An ARIMA order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Diagnostics of the model chosen by the order search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub order: ArimaOrder,
    pub with_intercept: bool,
    pub criterion: Criterion,
    /// Value of `criterion` for the chosen model.
    pub score: f64,
    /// Innovation variance in the transformed (log1p) space.
    pub sigma2: f64,
    /// Number of candidate orders that were fitted.
    pub candidates_evaluated: usize,
    /// Whether the search stopped early because of the time budget.
    pub truncated: bool,
}

/// Whether a forecast is for one movie or the whole country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "movie")]
pub enum ForecastScope {
    Movie(String),
    Country,
}

/// Output of the forecaster.
///
/// `forecast` has `horizon + 1` points: the first one is the anchor (last
/// observed month and revenue, identical for point/lower/upper).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub country: String,
    pub scope: ForecastScope,
    pub caption: String,
    pub history: Vec<MonthlyPoint>,
    pub forecast: Vec<ForecastPoint>,
    pub confidence: f64,
    pub model: ModelSummary,
}

impl ForecastResult {
    /// Forecast points without the anchor.
    pub fn horizon_points(&self) -> &[ForecastPoint] {
        self.forecast.get(1..).unwrap_or(&[])
    }
}

/// Tags flagged for a movie, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    pub movie: String,
    pub tags: Vec<String>,
}

impl std::fmt::Display for TagSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tags: {} (tags can be genres for example)",
            self.tags.join(", ")
        )
    }
}

/// Information criterion minimized by the order search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Aic,
    Aicc,
    Bic,
}

impl Criterion {
    pub fn display_name(self) -> &'static str {
        match self {
            Criterion::Aic => "AIC",
            Criterion::Aicc => "AICc",
            Criterion::Bic => "BIC",
        }
    }
}

/// How candidate `(p, q)` orders are explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Hyndman–Khandakar stepwise walk from a few seed orders.
    Stepwise,
    /// Every order with `p + q <= max_order`.
    Grid,
}

/// Order search settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
    /// Upper bound on `p + q`.
    pub max_order: usize,
    pub criterion: Criterion,
    /// Stop searching (keeping the best candidate so far) once exceeded.
    pub time_budget: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Stepwise,
            max_p: 3,
            max_q: 3,
            max_d: 2,
            max_order: 5,
            criterion: Criterion::Aic,
            time_budget: None,
        }
    }
}

/// Forecaster settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub horizon: usize,
    pub confidence: f64,
    pub min_periods: usize,
    pub search: SearchConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            confidence: DEFAULT_CONFIDENCE,
            min_periods: MIN_PERIODS,
            search: SearchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_summary_renders_comma_separated_list() {
        let summary = TagSummary {
            movie: "Title A".to_string(),
            tags: vec!["Action".to_string(), "Drama".to_string()],
        };
        assert_eq!(
            summary.to_string(),
            "Tags: Action, Drama (tags can be genres for example)"
        );
    }

    #[test]
    fn tag_summary_with_no_tags_keeps_empty_list() {
        let summary = TagSummary {
            movie: "Title A".to_string(),
            tags: Vec::new(),
        };
        assert_eq!(summary.to_string(), "Tags:  (tags can be genres for example)");
    }

    #[test]
    fn arima_order_display() {
        assert_eq!(ArimaOrder::new(1, 1, 0).to_string(), "ARIMA(1,1,0)");
    }
}
