//! Revenue forecaster.
//!
//! `forecast` turns revenue rows into a monthly series for one movie (or the
//! country total), fits an automatically selected ARIMA model on
//! `ln(1 + revenue)` and returns the history plus an anchored 3-month forecast
//! with confidence bounds, back in revenue units.
//!
//! The series is always sorted by (year, month) before modeling; input row
//! order carries no meaning.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use tracing::{debug, warn};

use crate::domain::{
    ForecastConfig, ForecastPoint, ForecastResult, ForecastScope, ModelSummary, MonthlyPoint,
    RevenueRecord,
};
use crate::error::CoreError;
use crate::fit::auto_arima;
use crate::math::normal_quantile;

/// Variance-stabilizing transform applied before modeling.
pub fn stabilize(revenue: f64) -> f64 {
    revenue.ln_1p()
}

/// Inverse of `stabilize`.
pub fn restore(value: f64) -> f64 {
    value.exp_m1()
}

/// Chart title for a selection. An empty movie means the country aggregate.
pub fn caption(country: &str, movie: &str) -> String {
    if movie.is_empty() {
        format!("Revenue Forecasting for {country}")
    } else {
        format!("Revenue Forecasting for {movie} in {country}")
    }
}

/// Build the monthly revenue series for a selection, sorted ascending.
///
/// - `movie` non-empty: rows of that movie in `country`
/// - `movie` empty: all rows of `country`, summed per month
pub fn monthly_series(
    records: &[RevenueRecord],
    country: &str,
    movie: &str,
) -> Result<Vec<MonthlyPoint>, CoreError> {
    let mut by_month: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();

    for r in records
        .iter()
        .filter(|r| r.country == country && (movie.is_empty() || r.movie == movie))
    {
        if !(r.revenue.is_finite() && r.revenue >= 0.0) {
            return Err(CoreError::InvalidRecord(format!(
                "revenue must be finite and >= 0 ({} / {} {}-{:02}: {})",
                r.country, r.movie, r.year, r.month, r.revenue
            )));
        }
        let entry = by_month.entry((r.year, r.month)).or_insert((0.0, 0));
        entry.0 += r.revenue;
        entry.1 += 1;
    }

    if by_month.is_empty() {
        return Err(CoreError::NoMatchingData {
            country: country.to_string(),
            movie: movie.to_string(),
        });
    }

    if !movie.is_empty() {
        let duplicates = by_month.values().filter(|(_, n)| *n > 1).count();
        if duplicates > 0 {
            warn!(
                country,
                movie,
                duplicates,
                "duplicate (year, month) rows for one movie; summing them"
            );
        }
    }

    by_month
        .into_iter()
        .map(|((year, month), (revenue, _))| {
            Ok(MonthlyPoint {
                date: month_start(year, month)?,
                revenue,
            })
        })
        .collect()
}

/// Forecast the next `config.horizon` months of revenue for a selection.
pub fn forecast(
    records: &[RevenueRecord],
    country: &str,
    movie: &str,
    config: &ForecastConfig,
) -> Result<ForecastResult, CoreError> {
    if config.horizon == 0 {
        return Err(CoreError::InvalidConfig("horizon must be >= 1".to_string()));
    }
    let z = normal_quantile(config.confidence)?;

    let history = monthly_series(records, country, movie)?;
    let required = config.min_periods.max(2);
    if history.len() < required {
        return Err(CoreError::InsufficientData {
            required,
            actual: history.len(),
        });
    }

    let y: Vec<f64> = history.iter().map(|p| stabilize(p.revenue)).collect();
    debug!(country, movie, n = y.len(), "fitting revenue series");

    let selection = auto_arima(&y, &config.search)?;
    let fit = &selection.best.fit;
    let fc = fit.forecast(config.horizon);

    let last = history[history.len() - 1];
    let mut points = Vec::with_capacity(config.horizon + 1);
    points.push(ForecastPoint {
        date: last.date,
        point: last.revenue,
        lower: last.revenue,
        upper: last.revenue,
    });
    for (step, (mean, se)) in fc.mean.iter().zip(fc.std_err.iter()).enumerate() {
        let half_width = z * se;
        points.push(ForecastPoint {
            date: add_months(last.date, step as u32 + 1)?,
            point: restore(*mean),
            lower: restore(mean - half_width),
            upper: restore(mean + half_width),
        });
    }

    let scope = if movie.is_empty() {
        ForecastScope::Country
    } else {
        ForecastScope::Movie(movie.to_string())
    };

    Ok(ForecastResult {
        country: country.to_string(),
        scope,
        caption: caption(country, movie),
        history,
        forecast: points,
        confidence: config.confidence,
        model: ModelSummary {
            order: fit.order,
            with_intercept: fit.with_intercept,
            criterion: config.search.criterion,
            score: selection.best.score,
            sigma2: fit.sigma2,
            candidates_evaluated: selection.evaluated.len(),
            truncated: selection.truncated,
        },
    })
}

fn month_start(year: i32, month: u32) -> Result<NaiveDate, CoreError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::InvalidRecord(format!("invalid year/month: {year}-{month}")))
}

fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, CoreError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| CoreError::InvalidRecord(format!("date out of range: {date} + {months}m")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SearchMode;

    fn rec(country: &str, movie: &str, year: i32, month: u32, revenue: f64) -> RevenueRecord {
        RevenueRecord {
            country: country.to_string(),
            movie: movie.to_string(),
            year,
            month,
            revenue,
        }
    }

    /// Two years of monthly revenue for one title, in scrambled row order.
    fn sample_records() -> Vec<RevenueRecord> {
        let mut out = Vec::new();
        for i in 0..24u32 {
            let year = 2020 + (i / 12) as i32;
            let month = i % 12 + 1;
            let a = 1000.0 + 40.0 * i as f64 + if i % 3 == 0 { 120.0 } else { 0.0 };
            let b = 500.0 + 10.0 * ((i * 7) % 5) as f64;
            out.push(rec("France", "Title A", year, month, a));
            out.push(rec("France", "Title B", year, month, b));
            out.push(rec("Germany", "Title A", year, month, a * 2.0));
        }
        out.reverse();
        out.swap(3, 40);
        out
    }

    #[test]
    fn stabilizing_transform_round_trips() {
        for x in [0.0, 1.0, 2.5, 100.0, 12_345.0, 1.0e6] {
            let back = restore(stabilize(x));
            assert!((back - x).abs() <= 1e-9 * x.max(1.0), "x={x} back={back}");
        }
        assert_eq!(restore(stabilize(0.0)), 0.0);
    }

    #[test]
    fn movie_series_is_sorted_and_complete() {
        let series = monthly_series(&sample_records(), "France", "Title A").unwrap();
        assert_eq!(series.len(), 24);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn country_aggregate_sums_movies_per_month() {
        let records = vec![
            rec("France", "A", 2021, 1, 100.0),
            rec("France", "B", 2021, 1, 50.0),
            rec("France", "A", 2021, 2, 10.0),
            rec("Germany", "A", 2021, 1, 999.0),
        ];
        let series = monthly_series(&records, "France", "").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].revenue, 150.0);
        assert_eq!(series[1].revenue, 10.0);
    }

    #[test]
    fn unknown_selection_has_no_data() {
        let err = monthly_series(&sample_records(), "Spain", "").unwrap_err();
        assert!(matches!(err, CoreError::NoMatchingData { .. }));

        let err = forecast(
            &sample_records(),
            "France",
            "Title Z",
            &ForecastConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NoMatchingData { .. }));
    }

    #[test]
    fn single_point_is_insufficient() {
        let records = vec![rec("France", "A", 2021, 1, 100.0)];
        let err = forecast(&records, "France", "A", &ForecastConfig::default()).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientData {
                required: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn invalid_month_and_revenue_are_rejected() {
        let records = vec![rec("France", "A", 2021, 13, 100.0)];
        assert!(matches!(
            monthly_series(&records, "France", "A"),
            Err(CoreError::InvalidRecord(_))
        ));
        let records = vec![rec("France", "A", 2021, 1, -5.0)];
        assert!(matches!(
            monthly_series(&records, "France", "A"),
            Err(CoreError::InvalidRecord(_))
        ));
    }

    #[test]
    fn forecast_has_anchor_plus_horizon_points() {
        let result = forecast(
            &sample_records(),
            "France",
            "Title A",
            &ForecastConfig::default(),
        )
        .unwrap();

        assert_eq!(result.history.len(), 24);
        assert_eq!(result.forecast.len(), 4);
        assert_eq!(result.horizon_points().len(), 3);
        assert_eq!(result.caption, "Revenue Forecasting for Title A in France");

        let last = result.history.last().unwrap();
        let anchor = result.forecast[0];
        assert_eq!(anchor.date, last.date);
        assert_eq!(anchor.point, last.revenue);
        assert_eq!(anchor.lower, last.revenue);
        assert_eq!(anchor.upper, last.revenue);

        let expected_dates: Vec<NaiveDate> = (1..=3)
            .map(|m| last.date.checked_add_months(Months::new(m)).unwrap())
            .collect();
        let dates: Vec<NaiveDate> = result.horizon_points().iter().map(|p| p.date).collect();
        assert_eq!(dates, expected_dates);

        // With contiguous months the anchored x-axis equals the last four
        // historical months shifted forward by three.
        let shifted: Vec<NaiveDate> = result.history[result.history.len() - 4..]
            .iter()
            .map(|p| p.date.checked_add_months(Months::new(3)).unwrap())
            .collect();
        let anchored: Vec<NaiveDate> = result.forecast.iter().map(|p| p.date).collect();
        assert_eq!(anchored, shifted);
    }

    #[test]
    fn bounds_bracket_point_forecast() {
        for movie in ["Title A", "Title B", ""] {
            let result =
                forecast(&sample_records(), "France", movie, &ForecastConfig::default()).unwrap();
            for p in &result.forecast {
                assert!(p.lower <= p.point && p.point <= p.upper, "{movie}: {p:?}");
                assert!(p.point.is_finite() && p.upper.is_finite());
            }
        }
    }

    #[test]
    fn country_forecast_uses_aggregate_history() {
        let result = forecast(&sample_records(), "France", "", &ForecastConfig::default()).unwrap();
        assert_eq!(result.scope, ForecastScope::Country);
        assert_eq!(result.caption, "Revenue Forecasting for France");

        let a = monthly_series(&sample_records(), "France", "Title A").unwrap();
        let b = monthly_series(&sample_records(), "France", "Title B").unwrap();
        for ((total, pa), pb) in result.history.iter().zip(&a).zip(&b) {
            assert!((total.revenue - (pa.revenue + pb.revenue)).abs() < 1e-9);
        }
    }

    #[test]
    fn two_point_series_forecasts() {
        let records = vec![
            rec("France", "A", 2021, 11, 100.0),
            rec("France", "A", 2021, 12, 140.0),
        ];
        let result = forecast(&records, "France", "A", &ForecastConfig::default()).unwrap();
        assert_eq!(result.forecast.len(), 4);
        assert_eq!(
            result.forecast[3].date,
            NaiveDate::from_ymd_opt(2022, 3, 1).unwrap()
        );
    }

    #[test]
    fn all_zero_revenue_forecasts_in_both_search_modes() {
        let records: Vec<RevenueRecord> = (1..=12)
            .map(|month| rec("France", "Flop", 2021, month, 0.0))
            .collect();

        for mode in [SearchMode::Grid, SearchMode::Stepwise] {
            let mut config = ForecastConfig::default();
            config.search.mode = mode;
            let result = forecast(&records, "France", "Flop", &config).unwrap();

            assert_eq!(result.forecast.len(), 4, "{mode:?}");
            for p in &result.forecast {
                assert!(p.point.is_finite(), "{mode:?}: {p:?}");
                assert!(p.lower <= p.point && p.point <= p.upper, "{mode:?}: {p:?}");
                assert!(p.point.abs() < 1e-9, "{mode:?}: {p:?}");
            }
        }
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let config = ForecastConfig {
            horizon: 0,
            ..ForecastConfig::default()
        };
        let err = forecast(&sample_records(), "France", "", &config).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }
}
