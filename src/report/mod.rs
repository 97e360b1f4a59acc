//! Reporting utilities: forecast statistics and formatted terminal output.

use chrono::NaiveDate;

use crate::domain::ForecastResult;

pub mod format;

pub use format::*;

/// Headline numbers of a forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastStats {
    pub first_month: NaiveDate,
    pub last_month: NaiveDate,
    pub last_revenue: f64,
    pub min_revenue: f64,
    pub max_revenue: f64,
    /// Sum of the point forecasts (anchor excluded).
    pub horizon_total: f64,
    /// Last point forecast relative to the last observed month, in percent.
    /// `None` when the last observation is zero.
    pub change_pct: Option<f64>,
}

/// Compute headline numbers; `None` for an empty history.
pub fn forecast_stats(result: &ForecastResult) -> Option<ForecastStats> {
    let first = result.history.first()?;
    let last = result.history.last()?;

    let (min_revenue, max_revenue) = result
        .history
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.revenue), hi.max(p.revenue))
        });

    let horizon = result.horizon_points();
    let horizon_total = horizon.iter().map(|p| p.point).sum();
    let change_pct = horizon
        .last()
        .filter(|_| last.revenue > 0.0)
        .map(|p| 100.0 * (p.point - last.revenue) / last.revenue);

    Some(ForecastStats {
        first_month: first.date,
        last_month: last.date,
        last_revenue: last.revenue,
        min_revenue,
        max_revenue,
        horizon_total,
        change_pct,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_from_history_and_horizon() {
        let stats = forecast_stats(&fixtures::forecast_result()).unwrap();
        assert_eq!(stats.last_revenue, 200.0);
        assert_eq!(stats.min_revenue, 90.0);
        assert_eq!(stats.max_revenue, 200.0);
        assert_eq!(stats.horizon_total, 660.0);
        assert!((stats.change_pct.unwrap() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn zero_last_revenue_has_no_change_pct() {
        let mut result = fixtures::forecast_result();
        result.history.last_mut().unwrap().revenue = 0.0;
        assert_eq!(forecast_stats(&result).unwrap().change_pct, None);
    }
}
