//! Export forecast results.
//!
//! CSV is meant for spreadsheets (one row per month, history and forecast
//! together); JSON is the full `ForecastResult` including model diagnostics.

use std::fs::File;
use std::path::Path;

use crate::domain::ForecastResult;
use crate::error::AppError;
use crate::io::workbook::{csv_writer, flush, write_record};

/// Pick the export format from the file extension (`.json`, anything else is CSV).
pub fn write_forecast(path: &Path, result: &ForecastResult) -> Result<(), AppError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        write_forecast_json(path, result)
    } else {
        write_forecast_csv(path, result)
    }
}

/// Write history and forecast rows to a CSV file.
///
/// Columns: `date,kind,revenue,lower,upper`. History rows leave the bounds
/// empty; the anchor row is tagged `anchor`.
pub fn write_forecast_csv(path: &Path, result: &ForecastResult) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;
    write_record(&mut writer, path, ["date", "kind", "revenue", "lower", "upper"])?;

    for p in &result.history {
        let date = p.date.to_string();
        let revenue = format!("{:.4}", p.revenue);
        write_record(
            &mut writer,
            path,
            [date.as_str(), "history", revenue.as_str(), "", ""],
        )?;
    }
    for (i, p) in result.forecast.iter().enumerate() {
        let kind = if i == 0 { "anchor" } else { "forecast" };
        let date = p.date.to_string();
        let [point, lower, upper] = [p.point, p.lower, p.upper].map(|v| format!("{v:.4}"));
        write_record(
            &mut writer,
            path,
            [date.as_str(), kind, point.as_str(), lower.as_str(), upper.as_str()],
        )?;
    }

    flush(&mut writer, path)
}

/// Write the full result as pretty JSON.
pub fn write_forecast_json(path: &Path, result: &ForecastResult) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, result)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ArimaOrder, Criterion, ForecastPoint, ForecastScope, ModelSummary, MonthlyPoint,
    };
    use chrono::NaiveDate;

    fn result() -> ForecastResult {
        let d = |m| NaiveDate::from_ymd_opt(2021, m, 1).unwrap();
        let anchor = ForecastPoint {
            date: d(2),
            point: 20.0,
            lower: 20.0,
            upper: 20.0,
        };
        ForecastResult {
            country: "France".into(),
            scope: ForecastScope::Movie("Title A".into()),
            caption: "Revenue Forecasting for Title A in France".into(),
            history: vec![
                MonthlyPoint {
                    date: d(1),
                    revenue: 10.0,
                },
                MonthlyPoint {
                    date: d(2),
                    revenue: 20.0,
                },
            ],
            forecast: vec![
                anchor,
                ForecastPoint {
                    date: d(3),
                    point: 25.0,
                    lower: 15.0,
                    upper: 40.0,
                },
            ],
            confidence: 0.95,
            model: ModelSummary {
                order: ArimaOrder::new(0, 1, 0),
                with_intercept: true,
                criterion: Criterion::Aic,
                score: 1.5,
                sigma2: 0.25,
                candidates_evaluated: 4,
                truncated: false,
            },
        }
    }

    #[test]
    fn csv_lists_history_then_forecast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_forecast(&path, &result()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,kind,revenue,lower,upper");
        assert_eq!(lines[1], "2021-01-01,history,10.0000,,");
        assert_eq!(lines[3], "2021-02-01,anchor,20.0000,20.0000,20.0000");
        assert_eq!(lines[4], "2021-03-01,forecast,25.0000,15.0000,40.0000");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn csv_quotes_text_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quoted.csv");
        let mut writer = csv_writer(&path).unwrap();
        write_record(&mut writer, &path, ["Title, The", "plain"]).unwrap();
        flush(&mut writer, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "\"Title, The\",plain\n");
    }

    #[test]
    fn json_export_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.JSON");
        write_forecast(&path, &result()).unwrap();

        let file = File::open(&path).unwrap();
        let back: ForecastResult = serde_json::from_reader(file).unwrap();
        assert_eq!(back, result());
    }
}
