//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the forecasting code stays clean and testable
//! - output changes are localized (snapshot tests below)

use crate::domain::{ForecastResult, ModelSummary, TagSummary};
use crate::report::forecast_stats;

/// Format the full forecast report (selection, history, model, forecast table).
pub fn format_forecast_summary(result: &ForecastResult, source_label: &str) -> String {
    let mut out = String::new();

    out.push_str("=== rdash - Revenue Forecast ===\n");
    out.push_str(&format!("{}\n", result.caption));
    out.push_str(&format!("Data: {source_label}\n"));

    if let Some(stats) = forecast_stats(result) {
        out.push_str(&format!(
            "History: n={} | {} .. {} | revenue=[{:.2}, {:.2}]\n",
            result.history.len(),
            stats.first_month.format("%Y-%m"),
            stats.last_month.format("%Y-%m"),
            stats.min_revenue,
            stats.max_revenue,
        ));
        let change = stats
            .change_pct
            .map(|c| format!("{c:+.1}%"))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "Next {} months: total={:.2} | change vs last={change}\n",
            result.horizon_points().len(),
            stats.horizon_total,
        ));
    }

    out.push_str(&format!("Model: {}\n", format_model(&result.model)));
    if result.model.truncated {
        out.push_str("  (order search stopped at the time budget)\n");
    }

    out.push('\n');
    out.push_str(&format_forecast_table(result));
    out
}

/// One-line model description, e.g. `ARIMA(1,1,0) with drift | AIC=-3.250 | ...`.
pub fn format_model(model: &ModelSummary) -> String {
    let constant = match (model.with_intercept, model.order.d) {
        (false, _) => "",
        (true, 0) => " with mean",
        (true, _) => " with drift",
    };
    format!(
        "{}{constant} | {}={:.3} | sigma2={:.4} (log scale) | candidates={}",
        model.order,
        model.criterion.display_name(),
        model.score,
        model.sigma2,
        model.candidates_evaluated,
    )
}

/// Forecast table; the first row is the anchor (last observed month).
pub fn format_forecast_table(result: &ForecastResult) -> String {
    let mut out = String::new();
    let level = format!("{:.0}%", result.confidence * 100.0);

    out.push_str(
        format!(
            "{:<8} {:>12} {:>12} {:>12}\n",
            "month",
            "forecast",
            format!("lower {level}"),
            format!("upper {level}")
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<12} {:-<12} {:-<12}", "", "", "", "").trim_end());
    out.push('\n');

    for (i, p) in result.forecast.iter().enumerate() {
        let marker = if i == 0 { "  (last actual)" } else { "" };
        out.push_str(&format!(
            "{:<8} {:>12.2} {:>12.2} {:>12.2}{marker}\n",
            p.date.format("%Y-%m").to_string(),
            p.point,
            p.lower,
            p.upper,
        ));
    }

    out
}

pub fn format_tags(summary: &TagSummary) -> String {
    summary.to_string()
}

/// Numbered list, one name per line.
pub fn format_name_list(title: &str, names: &[String]) -> String {
    let mut out = format!("{title} ({}):\n", names.len());
    for (idx, name) in names.iter().enumerate() {
        out.push_str(&format!("{:>3}) {name}\n", idx + 1));
    }
    out
}
