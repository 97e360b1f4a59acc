//! Plotters-powered forecast chart widget for Ratatui.
//!
//! Plotters gives nicer axis and mesh rendering than Ratatui's built-in
//! `Chart` widget. Its output is drawn into the Ratatui buffer with
//! `plotters-ratatui-backend`.

use chrono::NaiveDate;
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Line colors of the dashboard charts.
pub const HISTORY_COLOR: RGBColor = RGBColor(31, 119, 180); // blue
pub const FORECAST_COLOR: RGBColor = RGBColor(214, 39, 40); // red
pub const BOUND_COLOR: RGBColor = RGBColor(255, 127, 14); // orange

/// A render-only chart description.
///
/// All series and bounds are computed outside the render call; x values are
/// month indices counted from the first historical month.
pub struct ForecastPlottersChart<'a> {
    pub history: &'a [(f64, f64)],
    /// Point forecast, starting at the anchor.
    pub forecast: &'a [(f64, f64)],
    pub lower: &'a [(f64, f64)],
    pub upper: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
    /// Month of x = 0; x ticks are labelled `YYYY-MM`.
    pub x_origin: NaiveDate,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for ForecastPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite())
            || x1 <= x0
            || y1 <= y0
        {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("month")
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| super::month_label(self.x_origin, *v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // Bounds first so the point forecast stays visible where they meet.
            chart.draw_series(LineSeries::new(self.lower.iter().copied(), &BOUND_COLOR))?;
            chart.draw_series(LineSeries::new(self.upper.iter().copied(), &BOUND_COLOR))?;
            chart.draw_series(LineSeries::new(self.forecast.iter().copied(), &FORECAST_COLOR))?;
            chart.draw_series(LineSeries::new(self.history.iter().copied(), &HISTORY_COLOR))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
