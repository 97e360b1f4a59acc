//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed months: `o`, joined by `-`
//! - point forecast: `*`
//! - interval bounds: `.`
//!
//! The x-axis is the month index; the forecast starts at the last observed
//! month (the anchor).

use crate::domain::{ForecastPoint, ForecastResult};

/// Render history and forecast of one result.
pub fn render_forecast_plot(result: &ForecastResult, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (Some(first), Some(last)) = (result.history.first(), result.history.last()) else {
        return "Plot: no data\n".to_string();
    };

    let anchor_x = (result.history.len() - 1) as f64;
    let history: Vec<(f64, f64)> = result
        .history
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.revenue))
        .collect();
    let series = |value: fn(&ForecastPoint) -> f64| -> Vec<(f64, f64)> {
        result
            .forecast
            .iter()
            .enumerate()
            .map(|(i, p)| (anchor_x + i as f64, value(p)))
            .collect()
    };
    let point = series(|p| p.point);
    let lower = series(|p| p.lower);
    let upper = series(|p| p.upper);

    let x_max = history
        .iter()
        .chain(point.iter())
        .map(|&(x, _)| x)
        .fold(0.0, f64::max)
        .max(1.0);

    let (y_min, y_max) = y_range(&[&history, &point, &lower, &upper]).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let frame = Frame {
        x_max,
        y_min,
        y_max,
        width,
        height,
    };

    // Markers first; connecting lines only fill empty cells.
    for &(x, y) in &history {
        let (col, row) = frame.cell(x, y);
        grid[row][col] = 'o';
    }
    for &(x, y) in point.iter().skip(1) {
        let (col, row) = frame.cell(x, y);
        grid[row][col] = '*';
    }
    draw_path(&mut grid, &frame, &history, '-');
    draw_path(&mut grid, &frame, &point, '*');
    draw_path(&mut grid, &frame, &lower, '.');
    draw_path(&mut grid, &frame, &upper, '.');

    let end = result.forecast.last().map(|p| p.date).unwrap_or(last.date);
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} .. {} | revenue=[{y_min:.2}, {y_max:.2}]\n",
        first.date.format("%Y-%m"),
        end.format("%Y-%m"),
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out.push_str(&format!(
        "o history  * forecast  . {:.0}% interval\n",
        result.confidence * 100.0
    ));

    out
}

struct Frame {
    x_max: f64,
    y_min: f64,
    y_max: f64,
    width: usize,
    height: usize,
}

impl Frame {
    fn cell(&self, x: f64, y: f64) -> (usize, usize) {
        (
            map_x(x, 0.0, self.x_max, self.width),
            map_y(y, self.y_min, self.y_max, self.height),
        )
    }
}

fn y_range(series: &[&[(f64, f64)]]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in series.iter().flat_map(|s| s.iter()) {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        Some((min_y - 1.0, min_y + 1.0))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_path(grid: &mut [Vec<char>], frame: &Frame, path: &[(f64, f64)], ch: char) {
    for w in path.windows(2) {
        let (x0, y0) = frame.cell(w[0].0, w[0].1);
        let (x1, y1) = frame.cell(w[1].0, w[1].1);
        draw_line(grid, x0, y0, x1, y1, ch);
    }
}

/// Integer line drawing (Bresenham-ish). Only empty cells are written.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::forecast_result;

    #[test]
    fn plot_golden_snapshot_small() {
        let txt = render_forecast_plot(&forecast_result(), 13, 6);
        let expected = concat!(
            "Plot: 2021-09 .. 2022-03 | revenue=[73.00, 447.00]\n",
            "           ..\n",
            "         ..\n",
            "       ..\n",
            "      o******\n",
            " -o  - ......\n",
            "o  -o\n",
            "o history  * forecast  . 95% interval\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_history_renders_placeholder() {
        let mut result = forecast_result();
        result.history.clear();
        assert_eq!(render_forecast_plot(&result, 40, 10), "Plot: no data\n");
    }
}
