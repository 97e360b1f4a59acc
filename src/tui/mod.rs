//! Ratatui-based dashboard.
//!
//! Left: country and movie lists. Right: the movie forecast chart, the
//! country forecast chart and the movie's tag line. Changing the country
//! reloads the movie list and selects its first movie.

use std::io;
use std::time::Duration;

use chrono::{Months, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::pipeline::{
    DashboardView, LoadedData, countries, fallback_message, initial_selection, movies_for_country,
};
use crate::domain::{ForecastConfig, ForecastResult, SearchMode};
use crate::error::{AppError, CoreError};

mod plotters_chart;

use plotters_chart::ForecastPlottersChart;

/// Start the dashboard on an already loaded dataset.
pub fn run(
    data: LoadedData,
    config: ForecastConfig,
    country: Option<&str>,
    movie: Option<&str>,
) -> Result<(), AppError> {
    let mut app = App::new(data, config, country, movie)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Countries,
    Movies,
}

struct App {
    data: LoadedData,
    config: ForecastConfig,
    countries: Vec<String>,
    movies: Vec<String>,
    country_idx: usize,
    movie_idx: usize,
    focus: Focus,
    view: DashboardView,
    status: String,
}

impl App {
    fn new(
        data: LoadedData,
        config: ForecastConfig,
        country: Option<&str>,
        movie: Option<&str>,
    ) -> Result<Self, AppError> {
        let records = &data.dataset.revenue;
        let (country, movie) = initial_selection(records, country, movie)
            .ok_or_else(|| AppError::new(3, "Dataset has no revenue rows."))?;

        let all_countries = countries(records);
        let movies = movies_for_country(records, &country);
        let country_idx = all_countries.iter().position(|c| *c == country).unwrap_or(0);
        let movie_idx = movies.iter().position(|m| *m == movie).unwrap_or(0);

        let view = DashboardView::build(&data.dataset, &country, &movie, &config);
        let status = match data.row_errors.len() {
            0 => format!("Loaded {}", data.source_label),
            n => format!("Loaded {} ({n} rows skipped)", data.source_label),
        };

        Ok(Self {
            data,
            config,
            countries: all_countries,
            movies,
            country_idx,
            movie_idx,
            focus: Focus::Countries,
            view,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
                self.focus = match self.focus {
                    Focus::Countries => Focus::Movies,
                    Focus::Movies => Focus::Countries,
                };
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('s') => {
                self.config.search.mode = match self.config.search.mode {
                    SearchMode::Stepwise => SearchMode::Grid,
                    SearchMode::Grid => SearchMode::Stepwise,
                };
                self.refresh_view();
                self.status = format!("search: {:?}", self.config.search.mode).to_lowercase();
            }
            _ => {}
        }
        false
    }

    fn move_selection(&mut self, delta: isize) {
        match self.focus {
            Focus::Countries => {
                let Some(next) = step(self.country_idx, delta, self.countries.len()) else {
                    return;
                };
                self.country_idx = next;
                self.movies = movies_for_country(&self.data.dataset.revenue, self.country());
                self.movie_idx = 0;
            }
            Focus::Movies => {
                let Some(next) = step(self.movie_idx, delta, self.movies.len()) else {
                    return;
                };
                self.movie_idx = next;
            }
        }
        self.refresh_view();
        self.status = format!("{} / {}", self.country(), self.movie());
    }

    fn refresh_view(&mut self) {
        self.view = DashboardView::build(
            &self.data.dataset,
            self.country(),
            self.movie(),
            &self.config,
        );
    }

    fn country(&self) -> &str {
        self.countries.get(self.country_idx).map_or("", String::as_str)
    }

    fn movie(&self) -> &str {
        self.movies.get(self.movie_idx).map_or("", String::as_str)
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("rdash", Style::default().fg(Color::Cyan)),
                Span::raw(" - Dashboard Demo: revenue forecasts per movie and country"),
            ]),
            Line::from(Span::styled(
                format!(
                    "data: {} | search: {:?} | criterion: {} | {:.0}% interval",
                    self.data.source_label,
                    self.config.search.mode,
                    self.config.search.criterion.display_name(),
                    self.config.confidence * 100.0,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(0)])
            .split(area);

        let lists = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(columns[0]);
        self.draw_list(frame, lists[0], "Country", &self.countries, self.country_idx, Focus::Countries);
        self.draw_list(frame, lists[1], "Movie", &self.movies, self.movie_idx, Focus::Movies);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(50),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(columns[1]);
        draw_forecast_panel(frame, right[0], "Movie forecast", &self.view.movie_forecast);
        draw_forecast_panel(frame, right[1], "Country forecast", &self.view.country_forecast);

        let tags = Paragraph::new(self.view.tags_line())
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Tags").borders(Borders::ALL));
        frame.render_widget(tags, right[2]);
    }

    fn draw_list(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        title: &str,
        names: &[String],
        selected: usize,
        focus: Focus,
    ) {
        let items: Vec<ListItem> = names.iter().map(|n| ListItem::new(n.as_str())).collect();
        let border = if self.focus == focus {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(title.to_string())
                    .borders(Borders::ALL)
                    .border_style(border),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select((!names.is_empty()).then_some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab switch list  ↑/↓ select  s search mode  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Move `idx` by `delta` within `0..len`; `None` when it would not change.
fn step(idx: usize, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = idx.saturating_add_signed(delta).min(len - 1);
    (next != idx).then_some(next)
}

fn draw_forecast_panel(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    fallback_title: &str,
    result: &Result<ForecastResult, CoreError>,
) {
    let title = match result {
        Ok(r) => r.caption.clone(),
        Err(_) => fallback_title.to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let result = match result {
        Ok(r) => r,
        Err(err) => {
            let msg = Paragraph::new(fallback_message(err))
                .style(Style::default().fg(Color::Yellow))
                .wrap(Wrap { trim: true });
            frame.render_widget(msg, inner);
            return;
        }
    };

    let Some(series) = chart_series(result) else {
        return;
    };

    let (chart_rect, insets) = chart_layout(inner);
    let widget = ForecastPlottersChart {
        history: &series.history,
        forecast: &series.forecast,
        lower: &series.lower,
        upper: &series.upper,
        x_bounds: series.x_bounds,
        y_bounds: series.y_bounds,
        y_label: "revenue",
        x_origin: series.origin,
        fmt_y: fmt_axis_y,
    };

    frame.render_widget(widget, chart_rect);
    if let Some(insets) = insets {
        draw_axis_ticks(frame, inner, chart_rect, insets, &series);
    }
}

/// Chart series in month-index space.
#[derive(Debug, Clone, PartialEq)]
struct ChartSeries {
    origin: NaiveDate,
    history: Vec<(f64, f64)>,
    forecast: Vec<(f64, f64)>,
    lower: Vec<(f64, f64)>,
    upper: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for Plotters. x is the number of months since the
/// first historical month, so gaps in the history stay visible.
fn chart_series(result: &ForecastResult) -> Option<ChartSeries> {
    let origin = result.history.first()?.date;
    let x_of = |date: NaiveDate| months_between(origin, date) as f64;

    let history: Vec<(f64, f64)> = result
        .history
        .iter()
        .map(|p| (x_of(p.date), p.revenue))
        .collect();
    let forecast: Vec<(f64, f64)> = result.forecast.iter().map(|p| (x_of(p.date), p.point)).collect();
    let lower: Vec<(f64, f64)> = result.forecast.iter().map(|p| (x_of(p.date), p.lower)).collect();
    let upper: Vec<(f64, f64)> = result.forecast.iter().map(|p| (x_of(p.date), p.upper)).collect();

    let x_max = history
        .iter()
        .chain(forecast.iter())
        .map(|&(x, _)| x)
        .fold(0.0, f64::max);
    let x_bounds = [0.0, x_max.max(1.0)];

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in history.iter().chain(&lower).chain(&upper).chain(&forecast) {
        if y.is_finite() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [y_min - pad, y_max + pad];

    Some(ChartSeries {
        origin,
        history,
        forecast,
        lower,
        upper,
        x_bounds,
        y_bounds,
    })
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    use chrono::Datelike;
    (to.year() as i64 - from.year() as i64) * 12 + to.month() as i64 - from.month() as i64
}

/// `YYYY-MM` label of month index `v` counted from `origin`.
fn month_label(origin: NaiveDate, v: f64) -> String {
    if !v.is_finite() || v < -0.5 {
        return String::new();
    }
    origin
        .checked_add_months(Months::new(v.round() as u32))
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn fmt_axis_y(v: f64) -> String {
    if v.abs() >= 10_000.0 {
        format!("{:.0}k", v / 1000.0)
    } else {
        format!("{v:.0}")
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    series: &ChartSeries,
) {
    let ticks = 4usize;
    let style = Style::default().fg(Color::Gray);
    let [x0, x1] = series.x_bounds;
    let [y0, y1] = series.y_bounds;

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = month_label(series.origin, x0 + u * (x1 - x0));
        let label_len = label.len() as u16;
        let start = x
            .saturating_sub(label_len / 2)
            .min((inner.x + inner.width).saturating_sub(label_len));
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_y(y0 + u * (y1 - y0));
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let legend = Paragraph::new("past (blue)  forecast (red)  interval bounds (orange)")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::DIM));
    let legend_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if legend_rect.y < inner.y + inner.height && insets.bottom > 1 {
        frame.render_widget(legend, legend_rect);
    }
}
