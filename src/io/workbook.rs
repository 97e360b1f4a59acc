//! Workbook ingest.
//!
//! A workbook is a directory holding two CSV sheets:
//!
//! - `Sheet1.csv`: revenue rows `Country, Movie, Year, Month, Revenue`
//! - `Sheet2.csv`: `Movie` followed by one 0/1 column per tag
//!
//! Headers are matched case-insensitively (a UTF-8 BOM on the first header is
//! ignored). Bad rows are skipped and reported as `RowError`s; missing columns
//! or an empty revenue sheet fail the whole load.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{Dataset, MovieTagRecord, RevenueRecord, TagTable};
use crate::error::AppError;

pub const REVENUE_SHEET: &str = "Sheet1.csv";
pub const TAG_SHEET: &str = "Sheet2.csv";

const REVENUE_COLUMNS: [&str; 5] = ["country", "movie", "year", "month", "revenue"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub sheet: &'static str,
    pub line: usize,
    pub message: String,
}

/// Ingest output: the dataset plus what was skipped on the way.
#[derive(Debug, Clone)]
pub struct LoadedWorkbook {
    pub dataset: Dataset,
    pub row_errors: Vec<RowError>,
}

/// Load both sheets of the workbook at `dir`.
pub fn load_workbook(dir: &Path) -> Result<LoadedWorkbook, AppError> {
    let mut row_errors = Vec::new();

    let revenue = read_revenue_sheet(&dir.join(REVENUE_SHEET), &mut row_errors)?;
    let tags = read_tag_sheet(&dir.join(TAG_SHEET), &mut row_errors)?;

    if revenue.is_empty() {
        return Err(AppError::new(
            3,
            format!("No valid revenue rows in '{}'.", dir.join(REVENUE_SHEET).display()),
        ));
    }

    for e in &row_errors {
        warn!(sheet = e.sheet, line = e.line, "skipped row: {}", e.message);
    }
    debug!(
        revenue_rows = revenue.len(),
        tag_rows = tags.rows.len(),
        skipped = row_errors.len(),
        "workbook loaded"
    );

    Ok(LoadedWorkbook {
        dataset: Dataset { revenue, tags },
        row_errors,
    })
}

/// Write a dataset as a workbook directory (creating it if needed).
pub fn write_workbook(dir: &Path, dataset: &Dataset) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::new(2, format!("Failed to create workbook dir '{}': {e}", dir.display()))
    })?;

    let path = dir.join(REVENUE_SHEET);
    let mut writer = csv_writer(&path)?;
    write_record(&mut writer, &path, ["Country", "Movie", "Year", "Month", "Revenue"])?;
    for r in &dataset.revenue {
        let year = r.year.to_string();
        let month = r.month.to_string();
        let revenue = format!("{:.2}", r.revenue);
        write_record(
            &mut writer,
            &path,
            [r.country.as_str(), r.movie.as_str(), year.as_str(), month.as_str(), revenue.as_str()],
        )?;
    }
    flush(&mut writer, &path)?;

    let path = dir.join(TAG_SHEET);
    let mut writer = csv_writer(&path)?;
    let header = std::iter::once("Movie").chain(dataset.tags.tag_names.iter().map(String::as_str));
    write_record(&mut writer, &path, header)?;
    for row in &dataset.tags.rows {
        let fields = std::iter::once(row.movie.as_str())
            .chain(row.flags.iter().map(|&f| if f { "1" } else { "0" }));
        write_record(&mut writer, &path, fields)?;
    }
    flush(&mut writer, &path)
}

fn read_revenue_sheet(
    path: &Path,
    row_errors: &mut Vec<RowError>,
) -> Result<Vec<RevenueRecord>, AppError> {
    let mut reader = open_sheet(path)?;
    let headers = read_headers(&mut reader, path)?;
    let header_map = build_header_map(&headers);

    for name in REVENUE_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::new(
                2,
                format!("Missing required column in {REVENUE_SHEET}: `{name}`"),
            ));
        }
    }

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; lines are 1-based.
        let line = idx + 2;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_revenue_row(&record, &header_map));
        match parsed {
            Ok(r) => out.push(r),
            Err(message) => row_errors.push(RowError {
                sheet: REVENUE_SHEET,
                line,
                message,
            }),
        }
    }
    Ok(out)
}

fn read_tag_sheet(path: &Path, row_errors: &mut Vec<RowError>) -> Result<TagTable, AppError> {
    let mut reader = open_sheet(path)?;
    let headers = read_headers(&mut reader, path)?;
    let header_map = build_header_map(&headers);

    let movie_idx = *header_map.get("movie").ok_or_else(|| {
        AppError::new(2, format!("Missing required column in {TAG_SHEET}: `movie`"))
    })?;

    // Every other column is a tag, kept in sheet order with its display name.
    let tag_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != movie_idx)
        .map(|(idx, name)| (idx, clean_header(name).to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_tag_row(&record, movie_idx, &tag_columns));
        match parsed {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError {
                sheet: TAG_SHEET,
                line,
                message,
            }),
        }
    }

    Ok(TagTable {
        tag_names: tag_columns.into_iter().map(|(_, name)| name).collect(),
        rows,
    })
}

fn parse_revenue_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<RevenueRecord, String> {
    let country = get_required(record, header_map, "country")?.to_string();
    let movie = get_required(record, header_map, "movie")?.to_string();
    let year = parse_integer(get_required(record, header_map, "year")?, "year")?;
    let month = parse_integer(get_required(record, header_map, "month")?, "month")?;
    let revenue_raw = get_required(record, header_map, "revenue")?;

    let year = i32::try_from(year).map_err(|_| format!("Year out of range: {year}"))?;
    if !(1..=12).contains(&month) {
        return Err(format!("Month must be in 1..=12, got {month}."));
    }
    let revenue: f64 = revenue_raw
        .parse()
        .map_err(|_| format!("Invalid `revenue` value '{revenue_raw}'."))?;
    if !revenue.is_finite() || revenue < 0.0 {
        return Err(format!("Revenue must be finite and >= 0, got {revenue}."));
    }

    Ok(RevenueRecord {
        country,
        movie,
        year,
        month: month as u32,
        revenue,
    })
}

fn parse_tag_row(
    record: &StringRecord,
    movie_idx: usize,
    tag_columns: &[(usize, String)],
) -> Result<MovieTagRecord, String> {
    let movie = record
        .get(movie_idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing required value: `movie`".to_string())?
        .to_string();

    let flags = tag_columns
        .iter()
        .map(|(idx, name)| {
            let raw = record.get(*idx).map(str::trim).unwrap_or("");
            parse_flag(raw).ok_or_else(|| format!("Invalid value '{raw}' for tag `{name}`."))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MovieTagRecord { movie, flags })
}

/// Only a value equal to 1 marks a tag; blanks count as 0.
fn parse_flag(raw: &str) -> Option<bool> {
    if raw.is_empty() {
        return Some(false);
    }
    let v: f64 = raw.parse().ok()?;
    v.is_finite().then_some(v == 1.0)
}

/// Spreadsheet exports write integers as `2021` or `2021.0`.
fn parse_integer(raw: &str, name: &str) -> Result<i64, String> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(format!("Invalid `{name}` value '{raw}'.")),
    }
}

fn open_sheet(path: &Path) -> Result<csv::Reader<File>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open sheet '{}': {e}", path.display())))?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn read_headers(reader: &mut csv::Reader<File>, path: &Path) -> Result<StringRecord, AppError> {
    reader.headers().cloned().map_err(|e| {
        AppError::new(2, format!("Failed to read headers of '{}': {e}", path.display()))
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (clean_header(name).to_ascii_lowercase(), idx))
        .collect()
}

fn clean_header(name: &str) -> &str {
    // Spreadsheet tools often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').trim()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

pub(crate) fn csv_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
}

pub(crate) fn write_record<I, T>(
    writer: &mut csv::Writer<File>,
    path: &Path,
    fields: I,
) -> Result<(), AppError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(fields)
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}

pub(crate) fn flush(writer: &mut csv::Writer<File>, path: &Path) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}
