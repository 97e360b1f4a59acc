//! Seeded dummy dataset generation.
//!
//! Produces a workbook-shaped `Dataset` (revenue rows + tag table) so the
//! dashboard runs without any input file. Generation is deterministic for a
//! given `SampleConfig`.

use std::f64::consts::PI;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Dataset, MovieTagRecord, RevenueRecord, TagTable};
use crate::error::AppError;

pub const DEFAULT_SEED: u64 = 42;

/// Knobs for the dummy dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub seed: u64,
    pub countries: Vec<String>,
    pub movies: Vec<String>,
    pub tag_names: Vec<String>,
    /// First month of the panel.
    pub start_year: i32,
    pub start_month: u32,
    /// Length of the panel in months.
    pub months: usize,
    /// Std dev of the multiplicative log-noise.
    pub noise: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        let names = |xs: &[&str]| -> Vec<String> { xs.iter().map(|s| s.to_string()).collect() };
        Self {
            seed: DEFAULT_SEED,
            countries: names(&["France", "Germany", "Japan", "United States"]),
            movies: names(&["Title A", "Title B", "Title C", "Title D", "Title E"]),
            tag_names: names(&["Action", "Comedy", "Drama", "Horror", "Romance", "Sci-Fi"]),
            start_year: 2019,
            start_month: 1,
            months: 36,
            noise: 0.08,
        }
    }
}

/// Generate a revenue panel and a tag table.
///
/// Every movie gets a release month; before it there is no revenue row.
/// Releases are spread over the first third of the panel so each series has
/// at least two thirds of the months. The first movie is released in month 0
/// everywhere.
pub fn generate_dummy_dataset(config: &SampleConfig) -> Result<Dataset, AppError> {
    if config.countries.is_empty() || config.movies.is_empty() {
        return Err(AppError::new(2, "Sample needs at least one country and one movie."));
    }
    if config.months < 2 {
        return Err(AppError::new(2, "Sample needs at least 2 months."));
    }
    if !(1..=12).contains(&config.start_month) {
        return Err(AppError::new(2, "Sample start month must be in 1..=12."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Sample noise must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let latest_release = config.months / 3;
    let mut revenue = Vec::with_capacity(config.countries.len() * config.movies.len() * config.months);

    for country in &config.countries {
        // Market size shared by all movies of a country.
        let market = rng.gen_range(0.5..2.0);

        for (movie_idx, movie) in config.movies.iter().enumerate() {
            let release = if movie_idx == 0 {
                0
            } else {
                rng.gen_range(0..=latest_release)
            };
            let level = market * rng.gen_range(5_000.0..50_000.0);
            // Monthly growth in log space; most titles decay slowly after release.
            let drift = rng.gen_range(-0.03..0.02);
            let season_amp = rng.gen_range(0.05..0.25);
            let season_phase = rng.gen_range(0.0..(2.0 * PI));

            for t in release..config.months {
                let (year, month) = month_at(config.start_year, config.start_month, t);
                let age = (t - release) as f64;
                let season = season_amp * (2.0 * PI * month as f64 / 12.0 + season_phase).sin();
                let noise = config.noise * normal.sample(&mut rng);
                let value = level * (drift * age + season + noise).exp();

                revenue.push(RevenueRecord {
                    country: country.clone(),
                    movie: movie.clone(),
                    year,
                    month,
                    revenue: (value * 100.0).round() / 100.0,
                });
            }
        }
    }

    let rows = config
        .movies
        .iter()
        .map(|movie| MovieTagRecord {
            movie: movie.clone(),
            flags: config.tag_names.iter().map(|_| rng.gen_bool(0.35)).collect(),
        })
        .collect();

    Ok(Dataset {
        revenue,
        tags: TagTable {
            tag_names: config.tag_names.clone(),
            rows,
        },
    })
}

/// Calendar (year, month) `offset` months after the start month.
fn month_at(start_year: i32, start_month: u32, offset: usize) -> (i32, u32) {
    let zero_based = (start_month - 1) as usize + offset;
    (start_year + (zero_based / 12) as i32, (zero_based % 12) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_arithmetic_wraps_years() {
        assert_eq!(month_at(2019, 1, 0), (2019, 1));
        assert_eq!(month_at(2019, 11, 2), (2020, 1));
        assert_eq!(month_at(2019, 1, 35), (2021, 12));
    }

    #[test]
    fn same_seed_same_dataset() {
        let config = SampleConfig::default();
        let a = generate_dummy_dataset(&config).unwrap();
        let b = generate_dummy_dataset(&config).unwrap();
        assert_eq!(a.revenue, b.revenue);
        assert_eq!(a.tags, b.tags);

        let other = generate_dummy_dataset(&SampleConfig {
            seed: 7,
            ..config
        })
        .unwrap();
        assert_ne!(a.revenue, other.revenue);
    }

    #[test]
    fn every_series_is_long_enough_and_valid() {
        let config = SampleConfig::default();
        let data = generate_dummy_dataset(&config).unwrap();

        for country in &config.countries {
            for movie in &config.movies {
                let n = data
                    .revenue
                    .iter()
                    .filter(|r| &r.country == country && &r.movie == movie)
                    .count();
                assert!(n >= config.months - config.months / 3, "{country}/{movie}: {n}");
            }
        }
        assert!(data
            .revenue
            .iter()
            .all(|r| r.revenue.is_finite() && r.revenue >= 0.0 && (1..=12).contains(&r.month)));

        let first = data.revenue.iter().filter(|r| r.movie == "Title A").count();
        assert_eq!(first, config.countries.len() * config.months);
    }

    #[test]
    fn tag_table_covers_all_movies() {
        let config = SampleConfig::default();
        let data = generate_dummy_dataset(&config).unwrap();
        assert_eq!(data.tags.tag_names, config.tag_names);
        assert_eq!(data.tags.rows.len(), config.movies.len());
        assert!(data.tags.rows.iter().all(|r| r.flags.len() == config.tag_names.len()));
    }

    #[test]
    fn rejects_empty_config() {
        let config = SampleConfig {
            movies: Vec::new(),
            ..SampleConfig::default()
        };
        assert_eq!(generate_dummy_dataset(&config).unwrap_err().exit_code(), 2);
    }
}
