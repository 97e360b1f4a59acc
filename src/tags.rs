//! Movie tag lookup.

use tracing::warn;

use crate::domain::{TagSummary, TagTable};
use crate::error::CoreError;

/// Tags flagged (value 1) for `movie`, in column order.
///
/// Matching is exact on the movie title. If the sheet lists the same title
/// more than once, the first row wins.
pub fn movie_tags(table: &TagTable, movie: &str) -> Result<TagSummary, CoreError> {
    let mut matches = table.rows.iter().filter(|row| row.movie == movie);
    let row = matches
        .next()
        .ok_or_else(|| CoreError::MovieNotFound(movie.to_string()))?;

    let extra = matches.count();
    if extra > 0 {
        warn!(movie, extra, "movie listed more than once in tag table; using first row");
    }

    let tags = table
        .tag_names
        .iter()
        .zip(row.flags.iter())
        .filter(|(_, flagged)| **flagged)
        .map(|(name, _)| name.clone())
        .collect();

    Ok(TagSummary {
        movie: movie.to_string(),
        tags,
    })
}

/// The tag line shown next to the charts.
pub fn tag_line(table: &TagTable, movie: &str) -> Result<String, CoreError> {
    movie_tags(table, movie).map(|summary| summary.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MovieTagRecord;

    fn table() -> TagTable {
        TagTable {
            tag_names: vec!["Action".into(), "Comedy".into(), "Drama".into()],
            rows: vec![
                MovieTagRecord {
                    movie: "Title A".into(),
                    flags: vec![true, false, true],
                },
                MovieTagRecord {
                    movie: "Title B".into(),
                    flags: vec![false, false, false],
                },
                MovieTagRecord {
                    movie: "Title A".into(),
                    flags: vec![false, true, false],
                },
            ],
        }
    }

    #[test]
    fn flagged_tags_in_column_order() {
        let line = tag_line(&table(), "Title A").unwrap();
        assert_eq!(line, "Tags: Action, Drama (tags can be genres for example)");
    }

    #[test]
    fn untagged_movie_renders_empty_list() {
        let summary = movie_tags(&table(), "Title B").unwrap();
        assert!(summary.tags.is_empty());
        assert_eq!(
            summary.to_string(),
            "Tags:  (tags can be genres for example)"
        );
    }

    #[test]
    fn unknown_movie_is_an_error() {
        let err = movie_tags(&table(), "Title Z").unwrap_err();
        assert_eq!(err, CoreError::MovieNotFound("Title Z".to_string()));
    }

    #[test]
    fn first_duplicate_row_wins() {
        let summary = movie_tags(&table(), "Title A").unwrap();
        assert_eq!(summary.tags, vec!["Action".to_string(), "Drama".to_string()]);
    }
}
