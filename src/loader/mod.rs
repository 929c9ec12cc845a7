//! Letterboxd export loading
//!
//! Reads `ratings.csv` (required) and left-joins `reviews.csv` (optional)
//! on `(Name, Year)`. Every loaded row is a watched movie.

use crate::error::{Error, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Ratings export file name
pub const RATINGS_FILE: &str = "ratings.csv";

/// Reviews export file name
pub const REVIEWS_FILE: &str = "reviews.csv";

/// One watched movie from the export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRecord {
    pub title: String,
    pub year: Option<i32>,
    pub rating: Option<f32>,
    pub review: String,
    pub watched: bool,
}

type JoinKey = (String, Option<i32>);

/// Load the watch history from an export folder
pub fn load_letterboxd(folder: &Path) -> Result<Vec<WatchRecord>> {
    let ratings_path = folder.join(RATINGS_FILE);
    if !ratings_path.is_file() {
        return Err(Error::MissingRatings(ratings_path));
    }

    let reviews = read_reviews(&folder.join(REVIEWS_FILE));

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(&ratings_path)?;
    let headers = reader.headers()?.clone();

    let name_idx = column(&headers, "Name").ok_or_else(|| {
        Error::Other(format!("{} has no Name column", ratings_path.display()))
    })?;
    let year_idx = column(&headers, "Year");
    let rating_idx = column(&headers, "Rating");
    if rating_idx.is_none() {
        debug!("No Rating column, defaulting every rating to 0.0");
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let title = field(&row, Some(name_idx)).trim().to_string();
        let year = normalize_year(field(&row, year_idx));
        let rating = match rating_idx {
            Some(idx) => normalize_rating(field(&row, Some(idx))),
            None => Some(0.0),
        };
        let review = reviews
            .get(&(title.clone(), year))
            .cloned()
            .unwrap_or_default();

        records.push(WatchRecord {
            title,
            year,
            rating,
            review,
            watched: true,
        });
    }

    info!(
        "Loaded {} watched movies ({} with reviews)",
        records.len(),
        records.iter().filter(|r| !r.review.is_empty()).count()
    );
    Ok(records)
}

/// Read reviews keyed by (title, year); any failure yields an empty map
fn read_reviews(path: &Path) -> HashMap<JoinKey, String> {
    if !path.is_file() {
        debug!("No reviews export at {:?}", path);
        return HashMap::new();
    }

    match try_read_reviews(path) {
        Ok(reviews) => reviews,
        Err(e) => {
            warn!("Ignoring unreadable reviews export {:?}: {}", path, e);
            HashMap::new()
        }
    }
}

fn try_read_reviews(path: &Path) -> Result<HashMap<JoinKey, String>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let (name_idx, review_idx) = match (column(&headers, "Name"), column(&headers, "Review")) {
        (Some(name), Some(review)) => (name, review),
        _ => {
            return Err(Error::Other(
                "reviews export needs Name and Review columns".to_string(),
            ))
        }
    };
    let year_idx = column(&headers, "Year");

    let mut reviews = HashMap::new();
    for row in reader.records() {
        let row = row?;
        let key = (
            field(&row, Some(name_idx)).trim().to_string(),
            normalize_year(field(&row, year_idx)),
        );
        // Keep the first review so each rating row stays a single record
        reviews
            .entry(key)
            .or_insert_with(|| field(&row, Some(review_idx)).trim().to_string());
    }

    Ok(reviews)
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn field(row: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).unwrap_or("")
}

/// Parse a release year, accepting `2016` and `2016.0`
pub fn normalize_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|y| y.is_finite() && y.fract() == 0.0 && y.abs() <= i32::MAX as f64)
        .map(|y| y as i32)
}

/// Parse a star rating
pub fn normalize_rating(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|r| r.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn export(ratings: &str, reviews: Option<&str>) -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(RATINGS_FILE), ratings).unwrap();
        if let Some(reviews) = reviews {
            std::fs::write(tmp.path().join(REVIEWS_FILE), reviews).unwrap();
        }
        tmp
    }

    #[test]
    fn test_single_row_without_reviews() {
        let tmp = export("Name,Year,Rating\nArrival,2016,4.5\n", None);
        let records = load_letterboxd(tmp.path()).unwrap();

        assert_eq!(
            records,
            vec![WatchRecord {
                title: "Arrival".to_string(),
                year: Some(2016),
                rating: Some(4.5),
                review: String::new(),
                watched: true,
            }]
        );
    }

    #[test]
    fn test_missing_ratings_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        match load_letterboxd(tmp.path()) {
            Err(Error::MissingRatings(path)) => assert!(path.ends_with(RATINGS_FILE)),
            other => panic!("expected MissingRatings, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_rating_column_defaults_to_zero() {
        let tmp = export("Date,Name,Year\n2024-01-01,Heat,1995\n2024-01-02,Ran,1985\n", None);
        let records = load_letterboxd(tmp.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.rating == Some(0.0) && r.watched));
    }

    #[test]
    fn test_reviews_are_left_joined_by_title_and_year() {
        let tmp = export(
            "Date,Name,Year,Letterboxd URI,Rating\n\
             2024-01-01,Dune,2021,x,4\n\
             2024-01-02,Dune,1984,x,2\n\
             2024-01-03,Heat,1995,x,5\n",
            Some(
                "Date,Name,Year,Letterboxd URI,Rating,Rewatch,Review\n\
                 2024-01-01,Dune,2021,x,4,,\"Huge, loud, great.\"\n\
                 2024-01-01,Dune,2021,x,4,Yes,second review\n",
            ),
        );
        let records = load_letterboxd(tmp.path()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].review, "Huge, loud, great.");
        assert_eq!(records[1].review, "");
        assert_eq!(records[2].review, "");
    }

    #[test]
    fn test_unreadable_reviews_are_ignored() {
        let tmp = export("Name,Year,Rating\nHeat,1995,5\n", Some("Title,Text\nHeat,x\n"));
        let records = load_letterboxd(tmp.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].review, "");
    }

    #[test]
    fn test_malformed_fields_become_unknown() {
        let tmp = export("Name,Year,Rating\n Solaris ,unknown,\n", None);
        let records = load_letterboxd(tmp.path()).unwrap();

        assert_eq!(records[0].title, "Solaris");
        assert_eq!(records[0].year, None);
        assert_eq!(records[0].rating, None);
    }

    #[test]
    fn test_normalize_year() {
        assert_eq!(normalize_year("2016"), Some(2016));
        assert_eq!(normalize_year(" 2016.0 "), Some(2016));
        assert_eq!(normalize_year("2016.5"), None);
        assert_eq!(normalize_year(""), None);
        assert_eq!(normalize_year("NaN"), None);
    }

    #[test]
    fn test_normalize_rating() {
        assert_eq!(normalize_rating("3.5"), Some(3.5));
        assert_eq!(normalize_rating("nan"), None);
        assert_eq!(normalize_rating("five"), None);
    }
}
