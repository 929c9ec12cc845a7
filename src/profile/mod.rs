//! Summary statistics over a loaded watch history

use crate::loader::WatchRecord;
use crate::retrieval::{sort_by_rating_desc, RetrievedMovie};
use serde::Serialize;

/// Rating counted as highly rated
pub const HIGH_RATING: f32 = 4.0;

/// Rating a favourite needs
pub const FAVOURITE_RATING: f32 = 4.5;

/// First year counted as recent
pub const RECENT_YEAR: i32 = 2020;

const MAX_FAVOURITES: usize = 5;

/// Overview of a watch history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub total: usize,
    /// Mean over known ratings, 0.0 when none are known
    pub average_rating: f32,
    pub high_rated: usize,
    pub recent: usize,
    pub favourites: Vec<RetrievedMovie>,
}

impl ProfileStats {
    pub fn from_records(records: &[WatchRecord]) -> Self {
        let ratings: Vec<f32> = records.iter().filter_map(|r| r.rating).collect();
        let average_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f32>() / ratings.len() as f32
        };

        let mut favourites: Vec<RetrievedMovie> = records
            .iter()
            .filter(|r| r.rating.is_some_and(|v| v >= FAVOURITE_RATING))
            .map(|r| RetrievedMovie {
                title: r.title.clone(),
                year: r.year,
                rating: r.rating,
                watched: r.watched,
            })
            .collect();
        sort_by_rating_desc(&mut favourites);
        favourites.truncate(MAX_FAVOURITES);

        Self {
            total: records.len(),
            average_rating,
            high_rated: ratings.iter().filter(|&&v| v >= HIGH_RATING).count(),
            recent: records
                .iter()
                .filter(|r| r.year.is_some_and(|y| y >= RECENT_YEAR))
                .count(),
            favourites,
        }
    }
}
