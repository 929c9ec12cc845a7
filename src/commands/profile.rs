//! Profile command implementation

use crate::error::Result;
use crate::loader::load_letterboxd;
use crate::profile::{ProfileStats, FAVOURITE_RATING, RECENT_YEAR};
use std::path::Path;
use tracing::info;

/// Summarize the watch history in an export folder
pub fn cmd_profile(folder: &Path) -> Result<ProfileStats> {
    info!("Analyzing {}", folder.display());
    let records = load_letterboxd(folder)?;
    Ok(ProfileStats::from_records(&records))
}

/// Print profile stats to console
pub fn print_profile(stats: &ProfileStats) {
    println!("\n📊 Profile\n");
    println!("Movies watched: {}", stats.total);
    println!("Average rating: {:.1}/5", stats.average_rating);
    println!("Highly rated: {}", stats.high_rated);
    println!("Since {}: {}", RECENT_YEAR, stats.recent);

    println!("\n🌟 Favourites\n");
    if stats.favourites.is_empty() {
        println!("No movies rated {} or higher yet.", FAVOURITE_RATING);
        return;
    }
    for movie in &stats.favourites {
        println!("• {} - {:.1}/5", movie, movie.rating.unwrap_or_default());
    }
}
