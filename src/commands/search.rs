//! Search command implementation

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::expand::expand_query;
use crate::retrieval::{RetrievedMovie, Retriever};
use crate::store::MovieStore;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Search result with the query variants that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub variants: Vec<String>,
    pub movies: Vec<RetrievedMovie>,
}

/// Find watched movies similar to `query`
pub async fn cmd_search(
    config: &Config,
    embedder: &dyn Embedder,
    store: &dyn MovieStore,
    query: &str,
    limit: usize,
    expand: bool,
) -> Result<SearchResult> {
    info!("Searching for: {}", query);

    let expand = expand && config.augmentation.queries;
    let retriever = Retriever::new(embedder, store).with_query_augmentation(expand);
    let movies = retriever.search(query, limit).await?;

    Ok(SearchResult {
        query: query.to_string(),
        variants: if expand {
            expand_query(query)
        } else {
            vec![query.to_string()]
        },
        movies,
    })
}

/// Print search results to console
pub fn print_search_results(result: &SearchResult) {
    println!("\n🔍 Query: {}\n", result.query);
    if result.variants.len() > 1 {
        println!("Variants: {}\n", result.variants.join(" | "));
    }

    if result.movies.is_empty() {
        println!("No movies found. Run 'moviemind index' first.");
        return;
    }

    println!("Found {} movies:\n", result.movies.len());
    for (i, movie) in result.movies.iter().enumerate() {
        match movie.rating {
            Some(rating) => println!("{}. {} - {:.1}/5", i + 1, movie, rating),
            None => println!("{}. {}", i + 1, movie),
        }
    }
}
