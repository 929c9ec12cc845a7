//! Recommend command implementation

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::generate::Generator;
use crate::recommend::{
    split_recommendations, RecommendationFilters, RecommendationResult, Recommender,
};
use crate::retrieval::Retriever;
use crate::store::MovieStore;
use tracing::info;

/// Recommend unseen movies for `query`
pub async fn cmd_recommend(
    config: &Config,
    embedder: &dyn Embedder,
    store: &dyn MovieStore,
    generator: Option<&dyn Generator>,
    query: &str,
    filters: &RecommendationFilters,
) -> Result<RecommendationResult> {
    info!("Recommending for: {}", query);

    let retriever = Retriever::new(embedder, store)
        .with_query_augmentation(config.augmentation.queries)
        .with_batch_size(config.embedding.batch_size);
    Recommender::new(retriever, generator, config.recommend.clone())
        .recommend(query, filters)
        .await
}

/// Text of a `- ` bullet line; other lines are returned as is
fn bullet_text(line: &str) -> &str {
    line.strip_prefix("- ").unwrap_or(line)
}

/// Print a recommendation to console
pub fn print_recommendation(result: &RecommendationResult) {
    if !result.success {
        println!(
            "\n✗ {}",
            result.error.as_deref().unwrap_or("Recommendation failed")
        );
        return;
    }

    let text = result.recommendations.as_deref().unwrap_or_default();
    match split_recommendations(text) {
        Some((intro, lines)) => {
            if !intro.is_empty() {
                println!("\n{}", intro);
            }
            println!("\n🎬 Recommendations\n");
            for line in lines {
                println!("• {}", bullet_text(&line));
            }
        }
        None => println!("\n{}", text.trim_end()),
    }

    if let Some(found) = result.similar_movies_found {
        println!("\n(based on {} similar movies)", found);
    }
}
