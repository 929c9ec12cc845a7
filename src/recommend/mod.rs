//! Recommendation composition
//!
//! Builds a taste profile from retrieved watched movies, writes a prompt that
//! names the best-rated exemplars and forbids every watched title, and relays
//! it to the generator. Without a generator the similar movies themselves are
//! listed.

use crate::config::RecommendConfig;
use crate::documents::format_rating;
use crate::error::Result;
use crate::generate::Generator;
use crate::retrieval::{sort_by_rating_desc, RetrievedMovie, Retriever};
use crate::store::WatchedFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::{debug, info, warn};

/// Heading that opens the recommendation block of a generated answer
pub const RECOMMENDATIONS_MARKER: &str = "**Önerilerim:**";

/// Failure reported when no watched movie passes the filters
pub const NO_WATCHED_ERROR: &str = "No watched movies found. Load and index your ratings first.";

/// Constraints on the taste profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationFilters {
    pub min_rating: f32,
    pub year_min: i32,
    /// Forbid already watched titles in the prompt
    pub only_unwatched: bool,
}

impl Default for RecommendationFilters {
    fn default() -> Self {
        Self {
            min_rating: 0.0,
            year_min: 1900,
            only_unwatched: true,
        }
    }
}

impl From<&RecommendConfig> for RecommendationFilters {
    fn from(config: &RecommendConfig) -> Self {
        Self {
            min_rating: config.min_rating,
            year_min: config.year_min,
            only_unwatched: true,
        }
    }
}

/// Outcome of one recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_movies_found: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecommendationResult {
    pub fn succeeded(recommendations: String, similar_movies_found: usize) -> Self {
        Self {
            success: true,
            recommendations: Some(recommendations),
            similar_movies_found: Some(similar_movies_found),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            recommendations: None,
            similar_movies_found: None,
            error: Some(error.into()),
        }
    }
}

/// Composes recommendations from retrieval and an optional generator
pub struct Recommender<'a> {
    retriever: Retriever<'a>,
    generator: Option<&'a dyn Generator>,
    settings: RecommendConfig,
}

impl<'a> Recommender<'a> {
    pub fn new(
        retriever: Retriever<'a>,
        generator: Option<&'a dyn Generator>,
        settings: RecommendConfig,
    ) -> Self {
        Self {
            retriever,
            generator,
            settings,
        }
    }

    /// Recommend movies for `query`
    ///
    /// Store and embedding failures are returned as errors; an empty profile
    /// or a failing generator yield a failed [`RecommendationResult`].
    pub async fn recommend(
        &self,
        query: &str,
        filters: &RecommendationFilters,
    ) -> Result<RecommendationResult> {
        let Some(generator) = self.generator else {
            return self.similar_movies(query).await;
        };

        let profile = self.taste_profile(query, filters).await?;
        if profile.is_empty() {
            warn!("No watched movies pass min_rating {} / year_min {}", filters.min_rating, filters.year_min);
            return Ok(RecommendationResult::failed(NO_WATCHED_ERROR));
        }

        let exemplars = top_exemplars(&profile, self.settings.exemplar_count);
        let average = mean_rating(&exemplars);
        let exclusions = if filters.only_unwatched {
            let broad = self
                .retriever
                .scan_watched(&WatchedFilter::default(), None)
                .await?;
            exclusion_titles(&profile, &broad)
        } else {
            Vec::new()
        };

        let prompt = build_prompt(query, &exemplars, average, &exclusions);
        debug!(
            "Prompt with {} exemplars and {} exclusions",
            exemplars.len(),
            exclusions.len()
        );

        match generator.generate(&prompt).await {
            Ok(text) => {
                info!("Generated recommendations with {}", generator.model_name());
                Ok(RecommendationResult::succeeded(text, profile.len()))
            }
            Err(e) => {
                warn!("Generation failed: {}", e);
                Ok(RecommendationResult::failed(format!(
                    "Could not get recommendations from {}: {}",
                    generator.model_name(),
                    e
                )))
            }
        }
    }

    /// Plain list of similar watched movies, used when no generator is configured
    async fn similar_movies(&self, query: &str) -> Result<RecommendationResult> {
        let movies = self
            .retriever
            .search(query, self.settings.fallback_results)
            .await?;

        let mut text = String::from("Gemini API anahtarı yok. Benzer filmler:\n");
        for movie in &movies {
            let _ = writeln!(text, "- {}", movie);
        }

        Ok(RecommendationResult::succeeded(text, movies.len()))
    }

    /// Watched movies matching the filters, semantic matches first
    ///
    /// Falls back to a filtered scan of every watched movie when semantic
    /// search yields nothing that passes; the scan keeps at most
    /// `fallback_scan_limit` qualifying movies.
    pub async fn taste_profile(
        &self,
        query: &str,
        filters: &RecommendationFilters,
    ) -> Result<Vec<RetrievedMovie>> {
        let passes =
            |m: &RetrievedMovie| m.watched && m.meets(filters.min_rating, filters.year_min);

        let profile: Vec<RetrievedMovie> = self
            .retriever
            .search(query, self.settings.candidate_pool)
            .await?
            .into_iter()
            .filter(passes)
            .collect();
        if !profile.is_empty() {
            return Ok(profile);
        }

        debug!("No semantic matches pass the filters, scanning all watched movies");
        self.retriever
            .scan_watched(
                &WatchedFilter::thresholds(filters.min_rating, filters.year_min),
                Some(self.settings.fallback_scan_limit),
            )
            .await
    }
}

/// Highest rated movies of the profile
pub fn top_exemplars(profile: &[RetrievedMovie], count: usize) -> Vec<RetrievedMovie> {
    let mut exemplars = profile.to_vec();
    sort_by_rating_desc(&mut exemplars);
    exemplars.truncate(count);
    exemplars
}

/// Mean of the known ratings, 0.0 when there are none
pub fn mean_rating(movies: &[RetrievedMovie]) -> f32 {
    let ratings: Vec<f32> = movies.iter().filter_map(|m| m.rating).collect();
    if ratings.is_empty() {
        return 0.0;
    }
    ratings.iter().sum::<f32>() / ratings.len() as f32
}

/// Every watched title from both scans, without duplicates, in first-seen order
pub fn exclusion_titles(profile: &[RetrievedMovie], broad: &[RetrievedMovie]) -> Vec<String> {
    let mut seen = HashSet::new();
    profile
        .iter()
        .chain(broad.iter().filter(|m| m.watched))
        .map(RetrievedMovie::to_string)
        .filter(|title| seen.insert(title.clone()))
        .collect()
}

/// Prompt asking for 3-5 unseen movies in the exemplars' style
pub fn build_prompt(
    query: &str,
    exemplars: &[RetrievedMovie],
    average: f32,
    exclusions: &[String],
) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Kullanıcı \"{}\" türünde film önerileri istiyor.", query);
    let _ = writeln!(
        prompt,
        "Kullanıcının izlediği ve beğendiği filmlerden bazıları (ortalama puanı {:.1}/5):",
        average
    );
    for movie in exemplars {
        match movie.rating {
            Some(rating) => {
                let _ = writeln!(prompt, "- {} - Puan: {}/5", movie, format_rating(rating));
            }
            None => {
                let _ = writeln!(prompt, "- {}", movie);
            }
        }
    }

    prompt.push('\n');
    prompt.push_str(
        "Bu filmlerden yola çıkarak, kullanıcının sevebileceği, henüz izlemediği 3-5 adet film önerisi yap.\n\
         Önerilerini yaparken, kullanıcının izlediği filmlerin tarzını, türünü ve genel beğenisini göz önünde bulundur.\n\
         Önerilerini kısa ve öz açıklamalarla birlikte sun.\n",
    );

    if !exclusions.is_empty() {
        prompt.push_str("\nKRİTİK UYARI: Aşağıdaki filmleri KESİNLİKLE önerme (kullanıcı zaten izlemiş):\n");
        for title in exclusions {
            let _ = writeln!(prompt, "{}", title);
        }
        prompt.push_str("Bu listedeki HİÇBİR filmi önerme! Sadece bu listede olmayan filmler öner.\n");
    }

    prompt.push_str("\nÖnerilerini şu formatta sun:\n**Beğendiğiniz filmlerden yola çıkarak:**\n[Kısa bir giriş cümlesi]\n\n");
    prompt.push_str(RECOMMENDATIONS_MARKER);
    prompt.push_str("\n- [Film Adı] ([Yıl]): [Kısa açıklama]\n- [Film Adı] ([Yıl]): [Kısa açıklama]\n- ...\n");

    prompt
}

/// Split a generated answer into its intro and recommendation lines
///
/// Returns `None` when the answer lacks [`RECOMMENDATIONS_MARKER`]. Blank
/// lines and lines starting with `*` are dropped from the recommendations.
pub fn split_recommendations(text: &str) -> Option<(String, Vec<String>)> {
    let (intro, rest) = text.split_once(RECOMMENDATIONS_MARKER)?;
    let lines = rest
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('*'))
        .map(str::to_string)
        .collect();
    Some((intro.trim().to_string(), lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentBuilder;
    use crate::embed::Embedder;
    use crate::loader::WatchRecord;
    use crate::store::{InMemoryStore, MovieStore};
    use crate::test_support::{KeywordEmbedder, ScriptedGenerator};

    fn movie(title: &str, year: i32, rating: f32) -> RetrievedMovie {
        RetrievedMovie {
            title: title.to_string(),
            year: Some(year),
            rating: Some(rating),
            watched: true,
        }
    }

    fn record(title: &str, year: Option<i32>, rating: Option<f32>, review: &str) -> WatchRecord {
        WatchRecord {
            title: title.to_string(),
            year,
            rating,
            review: review.to_string(),
            watched: true,
        }
    }

    fn history() -> Vec<WatchRecord> {
        vec![
            record("Heat", Some(1995), Some(5.0), "aksiyon dolu soygun"),
            record("John Wick", Some(2014), Some(4.0), "aksiyon"),
            record("Arrival", Some(2016), Some(4.5), "bilim kurgu"),
            record("Amelie", Some(2001), Some(3.0), "romantik komedi"),
            record("Metropolis", Some(1927), Some(4.5), ""),
        ]
    }

    async fn indexed_store(embedder: &KeywordEmbedder, records: &[WatchRecord]) -> InMemoryStore {
        let store = InMemoryStore::new(embedder.dimension());
        Retriever::new(embedder, &store)
            .index(DocumentBuilder::new(true).build(records))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_without_generator_lists_similar_movies() {
        let embedder = KeywordEmbedder::default();
        let store = indexed_store(&embedder, &history()).await;
        let recommender =
            Recommender::new(Retriever::new(&embedder, &store), None, RecommendConfig::default());

        let result = recommender
            .recommend("aksiyon", &RecommendationFilters::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.similar_movies_found, Some(5));
        let text = result.recommendations.unwrap();
        assert!(text.starts_with("Gemini API anahtarı yok. Benzer filmler:\n"));
        assert!(text.contains("- Heat (1995)\n"));
    }

    #[tokio::test]
    async fn test_empty_profile_after_both_scans_fails() {
        let embedder = KeywordEmbedder::default();
        let store = indexed_store(&embedder, &history()).await;
        let generator = ScriptedGenerator::replying("unused");
        let recommender = Recommender::new(
            Retriever::new(&embedder, &store),
            Some(&generator),
            RecommendConfig::default(),
        );

        let filters = RecommendationFilters {
            year_min: 2100,
            ..RecommendationFilters::default()
        };
        let result = recommender.recommend("aksiyon", &filters).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(NO_WATCHED_ERROR));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_profile_respects_filters() {
        let embedder = KeywordEmbedder::default();
        let store = indexed_store(&embedder, &history()).await;
        let recommender =
            Recommender::new(Retriever::new(&embedder, &store), None, RecommendConfig::default());

        let filters = RecommendationFilters {
            min_rating: 4.0,
            year_min: 2000,
            only_unwatched: true,
        };
        let profile = recommender.taste_profile("aksiyon", &filters).await.unwrap();

        assert!(!profile.is_empty());
        for movie in &profile {
            assert!(movie.rating.unwrap() >= 4.0);
            assert!(movie.year.unwrap() >= 2000);
        }
    }

    #[tokio::test]
    async fn test_fallback_scan_used_when_search_finds_nothing() {
        let embedder = KeywordEmbedder::default();
        let store = indexed_store(&embedder, &history()).await;
        let settings = RecommendConfig {
            candidate_pool: 0,
            ..RecommendConfig::default()
        };
        let recommender = Recommender::new(Retriever::new(&embedder, &store), None, settings);

        let filters = RecommendationFilters {
            min_rating: 0.0,
            year_min: 2010,
            only_unwatched: true,
        };
        let profile = recommender.taste_profile("Heat", &filters).await.unwrap();
        let titles: Vec<_> = profile.iter().map(|m| m.title.as_str()).collect();

        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"John Wick"));
        assert!(titles.contains(&"Arrival"));
    }

    #[tokio::test]
    async fn test_prompt_excludes_every_watched_title() {
        let embedder = KeywordEmbedder::default();
        let store = indexed_store(&embedder, &history()).await;
        let generator = ScriptedGenerator::replying("**Önerilerim:**\n- Sicario (2015): gergin");
        let recommender = Recommender::new(
            Retriever::new(&embedder, &store),
            Some(&generator),
            RecommendConfig::default(),
        );

        let result = recommender
            .recommend("aksiyon", &RecommendationFilters::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.similar_movies_found, Some(5));
        assert_eq!(
            result.recommendations.as_deref(),
            Some("**Önerilerim:**\n- Sicario (2015): gergin")
        );

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        let warning = prompts[0].split("KRİTİK UYARI").nth(1).unwrap();
        for title in ["Heat (1995)", "John Wick (2014)", "Arrival (2016)", "Amelie (2001)", "Metropolis (1927)"] {
            assert_eq!(warning.matches(title).count(), 1, "{title} listed once");
        }
    }

    #[tokio::test]
    async fn test_fallback_scan_reaches_past_non_qualifying_movies() {
        let mut records: Vec<WatchRecord> = (0..120)
            .map(|i| record(&format!("Old{i}"), Some(1950), Some(4.0), ""))
            .collect();
        records.push(record("Recent", Some(2020), Some(1.0), ""));

        let embedder = KeywordEmbedder::default();
        let store = indexed_store(&embedder, &records).await;
        let generator = ScriptedGenerator::replying("ok");
        let recommender = Recommender::new(
            Retriever::new(&embedder, &store),
            Some(&generator),
            RecommendConfig::default(),
        );

        let filters = RecommendationFilters {
            year_min: 2010,
            ..RecommendationFilters::default()
        };
        let profile = recommender.taste_profile("aksiyon", &filters).await.unwrap();
        let titles: Vec<_> = profile.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Recent"]);

        let result = recommender.recommend("aksiyon", &filters).await.unwrap();
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.similar_movies_found, Some(1));
        assert!(generator.prompts()[0].contains("- Recent (2020) - Puan: 1.0/5"));
    }

    #[tokio::test]
    async fn test_exclusions_cover_long_histories() {
        let records: Vec<WatchRecord> = (0..400)
            .map(|i| record(&format!("Movie{i}"), Some(2001), Some(3.0), "aksiyon"))
            .collect();

        let embedder = KeywordEmbedder::default();
        let store = indexed_store(&embedder, &records).await;
        assert_eq!(store.count().await.unwrap(), 1600);
        let generator = ScriptedGenerator::replying("ok");
        let recommender = Recommender::new(
            Retriever::new(&embedder, &store),
            Some(&generator),
            RecommendConfig::default(),
        );

        recommender
            .recommend("aksiyon", &RecommendationFilters::default())
            .await
            .unwrap();

        let prompts = generator.prompts();
        let warning = prompts[0].split("KRİTİK UYARI").nth(1).unwrap();
        assert_eq!(warning.matches("(2001)\n").count(), 400);
        assert!(warning.contains("Movie399 (2001)\n"));
    }

    #[tokio::test]
    async fn test_include_watched_omits_exclusions() {
        let embedder = KeywordEmbedder::default();
        let store = indexed_store(&embedder, &history()).await;
        let generator = ScriptedGenerator::replying("ok");
        let recommender = Recommender::new(
            Retriever::new(&embedder, &store),
            Some(&generator),
            RecommendConfig::default(),
        );

        let filters = RecommendationFilters {
            only_unwatched: false,
            ..RecommendationFilters::default()
        };
        recommender.recommend("aksiyon", &filters).await.unwrap();

        assert!(!generator.prompts()[0].contains("KRİTİK UYARI"));
    }

    #[tokio::test]
    async fn test_generator_failure_becomes_failed_result() {
        let embedder = KeywordEmbedder::default();
        let store = indexed_store(&embedder, &history()).await;
        let generator = ScriptedGenerator::failing("quota exceeded");
        let recommender = Recommender::new(
            Retriever::new(&embedder, &store),
            Some(&generator),
            RecommendConfig::default(),
        );

        let result = recommender
            .recommend("aksiyon", &RecommendationFilters::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_unindexed_store_fails_with_generator() {
        let embedder = KeywordEmbedder::default();
        let store = InMemoryStore::new(embedder.dimension());
        let generator = ScriptedGenerator::replying("unused");
        let recommender = Recommender::new(
            Retriever::new(&embedder, &store),
            Some(&generator),
            RecommendConfig::default(),
        );

        let result = recommender
            .recommend("aksiyon", &RecommendationFilters::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(!store.collection_exists().await.unwrap());
    }

    #[test]
    fn test_top_exemplars_and_mean() {
        let profile = vec![
            movie("A", 2000, 3.0),
            movie("B", 2000, 5.0),
            movie("C", 2000, 4.0),
            movie("D", 2000, 2.0),
            movie("E", 2000, 4.5),
            movie("F", 2000, 1.0),
        ];

        let top = top_exemplars(&profile, 5);
        let titles: Vec<_> = top.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "E", "C", "A", "D"]);
        assert!((mean_rating(&top) - 3.7).abs() < 1e-6);
        assert_eq!(mean_rating(&[]), 0.0);
    }

    #[test]
    fn test_exclusion_titles_union() {
        let profile = vec![movie("Heat", 1995, 5.0), movie("Ran", 1985, 4.0)];
        let mut unwatched = movie("Tenet", 2020, 3.0);
        unwatched.watched = false;
        let broad = vec![
            movie("Ran", 1985, 4.0),
            movie("Heat", 1995, 5.0),
            movie("Dune", 2021, 4.0),
            movie("Dune", 2021, 4.0),
            unwatched,
        ];

        assert_eq!(
            exclusion_titles(&profile, &broad),
            vec!["Heat (1995)", "Ran (1985)", "Dune (2021)"]
        );
    }

    #[test]
    fn test_build_prompt_sections() {
        let exemplars = vec![movie("Heat", 1995, 5.0), movie("Arrival", 2016, 4.5)];
        let prompt = build_prompt(
            "aksiyon",
            &exemplars,
            4.6,
            &["Heat (1995)".to_string(), "Arrival (2016)".to_string()],
        );

        assert!(prompt.starts_with("Kullanıcı \"aksiyon\" türünde film önerileri istiyor.\n"));
        assert!(prompt.contains("(ortalama puanı 4.6/5)"));
        assert!(prompt.contains("- Heat (1995) - Puan: 5.0/5\n"));
        assert!(prompt.contains("3-5 adet film"));
        assert!(prompt.contains("Heat (1995)\nArrival (2016)\n"));
        assert!(prompt.contains(RECOMMENDATIONS_MARKER));
    }

    #[test]
    fn test_split_recommendations() {
        let text = "**Beğendiğiniz filmlerden yola çıkarak:**\nGiriş.\n\n**Önerilerim:**\n- Sicario (2015): gergin\n\n* not\n- Drive (2011): şık\n";
        let (intro, lines) = split_recommendations(text).unwrap();

        assert_eq!(intro, "**Beğendiğiniz filmlerden yola çıkarak:**\nGiriş.");
        assert_eq!(lines, vec!["- Sicario (2015): gergin", "- Drive (2011): şık"]);
        assert!(split_recommendations("just text").is_none());
    }
}
