//! Retrieval over the indexed watch history
//!
//! Indexing is a full rebuild: the collection is dropped and recreated on
//! every run. Searching embeds the (optionally expanded) query, runs one
//! lookup per query string, and merges the hits into distinct movies.

use crate::documents::Document;
use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use crate::expand::expand_query;
use crate::store::{MoviePayload, MoviePoint, MovieStore, SearchHit, WatchedFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// Points sent to the store per upsert call
const UPSERT_BATCH: usize = 256;

/// Metadata-only view of a retrieved document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedMovie {
    pub title: String,
    pub year: Option<i32>,
    pub rating: Option<f32>,
    pub watched: bool,
}

impl RetrievedMovie {
    /// Identity used for de-duplication
    pub fn key(&self) -> (String, Option<i32>) {
        (self.title.clone(), self.year)
    }

    /// Whether the movie satisfies both thresholds; unknown values never do
    pub fn meets(&self, min_rating: f32, year_min: i32) -> bool {
        self.rating.is_some_and(|r| r >= min_rating) && self.year.is_some_and(|y| y >= year_min)
    }
}

impl fmt::Display for RetrievedMovie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({})", self.title, year),
            None => write!(f, "{}", self.title),
        }
    }
}

impl From<MoviePayload> for RetrievedMovie {
    fn from(payload: MoviePayload) -> Self {
        Self {
            title: payload.title,
            year: payload.year,
            rating: payload.rating,
            watched: payload.watched,
        }
    }
}

/// Sort by rating, highest first; unknown ratings last, ties keep their order
pub fn sort_by_rating_desc(movies: &mut [RetrievedMovie]) {
    let key = |m: &RetrievedMovie| m.rating.unwrap_or(f32::NEG_INFINITY);
    movies.sort_by(|a, b| key(b).total_cmp(&key(a)));
}

/// Merge per-query hits into distinct movies
///
/// The first hit for each (title, year) wins. The result is sorted by rating
/// and truncated to `n_results`.
pub fn merge_hits(batches: Vec<Vec<SearchHit>>, n_results: usize) -> Vec<RetrievedMovie> {
    let mut seen = HashSet::new();
    let mut movies: Vec<RetrievedMovie> = batches
        .into_iter()
        .flatten()
        .map(|hit| RetrievedMovie::from(hit.payload))
        .filter(|movie| seen.insert(movie.key()))
        .collect();

    sort_by_rating_desc(&mut movies);
    movies.truncate(n_results);
    movies
}

/// Embeds documents and queries and talks to the store
pub struct Retriever<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn MovieStore,
    augment_queries: bool,
    batch_size: usize,
    show_progress: bool,
}

impl<'a> Retriever<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn MovieStore) -> Self {
        Self {
            embedder,
            store,
            augment_queries: true,
            batch_size: 32,
            show_progress: false,
        }
    }

    /// Search with expanded query variants
    pub fn with_query_augmentation(mut self, enabled: bool) -> Self {
        self.augment_queries = enabled;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Show a progress bar while embedding documents
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Rebuild the collection from `documents`, returning the number indexed
    pub async fn index(&self, documents: Vec<Document>) -> Result<usize> {
        if self.embedder.dimension() != self.store.dimension() {
            return Err(Error::Embedding(format!(
                "{} produces {}-dimensional vectors but the collection expects {}",
                self.embedder.model_name(),
                self.embedder.dimension(),
                self.store.dimension()
            )));
        }

        self.store.reset_collection().await?;

        if documents.is_empty() {
            info!("No documents to index");
            return Ok(0);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors =
            embed_in_batches(self.embedder, texts, self.batch_size, self.show_progress).await?;
        if vectors.len() != documents.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                documents.len(),
                vectors.len()
            )));
        }

        let points: Vec<MoviePoint> = documents
            .into_iter()
            .zip(vectors)
            .map(|(document, vector)| MoviePoint::from_document(document, vector))
            .collect();
        let count = points.len();

        for batch in points.chunks(UPSERT_BATCH) {
            self.store.upsert_points(batch.to_vec()).await?;
        }

        info!("Indexed {} documents", count);
        Ok(count)
    }

    /// Find up to `n_results` distinct movies similar to `query`
    ///
    /// Returns an empty list when nothing has been indexed yet.
    pub async fn search(&self, query: &str, n_results: usize) -> Result<Vec<RetrievedMovie>> {
        if !self.store.collection_exists().await? {
            debug!("No collection yet, nothing to search");
            return Ok(Vec::new());
        }

        let queries = if self.augment_queries {
            expand_query(query)
        } else {
            vec![query.to_string()]
        };
        debug!("Searching with {} query variants: {:?}", queries.len(), queries);

        let vectors = self.embedder.embed(queries).await?;
        let batches = self.store.search_batch(vectors, n_results * 2).await?;
        let movies = merge_hits(batches, n_results);

        debug!("Search for '{}' returned {} movies", query, movies.len());
        Ok(movies)
    }

    /// Distinct watched movies passing `filter`, straight from the store
    ///
    /// `None` reads every watched movie.
    pub async fn scan_watched(
        &self,
        filter: &WatchedFilter,
        limit: Option<usize>,
    ) -> Result<Vec<RetrievedMovie>> {
        if !self.store.collection_exists().await? {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .scan_watched(filter, limit)
            .await?
            .into_iter()
            .map(RetrievedMovie::from)
            .collect())
    }
}
