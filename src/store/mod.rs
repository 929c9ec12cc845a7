//! Vector store integration
//!
//! This module defines the [`MovieStore`] seam and provides:
//! - A Qdrant backend (drop-and-recreate collection, batch search, filtered scroll)
//! - An in-memory backend the test suite runs retrieval against

mod memory;
mod payload;

pub use memory::*;
pub use payload::*;

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointId, Range, ScoredPoint,
    ScrollPointsBuilder, SearchBatchPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::collections::HashSet;
use tracing::{debug, info};

/// Points per scroll request
const SCROLL_PAGE: usize = 256;

/// A scored document returned by a similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: MoviePayload,
}

/// Persistent keyed collection of movie documents
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Whether the collection has been built
    async fn collection_exists(&self) -> Result<bool>;

    /// Drop the collection if present and create it empty
    async fn reset_collection(&self) -> Result<()>;

    /// Insert or replace points
    async fn upsert_points(&self, points: Vec<MoviePoint>) -> Result<()>;

    /// One nearest-neighbour lookup per query vector, results in query order
    async fn search_batch(
        &self,
        vectors: Vec<Vec<f32>>,
        limit: usize,
    ) -> Result<Vec<Vec<SearchHit>>>;

    /// Watched movies passing `filter`, without similarity ranking
    ///
    /// Paraphrase variants collapse to one payload per (title, year); `limit`
    /// counts those movies, `None` reads the whole collection.
    async fn scan_watched(
        &self,
        filter: &WatchedFilter,
        limit: Option<usize>,
    ) -> Result<Vec<MoviePayload>>;

    /// Number of stored points
    async fn count(&self) -> Result<usize>;

    /// Vector dimension the collection is created with
    fn dimension(&self) -> usize;
}

/// Thresholds applied while scanning watched movies; unknown values never pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WatchedFilter {
    pub min_rating: Option<f32>,
    pub year_min: Option<i32>,
}

impl WatchedFilter {
    pub fn thresholds(min_rating: f32, year_min: i32) -> Self {
        Self {
            min_rating: Some(min_rating),
            year_min: Some(year_min),
        }
    }

    pub fn admits(&self, payload: &MoviePayload) -> bool {
        payload.watched
            && self
                .min_rating
                .map_or(true, |min| payload.rating.is_some_and(|r| r >= min))
            && self
                .year_min
                .map_or(true, |min| payload.year.is_some_and(|y| y >= min))
    }

    fn to_qdrant_filter(self) -> Filter {
        let mut conditions = vec![Condition::matches("watched", true)];
        if let Some(min) = self.min_rating {
            conditions.push(Condition::range(
                "rating",
                Range {
                    gte: Some(min as f64),
                    ..Default::default()
                },
            ));
        }
        if let Some(min) = self.year_min {
            conditions.push(Condition::range(
                "year",
                Range {
                    gte: Some(min as f64),
                    ..Default::default()
                },
            ));
        }
        Filter::must(conditions)
    }
}

/// Identity of a movie across its paraphrase variants
fn movie_key(payload: &MoviePayload) -> (String, Option<i32>) {
    (payload.title.clone(), payload.year)
}

/// Information about a Qdrant collection
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
    pub indexed_vectors_count: u64,
    pub status: String,
}

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantStore {
    /// Connect to Qdrant using config
    pub fn connect(config: &Config) -> Result<Self> {
        Self::new(
            &config.qdrant_url,
            config.qdrant_api_key(),
            &config.collection_name,
            config.embedding.resolved_dimension(),
        )
    }

    /// Create a new store connection directly with URL and collection name
    pub fn new(
        url: &str,
        api_key: Option<String>,
        collection: &str,
        dimension: usize,
    ) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            dimension,
        })
    }

    /// Create the collection unless it already exists
    pub async fn ensure_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            debug!("Collection {} already exists", self.collection);
            return Ok(());
        }
        self.create_collection().await
    }

    async fn create_collection(&self) -> Result<()> {
        info!(
            "Creating collection {} with dimension {}",
            self.collection, self.dimension
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(
                        self.dimension as u64,
                        Distance::Cosine,
                    )),
            )
            .await?;

        Ok(())
    }

    /// Get collection info (point count, etc)
    pub async fn get_collection_info(&self) -> Result<Option<CollectionInfo>> {
        if !self.client.collection_exists(&self.collection).await? {
            return Ok(None);
        }

        let info = self.client.collection_info(&self.collection).await?;
        Ok(info.result.map(|result| CollectionInfo {
            points_count: result.points_count.unwrap_or(0),
            indexed_vectors_count: result.indexed_vectors_count.unwrap_or(0),
            status: format!("{:?}", result.status()),
        }))
    }
}

#[async_trait]
impl MovieStore for QdrantStore {
    async fn collection_exists(&self) -> Result<bool> {
        Ok(self.client.collection_exists(&self.collection).await?)
    }

    async fn reset_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            info!("Deleting existing collection {}", self.collection);
            self.client.delete_collection(&self.collection).await?;
        }
        self.create_collection().await
    }

    async fn upsert_points(&self, points: Vec<MoviePoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        if let Some(mismatch) = points.iter().find(|p| p.vector.len() != self.dimension) {
            return Err(Error::Qdrant(format!(
                "Vector dimension mismatch for collection '{}': expected {} (got {})",
                self.collection,
                self.dimension,
                mismatch.vector.len()
            )));
        }

        debug!(
            "Upserting {} points to collection {}",
            points.len(),
            self.collection
        );

        let point_structs = points.into_iter().map(MoviePoint::to_point_struct).collect::<Vec<_>>();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, point_structs).wait(true))
            .await?;

        Ok(())
    }

    async fn search_batch(
        &self,
        vectors: Vec<Vec<f32>>,
        limit: usize,
    ) -> Result<Vec<Vec<SearchHit>>> {
        if vectors.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Searching collection {} with {} vectors, limit {}",
            self.collection,
            vectors.len(),
            limit
        );

        let searches = vectors
            .into_iter()
            .map(|vector| {
                SearchPointsBuilder::new(&self.collection, vector, limit as u64)
                    .with_payload(true)
                    .build()
            })
            .collect::<Vec<_>>();

        let response = self
            .client
            .search_batch_points(SearchBatchPointsBuilder::new(&self.collection, searches))
            .await?;

        Ok(response
            .result
            .into_iter()
            .map(|batch| batch.result.into_iter().filter_map(scored_to_hit).collect())
            .collect())
    }

    async fn scan_watched(
        &self,
        filter: &WatchedFilter,
        limit: Option<usize>,
    ) -> Result<Vec<MoviePayload>> {
        let limit = limit.unwrap_or(usize::MAX);
        let mut seen = HashSet::new();
        let mut movies = Vec::new();
        let mut offset: Option<PointId> = None;

        while movies.len() < limit {
            let mut scroll = ScrollPointsBuilder::new(&self.collection)
                .filter(filter.to_qdrant_filter())
                .limit(SCROLL_PAGE as u32)
                .with_payload(true)
                .with_vectors(false);

            if let Some(o) = offset.take() {
                scroll = scroll.offset(o);
            }

            let response = self.client.scroll(scroll).await?;
            movies.extend(
                response
                    .result
                    .into_iter()
                    .filter_map(|point| payload_from_qdrant(point.payload))
                    .filter(|payload| seen.insert(movie_key(payload))),
            );

            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }

        movies.truncate(limit);
        debug!("Scanned {} watched movies", movies.len());
        Ok(movies)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self
            .get_collection_info()
            .await?
            .map(|info| info.points_count as usize)
            .unwrap_or(0))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn scored_to_hit(point: ScoredPoint) -> Option<SearchHit> {
    let id = point_id_to_string(point.id);
    match payload_from_qdrant(point.payload) {
        Some(payload) => Some(SearchHit {
            id,
            score: point.score,
            payload,
        }),
        None => {
            debug!("Skipping point {} with malformed payload", id);
            None
        }
    }
}

/// Convert PointId to string
fn point_id_to_string(id: Option<PointId>) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;

    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}
