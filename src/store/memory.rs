//! In-memory movie store using cosine similarity.
//!
//! Backs the retrieval and recommendation tests. Keeps points in insertion
//! order behind a `tokio::sync::RwLock`; a fresh store has no collection until
//! [`MovieStore::reset_collection`].

use super::{movie_key, MoviePayload, MoviePoint, MovieStore, SearchHit, WatchedFilter};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// A process-local [`MovieStore`]
#[derive(Debug)]
pub struct InMemoryStore {
    dimension: usize,
    points: RwLock<Option<Vec<MoviePoint>>>,
}

impl InMemoryStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: RwLock::new(None),
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn missing_collection() -> Error {
    Error::Qdrant("in-memory collection does not exist".to_string())
}

#[async_trait]
impl MovieStore for InMemoryStore {
    async fn collection_exists(&self) -> Result<bool> {
        Ok(self.points.read().await.is_some())
    }

    async fn reset_collection(&self) -> Result<()> {
        *self.points.write().await = Some(Vec::new());
        Ok(())
    }

    async fn upsert_points(&self, points: Vec<MoviePoint>) -> Result<()> {
        if let Some(mismatch) = points.iter().find(|p| p.vector.len() != self.dimension) {
            return Err(Error::Qdrant(format!(
                "Vector dimension mismatch: expected {} (got {})",
                self.dimension,
                mismatch.vector.len()
            )));
        }

        let mut guard = self.points.write().await;
        let stored = guard.as_mut().ok_or_else(missing_collection)?;
        for point in points {
            match stored.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point,
                None => stored.push(point),
            }
        }
        Ok(())
    }

    async fn search_batch(
        &self,
        vectors: Vec<Vec<f32>>,
        limit: usize,
    ) -> Result<Vec<Vec<SearchHit>>> {
        let guard = self.points.read().await;
        let stored = guard.as_ref().ok_or_else(missing_collection)?;

        Ok(vectors
            .iter()
            .map(|query| {
                let mut hits: Vec<SearchHit> = stored
                    .iter()
                    .map(|p| SearchHit {
                        id: p.id.to_string(),
                        score: cosine_similarity(&p.vector, query),
                        payload: p.payload.clone(),
                    })
                    .collect();
                hits.sort_by(|a, b| b.score.total_cmp(&a.score));
                hits.truncate(limit);
                hits
            })
            .collect())
    }

    async fn scan_watched(
        &self,
        filter: &WatchedFilter,
        limit: Option<usize>,
    ) -> Result<Vec<MoviePayload>> {
        let guard = self.points.read().await;
        let stored = guard.as_ref().ok_or_else(missing_collection)?;

        let mut seen = HashSet::new();
        Ok(stored
            .iter()
            .map(|p| &p.payload)
            .filter(|payload| filter.admits(payload) && seen.insert(movie_key(payload)))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.points.read().await.as_ref().map_or(0, Vec::len))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{Document, DocumentMetadata};

    fn point(id: &str, watched: bool, vector: Vec<f32>) -> MoviePoint {
        MoviePoint::from_document(
            Document {
                id: id.to_string(),
                text: id.to_string(),
                metadata: DocumentMetadata {
                    title: id.to_string(),
                    year: Some(2000),
                    rating: Some(3.0),
                    watched,
                    augmented: None,
                    variant: None,
                },
            },
            vector,
        )
    }

    #[tokio::test]
    async fn test_requires_collection() {
        let store = InMemoryStore::new(2);
        assert!(!store.collection_exists().await.unwrap());
        assert!(store.upsert_points(vec![point("a", true, vec![1.0, 0.0])]).await.is_err());

        store.reset_collection().await.unwrap();
        assert!(store.collection_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_drops_points() {
        let store = InMemoryStore::new(2);
        store.reset_collection().await.unwrap();
        store
            .upsert_points(vec![point("a", true, vec![1.0, 0.0]), point("a", true, vec![0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        store.reset_collection().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_batch_orders_by_similarity() {
        let store = InMemoryStore::new(2);
        store.reset_collection().await.unwrap();
        store
            .upsert_points(vec![point("x", true, vec![1.0, 0.0]), point("y", true, vec![0.0, 1.0])])
            .await
            .unwrap();

        let hits = store
            .search_batch(vec![vec![0.0, 1.0], vec![1.0, 0.1]], 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0][0].payload.title, "y");
        assert_eq!(hits[1][0].payload.title, "x");
    }

    #[tokio::test]
    async fn test_scan_watched_filters_and_limits() {
        let store = InMemoryStore::new(1);
        store.reset_collection().await.unwrap();
        store
            .upsert_points(vec![
                point("a", true, vec![1.0]),
                point("b", false, vec![1.0]),
                point("c", true, vec![1.0]),
                point("d", true, vec![1.0]),
            ])
            .await
            .unwrap();

        let titles: Vec<_> = store
            .scan_watched(&WatchedFilter::default(), Some(2))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["a", "c"]);

        let filtered = store
            .scan_watched(&WatchedFilter::thresholds(3.5, 1900), None)
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn test_scan_watched_limit_counts_movies() {
        let store = InMemoryStore::new(1);
        store.reset_collection().await.unwrap();

        let variant = |id: &str, title: &str| {
            let mut p = point(title, true, vec![1.0]);
            p.id = crate::store::point_id_for(id);
            p.payload.doc_id = id.to_string();
            p
        };
        store
            .upsert_points(vec![
                variant("x_0", "x"),
                variant("x_1", "x"),
                variant("x_2", "x"),
                variant("y_0", "y"),
                variant("y_1", "y"),
            ])
            .await
            .unwrap();

        let titles: Vec<_> = store
            .scan_watched(&WatchedFilter::default(), Some(2))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["x", "y"]);
    }
}
