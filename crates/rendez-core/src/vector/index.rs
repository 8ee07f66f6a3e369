use crate::error::{RendezError, Result};
use crate::types::{Embedding, EventId, EventRecord};
use instant_distance::{Builder, HnswMap, Point, Search};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::RwLock;

/// One nearest-neighbor hit: the stored payload plus its cosine
/// similarity to the query vector. Scores are raw cosine values in
/// [-1, 1]; nothing is clamped.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: EventId,
    pub score: f32,
    pub payload: EventRecord,
}

/// Named collections of (id, vector, payload) points with top-K
/// cosine similarity search.
///
/// Collections live in memory for the lifetime of the process. That
/// is deliberate: the index is rebuilt from the event source on
/// startup, so durability belongs to the source, not to this layer.
pub trait VectorIndex: Send + Sync {
    /// Create the collection with the given dimension if absent,
    /// otherwise no-op. Safe to call concurrently; the second creator
    /// sees the existing collection and proceeds.
    fn ensure_collection(&self, name: &str, dimension: usize) -> Result<()>;

    /// Drop a collection. No-op if it does not exist. Intended for
    /// forced-reinitialization test paths.
    fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert or replace the point with this id.
    fn upsert(
        &self,
        collection: &str,
        id: EventId,
        vector: &Embedding,
        payload: EventRecord,
    ) -> Result<()>;

    /// Batch upsert. May apply partially on failure; every point
    /// applied before the error remains queryable.
    fn upsert_batch(
        &self,
        collection: &str,
        points: Vec<(EventId, Embedding, EventRecord)>,
    ) -> Result<()> {
        for (id, vector, payload) in points {
            self.upsert(collection, id, &vector, payload)?;
        }
        Ok(())
    }

    /// Up to k nearest neighbors by cosine similarity, descending
    /// score order. Fewer than k when the collection is smaller;
    /// empty when the collection is empty.
    fn query(&self, collection: &str, vector: &Embedding, k: usize) -> Result<Vec<ScoredPoint>>;

    /// Number of points in the collection.
    fn len(&self, collection: &str) -> Result<usize>;

    /// Build the search graph after bulk inserts. Queries before the
    /// rebuild fall back to brute-force scoring.
    fn rebuild(&self, collection: &str) -> Result<()>;
}

/// Wrapper for embeddings to implement the Point trait
#[derive(Clone, Debug)]
struct EmbeddingPoint(Vec<f32>);

impl Point for EmbeddingPoint {
    fn distance(&self, other: &Self) -> f32 {
        // Cosine distance = 1 - cosine similarity
        let dot: f32 = self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum();
        let norm_a: f32 = self.0.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = other.0.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 1.0;
        }

        1.0 - dot / (norm_a * norm_b)
    }
}

struct Collection {
    dimension: usize,
    points: HashMap<EventId, (Embedding, EventRecord)>,

    /// HNSW graph over `points`. Cleared on every upsert; queries on
    /// a cleared graph use brute force until the next rebuild().
    hnsw: Option<HnswMap<EmbeddingPoint, EventId>>,
}

impl Collection {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: HashMap::new(),
            hnsw: None,
        }
    }

    fn brute_force_query(&self, vector: &Embedding, k: usize) -> Vec<ScoredPoint> {
        let query = EmbeddingPoint(vector.clone());
        let mut results: Vec<ScoredPoint> = self
            .points
            .par_iter()
            .map(|(id, (stored, payload))| {
                let distance = query.distance(&EmbeddingPoint(stored.clone()));
                ScoredPoint {
                    id: *id,
                    score: 1.0 - distance,
                    payload: payload.clone(),
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        results
    }

    fn hnsw_query(
        &self,
        hnsw: &HnswMap<EmbeddingPoint, EventId>,
        vector: &Embedding,
        k: usize,
    ) -> Vec<ScoredPoint> {
        let query = EmbeddingPoint(vector.clone());
        let mut search = Search::default();
        let mut results = Vec::new();

        for item in hnsw.search(&query, &mut search).take(k) {
            let id = *item.value;
            if let Some((_, payload)) = self.points.get(&id) {
                results.push(ScoredPoint {
                    id,
                    score: 1.0 - item.distance,
                    payload: payload.clone(),
                });
            }
        }

        results
    }
}

/// In-memory, HNSW-backed implementation of [`VectorIndex`].
pub struct HnswStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl HnswStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for HnswStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> RendezError {
    RendezError::Validation("vector store lock poisoned".to_string())
}

impl VectorIndex for HnswStore {
    fn ensure_collection(&self, name: &str, dimension: usize) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;

        match collections.get(name) {
            Some(existing) if existing.dimension != dimension => Err(RendezError::DimensionMismatch {
                expected: existing.dimension,
                got: dimension,
            }),
            Some(_) => Ok(()),
            None => {
                collections.insert(name.to_string(), Collection::new(dimension));
                log::info!("Created collection `{}` (dimension {})", name, dimension);
                Ok(())
            }
        }
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        if collections.remove(name).is_some() {
            log::info!("Deleted collection `{}`", name);
        }
        Ok(())
    }

    fn upsert(
        &self,
        collection: &str,
        id: EventId,
        vector: &Embedding,
        payload: EventRecord,
    ) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| RendezError::UnknownCollection(collection.to_string()))?;

        if vector.len() != col.dimension {
            return Err(RendezError::DimensionMismatch {
                expected: col.dimension,
                got: vector.len(),
            });
        }

        col.points.insert(id, (vector.clone(), payload));
        col.hnsw = None;
        Ok(())
    }

    fn query(&self, collection: &str, vector: &Embedding, k: usize) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let col = collections
            .get(collection)
            .ok_or_else(|| RendezError::UnknownCollection(collection.to_string()))?;

        if col.points.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        match &col.hnsw {
            Some(hnsw) => Ok(col.hnsw_query(hnsw, vector, k)),
            None => Ok(col.brute_force_query(vector, k)),
        }
    }

    fn len(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        collections
            .get(collection)
            .map(|c| c.points.len())
            .ok_or_else(|| RendezError::UnknownCollection(collection.to_string()))
    }

    fn rebuild(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| RendezError::UnknownCollection(collection.to_string()))?;

        if col.points.is_empty() {
            col.hnsw = None;
            return Ok(());
        }

        let mut points = Vec::with_capacity(col.points.len());
        let mut values = Vec::with_capacity(col.points.len());
        for (id, (vector, _)) in &col.points {
            points.push(EmbeddingPoint(vector.clone()));
            values.push(*id);
        }

        col.hnsw = Some(Builder::default().build(points, values));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn event(title: &str) -> EventRecord {
        EventRecord::new(title, "Main Hall", "A test event", "Everyone")
    }

    #[test]
    fn test_ensure_collection_idempotent() {
        let store = HnswStore::new();
        store.ensure_collection("events", 3).unwrap();
        store.ensure_collection("events", 3).unwrap();
        assert_eq!(store.len("events").unwrap(), 0);
    }

    #[test]
    fn test_ensure_collection_dimension_conflict() {
        let store = HnswStore::new();
        store.ensure_collection("events", 3).unwrap();
        assert!(matches!(
            store.ensure_collection("events", 4),
            Err(RendezError::DimensionMismatch { expected: 3, got: 4 })
        ));
    }

    #[test]
    fn test_upsert_and_query_ordering() {
        let store = HnswStore::new();
        store.ensure_collection("events", 3).unwrap();

        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        let id3 = Uuid::now_v7();

        store.upsert("events", id1, &vec![1.0, 0.0, 0.0], event("a")).unwrap();
        store.upsert("events", id2, &vec![0.9, 0.1, 0.0], event("b")).unwrap();
        store.upsert("events", id3, &vec![0.0, 1.0, 0.0], event("c")).unwrap();

        let results = store.query("events", &vec![1.0, 0.0, 0.0], 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, id1);
        assert_eq!(results[1].id, id2);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_query_never_exceeds_k() {
        let store = HnswStore::new();
        store.ensure_collection("events", 2).unwrap();
        for i in 0..5 {
            let v = vec![1.0, i as f32 * 0.1];
            store.upsert("events", Uuid::now_v7(), &v, event("e")).unwrap();
        }

        assert_eq!(store.query("events", &vec![1.0, 0.0], 3).unwrap().len(), 3);
        // Fewer than k when the collection is smaller
        assert_eq!(store.query("events", &vec![1.0, 0.0], 10).unwrap().len(), 5);
    }

    #[test]
    fn test_empty_collection_query_is_empty_not_error() {
        let store = HnswStore::new();
        store.ensure_collection("events", 3).unwrap();
        let results = store.query("events", &vec![1.0, 0.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_unknown_collection_is_error() {
        let store = HnswStore::new();
        assert!(matches!(
            store.query("nope", &vec![1.0], 1),
            Err(RendezError::UnknownCollection(_))
        ));
        assert!(matches!(
            store.len("nope"),
            Err(RendezError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let store = HnswStore::new();
        store.ensure_collection("events", 3).unwrap();
        let result = store.upsert("events", Uuid::now_v7(), &vec![1.0, 0.0], event("bad"));
        assert!(matches!(
            result,
            Err(RendezError::DimensionMismatch { expected: 3, got: 2 })
        ));
        assert_eq!(store.len("events").unwrap(), 0);
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let store = HnswStore::new();
        store.ensure_collection("events", 2).unwrap();

        let id = Uuid::now_v7();
        store.upsert("events", id, &vec![1.0, 0.0], event("old title")).unwrap();
        store.upsert("events", id, &vec![0.0, 1.0], event("new title")).unwrap();

        assert_eq!(store.len("events").unwrap(), 1);
        let results = store.query("events", &vec![0.0, 1.0], 1).unwrap();
        assert_eq!(results[0].payload.title, "new title");
        assert!(results[0].score > 0.99);
    }

    #[test]
    fn test_delete_collection() {
        let store = HnswStore::new();
        store.ensure_collection("events", 2).unwrap();
        store.upsert("events", Uuid::now_v7(), &vec![1.0, 0.0], event("a")).unwrap();

        store.delete_collection("events").unwrap();
        assert!(store.len("events").is_err());

        // Deleting again is a no-op
        store.delete_collection("events").unwrap();
    }

    #[test]
    fn test_rebuild_then_query_matches_brute_force() {
        let store = HnswStore::new();
        store.ensure_collection("events", 3).unwrap();

        let id1 = Uuid::now_v7();
        let id2 = Uuid::now_v7();
        store.upsert("events", id1, &vec![1.0, 0.0, 0.0], event("a")).unwrap();
        store.upsert("events", id2, &vec![0.0, 1.0, 0.0], event("b")).unwrap();

        let brute = store.query("events", &vec![1.0, 0.1, 0.0], 2).unwrap();
        store.rebuild("events").unwrap();
        let indexed = store.query("events", &vec![1.0, 0.1, 0.0], 2).unwrap();

        assert_eq!(brute.len(), indexed.len());
        assert_eq!(brute[0].id, indexed[0].id);
        assert!((brute[0].score - indexed[0].score).abs() < 1e-6);
    }

    #[test]
    fn test_scores_are_raw_cosine() {
        let store = HnswStore::new();
        store.ensure_collection("events", 2).unwrap();
        store.upsert("events", Uuid::now_v7(), &vec![-1.0, 0.0], event("opposite")).unwrap();

        let results = store.query("events", &vec![1.0, 0.0], 1).unwrap();
        // Opposite direction: similarity ~ -1, not clamped to zero
        assert!(results[0].score < -0.99);
    }

    #[test]
    fn test_batch_upsert_partial_application() {
        let store = HnswStore::new();
        store.ensure_collection("events", 2).unwrap();

        let good = Uuid::now_v7();
        let batch = vec![
            (good, vec![1.0, 0.0], event("good")),
            (Uuid::now_v7(), vec![1.0, 0.0, 0.0], event("wrong dim")),
            (Uuid::now_v7(), vec![0.0, 1.0], event("never reached")),
        ];

        assert!(store.upsert_batch("events", batch).is_err());
        // The point applied before the failure stays queryable
        assert_eq!(store.len("events").unwrap(), 1);
        let results = store.query("events", &vec![1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].id, good);
    }
}
