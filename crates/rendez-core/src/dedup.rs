use crate::error::Result;
use crate::types::{Embedding, EventId, EventRecord};
use crate::vector::{ScoredPoint, VectorIndex};
use uuid::Uuid;

/// What happened to one candidate event during ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Inserted {
        id: EventId,
        title: String,
    },
    /// The candidate's nearest neighbor scored above the duplicate
    /// threshold; nothing was written.
    SkippedDuplicate {
        title: String,
        similar_to: String,
        score: f32,
    },
}

impl std::fmt::Display for IngestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestOutcome::Inserted { title, .. } => write!(f, "Inserted event: {}", title),
            IngestOutcome::SkippedDuplicate { title, .. } => {
                write!(f, "Skipped event: {} (similar to an existing event)", title)
            }
        }
    }
}

/// Counters for one initialization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    pub skipped: usize,
    pub malformed: usize,
}

impl IngestReport {
    pub fn record(&mut self, outcome: &IngestOutcome) {
        match outcome {
            IngestOutcome::Inserted { .. } => self.inserted += 1,
            IngestOutcome::SkippedDuplicate { .. } => self.skipped += 1,
        }
    }
}

/// Approximate-duplicate filter in front of the vector index.
///
/// An incoming event is compared against its single nearest neighbor;
/// a similarity strictly above the threshold rejects the insert. This
/// is best-effort: near-duplicates can slip under the threshold and
/// distinct but textually similar events can land above it.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f32,
}

impl Deduplicator {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// The candidate's nearest neighbor, if the collection holds any
    /// points at all.
    pub fn nearest<V: VectorIndex + ?Sized>(
        &self,
        index: &V,
        collection: &str,
        vector: &Embedding,
    ) -> Result<Option<ScoredPoint>> {
        Ok(index.query(collection, vector, 1)?.into_iter().next())
    }

    /// Insert the event unless its nearest neighbor scores above the
    /// threshold. Assigns an id when the record carries none.
    pub fn ingest<V: VectorIndex + ?Sized>(
        &self,
        index: &V,
        collection: &str,
        mut event: EventRecord,
        vector: &Embedding,
    ) -> Result<IngestOutcome> {
        if let Some(hit) = self.nearest(index, collection, vector)? {
            if hit.score > self.threshold {
                log::debug!(
                    "Duplicate candidate `{}` matched `{}` at {:.3}",
                    event.title,
                    hit.payload.title,
                    hit.score
                );
                return Ok(IngestOutcome::SkippedDuplicate {
                    title: event.title,
                    similar_to: hit.payload.title,
                    score: hit.score,
                });
            }
        }

        let id = event.id.unwrap_or_else(Uuid::now_v7);
        event.id = Some(id);
        let title = event.title.clone();
        index.upsert(collection, id, vector, event)?;

        Ok(IngestOutcome::Inserted { id, title })
    }
}
