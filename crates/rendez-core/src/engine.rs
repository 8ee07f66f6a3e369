use crate::config::{EngineConfig, WeightConfig};
use crate::dedup::{Deduplicator, IngestOutcome, IngestReport};
use crate::error::{RendezError, Result};
use crate::profile::ProfileVectorBuilder;
use crate::source::{EventSource, SnapshotSink};
use crate::types::{Embedding, EventRecord, ScoredEvent, UserProfile};
use crate::vector::{embedding_input, tag_input, TextEncoder, VectorIndex};
use std::sync::{Arc, Mutex};

/// Initialization state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Owning facade over encoder, index, and event source.
///
/// Construct once and share by reference; all the pieces that used to
/// be module-level globals in earlier designs live here, and the
/// initialization gate is an explicit state field behind a mutex.
///
/// # Example
/// ```rust,no_run
/// use rendez_core::{
///     EngineConfig, HashingEncoder, HnswStore, InMemorySource, RecommendationEngine,
///     UserProfile,
/// };
/// use std::sync::Arc;
///
/// let engine = RecommendationEngine::new(
///     Arc::new(HashingEncoder::default()),
///     HnswStore::new(),
///     InMemorySource::new(vec![]),
///     EngineConfig::default(),
/// )
/// .unwrap();
///
/// let profile = UserProfile::new("Asha", "Female", "Student");
/// let picks = engine.recommend(&profile, None, None).unwrap();
/// ```
pub struct RecommendationEngine<V: VectorIndex, S: EventSource> {
    encoder: Arc<dyn TextEncoder>,
    index: V,
    source: S,
    profile_builder: ProfileVectorBuilder<Arc<dyn TextEncoder>>,
    dedup: Deduplicator,
    config: EngineConfig,
    snapshot: Option<Box<dyn SnapshotSink>>,

    /// Uninitialized -> Initializing -> Ready. The lock is held for
    /// the whole of ingestion, so concurrent first callers block
    /// until Ready and bulk ingestion runs exactly once. Error paths
    /// revert to Uninitialized; initialization is retryable.
    state: Mutex<EngineState>,
}

impl<V: VectorIndex, S: EventSource> RecommendationEngine<V, S> {
    pub fn new(
        encoder: Arc<dyn TextEncoder>,
        index: V,
        source: S,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            profile_builder: ProfileVectorBuilder::new(encoder.clone()),
            dedup: Deduplicator::new(config.similarity_threshold),
            encoder,
            index,
            source,
            config,
            snapshot: None,
            state: Mutex::new(EngineState::Uninitialized),
        })
    }

    /// Attach a sink that receives every recommendation result list.
    pub fn with_snapshot_sink(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.snapshot = Some(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current initialization state. Blocks while another caller is
    /// mid-initialization, which is the intended observable behavior:
    /// by the time you can look, the engine is Ready or the attempt
    /// failed back to Uninitialized.
    pub fn state(&self) -> EngineState {
        *self.state.lock().expect("engine state lock poisoned")
    }

    /// Create the collection and, if it is empty, load every event
    /// from the source through the duplicate filter. Idempotent: in
    /// Ready state this returns immediately with an empty report.
    pub fn ensure_ready(&self) -> Result<IngestReport> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RendezError::Validation("engine state lock poisoned".to_string()))?;

        if *state == EngineState::Ready {
            return Ok(IngestReport::default());
        }

        *state = EngineState::Initializing;
        match self.populate() {
            Ok(report) => {
                *state = EngineState::Ready;
                Ok(report)
            }
            Err(e) => {
                *state = EngineState::Uninitialized;
                Err(e)
            }
        }
    }

    fn populate(&self) -> Result<IngestReport> {
        let collection = &self.config.collection;
        self.index
            .ensure_collection(collection, self.encoder.dimension())?;

        let mut report = IngestReport::default();
        if self.index.len(collection)? > 0 {
            return Ok(report);
        }

        let events = self.source.load_events()?;
        log::info!("Ingesting {} events into `{}`", events.len(), collection);

        for event in events {
            if let Err(reason) = event.validate() {
                log::warn!("Skipping event record: {}", reason);
                report.malformed += 1;
                continue;
            }

            let vector = self.vectorize_event(&event)?;
            let outcome = self.dedup.ingest(&self.index, collection, event, &vector)?;
            log::info!("{}", outcome);
            report.record(&outcome);
        }

        self.index.rebuild(collection)?;
        Ok(report)
    }

    /// Event vector: the encoded descriptive text, optionally blended
    /// with a separately weighted tag embedding.
    fn vectorize_event(&self, event: &EventRecord) -> Result<Embedding> {
        let mut vector = self.encoder.encode(&embedding_input(event))?;

        if let Some(weight) = self.config.tag_weight {
            if weight > 0.0 {
                if let Some(tags) = tag_input(event) {
                    let tag_vector = self.encoder.encode(&tags)?;
                    if tag_vector.len() != vector.len() {
                        return Err(RendezError::DimensionMismatch {
                            expected: vector.len(),
                            got: tag_vector.len(),
                        });
                    }
                    for (v, t) in vector.iter_mut().zip(&tag_vector) {
                        *v += weight * t;
                    }
                }
            }
        }

        Ok(vector)
    }

    /// Rank stored events against the profile's weighted query
    /// vector. Lazily initializes on first use. `weights` and `limit`
    /// fall back to `WeightConfig::default()` and the configured
    /// default limit.
    pub fn recommend(
        &self,
        profile: &UserProfile,
        weights: Option<&WeightConfig>,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredEvent>> {
        self.ensure_ready()?;

        let defaults;
        let weights = match weights {
            Some(w) => w,
            None => {
                defaults = WeightConfig::default();
                &defaults
            }
        };

        let query = self.profile_builder.build(profile, weights)?;
        let k = limit.unwrap_or(self.config.default_limit);
        let hits = self.index.query(&self.config.collection, &query, k)?;

        let results: Vec<ScoredEvent> = hits
            .into_iter()
            .map(|hit| ScoredEvent {
                score: hit.score,
                event: hit.payload,
            })
            .collect();

        if let Some(sink) = &self.snapshot {
            if let Err(e) = sink.persist(&results) {
                log::warn!("Failed to persist recommendation snapshot: {}", e);
            }
        }

        Ok(results)
    }

    /// Submit one event outside the bulk path, through the same
    /// duplicate filter.
    pub fn ingest_event(&self, event: EventRecord) -> Result<IngestOutcome> {
        self.ensure_ready()?;

        event
            .validate()
            .map_err(|reason| RendezError::MalformedRecord { reason })?;

        let collection = &self.config.collection;
        let vector = self.vectorize_event(&event)?;
        let outcome = self.dedup.ingest(&self.index, collection, event, &vector)?;
        log::info!("{}", outcome);

        if matches!(outcome, IngestOutcome::Inserted { .. }) {
            self.index.rebuild(collection)?;
        }

        Ok(outcome)
    }

    /// Drop the collection and fall back to Uninitialized, so the
    /// next call re-ingests from the source. Testing path.
    pub fn reset(&self) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RendezError::Validation("engine state lock poisoned".to_string()))?;

        self.index.delete_collection(&self.config.collection)?;
        *state = EngineState::Uninitialized;
        Ok(())
    }
}
