pub mod types;
pub mod error;
pub mod config;
pub mod vector;
pub mod profile;
pub mod dedup;
pub mod source;
pub mod engine;

pub use error::{RendezError, Result};
pub use types::*;
pub use config::{EngineConfig, RankWeighting, WeightConfig};
pub use vector::{
    embedding_input, tag_input, FastEmbedEncoder, HashingEncoder, HnswStore, ScoredPoint,
    TextEncoder, VectorIndex,
};
pub use profile::{ordinal_year, ProfileVectorBuilder, BASELINE_TEXT};
pub use dedup::{Deduplicator, IngestOutcome, IngestReport};
pub use source::{
    EventSource, InMemorySource, JsonEventSource, JsonSnapshotSink, MemorySink, SnapshotSink,
};
pub use engine::{EngineState, RecommendationEngine};
