mod encoder;
mod index;

pub use encoder::{embedding_input, tag_input, FastEmbedEncoder, HashingEncoder, TextEncoder};
pub use index::{HnswStore, ScoredPoint, VectorIndex};
