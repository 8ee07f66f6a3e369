use crate::error::{RendezError, Result};
use crate::types::{Embedding, EventRecord};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding as FastEmbedModel};
use std::collections::HashMap;

/// Service for turning text into fixed-length vectors.
///
/// Implementations are deterministic, side-effect-free functions of
/// their input. Empty or whitespace-only text is an error: callers
/// must treat absent fields as zero contribution instead of letting
/// the encoder's handling of empty text degrade vector quality.
pub trait TextEncoder: Send + Sync {
    /// Encode a single text.
    fn encode(&self, text: &str) -> Result<Embedding>;

    /// Batch encoding for ingestion efficiency.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }

    /// Output dimension. Fixed for the lifetime of the encoder and
    /// must match the collection it feeds.
    fn dimension(&self) -> usize;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}

impl<E: TextEncoder + ?Sized> TextEncoder for std::sync::Arc<E> {
    fn encode(&self, text: &str) -> Result<Embedding> {
        (**self).encode(text)
    }
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        (**self).encode_batch(texts)
    }
    fn dimension(&self) -> usize {
        (**self).dimension()
    }
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// FastEmbed-based encoder. The default model is AllMiniLML6V2, the
/// same sentence-transformer family the reference deployment used.
pub struct FastEmbedEncoder {
    model: FastEmbedModel,
    model_name: String,
    dimension: usize,
}

impl FastEmbedEncoder {
    pub fn new() -> Result<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2)
    }

    pub fn with_model(model: EmbeddingModel) -> Result<Self> {
        let init_options = InitOptions::new(model.clone());

        let fastembed_model = FastEmbedModel::try_new(init_options)
            .map_err(|e| RendezError::Encoding(format!("Failed to initialize FastEmbed: {}", e)))?;

        let model_name = format!("{:?}", model);
        let dimension = match model {
            EmbeddingModel::AllMiniLML6V2 => 384,
            EmbeddingModel::AllMiniLML12V2 => 384,
            EmbeddingModel::BGESmallENV15 => 384,
            EmbeddingModel::BGEBaseENV15 => 768,
            EmbeddingModel::BGELargeENV15 => 1024,
            _ => 384,
        };

        Ok(Self {
            model: fastembed_model,
            model_name,
            dimension,
        })
    }
}

impl TextEncoder for FastEmbedEncoder {
    fn encode(&self, text: &str) -> Result<Embedding> {
        if text.trim().is_empty() {
            return Err(RendezError::Encoding("cannot encode empty text".to_string()));
        }

        let embeddings = self
            .model
            .embed(vec![text.to_string()], None)
            .map_err(|e| RendezError::Encoding(format!("Embedding failed: {}", e)))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RendezError::Encoding("No embedding generated".to_string()))
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(RendezError::Encoding("cannot encode empty text".to_string()));
        }

        let embeddings = self
            .model
            .embed(texts.to_vec(), None)
            .map_err(|e| RendezError::Encoding(format!("Batch embedding failed: {}", e)))?;

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Feature-hashing encoder: a deterministic, model-free fallback.
///
/// Tokenizes on non-alphanumeric boundaries, computes term
/// frequencies, and scatters each term into three hashed positions
/// with hash-derived signs. Output is L2-normalized. Quality is far
/// below a transformer model but token overlap still maps to cosine
/// similarity, which is all offline use and the test suite need.
pub struct HashingEncoder {
    dimension: usize,
}

impl HashingEncoder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect()
    }

    /// FNV-1a, hand-rolled so the mapping is stable across Rust
    /// releases (std's default hasher makes no such promise).
    fn hash_term(term: &str, seed: u64) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325 ^ seed.wrapping_mul(0x0100_0000_01b3);
        for byte in term.as_bytes() {
            h ^= u64::from(*byte);
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
        h
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl TextEncoder for HashingEncoder {
    fn encode(&self, text: &str) -> Result<Embedding> {
        if text.trim().is_empty() {
            return Err(RendezError::Encoding("cannot encode empty text".to_string()));
        }

        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return Err(RendezError::Encoding(format!(
                "no encodable tokens in {:?}",
                text
            )));
        }

        let total = tokens.len() as f32;
        let mut tf: HashMap<&str, f32> = HashMap::new();
        for token in &tokens {
            *tf.entry(token.as_str()).or_default() += 1.0;
        }

        let mut vector = vec![0.0f32; self.dimension];
        for (term, count) in &tf {
            let weight = count / total;
            for position in 0..3u64 {
                let slot = (Self::hash_term(term, position) % self.dimension as u64) as usize;
                let sign = if Self::hash_term(term, position + 3) % 2 == 0 {
                    1.0
                } else {
                    -1.0
                };
                vector[slot] += weight * sign;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

/// Descriptive text an event's vector is derived from.
pub fn embedding_input(event: &EventRecord) -> String {
    format!(
        "{} {} {} {}",
        event.title, event.location, event.summary, event.target_audience
    )
}

/// Tag text for the optional blended tag embedding. `None` when the
/// event carries no tags.
pub fn tag_input(event: &EventRecord) -> Option<String> {
    if event.tags.is_empty() {
        None
    } else {
        Some(event.tags.join(" "))
    }
}
