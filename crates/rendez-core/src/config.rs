use serde::{Deserialize, Serialize};

/// How interest rank translates into per-interest weight.
///
/// The profile's `interests` list is ordered most-preferred first;
/// this policy decides whether that order matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RankWeighting {
    /// Interests are space-joined and encoded once at the base
    /// interests weight. Rank carries no information.
    Uniform,

    /// Interest `i` (0-indexed) is encoded separately and weighted by
    /// `(N - i) / N` relative to the base interests weight, so the
    /// top-ranked interest contributes at full weight and the last at
    /// `1/N`.
    #[default]
    Linear,
}

/// Per-field weights applied when a profile is turned into a query
/// vector. Supplied per call; changing them changes ranking but never
/// stored state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub name: f32,
    pub gender: f32,
    pub role: f32,
    pub department: f32,
    pub year: f32,
    pub interests: f32,
    pub past_events: f32,

    /// Weight of the "N/A" baseline vector subtracted from the sum.
    /// Corrects the encoder's pull of short/sparse profiles toward a
    /// generic region of the vector space.
    pub baseline: f32,

    pub rank_weighting: RankWeighting,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            name: 0.0,
            gender: 1.0,
            role: 3.0,
            department: 2.0,
            year: 1.0,
            interests: 5.0,
            past_events: 1.0,
            baseline: 0.6,
            rank_weighting: RankWeighting::default(),
        }
    }
}

impl WeightConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, weight: f32) -> Self {
        self.name = weight.max(0.0);
        self
    }

    pub fn with_gender(mut self, weight: f32) -> Self {
        self.gender = weight.max(0.0);
        self
    }

    pub fn with_role(mut self, weight: f32) -> Self {
        self.role = weight.max(0.0);
        self
    }

    pub fn with_department(mut self, weight: f32) -> Self {
        self.department = weight.max(0.0);
        self
    }

    pub fn with_year(mut self, weight: f32) -> Self {
        self.year = weight.max(0.0);
        self
    }

    pub fn with_interests(mut self, weight: f32) -> Self {
        self.interests = weight.max(0.0);
        self
    }

    pub fn with_past_events(mut self, weight: f32) -> Self {
        self.past_events = weight.max(0.0);
        self
    }

    pub fn with_baseline(mut self, weight: f32) -> Self {
        self.baseline = weight.max(0.0);
        self
    }

    pub fn with_rank_weighting(mut self, policy: RankWeighting) -> Self {
        self.rank_weighting = policy;
        self
    }

    /// Zero out every field weight, baseline included. Useful as a
    /// starting point when probing a single field's contribution.
    pub fn zeroed() -> Self {
        Self {
            name: 0.0,
            gender: 0.0,
            role: 0.0,
            department: 0.0,
            year: 0.0,
            interests: 0.0,
            past_events: 0.0,
            baseline: 0.0,
            rank_weighting: RankWeighting::default(),
        }
    }
}

/// Engine-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the vector collection holding events.
    pub collection: String,

    /// Cosine similarity above which an incoming event is rejected as
    /// a duplicate of its nearest neighbor. A heuristic, not a
    /// correctness guarantee: near-duplicates below it slip through,
    /// and distinct but textually similar events above it are
    /// rejected. Default: 0.835
    pub similarity_threshold: f32,

    /// Result count when the caller does not pass one. Default: 10
    pub default_limit: usize,

    /// When set, the event vector becomes
    /// `encode(descriptive text) + tag_weight * encode(tags joined)`
    /// for events that carry tags. Off by default.
    pub tag_weight: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collection: "events".to_string(),
            similarity_threshold: 0.835,
            default_limit: 10,
            tag_weight: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(-1.0, 1.0);
        self
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_tag_weight(mut self, weight: f32) -> Self {
        self.tag_weight = Some(weight.max(0.0));
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.collection.is_empty() {
            return Err(crate::error::RendezError::Validation(
                "collection name must not be empty".to_string(),
            ));
        }
        if self.default_limit == 0 {
            return Err(crate::error::RendezError::Validation(
                "default_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_match_reference_values() {
        let weights = WeightConfig::default();

        assert_eq!(weights.name, 0.0);
        assert_eq!(weights.gender, 1.0);
        assert_eq!(weights.role, 3.0);
        assert_eq!(weights.department, 2.0);
        assert_eq!(weights.year, 1.0);
        assert_eq!(weights.interests, 5.0);
        assert_eq!(weights.past_events, 1.0);
        assert_eq!(weights.baseline, 0.6);
        assert_eq!(weights.rank_weighting, RankWeighting::Linear);
    }

    #[test]
    fn test_default_engine_config() {
        let config = EngineConfig::default();

        assert_eq!(config.collection, "events");
        assert_eq!(config.similarity_threshold, 0.835);
        assert_eq!(config.default_limit, 10);
        assert!(config.tag_weight.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .with_collection("campus_events")
            .with_similarity_threshold(0.9)
            .with_default_limit(5)
            .with_tag_weight(0.5);

        assert_eq!(config.collection, "campus_events");
        assert_eq!(config.similarity_threshold, 0.9);
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.tag_weight, Some(0.5));
    }

    #[test]
    fn test_negative_weights_clamped() {
        let weights = WeightConfig::new().with_interests(-2.0).with_baseline(-1.0);
        assert_eq!(weights.interests, 0.0);
        assert_eq!(weights.baseline, 0.0);
    }

    #[test]
    fn test_invalid_config() {
        assert!(EngineConfig::new().with_default_limit(0).validate().is_err());
        assert!(EngineConfig::new().with_collection("").validate().is_err());
    }
}
