use crate::config::{RankWeighting, WeightConfig};
use crate::error::{RendezError, Result};
use crate::types::{Embedding, UserProfile};
use crate::vector::TextEncoder;

/// Text whose embedding anchors the "absent/neutral" region of the
/// vector space. Subtracting a scaled copy of it from the composite
/// profile vector stops short, sparse profiles from collapsing toward
/// the same generic matches.
pub const BASELINE_TEXT: &str = "N/A";

/// Turns a structured profile into a single composite query vector:
/// the weighted sum of per-field embeddings minus the scaled baseline
/// embedding. All arithmetic is plain component-wise f32; the result
/// is deliberately not normalized (the index's cosine metric is
/// scale-invariant on the stored side only — do not assume the query
/// vector is unit-length).
pub struct ProfileVectorBuilder<E: TextEncoder> {
    encoder: E,
}

impl<E: TextEncoder> ProfileVectorBuilder<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    /// Build the query vector for one profile under the given weights.
    ///
    /// Absent or empty fields contribute nothing — they are never fed
    /// to the encoder. Linear in every field weight.
    pub fn build(&self, profile: &UserProfile, weights: &WeightConfig) -> Result<Embedding> {
        let mut sum = vec![0.0f32; self.encoder.dimension()];

        self.add_field(&mut sum, weights.name, &profile.name)?;
        self.add_field(&mut sum, weights.gender, &profile.gender)?;
        self.add_field(&mut sum, weights.role, &profile.role)?;
        self.add_field(&mut sum, weights.department, &profile.department)?;

        if let Some(year) = profile.year {
            self.add_field(&mut sum, weights.year, &ordinal_year(year))?;
        }

        self.add_interests(&mut sum, profile, weights)?;

        let past = profile
            .past_events
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        self.add_field(&mut sum, weights.past_events, &past)?;

        if weights.baseline > 0.0 {
            let baseline = self.encoder.encode(BASELINE_TEXT)?;
            accumulate(&mut sum, -weights.baseline, &baseline)?;
        }

        Ok(sum)
    }

    fn add_field(&self, sum: &mut [f32], weight: f32, text: &str) -> Result<()> {
        if weight <= 0.0 || text.trim().is_empty() {
            return Ok(());
        }
        let vector = self.encoder.encode(text)?;
        accumulate(sum, weight, &vector)
    }

    fn add_interests(
        &self,
        sum: &mut [f32],
        profile: &UserProfile,
        weights: &WeightConfig,
    ) -> Result<()> {
        if weights.interests <= 0.0 {
            return Ok(());
        }

        let interests: Vec<&str> = profile
            .interests
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if interests.is_empty() {
            return Ok(());
        }

        match weights.rank_weighting {
            RankWeighting::Uniform => {
                self.add_field(sum, weights.interests, &interests.join(" "))
            }
            RankWeighting::Linear => {
                let n = interests.len() as f32;
                for (i, interest) in interests.iter().enumerate() {
                    let rank_factor = (n - i as f32) / n;
                    self.add_field(sum, weights.interests * rank_factor, interest)?;
                }
                Ok(())
            }
        }
    }
}

fn accumulate(sum: &mut [f32], weight: f32, vector: &[f32]) -> Result<()> {
    if vector.len() != sum.len() {
        return Err(RendezError::DimensionMismatch {
            expected: sum.len(),
            got: vector.len(),
        });
    }
    for (s, x) in sum.iter_mut().zip(vector) {
        *s += weight * x;
    }
    Ok(())
}

/// "1st year", "2nd year", "3rd year", "11th year", ...
pub fn ordinal_year(year: u8) -> String {
    let suffix = match year % 100 {
        11..=13 => "th",
        _ => match year % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{}{} year", year, suffix)
}
