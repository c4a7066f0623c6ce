//! Hairstyle recommendation: strict filter, weighted score, dedup by image.
//!
//! Candidates must satisfy every attribute predicate; there is no fallback
//! that relaxes the filter when too few records survive, so an empty result
//! is a normal answer. Survivors are scored, jittered for variety, sorted and
//! walked in order while skipping images that were already emitted.

use crate::profile::{AgeGroup, Gender, HairType, UserProfile};
use crate::record::HairstyleRecord;
use crate::types::{round2, FaceShape};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Hard cap on returned recommendations, whatever the requested bounds.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Default jitter amplitude: scores move by at most ±0.15.
pub const DEFAULT_JITTER: f64 = 0.3;

const DEFAULT_MIN_RESULTS: usize = 6;
const DEFAULT_MAX_RESULTS: usize = 10;

/// Requested result bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_RESULTS,
            max: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Additive score weights applied to records that passed the filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub face_shape: f64,
    pub age_group: f64,
    /// Always earned by filtered records; kept so a looser filter still ranks by gender.
    pub gender: f64,
    /// Requested ethnicity matched, directly or through the wildcard.
    pub ethnicity_requested: f64,
    /// No ethnicity requested and the record is universal.
    pub ethnicity_universal: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            face_shape: 4.0,
            age_group: 3.0,
            gender: 2.0,
            ethnicity_requested: 1.5,
            ethnicity_universal: 0.5,
        }
    }
}

/// A recommended record with its final score (rounded to 2 decimals).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub record: HairstyleRecord,
    pub score: f64,
}

/// Policy deciding which catalog records may be recommended for a profile.
pub trait CandidateFilter {
    fn admits(&self, record: &HairstyleRecord, profile: &UserProfile) -> bool;
}

/// All-predicates-must-hold filter.
///
/// An `unknown` gender, age group or face shape in the profile matches
/// nothing: the catalog has no unknown bucket to fall into.
pub struct StrictFilter;

impl CandidateFilter for StrictFilter {
    fn admits(&self, record: &HairstyleRecord, profile: &UserProfile) -> bool {
        if profile.gender == Gender::Unknown || record.gender != profile.gender {
            return false;
        }
        if profile.age_group == AgeGroup::Unknown || !record.age_groups.contains(&profile.age_group) {
            return false;
        }
        if profile.face_shape == FaceShape::Unknown || !record.face_shapes.contains(&profile.face_shape) {
            return false;
        }
        if profile.hair_type != HairType::Unknown
            && !record.hair_types.is_empty()
            && !record.hair_types.contains(&profile.hair_type)
        {
            return false;
        }
        if let Some(ethnicity) = profile.requested_ethnicity() {
            if !record.admits_ethnicity(ethnicity) {
                return false;
            }
        }
        true
    }
}

/// Ranks catalog records for a profile.
pub struct Recommender<F = StrictFilter> {
    filter: F,
    weights: ScoringWeights,
    jitter: f64,
}

impl Recommender<StrictFilter> {
    pub fn new() -> Self {
        Self::with_filter(StrictFilter)
    }
}

impl Default for Recommender<StrictFilter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: CandidateFilter> Recommender<F> {
    pub fn with_filter(filter: F) -> Self {
        Self {
            filter,
            weights: ScoringWeights::default(),
            jitter: DEFAULT_JITTER,
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the jitter amplitude. Zero (or any non-positive value) disables
    /// jitter and makes ranking deterministic.
    pub fn with_jitter(mut self, amplitude: f64) -> Self {
        self.jitter = if amplitude.is_finite() { amplitude.max(0.0) } else { 0.0 };
        self
    }

    /// Base score of a record for a profile, before jitter.
    pub fn score(&self, record: &HairstyleRecord, profile: &UserProfile) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;

        if record.face_shapes.contains(&profile.face_shape) {
            score += w.face_shape;
        }
        if record.age_groups.contains(&profile.age_group) {
            score += w.age_group;
        }
        if profile.gender != Gender::Unknown && record.gender == profile.gender {
            score += w.gender;
        }
        match profile.requested_ethnicity() {
            Some(ethnicity) if record.admits_ethnicity(ethnicity) => score += w.ethnicity_requested,
            Some(_) => {}
            None if record.is_universal() => score += w.ethnicity_universal,
            None => {}
        }

        score
    }

    fn sample_jitter<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.jitter > 0.0 {
            (rng.gen::<f64>() - 0.5) * self.jitter
        } else {
            0.0
        }
    }

    /// Recommend up to `min(bounds.max, unique images, MAX_RECOMMENDATIONS)`
    /// records, best first. Ties keep catalog order.
    pub fn recommend<R: Rng>(
        &self,
        catalog: &[HairstyleRecord],
        profile: &UserProfile,
        bounds: Bounds,
        rng: &mut R,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<(&HairstyleRecord, f64)> = catalog
            .iter()
            .filter(|record| self.filter.admits(record, profile))
            .map(|record| (record, self.score(record, profile) + self.sample_jitter(rng)))
            .collect();

        if scored.is_empty() {
            tracing::debug!(
                catalog = catalog.len(),
                gender = %profile.gender,
                age_group = %profile.age_group,
                face_shape = %profile.face_shape,
                "no catalog record passed the filter"
            );
            return Vec::new();
        }

        // Stable sort: equal scores keep catalog order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let unique_images = scored
            .iter()
            .map(|(record, _)| record.image.as_str())
            .collect::<HashSet<_>>()
            .len();
        let target = bounds.max.min(unique_images).min(MAX_RECOMMENDATIONS);

        let mut seen = HashSet::new();
        let mut picked = Vec::with_capacity(target);
        for (record, score) in scored {
            if picked.len() >= target {
                break;
            }
            if record.image.is_empty() || !seen.insert(record.image.as_str()) {
                continue;
            }
            picked.push(ScoredCandidate {
                record: record.clone(),
                score: round2(score),
            });
        }

        if picked.len() < bounds.min {
            tracing::debug!(
                returned = picked.len(),
                requested_min = bounds.min,
                "fewer matches than requested; filter is not relaxed"
            );
        }

        picked
    }
}
