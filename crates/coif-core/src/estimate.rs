//! Weighted soft vote over gender/age estimates from several sources.

use crate::profile::Gender;
use crate::types::round2;
use serde::{Deserialize, Serialize};

/// Weight used when a vote carries none (or an invalid one).
pub const DEFAULT_VOTE_WEIGHT: f64 = 0.5;

const AGE_CONFIDENCE_MIN: f64 = 0.2;
const AGE_CONFIDENCE_MAX: f64 = 0.99;

/// One source's opinion about gender and age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderAgeVote {
    pub source: String,
    pub gender: Gender,
    pub age: Option<f64>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    DEFAULT_VOTE_WEIGHT
}

impl GenderAgeVote {
    pub fn new(source: impl Into<String>, gender: Gender, age: Option<f64>) -> Self {
        Self {
            source: source.into(),
            gender,
            age,
            weight: DEFAULT_VOTE_WEIGHT,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            DEFAULT_VOTE_WEIGHT
        }
    }
}

/// Merged gender/age estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderAgeEstimate {
    pub gender: Gender,
    pub age: Option<u32>,
    /// Comma-separated sources that voted, or `"none"`.
    pub source: String,
    pub gender_confidence: f64,
    pub age_confidence: f64,
}

impl GenderAgeEstimate {
    pub fn none() -> Self {
        Self {
            gender: Gender::Unknown,
            age: None,
            source: "none".to_string(),
            gender_confidence: 0.0,
            age_confidence: 0.0,
        }
    }
}

/// Combine votes: gender by weighted majority (ties are unknown), age by
/// weighted mean over the votes that carry one.
pub fn combine(votes: &[GenderAgeVote]) -> GenderAgeEstimate {
    if votes.is_empty() {
        return GenderAgeEstimate::none();
    }

    let (mut male, mut female, mut unknown) = (0.0f64, 0.0f64, 0.0f64);
    let (mut age_sum, mut age_weight) = (0.0f64, 0.0f64);

    for vote in votes {
        let w = vote.effective_weight();
        match vote.gender {
            Gender::Male => male += w,
            Gender::Female => female += w,
            Gender::Unknown => unknown += w,
        }
        if let Some(age) = vote.age.filter(|a| a.is_finite() && *a >= 0.0) {
            age_sum += age * w;
            age_weight += w;
        }
    }

    let gender = if male > female {
        Gender::Male
    } else if female > male {
        Gender::Female
    } else {
        Gender::Unknown
    };
    let gender_confidence = male.max(female) / (male + female + unknown).max(1.0);

    let (age, age_confidence) = if age_weight > 0.0 {
        let confidence = (age_weight / votes.len() as f64).clamp(AGE_CONFIDENCE_MIN, AGE_CONFIDENCE_MAX);
        (Some((age_sum / age_weight).round() as u32), confidence)
    } else {
        (None, 0.0)
    };

    let source = votes
        .iter()
        .map(|v| v.source.as_str())
        .collect::<Vec<_>>()
        .join(",");

    tracing::debug!(
        votes = votes.len(),
        gender = %gender,
        ?age,
        "gender/age votes combined"
    );

    GenderAgeEstimate {
        gender,
        age,
        source,
        gender_confidence: round2(gender_confidence),
        age_confidence: round2(age_confidence),
    }
}
