//! Face analysis pipeline: pick a face, gate on quality, classify the shape
//! and resolve a recommendation profile.

use crate::estimate::{combine, GenderAgeEstimate, GenderAgeVote};
use crate::profile::{AgeGroup, Gender, UserProfile};
use crate::shape::classify;
use crate::types::{FaceRect, FaceShape, LandmarkSet, ShapeResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- Named constants (no magic numbers) ---

/// Faces narrower or shorter than this (pixels) are rejected.
pub const DEFAULT_MIN_FACE_SIZE: f64 = 30.0;
/// Shape confidence below this is rejected.
pub const DEFAULT_MIN_SHAPE_CONFIDENCE: f64 = 0.3;
/// Weight of the landmark detector's own gender/age attributes.
pub const DETECTOR_VOTE_WEIGHT: f64 = 0.7;
/// Source name of the detector vote.
pub const DETECTOR_SOURCE: &str = "detector";

/// Detector attribute, either bare or wrapped as `{"value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue<T> {
    Wrapped { value: T },
    Bare(T),
}

impl<T> AttributeValue<T> {
    pub fn into_inner(self) -> T {
        match self {
            AttributeValue::Wrapped { value } | AttributeValue::Bare(value) => value,
        }
    }

    pub fn get(&self) -> &T {
        match self {
            AttributeValue::Wrapped { value } | AttributeValue::Bare(value) => value,
        }
    }
}

/// Gender/age attributes reported by the landmark detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorAttributes {
    pub gender: Option<AttributeValue<String>>,
    pub age: Option<AttributeValue<f64>>,
}

impl DetectorAttributes {
    /// The detector's opinion as a vote, if it reported anything.
    pub fn vote(&self) -> Option<GenderAgeVote> {
        if self.gender.is_none() && self.age.is_none() {
            return None;
        }
        let gender = self
            .gender
            .as_ref()
            .map(|g| Gender::coerce(g.get()))
            .unwrap_or(Gender::Unknown);
        let age = self.age.as_ref().map(|a| *a.get());
        Some(GenderAgeVote::new(DETECTOR_SOURCE, gender, age).with_weight(DETECTOR_VOTE_WEIGHT))
    }
}

/// One face as returned by the landmark detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectedFace {
    #[serde(rename = "face_rectangle", alias = "rect")]
    pub rect: FaceRect,
    #[serde(rename = "landmark", alias = "landmarks", alias = "landmark_position")]
    pub landmarks: LandmarkSet,
    pub attributes: DetectorAttributes,
}

/// Quality gates applied before a face is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_face_size: f64,
    pub min_shape_confidence: f64,
    /// Reject images with several faces instead of analysing the largest.
    pub reject_multiple_faces: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_face_size: DEFAULT_MIN_FACE_SIZE,
            min_shape_confidence: DEFAULT_MIN_SHAPE_CONFIDENCE,
            reject_multiple_faces: false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("no face detected")]
    NoFace,

    #[error("{0} faces detected, expected exactly one")]
    MultipleFaces(usize),

    #[error("face too small for reliable analysis: {width}x{height} px (minimum {min} px)")]
    FaceTooSmall { width: f64, height: f64, min: f64 },

    #[error("face shape {shape} classified with low confidence {confidence:.2}")]
    LowConfidence { shape: FaceShape, confidence: f64 },
}

/// Result of a successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAnalysis {
    pub shape: ShapeResult,
    pub estimate: GenderAgeEstimate,
    pub profile: UserProfile,
}

pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyse detector output. `extra_votes` come from secondary gender/age
    /// estimators and are merged with the detector's own attributes.
    pub fn analyze(&self, faces: &[DetectedFace], extra_votes: &[GenderAgeVote]) -> Result<FaceAnalysis, AnalysisError> {
        if faces.len() > 1 && self.config.reject_multiple_faces {
            return Err(AnalysisError::MultipleFaces(faces.len()));
        }
        let face = largest_face(faces).ok_or(AnalysisError::NoFace)?;

        let min = self.config.min_face_size;
        let rect = face.rect;
        // NaN dimensions fail the comparison and are rejected too.
        if !(rect.width >= min && rect.height >= min) {
            return Err(AnalysisError::FaceTooSmall {
                width: rect.width,
                height: rect.height,
                min,
            });
        }

        let votes: Vec<GenderAgeVote> = face
            .attributes
            .vote()
            .into_iter()
            .chain(extra_votes.iter().cloned())
            .collect();
        let estimate = combine(&votes);

        let shape = classify(&face.landmarks, &rect);
        if shape.shape == FaceShape::Unknown || shape.confidence < self.config.min_shape_confidence {
            return Err(AnalysisError::LowConfidence {
                shape: shape.shape,
                confidence: shape.confidence,
            });
        }

        let profile = UserProfile {
            gender: estimate.gender,
            age_group: AgeGroup::from_gender_age(estimate.gender, estimate.age),
            face_shape: shape.shape,
            ..Default::default()
        };

        tracing::info!(
            faces = faces.len(),
            shape = %shape.shape,
            confidence = shape.confidence,
            gender = %profile.gender,
            age_group = %profile.age_group,
            "face analysed"
        );

        Ok(FaceAnalysis { shape, estimate, profile })
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

/// Face with the largest rectangle area; the earliest wins ties.
fn largest_face(faces: &[DetectedFace]) -> Option<&DetectedFace> {
    let mut best: Option<(&DetectedFace, f64)> = None;
    for face in faces {
        let area = face.rect.area();
        let area = if area.is_finite() { area } else { 0.0 };
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((face, area)),
        }
    }
    best.map(|(face, _)| face)
}
