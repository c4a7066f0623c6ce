//! Geometric face-shape classification.
//!
//! Reads forehead, cheekbone and jaw widths plus face length off eye-level
//! landmarks, turns them into ratios and scores six shape hypotheses.

use crate::normalize::{self, lookup, TOP_CENTER};
use crate::types::{round2, FaceRect, FaceShape, LandmarkSet, Measurements, ShapeResult};
use serde::Serialize;

// --- Named constants (no magic numbers) ---
const OVAL_RATIO_MIN: f64 = 1.05;
const OVAL_RATIO_MAX: f64 = 1.70;
const HEART_FOREHEAD_SPAN: f64 = 0.6;
const LONG_RATIO_MIN: f64 = 1.6;
const LONG_RATIO_SPAN: f64 = 1.2;
const LONG_BASE_SCORE: f64 = 0.5;

// Landmark keys per measurement, most preferred first. Several providers and
// older payloads name the same contour points differently.
const FOREHEAD_LEFT: &[&str] = &["contour_left1", "contour_left2", "left_eyebrow_left_corner"];
const FOREHEAD_RIGHT: &[&str] = &["contour_right1", "contour_right2", "right_eyebrow_right_corner"];
const CHEEK_LEFT: &[&str] = &["contour_left4", "left_cheek", "contour_left3"];
const CHEEK_RIGHT: &[&str] = &["contour_right4", "right_cheek", "contour_right3"];
const JAW_LEFT: &[&str] = &["contour_left8", "contour_left7"];
const JAW_RIGHT: &[&str] = &["contour_right8", "contour_right7"];
const CHIN: &[&str] = &["contour_chin", "chin"];

/// Proportions derived from [`Measurements`]. A ratio is `None` when either
/// operand is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratios {
    pub length_to_width: Option<f64>,
    pub jaw_to_cheek: Option<f64>,
    pub forehead_to_cheek: Option<f64>,
}

impl Ratios {
    pub fn from_measurements(m: &Measurements) -> Self {
        let ratio = |num: Option<f64>, den: Option<f64>| match (num, den) {
            (Some(n), Some(d)) if d > 0.0 => Some(n / d),
            _ => None,
        };
        let width = m.cheekbone_width.or(m.forehead_width).or(m.jaw_width);

        Self {
            length_to_width: ratio(m.face_length, width),
            jaw_to_cheek: ratio(m.jaw_width, m.cheekbone_width),
            forehead_to_cheek: ratio(m.forehead_width, m.cheekbone_width),
        }
    }
}

/// Per-hypothesis scores, each clamped to [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ShapeScores {
    pub round: f64,
    pub oval: f64,
    pub square: f64,
    pub heart: f64,
    pub diamond: f64,
    pub long: f64,
}

impl ShapeScores {
    pub fn from_ratios(r: &Ratios) -> Self {
        let length = r.length_to_width;

        let round = length.map_or(0.0, |l| (1.0 - (l - 1.0).abs()).max(0.0));

        let oval = length.map_or(0.0, |l| {
            if l > OVAL_RATIO_MIN && l < OVAL_RATIO_MAX {
                ((l - OVAL_RATIO_MIN) / (OVAL_RATIO_MAX - OVAL_RATIO_MIN)).min(1.0)
            } else {
                0.0
            }
        });

        // Square shares the round base and needs a jaw as wide as the cheekbones.
        let square = match r.jaw_to_cheek {
            Some(j) => round * (1.0 - (j - 1.0).abs()),
            None => round,
        };

        let mut heart = r
            .forehead_to_cheek
            .map_or(0.0, |f| ((f - 1.0) / HEART_FOREHEAD_SPAN).max(0.0));
        if let Some(j) = r.jaw_to_cheek {
            heart *= (1.0 - j).max(0.0);
        }

        let diamond = match (r.forehead_to_cheek, r.jaw_to_cheek) {
            (Some(f), Some(j)) => ((1.0 - f) + (1.0 - j)).max(0.0),
            _ => 0.0,
        };

        let long = length.map_or(0.0, |l| {
            if l >= LONG_RATIO_MIN {
                ((l - LONG_RATIO_MIN) / LONG_RATIO_SPAN + LONG_BASE_SCORE).min(1.0)
            } else {
                0.0
            }
        });

        Self {
            round: clamp_unit(round),
            oval: clamp_unit(oval),
            square: clamp_unit(square),
            heart: clamp_unit(heart),
            diamond: clamp_unit(diamond),
            long: clamp_unit(long),
        }
    }

    /// Scores paired with their hypothesis, in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (FaceShape, f64)> {
        let values = [self.round, self.oval, self.square, self.heart, self.diamond, self.long];
        FaceShape::HYPOTHESES.into_iter().zip(values)
    }

    /// Strictly highest score; ties keep the earlier hypothesis.
    /// `(Unknown, 0.0)` when every score is zero.
    pub fn best(&self) -> (FaceShape, f64) {
        let mut best = (FaceShape::Unknown, 0.0);
        for (shape, score) in self.iter() {
            if score > best.1 {
                best = (shape, score);
            }
        }
        best
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn positive(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Distance between the first available left/right landmark pair.
fn span(landmarks: &LandmarkSet, left: &[&str], right: &[&str]) -> Option<f64> {
    let l = lookup(landmarks, left)?;
    let r = lookup(landmarks, right)?;
    positive(l.distance(&r))
}

/// Derive measurements from landmarks already in the eye-level frame
/// (see [`normalize::normalize`]).
///
/// Forehead width falls back to the rectangle width and face length to the
/// rectangle height when no landmark pair is available. Values keep full
/// precision; [`Measurements::rounded`] gives the reported form.
pub fn measure(normalized: &LandmarkSet, rect: &FaceRect) -> Measurements {
    let forehead_width =
        span(normalized, FOREHEAD_LEFT, FOREHEAD_RIGHT).or_else(|| positive(rect.width));
    let cheekbone_width = span(normalized, CHEEK_LEFT, CHEEK_RIGHT);
    let jaw_width = span(normalized, JAW_LEFT, JAW_RIGHT);

    let face_length = match (normalized.get(TOP_CENTER), lookup(normalized, CHIN)) {
        (Some(top), Some(chin)) => positive(top.distance(&chin)),
        _ => None,
    }
    .or_else(|| positive(rect.height));

    Measurements {
        forehead_width,
        cheekbone_width,
        jaw_width,
        face_length,
    }
}

/// Classify the face shape from raw detector landmarks and face rectangle.
///
/// Never fails: with too little geometry to score any hypothesis the result
/// is `unknown` with confidence 0.
pub fn classify(landmarks: &LandmarkSet, rect: &FaceRect) -> ShapeResult {
    let normalized = normalize::normalize(landmarks, rect);
    let measurements = measure(&normalized, rect);
    let ratios = Ratios::from_measurements(&measurements);
    let scores = ShapeScores::from_ratios(&ratios);
    let (shape, score) = scores.best();

    tracing::debug!(
        ?ratios,
        ?scores,
        shape = %shape,
        "face shape scored"
    );

    ShapeResult {
        shape,
        confidence: round2(score),
        measurements: measurements.rounded(),
    }
}
