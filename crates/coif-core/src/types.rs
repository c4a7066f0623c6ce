use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 2-D coordinate in image space (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Rotate around `center` by `angle` radians (counter-clockwise in a
    /// y-up frame, clockwise on screen).
    pub fn rotate_about(self, center: Point2D, angle: f64) -> Point2D {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point2D {
            x: center.x + dx * cos - dy * sin,
            y: center.y + dx * sin + dy * cos,
        }
    }
}

/// Named facial landmarks. Keys are provider-specific and may be absent.
pub type LandmarkSet = BTreeMap<String, Point2D>;

/// Axis-aligned bounding box of a detected face.
///
/// Missing fields deserialize as zero, which [`FaceRect::is_degenerate`]
/// reports so callers can skip rectangle-derived measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
            || !(self.left.is_finite() && self.top.is_finite())
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Midpoint of the top edge.
    pub fn top_center(&self) -> Point2D {
        Point2D::new(self.left + self.width / 2.0, self.top)
    }
}

/// Rejected attribute text for one of the strict enum parsers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseAttributeError {
    pub kind: &'static str,
    pub value: String,
}

/// Face-shape label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceShape {
    Round,
    Oval,
    Square,
    Heart,
    Diamond,
    Long,
    #[default]
    Unknown,
}

impl FaceShape {
    /// The six shape hypotheses, in classifier evaluation order.
    pub const HYPOTHESES: [FaceShape; 6] = [
        FaceShape::Round,
        FaceShape::Oval,
        FaceShape::Square,
        FaceShape::Heart,
        FaceShape::Diamond,
        FaceShape::Long,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FaceShape::Round => "round",
            FaceShape::Oval => "oval",
            FaceShape::Square => "square",
            FaceShape::Heart => "heart",
            FaceShape::Diamond => "diamond",
            FaceShape::Long => "long",
            FaceShape::Unknown => "unknown",
        }
    }

    /// Lenient parse: exact label (case-insensitive), otherwise `Unknown`.
    pub fn coerce(text: &str) -> Self {
        text.parse().unwrap_or(FaceShape::Unknown)
    }
}

impl fmt::Display for FaceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaceShape {
    type Err = ParseAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        FaceShape::HYPOTHESES
            .into_iter()
            .chain(std::iter::once(FaceShape::Unknown))
            .find(|shape| shape.as_str() == lowered)
            .ok_or_else(|| ParseAttributeError {
                kind: "face shape",
                value: s.to_string(),
            })
    }
}

/// Facial measurements in pixels. `None` means the measurement could not be
/// derived from the available landmarks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    pub forehead_width: Option<f64>,
    pub cheekbone_width: Option<f64>,
    pub jaw_width: Option<f64>,
    pub face_length: Option<f64>,
}

impl Measurements {
    /// Copy with every measurement rounded to whole pixels.
    pub fn rounded(&self) -> Self {
        let round = |v: Option<f64>| v.map(f64::round);
        Self {
            forehead_width: round(self.forehead_width),
            cheekbone_width: round(self.cheekbone_width),
            jaw_width: round(self.jaw_width),
            face_length: round(self.face_length),
        }
    }
}

/// Outcome of face-shape classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeResult {
    pub shape: FaceShape,
    /// Score of the winning hypothesis in [0, 1], rounded to 2 decimals.
    pub confidence: f64,
    pub measurements: Measurements,
}

impl ShapeResult {
    pub fn unknown() -> Self {
        Self {
            shape: FaceShape::Unknown,
            confidence: 0.0,
            measurements: Measurements::default(),
        }
    }
}

/// Round to two decimal places, the precision used for reported scores.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_about_quarter_turn() {
        let p = Point2D::new(2.0, 1.0).rotate_about(Point2D::new(1.0, 1.0), std::f64::consts::FRAC_PI_2);
        assert!((p.x - 1.0).abs() < 1e-12, "x = {}", p.x);
        assert!((p.y - 2.0).abs() < 1e-12, "y = {}", p.y);
    }

    #[test]
    fn test_rect_degenerate() {
        assert!(FaceRect::default().is_degenerate());
        let rect = FaceRect { left: 10.0, top: 20.0, width: 100.0, height: 120.0 };
        assert!(!rect.is_degenerate());
        assert_eq!(rect.top_center(), Point2D::new(60.0, 20.0));
        assert_eq!(rect.center(), Point2D::new(60.0, 80.0));
    }

    #[test]
    fn test_rect_missing_fields_default_to_zero() {
        let rect: FaceRect = serde_json::from_str(r#"{"width": 80, "height": 90}"#).unwrap();
        assert_eq!(rect.left, 0.0);
        assert_eq!(rect.width, 80.0);
    }

    #[test]
    fn test_face_shape_parse() {
        assert_eq!("Oval".parse::<FaceShape>().unwrap(), FaceShape::Oval);
        assert_eq!(" long ".parse::<FaceShape>().unwrap(), FaceShape::Long);
        assert!("oblong".parse::<FaceShape>().is_err());
        assert_eq!(FaceShape::coerce("oblong"), FaceShape::Unknown);
    }

    #[test]
    fn test_measurements_serialize_camel_case_with_nulls() {
        let m = Measurements { forehead_width: Some(120.0), ..Default::default() };
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["foreheadWidth"], 120.0);
        assert!(json["jawWidth"].is_null());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.8333), 0.83);
        assert_eq!(round2(0.125), 0.13);
    }
}
