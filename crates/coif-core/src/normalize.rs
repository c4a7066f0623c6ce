//! Head-tilt correction for facial landmarks.
//!
//! Rotates every landmark around the eye midpoint so the eye line becomes
//! horizontal. In the corrected frame the origin sits between the eyes, x runs
//! along the eye line and y points down the face, so widths and lengths can
//! be read along the axes regardless of head roll.

use crate::types::{FaceRect, LandmarkSet, Point2D};

/// Synthetic key holding the corrected top-center of the face rectangle.
pub const TOP_CENTER: &str = "__topCenter";

const LEFT_EYE_KEYS: [&str; 3] = [
    "left_eye_center",
    "left_eye_left_corner",
    "left_eye_right_corner",
];
const RIGHT_EYE_KEYS: [&str; 3] = [
    "right_eye_center",
    "right_eye_right_corner",
    "right_eye_left_corner",
];

/// First finite landmark among `keys`, in priority order.
pub fn lookup(landmarks: &LandmarkSet, keys: &[&str]) -> Option<Point2D> {
    keys.iter()
        .find_map(|key| landmarks.get(*key).copied().filter(Point2D::is_finite))
}

/// Eye-level reference frame estimated from the eye landmarks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeFrame {
    /// Eye midpoint in image coordinates.
    pub origin: Point2D,
    /// Roll angle of the eye line in radians (0 when an eye is missing).
    pub angle: f64,
}

impl EyeFrame {
    /// Estimate the frame from eye landmarks, substituting the rectangle
    /// midpoint for a missing eye.
    pub fn estimate(landmarks: &LandmarkSet, rect: &FaceRect) -> Self {
        let left = lookup(landmarks, &LEFT_EYE_KEYS);
        let right = lookup(landmarks, &RIGHT_EYE_KEYS);
        let fallback = Some(rect.center())
            .filter(Point2D::is_finite)
            .unwrap_or(Point2D::new(0.0, 0.0));

        let l = left.unwrap_or(fallback);
        let r = right.unwrap_or(fallback);
        let origin = Point2D::new((l.x + r.x) / 2.0, (l.y + r.y) / 2.0);

        let angle = match (left, right) {
            (Some(l), Some(r)) => (r.y - l.y).atan2(r.x - l.x),
            _ => 0.0,
        };

        Self { origin, angle }
    }

    /// Map an image point into the corrected frame.
    pub fn apply(&self, p: Point2D) -> Point2D {
        let rotated = p.rotate_about(self.origin, -self.angle);
        Point2D::new(rotated.x - self.origin.x, rotated.y - self.origin.y)
    }
}

/// Rotate all landmarks into the eye-level frame.
///
/// The result holds every finite input landmark plus [`TOP_CENTER`], the
/// corrected top-center of `rect` (omitted when the rectangle is degenerate).
/// Never fails: without both eyes the rotation angle is zero.
pub fn normalize(landmarks: &LandmarkSet, rect: &FaceRect) -> LandmarkSet {
    let frame = EyeFrame::estimate(landmarks, rect);

    let mut out: LandmarkSet = landmarks
        .iter()
        .filter(|(_, p)| p.is_finite())
        .map(|(key, p)| (key.clone(), frame.apply(*p)))
        .collect();

    if !rect.is_degenerate() {
        out.insert(TOP_CENTER.to_string(), frame.apply(rect.top_center()));
    } else {
        out.remove(TOP_CENTER);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(points: &[(&str, f64, f64)]) -> LandmarkSet {
        points
            .iter()
            .map(|(k, x, y)| (k.to_string(), Point2D::new(*x, *y)))
            .collect()
    }

    fn rect() -> FaceRect {
        FaceRect { left: 100.0, top: 50.0, width: 200.0, height: 260.0 }
    }

    #[test]
    fn test_level_eyes_translate_only() {
        let lm = set(&[
            ("left_eye_center", 160.0, 140.0),
            ("right_eye_center", 240.0, 140.0),
            ("contour_chin", 200.0, 300.0),
        ]);
        let frame = EyeFrame::estimate(&lm, &rect());
        assert!(frame.angle.abs() < 1e-12);

        let out = normalize(&lm, &rect());
        let chin = out["contour_chin"];
        assert!((chin.x - 0.0).abs() < 1e-9, "chin.x = {}", chin.x);
        assert!((chin.y - 160.0).abs() < 1e-9, "chin.y = {}", chin.y);

        let top = out[TOP_CENTER];
        assert!((top.x - 0.0).abs() < 1e-9);
        assert!((top.y + 90.0).abs() < 1e-9, "top.y = {}", top.y);
    }

    #[test]
    fn test_tilted_eyes_become_level() {
        let lm = set(&[
            ("left_eye_center", 100.0, 100.0),
            ("right_eye_center", 160.0, 160.0),
        ]);
        let frame = EyeFrame::estimate(&lm, &rect());
        assert!((frame.angle - std::f64::consts::FRAC_PI_4).abs() < 1e-12);

        let out = normalize(&lm, &rect());
        let l = out["left_eye_center"];
        let r = out["right_eye_center"];
        assert!((l.y - r.y).abs() < 1e-9, "eye line not level: {} vs {}", l.y, r.y);
        assert!(r.x > l.x);
        assert!(((r.x - l.x) - 60.0 * std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_corner_fallback() {
        let lm = set(&[
            ("left_eye_left_corner", 90.0, 100.0),
            ("right_eye_right_corner", 170.0, 100.0),
        ]);
        let frame = EyeFrame::estimate(&lm, &rect());
        assert_eq!(frame.origin, Point2D::new(130.0, 100.0));
        assert!(frame.angle.abs() < 1e-12);
    }

    #[test]
    fn test_single_eye_means_no_rotation() {
        let lm = set(&[("left_eye_center", 120.0, 90.0)]);
        let frame = EyeFrame::estimate(&lm, &rect());
        assert_eq!(frame.angle, 0.0);
        // Midpoint between the left eye and the rectangle center (200, 180)
        assert_eq!(frame.origin, Point2D::new(160.0, 135.0));
    }

    #[test]
    fn test_no_eyes_uses_rect_center() {
        let frame = EyeFrame::estimate(&LandmarkSet::new(), &rect());
        assert_eq!(frame.origin, Point2D::new(200.0, 180.0));
        assert_eq!(frame.angle, 0.0);
    }

    #[test]
    fn test_non_finite_landmarks_dropped() {
        let lm = set(&[("contour_chin", f64::NAN, 10.0), ("nose_tip", 200.0, 200.0)]);
        let out = normalize(&lm, &rect());
        assert!(!out.contains_key("contour_chin"));
        assert!(out.contains_key("nose_tip"));
    }

    #[test]
    fn test_degenerate_rect_has_no_top_center() {
        let lm = set(&[("nose_tip", 200.0, 200.0)]);
        let out = normalize(&lm, &FaceRect::default());
        assert!(!out.contains_key(TOP_CENTER));
        assert_eq!(out.len(), 1);
    }
}
