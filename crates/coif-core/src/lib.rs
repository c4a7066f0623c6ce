//! coif-core: Face-shape classification and hairstyle recommendation.
//!
//! Normalizes detector landmarks into an eye-level frame, scores six face
//! shape hypotheses from facial proportions, and ranks catalog hairstyles
//! against a user profile with a strict attribute filter.

pub mod analysis;
pub mod estimate;
pub mod explain;
pub mod normalize;
pub mod profile;
pub mod recommend;
pub mod record;
pub mod shape;
pub mod types;

pub use analysis::{AnalysisConfig, AnalysisError, Analyzer, DetectedFace, FaceAnalysis};
pub use estimate::{GenderAgeEstimate, GenderAgeVote};
pub use profile::{AgeGroup, Gender, HairType, UserProfile, VisionAttributes};
pub use recommend::{Bounds, Recommender, ScoredCandidate, ScoringWeights};
pub use record::HairstyleRecord;
pub use shape::classify;
pub use types::{FaceRect, FaceShape, LandmarkSet, Measurements, Point2D, ShapeResult};
