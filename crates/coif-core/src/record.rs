use crate::profile::{AgeGroup, Gender, HairType};
use crate::types::FaceShape;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ethnicity value matching every requested ethnicity.
pub const WILDCARD: &str = "all";

/// Canonical hairstyle catalog entry, after schema reconciliation.
///
/// `image` is the dedup key and is never empty for a record admitted to a
/// catalog. An empty `hair_types` set places no restriction on hair type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HairstyleRecord {
    pub name: String,
    pub gender: Gender,
    pub age_groups: BTreeSet<AgeGroup>,
    pub face_shapes: BTreeSet<FaceShape>,
    pub hair_types: BTreeSet<HairType>,
    pub ethnicity: BTreeSet<String>,
    pub hair_length: String,
    pub description: String,
    pub image: String,
}

impl HairstyleRecord {
    /// Whether the record carries the ethnicity wildcard.
    pub fn is_universal(&self) -> bool {
        self.ethnicity.contains(WILDCARD)
    }

    /// Whether the record suits `ethnicity`, directly or through the wildcard.
    pub fn admits_ethnicity(&self, ethnicity: &str) -> bool {
        self.is_universal() || self.ethnicity.contains(ethnicity)
    }
}
