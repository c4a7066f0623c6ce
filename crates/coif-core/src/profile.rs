//! User attributes and their coercion from loosely-typed provider output.

use crate::types::{FaceShape, ParseAttributeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const AGE_CHILD_MAX: u32 = 12;
const AGE_TEEN_MAX: u32 = 17;

/// Ethnicity values that never restrict a match.
const ETHNICITY_WILDCARDS: [&str; 2] = ["all", "unknown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }

    /// Lenient parse used for provider output: anything starting with `m`
    /// is male, with `f` female.
    pub fn coerce(text: &str) -> Self {
        let lowered = text.trim().to_ascii_lowercase();
        if lowered.starts_with('m') {
            Gender::Male
        } else if lowered.starts_with('f') {
            Gender::Female
        } else {
            Gender::Unknown
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ParseAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "unknown" => Ok(Gender::Unknown),
            _ => Err(ParseAttributeError {
                kind: "gender",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgeGroup {
    ChildBoy,
    ChildGirl,
    TeenBoy,
    TeenGirl,
    AdultMale,
    AdultFemale,
    #[default]
    Unknown,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::ChildBoy,
        AgeGroup::ChildGirl,
        AgeGroup::TeenBoy,
        AgeGroup::TeenGirl,
        AgeGroup::AdultMale,
        AgeGroup::AdultFemale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::ChildBoy => "child-boy",
            AgeGroup::ChildGirl => "child-girl",
            AgeGroup::TeenBoy => "teen-boy",
            AgeGroup::TeenGirl => "teen-girl",
            AgeGroup::AdultMale => "adult-male",
            AgeGroup::AdultFemale => "adult-female",
            AgeGroup::Unknown => "unknown",
        }
    }

    /// Plural audience wording, e.g. "teen girls".
    pub fn audience(&self) -> &'static str {
        match self {
            AgeGroup::ChildBoy => "young boys",
            AgeGroup::ChildGirl => "young girls",
            AgeGroup::TeenBoy => "teen boys",
            AgeGroup::TeenGirl => "teen girls",
            AgeGroup::AdultMale => "adult men",
            AgeGroup::AdultFemale => "adult women",
            AgeGroup::Unknown => "everyone",
        }
    }

    /// Lenient parse: the exact label, or text containing its spaced form
    /// ("Adult male" → `AdultMale`).
    pub fn coerce(text: &str) -> Self {
        let lowered = text.trim().to_ascii_lowercase();
        AgeGroup::ALL
            .into_iter()
            .find(|group| {
                let label = group.as_str();
                lowered == label || lowered.contains(&label.replace('-', " "))
            })
            .unwrap_or(AgeGroup::Unknown)
    }

    /// Age bracket for a gender and an age in years.
    pub fn from_gender_age(gender: Gender, age: Option<u32>) -> Self {
        let Some(age) = age else {
            return AgeGroup::Unknown;
        };
        match (gender, age) {
            (Gender::Male, 0..=AGE_CHILD_MAX) => AgeGroup::ChildBoy,
            (Gender::Female, 0..=AGE_CHILD_MAX) => AgeGroup::ChildGirl,
            (Gender::Male, a) if a <= AGE_TEEN_MAX => AgeGroup::TeenBoy,
            (Gender::Female, a) if a <= AGE_TEEN_MAX => AgeGroup::TeenGirl,
            (Gender::Male, _) => AgeGroup::AdultMale,
            (Gender::Female, _) => AgeGroup::AdultFemale,
            (Gender::Unknown, _) => AgeGroup::Unknown,
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = ParseAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        AgeGroup::ALL
            .into_iter()
            .chain(std::iter::once(AgeGroup::Unknown))
            .find(|group| group.as_str() == lowered)
            .ok_or_else(|| ParseAttributeError {
                kind: "age group",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HairType {
    Straight,
    Wavy,
    Curly,
    Coily,
    #[default]
    Unknown,
}

impl HairType {
    pub const ALL: [HairType; 4] = [HairType::Straight, HairType::Wavy, HairType::Curly, HairType::Coily];

    pub fn as_str(&self) -> &'static str {
        match self {
            HairType::Straight => "straight",
            HairType::Wavy => "wavy",
            HairType::Curly => "curly",
            HairType::Coily => "coily",
            HairType::Unknown => "unknown",
        }
    }

    pub fn coerce(text: &str) -> Self {
        text.parse().unwrap_or(HairType::Unknown)
    }
}

impl fmt::Display for HairType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HairType {
    type Err = ParseAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        HairType::ALL
            .into_iter()
            .chain(std::iter::once(HairType::Unknown))
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| ParseAttributeError {
                kind: "hair type",
                value: s.to_string(),
            })
    }
}

/// Normalize free-form ethnicity text; blank input becomes `"unknown"`.
pub fn normalize_ethnicity(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        "unknown".to_string()
    } else {
        lowered
    }
}

/// Canonical attributes the recommendation engine filters on.
///
/// The descriptive fields feed explanation text only and never affect which
/// records match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub face_shape: FaceShape,
    pub hair_type: HairType,
    pub ethnicity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jaw_shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forehead_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hairline_shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hair_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_density: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_tone: Option<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            gender: Gender::Unknown,
            age_group: AgeGroup::Unknown,
            face_shape: FaceShape::Unknown,
            hair_type: HairType::Unknown,
            ethnicity: "unknown".to_string(),
            jaw_shape: None,
            forehead_size: None,
            hairline_shape: None,
            current_hair_length: None,
            hair_density: None,
            skin_tone: None,
        }
    }
}

impl UserProfile {
    /// Ethnicity to filter on, or `None` when it is a wildcard.
    pub fn requested_ethnicity(&self) -> Option<&str> {
        let e = self.ethnicity.as_str();
        (!e.is_empty() && !ETHNICITY_WILDCARDS.contains(&e)).then_some(e)
    }

    /// Build a profile from a vision describer's answer, coercing every
    /// off-enum value to its `Unknown` fallback.
    pub fn from_vision(attrs: &VisionAttributes) -> Self {
        Self {
            gender: Gender::coerce(text(&attrs.gender)),
            age_group: AgeGroup::coerce(text(&attrs.age_group)),
            face_shape: FaceShape::coerce(text(&attrs.face_shape)),
            hair_type: HairType::coerce(text(&attrs.hair_type)),
            ethnicity: normalize_ethnicity(text(&attrs.ethnicity)),
            jaw_shape: descriptive(&attrs.jaw_shape),
            forehead_size: descriptive(&attrs.forehead_size),
            hairline_shape: descriptive(&attrs.hairline_shape),
            current_hair_length: descriptive(&attrs.current_hair_length),
            hair_density: descriptive(&attrs.hair_density),
            skin_tone: descriptive(&attrs.skin_tone),
        }
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn descriptive(value: &Option<String>) -> Option<String> {
    let lowered = value.as_deref()?.trim().to_lowercase();
    (!lowered.is_empty() && lowered != "unknown").then_some(lowered)
}

/// Raw answer of the vision-language describer. Every key is optional and
/// every value is unvalidated text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisionAttributes {
    pub age_group: Option<String>,
    pub gender: Option<String>,
    pub face_shape: Option<String>,
    pub ethnicity: Option<String>,
    pub hair_type: Option<String>,
    pub jaw_shape: Option<String>,
    pub forehead_size: Option<String>,
    pub hairline_shape: Option<String>,
    pub current_hair_length: Option<String>,
    pub hair_density: Option<String>,
    pub skin_tone: Option<String>,
}
