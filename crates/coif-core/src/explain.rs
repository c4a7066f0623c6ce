//! Human-readable reasons a recommended hairstyle suits a profile.

use crate::profile::{Gender, HairType, UserProfile};
use crate::record::HairstyleRecord;
use crate::types::FaceShape;

/// Maximum number of reasons attached to a recommendation.
pub const MAX_REASONS: usize = 3;

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// Up to [`MAX_REASONS`] reasons, most specific first.
pub fn reasons(record: &HairstyleRecord, profile: &UserProfile) -> Vec<String> {
    let mut out = Vec::with_capacity(MAX_REASONS);

    if profile.face_shape != FaceShape::Unknown && record.face_shapes.contains(&profile.face_shape) {
        out.push(format!("Perfect for {} face shapes", profile.face_shape));
    }

    if profile.hair_type != HairType::Unknown
        && (record.hair_types.is_empty() || record.hair_types.contains(&profile.hair_type))
    {
        out.push(format!("Works well with {} hair texture", profile.hair_type));
    }

    if profile.gender != Gender::Unknown
        && record.gender == profile.gender
        && record.age_groups.contains(&profile.age_group)
    {
        out.push(format!("Suitable for {}", profile.age_group.audience()));
    }

    if let Some(ethnicity) = profile.requested_ethnicity() {
        if record.admits_ethnicity(ethnicity) {
            out.push(format!("Compatible with {ethnicity} hair characteristics"));
        }
    }

    let forehead_large = profile.forehead_size.as_deref() == Some("large");
    if forehead_large && record.name.to_lowercase().contains("bangs") {
        out.push("Bangs help balance a larger forehead".to_string());
    }
    if profile.jaw_shape.as_deref() == Some("wide") && record.hair_length == "long" {
        out.push("Long length softens a strong jawline".to_string());
    }
    if profile.face_shape == FaceShape::Round && !record.hair_length.is_empty() && record.hair_length != "short" {
        out.push("Added length elongates a round face".to_string());
    }

    if let Some(preview) = description_preview(&record.description) {
        out.push(preview);
    }

    out.truncate(MAX_REASONS);
    out
}

fn description_preview(description: &str) -> Option<String> {
    let description = description.trim();
    if description.is_empty() {
        return None;
    }
    match description.char_indices().nth(DESCRIPTION_PREVIEW_CHARS) {
        Some((cut, _)) => Some(format!("{}...", description[..cut].trim_end())),
        None => Some(description.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::AgeGroup;

    fn record() -> HairstyleRecord {
        HairstyleRecord {
            name: "Curtain Bangs".into(),
            gender: Gender::Female,
            age_groups: [AgeGroup::AdultFemale].into(),
            face_shapes: [FaceShape::Round].into(),
            hair_types: [HairType::Wavy].into(),
            ethnicity: ["all".to_string()].into(),
            hair_length: "long".into(),
            description: String::new(),
            image: "curtain.jpg".into(),
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            gender: Gender::Female,
            age_group: AgeGroup::AdultFemale,
            face_shape: FaceShape::Round,
            hair_type: HairType::Wavy,
            ..Default::default()
        }
    }

    #[test]
    fn test_primary_reasons_in_order() {
        let out = reasons(&record(), &profile());
        assert_eq!(
            out,
            [
                "Perfect for round face shapes",
                "Works well with wavy hair texture",
                "Suitable for adult women",
            ]
        );
    }

    #[test]
    fn test_visual_balance_rules() {
        let mut p = profile();
        p.face_shape = FaceShape::Unknown;
        p.hair_type = HairType::Unknown;
        p.gender = Gender::Unknown;
        p.forehead_size = Some("large".into());
        p.jaw_shape = Some("wide".into());

        let out = reasons(&record(), &p);
        assert_eq!(
            out,
            ["Bangs help balance a larger forehead", "Long length softens a strong jawline"]
        );
    }

    #[test]
    fn test_requested_ethnicity_reason() {
        let mut p = profile();
        p.face_shape = FaceShape::Oval;
        p.hair_type = HairType::Unknown;
        p.ethnicity = "east-asian".into();
        let out = reasons(&record(), &p);
        assert_eq!(
            out,
            ["Suitable for adult women", "Compatible with east-asian hair characteristics"]
        );
    }

    #[test]
    fn test_description_preview_truncates_on_char_boundary() {
        let mut r = record();
        r.description = "é".repeat(150);
        let p = UserProfile::default();

        let out = reasons(&r, &p);
        assert_eq!(out.len(), 1);
        assert!(out[0].ends_with("..."));
        assert_eq!(out[0].chars().count(), 103);
    }

    #[test]
    fn test_short_description_is_kept_whole() {
        let mut r = record();
        r.description = "Soft face-framing layers.".into();
        let out = reasons(&r, &UserProfile::default());
        assert_eq!(out, ["Soft face-framing layers."]);
    }

    #[test]
    fn test_nothing_to_say() {
        let out = reasons(&record(), &UserProfile::default());
        assert!(out.is_empty());
    }
}
