//! Schema reconciliation: raw catalog entries to canonical records.
//!
//! Catalog files written over time disagree on field names and on whether a
//! set-valued field is a list or a scalar. Every canonical field is read
//! through an explicit alias table, and gender and age groups are inferred
//! from tags and partition labels when the record does not state them.

use crate::source::RawEntry;
use coif_core::profile::{AgeGroup, Gender, HairType};
use coif_core::record::{HairstyleRecord, WILDCARD};
use coif_core::types::FaceShape;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const DEFAULT_NAME: &str = "Unnamed";
const DEFAULT_HAIR_LENGTH: &str = "medium";

const FEMALE_TERMS: [&str; 6] = ["female", "females", "girl", "girls", "woman", "women"];
const MALE_TERMS: [&str; 6] = ["male", "males", "boy", "boys", "man", "men"];
// Matched as substrings, so "teenager" and "children" count.
const TEEN_MARKERS: [&str; 1] = ["teen"];
const CHILD_MARKERS: [&str; 2] = ["child", "kid"];

/// Canonical record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Gender,
    AgeGroups,
    FaceShapes,
    HairTypes,
    HairLength,
    Description,
    Image,
    Ethnicity,
    Tags,
}

/// Accepted source keys per field; the first present alias wins.
pub const FIELD_ALIASES: [(Field, &[&str]); 10] = [
    (Field::Name, &["name", "title"]),
    (Field::Gender, &["gender"]),
    (Field::AgeGroups, &["ageGroups"]),
    (Field::FaceShapes, &["faceShapes", "shape"]),
    (Field::HairTypes, &["hairTypes", "hairType", "type"]),
    (Field::HairLength, &["hairLength", "length"]),
    (Field::Description, &["description"]),
    (Field::Image, &["image", "photo"]),
    (Field::Ethnicity, &["ethnicity"]),
    (Field::Tags, &["tags", "labels"]),
];

impl Field {
    pub fn aliases(self) -> &'static [&'static str] {
        FIELD_ALIASES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// First non-blank value among the field's aliases.
fn lookup<'a>(fields: &'a Map<String, Value>, field: Field) -> Option<&'a Value> {
    field
        .aliases()
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .find(|value| !is_blank(value))
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn text(fields: &Map<String, Value>, field: Field) -> Option<String> {
    lookup(fields, field).and_then(scalar_text)
}

/// A list field, or a scalar taken as a singleton.
fn texts(fields: &Map<String, Value>, field: Field) -> Vec<String> {
    match lookup(fields, field) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty())
}

/// Gender as stated by the record's own gender field.
fn stated_gender(text: &str) -> Gender {
    if text == "female" || text.contains("girl") || text.contains("woman") {
        Gender::Female
    } else if text == "male" || text.contains("boy") || text.contains("man") {
        Gender::Male
    } else {
        Gender::Unknown
    }
}

/// Gender hinted by whole words of the tags, then by substrings of the
/// partition label. Female terms are checked first since several of them
/// contain a male term.
fn hinted_gender(tags: &[String], partition: Option<&str>) -> Gender {
    let any = |terms: &[&str]| {
        tags.iter().any(|tag| tokens(tag).any(|t| terms.contains(&t)))
            || partition.is_some_and(|label| terms.iter().any(|t| label.contains(*t)))
    };
    if any(&FEMALE_TERMS) {
        Gender::Female
    } else if any(&MALE_TERMS) {
        Gender::Male
    } else {
        Gender::Unknown
    }
}

fn age_groups(explicit: &[String], gender: Gender, markers: &[String]) -> BTreeSet<AgeGroup> {
    let stated: BTreeSet<AgeGroup> = explicit
        .iter()
        .filter_map(|s| s.parse::<AgeGroup>().ok())
        .filter(|g| *g != AgeGroup::Unknown)
        .collect();
    if !stated.is_empty() {
        return stated;
    }

    let has = |set: &[&str]| markers.iter().any(|m| set.iter().any(|s| m.contains(*s)));

    let (boy, girl) = if has(&TEEN_MARKERS) {
        (AgeGroup::TeenBoy, AgeGroup::TeenGirl)
    } else if has(&CHILD_MARKERS) {
        (AgeGroup::ChildBoy, AgeGroup::ChildGirl)
    } else {
        return match gender {
            Gender::Male => [AgeGroup::AdultMale, AgeGroup::TeenBoy].into(),
            Gender::Female => [AgeGroup::AdultFemale, AgeGroup::TeenGirl].into(),
            Gender::Unknown => [AgeGroup::AdultMale, AgeGroup::AdultFemale].into(),
        };
    };

    match gender {
        Gender::Male => [boy].into(),
        Gender::Female => [girl].into(),
        Gender::Unknown => [boy, girl].into(),
    }
}

/// Reconcile one raw entry. `None` when the entry has no image.
pub fn reconcile(entry: &RawEntry) -> Option<HairstyleRecord> {
    let fields = &entry.fields;
    let image = text(fields, Field::Image)?;

    let gender_field = text(fields, Field::Gender).map(|g| g.to_lowercase());
    let tags: Vec<String> = texts(fields, Field::Tags).iter().map(|t| t.to_lowercase()).collect();
    let partition = entry.partition.as_deref().map(str::to_lowercase);

    let gender = match gender_field.as_deref().map(stated_gender) {
        Some(g) if g != Gender::Unknown => g,
        _ => hinted_gender(&tags, partition.as_deref()),
    };

    let mut markers = tags;
    markers.extend(partition);
    markers.extend(gender_field);
    let age_groups = age_groups(&texts(fields, Field::AgeGroups), gender, &markers);

    let face_shapes = texts(fields, Field::FaceShapes)
        .iter()
        .map(|s| FaceShape::coerce(s))
        .filter(|s| *s != FaceShape::Unknown)
        .collect();
    let hair_types = texts(fields, Field::HairTypes)
        .iter()
        .map(|s| HairType::coerce(s))
        .filter(|t| *t != HairType::Unknown)
        .collect();

    let mut ethnicity: BTreeSet<String> = texts(fields, Field::Ethnicity)
        .iter()
        .map(|e| e.to_lowercase())
        .collect();
    if ethnicity.is_empty() {
        ethnicity.insert(WILDCARD.to_string());
    }

    Some(HairstyleRecord {
        name: text(fields, Field::Name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
        gender,
        age_groups,
        face_shapes,
        hair_types,
        ethnicity,
        hair_length: text(fields, Field::HairLength)
            .map(|l| l.to_lowercase())
            .unwrap_or_else(|| DEFAULT_HAIR_LENGTH.to_string()),
        description: text(fields, Field::Description).unwrap_or_default(),
        image,
    })
}

/// Reconcile every entry, dropping those without an image.
pub fn reconcile_all(entries: &[RawEntry]) -> Vec<HairstyleRecord> {
    let records: Vec<HairstyleRecord> = entries.iter().filter_map(reconcile).collect();
    tracing::info!(
        records = records.len(),
        dropped = entries.len() - records.len(),
        "catalog reconciled"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: Value, partition: Option<&str>) -> RawEntry {
        let Value::Object(fields) = value else {
            panic!("test entry must be an object");
        };
        RawEntry {
            fields,
            partition: partition.map(str::to_string),
        }
    }

    #[test]
    fn test_every_field_has_aliases() {
        for (field, aliases) in FIELD_ALIASES {
            assert!(!aliases.is_empty());
            assert_eq!(field.aliases(), aliases);
        }
    }

    #[test]
    fn test_alias_reconciliation() {
        let raw = entry(
            json!({
                "title": "Textured Crop",
                "gender": "male",
                "shape": "Oval",
                "hairType": "wavy",
                "length": "Short",
                "photo": "crop.jpg",
                "ethnicity": "East-Asian",
            }),
            None,
        );
        let record = reconcile(&raw).unwrap();
        assert_eq!(record.name, "Textured Crop");
        assert_eq!(record.gender, Gender::Male);
        assert_eq!(record.face_shapes, BTreeSet::from([FaceShape::Oval]));
        assert_eq!(record.hair_types, BTreeSet::from([HairType::Wavy]));
        assert_eq!(record.hair_length, "short");
        assert_eq!(record.image, "crop.jpg");
        assert_eq!(record.ethnicity, BTreeSet::from(["east-asian".to_string()]));
        assert_eq!(record.age_groups, BTreeSet::from([AgeGroup::AdultMale, AgeGroup::TeenBoy]));
    }

    #[test]
    fn test_first_non_blank_alias_wins() {
        let raw = entry(json!({"name": "", "title": "Bob", "image": null, "photo": "bob.jpg"}), None);
        let record = reconcile(&raw).unwrap();
        assert_eq!(record.name, "Bob");
        assert_eq!(record.image, "bob.jpg");
    }

    #[test]
    fn test_defaults() {
        let record = reconcile(&entry(json!({"image": "x.jpg"}), None)).unwrap();
        assert_eq!(record.name, DEFAULT_NAME);
        assert_eq!(record.gender, Gender::Unknown);
        assert_eq!(record.age_groups, BTreeSet::from([AgeGroup::AdultMale, AgeGroup::AdultFemale]));
        assert!(record.face_shapes.is_empty());
        assert!(record.hair_types.is_empty());
        assert!(record.is_universal());
        assert_eq!(record.hair_length, DEFAULT_HAIR_LENGTH);
        assert_eq!(record.description, "");
    }

    #[test]
    fn test_missing_image_is_dropped() {
        let entries = [
            entry(json!({"name": "No Photo", "gender": "female"}), None),
            entry(json!({"name": "Blank", "image": "   "}), None),
            entry(json!({"name": "Kept", "image": "kept.jpg"}), None),
        ];
        let records = reconcile_all(&entries);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Kept");
    }

    #[test]
    fn test_gender_from_partition_label() {
        let record = reconcile(&entry(json!({"image": "a.jpg"}), Some("adult_female"))).unwrap();
        assert_eq!(record.gender, Gender::Female);
        assert_eq!(record.age_groups, BTreeSet::from([AgeGroup::AdultFemale, AgeGroup::TeenGirl]));

        let record = reconcile(&entry(json!({"image": "b.jpg"}), Some("teen_male"))).unwrap();
        assert_eq!(record.gender, Gender::Male);
        assert_eq!(record.age_groups, BTreeSet::from([AgeGroup::TeenBoy]));

        let record = reconcile(&entry(json!({"image": "c.jpg"}), Some("child_girl"))).unwrap();
        assert_eq!(record.gender, Gender::Female);
        assert_eq!(record.age_groups, BTreeSet::from([AgeGroup::ChildGirl]));
    }

    #[test]
    fn test_stated_gender_beats_hints() {
        let raw = entry(json!({"image": "a.jpg", "gender": "Woman", "tags": ["men"]}), None);
        assert_eq!(reconcile(&raw).unwrap().gender, Gender::Female);

        let raw = entry(json!({"image": "a.jpg", "gender": "teen boy"}), None);
        let record = reconcile(&raw).unwrap();
        assert_eq!(record.gender, Gender::Male);
        assert_eq!(record.age_groups, BTreeSet::from([AgeGroup::TeenBoy]));
    }

    #[test]
    fn test_age_markers_without_gender_cover_both_groups() {
        let raw = entry(json!({"image": "a.jpg", "labels": ["Kids", "summer"]}), None);
        let record = reconcile(&raw).unwrap();
        assert_eq!(record.gender, Gender::Unknown);
        assert_eq!(record.age_groups, BTreeSet::from([AgeGroup::ChildBoy, AgeGroup::ChildGirl]));
    }

    #[test]
    fn test_age_markers_match_inside_words() {
        let raw = entry(json!({"image": "a.jpg", "gender": "teens boy"}), None);
        assert_eq!(reconcile(&raw).unwrap().age_groups, BTreeSet::from([AgeGroup::TeenBoy]));

        let raw = entry(json!({"image": "a.jpg", "gender": "children boy"}), None);
        assert_eq!(reconcile(&raw).unwrap().age_groups, BTreeSet::from([AgeGroup::ChildBoy]));

        let raw = entry(json!({"image": "a.jpg", "gender": "male", "tags": ["Teenager"]}), None);
        assert_eq!(reconcile(&raw).unwrap().age_groups, BTreeSet::from([AgeGroup::TeenBoy]));

        let raw = entry(json!({"image": "a.jpg", "gender": "female", "tags": ["children", "teen"]}), None);
        assert_eq!(reconcile(&raw).unwrap().age_groups, BTreeSet::from([AgeGroup::TeenGirl]));
    }

    #[test]
    fn test_gender_hints_match_whole_words() {
        let raw = entry(json!({"image": "a.jpg", "tags": ["romantic", "german"]}), None);
        assert_eq!(reconcile(&raw).unwrap().gender, Gender::Unknown);

        let raw = entry(json!({"image": "a.jpg", "tags": ["Women's cut"]}), None);
        assert_eq!(reconcile(&raw).unwrap().gender, Gender::Female);

        let raw = entry(json!({"image": "a.jpg", "tags": ["boys"]}), None);
        assert_eq!(reconcile(&raw).unwrap().gender, Gender::Male);

        let raw = entry(json!({"image": "a.jpg"}), Some("teenFemale"));
        assert_eq!(reconcile(&raw).unwrap().gender, Gender::Female);
    }

    #[test]
    fn test_explicit_age_groups_win() {
        let raw = entry(
            json!({"image": "a.jpg", "gender": "male", "tags": ["teen"], "ageGroups": ["adult-male", "senior"]}),
            None,
        );
        assert_eq!(reconcile(&raw).unwrap().age_groups, BTreeSet::from([AgeGroup::AdultMale]));

        let raw = entry(json!({"image": "a.jpg", "gender": "male", "ageGroups": ["elderly"]}), None);
        assert_eq!(
            reconcile(&raw).unwrap().age_groups,
            BTreeSet::from([AgeGroup::AdultMale, AgeGroup::TeenBoy])
        );
    }

    #[test]
    fn test_off_enum_set_values_are_dropped() {
        let raw = entry(
            json!({"image": "a.jpg", "faceShapes": ["oval", "oblong"], "hairTypes": ["all", "Curly"]}),
            None,
        );
        let record = reconcile(&raw).unwrap();
        assert_eq!(record.face_shapes, BTreeSet::from([FaceShape::Oval]));
        assert_eq!(record.hair_types, BTreeSet::from([HairType::Curly]));
    }
}
