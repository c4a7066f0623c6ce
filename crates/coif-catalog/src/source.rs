//! Catalog sources on disk and the raw documents they contain.
//!
//! A catalog is either one unified JSON document or the legacy layout of
//! six per-gender/age files. Documents may carry `//` and `/* */` comments.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Legacy partition files, each named after its partition label.
pub const PARTITION_FILES: [&str; 6] = [
    "adult_male",
    "adult_female",
    "teen_male",
    "teen_female",
    "child_boy",
    "child_girl",
];

/// Where a catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// One document: an array of records, or an object of partition arrays.
    File(PathBuf),
    /// Directory holding some of the [`PARTITION_FILES`] as `<label>.json`.
    Partitioned(PathBuf),
}

impl CatalogSource {
    pub fn path(&self) -> &Path {
        match self {
            CatalogSource::File(p) | CatalogSource::Partitioned(p) => p,
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{}: expected an array of records or an object of partitions, found {found}", path.display())]
    UnexpectedDocument { path: PathBuf, found: &'static str },
    #[error("no partition files found in {}", .0.display())]
    NoPartitions(PathBuf),
}

/// A record as found on disk, before schema reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub fields: Map<String, Value>,
    /// Label of the partition the record came from, if any.
    pub partition: Option<String>,
}

/// Remove `//` line comments and `/* */` block comments that sit outside
/// JSON string literals. Newlines are kept so parse errors report their
/// source line numbers.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn collect_entries(items: Vec<Value>, partition: Option<&str>, out: &mut Vec<RawEntry>) {
    for item in items {
        match item {
            Value::Object(fields) => out.push(RawEntry {
                fields,
                partition: partition.map(str::to_string),
            }),
            other => tracing::debug!(
                partition = partition.unwrap_or("-"),
                found = json_kind(&other),
                "skipping non-object catalog entry"
            ),
        }
    }
}

/// Parse one catalog document. `partition` labels every record of a
/// top-level array; object documents label records by their key.
pub fn parse_document(text: &str, path: &Path, partition: Option<&str>) -> Result<Vec<RawEntry>, CatalogError> {
    let cleaned = strip_comments(text);
    let document: Value = serde_json::from_str(&cleaned).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    match document {
        Value::Array(items) => collect_entries(items, partition, &mut entries),
        Value::Object(partitions) => {
            for (label, value) in partitions {
                match value {
                    Value::Array(items) => collect_entries(items, Some(label.as_str()), &mut entries),
                    other => tracing::debug!(
                        partition = %label,
                        found = json_kind(&other),
                        "skipping non-array partition"
                    ),
                }
            }
        }
        other => {
            return Err(CatalogError::UnexpectedDocument {
                path: path.to_path_buf(),
                found: json_kind(&other),
            })
        }
    }
    Ok(entries)
}

async fn read_text(path: &Path) -> Result<String, CatalogError> {
    tokio::fs::read_to_string(path).await.map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read every raw entry of a source.
///
/// Missing partition files are skipped; a partition directory with none of
/// them is an error.
pub async fn read_source(source: &CatalogSource) -> Result<Vec<RawEntry>, CatalogError> {
    match source {
        CatalogSource::File(path) => {
            let text = read_text(path).await?;
            parse_document(&text, path, None)
        }
        CatalogSource::Partitioned(dir) => {
            let mut entries = Vec::new();
            let mut found = 0usize;
            for label in PARTITION_FILES {
                let path = dir.join(format!("{label}.json"));
                let text = match tokio::fs::read_to_string(&path).await {
                    Ok(text) => text,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        tracing::debug!(path = %path.display(), "partition file missing, skipping");
                        continue;
                    }
                    Err(source) => return Err(CatalogError::Io { path, source }),
                };
                found += 1;
                entries.extend(parse_document(&text, &path, Some(label))?);
            }
            if found == 0 {
                return Err(CatalogError::NoPartitions(dir.clone()));
            }
            Ok(entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments_keeps_strings() {
        let text = r#"[
            // a line comment
            {"image": "https://cdn.example.com/a.jpg", /* inline */ "name": "A \"quoted\" // not a comment"}
            /* block
               comment */
        ]"#;
        let cleaned = strip_comments(text);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value[0]["image"], "https://cdn.example.com/a.jpg");
        assert_eq!(value[0]["name"], "A \"quoted\" // not a comment");
        assert_eq!(cleaned.lines().count(), text.lines().count());
    }

    #[test]
    fn test_parse_array_document() {
        let entries = parse_document(r#"[{"name": "A"}, 3, {"name": "B"}]"#, Path::new("db.json"), Some("teen_male")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].fields["name"], "B");
        assert_eq!(entries[0].partition.as_deref(), Some("teen_male"));
    }

    #[test]
    fn test_parse_partitioned_object_document() {
        let text = r#"{"adult_female": [{"name": "Bob"}], "child_boy": [{"name": "Buzz"}], "version": 2}"#;
        let entries = parse_document(text, Path::new("db.json"), None).unwrap();
        assert_eq!(entries.len(), 2);
        let labels: Vec<_> = entries.iter().map(|e| e.partition.as_deref().unwrap()).collect();
        assert!(labels.contains(&"adult_female"));
        assert!(labels.contains(&"child_boy"));
    }

    #[test]
    fn test_parse_rejects_scalar_document() {
        let err = parse_document("42", Path::new("db.json"), None).unwrap_err();
        assert!(matches!(err, CatalogError::UnexpectedDocument { found: "a number", .. }));
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = parse_document("[{", Path::new("broken.json"), None).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[tokio::test]
    async fn test_read_partitioned_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("teen_female.json"), r#"[{"name": "Pixie", "image": "p.jpg"}]"#).unwrap();

        let entries = read_source(&CatalogSource::Partitioned(dir.path().to_path_buf())).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].partition.as_deref(), Some("teen_female"));
    }

    #[tokio::test]
    async fn test_read_empty_partition_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(&CatalogSource::Partitioned(dir.path().to_path_buf())).await.unwrap_err();
        assert!(matches!(err, CatalogError::NoPartitions(_)));
    }
}
