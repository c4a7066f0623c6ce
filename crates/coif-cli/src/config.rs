use anyhow::{Context, Result};
use coif_catalog::CatalogSource;
use coif_core::recommend::{Bounds, ScoringWeights, DEFAULT_JITTER};
use coif_core::AnalysisConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Catalog file used when neither a path nor a partition directory is set.
pub const DEFAULT_CATALOG_PATH: &str = "hairstyles.json";

/// CLI configuration: defaults, then an optional TOML file, then `COIF_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Unified catalog document. Takes precedence over `catalog_dir`.
    pub catalog_path: Option<PathBuf>,
    /// Directory of legacy partition files.
    pub catalog_dir: Option<PathBuf>,
    pub min_results: usize,
    pub max_results: usize,
    /// Score jitter amplitude; 0 makes ranking deterministic.
    pub jitter: f64,
    pub min_face_size: f64,
    pub min_shape_confidence: f64,
    pub reject_multiple_faces: bool,
    pub weights: ScoringWeights,
}

impl Default for Config {
    fn default() -> Self {
        let bounds = Bounds::default();
        let analysis = AnalysisConfig::default();
        Self {
            catalog_path: None,
            catalog_dir: None,
            min_results: bounds.min,
            max_results: bounds.max,
            jitter: DEFAULT_JITTER,
            min_face_size: analysis.min_face_size,
            min_shape_confidence: analysis.min_shape_confidence,
            reject_multiple_faces: analysis.reject_multiple_faces,
            weights: ScoringWeights::default(),
        }
    }
}

impl Config {
    /// Load configuration. `file` (or `COIF_CONFIG` when `file` is `None`)
    /// names an optional TOML file; environment variables win over it.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("COIF_CONFIG").ok().map(PathBuf::from));

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Overlay `COIF_*` variables looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("COIF_CATALOG_PATH") {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = var("COIF_CATALOG_DIR") {
            self.catalog_dir = Some(PathBuf::from(dir));
        }
        override_parsed(&var, "COIF_MIN_RESULTS", &mut self.min_results);
        override_parsed(&var, "COIF_MAX_RESULTS", &mut self.max_results);
        override_parsed(&var, "COIF_JITTER", &mut self.jitter);
        override_parsed(&var, "COIF_MIN_FACE_SIZE", &mut self.min_face_size);
        override_parsed(&var, "COIF_MIN_SHAPE_CONFIDENCE", &mut self.min_shape_confidence);
        if let Some(flag) = var("COIF_REJECT_MULTIPLE_FACES") {
            self.reject_multiple_faces = parse_flag(&flag);
        }
    }

    pub fn catalog_source(&self) -> CatalogSource {
        match (&self.catalog_path, &self.catalog_dir) {
            (Some(path), _) => CatalogSource::File(path.clone()),
            (None, Some(dir)) => CatalogSource::Partitioned(dir.clone()),
            (None, None) => CatalogSource::File(PathBuf::from(DEFAULT_CATALOG_PATH)),
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min: self.min_results,
            max: self.max_results,
        }
    }

    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            min_face_size: self.min_face_size,
            min_shape_confidence: self.min_shape_confidence,
            reject_multiple_faces: self.reject_multiple_faces,
        }
    }
}

fn override_parsed<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    let Some(raw) = var(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparsable environment override"),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bounds(), Bounds { min: 6, max: 10 });
        assert_eq!(config.jitter, 0.3);
        assert_eq!(config.analysis(), AnalysisConfig::default());
        assert_eq!(
            config.catalog_source(),
            CatalogSource::File(PathBuf::from(DEFAULT_CATALOG_PATH))
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("COIF_CATALOG_DIR", "/srv/haircuts"),
            ("COIF_MAX_RESULTS", "3"),
            ("COIF_JITTER", "0"),
            ("COIF_MIN_FACE_SIZE", "48.5"),
            ("COIF_REJECT_MULTIPLE_FACES", "true"),
        ]));

        assert_eq!(config.catalog_source(), CatalogSource::Partitioned(PathBuf::from("/srv/haircuts")));
        assert_eq!(config.bounds(), Bounds { min: 6, max: 3 });
        assert_eq!(config.jitter, 0.0);
        assert_eq!(config.min_face_size, 48.5);
        assert!(config.reject_multiple_faces);
    }

    #[test]
    fn test_invalid_env_value_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("COIF_MIN_RESULTS", "many"), ("COIF_REJECT_MULTIPLE_FACES", "0")]));
        assert_eq!(config.min_results, 6);
        assert!(!config.reject_multiple_faces);
    }

    #[test]
    fn test_catalog_path_beats_dir() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("COIF_CATALOG_PATH", "db.json"),
            ("COIF_CATALOG_DIR", "/srv/haircuts"),
        ]));
        assert_eq!(config.catalog_source(), CatalogSource::File(PathBuf::from("db.json")));
    }

    #[test]
    fn test_toml_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coif.toml");
        std::fs::write(
            &path,
            r#"
catalog_path = "catalog/hairstyles.json"
min_results = 2
jitter = 0.1

[weights]
face_shape = 5.0
"#,
        )
        .unwrap();

        let mut config = Config::from_file(&path).unwrap();
        assert_eq!(config.min_results, 2);
        assert_eq!(config.max_results, 10);
        assert_eq!(config.weights.face_shape, 5.0);
        assert_eq!(config.weights.age_group, 3.0);

        config.apply_env(env(&[("COIF_JITTER", "0.5")]));
        assert_eq!(config.jitter, 0.5);
        assert_eq!(
            config.catalog_source(),
            CatalogSource::File(PathBuf::from("catalog/hairstyles.json"))
        );
    }

    #[test]
    fn test_unknown_toml_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coif.toml");
        std::fs::write(&path, "max_result = 4\n").unwrap();
        assert!(Config::from_file(&path).is_err());
    }
}
