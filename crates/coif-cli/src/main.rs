mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coif_catalog::CatalogRepository;
use coif_core::explain::reasons;
use coif_core::{
    classify, AgeGroup, Analyzer, DetectedFace, FaceAnalysis, FaceShape, Gender, GenderAgeVote, HairType, HairstyleRecord,
    Recommender, ScoredCandidate, UserProfile, VisionAttributes,
};
use config::Config;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "coif", about = "Face-shape analysis and hairstyle recommendation")]
struct Cli {
    /// TOML configuration file (overrides COIF_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the face shape of one detected face (JSON file, `-` for stdin)
    Classify { input: PathBuf },
    /// Recommend hairstyles for a profile
    Recommend {
        #[command(flatten)]
        profile: ProfileArgs,
        #[command(flatten)]
        ranking: RankingArgs,
    },
    /// Analyse a landmark detector response and optionally recommend
    Analyze {
        /// Detector response: `{"faces": [...]}` or a list of faces (`-` for stdin)
        input: PathBuf,
        /// Extra gender/age votes as a JSON list
        #[arg(long)]
        votes: Option<PathBuf>,
        /// Also recommend hairstyles for the resolved profile
        #[arg(long)]
        recommend: bool,
        #[command(flatten)]
        ranking: RankingArgs,
    },
    /// Summarize the hairstyle catalog
    Catalog {
        /// Print every record instead of counts
        #[arg(long)]
        list: bool,
    },
}

#[derive(clap::Args)]
struct ProfileArgs {
    /// Vision describer answer (JSON) to start the profile from
    #[arg(long)]
    profile: Option<PathBuf>,
    #[arg(long)]
    gender: Option<Gender>,
    #[arg(long)]
    age_group: Option<AgeGroup>,
    #[arg(long)]
    face_shape: Option<FaceShape>,
    #[arg(long)]
    hair_type: Option<HairType>,
    #[arg(long)]
    ethnicity: Option<String>,
}

#[derive(clap::Args)]
struct RankingArgs {
    /// Seed for score jitter (reproducible output)
    #[arg(long)]
    seed: Option<u64>,
    /// Disable score jitter
    #[arg(long)]
    no_jitter: bool,
    /// Maximum number of recommendations
    #[arg(long)]
    max: Option<usize>,
}

/// Detector response, either wrapped or a bare list of faces.
#[derive(Deserialize)]
#[serde(untagged)]
enum DetectorResponse {
    Envelope { faces: Vec<DetectedFace> },
    List(Vec<DetectedFace>),
}

impl DetectorResponse {
    fn into_faces(self) -> Vec<DetectedFace> {
        match self {
            DetectorResponse::Envelope { faces } | DetectorResponse::List(faces) => faces,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Recommendation {
    #[serde(flatten)]
    candidate: ScoredCandidate,
    why_it_matches: Vec<String>,
}

#[derive(Serialize)]
struct AnalysisReport {
    analysis: FaceAnalysis,
    recommendations: Vec<Recommendation>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogSummary {
    source: String,
    records: usize,
    by_gender: BTreeMap<String, usize>,
    by_age_group: BTreeMap<String, usize>,
    by_face_shape: BTreeMap<String, usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify { input } => {
            let face: DetectedFace = read_json(&input).await?;
            let result = classify(&face.landmarks, &face.rect);
            print_json(&result)?;
        }
        Commands::Recommend { profile, ranking } => {
            let profile = build_profile(&profile).await?;
            let repo = CatalogRepository::new(config.catalog_source());
            let output = recommend(&config, &ranking, repo.load().await, &profile);
            print_json(&output)?;
        }
        Commands::Analyze {
            input,
            votes,
            recommend: with_recommendations,
            ranking,
        } => {
            let faces = read_json::<DetectorResponse>(&input).await?.into_faces();
            let votes: Vec<GenderAgeVote> = match votes {
                Some(path) => read_json(&path).await?,
                None => Vec::new(),
            };

            let analysis = Analyzer::new(config.analysis()).analyze(&faces, &votes)?;

            if with_recommendations {
                let repo = CatalogRepository::new(config.catalog_source());
                let recommendations = recommend(&config, &ranking, repo.load().await, &analysis.profile);
                print_json(&AnalysisReport {
                    analysis,
                    recommendations,
                })?;
            } else {
                print_json(&analysis)?;
            }
        }
        Commands::Catalog { list } => {
            let source = config.catalog_source();
            let repo = CatalogRepository::new(source.clone());
            let records = repo.try_load().await?;
            if list {
                print_json(&records)?;
            } else {
                print_json(&summarize(&source.path().display().to_string(), records))?;
            }
        }
    }

    Ok(())
}

fn recommend(config: &Config, ranking: &RankingArgs, catalog: &[HairstyleRecord], profile: &UserProfile) -> Vec<Recommendation> {
    let jitter = if ranking.no_jitter { 0.0 } else { config.jitter };
    let recommender = Recommender::new().with_weights(config.weights).with_jitter(jitter);

    let mut bounds = config.bounds();
    if let Some(max) = ranking.max {
        bounds.max = max;
    }
    let mut rng = match ranking.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    recommender
        .recommend(catalog, profile, bounds, &mut rng)
        .into_iter()
        .map(|candidate| Recommendation {
            why_it_matches: reasons(&candidate.record, profile),
            candidate,
        })
        .collect()
}

/// Profile from an optional describer answer, with explicit flags on top.
async fn build_profile(args: &ProfileArgs) -> Result<UserProfile> {
    let mut profile = match &args.profile {
        Some(path) => UserProfile::from_vision(&read_json::<VisionAttributes>(path).await?),
        None => UserProfile::default(),
    };
    apply_profile_flags(&mut profile, args);
    Ok(profile)
}

fn apply_profile_flags(profile: &mut UserProfile, args: &ProfileArgs) {
    if let Some(gender) = args.gender {
        profile.gender = gender;
    }
    if let Some(age_group) = args.age_group {
        profile.age_group = age_group;
    }
    if let Some(face_shape) = args.face_shape {
        profile.face_shape = face_shape;
    }
    if let Some(hair_type) = args.hair_type {
        profile.hair_type = hair_type;
    }
    if let Some(ethnicity) = &args.ethnicity {
        profile.ethnicity = coif_core::profile::normalize_ethnicity(ethnicity);
    }
}

fn summarize(source: &str, records: &[HairstyleRecord]) -> CatalogSummary {
    let mut summary = CatalogSummary {
        source: source.to_string(),
        records: records.len(),
        by_gender: BTreeMap::new(),
        by_age_group: BTreeMap::new(),
        by_face_shape: BTreeMap::new(),
    };
    for record in records {
        *summary.by_gender.entry(record.gender.to_string()).or_default() += 1;
        for group in &record.age_groups {
            *summary.by_age_group.entry(group.to_string()).or_default() += 1;
        }
        for shape in &record.face_shapes {
            *summary.by_face_shape.entry(shape.to_string()).or_default() += 1;
        }
    }
    summary
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = if path == Path::new("-") {
        tokio::task::spawn_blocking(|| std::io::read_to_string(std::io::stdin()))
            .await?
            .context("reading stdin")?
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
