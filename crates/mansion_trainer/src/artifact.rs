//! Model artifact store
//!
//! An artifact bundles everything inference needs: the fitted model, the
//! fitted feature engineer, held-out metrics and importances. Each file is
//! one JSON envelope `{"artifact": <canonical json>, "hash": <blake3 hex>}`
//! written through a uniquely named temporary sibling and a single rename,
//! so readers never see a partial file or a digest from another save.

use mansion_core::canonical::{digest_hex, to_canonical_json};
use mansion_core::{FeatureEngineer, MansionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::metrics::RegressionMetrics;
use crate::models::{FittedModel, ModelParams, Regressor};

/// Bumped whenever the artifact layout changes incompatibly.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// File name of the alias that always holds the newest artifact.
pub const LATEST_FILE: &str = "latest.json";

/// One output column and its share of the total split gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// How the model was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub target_col: String,
    pub n_train: usize,
    pub n_test: usize,
    pub seed: u64,
    pub tuned: bool,
    pub params: ModelParams,
    /// Mean negative MSE of the chosen candidate, when tuned
    pub cv_score: Option<f64>,
    pub trained_at: String,
    pub reference_version: String,
}

/// Self-contained trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_name: String,
    pub version: String,
    pub model: FittedModel,
    pub feature_engineer: FeatureEngineer,
    pub metrics: RegressionMetrics,
    /// Sorted by importance, descending
    pub feature_importances: Vec<FeatureImportance>,
    pub training: TrainingSummary,
}

impl ModelArtifact {
    /// Structural checks run on every load.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(MansionError::Configuration(format!(
                "unsupported artifact format {}",
                self.format_version
            )));
        }
        self.model.validate()?;

        let width = self.feature_engineer.n_features()?;
        if width != self.model.n_features() {
            return Err(MansionError::ShapeMismatch {
                expected: width,
                actual: self.model.n_features(),
            });
        }
        Ok(())
    }

    pub fn to_canonical_json(&self) -> Result<String> {
        to_canonical_json(self)
    }

    /// Hex BLAKE3 digest of the canonical form.
    pub fn hash_hex(&self) -> Result<String> {
        Ok(digest_hex(self.to_canonical_json()?.as_bytes()))
    }

    /// Write to `dir/{model_name}_{version}.json`, then replace
    /// `dir/latest.json`. Returns the versioned path.
    ///
    /// Each file is a single envelope holding the canonical artifact and its
    /// digest, so replacing it is one rename and a failed save leaves the
    /// previous alias intact.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        check_version_label(&self.version)?;
        fs::create_dir_all(dir)?;

        let json = self.to_canonical_json()?;
        let digest = digest_hex(json.as_bytes());
        let envelope = seal(&json, &digest)?;

        let versioned = dir.join(format!("{}_{}.json", self.model_name, self.version));
        write_atomic(&versioned, envelope.as_bytes())?;
        write_atomic(&dir.join(LATEST_FILE), envelope.as_bytes())?;

        info!(path = %versioned.display(), hash = %digest, "Model saved");
        Ok(versioned)
    }

    /// Read, verify the embedded digest, and validate. A bare artifact
    /// without an envelope still loads with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            MansionError::Configuration(format!(
                "model artifact {} unavailable: {}",
                path.display(),
                e
            ))
        })?;

        let artifact: ModelArtifact = match serde_json::from_str::<Envelope<'_>>(&text) {
            Ok(envelope) => {
                let actual = digest_hex(envelope.artifact.get().as_bytes());
                if envelope.hash != actual {
                    return Err(MansionError::Configuration(format!(
                        "artifact {} does not match its digest",
                        path.display()
                    )));
                }
                serde_json::from_str(envelope.artifact.get())?
            }
            Err(_) => {
                warn!(path = %path.display(), "Artifact carries no digest");
                serde_json::from_str(&text)?
            }
        };

        artifact.validate()?;
        info!(
            path = %path.display(),
            model = %artifact.model_name,
            version = %artifact.version,
            "Model loaded"
        );
        Ok(artifact)
    }
}

/// On-disk form: the canonical artifact bytes kept verbatim next to their
/// BLAKE3 digest.
#[derive(Serialize, Deserialize)]
struct Envelope<'a> {
    #[serde(borrow)]
    artifact: &'a RawValue,
    hash: String,
}

fn seal(json: &str, digest: &str) -> Result<String> {
    let raw: Box<RawValue> = RawValue::from_string(json.to_string())?;
    Ok(serde_json::to_string(&Envelope {
        artifact: &*raw,
        hash: digest.to_string(),
    })?)
}

fn check_version_label(version: &str) -> Result<()> {
    let ok = !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && version != "."
        && version != "..";
    if ok {
        Ok(())
    } else {
        Err(MansionError::Configuration(format!(
            "invalid artifact version '{}'",
            version
        )))
    }
}

/// Write through a uniquely named sibling and rename it over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".artifact-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| MansionError::Io(e.error))?;
    Ok(())
}
