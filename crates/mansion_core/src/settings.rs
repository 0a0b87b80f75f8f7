//! Process settings
//!
//! Built once at start-up from defaults, an optional TOML file and
//! `MANSION_*` environment variables (later sources win), then passed
//! explicitly to whoever needs them.

use crate::errors::{MansionError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Deployment environment name
    pub environment: String,
    /// Default tracing level when `RUST_LOG` is unset
    pub log_level: String,
    /// Directory receiving versioned artifacts
    pub model_dir: PathBuf,
    /// Artifact loaded by the predictor
    pub model_path: PathBuf,
    /// Mart export used for training
    pub training_data: PathBuf,
    /// JSON document replacing the built-in reference tables
    pub reference_tables: Option<PathBuf>,
    /// Transactions API endpoint (consumed by the acquisition collaborator)
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub training: TrainingSettings,
}

/// Trainer defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingSettings {
    pub model_name: String,
    pub test_size: f64,
    pub cv_folds: usize,
    pub tune_hyperparameters: bool,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            model_dir: PathBuf::from("models"),
            model_path: PathBuf::from("models/latest.json"),
            training_data: PathBuf::from("data/mart_training_dataset.csv"),
            reference_tables: None,
            api_base_url: "https://www.reinfolib.mlit.go.jp/ex-api/external".to_string(),
            api_key: None,
            training: TrainingSettings::default(),
        }
    }
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            model_name: "gradient_boosting".to_string(),
            test_size: 0.2,
            cv_folds: 5,
            tune_hyperparameters: true,
            seed: 42,
        }
    }
}

impl Settings {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MansionError::Configuration(format!(
                "failed to read settings {}: {}",
                path.display(),
                e
            ))
        })?;
        let settings = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    /// Full load: defaults, optional file, process environment, validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `MANSION_*` overrides from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MANSION_ENVIRONMENT") {
            self.environment = v;
        }
        if let Some(v) = lookup("MANSION_LOG_LEVEL") {
            self.log_level = v.to_lowercase();
        }
        if let Some(v) = lookup("MANSION_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MANSION_MODEL_PATH") {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("MANSION_TRAINING_DATA") {
            self.training_data = PathBuf::from(v);
        }
        if let Some(v) = lookup("MANSION_REFERENCE_TABLES") {
            self.reference_tables = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("MANSION_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("MANSION_API_KEY") {
            self.api_key = Some(v).filter(|k| !k.is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(MansionError::Configuration(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }
        let t = &self.training;
        if !(t.test_size > 0.0 && t.test_size < 1.0) {
            return Err(MansionError::Configuration(format!(
                "test_size must be in (0, 1), got {}",
                t.test_size
            )));
        }
        if t.cv_folds < 2 {
            return Err(MansionError::Configuration(format!(
                "cv_folds must be at least 2, got {}",
                t.cv_folds
            )));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.training.seed, 42);
        assert_eq!(s.model_path, PathBuf::from("models/latest.json"));
        assert!(!s.is_production());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let s = Settings::from_toml_str(
            r#"
            environment = "production"

            [training]
            cv_folds = 3
            "#,
        )
        .unwrap();
        assert!(s.is_production());
        assert_eq!(s.training.cv_folds, 3);
        assert_eq!(s.training.test_size, 0.2);
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("MANSION_LOG_LEVEL", "DEBUG"),
            ("MANSION_MODEL_PATH", "/srv/models/latest.json"),
            ("MANSION_API_KEY", ""),
        ]
        .into_iter()
        .collect();

        let mut s = Settings::default();
        s.api_key = Some("file-key".into());
        s.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(s.log_level, "debug");
        assert_eq!(s.model_path, PathBuf::from("/srv/models/latest.json"));
        assert_eq!(s.api_key, None);
        assert_eq!(s.environment, "development");
    }

    #[test]
    fn validation_failures() {
        let mut s = Settings::default();
        s.log_level = "loud".into();
        assert!(matches!(s.validate(), Err(MansionError::Configuration(_))));

        let mut s = Settings::default();
        s.training.test_size = 1.0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.training.cv_folds = 1;
        assert!(s.validate().is_err());
    }

    #[test]
    fn bad_toml_is_reported() {
        assert!(matches!(
            Settings::from_toml_str("training = 3"),
            Err(MansionError::Toml(_))
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mansion.toml");
        std::fs::write(&path, "log_level = \"warn\"\n").unwrap();
        let s = Settings::from_file(&path).unwrap();
        assert_eq!(s.log_level, "warn");

        assert!(matches!(
            Settings::from_file(dir.path().join("missing.toml")),
            Err(MansionError::Configuration(_))
        ));
    }
}
