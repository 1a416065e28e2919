//! Configuration management for the screening pipeline

use crate::error::{Result as ScreeningResult, ScreeningError};
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Alert transport selection
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Render the email and SMS to stdout
    #[default]
    Console,
    /// Publish alerts as JSON on a NATS subject
    Nats,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub models: ModelsConfig,
    pub alerts: AlertsConfig,
    pub notify: NotifyConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

/// PIN verification settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Correct PIN
    pub pin: String,
    /// Incorrect attempts allowed before lockout
    pub max_attempts: u32,
}

/// Trained model settings
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing ONNX model files
    pub models_dir: String,
    /// Model used when none is named on the command line
    #[serde(default = "default_model")]
    pub default_model: String,
    /// One entry per model. An array of tables rather than a map, because
    /// the config loader lowercases map keys and names are case-sensitive.
    #[serde(default = "default_model_entries")]
    pub entries: Vec<ModelEntry>,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

/// A model's display name, ONNX file and decision threshold
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelEntry {
    pub name: String,
    pub file: String,
    /// Fraud probability threshold
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl ModelEntry {
    pub fn new(name: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ModelsConfig {
    pub fn entry(&self, name: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Decision threshold for a model, 0.5 unless configured
    pub fn threshold_for(&self, name: &str) -> f64 {
        self.entry(name)
            .map(|e| e.threshold)
            .unwrap_or(DEFAULT_THRESHOLD)
    }
}

const DEFAULT_THRESHOLD: f64 = 0.5;

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_model() -> String {
    "Random Forest".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

fn default_model_entries() -> Vec<ModelEntry> {
    vec![
        ModelEntry::new("Random Forest", "random_forest.onnx"),
        ModelEntry::new("Decision Tree", "decision_tree.onnx"),
        ModelEntry::new("SVM", "svm.onnx"),
    ]
}

/// Alert recipient and wording
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    pub email: String,
    pub phone: String,
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_subject() -> String {
    "Fraud Alert Notification".to_string()
}

/// Alert transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub transport: TransportKind,
    /// NATS server URL
    pub nats_url: String,
    /// Subject for outgoing alerts
    pub alert_subject: String,
}

/// Evaluation data location
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Held-out CSV with the credit-card schema
    pub evaluation_csv: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load and validate configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> ScreeningResult<()> {
        if self.auth.max_attempts == 0 {
            return Err(ScreeningError::Configuration(
                "auth.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.auth.pin.is_empty() {
            return Err(ScreeningError::Configuration(
                "auth.pin must not be empty".to_string(),
            ));
        }
        if let Some(entry) = self
            .models
            .entries
            .iter()
            .find(|e| !(0.0..=1.0).contains(&e.threshold))
        {
            return Err(ScreeningError::Configuration(format!(
                "threshold {} for model {} is outside [0, 1]",
                entry.threshold, entry.name
            )));
        }
        for (i, entry) in self.models.entries.iter().enumerate() {
            if self.models.entries[..i].iter().any(|e| e.name == entry.name) {
                return Err(ScreeningError::Configuration(format!(
                    "model {} is configured twice",
                    entry.name
                )));
            }
        }
        // Catch a typo here rather than after the PIN has been entered
        if self.models.entry(&self.models.default_model).is_none() {
            return Err(ScreeningError::Configuration(format!(
                "default model {} has no models.entries item",
                self.models.default_model
            )));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig {
                pin: "1234".to_string(),
                max_attempts: 2,
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                default_model: default_model(),
                entries: default_model_entries(),
                onnx_threads: 1,
            },
            alerts: AlertsConfig {
                email: "cardholder@example.com".to_string(),
                phone: "5550100".to_string(),
                subject: default_subject(),
            },
            notify: NotifyConfig {
                transport: TransportKind::Console,
                nats_url: "nats://localhost:4222".to_string(),
                alert_subject: "fraud.alerts".to_string(),
            },
            data: DataConfig {
                evaluation_csv: "data/evaluation.csv".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
