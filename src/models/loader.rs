//! ONNX model loader

use crate::config::ModelsConfig;
use crate::models::onnx::OnnxClassifier;
use crate::models::registry::ModelRegistry;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for the exported classifiers
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        threshold: f64,
    ) -> Result<OnnxClassifier> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        Ok(OnnxClassifier::from_session(name, session, threshold))
    }

    /// Load every configured model into a fresh registry.
    ///
    /// Missing or broken files are skipped with a warning; an empty result is
    /// an error.
    pub fn load_registry(&self, config: &ModelsConfig) -> Result<ModelRegistry> {
        let models_dir = Path::new(&config.models_dir);
        let mut registry = ModelRegistry::new();

        for entry in &config.entries {
            let path = models_dir.join(&entry.file);
            if !path.exists() {
                warn!(model = %entry.name, path = %path.display(), "Model file not found");
                continue;
            }

            match self.load_model(&path, &entry.name, entry.threshold) {
                Ok(model) => registry.register(entry.name.clone(), Arc::new(model)),
                Err(e) => {
                    warn!(model = %entry.name, error = %e, "Failed to load model, skipping");
                }
            }
        }

        if registry.is_empty() {
            anyhow::bail!("No models loaded from {}", models_dir.display());
        }

        info!(
            count = registry.len(),
            models = ?registry.names(),
            "Loaded {} models from {}",
            registry.len(),
            models_dir.display()
        );

        Ok(registry)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelEntry;

    #[test]
    fn test_load_registry_without_files_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelsConfig {
            models_dir: dir.path().display().to_string(),
            default_model: "Random Forest".to_string(),
            entries: vec![ModelEntry::new("Random Forest", "random_forest.onnx")],
            onnx_threads: 1,
        };

        let loader = ModelLoader::default();
        let err = loader.load_registry(&config).err().unwrap();
        assert!(err.to_string().contains("No models loaded"));
    }
}
