//! Named collection of trained classifiers

use crate::error::{Result, ScreeningError};
use crate::models::classifier::Classifier;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Holds trained classifiers keyed by display name.
///
/// Populated once at startup; share it behind an `Arc` afterwards, which
/// freezes it for the rest of the session.
#[derive(Default, Clone)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn Classifier>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a classifier under `name`, replacing any previous entry
    pub fn register(&mut self, name: impl Into<String>, classifier: Arc<dyn Classifier>) {
        let name = name.into();
        if self.models.insert(name.clone(), classifier).is_some() {
            warn!(model = %name, "Replacing previously registered model");
        } else {
            debug!(model = %name, "Registered model");
        }
    }

    /// Look up a classifier by name
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Classifier>> {
        self.models
            .get(name)
            .ok_or_else(|| ScreeningError::unknown_model(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.names())
            .finish()
    }
}
