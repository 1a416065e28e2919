//! Single-instance prediction interface for trained models

use crate::error::Result;
use crate::types::Label;

/// A trained binary classifier.
///
/// Implementations are immutable once registered and must be safe to share
/// across threads; inference takes `&self`.
pub trait Classifier: Send + Sync {
    /// Display name, e.g. "Random Forest"
    fn name(&self) -> &str;

    /// Predict the label for one feature vector
    fn predict(&self, features: &[f32]) -> Result<Label>;

    /// Fraud probability for one feature vector, if the model exposes one
    fn predict_proba(&self, _features: &[f32]) -> Result<Option<f64>> {
        Ok(None)
    }

    /// Label and probability together. Models that derive both from one
    /// inference should override this so callers pay for a single run.
    fn predict_scored(&self, features: &[f32]) -> Result<(Label, Option<f64>)> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }
}
