//! Model-backed transaction classification

use crate::error::{Result, ScreeningError};
use crate::models::ModelRegistry;
use crate::types::{Label, TransactionSample};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of querying one model about one sample
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub model: String,
    pub label: Label,
    /// Fraud probability, informational only
    pub confidence: Option<f64>,
    pub sample_index: usize,
    /// Ground truth of the sample, for display
    pub true_label: Label,
    pub latency: Duration,
}

impl Decision {
    pub fn is_fraud(&self) -> bool {
        self.label.is_fraud()
    }
}

/// Queries registered classifiers. Holds the registry read-only.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    registry: Arc<ModelRegistry>,
}

impl DecisionEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Classify `sample` with the model registered as `model_name`.
    ///
    /// Inference errors are reported as `PredictionFailed` and never retried.
    pub fn evaluate(&self, model_name: &str, sample: &TransactionSample) -> Result<Decision> {
        let classifier = self.registry.get(model_name)?;
        let start = Instant::now();

        let (label, confidence) = classifier
            .predict_scored(&sample.features)
            .map_err(|e| as_prediction_failure(model_name, e))?;
        let confidence = checked_probability(model_name, confidence)?;

        let latency = start.elapsed();
        debug!(
            model = %model_name,
            sample_index = sample.index,
            prediction = %label,
            confidence = ?confidence,
            latency_us = latency.as_micros() as u64,
            "Model prediction"
        );

        Ok(Decision {
            model: model_name.to_string(),
            label,
            confidence,
            sample_index: sample.index,
            true_label: sample.true_label,
            latency,
        })
    }
}

/// A reported probability must be a finite value in [0, 1]
pub(crate) fn checked_probability(model: &str, probability: Option<f64>) -> Result<Option<f64>> {
    match probability {
        Some(p) if !(0.0..=1.0).contains(&p) => Err(ScreeningError::prediction_failed(
            model,
            format!("probability {p} is not in [0, 1]"),
        )),
        other => Ok(other),
    }
}

fn as_prediction_failure(model: &str, error: ScreeningError) -> ScreeningError {
    match error {
        e @ ScreeningError::PredictionFailed { .. } => e,
        other => ScreeningError::prediction_failed(model, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Flags fraud when the first feature is positive
    struct SignOfFirst;

    impl Classifier for SignOfFirst {
        fn name(&self) -> &str {
            "Sign"
        }

        fn predict(&self, features: &[f32]) -> Result<Label> {
            match features.first() {
                Some(&v) if v > 0.0 => Ok(Label::Fraud),
                Some(_) => Ok(Label::Legitimate),
                None => Err(ScreeningError::prediction_failed("Sign", "empty feature vector")),
            }
        }

        fn predict_proba(&self, features: &[f32]) -> Result<Option<f64>> {
            Ok(features.first().map(|&v| if v > 0.0 { 0.9 } else { 0.1 }))
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn predict(&self, _features: &[f32]) -> Result<Label> {
            Err(ScreeningError::Dataset("bad input".to_string()))
        }
    }

    /// Answers only through the combined call, counting inferences
    struct SingleRun {
        runs: AtomicUsize,
        probability: f64,
    }

    impl Classifier for SingleRun {
        fn name(&self) -> &str {
            "Single"
        }

        fn predict(&self, _features: &[f32]) -> Result<Label> {
            Err(ScreeningError::prediction_failed("Single", "separate predict"))
        }

        fn predict_proba(&self, _features: &[f32]) -> Result<Option<f64>> {
            Err(ScreeningError::prediction_failed("Single", "separate predict_proba"))
        }

        fn predict_scored(&self, _features: &[f32]) -> Result<(Label, Option<f64>)> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok((
                Label::from_probability(self.probability, 0.5),
                Some(self.probability),
            ))
        }
    }

    fn engine() -> DecisionEngine {
        let mut registry = ModelRegistry::new();
        registry.register("Sign", Arc::new(SignOfFirst));
        registry.register("Broken", Arc::new(Broken));
        DecisionEngine::new(Arc::new(registry))
    }

    fn single_run_engine(probability: f64) -> (DecisionEngine, Arc<SingleRun>) {
        let model = Arc::new(SingleRun {
            runs: AtomicUsize::new(0),
            probability,
        });
        let mut registry = ModelRegistry::new();
        registry.register("Single", model.clone());
        (DecisionEngine::new(Arc::new(registry)), model)
    }

    #[test]
    fn test_evaluate_runs_inference_once() {
        let (engine, model) = single_run_engine(0.8);
        let sample = TransactionSample::new(0, vec![0.0], Label::Legitimate);

        let decision = engine.evaluate("Single", &sample).unwrap();
        assert_eq!(decision.label, Label::Fraud);
        assert_eq!(decision.confidence, Some(0.8));
        assert_eq!(model.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_probability_is_a_prediction_failure() {
        let sample = TransactionSample::new(0, vec![0.0], Label::Legitimate);
        for probability in [f64::NAN, f64::INFINITY, 1.5, -0.1] {
            let (engine, _) = single_run_engine(probability);
            let err = engine.evaluate("Single", &sample).err().unwrap();
            assert!(
                matches!(err, ScreeningError::PredictionFailed { ref model, .. } if model == "Single")
            );
        }
    }

    #[test]
    fn test_evaluate_labels_and_confidence() {
        let engine = engine();

        let fraud = TransactionSample::new(4, vec![1.0], Label::Legitimate);
        let decision = engine.evaluate("Sign", &fraud).unwrap();
        assert!(decision.is_fraud());
        assert_eq!(decision.confidence, Some(0.9));
        assert_eq!(decision.sample_index, 4);
        assert_eq!(decision.true_label, Label::Legitimate);

        let legit = TransactionSample::new(5, vec![-1.0], Label::Legitimate);
        let decision = engine.evaluate("Sign", &legit).unwrap();
        assert_eq!(decision.label, Label::Legitimate);
        assert_eq!(decision.model, "Sign");
    }

    #[test]
    fn test_evaluate_unknown_model() {
        let sample = TransactionSample::new(0, vec![1.0], Label::Legitimate);
        let err = engine().evaluate("Unknown Model", &sample).err().unwrap();
        assert!(matches!(err, ScreeningError::UnknownModel { .. }));
    }

    #[test]
    fn test_prediction_errors_are_wrapped() {
        let engine = engine();
        let sample = TransactionSample::new(0, vec![], Label::Legitimate);

        let err = engine.evaluate("Sign", &sample).err().unwrap();
        assert!(err.to_string().contains("empty feature vector"));

        let err = engine.evaluate("Broken", &sample).err().unwrap();
        assert!(
            matches!(err, ScreeningError::PredictionFailed { ref model, .. } if model == "Broken")
        );
    }
}
