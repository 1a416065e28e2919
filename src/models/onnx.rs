//! ONNX Runtime backed classifier

use crate::error::{Result, ScreeningError};
use crate::models::classifier::Classifier;
use crate::types::Label;
use ort::memory::Allocator;
use ort::session::Session;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Input name sklearn-onnx gives the feature tensor
const DEFAULT_INPUT: &str = "float_input";
const DEFAULT_OUTPUT: &str = "probabilities";

/// Classifier exported from the training pipeline as an ONNX graph.
///
/// The label is derived from the class-1 probability against `threshold`.
pub struct OnnxClassifier {
    name: String,
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    threshold: f64,
}

impl OnnxClassifier {
    pub fn new(
        name: impl Into<String>,
        session: Session,
        input_name: String,
        output_name: String,
        threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            session: Mutex::new(session),
            input_name,
            output_name,
            threshold,
        }
    }

    /// Wrap a loaded session, taking the first graph input as the feature
    /// tensor and preferring an output whose name mentions probabilities
    pub fn from_session(name: impl Into<String>, session: Session, threshold: f64) -> Self {
        let name = name.into();
        let input_name = pick_input_name(session.inputs.iter().map(|i| i.name.as_str()));
        let output_name = pick_output_name(session.outputs.iter().map(|o| o.name.as_str()));

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            threshold = threshold,
            "Model loaded successfully"
        );

        Self::new(name, session, input_name, output_name, threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Run the graph on one feature vector and return the fraud probability
    fn run(&self, features: &[f32]) -> Result<f64> {
        // Shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .map_err(|e| ScreeningError::prediction_failed(&self.name, e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ScreeningError::prediction_failed(&self.name, format!("lock error: {e}")))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| ScreeningError::prediction_failed(&self.name, e))?;

        self.extract_probability(&outputs)
    }

    /// Handles both plain tensor outputs and the seq(map) layout sklearn
    /// exports produce with zipmap enabled
    fn extract_probability(&self, outputs: &ort::session::SessionOutputs) -> Result<f64> {
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Some(prob) = self.probability_from_value(&output) {
                return Ok(prob);
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(prob) = self.probability_from_value(&output) {
                debug!(model = %self.name, output = %name, prob = prob, "Extracted from fallback output");
                return Ok(prob);
            }
        }

        Err(ScreeningError::prediction_failed(
            &self.name,
            "no probability output found",
        ))
    }

    fn probability_from_value(&self, output: &ort::value::DynValue) -> Option<f64> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return fraud_prob_from_tensor(&dims, data);
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            match self.probability_from_sequence_map(output) {
                Ok(prob) => return Some(prob),
                Err(e) => warn!(model = %self.name, error = %e, "Could not read seq(map) output"),
            }
        }

        None
    }

    fn probability_from_sequence_map(&self, output: &ort::value::DynValue) -> anyhow::Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        let map_value = maps
            .first()
            .ok_or_else(|| anyhow::anyhow!("Empty sequence"))?;

        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;
        fraud_prob_from_pairs(&kv_pairs).ok_or_else(|| anyhow::anyhow!("No probability found in map"))
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &[f32]) -> Result<Label> {
        let prob = self.run(features)?;
        Ok(Label::from_probability(prob, self.threshold))
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Option<f64>> {
        self.run(features).map(Some)
    }

    fn predict_scored(&self, features: &[f32]) -> Result<(Label, Option<f64>)> {
        let prob = self.run(features)?;
        Ok((Label::from_probability(prob, self.threshold), Some(prob)))
    }
}

fn pick_input_name<'a>(mut inputs: impl Iterator<Item = &'a str>) -> String {
    inputs.next().unwrap_or(DEFAULT_INPUT).to_string()
}

/// sklearn exports name the score output `probabilities` or
/// `output_probability`; otherwise the last output is the score
fn pick_output_name<'a>(outputs: impl Iterator<Item = &'a str>) -> String {
    let outputs: Vec<&str> = outputs.collect();
    outputs
        .iter()
        .find(|name| name.contains("prob"))
        .or_else(|| outputs.last())
        .copied()
        .unwrap_or(DEFAULT_OUTPUT)
        .to_string()
}

/// Class-1 probability from a `[batch, classes]`, `[classes]` or single-value tensor
fn fraud_prob_from_tensor(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [_, classes] | [classes] => *classes,
        _ => return data.last().map(|&v| v as f64),
    };

    match classes {
        c if c >= 2 => data.get(1).map(|&v| v as f64),
        1 => data.first().map(|&v| v as f64),
        _ => None,
    }
}

/// Class-1 probability from class-id/probability pairs
fn fraud_prob_from_pairs(pairs: &[(i64, f32)]) -> Option<f64> {
    if let Some((_, prob)) = pairs.iter().find(|(class_id, _)| *class_id == 1) {
        return Some(*prob as f64);
    }
    pairs
        .iter()
        .find(|(class_id, _)| *class_id == 0)
        .map(|(_, prob)| 1.0 - *prob as f64)
}
