//! Offline accuracy summary for registered models

use crate::dataset::EvaluationSet;
use crate::decision::checked_probability;
use crate::error::Result;
use crate::models::ModelRegistry;
use crate::types::Label;
use std::cmp::Ordering;
use tracing::info;

/// Binary confusion matrix, fraud as the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positive: u64,
    pub false_positive: u64,
    pub true_negative: u64,
    pub false_negative: u64,
}

impl ConfusionMatrix {
    pub fn record(&mut self, predicted: Label, actual: Label) {
        match (predicted, actual) {
            (Label::Fraud, Label::Fraud) => self.true_positive += 1,
            (Label::Fraud, Label::Legitimate) => self.false_positive += 1,
            (Label::Legitimate, Label::Legitimate) => self.true_negative += 1,
            (Label::Legitimate, Label::Fraud) => self.false_negative += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => (self.true_positive + self.true_negative) as f64 / n as f64,
        }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Evaluation of one model over the whole set
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub model: String,
    pub confusion: ConfusionMatrix,
    /// Present when the model reports probabilities and both classes occur
    pub roc_auc: Option<f64>,
}

/// Score every registered model, in name order
pub fn score_all(registry: &ModelRegistry, set: &EvaluationSet) -> Result<Vec<Scorecard>> {
    registry
        .names()
        .into_iter()
        .map(|name| score_model(registry, &name, set))
        .collect()
}

pub fn score_model(registry: &ModelRegistry, name: &str, set: &EvaluationSet) -> Result<Scorecard> {
    let classifier = registry.get(name)?;
    let mut confusion = ConfusionMatrix::default();
    let mut scored: Vec<(f64, Label)> = Vec::with_capacity(set.len());
    let mut has_proba = true;

    for sample in set.samples() {
        let (predicted, probability) = classifier.predict_scored(&sample.features)?;
        confusion.record(predicted, sample.true_label);

        if has_proba {
            match checked_probability(name, probability)? {
                Some(p) => scored.push((p, sample.true_label)),
                None => has_proba = false,
            }
        }
    }

    let roc_auc = if has_proba { roc_auc(&scored) } else { None };

    info!(
        model = %name,
        accuracy = format!("{:.4}", confusion.accuracy()),
        precision = format!("{:.4}", confusion.precision()),
        recall = format!("{:.4}", confusion.recall()),
        roc_auc = ?roc_auc,
        tp = confusion.true_positive,
        fp = confusion.false_positive,
        tn = confusion.true_negative,
        fn_ = confusion.false_negative,
        "Model scorecard"
    );

    Ok(Scorecard {
        model: name.to_string(),
        confusion,
        roc_auc,
    })
}

/// Area under the ROC curve by the trapezoidal rule.
///
/// Tied scores form a single point on the curve. `None` unless both classes
/// are present.
pub fn roc_auc(scored: &[(f64, Label)]) -> Option<f64> {
    let positives = scored.iter().filter(|(_, l)| l.is_fraud()).count() as f64;
    let negatives = scored.len() as f64 - positives;
    if positives == 0.0 || negatives == 0.0 {
        return None;
    }

    let mut sorted = scored.to_vec();
    sorted.sort_by(|a, b| b.0.total_cmp(&a.0));

    let (mut tp, mut fp) = (0.0, 0.0);
    let (mut prev_tpr, mut prev_fpr) = (0.0, 0.0);
    let mut area = 0.0;

    let mut i = 0;
    while i < sorted.len() {
        let score = sorted[i].0;
        // total_cmp so that NaN scores still group with themselves
        while i < sorted.len() && sorted[i].0.total_cmp(&score) == Ordering::Equal {
            if sorted[i].1.is_fraud() {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        let (tpr, fpr) = (tp / positives, fp / negatives);
        area += (fpr - prev_fpr) * (tpr + prev_tpr) / 2.0;
        prev_tpr = tpr;
        prev_fpr = fpr;
    }

    Some(area)
}
