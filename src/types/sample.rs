//! Transaction samples drawn from the held-out evaluation set

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary classification label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Legitimate,
    Fraud,
}

impl Label {
    /// Map a `Class` column value (1 = fraud, 0 = legitimate) to a label
    pub fn from_class(class: f64) -> Option<Self> {
        if class == 1.0 {
            Some(Label::Fraud)
        } else if class == 0.0 {
            Some(Label::Legitimate)
        } else {
            None
        }
    }

    /// Label for a fraud probability under a decision threshold
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Label::Fraud
        } else {
            Label::Legitimate
        }
    }

    pub fn is_fraud(self) -> bool {
        self == Label::Fraud
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Legitimate => f.write_str("Legitimate"),
            Label::Fraud => f.write_str("Fraud"),
        }
    }
}

/// A feature vector plus its ground-truth label
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSample {
    /// Row index in the evaluation set
    pub index: usize,
    /// Model input features, in training order
    pub features: Vec<f32>,
    /// Ground-truth label (simulation only)
    pub true_label: Label,
}

impl TransactionSample {
    pub fn new(index: usize, features: Vec<f32>, true_label: Label) -> Self {
        Self {
            index,
            features,
            true_label,
        }
    }
}
