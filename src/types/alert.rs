//! Alert data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body sent when a model flags the transaction.
pub const FRAUD_ALERT_BODY: &str = "Fraudulent transaction detected on your account.";

/// Body sent when the PIN attempt bound is exhausted.
pub const LOCKOUT_ALERT_BODY: &str = "Multiple incorrect PIN attempts detected on your account!";

/// Why an alert was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// The selected model predicted fraud
    Fraud,
    /// Authentication was exhausted
    Lockout,
}

/// Alert destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub phone: String,
}

impl Recipient {
    pub fn new(email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            phone: phone.into(),
        }
    }
}

/// Outbound notification built by the dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Unique alert identifier
    pub alert_id: String,

    pub kind: AlertKind,

    pub recipient: Recipient,

    /// Email subject line
    pub subject: String,

    /// Human-readable message, shared by email and SMS
    pub body: String,

    /// Model that flagged the transaction (fraud alerts only)
    pub model: Option<String>,

    /// Evaluation-set row that was checked (fraud alerts only)
    pub sample_index: Option<usize>,

    /// Fraud probability, when the model reports one
    pub confidence: Option<f64>,

    /// Alert generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl AlertMessage {
    /// Create a new alert
    pub fn new(
        kind: AlertKind,
        recipient: Recipient,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            kind,
            recipient,
            subject: subject.into(),
            body: body.into(),
            model: None,
            sample_index: None,
            confidence: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the flagged transaction's details
    pub fn with_transaction_details(
        mut self,
        model: String,
        sample_index: usize,
        confidence: Option<f64>,
    ) -> Self {
        self.model = Some(model);
        self.sample_index = Some(sample_index);
        self.confidence = confidence;
        self
    }
}
