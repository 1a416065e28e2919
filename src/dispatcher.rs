//! Alert decision: lockout, fraud, or nothing

use crate::auth::AuthOutcome;
use crate::config::AlertsConfig;
use crate::decision::Decision;
use crate::types::alert::{FRAUD_ALERT_BODY, LOCKOUT_ALERT_BODY};
use crate::types::{AlertKind, AlertMessage, Recipient};
use tracing::info;

/// Builds alert payloads. Delivery belongs to a [`crate::notifier::Notifier`].
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    recipient: Recipient,
    subject: String,
}

impl AlertDispatcher {
    pub fn new(recipient: Recipient, subject: impl Into<String>) -> Self {
        Self {
            recipient,
            subject: subject.into(),
        }
    }

    pub fn from_config(config: &AlertsConfig) -> Self {
        Self::new(
            Recipient::new(config.email.clone(), config.phone.clone()),
            config.subject.clone(),
        )
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    /// Decide whether an alert is due.
    ///
    /// A lockout always alerts and ignores `decision`. A verified session
    /// alerts only when the decision is `Fraud`.
    pub fn decide(&self, auth: AuthOutcome, decision: Option<&Decision>) -> Option<AlertMessage> {
        match (auth, decision) {
            (AuthOutcome::LockedOut, _) => {
                info!(kind = "lockout", "Alert due");
                Some(self.alert(AlertKind::Lockout, LOCKOUT_ALERT_BODY))
            }
            (AuthOutcome::Verified, Some(decision)) if decision.is_fraud() => {
                info!(
                    kind = "fraud",
                    model = %decision.model,
                    sample_index = decision.sample_index,
                    "Alert due"
                );
                Some(
                    self.alert(AlertKind::Fraud, FRAUD_ALERT_BODY)
                        .with_transaction_details(
                            decision.model.clone(),
                            decision.sample_index,
                            decision.confidence,
                        ),
                )
            }
            (AuthOutcome::Verified, _) => None,
        }
    }

    fn alert(&self, kind: AlertKind, body: &str) -> AlertMessage {
        AlertMessage::new(kind, self.recipient.clone(), self.subject.clone(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;
    use std::time::Duration;

    fn dispatcher() -> AlertDispatcher {
        AlertDispatcher::new(
            Recipient::new("owner@example.com", "5550100"),
            "Fraud Alert Notification",
        )
    }

    fn decision(label: Label) -> Decision {
        Decision {
            model: "Random Forest".to_string(),
            label,
            confidence: Some(0.8),
            sample_index: 12,
            true_label: Label::Legitimate,
            latency: Duration::from_micros(40),
        }
    }

    #[test]
    fn test_lockout_always_alerts() {
        let dispatcher = dispatcher();
        for decision in [None, Some(decision(Label::Fraud)), Some(decision(Label::Legitimate))] {
            let alert = dispatcher
                .decide(AuthOutcome::LockedOut, decision.as_ref())
                .unwrap();
            assert_eq!(alert.kind, AlertKind::Lockout);
            assert!(alert.body.contains("Multiple incorrect PIN attempts"));
            assert_eq!(alert.model, None);
        }
    }

    #[test]
    fn test_fraud_alert() {
        let fraud = decision(Label::Fraud);
        let alert = dispatcher()
            .decide(AuthOutcome::Verified, Some(&fraud))
            .unwrap();

        assert_eq!(alert.kind, AlertKind::Fraud);
        assert!(alert.body.contains("Fraudulent transaction"));
        assert_eq!(alert.model.as_deref(), Some("Random Forest"));
        assert_eq!(alert.sample_index, Some(12));
        assert_eq!(alert.confidence, Some(0.8));
        assert_eq!(alert.recipient.email, "owner@example.com");
    }

    #[test]
    fn test_legitimate_is_silent() {
        let legit = decision(Label::Legitimate);
        assert!(dispatcher()
            .decide(AuthOutcome::Verified, Some(&legit))
            .is_none());
        assert!(dispatcher().decide(AuthOutcome::Verified, None).is_none());
    }
}
