//! Alert delivery

use crate::config::{NotifyConfig, TransportKind};
use crate::types::AlertMessage;
use anyhow::{Context, Result};
use async_nats::Client;
use std::future::Future;
use tracing::{debug, info};

/// Delivers a constructed alert to the cardholder
pub trait Notifier {
    fn send(&self, alert: &AlertMessage) -> impl Future<Output = Result<()>> + Send;
}

/// Prints the email and SMS that would be sent
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }

    /// Email then SMS, as shown to the operator
    pub fn render(alert: &AlertMessage) -> String {
        format!(
            "\nSending Email to {email}\nSubject: {subject}\nBody: {body}\n\nSending SMS to {phone}\nMessage: {body}\n",
            email = alert.recipient.email,
            subject = alert.subject,
            body = alert.body,
            phone = alert.recipient.phone,
        )
    }
}

impl Notifier for ConsoleNotifier {
    async fn send(&self, alert: &AlertMessage) -> Result<()> {
        println!("{}", Self::render(alert));
        debug!(alert_id = %alert.alert_id, kind = ?alert.kind, "Alert printed");
        Ok(())
    }
}

/// Publishes alerts as JSON on a NATS subject
#[derive(Clone)]
pub struct NatsNotifier {
    client: Client,
    subject: String,
}

impl NatsNotifier {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    pub async fn connect(url: &str, subject: &str) -> Result<Self> {
        let client = async_nats::connect(url)
            .await
            .with_context(|| format!("Failed to connect to NATS at {url}"))?;
        info!(url = %url, subject = %subject, "Connected to NATS");
        Ok(Self::new(client, subject))
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl Notifier for NatsNotifier {
    async fn send(&self, alert: &AlertMessage) -> Result<()> {
        let payload = serde_json::to_vec(alert)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;
        // The process may exit right after a single check
        self.client.flush().await?;

        debug!(
            alert_id = %alert.alert_id,
            kind = ?alert.kind,
            subject = %self.subject,
            "Published alert"
        );

        Ok(())
    }
}

/// Transport chosen by configuration
pub enum AlertTransport {
    Console(ConsoleNotifier),
    Nats(NatsNotifier),
}

impl AlertTransport {
    pub async fn from_config(config: &NotifyConfig) -> Result<Self> {
        match config.transport {
            TransportKind::Console => Ok(Self::Console(ConsoleNotifier::new())),
            TransportKind::Nats => {
                let notifier = NatsNotifier::connect(&config.nats_url, &config.alert_subject).await?;
                Ok(Self::Nats(notifier))
            }
        }
    }
}

impl Notifier for AlertTransport {
    async fn send(&self, alert: &AlertMessage) -> Result<()> {
        match self {
            Self::Console(notifier) => notifier.send(alert).await,
            Self::Nats(notifier) => notifier.send(alert).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::alert::LOCKOUT_ALERT_BODY;
    use crate::types::{AlertKind, Recipient};

    fn lockout() -> AlertMessage {
        AlertMessage::new(
            AlertKind::Lockout,
            Recipient::new("owner@example.com", "5550100"),
            "Fraud Alert Notification",
            LOCKOUT_ALERT_BODY,
        )
    }

    #[test]
    fn test_render_email_and_sms() {
        let rendered = ConsoleNotifier::render(&lockout());

        assert!(rendered.contains("Sending Email to owner@example.com"));
        assert!(rendered.contains("Subject: Fraud Alert Notification"));
        assert!(rendered.contains("Sending SMS to 5550100"));
        assert_eq!(rendered.matches(LOCKOUT_ALERT_BODY).count(), 2);
    }

    #[tokio::test]
    async fn test_console_transport_sends() {
        let transport = AlertTransport::from_config(&NotifyConfig {
            transport: TransportKind::Console,
            nats_url: "nats://localhost:4222".to_string(),
            alert_subject: "fraud.alerts".to_string(),
        })
        .await
        .unwrap();

        assert!(matches!(transport, AlertTransport::Console(_)));
        transport.send(&lockout()).await.unwrap();
    }

    // Publishing through NATS needs a running server
}
