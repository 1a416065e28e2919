//! One transaction check: PIN gate, model decision, alert decision

use crate::auth::{AuthOutcome, PinPolicy, PinSource};
use crate::dataset::EvaluationSet;
use crate::decision::{Decision, DecisionEngine};
use crate::dispatcher::AlertDispatcher;
use crate::error::Result;
use crate::metrics::CheckMetrics;
use crate::selector::SampleSelector;
use crate::types::{AlertKind, AlertMessage};
use std::sync::Arc;
use tracing::{error, info};

/// Everything a caller needs to report on one request
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub auth: AuthOutcome,
    /// Incorrect PINs submitted
    pub attempts: u32,
    /// Absent when the session locked out
    pub decision: Option<Decision>,
    pub alert: Option<AlertMessage>,
}

impl CheckReport {
    pub fn alert_kind(&self) -> Option<AlertKind> {
        self.alert.as_ref().map(|a| a.kind)
    }
}

/// Runs transaction checks against a shared, read-only model registry
pub struct TransactionChecker {
    policy: PinPolicy,
    engine: DecisionEngine,
    dispatcher: AlertDispatcher,
    evaluation: Arc<EvaluationSet>,
    metrics: Arc<CheckMetrics>,
}

impl TransactionChecker {
    pub fn new(
        policy: PinPolicy,
        engine: DecisionEngine,
        dispatcher: AlertDispatcher,
        evaluation: Arc<EvaluationSet>,
    ) -> Self {
        Self {
            policy,
            engine,
            dispatcher,
            evaluation,
            metrics: Arc::new(CheckMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<CheckMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<CheckMetrics> {
        &self.metrics
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Run one check with `model_name`.
    ///
    /// The selector and the model are consulted only after the PIN is
    /// verified. Exactly one of lockout alert, fraud alert, or no alert
    /// comes back in the report.
    pub fn check<P, S>(&self, model_name: &str, pins: &mut P, selector: &mut S) -> Result<CheckReport>
    where
        P: PinSource + ?Sized,
        S: SampleSelector + ?Sized,
    {
        self.metrics.record_check();
        info!(model = %model_name, "Transaction initiated");

        let result = self.run(model_name, pins, selector);
        if let Err(e) = &result {
            self.metrics.record_failure();
            error!(model = %model_name, error = %e, "Transaction check failed");
        }
        result
    }

    fn run<P, S>(&self, model_name: &str, pins: &mut P, selector: &mut S) -> Result<CheckReport>
    where
        P: PinSource + ?Sized,
        S: SampleSelector + ?Sized,
    {
        let mut session = self.policy.open_session();
        let auth = session.run(pins)?;
        let attempts = session.attempts();

        let decision = match auth {
            AuthOutcome::LockedOut => {
                self.metrics.record_lockout();
                None
            }
            AuthOutcome::Verified => {
                self.metrics.record_verified();
                let sample = selector.select(&self.evaluation)?;
                let decision = self.engine.evaluate(model_name, sample)?;
                self.metrics.record_prediction(model_name, decision.latency);
                Some(decision)
            }
        };

        let alert = self.dispatcher.decide(auth, decision.as_ref());
        match (&alert, &decision) {
            (Some(a), _) if a.kind == AlertKind::Fraud => self.metrics.record_fraud_alert(),
            (None, Some(_)) => self.metrics.record_legitimate(),
            _ => {}
        }

        Ok(CheckReport {
            auth,
            attempts,
            decision,
            alert,
        })
    }
}
