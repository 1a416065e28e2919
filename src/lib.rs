//! Fraud Screening Library
//!
//! Combines a registry of trained fraud classifiers with a bounded-attempt
//! PIN check and decides, per transaction, whether a fraud or lockout alert
//! should be sent.

pub mod auth;
pub mod config;
pub mod dataset;
pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod models;
pub mod notifier;
pub mod pipeline;
pub mod scorecard;
pub mod selector;
pub mod types;

pub use auth::{AuthOutcome, AuthSession, AuthState, PinPolicy, PinSource};
pub use config::AppConfig;
pub use dataset::EvaluationSet;
pub use decision::{Decision, DecisionEngine};
pub use dispatcher::AlertDispatcher;
pub use error::{Result, ScreeningError};
pub use models::{Classifier, ModelRegistry};
pub use notifier::{AlertTransport, Notifier};
pub use pipeline::{CheckReport, TransactionChecker};
pub use types::{AlertKind, AlertMessage, Label, Recipient, TransactionSample};
