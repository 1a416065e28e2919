//! Fraud Screening - Main Entry Point
//!
//! Loads the trained models and the held-out evaluation set, then runs one
//! interactive PIN-gated transaction check and delivers any resulting alert.
//!
//! Usage: `fraud-screening [config-path] [model-name]`

use anyhow::Result;
use fraud_screening::{
    auth::{ConsolePinSource, PinPolicy},
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    dataset::EvaluationSet,
    decision::DecisionEngine,
    dispatcher::AlertDispatcher,
    models::ModelLoader,
    notifier::{AlertTransport, Notifier},
    pipeline::{CheckReport, TransactionChecker},
    scorecard,
    selector::RandomLegitimateSelector,
    AuthOutcome, Label,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(|s| s.as_str()).unwrap_or(DEFAULT_CONFIG_PATH);

    let config = AppConfig::load_from_path(config_path)?;
    init_logging(&config.logging)?;
    info!(path = %config_path, "Configuration loaded successfully");

    let model_name = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| config.models.default_model.clone());

    // Fails before any PIN is requested
    let policy = PinPolicy::from_config(&config.auth)?;
    info!(max_attempts = policy.max_attempts(), "PIN policy configured");

    let evaluation = Arc::new(EvaluationSet::from_csv(&config.data.evaluation_csv)?);

    let loader = ModelLoader::with_threads(config.models.onnx_threads)?;
    let registry = Arc::new(loader.load_registry(&config.models)?);

    for card in scorecard::score_all(&registry, &evaluation)? {
        info!(
            model = %card.model,
            accuracy = format!("{:.4}", card.confusion.accuracy()),
            roc_auc = card.roc_auc.map(|auc| format!("{auc:.2}")).unwrap_or_else(|| "n/a".to_string()),
            "Offline evaluation"
        );
    }

    let transport = AlertTransport::from_config(&config.notify).await?;

    let checker = TransactionChecker::new(
        policy,
        DecisionEngine::new(registry),
        AlertDispatcher::from_config(&config.alerts),
        evaluation,
    );

    println!("\nTransaction Initiated");
    let report = tokio::task::block_in_place(|| {
        let mut pins = ConsolePinSource::stdin();
        let mut selector = RandomLegitimateSelector::new();
        checker.check(&model_name, &mut pins, &mut selector)
    });

    let result = match report {
        Ok(report) => {
            print_report(&model_name, &report);
            if let Some(alert) = &report.alert {
                if let Err(e) = transport.send(alert).await {
                    error!(
                        alert_id = %alert.alert_id,
                        error = %e,
                        "Failed to deliver alert"
                    );
                } else {
                    info!(alert_id = %alert.alert_id, kind = ?alert.kind, "Alert delivered");
                }
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    };

    info!("Session finished");
    checker.metrics().print_summary();

    result
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_screening={}", config.level).parse()?);

    if config.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn print_report(model_name: &str, report: &CheckReport) {
    match report.auth {
        AuthOutcome::LockedOut => {
            println!("Fraud Detected: Too many incorrect PIN attempts!");
        }
        AuthOutcome::Verified => {
            println!("PIN Verified. Checking transaction with {model_name}");
            if let Some(decision) = &report.decision {
                println!("Model Prediction: {}", decision.label);
                if let Some(confidence) = decision.confidence {
                    println!("Fraud Probability: {confidence:.2}");
                }
                println!("True Label: {}", decision.true_label);

                if decision.label == Label::Fraud {
                    println!("Fraud Detected in transaction!");
                } else {
                    println!("Transaction is legitimate.");
                }
            }
        }
    }
}
