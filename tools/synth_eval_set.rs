//! Synthetic Evaluation Set Generator
//!
//! Writes a CSV in the credit-card layout (`Time, V1..V28, Amount, Class`)
//! for trying the screening binary without the real dataset.
//!
//! Usage: `synth-eval-set [output] [count] [fraud-rate]`

use rand::Rng;
use tracing::info;

const PCA_COMPONENTS: usize = 28;

/// Row generator
struct RowGenerator {
    rng: rand::rngs::ThreadRng,
    elapsed: f64,
}

impl RowGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            elapsed: 0.0,
        }
    }

    /// PCA components centred on zero, small amount
    fn legitimate(&mut self) -> Vec<String> {
        let pca: Vec<f64> = (0..PCA_COMPONENTS)
            .map(|_| self.rng.gen_range(-1.5..1.5))
            .collect();
        let amount = self.rng.gen_range(1.0..250.0);
        self.row(pca, amount, 0)
    }

    /// Shifted components on the leading axes, which is where the fraud
    /// class separates in the real data
    fn fraudulent(&mut self) -> Vec<String> {
        let pca: Vec<f64> = (0..PCA_COMPONENTS)
            .map(|i| match i {
                0..=3 => self.rng.gen_range(-6.0..-2.0),
                10..=13 => self.rng.gen_range(2.0..6.0),
                _ => self.rng.gen_range(-1.5..1.5),
            })
            .collect();
        let amount = self.rng.gen_range(0.5..2000.0);
        self.row(pca, amount, 1)
    }

    fn row(&mut self, pca: Vec<f64>, amount: f64, class: u8) -> Vec<String> {
        self.elapsed += self.rng.gen_range(0.0..120.0);

        let mut row = Vec::with_capacity(PCA_COMPONENTS + 3);
        row.push(format!("{:.0}", self.elapsed));
        row.extend(pca.iter().map(|v| format!("{v:.6}")));
        row.push(format!("{amount:.2}"));
        row.push(class.to_string());
        row
    }
}

/// Fraud share of the generated rows, a finite value in [0, 1]
fn parse_fraud_rate(raw: &str) -> anyhow::Result<f64> {
    let rate: f64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("fraud rate {raw:?} is not a number"))?;
    if !(0.0..=1.0).contains(&rate) {
        anyhow::bail!("fraud rate must be between 0 and 1, got {raw}");
    }
    Ok(rate)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("synth_eval_set=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(|s| s.as_str()).unwrap_or("data/evaluation.csv");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(500);
    let fraud_rate = match args.get(3) {
        Some(raw) => parse_fraud_rate(raw)?,
        None => 0.5,
    };

    info!(output = %output, count = count, fraud_rate = fraud_rate, "Configuration loaded");

    if let Some(parent) = std::path::Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(output)?;
    let mut header = vec!["Time".to_string()];
    header.extend((1..=PCA_COMPONENTS).map(|i| format!("V{i}")));
    header.push("Amount".to_string());
    header.push("Class".to_string());
    writer.write_record(&header)?;

    let mut generator = RowGenerator::new();
    let mut rng = rand::thread_rng();
    let mut fraud = 0u64;

    for _ in 0..count {
        let row = if rng.gen_bool(fraud_rate) {
            fraud += 1;
            generator.fraudulent()
        } else {
            generator.legitimate()
        };
        writer.write_record(&row)?;
    }
    writer.flush()?;

    info!(
        rows = count,
        fraud = fraud,
        legitimate = count - fraud,
        "Evaluation set written"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fraud_rate() {
        assert_eq!(parse_fraud_rate("0.25").unwrap(), 0.25);
        assert_eq!(parse_fraud_rate("1").unwrap(), 1.0);

        for bad in ["NaN", "inf", "-0.1", "1.5", "half"] {
            assert!(parse_fraud_rate(bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_rows_match_the_layout() {
        let mut generator = RowGenerator::new();
        let legit = generator.legitimate();
        let fraud = generator.fraudulent();
        assert_eq!(legit.len(), PCA_COMPONENTS + 3);
        assert_eq!(legit.last().map(String::as_str), Some("0"));
        assert_eq!(fraud.last().map(String::as_str), Some("1"));
    }
}
