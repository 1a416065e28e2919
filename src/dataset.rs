//! Held-out evaluation data
//!
//! Rows follow the credit-card dataset layout `Time, V1..V28, Amount, Class`.
//! `Time` is dropped and `Amount` is standard-scaled over the loaded rows, so
//! each sample carries 29 features in the order `V1..V28, Amount`.

use crate::error::{Result, ScreeningError};
use crate::types::{Label, TransactionSample};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Number of PCA components in the source data
const PCA_COMPONENTS: usize = 28;

/// Standard scaler for a single column (population standard deviation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardScaler {
    pub mean: f64,
    pub std: f64,
}

impl StandardScaler {
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { mean: 0.0, std: 1.0 };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: variance.sqrt(),
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        if self.std > 0.0 {
            (value - self.mean) / self.std
        } else {
            // Constant column: every value equals the mean
            0.0
        }
    }
}

/// Labeled samples available to the sample selector
#[derive(Debug, Clone, Default)]
pub struct EvaluationSet {
    samples: Vec<TransactionSample>,
}

impl EvaluationSet {
    pub fn from_samples(samples: Vec<TransactionSample>) -> Self {
        Self { samples }
    }

    /// Load and scale a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let set = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            samples = set.len(),
            fraud = set.count(Label::Fraud),
            legitimate = set.count(Label::Legitimate),
            "Evaluation set loaded"
        );
        Ok(set)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers().map_err(csv_error)?.clone();

        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ScreeningError::Dataset(format!("missing column {name}")))
        };

        let pca_columns = (1..=PCA_COMPONENTS)
            .map(|i| column(&format!("V{i}")))
            .collect::<Result<Vec<_>>>()?;
        let amount_column = column("Amount")?;
        let class_column = column("Class")?;

        let mut rows: Vec<(Vec<f32>, f64, Label)> = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(csv_error)?;
            let field = |idx: usize| -> Result<f64> {
                let raw = record.get(idx).unwrap_or("").trim().trim_matches('\'');
                match raw.parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(value),
                    _ => Err(ScreeningError::Dataset(format!(
                        "row {}: {:?} in column {} is not a finite number",
                        line + 1,
                        raw,
                        &headers[idx]
                    ))),
                }
            };

            let pca = pca_columns
                .iter()
                .map(|&idx| field(idx).map(|v| v as f32))
                .collect::<Result<Vec<_>>>()?;
            let amount = field(amount_column)?;
            let class = field(class_column)?;
            let label = Label::from_class(class).ok_or_else(|| {
                ScreeningError::Dataset(format!(
                    "row {}: Class must be 0 or 1, got {class}",
                    line + 1
                ))
            })?;
            rows.push((pca, amount, label));
        }

        if rows.is_empty() {
            return Err(ScreeningError::Dataset("evaluation set is empty".to_string()));
        }

        let amounts: Vec<f64> = rows.iter().map(|(_, amount, _)| *amount).collect();
        let scaler = StandardScaler::fit(&amounts);

        let samples = rows
            .into_iter()
            .enumerate()
            .map(|(index, (mut features, amount, label))| {
                features.push(scaler.transform(amount) as f32);
                TransactionSample::new(index, features, label)
            })
            .collect();

        Ok(Self { samples })
    }

    pub fn get(&self, index: usize) -> Result<&TransactionSample> {
        self.samples.get(index).ok_or_else(|| {
            ScreeningError::Dataset(format!(
                "sample index {index} out of range ({} samples)",
                self.samples.len()
            ))
        })
    }

    pub fn samples(&self) -> &[TransactionSample] {
        &self.samples
    }

    /// Positions of samples whose true label is `label`
    pub fn indices_with_label(&self, label: Label) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.true_label == label)
            .map(|(position, _)| position)
            .collect()
    }

    pub fn count(&self, label: Label) -> usize {
        self.samples.iter().filter(|s| s.true_label == label).count()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Feature names in model input order
    pub fn feature_names() -> Vec<String> {
        (1..=PCA_COMPONENTS)
            .map(|i| format!("V{i}"))
            .chain(std::iter::once("Amount".to_string()))
            .collect()
    }
}

fn csv_error(e: csv::Error) -> ScreeningError {
    ScreeningError::Dataset(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> String {
        let pca: Vec<String> = (1..=28).map(|i| format!("V{i}")).collect();
        format!("Time,{},Amount,Class", pca.join(","))
    }

    fn row(time: f64, v: f64, amount: f64, class: &str) -> String {
        let pca: Vec<String> = (0..28).map(|_| v.to_string()).collect();
        format!("{time},{},{amount},{class}", pca.join(","))
    }

    #[test]
    fn test_scaler() {
        let scaler = StandardScaler::fit(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(scaler.mean, 25.0);
        assert!((scaler.std - 11.1803).abs() < 1e-3);
        assert_eq!(scaler.transform(25.0), 0.0);

        let constant = StandardScaler::fit(&[5.0, 5.0]);
        assert_eq!(constant.transform(5.0), 0.0);
    }

    #[test]
    fn test_load_drops_time_and_scales_amount() {
        let csv = format!(
            "{}\n{}\n{}\n",
            header(),
            row(0.0, 0.5, 100.0, "0"),
            row(1.0, -1.5, 300.0, "\"1\"")
        );
        let set = EvaluationSet::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(set.len(), 2);
        let first = set.get(0).unwrap();
        assert_eq!(first.features.len(), 29);
        assert_eq!(first.features[0], 0.5);
        assert_eq!(first.features[28], -1.0);
        assert_eq!(first.true_label, Label::Legitimate);

        let second = set.get(1).unwrap();
        assert_eq!(second.features[28], 1.0);
        assert_eq!(second.true_label, Label::Fraud);

        assert_eq!(set.indices_with_label(Label::Legitimate), vec![0]);
        assert_eq!(set.count(Label::Fraud), 1);
    }

    #[test]
    fn test_missing_column() {
        let err = EvaluationSet::from_reader("Time,V1,Amount\n0,1,2\n".as_bytes())
            .err()
            .unwrap();
        assert!(err.to_string().contains("missing column V2"));
    }

    #[test]
    fn test_empty_set() {
        let err = EvaluationSet::from_reader(format!("{}\n", header()).as_bytes())
            .err()
            .unwrap();
        assert!(matches!(err, ScreeningError::Dataset(_)));
    }

    #[test]
    fn test_non_finite_fields_rejected() {
        for (v, amount) in [(0.5, f64::NAN), (f64::INFINITY, 10.0), (0.5, f64::NEG_INFINITY)] {
            let csv = format!(
                "{}\n{}\n{}\n",
                header(),
                row(0.0, 0.5, 100.0, "0"),
                row(1.0, v, amount, "0")
            );
            let err = EvaluationSet::from_reader(csv.as_bytes()).err().unwrap();
            assert!(matches!(err, ScreeningError::Dataset(_)));
            assert!(err.to_string().contains("row 2"));
        }
    }

    #[test]
    fn test_class_must_be_zero_or_one() {
        for class in ["7", "0.9", "-1"] {
            let csv = format!("{}\n{}\n", header(), row(0.0, 0.5, 100.0, class));
            let err = EvaluationSet::from_reader(csv.as_bytes()).err().unwrap();
            assert!(matches!(err, ScreeningError::Dataset(_)));
            assert!(err.to_string().contains("Class must be 0 or 1"));
        }

        let csv = format!("{}\n{}\n", header(), row(0.0, 0.5, 100.0, "1.0"));
        let set = EvaluationSet::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(set.get(0).unwrap().true_label, Label::Fraud);
    }

    #[test]
    fn test_out_of_range_index() {
        let set = EvaluationSet::default();
        assert!(set.get(3).is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn test_feature_names() {
        let names = EvaluationSet::feature_names();
        assert_eq!(names.len(), 29);
        assert_eq!(names[0], "V1");
        assert_eq!(names[28], "Amount");
    }
}
