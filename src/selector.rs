//! Sample selection strategies for demonstration runs

use crate::dataset::EvaluationSet;
use crate::error::{Result, ScreeningError};
use crate::types::{Label, TransactionSample};
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Picks the sample a transaction check runs against
pub trait SampleSelector {
    fn select<'a>(&mut self, set: &'a EvaluationSet) -> Result<&'a TransactionSample>;
}

/// Uniformly random sample among those labeled legitimate
pub struct RandomLegitimateSelector<R: Rng = ThreadRng> {
    rng: R,
}

impl RandomLegitimateSelector<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomLegitimateSelector<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomLegitimateSelector<R> {
    /// Use a caller-supplied generator, e.g. a seeded one
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> SampleSelector for RandomLegitimateSelector<R> {
    fn select<'a>(&mut self, set: &'a EvaluationSet) -> Result<&'a TransactionSample> {
        let legitimate = set.indices_with_label(Label::Legitimate);
        let index = *legitimate.choose(&mut self.rng).ok_or_else(|| {
            ScreeningError::Dataset("no legitimate samples to choose from".to_string())
        })?;
        debug!(index = index, candidates = legitimate.len(), "Selected random legitimate sample");
        set.get(index)
    }
}

/// Always the same row
#[derive(Debug, Clone, Copy)]
pub struct FixedIndexSelector(pub usize);

impl SampleSelector for FixedIndexSelector {
    fn select<'a>(&mut self, set: &'a EvaluationSet) -> Result<&'a TransactionSample> {
        set.get(self.0)
    }
}
