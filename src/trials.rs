use crate::experiment::{ExperimentModel, Hold};
use crate::uniform::UniformSource;
use tracing::{debug, warn};

/// Sample mean and Bessel-corrected standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSummary {
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation with divisor `n - 1`.
    pub std_dev: f64,
    /// Number of samples.
    pub n: usize,
}

impl SampleSummary {
    /// Summarize `samples`, or return `None` when fewer than two are given.
    ///
    /// # Examples
    ///
    /// ```
    /// use countsim::SampleSummary;
    ///
    /// let summary = SampleSummary::from_samples(&[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(summary.mean, 2.0);
    /// assert_eq!(summary.std_dev, 1.0);
    /// assert!(SampleSummary::from_samples(&[1.0]).is_none());
    /// ```
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let n = samples.len();
        if n < 2 {
            return None;
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let squares: f64 = samples.iter().map(|&x| (x - mean).powi(2)).sum();
        Some(Self {
            mean,
            std_dev: (squares / (n - 1) as f64).sqrt(),
            n,
        })
    }
}

/// Arrival-time shift measured over one batch of paired trials.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Summary of the per-trial differences `long - short`.
    pub shift: Option<SampleSummary>,
    /// Trial pairs dropped because one side counted no events.
    pub dropped: usize,
}

/// Result of a full [`TrialRunner::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrialReport {
    /// One entry per batch.
    pub batches: Vec<BatchSummary>,
    /// Summary over the batch mean shifts.
    pub grand: Option<SampleSummary>,
}

/// Repeats short-hold and long-hold trials and aggregates the mean arrival-time shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialRunner {
    /// Trials per configuration in each batch.
    pub runs: usize,
    /// Number of batches.
    pub batches: usize,
}

impl TrialRunner {
    /// Runner with `runs` paired trials in each of `batches` batches.
    pub fn new(runs: usize, batches: usize) -> Self {
        Self { runs, batches }
    }

    /// Measure one batch: `runs` short-hold trials, then `runs` long-hold trials.
    pub fn run_batch<S>(&self, model: &mut ExperimentModel<S>) -> BatchSummary
    where
        S: UniformSource,
    {
        let short: Vec<Option<f64>> = (0..self.runs)
            .map(|_| model.mean_arrival_time(Hold::Short))
            .collect();
        let long: Vec<Option<f64>> = (0..self.runs)
            .map(|_| model.mean_arrival_time(Hold::Long))
            .collect();

        let differences: Vec<f64> = short
            .iter()
            .zip(long.iter())
            .filter_map(|(short, long)| Some((*long)? - (*short)?))
            .collect();
        let dropped = self.runs - differences.len();
        if dropped > 0 {
            warn!(dropped, runs = self.runs, "dropped trials with no counted events");
        }

        let shift = SampleSummary::from_samples(&differences);
        if let Some(summary) = shift {
            debug!(mean = summary.mean, std_dev = summary.std_dev, "batch shift");
        }
        BatchSummary { shift, dropped }
    }

    /// Run every batch and summarize the batch means.
    pub fn run<S>(&self, model: &mut ExperimentModel<S>) -> TrialReport
    where
        S: UniformSource,
    {
        let batches: Vec<BatchSummary> = (0..self.batches)
            .map(|_| self.run_batch(model))
            .collect();
        let means: Vec<f64> = batches
            .iter()
            .filter_map(|batch| batch.shift.map(|summary| summary.mean))
            .collect();
        TrialReport {
            grand: SampleSummary::from_samples(&means),
            batches,
        }
    }
}
