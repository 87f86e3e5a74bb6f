#![warn(missing_docs)]

//! Counting experiment simulation
//!
//! This crate samples arrival times from inhomogeneous Poisson processes by thinning, and
//! composes decaying signal populations with a constant background into sequential counting
//! windows to measure how the mean arrival time shifts between holding configurations.

mod experiment;
mod process;
mod rate;
mod trials;
mod uniform;

pub use experiment::{
    ArrivalTally, DEFAULT_BACKGROUND_RATE, Dip, ExperimentConfig, ExperimentError,
    ExperimentModel, Hold, REFERENCE_LIFETIME,
};
pub use process::{Events, PoissonProcess, ProcessError};
pub use rate::{ConstantRate, ExponentialDecay, RateError, RateFunction};
pub use trials::{BatchSummary, SampleSummary, TrialReport, TrialRunner};
pub use uniform::{ReplaySource, UniformSource, UniformSourceError};
