//! Counting experiment built from decaying "dip" populations plus a constant background.
//!
//! Each dip is a population drained into a detector during its own counting window. Windows
//! run back to back, so a dip's events are shifted by the summed length of every earlier
//! window. The same dip table is simulated twice: a short-hold configuration counted right
//! away, and a long-hold configuration whose populations decayed for an extra holding period
//! first. Background counts accumulate in every window for both configurations.

use crate::process::{PoissonProcess, ProcessError};
use crate::rate::{ConstantRate, ExponentialDecay, RateError, RateFunction};
use crate::uniform::UniformSource;
use thiserror::Error;
use tracing::{debug, trace};

/// Background rate used unless a configuration overrides it.
pub const DEFAULT_BACKGROUND_RATE: f64 = 0.15;

/// Lifetime scaling the long-hold population: `exp(-hold_time / REFERENCE_LIFETIME)`.
pub const REFERENCE_LIFETIME: f64 = 877.7;

/// One decaying population and its counting window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dip {
    /// Drain time constant of the population.
    pub time_constant: f64,
    /// Length of the counting window.
    pub window_length: f64,
    /// Relative strength against the other dips.
    pub strength: f64,
}

impl Dip {
    /// Describe a dip.
    pub fn new(time_constant: f64, window_length: f64, strength: f64) -> Self {
        Self {
            time_constant,
            window_length,
            strength,
        }
    }

    fn collection_efficiency(&self) -> f64 {
        -(-self.window_length / self.time_constant).exp_m1()
    }
}

/// Parameters of a counting experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    /// Dips in counting order.
    pub dips: Vec<Dip>,
    /// Expected short-hold signal count summed over every window.
    pub num_hits: f64,
    /// Extra holding time before the long-hold counting sequence.
    pub hold_time: f64,
    /// Lifetime of the held population.
    pub reference_lifetime: f64,
    /// Constant background rate present in every window.
    pub background_rate: f64,
}

impl ExperimentConfig {
    /// Configuration with the default lifetime and background rate.
    pub fn new(dips: Vec<Dip>, num_hits: f64, hold_time: f64) -> Self {
        Self {
            dips,
            num_hits,
            hold_time,
            reference_lifetime: REFERENCE_LIFETIME,
            background_rate: DEFAULT_BACKGROUND_RATE,
        }
    }

    /// One fast dip counted for 100 time units.
    pub fn single_dip() -> Self {
        Self::new(vec![Dip::new(8.0, 100.0, 1.0)], 22000.0, 990.0)
    }

    /// Two near-empty slow dips followed by the main dip.
    pub fn three_dip() -> Self {
        Self::new(
            vec![
                Dip::new(100.0, 20.0, 1e-13),
                Dip::new(52.0, 20.0, 0.0027),
                Dip::new(7.8, 100.0, 0.083),
            ],
            28500.0,
            1370.0,
        )
    }

    /// Nine-window cleaning sequence.
    pub fn nine_dip() -> Self {
        let time_constants = [
            100.0, 65.981913, 23.739640, 19.241204, 18.700906, 17.779887, 19.758315, 14.361219,
            8.065494,
        ];
        let window_lengths = [20.0, 40.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 60.0];
        let strengths = [
            1e-13, 0.002746, 0.010865, 0.013028, 0.011499, 0.012766, 0.009688, 0.008515, 0.003804,
        ];
        let dips = time_constants
            .iter()
            .zip(window_lengths.iter())
            .zip(strengths.iter())
            .map(|((&tc, &length), &strength)| Dip::new(tc, length, strength))
            .collect();
        Self::new(dips, 21700.0, 990.0)
    }

    fn validate(&self) -> Result<(), ExperimentError> {
        if self.dips.is_empty() {
            return Err(ExperimentError::EmptyDips);
        }
        for (index, dip) in self.dips.iter().enumerate() {
            if !dip.time_constant.is_finite() || dip.time_constant <= 0.0 {
                return Err(ExperimentError::InvalidTimeConstant {
                    index,
                    value: dip.time_constant,
                });
            }
            if !dip.window_length.is_finite() || dip.window_length <= 0.0 {
                return Err(ExperimentError::InvalidWindowLength {
                    index,
                    value: dip.window_length,
                });
            }
            if !dip.strength.is_finite() || dip.strength < 0.0 {
                return Err(ExperimentError::InvalidStrength {
                    index,
                    value: dip.strength,
                });
            }
        }
        if !self.num_hits.is_finite() || self.num_hits <= 0.0 {
            return Err(ExperimentError::InvalidNumHits {
                value: self.num_hits,
            });
        }
        if !self.hold_time.is_finite() || self.hold_time < 0.0 {
            return Err(ExperimentError::InvalidHoldTime {
                value: self.hold_time,
            });
        }
        if !self.reference_lifetime.is_finite() || self.reference_lifetime <= 0.0 {
            return Err(ExperimentError::InvalidReferenceLifetime {
                value: self.reference_lifetime,
            });
        }
        if !self.background_rate.is_finite() || self.background_rate < 0.0 {
            return Err(ExperimentError::InvalidBackgroundRate {
                value: self.background_rate,
            });
        }
        Ok(())
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::single_dip()
    }
}

/// Which population set a trial counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hold {
    /// Populations counted without extra decay.
    Short,
    /// Populations counted after the holding period.
    Long,
}

/// Sum and count of absolute arrival times collected during one trial.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArrivalTally {
    /// Sum of absolute arrival times.
    pub time_sum: f64,
    /// Number of counted events.
    pub count: usize,
}

impl ArrivalTally {
    fn record<I>(&mut self, events: I, offset: f64)
    where
        I: IntoIterator<Item = f64>,
    {
        for event in events {
            self.time_sum += event + offset;
            self.count += 1;
        }
    }

    /// Mean arrival time, or `None` when nothing was counted.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.time_sum / self.count as f64)
        }
    }
}

#[derive(Debug, Clone)]
struct Window {
    length: f64,
    offset: f64,
    short: Option<PoissonProcess<ExponentialDecay>>,
    long: Option<PoissonProcess<ExponentialDecay>>,
}

impl Window {
    fn signal(&self, hold: Hold) -> Option<&PoissonProcess<ExponentialDecay>> {
        match hold {
            Hold::Short => self.short.as_ref(),
            Hold::Long => self.long.as_ref(),
        }
    }

    fn signal_mut(&mut self, hold: Hold) -> Option<&mut PoissonProcess<ExponentialDecay>> {
        match hold {
            Hold::Short => self.short.as_mut(),
            Hold::Long => self.long.as_mut(),
        }
    }
}

/// Simulator for the short-hold and long-hold counting sequences of one dip table.
///
/// The model owns its uniform source and every generator; each trial resets the generators it
/// uses, so successive trials are independent.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use countsim::{Dip, ExperimentConfig, ExperimentModel};
///
/// let config = ExperimentConfig::new(vec![Dip::new(5.0, 20.0, 1.0)], 500.0, 100.0);
/// let mut model = ExperimentModel::new(&config, StdRng::seed_from_u64(11)).unwrap();
///
/// let short = model.short_hold_mean_arrival_time().unwrap();
/// assert!(short > 0.0 && short < 20.0);
/// ```
#[derive(Debug, Clone)]
pub struct ExperimentModel<S> {
    windows: Vec<Window>,
    background: Option<PoissonProcess<ConstantRate>>,
    normalization: f64,
    source: S,
}

impl<S> ExperimentModel<S>
where
    S: UniformSource,
{
    /// Build the generators for `config`.
    ///
    /// Dips with zero strength, a zero background rate, or a long-hold amplitude that
    /// underflows to zero yield silent populations that never produce events.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError`] when `config` holds an invalid parameter or when every dip
    /// has zero strength.
    pub fn new(config: &ExperimentConfig, source: S) -> Result<Self, ExperimentError> {
        config.validate()?;

        let weight: f64 = config
            .dips
            .iter()
            .map(|dip| dip.strength * dip.collection_efficiency())
            .sum();
        if weight <= 0.0 {
            return Err(ExperimentError::ZeroTotalStrength);
        }
        let normalization = 1.0 / weight;
        let survival = (-config.hold_time / config.reference_lifetime).exp();

        let mut windows = Vec::with_capacity(config.dips.len());
        let mut offset = 0.0;
        for dip in &config.dips {
            let amplitude = config.num_hits * normalization * dip.strength;
            windows.push(Window {
                length: dip.window_length,
                offset,
                short: silent_or_process(ExponentialDecay::new(amplitude, dip.time_constant)?)?,
                long: silent_or_process(ExponentialDecay::new(
                    amplitude * survival,
                    dip.time_constant,
                )?)?,
            });
            offset += dip.window_length;
        }
        let background = silent_or_process(ConstantRate::new(config.background_rate)?)?;

        debug!(
            dips = windows.len(),
            normalization,
            survival,
            total_length = offset,
            "built counting experiment"
        );

        Ok(Self {
            windows,
            background,
            normalization,
            source,
        })
    }

    /// `1 / sum(strength * (1 - exp(-window / tau)))` over every dip.
    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    /// Absolute start time of each dip's window.
    pub fn offsets(&self) -> Vec<f64> {
        self.windows.iter().map(|window| window.offset).collect()
    }

    /// Summed length of every window.
    pub fn total_length(&self) -> f64 {
        self.windows
            .last()
            .map_or(0.0, |window| window.offset + window.length)
    }

    /// Expected number of counted events (signal plus background) in one trial.
    pub fn expected_count(&self, hold: Hold) -> f64 {
        let background_rate = self
            .background
            .as_ref()
            .map_or(0.0, |process| process.rate_fn().max_rate());
        self.windows
            .iter()
            .map(|window| {
                let signal = window
                    .signal(hold)
                    .map_or(0.0, |process| process.rate_fn().expected_count(window.length));
                signal + background_rate * window.length
            })
            .sum()
    }

    /// Run one trial and return the raw arrival-time tally.
    pub fn tally(&mut self, hold: Hold) -> ArrivalTally {
        let mut tally = ArrivalTally::default();
        for window in &mut self.windows {
            let (length, offset) = (window.length, window.offset);
            if let Some(process) = window.signal_mut(hold) {
                process.reset(0.0);
                tally.record(process.events(&mut self.source, length), offset);
            }
            if let Some(process) = self.background.as_mut() {
                process.reset(0.0);
                tally.record(process.events(&mut self.source, length), offset);
            }
        }
        trace!(?hold, count = tally.count, time_sum = tally.time_sum, "trial tally");
        tally
    }

    /// Mean absolute arrival time of one trial, or `None` when no event was counted.
    pub fn mean_arrival_time(&mut self, hold: Hold) -> Option<f64> {
        self.tally(hold).mean()
    }

    /// Mean arrival time of one short-hold trial.
    pub fn short_hold_mean_arrival_time(&mut self) -> Option<f64> {
        self.mean_arrival_time(Hold::Short)
    }

    /// Mean arrival time of one long-hold trial.
    pub fn long_hold_mean_arrival_time(&mut self) -> Option<f64> {
        self.mean_arrival_time(Hold::Long)
    }

    /// The uniform source feeding every generator.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Give the uniform source back.
    pub fn into_source(self) -> S {
        self.source
    }
}

fn silent_or_process<F>(rate_fn: F) -> Result<Option<PoissonProcess<F>>, ProcessError>
where
    F: RateFunction,
{
    if rate_fn.max_rate() == 0.0 {
        return Ok(None);
    }
    PoissonProcess::new(rate_fn).map(Some)
}

/// Errors emitted when building an [`ExperimentModel`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExperimentError {
    /// No dips were supplied.
    #[error("experiment must contain at least one dip")]
    EmptyDips,
    /// A dip's time constant is not finite and strictly positive.
    #[error("time constant {value} of dip {index} must be finite and strictly positive")]
    InvalidTimeConstant {
        /// Index of the offending dip.
        index: usize,
        /// The offending time constant.
        value: f64,
    },
    /// A dip's window length is not finite and strictly positive.
    #[error("window length {value} of dip {index} must be finite and strictly positive")]
    InvalidWindowLength {
        /// Index of the offending dip.
        index: usize,
        /// The offending window length.
        value: f64,
    },
    /// A dip's strength is negative or not finite.
    #[error("strength {value} of dip {index} must be finite and non-negative")]
    InvalidStrength {
        /// Index of the offending dip.
        index: usize,
        /// The offending strength.
        value: f64,
    },
    /// Every dip has zero strength, so no normalization exists.
    #[error("at least one dip must have a positive strength")]
    ZeroTotalStrength,
    /// The total signal count is not finite and strictly positive.
    #[error("number of hits {value} must be finite and strictly positive")]
    InvalidNumHits {
        /// The offending count.
        value: f64,
    },
    /// The hold time is negative or not finite.
    #[error("hold time {value} must be finite and non-negative")]
    InvalidHoldTime {
        /// The offending hold time.
        value: f64,
    },
    /// The reference lifetime is not finite and strictly positive.
    #[error("reference lifetime {value} must be finite and strictly positive")]
    InvalidReferenceLifetime {
        /// The offending lifetime.
        value: f64,
    },
    /// The background rate is negative or not finite.
    #[error("background rate {value} must be finite and non-negative")]
    InvalidBackgroundRate {
        /// The offending rate.
        value: f64,
    },
    /// A derived rate function was rejected.
    #[error(transparent)]
    Rate(#[from] RateError),
    /// A derived generator was rejected.
    #[error(transparent)]
    Process(#[from] ProcessError),
}
