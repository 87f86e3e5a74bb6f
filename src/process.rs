use crate::rate::RateFunction;
use crate::uniform::UniformSource;
use thiserror::Error;

/// Inhomogeneous Poisson process sampled by thinning a homogeneous envelope process.
///
/// Candidates arrive at the constant envelope rate `max_rate`; a candidate at time `t` is kept
/// with probability `rate(t) / max_rate`. The envelope must bound the rate over every time the
/// process is queried at; a rate above the envelope is not detected and biases the output.
///
/// The process only tracks the simulated clock. Uniform draws come from the
/// [`UniformSource`] passed to each sampling call, so one seeded source can feed several
/// processes.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use countsim::{ExponentialDecay, PoissonProcess};
///
/// let decay = ExponentialDecay::new(100.0, 10.0).unwrap();
/// let mut process = PoissonProcess::new(decay).unwrap();
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let events = process.events_to_time(&mut rng, 20.0);
/// assert!(events.iter().all(|&t| t < 20.0));
/// ```
#[derive(Debug, Clone)]
pub struct PoissonProcess<F> {
    rate_fn: F,
    max_rate: f64,
    current_time: f64,
}

impl<F> PoissonProcess<F>
where
    F: RateFunction,
{
    /// Build a process whose envelope is the rate function's own supremum.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvalidMaxRate`] when the supremum is not finite and strictly
    /// positive (for example a decay with zero amplitude).
    pub fn new(rate_fn: F) -> Result<Self, ProcessError> {
        let max_rate = rate_fn.max_rate();
        Self::with_max_rate(rate_fn, max_rate)
    }

    /// Build a process with an explicit envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvalidMaxRate`] when `max_rate` is not finite and strictly
    /// positive.
    pub fn with_max_rate(rate_fn: F, max_rate: f64) -> Result<Self, ProcessError> {
        if !max_rate.is_finite() || max_rate <= 0.0 {
            return Err(ProcessError::InvalidMaxRate { value: max_rate });
        }
        Ok(Self {
            rate_fn,
            max_rate,
            current_time: 0.0,
        })
    }

    /// Move the simulated clock to `time`.
    pub fn reset(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Current simulated time.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Thinning envelope.
    pub fn max_rate(&self) -> f64 {
        self.max_rate
    }

    /// The underlying rate function.
    pub fn rate_fn(&self) -> &F {
        &self.rate_fn
    }

    /// Realize the next accepted event strictly after the current time.
    ///
    /// Returns `None` once a candidate reaches `max_time`; a NaN `max_time` counts as already
    /// reached. The clock is left wherever the last candidate landed, possibly past
    /// `max_time`, so reset before starting a new window.
    ///
    /// Each candidate costs one uniform draw for its step and, only when it lands before
    /// `max_time`, a second draw for the acceptance test. The final candidate at or past
    /// `max_time` therefore consumes a single draw.
    ///
    /// With a finite `max_time` the loop always terminates because every candidate advances
    /// the clock, but the number of candidates grows as `rate(t) / max_rate` shrinks: a loose
    /// envelope over the tail of a fast decay costs many rejected draws. An infinite
    /// `max_time` never exhausts, so once a decaying population is spent the loop keeps
    /// rejecting forever.
    pub fn next_event<S>(&mut self, source: &mut S, max_time: f64) -> Option<f64>
    where
        S: UniformSource + ?Sized,
    {
        loop {
            self.current_time += -source.next_uniform().ln() / self.max_rate;
            if max_time.is_nan() || self.current_time >= max_time {
                return None;
            }
            let acceptance = self.rate_fn.rate(self.current_time) / self.max_rate;
            if source.next_uniform() <= acceptance {
                return Some(self.current_time);
            }
        }
    }

    /// Lazily realize events from the current time up to `length`.
    ///
    /// The iterator stops at the first exhausted draw and does not restart on its own.
    pub fn events<'a, S>(&'a mut self, source: &'a mut S, length: f64) -> Events<'a, F, S>
    where
        S: UniformSource + ?Sized,
    {
        Events {
            process: self,
            source,
            length,
            exhausted: false,
        }
    }

    /// Realize all events from the current time up to `length`, in increasing order.
    pub fn events_to_time<S>(&mut self, source: &mut S, length: f64) -> Vec<f64>
    where
        S: UniformSource + ?Sized,
    {
        self.events(source, length).collect()
    }

    /// Realize at most `n` events before `max_time`.
    pub fn take_events<S>(&mut self, source: &mut S, n: usize, max_time: f64) -> Vec<f64>
    where
        S: UniformSource + ?Sized,
    {
        self.events(source, max_time).take(n).collect()
    }
}

/// Iterator over the accepted events of a [`PoissonProcess`] inside one window.
///
/// Created by [`PoissonProcess::events`].
#[derive(Debug)]
pub struct Events<'a, F, S: ?Sized> {
    process: &'a mut PoissonProcess<F>,
    source: &'a mut S,
    length: f64,
    exhausted: bool,
}

impl<F, S> Iterator for Events<'_, F, S>
where
    F: RateFunction,
    S: UniformSource + ?Sized,
{
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.exhausted {
            return None;
        }
        let event = self.process.next_event(&mut *self.source, self.length);
        self.exhausted = event.is_none();
        event
    }
}

impl<F, S> std::iter::FusedIterator for Events<'_, F, S>
where
    F: RateFunction,
    S: UniformSource + ?Sized,
{
}

/// Errors emitted when constructing a [`PoissonProcess`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    /// The thinning envelope is not finite and strictly positive.
    #[error("bounding rate {value} must be finite and strictly positive")]
    InvalidMaxRate {
        /// The offending envelope.
        value: f64,
    },
}
