use rand::distr::Open01;
use rand::{Rng, RngCore};
use thiserror::Error;

/// A supply of independent uniform draws on the open interval `(0, 1)`.
///
/// Every [`rand::RngCore`] implementation is a `UniformSource`, so callers can hand a seeded
/// [`rand::rngs::StdRng`] straight to the generators for reproducible runs.
pub trait UniformSource {
    /// Draw the next uniform variate. Implementations must never return `0.0` or `1.0`.
    fn next_uniform(&mut self) -> f64;
}

impl<R> UniformSource for R
where
    R: RngCore + ?Sized,
{
    fn next_uniform(&mut self) -> f64 {
        self.sample(Open01)
    }
}

/// Replays a recorded stream of uniform variates, cycling back to the start when exhausted.
///
/// Useful when a thinning trace has to be checked by hand.
///
/// # Examples
///
/// ```
/// use countsim::{ReplaySource, UniformSource};
///
/// let mut source = ReplaySource::new(vec![0.25, 0.75]).unwrap();
/// assert_eq!(source.next_uniform(), 0.25);
/// assert_eq!(source.next_uniform(), 0.75);
/// assert_eq!(source.next_uniform(), 0.25);
/// ```
#[derive(Debug, Clone)]
pub struct ReplaySource {
    values: Vec<f64>,
    position: usize,
}

impl ReplaySource {
    /// Build a replay source from recorded uniforms.
    ///
    /// # Errors
    ///
    /// Returns [`UniformSourceError`] when `values` is empty or any value lies outside `(0, 1)`.
    pub fn new(values: Vec<f64>) -> Result<Self, UniformSourceError> {
        if values.is_empty() {
            return Err(UniformSourceError::Empty);
        }
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|&(_, &value)| !(value > 0.0 && value < 1.0))
        {
            return Err(UniformSourceError::OutOfRange { index, value });
        }
        Ok(Self {
            values,
            position: 0,
        })
    }

    /// Number of draws handed out so far, including wrapped-around ones.
    pub fn draws(&self) -> usize {
        self.position
    }
}

impl UniformSource for ReplaySource {
    fn next_uniform(&mut self) -> f64 {
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}

/// Errors emitted when building a [`ReplaySource`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UniformSourceError {
    /// No values were supplied.
    #[error("replay stream must contain at least one value")]
    Empty,
    /// A recorded value lies outside the open interval `(0, 1)`.
    #[error("uniform variate {value} at index {index} must lie within the interval (0, 1)")]
    OutOfRange {
        /// Index of the offending value.
        index: usize,
        /// The offending value.
        value: f64,
    },
}
