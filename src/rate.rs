use thiserror::Error;

/// A non-negative event rate as a function of time elapsed since a generator's last reset.
pub trait RateFunction {
    /// Instantaneous rate at elapsed time `t`.
    fn rate(&self, t: f64) -> f64;

    /// Supremum of [`RateFunction::rate`] over `t >= 0`; the natural thinning envelope.
    fn max_rate(&self) -> f64;
}

/// Exponentially decaying rate `(A / tau) * exp(-t / tau)`.
///
/// The integral over `[0, inf)` is `A`, so the amplitude is the expected total count of a
/// population drained forever. The supremum sits at `t = 0` and equals `A / tau`.
///
/// # Examples
///
/// ```
/// use countsim::{ExponentialDecay, RateFunction};
///
/// let decay = ExponentialDecay::new(100.0, 10.0).unwrap();
/// assert_eq!(decay.max_rate(), 10.0);
/// assert!(decay.rate(10.0) < decay.rate(0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecay {
    amplitude: f64,
    time_constant: f64,
}

impl ExponentialDecay {
    /// Build a decaying rate from its amplitude and time constant.
    ///
    /// # Errors
    ///
    /// Returns [`RateError`] when the amplitude is negative or not finite, or when the time
    /// constant is not finite and strictly positive.
    pub fn new(amplitude: f64, time_constant: f64) -> Result<Self, RateError> {
        if !amplitude.is_finite() || amplitude < 0.0 {
            return Err(RateError::InvalidAmplitude { value: amplitude });
        }
        if !time_constant.is_finite() || time_constant <= 0.0 {
            return Err(RateError::InvalidTimeConstant {
                value: time_constant,
            });
        }
        Ok(Self {
            amplitude,
            time_constant,
        })
    }

    /// Expected total count over `[0, inf)`.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Decay time constant.
    pub fn time_constant(&self) -> f64 {
        self.time_constant
    }

    /// Expected count inside a window `[0, length)`: `A * (1 - exp(-length / tau))`.
    pub fn expected_count(&self, length: f64) -> f64 {
        self.amplitude * -(-length / self.time_constant).exp_m1()
    }
}

impl RateFunction for ExponentialDecay {
    fn rate(&self, t: f64) -> f64 {
        self.amplitude / self.time_constant * (-t / self.time_constant).exp()
    }

    fn max_rate(&self) -> f64 {
        self.amplitude / self.time_constant
    }
}

/// Time-independent rate. With the rate as its own envelope every candidate is accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantRate {
    rate: f64,
}

impl ConstantRate {
    /// Build a constant rate.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::InvalidRate`] when `rate` is negative or not finite.
    pub fn new(rate: f64) -> Result<Self, RateError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(RateError::InvalidRate { value: rate });
        }
        Ok(Self { rate })
    }

    /// Expected count inside a window of `length`.
    pub fn expected_count(&self, length: f64) -> f64 {
        self.rate * length
    }
}

impl RateFunction for ConstantRate {
    fn rate(&self, _t: f64) -> f64 {
        self.rate
    }

    fn max_rate(&self) -> f64 {
        self.rate
    }
}

/// Errors emitted when a rate function is given invalid parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    /// Amplitude is negative or not finite.
    #[error("amplitude {value} must be finite and non-negative")]
    InvalidAmplitude {
        /// The offending amplitude.
        value: f64,
    },
    /// Time constant is not finite and strictly positive.
    #[error("time constant {value} must be finite and strictly positive")]
    InvalidTimeConstant {
        /// The offending time constant.
        value: f64,
    },
    /// Constant rate is negative or not finite.
    #[error("rate {value} must be finite and non-negative")]
    InvalidRate {
        /// The offending rate.
        value: f64,
    },
}
