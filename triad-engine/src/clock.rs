//! Sample clock: the time base the engine renders against.
//!
//! The engine never owns a hardcoded rate. It is generic over a
//! [`SampleClock`], and the caller constructs the clock with whatever rate the
//! audio device actually negotiated. [`FixedRateClock`] is the usual choice;
//! other sources (an externally driven transport, a test clock) implement the
//! same two methods.

/// A monotonically increasing time base, advanced once per produced sample.
pub trait SampleClock: Send {
    /// Current time in seconds.
    fn now(&self) -> f64;

    /// Move forward by exactly one sample period.
    fn advance(&mut self);
}

/// Clock that steps by `1 / sample_rate` seconds per sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedRateClock {
    sample_rate: u32,
    step: f64,
    t: f64,
}

impl FixedRateClock {
    /// Start at t = 0. A zero rate is treated as 1 Hz so the step stays finite.
    #[inline]
    pub fn new(sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        Self { sample_rate, step: 1.0 / f64::from(sample_rate), t: 0.0 }
    }

    #[inline] pub fn sample_rate(&self) -> u32 { self.sample_rate }

    /// Length of one sample in seconds.
    #[inline] pub fn period(&self) -> f64 { self.step }
}

impl SampleClock for FixedRateClock {
    #[inline] fn now(&self) -> f64 { self.t }

    #[inline]
    fn advance(&mut self) {
        self.t += self.step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_one_period_per_sample() {
        let mut clock = FixedRateClock::new(44_100);
        assert_eq!(clock.now(), 0.0);
        for _ in 0..44_100 {
            clock.advance();
        }
        assert!((clock.now() - 1.0).abs() < 1e-9);
        assert_eq!(clock.sample_rate(), 44_100);
    }

    #[test]
    fn is_strictly_monotonic() {
        let mut clock = FixedRateClock::new(48_000);
        let mut last = clock.now();
        for _ in 0..10_000 {
            clock.advance();
            assert!(clock.now() > last);
            last = clock.now();
        }
    }

    #[test]
    fn zero_rate_does_not_divide_by_zero() {
        let mut clock = FixedRateClock::new(0);
        clock.advance();
        assert_eq!(clock.now(), 1.0);
    }
}
