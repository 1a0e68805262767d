//! Generic DSP utilities and math helpers.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Clean, side-effect free helpers that are easy to test
//!
//! Conventions:
//! - All functions are `#[inline]` where useful to help the optimizer.
//! - Everything here is `f64`: the synth clock is a double-precision
//!   "seconds since start" value and phases are derived from it directly.

#![allow(clippy::excessive_precision)]

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // libm (C math) in no_std
    if #[cfg(feature = "no-std")] {
        #[inline] fn m_powi(x: f64, n: i32) -> f64 { libm::pow(x, f64::from(n)) }
    // std backend
    } else {
        #[inline] fn m_powi(x: f64, n: i32) -> f64 { x.powi(n) }
    }
}

// --------------------------------- Constants -------------------------------------

/// Pitch of note `0` (middle C) in Hz.
pub const MIDDLE_C_HZ: f64 = 261.63;

/// Twelfth root of two: the equal-tempered semitone ratio.
pub const SEMITONE_RATIO: f64 = 1.059_463_094_359_295_264_561_825_294_946_3;

/// Envelope outputs at or below this level are treated as silence.
pub const SILENCE_FLOOR: f64 = 0.0001;

// --------------------------------- Utilities -------------------------------------

/// Clamp `x` into `[lo, hi]`. NaN maps to `lo`, so a setter can never store it.
#[inline]
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        lo
    } else {
        num_traits::clamp(x, lo, hi)
    }
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Snap anything at or below [`SILENCE_FLOOR`] to exactly `0.0`.
#[inline]
pub fn flush_silence(x: f64) -> f64 {
    if x <= SILENCE_FLOOR { 0.0 } else { x }
}

// --------------------------------- Pitch -----------------------------------------

/// Equal-tempered pitch of note `n`, counted in semitones from middle C.
///
/// `scale_to_hz(0) == 261.63`, `scale_to_hz(12)` is one octave up.
#[inline]
pub fn scale_to_hz(n: i32) -> f64 {
    MIDDLE_C_HZ * m_powi(SEMITONE_RATIO, n)
}

// --------------------------------- Quantisation ----------------------------------

/// Scale a sample in `[-1, 1]` to signed 16-bit PCM, clamping out-of-range input.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn to_i16(x: f64) -> i16 {
    if x.is_nan() {
        return 0;
    }
    (x * f64::from(i16::MAX)).clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

// --------------------------------- Tests (std only) ------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_c_is_exact() {
        assert_eq!(scale_to_hz(0), 261.63);
    }

    #[test]
    fn octaves_double() {
        assert!((scale_to_hz(12) - 523.26).abs() < 1e-2);
        assert!((scale_to_hz(-12) - 130.815).abs() < 1e-2);
        assert!((scale_to_hz(24) / scale_to_hz(12) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn clamp_bounds_and_nan() {
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
        assert_eq!(clamp(f64::NAN, -1.0, 1.0), -1.0);
        assert_eq!(clamp(f64::INFINITY, 0.0, 5.0), 5.0);
    }

    #[test]
    fn silence_floor_snaps() {
        assert_eq!(flush_silence(0.0001), 0.0);
        assert_eq!(flush_silence(-0.3), 0.0);
        assert_eq!(flush_silence(0.00011), 0.00011);
    }

    #[test]
    fn i16_quantisation_clamps() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(4.0), i16::MAX);
        assert_eq!(to_i16(-4.0), i16::MIN);
        assert_eq!(to_i16(f64::NAN), 0);
    }
}
