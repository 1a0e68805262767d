//! ADSR envelope evaluated from note timestamps.
//!
//! Unlike a ticking envelope, [`Envelope`] keeps no per-note state: every voice
//! shares one contour definition, and the amplitude at any instant is a pure
//! function of the sample time and the note's on/off timestamps. That lets one
//! envelope serve every active note and makes retriggering a matter of moving a
//! timestamp.
//!
//! Regimes:
//! - **Held** (`off` is `None`, or `on > off`): attack ramp 0→start, decay ramp
//!   start→sustain, then sustain forever.
//! - **Released** (`off >= on`): linear ramp from whatever the held contour was
//!   at the release instant down to 0 over `release` seconds.
//!
//! Outputs at or below [`SILENCE_FLOOR`](crate::dsp::SILENCE_FLOOR) are
//! flushed to exactly `0.0`; the engine uses that as its retirement signal.

use crate::dsp::{clamp, flush_silence, lerp};

/// Longest attack/decay/release stage, in seconds.
pub const MAX_STAGE_SECS: f64 = 5.0;

/// Linear four-stage contour shared by every voice.
/// Times are in seconds, levels in [0,1]. Every setter clamps.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Envelope {
    attack:  f64,
    decay:   f64,
    release: f64,
    start:   f64,
    sustain: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack:  0.1,
            decay:   0.1,
            release: 0.2,
            start:   1.0,
            sustain: 0.8,
        }
    }
}

impl Envelope {
    /// Build from explicit stage values; each one is clamped like its setter.
    #[inline]
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64, start: f64) -> Self {
        let mut e = Self::default();
        e.set_attack(attack);
        e.set_decay(decay);
        e.set_sustain_amplitude(sustain);
        e.set_release(release);
        e.set_start_amplitude(start);
        e
    }

    #[inline] pub fn set_attack(&mut self, secs: f64)  { self.attack  = clamp(secs, 0.0, MAX_STAGE_SECS); }
    #[inline] pub fn set_decay(&mut self, secs: f64)   { self.decay   = clamp(secs, 0.0, MAX_STAGE_SECS); }
    #[inline] pub fn set_release(&mut self, secs: f64) { self.release = clamp(secs, 0.0, MAX_STAGE_SECS); }
    #[inline] pub fn set_start_amplitude(&mut self, a: f64)   { self.start   = clamp(a, 0.0, 1.0); }
    #[inline] pub fn set_sustain_amplitude(&mut self, a: f64) { self.sustain = clamp(a, 0.0, 1.0); }

    #[inline] pub fn attack(&self) -> f64  { self.attack }
    #[inline] pub fn decay(&self) -> f64   { self.decay }
    #[inline] pub fn release(&self) -> f64 { self.release }
    #[inline] pub fn start_amplitude(&self) -> f64   { self.start }
    #[inline] pub fn sustain_amplitude(&self) -> f64 { self.sustain }

    /// Held-regime contour at `life` seconds after the trigger.
    ///
    /// A zero-length attack counts as already finished, so `life == 0` yields
    /// the start level instead of `0/0`. The decay branch can only be reached
    /// with `decay > 0`.
    #[inline]
    fn held(&self, life: f64) -> f64 {
        if life <= self.attack {
            if self.attack > 0.0 {
                (life / self.attack) * self.start
            } else {
                self.start
            }
        } else if life <= self.attack + self.decay {
            lerp(self.start, self.sustain, (life - self.attack) / self.decay)
        } else {
            self.sustain
        }
    }

    /// Amplitude at `time` for a note triggered at `on` and released at `off`.
    ///
    /// `off == None` means the note has never been released.
    #[inline]
    pub fn amplitude(&self, time: f64, on: f64, off: Option<f64>) -> f64 {
        let amp = match off {
            Some(off) if off >= on => {
                let release_start = self.held(off - on);
                if self.release > 0.0 {
                    lerp(release_start, 0.0, (time - off) / self.release)
                } else {
                    0.0
                }
            }
            _ => self.held(time - on),
        };
        flush_silence(amp)
    }
}

// ------------------------------------ Tests --------------------------------------
