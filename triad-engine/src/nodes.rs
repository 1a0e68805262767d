//! Oscillator node for the three voice slots.
//!
//! An [`Oscillator`] is configuration, not state: it holds no phase
//! accumulator. The waveform is computed directly from "time since the note
//! was triggered" and the target pitch, so every active note can share the
//! same three oscillators.
//!
//! Contents:
//! - `Waveform`   : sine, square, saw, triangle, additive "analog" saw, noise
//! - `Oscillator` : amplitude, waveform, vibrato/tremolo LFOs, tune, fine-tune
//!
//! Notes:
//! - Frequency is **Hz**, time is **seconds** (`f64`).
//! - Square is a 0/1 step driven by the sign bit of `sin(phase)`, not ±1.
//! - Saw folds vibrato in differently from the other shapes: it uses raw
//!   `hz * time` rather than the vibrato-bent phase.

use core::f64::consts::{FRAC_2_PI, PI, TAU};

use rand::Rng;
use triad_core::dsp::clamp;

/// Highest vibrato/tremolo rate, in Hz.
pub const MAX_LFO_HZ: f64 = 100.0;
/// Semitone range of [`Oscillator::set_tune`].
pub const MAX_TUNE: i32 = 36;
/// Harmonic count bounds for [`Waveform::AnalogSaw`].
pub const MIN_PARTIALS: u32 = 2;
pub const MAX_PARTIALS: u32 = 100;

/// Oscillator waveform.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
    /// Sawtooth built from a finite sine series.
    AnalogSaw,
    Noise,
}

impl Waveform {
    pub const ALL: [Waveform; 6] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Saw,
        Waveform::Triangle,
        Waveform::AnalogSaw,
        Waveform::Noise,
    ];

    /// Stable numeric code (used by the C ABI).
    #[inline]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Saw => "saw",
            Waveform::Triangle => "triangle",
            Waveform::AnalogSaw => "analog-saw",
            Waveform::Noise => "noise",
        }
    }

    /// Parse the names produced by [`Waveform::name`] (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// One voice slot's oscillator settings. Every setter clamps.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Oscillator {
    wave:      Waveform,
    amplitude: f64,
    partials:  u32,
    vib_hz:    f64,
    vib_depth: f64,
    trem_hz:   f64,
    trem_depth: f64,
    tune:      i32,
    fine:      f64,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self {
            wave: Waveform::Sine,
            amplitude: 1.0,
            partials: 50,
            vib_hz: 0.0,
            vib_depth: 0.0,
            trem_hz: 0.0,
            trem_depth: 0.0,
            tune: 0,
            fine: 0.0,
        }
    }
}

impl Oscillator {
    #[inline] pub fn new(wave: Waveform) -> Self { Self { wave, ..Self::default() } }

    #[inline] pub fn set_waveform(&mut self, w: Waveform) { self.wave = w; }
    #[inline] pub fn set_amplitude(&mut self, a: f64) { self.amplitude = clamp(a, 0.0, 1.0); }
    #[inline] pub fn set_partials(&mut self, n: u32) { self.partials = n.clamp(MIN_PARTIALS, MAX_PARTIALS); }
    #[inline] pub fn set_vibrato_frequency(&mut self, hz: f64) { self.vib_hz = clamp(hz, 0.0, MAX_LFO_HZ); }
    #[inline] pub fn set_vibrato_depth(&mut self, d: f64) { self.vib_depth = clamp(d, 0.0, 1.0); }
    #[inline] pub fn set_tremolo_frequency(&mut self, hz: f64) { self.trem_hz = clamp(hz, 0.0, MAX_LFO_HZ); }
    #[inline] pub fn set_tremolo_depth(&mut self, d: f64) { self.trem_depth = clamp(d, 0.0, 1.0); }
    #[inline] pub fn set_tune(&mut self, semitones: i32) { self.tune = semitones.clamp(-MAX_TUNE, MAX_TUNE); }
    #[inline] pub fn set_fine_tune(&mut self, hz: f64) { self.fine = clamp(hz, -1.0, 1.0); }

    #[inline] pub fn waveform(&self) -> Waveform { self.wave }
    #[inline] pub fn amplitude(&self) -> f64 { self.amplitude }
    #[inline] pub fn partials(&self) -> u32 { self.partials }
    #[inline] pub fn vibrato_frequency(&self) -> f64 { self.vib_hz }
    #[inline] pub fn vibrato_depth(&self) -> f64 { self.vib_depth }
    #[inline] pub fn tremolo_frequency(&self) -> f64 { self.trem_hz }
    #[inline] pub fn tremolo_depth(&self) -> f64 { self.trem_depth }
    #[inline] pub fn tune(&self) -> i32 { self.tune }
    #[inline] pub fn fine_tune(&self) -> f64 { self.fine }

    /// Sample at `time` seconds into the note for a target pitch of `hz`
    /// (already tuned by the caller). `rng` only feeds [`Waveform::Noise`].
    ///
    /// A pitch that is not a positive finite number is silence.
    pub fn evaluate<R: Rng + ?Sized>(&self, time: f64, hz: f64, rng: &mut R) -> f64 {
        if !(hz.is_finite() && hz > 0.0) {
            return 0.0;
        }

        let tremolo = self.trem_depth * (TAU * self.trem_hz * time).sin();
        let vibrato = self.vib_depth * hz * (TAU * self.vib_hz * time).sin();
        let phase = TAU * hz * time + vibrato;
        let gain = self.amplitude + tremolo;

        match self.wave {
            Waveform::Sine => gain * phase.sin(),
            Waveform::Square => {
                if phase.sin().is_sign_negative() { gain } else { 0.0 }
            }
            Waveform::Triangle => gain * (FRAC_2_PI * phase.sin().asin() * 2.0),
            Waveform::Saw => gain * -FRAC_2_PI * (1.0 / (hz * time * PI + vibrato).tan()).atan(),
            Waveform::AnalogSaw => {
                let sum: f64 = (1..self.partials)
                    .map(|k| {
                        let k = f64::from(k);
                        (k * phase).sin() / k
                    })
                    .sum();
                gain * FRAC_2_PI * sum
            }
            Waveform::Noise => gain * rng.gen_range(-1.0..=1.0),
        }
    }
}

// ------------------------------------ Tests --------------------------------------
