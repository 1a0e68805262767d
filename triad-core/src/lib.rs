#![cfg_attr(not(feature = "std"), no_std)]
//! Triad Core: no_std-ready primitives for a three-oscillator polyphonic synth.
//!
//! Features
//! - `std`      : (default) use the Rust standard library
//! - `no-std`   : build with `#![no_std]` and use `libm` as the math backend
//!
//! Modules
//! - [`dsp`]       : math backend, clamping, pitch scale, silence floor, i16 quantisation
//! - [`envelopes`] : timestamp-driven linear ADSR shared by every voice
//!
//! Design
//! - No heap allocations; pure functions of time and configuration
//! - Every parameter setter clamps instead of failing

pub mod dsp;
pub mod envelopes;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::dsp::{
        clamp, flush_silence, lerp, scale_to_hz, to_i16, MIDDLE_C_HZ, SEMITONE_RATIO,
        SILENCE_FLOOR,
    };
    pub use crate::envelopes::{Envelope, MAX_STAGE_SECS};
}
