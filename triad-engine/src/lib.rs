//! Triad Engine: oscillators, note registry, clock, and the locked synth.
//!
//! Crate layout:
//! - [`nodes`]  : `Oscillator` and `Waveform` (one per voice slot)
//! - [`voices`] : `Note` timestamps and the `NoteRegistry`
//! - [`clock`]  : `SampleClock` trait and `FixedRateClock`
//! - [`synth`]  : `Synth<C>`, `Patch`, `Slot`, the realtime entry point
//!
//! The engine avoids heap allocations in the audio thread. Parameters are
//! plain clamped floats; the only synchronisation is the single lock inside
//! [`Synth`].

pub mod clock;
pub mod nodes;
pub mod synth;
pub mod voices;

// Re-export some commonly used items to make downstream imports ergonomic.
pub use clock::{FixedRateClock, SampleClock};
pub use nodes::{Oscillator, Waveform};
pub use synth::{Patch, Slot, Synth};
pub use triad_core::envelopes::Envelope;
pub use voices::{Note, NoteRegistry};
