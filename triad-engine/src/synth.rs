//! The polyphonic engine: three oscillators + one envelope per note, mixed
//! under a single lock.
//!
//! Threading model
//! - A control thread calls setters and [`Synth::trigger`]/[`Synth::release`].
//! - The audio thread calls one of the `render*` methods per device buffer.
//! - Both go through one `parking_lot::Mutex` owned by the [`Synth`]. The
//!   render methods hold it for the whole buffer, so a note's on/off pair or an
//!   oscillator mid-edit is never observed half-written.
//!
//! Nothing inside the lock allocates in steady state, blocks on I/O, or logs
//! above `trace` level. Control-side logging happens after the guard drops.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};
use triad_core::dsp::{clamp, scale_to_hz};
use triad_core::envelopes::Envelope;

use crate::clock::{FixedRateClock, SampleClock};
use crate::nodes::{Oscillator, Waveform};
use crate::voices::{Note, NoteRegistry};

/// One of the three oscillator positions in the voice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    One,
    Two,
    Three,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::One, Slot::Two, Slot::Three];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Slot::One => 0,
            Slot::Two => 1,
            Slot::Three => 2,
        }
    }

    #[inline]
    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

/// Every engine parameter as one value: the voice architecture plus master volume.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Patch {
    pub oscillators: [Oscillator; 3],
    pub envelope: Envelope,
    master_volume: f64,
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            oscillators: [Oscillator::default(); 3],
            envelope: Envelope::default(),
            master_volume: 0.5,
        }
    }
}

impl Patch {
    /// Default patch with the three slots set to the given waveforms.
    pub fn with_waveforms(waves: [Waveform; 3]) -> Self {
        Self { oscillators: waves.map(Oscillator::new), ..Self::default() }
    }

    #[inline] pub fn master_volume(&self) -> f64 { self.master_volume }
    #[inline] pub fn set_master_volume(&mut self, v: f64) { self.master_volume = clamp(v, 0.0, 1.0); }

    #[inline] pub fn oscillator(&self, slot: Slot) -> &Oscillator { &self.oscillators[slot.index()] }
    #[inline] pub fn oscillator_mut(&mut self, slot: Slot) -> &mut Oscillator { &mut self.oscillators[slot.index()] }
}

/// Everything the lock protects.
struct Voices<C> {
    patch: Patch,
    notes: NoteRegistry,
    clock: C,
    rng: StdRng,
}

impl<C: SampleClock> Voices<C> {
    /// One mixing pass: evaluate every note at the current clock time, retire
    /// released notes that have gone silent, then advance the clock.
    fn next_sample(&mut self) -> f64 {
        let now = self.clock.now();
        let Self { patch, notes, rng, .. } = &mut *self;

        let mut mix = 0.0;
        for note in notes.iter_mut() {
            let amp = patch.envelope.amplitude(now, note.on, note.off);
            if amp == 0.0 && note.is_retirable() {
                note.active = false;
            }

            // elapsed time is passed as on - now (negative); phases are built from it as-is
            let elapsed = note.on - now;
            let mut voice = 0.0;
            for osc in &patch.oscillators {
                let hz = scale_to_hz(note.key.saturating_add(osc.tune())) + osc.fine_tune();
                voice += osc.evaluate(elapsed, hz, &mut *rng);
            }
            mix += amp * patch.master_volume * voice;
        }

        let retired = notes.prune();
        if retired > 0 {
            trace!(retired, time = now, "retired silent notes");
        }
        self.clock.advance();
        mix
    }
}

/// Thread-safe synth. Share it with `Arc` between the control and audio threads.
pub struct Synth<C: SampleClock = FixedRateClock> {
    state: Mutex<Voices<C>>,
}

impl Synth<FixedRateClock> {
    /// Default patch, clocked at the device's `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self::with_patch(sample_rate, Patch::default())
    }

    pub fn with_patch(sample_rate: u32, patch: Patch) -> Self {
        Self::with_clock(FixedRateClock::new(sample_rate), patch)
    }
}

impl<C: SampleClock> Synth<C> {
    /// Build around an injected clock source.
    pub fn with_clock(clock: C, patch: Patch) -> Self {
        Self {
            state: Mutex::new(Voices {
                patch,
                notes: NoteRegistry::default(),
                clock,
                rng: StdRng::from_entropy(),
            }),
        }
    }

    /// Make the noise waveform reproducible.
    pub fn reseed(&self, seed: u64) {
        self.state.lock().rng = StdRng::seed_from_u64(seed);
    }

    // ------------------------------------------------------------------ notes

    /// Start `key`, or restart it (no duplicate voice) if it is already sounding.
    pub fn trigger(&self, key: i32) {
        let (now, created) = {
            let mut s = self.state.lock();
            let now = s.clock.now();
            (now, s.notes.trigger(key, now))
        };
        debug!(key, time = now, retrigger = !created, "note on");
    }

    /// Begin the release tail of every entry for `key`.
    pub fn release(&self, key: i32) {
        let (now, hits) = {
            let mut s = self.state.lock();
            let now = s.clock.now();
            (now, s.notes.release(key, now))
        };
        debug!(key, time = now, matched = hits, "note off");
    }

    /// Release every note currently in the registry.
    pub fn release_all(&self) {
        let (now, hits) = {
            let mut s = self.state.lock();
            let now = s.clock.now();
            (now, s.notes.release_all(now))
        };
        debug!(time = now, matched = hits, "all notes off");
    }

    /// Drop every note without a release tail.
    pub fn silence(&self) {
        self.state.lock().notes.clear();
        debug!("all notes cut");
    }

    pub fn active_notes(&self) -> usize {
        self.state.lock().notes.len()
    }

    pub fn is_sounding(&self, key: i32) -> bool {
        self.state.lock().notes.contains(key)
    }

    /// Snapshot of the registry entry for `key`.
    pub fn note(&self, key: i32) -> Option<Note> {
        self.state.lock().notes.get(key).copied()
    }

    // ------------------------------------------------------------------ clock

    /// Current sample-clock time in seconds.
    pub fn time(&self) -> f64 {
        self.state.lock().clock.now()
    }

    // -------------------------------------------------------------- rendering

    /// Produce one sample and advance the clock.
    pub fn next_sample(&self) -> f64 {
        self.state.lock().next_sample()
    }

    /// Fill a mono buffer.
    pub fn render(&self, out: &mut [f32]) {
        self.render_interleaved_with(out, 1, |s| s as f32);
    }

    /// Fill an interleaved buffer, duplicating the mono sample across `channels`.
    pub fn render_interleaved(&self, out: &mut [f32], channels: usize) {
        self.render_interleaved_with(out, channels, |s| s as f32);
    }

    /// Fill an interleaved buffer of any sample type. `convert` maps the
    /// engine's native `f64` sample to the output format; the lock is held
    /// once for the whole buffer.
    pub fn render_interleaved_with<T: Copy>(
        &self,
        out: &mut [T],
        channels: usize,
        mut convert: impl FnMut(f64) -> T,
    ) {
        let channels = channels.max(1);
        let mut s = self.state.lock();
        for frame in out.chunks_mut(channels) {
            let v = convert(s.next_sample());
            frame.fill(v);
        }
    }

    // ------------------------------------------------------------- parameters

    pub fn patch(&self) -> Patch {
        self.state.lock().patch
    }

    pub fn set_patch(&self, patch: Patch) {
        self.state.lock().patch = patch;
        debug!(?patch, "patch replaced");
    }

    pub fn master_volume(&self) -> f64 {
        self.state.lock().patch.master_volume()
    }

    pub fn set_master_volume(&self, v: f64) {
        self.state.lock().patch.set_master_volume(v);
    }

    pub fn oscillator(&self, slot: Slot) -> Oscillator {
        *self.state.lock().patch.oscillator(slot)
    }

    pub fn envelope(&self) -> Envelope {
        self.state.lock().patch.envelope
    }

    /// Apply clamped setters to one oscillator under the lock.
    ///
    /// ```
    /// use triad_engine::{Slot, Synth, Waveform};
    /// let synth = Synth::new(44_100);
    /// synth.edit_oscillator(Slot::Two, |osc| {
    ///     osc.set_waveform(Waveform::Saw);
    ///     osc.set_tune(12);
    /// });
    /// assert_eq!(synth.oscillator(Slot::Two).tune(), 12);
    /// ```
    pub fn edit_oscillator<R>(&self, slot: Slot, f: impl FnOnce(&mut Oscillator) -> R) -> R {
        f(self.state.lock().patch.oscillator_mut(slot))
    }

    /// Apply clamped setters to the shared envelope under the lock.
    pub fn edit_envelope<R>(&self, f: impl FnOnce(&mut Envelope) -> R) -> R {
        f(&mut self.state.lock().patch.envelope)
    }
}

impl<C: SampleClock> core::fmt::Debug for Synth<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = self.state.lock();
        f.debug_struct("Synth")
            .field("time", &s.clock.now())
            .field("notes", &s.notes.len())
            .field("patch", &s.patch)
            .finish()
    }
}

// ------------------------------------ Tests --------------------------------------
