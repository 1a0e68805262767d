//! Command-line flags and their mapping onto a [`Patch`] and a [`Score`].

use std::path::PathBuf;

use clap::Parser;
use triad_engine::{Patch, Slot, Waveform};

use crate::score::Score;

#[derive(Parser, Debug)]
#[command(name = "triad")]
#[command(author, version, about = "Three-oscillator polyphonic synth: play live or render to WAV", long_about = None)]
pub struct Args {
    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Output device name (default device if omitted)
    #[arg(long)]
    pub device: Option<String>,

    /// Requested sample rate; the device may settle on a nearby one
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Requested channel count (the mono voice is duplicated)
    #[arg(long)]
    pub channels: Option<u16>,

    /// Note ids to play, in semitones from middle C
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0, 4, 7, 12])]
    pub notes: Vec<i32>,

    /// Seconds each note is held
    #[arg(long, default_value_t = 0.4)]
    pub note_length: f64,

    /// Seconds between the release of one note and the next trigger
    #[arg(long, default_value_t = 0.1)]
    pub gap: f64,

    /// Play all notes together as a chord
    #[arg(long)]
    pub hold: bool,

    /// Extra seconds after the last release
    #[arg(long, default_value_t = 0.5)]
    pub tail: f64,

    /// Waveform per slot (sine, square, saw, triangle, analog-saw, noise); one value sets all three
    #[arg(long, value_delimiter = ',', value_parser = parse_waveform)]
    pub waves: Vec<Waveform>,

    /// Amplitude per slot, 0..1
    #[arg(long, value_delimiter = ',')]
    pub amplitudes: Vec<f64>,

    /// Semitone offset per slot, -36..36
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub tunes: Vec<i32>,

    /// Fine tune per slot in Hz, -1..1
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub fine: Vec<f64>,

    /// Vibrato for every slot as HZ:DEPTH
    #[arg(long, value_parser = parse_lfo)]
    pub vibrato: Option<(f64, f64)>,

    /// Tremolo for every slot as HZ:DEPTH
    #[arg(long, value_parser = parse_lfo)]
    pub tremolo: Option<(f64, f64)>,

    /// Harmonics for analog-saw slots, 2..100
    #[arg(long)]
    pub partials: Option<u32>,

    /// Attack time in seconds
    #[arg(long)]
    pub attack: Option<f64>,

    /// Decay time in seconds
    #[arg(long)]
    pub decay: Option<f64>,

    /// Sustain level, 0..1
    #[arg(long)]
    pub sustain: Option<f64>,

    /// Level reached at the end of the attack, 0..1
    #[arg(long)]
    pub start: Option<f64>,

    /// Release time in seconds
    #[arg(long)]
    pub release: Option<f64>,

    /// Master volume, 0..1
    #[arg(long)]
    pub volume: Option<f64>,

    /// Render to this 16-bit WAV file instead of playing
    #[arg(long, value_name = "PATH")]
    pub render: Option<PathBuf>,

    /// Seed for the noise waveform
    #[arg(long)]
    pub seed: Option<u64>,
}

fn parse_waveform(s: &str) -> Result<Waveform, String> {
    Waveform::from_name(s).ok_or_else(|| {
        let names: Vec<&str> = Waveform::ALL.iter().map(|w| w.name()).collect();
        format!("unknown waveform '{s}' (expected one of: {})", names.join(", "))
    })
}

fn parse_lfo(s: &str) -> Result<(f64, f64), String> {
    let (hz, depth) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid LFO '{s}' (expected HZ:DEPTH)"))?;
    let hz = hz.trim().parse::<f64>().map_err(|e| format!("invalid LFO rate '{hz}': {e}"))?;
    let depth = depth.trim().parse::<f64>().map_err(|e| format!("invalid LFO depth '{depth}': {e}"))?;
    Ok((hz, depth))
}

/// Per-slot value: a single entry applies to every slot.
fn per_slot<T: Copy>(values: &[T], slot: Slot) -> Option<T> {
    match values {
        [] => None,
        [only] => Some(*only),
        many => many.get(slot.index()).copied(),
    }
}

impl Args {
    /// Default patch with every given flag applied through the clamped setters.
    pub fn patch(&self) -> Patch {
        let mut patch = Patch::default();
        for slot in Slot::ALL {
            let osc = patch.oscillator_mut(slot);
            if let Some(w) = per_slot(&self.waves, slot) { osc.set_waveform(w); }
            if let Some(a) = per_slot(&self.amplitudes, slot) { osc.set_amplitude(a); }
            if let Some(t) = per_slot(&self.tunes, slot) { osc.set_tune(t); }
            if let Some(f) = per_slot(&self.fine, slot) { osc.set_fine_tune(f); }
            if let Some((hz, depth)) = self.vibrato {
                osc.set_vibrato_frequency(hz);
                osc.set_vibrato_depth(depth);
            }
            if let Some((hz, depth)) = self.tremolo {
                osc.set_tremolo_frequency(hz);
                osc.set_tremolo_depth(depth);
            }
            if let Some(n) = self.partials { osc.set_partials(n); }
        }

        let env = &mut patch.envelope;
        if let Some(v) = self.attack  { env.set_attack(v); }
        if let Some(v) = self.decay   { env.set_decay(v); }
        if let Some(v) = self.sustain { env.set_sustain_amplitude(v); }
        if let Some(v) = self.start   { env.set_start_amplitude(v); }
        if let Some(v) = self.release { env.set_release(v); }
        if let Some(v) = self.volume  { patch.set_master_volume(v); }
        patch
    }

    pub fn score(&self) -> Score {
        if self.hold {
            Score::chord(&self.notes, self.note_length, self.tail)
        } else {
            Score::arpeggio(&self.notes, self.note_length, self.gap, self.tail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("triad").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_give_default_patch() {
        let a = parse(&[]);
        assert_eq!(a.patch(), Patch::default());
        assert_eq!(a.notes, vec![0, 4, 7, 12]);
        assert!(a.render.is_none());
    }

    #[test]
    fn per_slot_lists_and_broadcast() {
        let a = parse(&["--waves", "saw,square,analog-saw", "--amplitudes", "0.5", "--tunes", "-12,0,7"]);
        let p = a.patch();
        assert_eq!(p.oscillator(Slot::One).waveform(), Waveform::Saw);
        assert_eq!(p.oscillator(Slot::Three).waveform(), Waveform::AnalogSaw);
        assert!(p.oscillators.iter().all(|o| o.amplitude() == 0.5));
        assert_eq!(p.oscillator(Slot::One).tune(), -12);
        assert_eq!(p.oscillator(Slot::Three).tune(), 7);
    }

    #[test]
    fn out_of_range_flags_are_clamped() {
        let a = parse(&["--volume", "3", "--attack", "10", "--tunes", "99", "--vibrato", "500:2"]);
        let p = a.patch();
        assert_eq!(p.master_volume(), 1.0);
        assert_eq!(p.envelope.attack(), 5.0);
        assert_eq!(p.oscillator(Slot::Two).tune(), 36);
        assert_eq!(p.oscillator(Slot::Two).vibrato_frequency(), 100.0);
        assert_eq!(p.oscillator(Slot::Two).vibrato_depth(), 1.0);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(Args::try_parse_from(["triad", "--waves", "pulse"]).is_err());
        assert!(Args::try_parse_from(["triad", "--tremolo", "5"]).is_err());
        assert!(Args::try_parse_from(["triad", "--tremolo", "x:0.1"]).is_err());
    }

    #[test]
    fn negative_notes_parse() {
        let a = parse(&["--notes", "-12,-5,0", "--hold"]);
        assert_eq!(a.notes, vec![-12, -5, 0]);
        assert_eq!(a.score().cues().len(), 6);
    }
}
