//! Offline rendering of a [`Score`] to a 16-bit PCM WAV file.
//!
//! No device is involved: the synth clock is advanced block by block up to
//! each cue, so the output is sample-exact and independent of wall time.

use std::path::{Path, PathBuf};

use tracing::info;
use triad_core::dsp::to_i16;
use triad_engine::{Patch, Synth};

use crate::score::{NoteEvent, Score};

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

const BLOCK_FRAMES: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("writing {}: {source}", .path.display())]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

struct Writer<'a> {
    path: &'a Path,
    wav: hound::WavWriter<std::io::BufWriter<std::fs::File>>,
    channels: usize,
    buf: Vec<i16>,
    frames: u64,
}

impl Writer<'_> {
    fn wrap(&self, source: hound::Error) -> RenderError {
        RenderError::Wav { path: self.path.to_path_buf(), source }
    }

    /// Render and write `frames` frames.
    fn run(&mut self, synth: &Synth, mut frames: u64) -> Result<(), RenderError> {
        while frames > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let n = frames.min(BLOCK_FRAMES as u64) as usize;
            self.buf.resize(n * self.channels, 0);
            synth.render_interleaved_with(&mut self.buf, self.channels, to_i16);
            for &s in &self.buf {
                if let Err(e) = self.wav.write_sample(s) {
                    return Err(self.wrap(e));
                }
            }
            frames -= n as u64;
            self.frames += n as u64;
        }
        Ok(())
    }
}

/// Perform `score` into `path`. Returns the number of frames written.
pub fn render_to_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    patch: Patch,
    seed: Option<u64>,
    score: &Score,
) -> Result<u64, RenderError> {
    let sample_rate = sample_rate.max(1);
    let channels = channels.max(1);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav = hound::WavWriter::create(path, spec)
        .map_err(|source| RenderError::Wav { path: path.to_path_buf(), source })?;

    let synth = Synth::with_patch(sample_rate, patch);
    if let Some(seed) = seed {
        synth.reseed(seed);
    }

    let mut w = Writer {
        path,
        wav,
        channels: usize::from(channels),
        buf: Vec::with_capacity(BLOCK_FRAMES * usize::from(channels)),
        frames: 0,
    };

    let sr = f64::from(sample_rate);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let frame_at = |t: f64| (t.max(0.0) * sr).round() as u64;

    for cue in score.cues() {
        let due = frame_at(cue.at);
        w.run(&synth, due.saturating_sub(w.frames))?;
        match cue.event {
            NoteEvent::On(key) => synth.trigger(key),
            NoteEvent::Off(key) => synth.release(key),
        }
    }
    w.run(&synth, frame_at(score.end()).saturating_sub(w.frames))?;

    let frames = w.frames;
    w.wav.finalize().map_err(|source| RenderError::Wav { path: path.to_path_buf(), source })?;

    info!(path = %path.display(), frames, sample_rate, channels, "render complete");
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_wav(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("triad-{}-{name}.wav", std::process::id()))
    }

    #[test]
    fn writes_expected_length_and_format() {
        let path = temp_wav("len");
        let score = Score::arpeggio(&[0, 4], 0.25, 0.05, 0.2);
        let frames = render_to_wav(&path, 8_000, 2, Patch::default(), Some(7), &score).unwrap();

        // last release at 0.55 s, plus 0.2 s tail
        assert_eq!(frames, 6_000);

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 8_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 12_000);

        let samples: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
        assert!(samples.chunks(2).all(|f| f[0] == f[1]));
        assert!(samples.iter().any(|&s| s != 0));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn silent_after_release_tail() {
        let path = temp_wav("tail");
        let mut patch = Patch::default();
        patch.envelope.set_release(0.1);
        let score = Score::chord(&[0], 0.2, 0.5);
        render_to_wav(&path, 8_000, 1, patch, None, &score).unwrap();

        let samples: Vec<i16> = hound::WavReader::open(&path)
            .unwrap()
            .into_samples::<i16>()
            .map(Result::unwrap)
            .collect();
        assert_eq!(samples.len(), 5_600);
        // released at 0.2 s, release lasts 0.1 s
        assert!(samples[2_500..].iter().all(|&s| s == 0));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn repeated_key_without_gap_sounds_twice() {
        let path = temp_wav("retrigger");
        let score = Score::arpeggio(&[3, 3], 0.5, 0.0, 0.2);
        let frames = render_to_wav(&path, 8_000, 1, Patch::default(), None, &score).unwrap();
        assert_eq!(frames, 9_600);

        let samples: Vec<i16> = hound::WavReader::open(&path)
            .unwrap()
            .into_samples::<i16>()
            .map(Result::unwrap)
            .collect();
        // retriggered at 0.5 s: past its new attack it must be audible
        assert!(samples[4_800..8_000].iter().any(|&s| s != 0));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unwritable_path_reports_the_path() {
        let path = Path::new("/nonexistent-dir/triad/out.wav");
        let err = render_to_wav(path, 8_000, 1, Patch::default(), None, &Score::default()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent-dir/triad/out.wav"));
    }
}
