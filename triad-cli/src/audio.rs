//! Live playback: device selection, stream setup, and the control-thread
//! sequencer that feeds note events while cpal pulls samples.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};
use triad_engine::{Patch, Synth};

use crate::score::{NoteEvent, Score};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no default output device")]
    NoDevice,

    #[error("requested device not found: {0}")]
    DeviceNotFound(String),

    #[error("no supported output configs")]
    NoConfig,

    #[error("unsupported device sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error(transparent)]
    Devices(#[from] cpal::DevicesError),

    #[error(transparent)]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error(transparent)]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error(transparent)]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),
}

pub fn list_output_devices() -> Result<(), AudioError> {
    let host = cpal::default_host();
    println!("Available output devices:");
    for dev in host.output_devices()? {
        println!("- {}", dev.name()?);
    }
    Ok(())
}

fn pick_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    if let Some(name) = name {
        for d in host.output_devices()? {
            if d.name()? == name {
                return Ok(d);
            }
        }
        return Err(AudioError::DeviceNotFound(name.to_string()));
    }
    host.default_output_device().ok_or(AudioError::NoDevice)
}

fn choose_config(
    device: &cpal::Device,
    req_sr: Option<u32>,
    req_ch: Option<u16>,
) -> Result<cpal::SupportedStreamConfig, AudioError> {
    // If nothing requested, default is already concrete.
    if req_sr.is_none() && req_ch.is_none() {
        return Ok(device.default_output_config()?);
    }

    // Pick the closest SupportedStreamConfigRange first.
    let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
    for range in device.supported_output_configs()? {
        let ch = range.channels();
        let sr_min = range.min_sample_rate().0;
        let sr_max = range.max_sample_rate().0;

        let ch_pen = req_ch.map_or(0, |c| u64::from(ch.abs_diff(c)));
        let sr_pen = match req_sr {
            Some(sr) if !(sr_min..=sr_max).contains(&sr) => {
                u64::from(sr_min.abs_diff(sr).min(sr_max.abs_diff(sr)))
            }
            _ => 0,
        };

        let score = sr_pen.saturating_mul(1000) + ch_pen;
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((score, range));
        }
    }

    let (_, range) = best.ok_or(AudioError::NoConfig)?;

    // Concrete rate: the requested one clamped into the range, else the top of it.
    let pick_sr = match req_sr {
        Some(sr) => cpal::SampleRate(sr.clamp(range.min_sample_rate().0, range.max_sample_rate().0)),
        None => range.max_sample_rate(),
    };

    Ok(range.with_sample_rate(pick_sr))
}

/// Peak level over roughly one second of frames.
struct PeakMeter {
    interval: usize,
    frames: usize,
    peak: f32,
}

impl PeakMeter {
    fn new(interval: usize) -> Self {
        Self { interval: interval.max(1), frames: 0, peak: 0.0 }
    }

    /// Fold in one buffer; returns the peak once per interval.
    fn push(&mut self, frames: usize, peak: f32) -> Option<f32> {
        self.peak = self.peak.max(peak);
        self.frames += frames;
        if self.frames < self.interval {
            return None;
        }
        let p = self.peak;
        self.frames = 0;
        self.peak = 0.0;
        Some(p)
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    synth: Arc<Synth>,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::SizedSample + cpal::FromSample<f32> + Send + 'static,
{
    let channels = usize::from(cfg.channels.max(1));
    let mut meter = PeakMeter::new(cfg.sample_rate.0 as usize);

    let stream = device.build_output_stream(
        cfg,
        move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut peak = 0.0f32;
            synth.render_interleaved_with(output, channels, |s| {
                #[allow(clippy::cast_possible_truncation)]
                let s = (s as f32).clamp(-1.0, 1.0);
                peak = peak.max(s.abs());
                T::from_sample(s)
            });
            if let Some(p) = meter.push(output.len() / channels, peak) {
                debug!(peak = p, "meter");
            }
        },
        |e| error!("stream error: {e}"),
        None,
    )?;

    Ok(stream)
}

/// Open the device, start the stream, and perform `score` from this thread.
pub fn play(
    device_name: Option<&str>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
    patch: Patch,
    seed: Option<u64>,
    score: &Score,
) -> anyhow::Result<()> {
    let device = pick_device(device_name)?;
    let sup_cfg = choose_config(&device, sample_rate, channels)?;
    let sample_format = sup_cfg.sample_format();
    let cfg = sup_cfg.config();

    // The clock must run at the rate the device actually accepted.
    let synth = Arc::new(Synth::with_patch(cfg.sample_rate.0, patch));
    if let Some(seed) = seed {
        synth.reseed(seed);
    }

    info!(
        device = %device.name()?,
        sample_rate = cfg.sample_rate.0,
        channels = cfg.channels,
        format = ?sample_format,
        "output stream configured"
    );

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &cfg, Arc::clone(&synth))?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &cfg, Arc::clone(&synth))?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &cfg, Arc::clone(&synth))?,
        other => return Err(AudioError::UnsupportedFormat(other).into()),
    };
    stream.play().context("starting output stream")?;

    perform(&synth, score);
    info!(time = synth.time(), "done");
    Ok(())
}

/// Control-thread sequencer: sleep to each cue's wall-clock time, then fire it.
fn perform(synth: &Synth, score: &Score) {
    let start = Instant::now();
    let wait_until = |at: f64| {
        let due = Duration::from_secs_f64(at.max(0.0));
        if let Some(rest) = due.checked_sub(start.elapsed()) {
            thread::sleep(rest);
        }
    };

    for cue in score.cues() {
        wait_until(cue.at);
        match cue.event {
            NoteEvent::On(key) => synth.trigger(key),
            NoteEvent::Off(key) => synth.release(key),
        }
    }
    wait_until(score.end());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_reports_once_per_interval() {
        let mut m = PeakMeter::new(100);
        assert_eq!(m.push(60, 0.3), None);
        assert_eq!(m.push(60, 0.1), Some(0.3));
        assert_eq!(m.push(99, 0.2), None);
        assert_eq!(m.push(1, 0.05), Some(0.2));
    }

    #[test]
    fn perform_fires_every_cue() {
        let synth = Synth::new(44_100);
        let score = Score::arpeggio(&[0, 4], 0.0, 0.0, 0.0);
        perform(&synth, &score);
        // released at the same clock instant they were triggered: still registered
        assert_eq!(synth.active_notes(), 2);
        assert!(synth.note(4).unwrap().off.is_some());
    }
}
