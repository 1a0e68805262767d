//! Triad CLI: play a note sequence live through cpal, or render it to WAV.

mod args;
mod audio;
mod render;
mod score;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args::Args;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_devices {
        audio::list_output_devices()?;
        return Ok(());
    }

    let patch = args.patch();
    let score = args.score();
    info!(notes = ?args.notes, cues = score.cues().len(), seconds = score.end(), "score ready");

    if let Some(path) = &args.render {
        render::render_to_wav(
            path,
            args.sample_rate.unwrap_or(render::DEFAULT_SAMPLE_RATE),
            args.channels.unwrap_or(1),
            patch,
            args.seed,
            &score,
        )
        .with_context(|| format!("rendering to {}", path.display()))?;
        return Ok(());
    }

    audio::play(
        args.device.as_deref(),
        args.sample_rate,
        args.channels,
        patch,
        args.seed,
        &score,
    )
}
