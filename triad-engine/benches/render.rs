use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use triad_engine::{Patch, Synth, Waveform};

const BLOCK: usize = 512;

fn render_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_512");
    for voices in [1, 8, 32] {
        for wave in [Waveform::Sine, Waveform::AnalogSaw] {
            let synth = Synth::with_patch(48_000, Patch::with_waveforms([wave; 3]));
            for k in 0..voices {
                synth.trigger(k);
            }
            let mut buf = vec![0.0f32; BLOCK];
            group.bench_with_input(
                BenchmarkId::new(wave.name(), voices),
                &voices,
                |b, _| b.iter(|| synth.render(black_box(&mut buf))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, render_block);
criterion_main!(benches);
