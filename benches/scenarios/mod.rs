//! Whole-engine render paths with everything sounding.

use std::hint::black_box;

use ambient_dsp::chain::SignalChain;
use ambient_dsp::drums::DrumKit;
use ambient_dsp::synth::VoiceBank;
use ambient_dsp::{
    ConfigPatch, DrumConfig, Engine, OfflineBackend, PatternKind, SoundParameters, TimbreConfig,
};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

/// Voice bank into the chain: the tonal half of a render pass.
pub fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chain");
    let config = TimbreConfig::default();
    let params = SoundParameters::new(300.0, 3.0, 5.0);

    for &size in BLOCK_SIZES {
        let mut bank = VoiceBank::new(SAMPLE_RATE, &config);
        let (mut chain, _waveform) = SignalChain::new(SAMPLE_RATE, &config);
        bank.trigger(params.chord(config.harmonicity));
        bank.trigger_modulator(params.modulation);
        chain.set_resonance(params.resonance);

        let mut buffer = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("chord_through_reverb", size), &size, |b, _| {
            b.iter(|| {
                let modulation = bank.render(black_box(&mut buffer));
                chain.render(black_box(&mut buffer), modulation);
            })
        });
    }

    group.finish();
}

/// Drum kit with a hit on every sixteenth, so the split path always runs.
pub fn bench_kit(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/kit");
    let config = DrumConfig::default();

    for &size in BLOCK_SIZES {
        let (mut kit, _beats) = DrumKit::new(SAMPLE_RATE, &config);
        let mut buffer = vec![0.0f32; size];
        let mut next_hit = 0.0f64;
        let sixteenth = 15.0 / config.tempo as f64;

        group.bench_with_input(BenchmarkId::new("sixteenths", size), &size, |b, _| {
            b.iter(|| {
                let now = kit.frame() as f64 / SAMPLE_RATE as f64;
                while next_hit < now + size as f64 / SAMPLE_RATE as f64 {
                    kit.trigger_hihat(next_hit.max(now));
                    next_hit += sixteenth;
                }
                kit.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}

/// The full graph through the offline backend: chord, modulator, reverb
/// and the breakbeat pattern in stereo.
pub fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/graph");

    for &size in BLOCK_SIZES {
        let mut engine = Engine::new(OfflineBackend::new(SAMPLE_RATE).with_channels(2));
        engine.set_config(ConfigPatch::new().drum_pattern(PatternKind::Breakbeat).tempo(140.0));
        if engine.play(SoundParameters::new(300.0, 3.0, 5.0)).is_err() {
            continue;
        }

        group.bench_with_input(BenchmarkId::new("breakbeat_stereo", size), &size, |b, _| {
            b.iter(|| black_box(engine.backend_mut().render(size)))
        });
    }

    group.finish();
}
