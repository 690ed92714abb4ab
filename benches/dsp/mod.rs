use std::hint::black_box;

use ambient_dsp::dsp::filter::SVFilter;
use ambient_dsp::dsp::reverb::SchroederReverb;
use ambient_dsp::graph::node::RenderCtx;
use ambient_dsp::FilterType;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn ramp(size: usize) -> Vec<f32> {
    (0..size).map(|i| (i as f32 / size as f32) * 2.0 - 1.0).collect()
}

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0);

    for &size in BLOCK_SIZES {
        let input = ramp(size);
        for filter_type in [FilterType::LowPass, FilterType::HighPass, FilterType::BandPass] {
            let mut filter = SVFilter::new(filter_type, 1000.0);
            filter.set_q(6.0);
            let mut buffer = input.clone();
            let id = BenchmarkId::new(format!("{filter_type:?}").to_lowercase(), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer), black_box(&ctx));
                })
            });
        }
    }

    group.finish();
}

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| if i < 8 { 1.0 } else { (i as f32 * 0.05).sin() * 0.1 })
            .collect();

        for decay in [1.0, 8.0] {
            let Ok(mut reverb) = SchroederReverb::with_decay(SAMPLE_RATE, decay) else {
                continue;
            };
            let id = BenchmarkId::new(format!("decay_{decay}s"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| {
                    input
                        .iter()
                        .map(|&sample| reverb.process(black_box(sample)))
                        .sum::<f32>()
                })
            });
        }
    }

    group.finish();
}
