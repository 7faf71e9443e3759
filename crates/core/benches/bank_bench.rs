// Performance benchmarks for the filter bank
//
// Run with: cargo bench --bench bank_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use emafilters_core::*;
use std::hint::black_box;

fn test_signal(len: usize) -> Vec<Sample> {
    (0..len).map(|i| ((i * 7919) % 4001) as Sample - 2000).collect()
}

fn bench_single_lowpass(c: &mut Criterion) {
    let mut group = c.benchmark_group("lowpass_k5");
    let samples = test_signal(1000);

    for repr in Representation::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(repr.suffix()), &repr, |b, &repr| {
            let mut chain = LowpassChain::new(repr, GainExponent::of(5), CascadeOrder::Single);
            b.iter(|| {
                for &x in &samples {
                    chain.update(black_box(x), Rounding::Reference);
                }
                black_box(chain.reading(CascadeOrder::Single));
            });
        });
    }

    group.finish();
}

fn bench_cascade_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_int16_k3");
    let samples = test_signal(1000);

    for order in [CascadeOrder::Single, CascadeOrder::Double, CascadeOrder::Triple] {
        group.bench_with_input(BenchmarkId::from_parameter(order.stages()), &order, |b, &order| {
            let mut chain = Cascade::<Int16>::new(GainExponent::of(3), order);
            b.iter(|| {
                for &x in &samples {
                    chain.update(black_box(x), Rounding::Reference);
                }
                black_box(*chain.stage(order));
            });
        });
    }

    group.finish();
}

fn bench_biquad(c: &mut Criterion) {
    let samples = test_signal(1000);
    let coeffs = BiquadCoeffs::default();

    c.bench_function("svf_int16_1000_samples", |b| {
        let mut svf = SvfInt16::new(coeffs.alpha_shift);
        b.iter(|| {
            for &x in &samples {
                svf.update(black_box(x), Rounding::Reference);
            }
            black_box(svf.output(BiquadOutput::Bandpass));
        });
    });

    c.bench_function("svf_q8_1000_samples", |b| {
        let mut svf = SvfQ8::new(&coeffs);
        b.iter(|| {
            for &x in &samples {
                svf.update(black_box(x));
            }
            black_box(svf.output(BiquadOutput::Bandpass));
        });
    });
}

fn bench_standard_bank(c: &mut Criterion) {
    let samples = test_signal(1000);

    c.bench_function("standard_bank_step_1000_samples", |b| {
        let mut bank = FilterBank::standard();
        b.iter(|| {
            for &x in &samples {
                bank.step(black_box(x));
            }
        });
    });

    c.bench_function("standard_bank_read_all", |b| {
        let mut bank = FilterBank::standard();
        bank.step(1000);
        b.iter(|| {
            let values: Vec<_> = bank.selected().collect();
            black_box(values);
        });
    });

    c.bench_function("standard_bank_step_timed_1000_samples", |b| {
        let mut config = BankConfig::factory_default();
        config.measure_timing = true;
        let mut bank = match FilterBank::new(config) {
            Ok(bank) => bank,
            Err(e) => panic!("factory default rejected: {}", e),
        };
        b.iter(|| {
            for &x in &samples {
                bank.step(black_box(x));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_single_lowpass,
    bench_cascade_depth,
    bench_biquad,
    bench_standard_bank
);
criterion_main!(benches);
