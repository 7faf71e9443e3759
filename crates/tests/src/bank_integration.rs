//! Integration tests for the filter bank
//!
//! These tests drive complete banks through step, impulse and random
//! sequences and check the behavioural guarantees of every filter family.

use emafilters_core::{
    BankConfig, BiquadCoeffs, BiquadOutput, BiquadVariant, CascadeOrder, FilterBank, FilterId,
    GainExponent, Preset, Reading, Representation, Rounding, Sample, SelectionMask,
};
use proptest::prelude::*;
use tempfile::TempDir;

const fn k(exponent: u8) -> GainExponent {
    GainExponent::of(exponent)
}

fn bank_of(filters: Vec<FilterId>) -> FilterBank {
    FilterBank::new(BankConfig::with_filters(filters)).unwrap()
}

fn trace(bank: &mut FilterBank, id: FilterId, input: &[Sample]) -> Vec<f64> {
    input
        .iter()
        .map(|&x| {
            bank.step(x);
            bank.value(id).unwrap().as_f64()
        })
        .collect()
}

fn step_signal(zeros: usize, level: Sample, len: usize) -> Vec<Sample> {
    (0..len).map(|n| if n < zeros { 0 } else { level }).collect()
}

// ============================================================================
// CONVERGENCE
// ============================================================================

#[test]
fn test_every_lowpass_converges_without_overshoot() {
    let mut bank = FilterBank::standard();
    let lowpasses: Vec<FilterId> = bank
        .filters()
        .iter()
        .copied()
        .filter(|id| matches!(id, FilterId::Lowpass { .. }))
        .collect();

    let mut previous: Vec<f64> = vec![0.0; lowpasses.len()];
    for _ in 0..5000 {
        bank.step(1000);
        for (i, id) in lowpasses.iter().enumerate() {
            let value = bank.value(*id).unwrap().as_f64();
            assert!(value >= previous[i], "{} decreased", id);
            assert!(value <= 1000.0, "{} overshot: {}", id, value);
            previous[i] = value;
        }
    }

    for (id, value) in lowpasses.iter().zip(&previous) {
        // Each 16-bit stage may settle up to 2^(k-1) below its own target
        let quantum = match id {
            FilterId::Lowpass {
                repr: Representation::Int16,
                exponent,
                order,
            } => f64::from(1u32 << (exponent.get() - 1)) * order.stages() as f64,
            _ => 1.0,
        };
        assert!(1000.0 - value <= quantum, "{} settled at {}", id, value);
    }
}

#[test]
fn test_representations_agree_on_step_input() {
    let input = step_signal(50, 1000, 100);
    let reprs = [
        (Representation::Int16, 16.0),
        (Representation::Q8, 1.5),
        (Representation::Q16, 1.5),
    ];
    let float_id = FilterId::lowpass(Representation::Float, k(5));
    let float = trace(&mut bank_of(vec![float_id]), float_id, &input);

    for (repr, tolerance) in reprs {
        let id = FilterId::lowpass(repr, k(5));
        let values = trace(&mut bank_of(vec![id]), id, &input);
        for (n, (a, b)) in values.iter().zip(&float).enumerate() {
            assert!((a - b).abs() <= tolerance, "{:?} sample {}: {} vs {}", repr, n, a, b);
        }
    }
}

#[test]
fn test_cascades_rise_slower() {
    let ids = [
        FilterId::lowpass(Representation::Int16, k(3)),
        FilterId::cascade(Representation::Int16, k(3), CascadeOrder::Double),
        FilterId::cascade(Representation::Int16, k(3), CascadeOrder::Triple),
    ];
    let mut bank = bank_of(ids.to_vec());

    let mut rise = [None; 3];
    for n in 1..=200 {
        bank.step(1000);
        let values: Vec<f64> = ids.iter().map(|id| bank.value(*id).unwrap().as_f64()).collect();

        assert!(values[2] <= values[1] && values[1] <= values[0] && values[0] <= 1000.0);
        for (slot, value) in rise.iter_mut().zip(&values) {
            if slot.is_none() && *value >= 900.0 {
                *slot = Some(n);
            }
        }
    }

    let [single, double, triple] = rise.map(|r| r.expect("never reached 900"));
    assert!(single < double && double < triple, "{} {} {}", single, double, triple);
}

// ============================================================================
// DERIVED SIGNALS
// ============================================================================

proptest! {
    #[test]
    fn prop_highpass_reconstructs_sample(
        input in proptest::collection::vec(any::<i16>(), 1..200),
        exponent in 1u8..=8,
        uniform in any::<bool>(),
    ) {
        let mut filters = Vec::new();
        for repr in [Representation::Int16, Representation::Q8, Representation::Q16] {
            filters.push(FilterId::lowpass(repr, k(exponent)));
            filters.push(FilterId::highpass(repr, k(exponent)));
        }
        let mut config = BankConfig::with_filters(filters.clone());
        if uniform {
            config.rounding = Rounding::Uniform;
        }
        let mut bank = FilterBank::new(config).unwrap();

        for &x in &input {
            bank.step(x);
            for pair in filters.chunks(2) {
                let (Some(Reading::Int(low)), Some(Reading::Int(high))) =
                    (bank.value(pair[0]), bank.value(pair[1]))
                else {
                    return Err(TestCaseError::fail("integer readings expected"));
                };
                prop_assert_eq!(low + high, i32::from(x));
            }
        }
    }
}

#[test]
fn test_band_reject_complements_bandpass() {
    let bp = FilterId::bandpass(Representation::Int16, k(3), k(4));
    let rej = FilterId::band_reject(Representation::Int16, k(3), k(4));
    let mut bank = bank_of(vec![FilterId::Input, bp, rej]);

    for n in 0..500 {
        let x = if (n / 20) % 2 == 0 { 800 } else { -800 };
        bank.step(x);
        let total = bank.value(bp).unwrap().as_f64() + bank.value(rej).unwrap().as_f64();
        assert_eq!(total, f64::from(x));
    }
}

// ============================================================================
// BIQUAD
// ============================================================================

fn biquad_crossing(alpha: i32) -> usize {
    let bp = FilterId::biquad(BiquadVariant::Q8, BiquadOutput::Bandpass);
    let mut config = BankConfig::with_filters(vec![bp]);
    config.biquad = BiquadCoeffs {
        alpha,
        ..BiquadCoeffs::default()
    };
    let mut bank = FilterBank::new(config).unwrap();

    let mut previous = 0.0;
    for n in 0..4000 {
        bank.step(if n == 0 { 1000 } else { 0 });
        let value = bank.value(bp).unwrap().as_f64();
        assert!(value.abs() <= 1000.0, "alpha {} unbounded: {}", alpha, value);
        if previous > 0.0 && value <= 0.0 {
            return n;
        }
        previous = value;
    }
    panic!("alpha {} never crossed zero", alpha);
}

#[test]
fn test_biquad_period_grows_as_alpha_shrinks() {
    let crossings: Vec<usize> = [16, 8, 4].into_iter().map(biquad_crossing).collect();
    assert!(crossings.windows(2).all(|w| w[0] < w[1]), "{:?}", crossings);
}

#[test]
fn test_resonant_biquad_never_panics() {
    let mut config = BankConfig::with_filters(vec![
        FilterId::biquad(BiquadVariant::Int16, BiquadOutput::Lowpass),
        FilterId::biquad(BiquadVariant::Q8, BiquadOutput::Highpass),
    ]);
    config.biquad = BiquadCoeffs {
        alpha_shift: k(1),
        alpha: 256,
        damping: 0,
    };
    let mut bank = FilterBank::new(config).unwrap();

    for n in 0..20_000 {
        bank.step(if n % 2 == 0 { Sample::MAX } else { Sample::MIN });
    }
    assert!(bank.value(FilterId::biquad(BiquadVariant::Q8, BiquadOutput::Highpass)).is_some());
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_reset_is_bit_exact() {
    let input: Vec<Sample> = (0..1000)
        .map(|n: i32| ((n * 7919) % 4001 - 2000) as Sample)
        .collect();
    let mut bank = FilterBank::standard();

    let run = |bank: &mut FilterBank| -> Vec<Vec<Option<Reading>>> {
        input
            .iter()
            .map(|&x| {
                bank.step(x);
                bank.filters().iter().map(|id| bank.value(*id)).collect()
            })
            .collect()
    };

    let first = run(&mut bank);
    bank.reset();
    let second = run(&mut bank);
    assert_eq!(first, second);

    let mut fresh = FilterBank::standard();
    assert_eq!(run(&mut fresh), first);
}

#[test]
fn test_selection_does_not_affect_state() {
    let mut selected = FilterBank::standard();
    let mut unselected = FilterBank::standard();
    selected.select_outputs(selected.mask_for_preset(Preset::BiQuadFilters));
    unselected.select_outputs(SelectionMask::NONE);

    for n in 0..300 {
        let x = ((n % 37) * 50) as Sample;
        selected.step(x);
        unselected.step(x);
    }
    for id in selected.filters().to_vec() {
        assert_eq!(selected.value(id), unselected.value(id), "{}", id);
    }
    assert_eq!(unselected.selected().count(), 0);
}

#[test]
fn test_presets_cover_the_standard_bank() {
    let bank = FilterBank::standard();
    let len = bank.filters().len();
    let union = Preset::ALL
        .iter()
        .fold(0u64, |acc, preset| acc | bank.mask_for_preset(*preset).bits());

    // Every filter of the standard bank is reachable through some preset
    assert_eq!(SelectionMask::from_bits(union).count(len), len);
}

#[tokio::test]
async fn test_config_file_drives_bank() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bank.toml");

    let mut config = BankConfig::with_filters(vec![
        FilterId::Input,
        FilterId::cascade(Representation::Float, k(2), CascadeOrder::Double),
    ]);
    config.rounding = Rounding::Uniform;
    config.save_to_file(&path).await.unwrap();

    let loaded = BankConfig::load_from_file(&path).await.unwrap();
    let mut from_file = FilterBank::new(loaded).unwrap();
    let mut direct = FilterBank::new(config).unwrap();

    for x in [100, -100, 2000, 0] {
        from_file.step(x);
        direct.step(x);
    }
    for id in direct.filters() {
        assert_eq!(from_file.value(*id), direct.value(*id));
    }
}
