//! Integration tests for Biquadr
//!
//! Design, response and quantization through the public API.

use approx::assert_abs_diff_eq;
use biquadr::dsp::{evaluate, evaluate_with, log_frequency_grid, PhaseMode};
use biquadr::{
    design, quantize, BiquadrError, Cascade, Channel, DataType, Filter, FilterType, Project,
    QuantizeOptions, Session, Target,
};
use test_case::test_case;

const FS: f64 = 48000.0;

#[test]
fn test_order4_lowpass_scenario() {
    let cascade = design(FilterType::Lowpass, 4, 1000.0, FS).unwrap();
    assert_eq!(cascade.len(), 2);

    let points = evaluate(&cascade, &[0.0, 1000.0, 23999.0], FS).unwrap();
    assert_abs_diff_eq!(points[0].magnitude_db, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(points[1].magnitude_db, -3.0103, epsilon = 0.05);
    assert!(points[2].magnitude_db < -100.0);
}

#[test_case(FilterType::Lowpass ; "lowpass")]
#[test_case(FilterType::Highpass ; "highpass")]
fn test_every_order_has_normalized_sections(filter_type: FilterType) {
    for order in (2..=32).step_by(2) {
        let cascade = design(filter_type, order, 3000.0, FS).unwrap();
        assert_eq!(cascade.len(), order / 2);
        assert!(cascade.iter().all(|s| s.a0() == 1.0));
        assert!(cascade.is_stable());

        let at_cutoff = evaluate(&cascade, &[3000.0], FS).unwrap();
        assert_abs_diff_eq!(at_cutoff[0].magnitude_db, -3.0103, epsilon = 0.05);
    }
}

#[test]
fn test_highpass_blocks_dc() {
    let cascade = design(FilterType::Highpass, 6, 200.0, FS).unwrap();
    let points = evaluate(&cascade, &[0.0, 20000.0], FS).unwrap();
    assert!(points[0].magnitude_db < -200.0);
    assert_abs_diff_eq!(points[1].magnitude_db, 0.0, epsilon = 1e-3);
}

#[test]
fn test_boundaries() {
    assert!(matches!(
        design(FilterType::Lowpass, 34, 1000.0, FS).unwrap_err(),
        BiquadrError::InvalidOrder { .. }
    ));
    assert!(matches!(
        design(FilterType::Lowpass, 3, 1000.0, FS).unwrap_err(),
        BiquadrError::InvalidOrder { .. }
    ));
    assert!(matches!(
        design(FilterType::Highpass, 2, FS / 2.0, FS).unwrap_err(),
        BiquadrError::InvalidFrequency { .. }
    ));
    assert!(matches!(
        design(FilterType::Highpass, 2, -5.0, FS).unwrap_err(),
        BiquadrError::InvalidFrequency { .. }
    ));
}

#[test]
fn test_cascade_multiplicativity() {
    let lp = design(FilterType::Lowpass, 4, 5000.0, FS).unwrap();
    let hp = design(FilterType::Highpass, 2, 100.0, FS).unwrap();
    let combined: Cascade = lp.chain(&hp);
    let grid = log_frequency_grid(20.0, 20000.0, 200).unwrap();

    for &f in &grid {
        let expected = lp.response(f, FS) * hp.response(f, FS);
        let actual = combined.response(f, FS);
        assert_abs_diff_eq!(actual.re, expected.re, epsilon = 1e-12);
        assert_abs_diff_eq!(actual.im, expected.im, epsilon = 1e-12);
    }
}

#[test]
fn test_unwrapped_phase_is_continuous() {
    let cascade = design(FilterType::Lowpass, 16, 2000.0, FS).unwrap();
    let grid = log_frequency_grid(20.0, 20000.0, 2000).unwrap();
    let points = evaluate_with(&cascade, &grid, FS, PhaseMode::Unwrapped).unwrap();
    for pair in points.windows(2) {
        assert!((pair[1].phase_rad - pair[0].phase_rad).abs() < std::f64::consts::PI);
    }
    assert!(points.last().unwrap().phase_rad < -std::f64::consts::PI);
}

#[test_case(DataType::Int16, 16 ; "int16")]
#[test_case(DataType::Int32, 32 ; "int32")]
fn test_quantize_round_trip_bound(data_type: DataType, bits: u32) {
    let cascade = design(FilterType::Highpass, 8, 120.0, FS).unwrap();
    let quantized = quantize(&cascade, &QuantizeOptions::new(data_type)).unwrap();
    let scale = quantized.sections[0].scale.unwrap();
    assert_abs_diff_eq!(
        scale,
        ((1_i64 << (bits - 1)) - 1) as f64 / cascade.max_abs_coefficient(),
        epsilon = 1e-9
    );

    for (original, restored) in cascade.iter().zip(quantized.dequantize().iter()) {
        for (a, b) in original.coefficients().iter().zip(restored.coefficients()) {
            assert!((a - b).abs() <= 0.5 / scale + 1e-15);
        }
    }
}

#[test]
fn test_session_enforces_target_bound() {
    let mut session = Session::new();
    let id = session
        .add_target(Target::new("mcu", DataType::Int16, 4).unwrap())
        .unwrap();
    session
        .add_project(Project::new("amp", id, FS).unwrap())
        .unwrap();
    session.add_channel("amp", Channel::new("main")).unwrap();

    session
        .add_filter("amp", "main", Filter::lowpass("lp", 4, 8000.0).unwrap())
        .unwrap();
    let err = session
        .add_filter("amp", "main", Filter::highpass("hp", 6, 50.0).unwrap())
        .unwrap_err();
    assert!(matches!(err, BiquadrError::InvalidOrder { order: 6, .. }));

    let (project, _) = session.resolve("amp").unwrap();
    assert_eq!(project.cascade().unwrap().len(), 2);
}
