//! Butterworth design by bilinear transform
//!
//! The analog prototype poles sit on the unit circle in the left half
//! s-plane. Each conjugate pair is scaled to the pre-warped cutoff (or
//! inverted for highpass), mapped through the bilinear transform and turned
//! into one biquad with its double zero at z = -1 (lowpass) or z = +1
//! (highpass). Sections are normalized to unity gain in the passband.

use std::f64::consts::PI;

use log::debug;
use num_complex::Complex64;

use super::biquad::{BiquadSection, Cascade};
use crate::error::{BiquadrError, Result};
use crate::model::FilterType;

/// Smallest supported filter order
pub const MIN_ORDER: usize = 2;
/// Largest supported filter order
pub const MAX_ORDER: usize = 32;

/// Orders must be even and within [MIN_ORDER, MAX_ORDER]
pub fn check_order(order: usize) -> Result<()> {
    if order % 2 != 0 {
        return Err(BiquadrError::InvalidOrder {
            order,
            reason: "order must be even".to_string(),
        });
    }
    if !(MIN_ORDER..=MAX_ORDER).contains(&order) {
        return Err(BiquadrError::InvalidOrder {
            order,
            reason: format!("order must be between {} and {}", MIN_ORDER, MAX_ORDER),
        });
    }
    Ok(())
}

pub fn check_sample_rate(sample_rate_hz: f64) -> Result<()> {
    if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
        return Err(BiquadrError::InvalidSampleRate { sample_rate_hz });
    }
    Ok(())
}

/// Cutoff must be positive and strictly below Nyquist
pub fn check_cutoff(cutoff_hz: f64, sample_rate_hz: f64) -> Result<()> {
    check_sample_rate(sample_rate_hz)?;
    if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 {
        return Err(BiquadrError::InvalidFrequency {
            frequency_hz: cutoff_hz,
            reason: "cutoff must be positive".to_string(),
        });
    }
    let nyquist = sample_rate_hz / 2.0;
    if cutoff_hz >= nyquist {
        return Err(BiquadrError::InvalidFrequency {
            frequency_hz: cutoff_hz,
            reason: format!("cutoff must be below Nyquist ({} Hz)", nyquist),
        });
    }
    Ok(())
}

/// Design a Butterworth cascade of `order / 2` biquads.
///
/// Sections are ordered by ascending natural frequency of their digital
/// poles, ties broken by ascending Q.
///
/// # Errors
/// * `InvalidOrder` - order odd or outside 2..=32
/// * `InvalidFrequency` - cutoff not in (0, sample_rate / 2)
/// * `InvalidSampleRate` - sample rate not positive and finite
pub fn design(
    filter_type: FilterType,
    order: usize,
    cutoff_hz: f64,
    sample_rate_hz: f64,
) -> Result<Cascade> {
    check_order(order)?;
    check_cutoff(cutoff_hz, sample_rate_hz)?;

    let fs2 = 2.0 * sample_rate_hz;
    let warped = prewarp(cutoff_hz, sample_rate_hz);

    let mut sections: Vec<BiquadSection> = prototype_poles(order)
        .into_iter()
        .map(|p| {
            let analog = match filter_type {
                FilterType::Lowpass => p * warped,
                // s -> wc/s moves each pole to wc/p
                FilterType::Highpass => warped / p,
            };
            let digital = (fs2 + analog) / (fs2 - analog);
            section_from_pole(digital, filter_type)
        })
        .collect();

    sections.sort_by(|x, y| {
        x.natural_frequency(sample_rate_hz)
            .total_cmp(&y.natural_frequency(sample_rate_hz))
            .then(x.q().total_cmp(&y.q()))
    });

    debug!(
        "Designed {} order {} at {} Hz (fs {} Hz): {} sections",
        filter_type,
        order,
        cutoff_hz,
        sample_rate_hz,
        sections.len()
    );

    Ok(Cascade::new(sections))
}

/// Analog cutoff in rad/s that lands on `cutoff_hz` after the bilinear transform
fn prewarp(cutoff_hz: f64, sample_rate_hz: f64) -> f64 {
    2.0 * sample_rate_hz * (PI * cutoff_hz / sample_rate_hz).tan()
}

/// Upper-half-plane prototype poles, one per conjugate pair.
///
/// theta_k = pi/2 + pi(2k+1)/(2N) for k in [0, N/2); the remaining N/2 poles
/// are their conjugates.
fn prototype_poles(order: usize) -> Vec<Complex64> {
    (0..order / 2)
        .map(|k| {
            let theta = PI / 2.0 + PI * (2 * k + 1) as f64 / (2 * order) as f64;
            Complex64::from_polar(1.0, theta)
        })
        .collect()
}

/// Biquad for the conjugate pole pair {p, conj(p)} with a double zero at the stopband edge
fn section_from_pole(pole: Complex64, filter_type: FilterType) -> BiquadSection {
    let a1 = -2.0 * pole.re;
    let a2 = pole.norm_sqr();
    match filter_type {
        FilterType::Lowpass => {
            // unity gain at z = 1
            let gain = (1.0 + a1 + a2) / 4.0;
            BiquadSection::new(gain, 2.0 * gain, gain, a1, a2)
        }
        FilterType::Highpass => {
            // unity gain at z = -1
            let gain = (1.0 - a1 + a2) / 4.0;
            BiquadSection::new(gain, -2.0 * gain, gain, a1, a2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    fn magnitude_db(cascade: &Cascade, f: f64, fs: f64) -> f64 {
        20.0 * cascade.response(f, fs).norm().log10()
    }

    #[test_case(2 ; "order 2")]
    #[test_case(4 ; "order 4")]
    #[test_case(6 ; "order 6")]
    #[test_case(8 ; "order 8")]
    #[test_case(12 ; "order 12")]
    #[test_case(16 ; "order 16")]
    #[test_case(24 ; "order 24")]
    #[test_case(32 ; "order 32")]
    fn test_section_count_and_cutoff(order: usize) {
        for filter_type in [FilterType::Lowpass, FilterType::Highpass] {
            let cascade = design(filter_type, order, 1000.0, 48000.0).unwrap();
            assert_eq!(cascade.len(), order / 2);
            assert!(cascade.is_stable());
            assert_abs_diff_eq!(magnitude_db(&cascade, 1000.0, 48000.0), -3.0103, epsilon = 0.05);
        }
    }

    #[test]
    fn test_every_even_order_is_accepted() {
        for order in (MIN_ORDER..=MAX_ORDER).step_by(2) {
            assert!(design(FilterType::Lowpass, order, 5000.0, 44100.0).is_ok());
        }
    }

    #[test]
    fn test_lowpass_passband_and_stopband() {
        let cascade = design(FilterType::Lowpass, 4, 1000.0, 48000.0).unwrap();
        assert_abs_diff_eq!(magnitude_db(&cascade, 0.0, 48000.0), 0.0, epsilon = 1e-9);
        assert!(magnitude_db(&cascade, 24000.0, 48000.0) < -100.0);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let cascade = design(FilterType::Highpass, 4, 1000.0, 48000.0).unwrap();
        assert!(magnitude_db(&cascade, 0.0, 48000.0) < -100.0);
        assert_abs_diff_eq!(magnitude_db(&cascade, 24000.0, 48000.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_second_order_matches_closed_form() {
        // RBJ-style lowpass with Q = 1/sqrt(2) is the 2nd order Butterworth
        let fs = 48000.0;
        let fc = 1000.0;
        let k = (PI * fc / fs).tan();
        let q = std::f64::consts::FRAC_1_SQRT_2;
        let norm = 1.0 / (1.0 + k / q + k * k);
        let b0 = k * k * norm;
        let a1 = 2.0 * (k * k - 1.0) * norm;
        let a2 = (1.0 - k / q + k * k) * norm;

        let cascade = design(FilterType::Lowpass, 2, fc, fs).unwrap();
        let s = cascade.sections()[0];
        assert_abs_diff_eq!(s.b0, b0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.b1, 2.0 * b0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.b2, b0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.a1, a1, epsilon = 1e-12);
        assert_abs_diff_eq!(s.a2, a2, epsilon = 1e-12);
    }

    #[test]
    fn test_sections_sorted_by_natural_frequency() {
        let fs = 48000.0;
        let cascade = design(FilterType::Lowpass, 8, 3000.0, fs).unwrap();
        let freqs: Vec<f64> = cascade
            .iter()
            .map(|s| s.natural_frequency(fs))
            .collect();
        assert!(freqs.windows(2).all(|w| w[0] <= w[1]), "{:?}", freqs);
    }

    #[test]
    fn test_invalid_orders() {
        for order in [0, 1, 3, 5, 31, 33, 34, 64] {
            let err = design(FilterType::Lowpass, order, 1000.0, 48000.0).unwrap_err();
            assert!(matches!(err, BiquadrError::InvalidOrder { .. }), "order {}", order);
        }
    }

    #[test]
    fn test_invalid_frequencies() {
        for cutoff in [0.0, -10.0, 24000.0, 30000.0, f64::NAN] {
            let err = design(FilterType::Highpass, 4, cutoff, 48000.0).unwrap_err();
            assert!(
                matches!(err, BiquadrError::InvalidFrequency { .. }),
                "cutoff {}",
                cutoff
            );
        }
    }

    #[test]
    fn test_invalid_sample_rate() {
        let err = design(FilterType::Lowpass, 4, 100.0, 0.0).unwrap_err();
        assert!(matches!(err, BiquadrError::InvalidSampleRate { .. }));
    }

    #[test]
    fn test_design_is_deterministic() {
        let a = design(FilterType::Highpass, 10, 250.0, 44100.0).unwrap();
        let b = design(FilterType::Highpass, 10, 250.0, 44100.0).unwrap();
        assert_eq!(a, b);
    }
}
