//! Frequency response evaluation
//!
//! Evaluates cascades on the unit circle over a caller-supplied grid.
//! Results come back in grid order; magnitude of an exact zero is
//! `f64::NEG_INFINITY` rather than an error.

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::biquad::Cascade;
use super::butterworth::check_sample_rate;
use crate::error::{BiquadrError, Result};

/// Default plotting band lower edge (Hz)
pub const DEFAULT_F_MIN_HZ: f64 = 20.0;
/// Default plotting band upper edge (Hz)
pub const DEFAULT_F_MAX_HZ: f64 = 20000.0;
/// Default number of grid points
pub const DEFAULT_POINTS: usize = 1000;

/// How phase is reported along the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMode {
    /// atan2 per point, in (-pi, pi]
    #[default]
    Wrapped,
    /// Consecutive points differ by less than pi
    Unwrapped,
}

/// Response of a cascade at one frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponsePoint {
    pub frequency_hz: f64,
    pub magnitude_db: f64,
    pub phase_rad: f64,
}

impl ResponsePoint {
    pub fn phase_deg(&self) -> f64 {
        self.phase_rad.to_degrees()
    }

    /// (magnitude_db, phase_deg) pair as plotted
    pub fn as_db_deg(&self) -> (f64, f64) {
        (self.magnitude_db, self.phase_deg())
    }
}

/// 20*log10(|h|), with an exact zero mapped to -inf
pub fn magnitude_db(h: Complex64) -> f64 {
    let norm = h.norm();
    if norm == 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * norm.log10()
    }
}

/// Log-spaced grid from `f_min_hz` to `f_max_hz` inclusive
pub fn log_frequency_grid(f_min_hz: f64, f_max_hz: f64, points: usize) -> Result<Vec<f64>> {
    if !f_min_hz.is_finite() || f_min_hz <= 0.0 {
        return Err(BiquadrError::InvalidFrequency {
            frequency_hz: f_min_hz,
            reason: "grid start must be positive".to_string(),
        });
    }
    if !f_max_hz.is_finite() || f_max_hz <= f_min_hz {
        return Err(BiquadrError::InvalidFrequency {
            frequency_hz: f_max_hz,
            reason: format!("grid end must be above {} Hz", f_min_hz),
        });
    }
    if points == 0 {
        return Err(BiquadrError::InvalidParameter {
            param: "points".to_string(),
            value: points.to_string(),
            expected: "at least 1 grid point".to_string(),
        });
    }
    if points == 1 {
        return Ok(vec![f_min_hz]);
    }

    let log_min = f_min_hz.log10();
    let step = (f_max_hz.log10() - log_min) / (points - 1) as f64;
    let mut grid: Vec<f64> = (0..points)
        .map(|i| 10f64.powf(log_min + step * i as f64))
        .collect();
    // pin the endpoints against powf rounding
    grid[0] = f_min_hz;
    grid[points - 1] = f_max_hz;
    Ok(grid)
}

/// Complex response of `cascade` at each grid frequency
pub fn complex_response(
    cascade: &Cascade,
    freq_grid_hz: &[f64],
    sample_rate_hz: f64,
) -> Result<Vec<Complex64>> {
    check_sample_rate(sample_rate_hz)?;
    Ok(freq_grid_hz
        .iter()
        .map(|&f| cascade.response(f, sample_rate_hz))
        .collect())
}

/// Magnitude (dB) and wrapped phase at each grid frequency
pub fn evaluate(
    cascade: &Cascade,
    freq_grid_hz: &[f64],
    sample_rate_hz: f64,
) -> Result<Vec<ResponsePoint>> {
    evaluate_with(cascade, freq_grid_hz, sample_rate_hz, PhaseMode::Wrapped)
}

/// Like [`evaluate`], with the phase convention chosen by the caller
pub fn evaluate_with(
    cascade: &Cascade,
    freq_grid_hz: &[f64],
    sample_rate_hz: f64,
    phase_mode: PhaseMode,
) -> Result<Vec<ResponsePoint>> {
    let responses = complex_response(cascade, freq_grid_hz, sample_rate_hz)?;
    Ok(to_points(freq_grid_hz, &responses, phase_mode))
}

/// Convert complex responses into plot points
pub fn to_points(
    freq_grid_hz: &[f64],
    responses: &[Complex64],
    phase_mode: PhaseMode,
) -> Vec<ResponsePoint> {
    let mut phases: Vec<f64> = responses.iter().map(|h| h.im.atan2(h.re)).collect();
    if phase_mode == PhaseMode::Unwrapped {
        unwrap_phase(&mut phases);
    }

    freq_grid_hz
        .iter()
        .zip(responses)
        .zip(phases)
        .map(|((&frequency_hz, &h), phase_rad)| ResponsePoint {
            frequency_hz,
            magnitude_db: magnitude_db(h),
            phase_rad,
        })
        .collect()
}

/// Remove 2*pi jumps between consecutive samples
fn unwrap_phase(phases: &mut [f64]) {
    let mut offset = 0.0;
    for i in 1..phases.len() {
        let raw = phases[i] + offset;
        let delta = raw - phases[i - 1];
        if delta > PI {
            offset -= 2.0 * PI * ((delta + PI) / (2.0 * PI)).floor();
        } else if delta < -PI {
            offset += 2.0 * PI * ((-delta + PI) / (2.0 * PI)).floor();
        }
        phases[i] += offset;
    }
}
