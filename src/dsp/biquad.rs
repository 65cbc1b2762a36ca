//! Second-order sections and cascades
//!
//! Transfer function of one section:
//! H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
//!
//! A cascade is the series connection of its sections, so its response is
//! the product of the section responses.

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Coefficient names in storage and export order
pub const COEFFICIENT_NAMES: [&str; 5] = ["b0", "b1", "b2", "a1", "a2"];

/// Biquad coefficients, normalized so that a0 = 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadSection {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Default for BiquadSection {
    fn default() -> Self {
        Self::identity()
    }
}

impl BiquadSection {
    /// Create a section from already-normalized coefficients
    pub fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    /// Pass-through section used to pad fixed-size coefficient tables
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 0.0)
    }

    pub fn from_array(c: [f64; 5]) -> Self {
        Self::new(c[0], c[1], c[2], c[3], c[4])
    }

    /// Always 1 after normalization
    pub fn a0(&self) -> f64 {
        1.0
    }

    /// Coefficients as [b0, b1, b2, a1, a2]
    pub fn coefficients(&self) -> [f64; 5] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }

    /// Largest absolute coefficient, a0 excluded
    pub fn max_abs_coefficient(&self) -> f64 {
        self.coefficients()
            .iter()
            .fold(0.0_f64, |acc, c| acc.max(c.abs()))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Evaluate H at a point given as z^-1
    pub fn response_at(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b0 + z_inv * self.b1 + z_inv2 * self.b2;
        let den = Complex64::new(1.0, 0.0) + z_inv * self.a1 + z_inv2 * self.a2;
        num / den
    }

    /// Evaluate H on the unit circle at `frequency_hz`
    pub fn response(&self, frequency_hz: f64, sample_rate: f64) -> Complex64 {
        self.response_at(unit_circle_inv(frequency_hz, sample_rate))
    }

    /// Roots of z^2 + a1*z + a2
    pub fn poles(&self) -> (Complex64, Complex64) {
        let disc = Complex64::new(self.a1 * self.a1 - 4.0 * self.a2, 0.0).sqrt();
        let p1 = (-self.a1 + disc) / 2.0;
        let p2 = (-self.a1 - disc) / 2.0;
        (p1, p2)
    }

    /// Both poles strictly inside the unit circle (stability triangle)
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Natural frequency in Hz of the dominant pole, mapped back through z = e^(sT)
    pub fn natural_frequency(&self, sample_rate: f64) -> f64 {
        match self.dominant_pole_s() {
            Some(s) => s.norm() * sample_rate / (2.0 * PI),
            None => 0.0,
        }
    }

    /// Quality factor of the dominant pole; infinite for poles on or outside the circle
    pub fn q(&self) -> f64 {
        match self.dominant_pole_s() {
            Some(s) if s.re < 0.0 => s.norm() / (-2.0 * s.re),
            Some(_) => f64::INFINITY,
            None => 0.0,
        }
    }

    /// ln(p) for the pole with the largest magnitude, in units of the sample period
    fn dominant_pole_s(&self) -> Option<Complex64> {
        let (p1, p2) = self.poles();
        let pole = if p1.norm() >= p2.norm() { p1 } else { p2 };
        if pole.norm() == 0.0 {
            None
        } else {
            Some(pole.ln())
        }
    }
}

/// z^-1 on the unit circle for a physical frequency
pub(crate) fn unit_circle_inv(frequency_hz: f64, sample_rate: f64) -> Complex64 {
    let omega = 2.0 * PI * frequency_hz / sample_rate;
    Complex64::new(omega.cos(), -omega.sin())
}

/// Ordered series of biquad sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cascade {
    sections: Vec<BiquadSection>,
}

impl Cascade {
    pub fn new(sections: Vec<BiquadSection>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[BiquadSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BiquadSection> {
        self.sections.iter()
    }

    /// Filter order realized by the cascade (two per section)
    pub fn order(&self) -> usize {
        self.sections.len() * 2
    }

    /// Append another cascade in series
    pub fn extend(&mut self, other: &Cascade) {
        self.sections.extend_from_slice(&other.sections);
    }

    /// Series combination of two cascades
    pub fn chain(&self, other: &Cascade) -> Cascade {
        let mut combined = self.clone();
        combined.extend(other);
        combined
    }

    /// Append identity sections until the cascade holds `count` sections
    pub fn pad_to(&mut self, count: usize) {
        while self.sections.len() < count {
            self.sections.push(BiquadSection::identity());
        }
    }

    /// Largest absolute coefficient over every section
    pub fn max_abs_coefficient(&self) -> f64 {
        self.sections
            .iter()
            .fold(0.0_f64, |acc, s| acc.max(s.max_abs_coefficient()))
    }

    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(BiquadSection::is_stable)
    }

    /// Product of the section responses at `frequency_hz`
    pub fn response(&self, frequency_hz: f64, sample_rate: f64) -> Complex64 {
        let z_inv = unit_circle_inv(frequency_hz, sample_rate);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response_at(z_inv))
    }
}

impl FromIterator<BiquadSection> for Cascade {
    fn from_iter<I: IntoIterator<Item = BiquadSection>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Cascade {
    type Item = &'a BiquadSection;
    type IntoIter = std::slice::Iter<'a, BiquadSection>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}
