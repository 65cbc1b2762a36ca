//! Coefficient quantization
//!
//! Maps f64 cascades into a target's numeric representation.
//!
//! - float32/float64: narrowing only, no scaling. float32 values that move by
//!   more than the relative tolerance are reported as [`PrecisionWarning`]s.
//! - int16/int32: one scale factor per cascade (or per section) chosen so the
//!   largest coefficient maps to the full positive range, then
//!   round-half-to-even. The scale travels with the integers because the
//!   consumer has to divide by it at run time.

use std::fmt;

use log::{debug, warn};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::dsp::{BiquadSection, Cascade, COEFFICIENT_NAMES};
use crate::error::{BiquadrError, Result};
use crate::model::DataType;

/// Default relative tolerance for float32 narrowing
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Granularity of fixed-point scale factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalePolicy {
    /// One scale for every section of a cascade
    #[default]
    PerCascade,
    /// Each section scaled on its own
    PerSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizeOptions {
    pub data_type: DataType,
    /// Relative change above which float32 narrowing is reported
    pub tolerance: f64,
    pub scale_policy: ScalePolicy,
}

impl QuantizeOptions {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            tolerance: DEFAULT_TOLERANCE,
            scale_policy: ScalePolicy::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_scale_policy(mut self, scale_policy: ScalePolicy) -> Self {
        self.scale_policy = scale_policy;
        self
    }
}

/// Coefficients of one section in the target representation, [b0, b1, b2, a1, a2]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantizedValues {
    Float32([f32; 5]),
    Float64([f64; 5]),
    Int16([i16; 5]),
    Int32([i32; 5]),
}

impl QuantizedValues {
    pub fn data_type(&self) -> DataType {
        match self {
            QuantizedValues::Float32(_) => DataType::Float32,
            QuantizedValues::Float64(_) => DataType::Float64,
            QuantizedValues::Int16(_) => DataType::Int16,
            QuantizedValues::Int32(_) => DataType::Int32,
        }
    }

    /// Stored values widened to f64 (integers are NOT rescaled)
    pub fn as_f64(&self) -> [f64; 5] {
        match self {
            QuantizedValues::Float32(v) => v.map(f64::from),
            QuantizedValues::Float64(v) => *v,
            QuantizedValues::Int16(v) => v.map(f64::from),
            QuantizedValues::Int32(v) => v.map(f64::from),
        }
    }

    /// Integer values for the fixed-point representations
    pub fn as_i64(&self) -> Option<[i64; 5]> {
        match self {
            QuantizedValues::Int16(v) => Some(v.map(i64::from)),
            QuantizedValues::Int32(v) => Some(v.map(i64::from)),
            QuantizedValues::Float32(_) | QuantizedValues::Float64(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizedSection {
    pub values: QuantizedValues,
    /// Fixed-point scale; `None` for float representations
    pub scale: Option<f64>,
}

impl QuantizedSection {
    /// Back to real coefficients by dividing out the scale
    pub fn dequantize(&self) -> BiquadSection {
        let scale = self.scale.unwrap_or(1.0);
        BiquadSection::from_array(self.values.as_f64().map(|v| v / scale))
    }
}

/// Advisory signal: float32 narrowing moved a coefficient more than the tolerance
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionWarning {
    pub section: usize,
    pub coefficient: &'static str,
    pub original: f64,
    pub narrowed: f64,
    pub relative_error: f64,
}

impl fmt::Display for PrecisionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "precision loss in section {} {}: {:e} -> {:e} (relative error {:.3e})",
            self.section, self.coefficient, self.original, self.narrowed, self.relative_error
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedCascade {
    pub data_type: DataType,
    pub sections: Vec<QuantizedSection>,
    pub warnings: Vec<PrecisionWarning>,
}

impl QuantizedCascade {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn has_precision_loss(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn dequantize(&self) -> Cascade {
        self.sections.iter().map(QuantizedSection::dequantize).collect()
    }
}

/// Scale that maps `max_abs` onto the representation's full positive range
pub fn fixed_point_scale(max_abs: f64, data_type: DataType) -> f64 {
    match data_type.full_scale() {
        Some(full) if max_abs > 0.0 => full / max_abs,
        _ => 1.0,
    }
}

/// Quantize `cascade` for `options.data_type`.
///
/// # Errors
/// * `InvalidParameter` - negative or non-finite tolerance
/// * `QuantizationOverflow` - a value does not fit the representation
pub fn quantize(cascade: &Cascade, options: &QuantizeOptions) -> Result<QuantizedCascade> {
    if !options.tolerance.is_finite() || options.tolerance < 0.0 {
        return Err(BiquadrError::InvalidParameter {
            param: "tolerance".to_string(),
            value: options.tolerance.to_string(),
            expected: "finite, non-negative relative tolerance".to_string(),
        });
    }

    let mut warnings = Vec::new();
    let cascade_scale = fixed_point_scale(cascade.max_abs_coefficient(), options.data_type);

    let sections = cascade
        .iter()
        .enumerate()
        .map(|(index, section)| {
            let coefficients = section.coefficients();
            match options.data_type {
                DataType::Float64 => Ok(QuantizedSection {
                    values: QuantizedValues::Float64(coefficients),
                    scale: None,
                }),
                DataType::Float32 => {
                    let values = narrow_to_f32(index, coefficients, options.tolerance, &mut warnings)?;
                    Ok(QuantizedSection {
                        values: QuantizedValues::Float32(values),
                        scale: None,
                    })
                }
                DataType::Int16 | DataType::Int32 => {
                    let scale = match options.scale_policy {
                        ScalePolicy::PerCascade => cascade_scale,
                        ScalePolicy::PerSection => {
                            fixed_point_scale(section.max_abs_coefficient(), options.data_type)
                        }
                    };
                    let values = to_fixed(index, coefficients, scale, options.data_type)?;
                    Ok(QuantizedSection {
                        values,
                        scale: Some(scale),
                    })
                }
            }
        })
        .collect::<Result<Vec<_>>>()?;

    for warning in &warnings {
        warn!("{}", warning);
    }
    debug!(
        "Quantized {} sections to {} ({} precision warnings)",
        sections.len(),
        options.data_type,
        warnings.len()
    );

    Ok(QuantizedCascade {
        data_type: options.data_type,
        sections,
        warnings,
    })
}

fn narrow_to_f32(
    section: usize,
    coefficients: [f64; 5],
    tolerance: f64,
    warnings: &mut Vec<PrecisionWarning>,
) -> Result<[f32; 5]> {
    let mut values = [0.0_f32; 5];
    for (i, (&original, slot)) in coefficients.iter().zip(values.iter_mut()).enumerate() {
        let narrowed = original as f32;
        if !narrowed.is_finite() {
            return Err(BiquadrError::QuantizationOverflow {
                section,
                coefficient: COEFFICIENT_NAMES[i],
                value: original,
                data_type: DataType::Float32,
            });
        }
        let widened = f64::from(narrowed);
        let relative_error = if original == 0.0 {
            widened.abs()
        } else {
            ((widened - original) / original).abs()
        };
        if relative_error > tolerance {
            warnings.push(PrecisionWarning {
                section,
                coefficient: COEFFICIENT_NAMES[i],
                original,
                narrowed: widened,
                relative_error,
            });
        }
        *slot = narrowed;
    }
    Ok(values)
}

fn to_fixed(
    section: usize,
    coefficients: [f64; 5],
    scale: f64,
    data_type: DataType,
) -> Result<QuantizedValues> {
    let overflow = |i: usize, value: f64| BiquadrError::QuantizationOverflow {
        section,
        coefficient: COEFFICIENT_NAMES[i],
        value,
        data_type,
    };

    let scaled = coefficients.map(|c| (c * scale).round_ties_even());
    match data_type {
        DataType::Int16 => {
            let mut values = [0_i16; 5];
            for (i, (&s, slot)) in scaled.iter().zip(values.iter_mut()).enumerate() {
                *slot = s.to_i16().ok_or_else(|| overflow(i, s))?;
            }
            Ok(QuantizedValues::Int16(values))
        }
        DataType::Int32 => {
            let mut values = [0_i32; 5];
            for (i, (&s, slot)) in scaled.iter().zip(values.iter_mut()).enumerate() {
                *slot = s.to_i32().ok_or_else(|| overflow(i, s))?;
            }
            Ok(QuantizedValues::Int32(values))
        }
        DataType::Float32 | DataType::Float64 => Err(BiquadrError::UnsupportedDataType {
            data_type: data_type.to_string(),
        }),
    }
}
