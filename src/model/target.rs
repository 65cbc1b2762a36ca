//! Deployment targets
//!
//! A target declares the numeric representation its firmware consumes and
//! the largest filter order it can run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dsp::butterworth::check_order;
use crate::error::{BiquadrError, Result};

/// Numeric representation of exported coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Float32,
    Float64,
    Int16,
    Int32,
}

impl DataType {
    /// Every supported representation, in display order
    pub const ALL: [DataType; 4] = [
        DataType::Float32,
        DataType::Float64,
        DataType::Int16,
        DataType::Int32,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
        }
    }

    /// Width of the representation in bits
    pub fn bits(&self) -> u32 {
        match self {
            DataType::Int16 => 16,
            DataType::Float32 | DataType::Int32 => 32,
            DataType::Float64 => 64,
        }
    }

    /// True for the integer (scaled fixed-point) representations
    pub fn is_fixed_point(&self) -> bool {
        matches!(self, DataType::Int16 | DataType::Int32)
    }

    /// Largest positive integer used by fixed-point scaling
    pub fn full_scale(&self) -> Option<f64> {
        match self {
            DataType::Int16 => Some(i16::MAX as f64),
            DataType::Int32 => Some(i32::MAX as f64),
            DataType::Float32 | DataType::Float64 => None,
        }
    }

    /// C type name used by the header renderer
    pub fn c_type(&self) -> &'static str {
        match self {
            DataType::Float32 => "float",
            DataType::Float64 => "double",
            DataType::Int16 => "int16_t",
            DataType::Int32 => "int32_t",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = BiquadrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float32" | "f32" | "float" => Ok(DataType::Float32),
            "float64" | "f64" | "double" => Ok(DataType::Float64),
            "int16" | "i16" | "q15" => Ok(DataType::Int16),
            "int32" | "i32" | "q31" => Ok(DataType::Int32),
            other => Err(BiquadrError::UnsupportedDataType {
                data_type: other.to_string(),
            }),
        }
    }
}

/// Stable identifier projects use to reference a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(Uuid);

impl TargetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TargetId {
    type Err = BiquadrError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(TargetId)
            .map_err(|_| BiquadrError::TargetNotFound { id: s.to_string() })
    }
}

/// A deployment target for exported coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    pub data_type: DataType,
    /// Largest filter order a single filter may use (even, 2-32)
    #[serde(alias = "max_filter_order")]
    pub max_order: usize,
}

impl Target {
    /// Create a target with a fresh identifier
    pub fn new(name: impl Into<String>, data_type: DataType, max_order: usize) -> Result<Self> {
        let target = Self {
            id: TargetId::new(),
            name: name.into(),
            data_type,
            max_order,
        };
        target.validate()?;
        Ok(target)
    }

    /// Check the name and order bound
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BiquadrError::InvalidParameter {
                param: "name".to_string(),
                value: self.name.clone(),
                expected: "non-empty target name".to_string(),
            });
        }
        check_order(self.max_order)
    }

    /// Reject orders above this target's bound
    pub fn check_order(&self, order: usize) -> Result<()> {
        check_order(order)?;
        if order > self.max_order {
            return Err(BiquadrError::InvalidOrder {
                order,
                reason: format!(
                    "exceeds target '{}' maximum order {}",
                    self.name, self.max_order
                ),
            });
        }
        Ok(())
    }
}
