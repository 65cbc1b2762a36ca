//! Error handling for Biquadr
//!
//! Every failure in the design/quantize/export pipeline is a typed variant.
//! Precision loss on float narrowing is advisory and lives in
//! [`crate::quantize::PrecisionWarning`] instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::DataType;

/// Result type alias for Biquadr operations
pub type Result<T> = std::result::Result<T, BiquadrError>;

/// Main error type for Biquadr operations
#[derive(Error, Debug)]
pub enum BiquadrError {
    // Design Errors
    #[error("Invalid filter order {order}: {reason}")]
    InvalidOrder { order: usize, reason: String },

    #[error("Invalid frequency {frequency_hz} Hz: {reason}")]
    InvalidFrequency { frequency_hz: f64, reason: String },

    #[error("Invalid sample rate: {sample_rate_hz} Hz")]
    InvalidSampleRate { sample_rate_hz: f64 },

    #[error("Invalid parameter {param}: {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    // Quantization Errors
    #[error(
        "Quantization overflow: section {section} coefficient {coefficient} scaled to {value} does not fit {data_type}"
    )]
    QuantizationOverflow {
        section: usize,
        coefficient: &'static str,
        value: f64,
        data_type: DataType,
    },

    #[error("Unsupported data type: {data_type}")]
    UnsupportedDataType { data_type: String },

    // Export Errors
    #[error("Unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    // Session Errors
    #[error("Target not found: {id}")]
    TargetNotFound { id: String },

    #[error("Target '{target}' is used by project '{project}'")]
    TargetInUse { target: String, project: String },

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    // File Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid workspace schema version: {version}")]
    InvalidSchemaVersion { version: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

impl BiquadrError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            BiquadrError::InvalidOrder { .. } => "INVALID_ORDER",
            BiquadrError::InvalidFrequency { .. } => "INVALID_FREQUENCY",
            BiquadrError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            BiquadrError::InvalidParameter { .. } => "INVALID_PARAMETER",
            BiquadrError::QuantizationOverflow { .. } => "QUANTIZATION_OVERFLOW",
            BiquadrError::UnsupportedDataType { .. } => "UNSUPPORTED_DATA_TYPE",
            BiquadrError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            BiquadrError::TargetNotFound { .. } => "TARGET_NOT_FOUND",
            BiquadrError::TargetInUse { .. } => "TARGET_IN_USE",
            BiquadrError::DuplicateName { .. } => "DUPLICATE_NAME",
            BiquadrError::NotFound { .. } => "NOT_FOUND",
            BiquadrError::FileReadError { .. } => "FILE_READ_ERROR",
            BiquadrError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            BiquadrError::InvalidSchemaVersion { .. } => "INVALID_SCHEMA_VERSION",
            BiquadrError::Io(_) => "IO_ERROR",
            BiquadrError::Serialization(_) => "SERIALIZATION_ERROR",
            BiquadrError::Csv(_) => "CSV_ERROR",
            BiquadrError::Format(_) => "FORMAT_ERROR",
        }
    }

    /// Check if this error can be fixed by editing the input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BiquadrError::InvalidOrder { .. }
                | BiquadrError::InvalidFrequency { .. }
                | BiquadrError::InvalidSampleRate { .. }
                | BiquadrError::InvalidParameter { .. }
                | BiquadrError::UnsupportedDataType { .. }
                | BiquadrError::UnsupportedFormat { .. }
                | BiquadrError::DuplicateName { .. }
                | BiquadrError::TargetInUse { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BiquadrError::InvalidOrder { .. } => vec![
                "Use an even order between 2 and 32",
                "Check the target's maximum filter order",
            ],
            BiquadrError::InvalidFrequency { .. } => vec![
                "Cutoff must be positive and below half the sample rate",
                "Raise the project sample rate for higher cutoffs",
            ],
            BiquadrError::UnsupportedFormat { .. } => {
                vec!["Supported formats: header, json, csv, source"]
            }
            BiquadrError::UnsupportedDataType { .. } => {
                vec!["Supported data types: float32, float64, int16, int32"]
            }
            BiquadrError::TargetInUse { .. } => vec![
                "Move the project to another target first",
                "Delete the projects that reference this target",
            ],
            _ => vec![],
        }
    }
}
