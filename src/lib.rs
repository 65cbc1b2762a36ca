//! Biquadr - Butterworth Biquad Designer
//!
//! Designs Butterworth highpass and lowpass filters as cascades of
//! second-order sections, evaluates their frequency response, quantizes the
//! coefficients for a deployment target and exports them as a C header,
//! JSON, CSV or Python source.
//!
//! # Architecture
//!
//! - `model`: targets, projects, channels and filters, plus the session catalog
//! - `dsp`: pole placement, bilinear discretization and response evaluation (f64 only)
//! - `quantize`: narrowing and fixed-point scaling for float32/float64/int16/int32
//! - `export`: deterministic renderers over quantized documents
//! - `state`: workspace files and legacy project import

pub mod cli;
pub mod config;
pub mod dsp;
pub mod error;
pub mod export;
pub mod model;
pub mod quantize;
pub mod state;

pub use dsp::{design, evaluate, BiquadSection, Cascade, ResponsePoint};
pub use error::{BiquadrError, Result};
pub use export::{export_project, render, ExportDocument, ExportFormat, ExportOptions};
pub use model::{Channel, DataType, Filter, FilterType, Project, Session, Target, TargetId};
pub use quantize::{quantize, PrecisionWarning, QuantizeOptions, QuantizedCascade, ScalePolicy};
