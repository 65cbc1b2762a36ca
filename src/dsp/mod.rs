//! Filter design and analysis
//!
//! Butterworth design into biquad cascades, frequency response evaluation
//! and a memo for designed cascades. Everything here is a pure function of
//! its inputs and computes in f64.

pub mod biquad;
pub mod butterworth;
pub mod cache;
pub mod response;

pub use biquad::{BiquadSection, Cascade, COEFFICIENT_NAMES};
pub use butterworth::{check_cutoff, check_order, design, MAX_ORDER, MIN_ORDER};
pub use cache::{CascadeCache, CascadeKey};
pub use response::{
    evaluate, evaluate_with, log_frequency_grid, magnitude_db, PhaseMode, ResponsePoint,
};
