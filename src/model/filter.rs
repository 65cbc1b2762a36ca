//! Filter definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::target::Target;
use crate::dsp::butterworth::{check_cutoff, check_order, design};
use crate::dsp::Cascade;
use crate::error::{BiquadrError, Result};

/// Butterworth response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Highpass,
    Lowpass,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Highpass => "highpass",
            FilterType::Lowpass => "lowpass",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = BiquadrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highpass" | "high" | "hp" => Ok(FilterType::Highpass),
            "lowpass" | "low" | "lp" => Ok(FilterType::Lowpass),
            other => Err(BiquadrError::InvalidParameter {
                param: "filter_type".to_string(),
                value: other.to_string(),
                expected: "highpass or lowpass".to_string(),
            }),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// One Butterworth filter in a project channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub filter_type: FilterType,
    /// Even order, 2-32, bounded further by the project's target
    pub order: usize,
    /// Cutoff frequency in Hz
    #[serde(alias = "frequency")]
    pub cutoff_hz: f64,
    /// Disabled filters stay in the project but are left out of the cascade
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Filter {
    /// Create an enabled filter, checking order and cutoff sign
    pub fn new(
        name: impl Into<String>,
        filter_type: FilterType,
        order: usize,
        cutoff_hz: f64,
    ) -> Result<Self> {
        let filter = Self {
            name: name.into(),
            filter_type,
            order,
            cutoff_hz,
            enabled: true,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn lowpass(name: impl Into<String>, order: usize, cutoff_hz: f64) -> Result<Self> {
        Self::new(name, FilterType::Lowpass, order, cutoff_hz)
    }

    pub fn highpass(name: impl Into<String>, order: usize, cutoff_hz: f64) -> Result<Self> {
        Self::new(name, FilterType::Highpass, order, cutoff_hz)
    }

    /// Builder-style enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Checks that do not depend on a target or sample rate
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BiquadrError::InvalidParameter {
                param: "name".to_string(),
                value: self.name.clone(),
                expected: "non-empty filter name".to_string(),
            });
        }
        check_order(self.order)?;
        if !self.cutoff_hz.is_finite() || self.cutoff_hz <= 0.0 {
            return Err(BiquadrError::InvalidFrequency {
                frequency_hz: self.cutoff_hz,
                reason: format!("filter '{}' cutoff must be positive", self.name),
            });
        }
        Ok(())
    }

    /// Full check against the owning project's target and sample rate
    pub fn validate_for(&self, target: &Target, sample_rate_hz: f64) -> Result<()> {
        self.validate()?;
        target.check_order(self.order)?;
        check_cutoff(self.cutoff_hz, sample_rate_hz)
    }

    pub fn section_count(&self) -> usize {
        self.order / 2
    }

    /// Design this filter's cascade at `sample_rate_hz`
    pub fn design(&self, sample_rate_hz: f64) -> Result<Cascade> {
        design(self.filter_type, self.order, self.cutoff_hz, sample_rate_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataType;

    #[test]
    fn test_filter_new() {
        let filter = Filter::lowpass("LP1", 4, 1000.0).unwrap();
        assert_eq!(filter.filter_type, FilterType::Lowpass);
        assert!(filter.enabled);
        assert_eq!(filter.section_count(), 2);
    }

    #[test]
    fn test_filter_rejects_bad_values() {
        assert!(matches!(
            Filter::lowpass("x", 5, 1000.0).unwrap_err(),
            BiquadrError::InvalidOrder { .. }
        ));
        assert!(matches!(
            Filter::highpass("x", 4, 0.0).unwrap_err(),
            BiquadrError::InvalidFrequency { .. }
        ));
        assert!(Filter::highpass("", 4, 100.0).is_err());
    }

    #[test]
    fn test_validate_for_target_bound() {
        let target = Target::new("mcu", DataType::Int16, 4).unwrap();
        let ok = Filter::lowpass("a", 4, 1000.0).unwrap();
        assert!(ok.validate_for(&target, 48000.0).is_ok());

        // max_order + 2
        let too_high = Filter::lowpass("b", 6, 1000.0).unwrap();
        assert!(matches!(
            too_high.validate_for(&target, 48000.0).unwrap_err(),
            BiquadrError::InvalidOrder { order: 6, .. }
        ));
    }

    #[test]
    fn test_validate_for_nyquist() {
        let target = Target::new("mcu", DataType::Float32, 8).unwrap();
        let at_nyquist = Filter::lowpass("n", 4, 24000.0).unwrap();
        assert!(matches!(
            at_nyquist.validate_for(&target, 48000.0).unwrap_err(),
            BiquadrError::InvalidFrequency { .. }
        ));
    }

    #[test]
    fn test_filter_type_parse() {
        assert_eq!("HP".parse::<FilterType>().unwrap(), FilterType::Highpass);
        assert_eq!("lowpass".parse::<FilterType>().unwrap(), FilterType::Lowpass);
        assert!("bandpass".parse::<FilterType>().is_err());
    }

    #[test]
    fn test_deserialize_legacy_field_names() {
        let json = r#"{"name":"sub","filter_type":"highpass","frequency":35.0,"order":4}"#;
        let filter: Filter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.cutoff_hz, 35.0);
        assert!(filter.enabled);
    }
}
