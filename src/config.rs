//! Settings
//!
//! Plot range and export defaults, read from a JSON file. Every field has a
//! default, so a partial file only overrides what it names.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dsp::butterworth::check_sample_rate;
use crate::dsp::response::{log_frequency_grid, DEFAULT_F_MAX_HZ, DEFAULT_F_MIN_HZ, DEFAULT_POINTS};
use crate::error::{BiquadrError, Result};
use crate::export::ExportOptions;
use crate::model::DEFAULT_SAMPLE_RATE;

/// Frequency and magnitude range of response plots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub f_min_hz: f64,
    pub f_max_hz: f64,
    pub points: usize,
    pub magnitude_min_db: f64,
    pub magnitude_max_db: f64,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            f_min_hz: DEFAULT_F_MIN_HZ,
            f_max_hz: DEFAULT_F_MAX_HZ,
            points: DEFAULT_POINTS,
            magnitude_min_db: -60.0,
            magnitude_max_db: 10.0,
        }
    }
}

impl PlotSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.f_min_hz > 0.0 && self.f_min_hz < self.f_max_hz && self.f_max_hz.is_finite()) {
            return Err(BiquadrError::InvalidParameter {
                param: "plot.f_min_hz/f_max_hz".to_string(),
                value: format!("{}..{}", self.f_min_hz, self.f_max_hz),
                expected: "0 < f_min_hz < f_max_hz".to_string(),
            });
        }
        if self.points == 0 {
            return Err(BiquadrError::InvalidParameter {
                param: "plot.points".to_string(),
                value: self.points.to_string(),
                expected: "at least one point".to_string(),
            });
        }
        if !(self.magnitude_min_db < self.magnitude_max_db) {
            return Err(BiquadrError::InvalidParameter {
                param: "plot.magnitude_min_db/magnitude_max_db".to_string(),
                value: format!("{}..{}", self.magnitude_min_db, self.magnitude_max_db),
                expected: "magnitude_min_db < magnitude_max_db".to_string(),
            });
        }
        Ok(())
    }

    /// Log-spaced grid over the configured range
    pub fn grid(&self) -> Result<Vec<f64>> {
        log_frequency_grid(self.f_min_hz, self.f_max_hz, self.points)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub plot: PlotSettings,
    /// Sample rate for new projects
    pub default_sample_rate: f64,
    pub export: ExportOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plot: PlotSettings::default(),
            default_sample_rate: DEFAULT_SAMPLE_RATE,
            export: ExportOptions::default(),
        }
    }
}

impl Settings {
    /// Read and validate a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BiquadrError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// `path` if given, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.plot.validate()?;
        check_sample_rate(self.default_sample_rate)?;
        self.export.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataType;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.plot.f_min_hz, 20.0);
        assert_eq!(settings.plot.f_max_hz, 20000.0);
        assert_eq!(settings.plot.points, 1000);
        assert_eq!(settings.default_sample_rate, 48000.0);
        assert_eq!(settings.export.precision_digits, 15);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.plot.grid().unwrap().len(), 1000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"plot": {"points": 256}, "export": {"data_type": "int32", "pad_sections": 8}}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.plot.points, 256);
        assert_eq!(settings.plot.f_max_hz, 20000.0);
        assert_eq!(settings.export.data_type, Some(DataType::Int32));
        assert_eq!(settings.export.pad_sections, Some(8));
        assert_eq!(settings.export.precision_digits, 15);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"plot": {"f_min_hz": 5000.0, "f_max_hz": 100.0}}"#).unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_missing_path_means_defaults() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }
}
