//! JSON renderer and reader

use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::{format_float, ExportDocument, MAX_PRECISION_DIGITS};
use crate::dsp::BiquadSection;
use crate::error::{BiquadrError, Result};
use crate::model::{DataType, FilterType};
use crate::quantize::QuantizedSection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    pub project: String,
    pub target: String,
    pub data_type: DataType,
    pub sample_rate: f64,
    pub biquad_count: usize,
    pub filters: Vec<JsonFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub padding: Vec<JsonSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFilter {
    pub channel: String,
    pub name: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub order: usize,
    pub cutoff_hz: f64,
    pub enabled: bool,
    pub sections: Vec<JsonSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSection {
    pub b0: Number,
    pub b1: Number,
    pub b2: Number,
    pub a1: Number,
    pub a2: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Number>,
}

impl JsonSection {
    fn from_quantized(section: &QuantizedSection, digits: usize) -> Result<Self> {
        let [b0, b1, b2, a1, a2] = match section.values.as_i64() {
            Some(ints) => ints.map(Number::from),
            None => {
                let [b0, b1, b2, a1, a2] = section.values.as_f64();
                [
                    rounded_number(b0, digits)?,
                    rounded_number(b1, digits)?,
                    rounded_number(b2, digits)?,
                    rounded_number(a1, digits)?,
                    rounded_number(a2, digits)?,
                ]
            }
        };
        let scale = section
            .scale
            .map(|s| rounded_number(s, MAX_PRECISION_DIGITS))
            .transpose()?;
        Ok(Self {
            b0,
            b1,
            b2,
            a1,
            a2,
            scale,
        })
    }

    /// Real coefficients, dividing out the scale when present
    pub fn to_section(&self) -> Option<BiquadSection> {
        let scale = match &self.scale {
            Some(s) => s.as_f64()?,
            None => 1.0,
        };
        let values = [
            self.b0.as_f64()?,
            self.b1.as_f64()?,
            self.b2.as_f64()?,
            self.a1.as_f64()?,
            self.a2.as_f64()?,
        ];
        Some(BiquadSection::from_array(values.map(|v| v / scale)))
    }
}

/// Round through the text form so JSON carries exactly `digits` significant digits
fn rounded_number(value: f64, digits: usize) -> Result<Number> {
    let rounded: f64 = format_float(value, digits)
        .parse()
        .map_err(|_| non_finite(value))?;
    Number::from_f64(rounded).ok_or_else(|| non_finite(value))
}

fn non_finite(value: f64) -> BiquadrError {
    BiquadrError::InvalidParameter {
        param: "coefficient".to_string(),
        value: value.to_string(),
        expected: "finite number".to_string(),
    }
}

impl JsonDocument {
    pub fn from_document(document: &ExportDocument, digits: usize) -> Result<Self> {
        let filters = document
            .filters
            .iter()
            .map(|f| {
                Ok(JsonFilter {
                    channel: f.channel.clone(),
                    name: f.name.clone(),
                    filter_type: f.filter_type,
                    order: f.order,
                    cutoff_hz: f.cutoff_hz,
                    enabled: f.enabled,
                    sections: f
                        .quantized
                        .sections
                        .iter()
                        .map(|s| JsonSection::from_quantized(s, digits))
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let padding = document
            .padding
            .iter()
            .map(|s| JsonSection::from_quantized(s, digits))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            project: document.project.clone(),
            target: document.target.clone(),
            data_type: document.data_type,
            sample_rate: document.sample_rate_hz,
            biquad_count: document.section_count(),
            filters,
            padding,
        })
    }

    /// Every section in export order, padding last
    pub fn sections(&self) -> impl Iterator<Item = &JsonSection> {
        self.filters
            .iter()
            .flat_map(|f| f.sections.iter())
            .chain(self.padding.iter())
    }
}

/// Pretty-printed JSON with a trailing newline
pub fn render(document: &ExportDocument, digits: usize) -> Result<String> {
    let json = JsonDocument::from_document(document, digits)?;
    let mut text = serde_json::to_string_pretty(&json)?;
    text.push('\n');
    Ok(text)
}

/// Read back a document written by [`render`]
pub fn parse(text: &str) -> Result<JsonDocument> {
    Ok(serde_json::from_str(text)?)
}
