//! Coefficient export
//!
//! A project is designed, quantized and collected into an [`ExportDocument`];
//! the renderers turn that document into text. Every renderer walks the
//! same data in the same order (filter, then section, then b0 b1 b2 a1 a2),
//! so the formats differ in syntax only.
//!
//! Numbers never go through locale-aware formatting. Floating values are
//! written in scientific notation with `precision_digits` significant digits.
//! Fixed-point integers are exact, and their scale factors are always written
//! with enough digits to round-trip.

pub mod csv;
pub mod header;
pub mod json;
pub mod source;

use std::fmt;
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::dsp::{Cascade, CascadeCache};
use crate::error::{BiquadrError, Result};
use crate::model::{DataType, DesignedFilter, FilterType, Project, Target};
use crate::quantize::{
    quantize, PrecisionWarning, QuantizeOptions, QuantizedCascade, QuantizedSection,
    QuantizedValues, ScalePolicy, DEFAULT_TOLERANCE,
};

/// Default number of significant digits for floating coefficients
pub const DEFAULT_PRECISION_DIGITS: usize = 15;
/// Enough significant digits to round-trip any f64
pub const MAX_PRECISION_DIGITS: usize = 17;

/// Output syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// C header with static coefficient arrays
    Header,
    Json,
    Csv,
    /// Python module
    Source,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Header,
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Source,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Header => "header",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Source => "source",
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Header => "h",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Source => "py",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = BiquadrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" | "h" | "c" | "c-header" => Ok(ExportFormat::Header),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "source" | "python" | "py" => Ok(ExportFormat::Source),
            other => Err(BiquadrError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Caller-controlled export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Override the target's representation
    pub data_type: Option<DataType>,
    /// Significant digits for floating values
    pub precision_digits: usize,
    /// Export disabled channels and filters too
    pub include_disabled: bool,
    /// Pad with identity sections up to this many sections in total
    pub pad_sections: Option<usize>,
    /// Relative tolerance for float32 narrowing warnings
    pub tolerance: f64,
    pub scale_policy: ScalePolicy,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            data_type: None,
            precision_digits: DEFAULT_PRECISION_DIGITS,
            include_disabled: false,
            pad_sections: None,
            tolerance: DEFAULT_TOLERANCE,
            scale_policy: ScalePolicy::default(),
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PRECISION_DIGITS).contains(&self.precision_digits) {
            return Err(BiquadrError::InvalidParameter {
                param: "precision_digits".to_string(),
                value: self.precision_digits.to_string(),
                expected: format!("1 to {}", MAX_PRECISION_DIGITS),
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(BiquadrError::InvalidParameter {
                param: "tolerance".to_string(),
                value: self.tolerance.to_string(),
                expected: "finite, non-negative relative tolerance".to_string(),
            });
        }
        Ok(())
    }

    fn quantize_options(&self, data_type: DataType) -> QuantizeOptions {
        QuantizeOptions::new(data_type)
            .with_tolerance(self.tolerance)
            .with_scale_policy(self.scale_policy)
    }
}

/// One filter's quantized cascade plus the metadata every format lists
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFilter {
    pub channel: String,
    pub name: String,
    pub filter_type: FilterType,
    pub order: usize,
    pub cutoff_hz: f64,
    pub enabled: bool,
    pub quantized: QuantizedCascade,
}

/// Everything a renderer needs, already quantized
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub project: String,
    pub target: String,
    pub data_type: DataType,
    pub sample_rate_hz: f64,
    pub filters: Vec<ExportedFilter>,
    /// Identity sections appended after the last filter
    pub padding: Vec<QuantizedSection>,
}

impl ExportDocument {
    /// Validate, design and quantize `project` for `target`
    pub fn from_project(project: &Project, target: &Target, options: &ExportOptions) -> Result<Self> {
        Self::from_project_with(project, target, options, &mut CascadeCache::new())
    }

    pub fn from_project_with(
        project: &Project,
        target: &Target,
        options: &ExportOptions,
        cache: &mut CascadeCache,
    ) -> Result<Self> {
        options.validate()?;
        project.validate(target)?;
        let designed = project.design_filters(options.include_disabled, cache)?;
        Self::assemble(
            &project.name,
            target,
            project.sample_rate(),
            &designed,
            options,
        )
    }

    /// Build a document from cascades that were designed elsewhere
    pub fn from_designed(
        project_name: &str,
        target: &Target,
        sample_rate_hz: f64,
        designed: &[DesignedFilter],
        options: &ExportOptions,
    ) -> Result<Self> {
        options.validate()?;
        for d in designed {
            target.check_order(d.filter.order)?;
        }
        Self::assemble(project_name, target, sample_rate_hz, designed, options)
    }

    /// Quantize already validated cascades and add padding
    fn assemble(
        project_name: &str,
        target: &Target,
        sample_rate_hz: f64,
        designed: &[DesignedFilter],
        options: &ExportOptions,
    ) -> Result<Self> {
        let data_type = options.data_type.unwrap_or(target.data_type);
        let quantize_options = options.quantize_options(data_type);

        let filters = designed
            .iter()
            .map(|d| {
                Ok(ExportedFilter {
                    channel: d.channel.clone(),
                    name: d.filter.name.clone(),
                    filter_type: d.filter.filter_type,
                    order: d.filter.order,
                    cutoff_hz: d.filter.cutoff_hz,
                    enabled: d.filter.enabled,
                    quantized: quantize(&d.cascade, &quantize_options)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let used: usize = filters.iter().map(|f| f.quantized.len()).sum();
        let padding = match options.pad_sections {
            Some(total) if total > used => {
                let mut identity = Cascade::default();
                identity.pad_to(total - used);
                quantize(&identity, &quantize_options)?.sections
            }
            _ => Vec::new(),
        };

        Ok(Self {
            project: project_name.to_string(),
            target: target.name.clone(),
            data_type,
            sample_rate_hz,
            filters,
            padding,
        })
    }

    /// Total sections including padding
    pub fn section_count(&self) -> usize {
        self.filters.iter().map(|f| f.quantized.len()).sum::<usize>() + self.padding.len()
    }

    /// Every section in export order, padding last
    pub fn sections(&self) -> impl Iterator<Item = &QuantizedSection> {
        self.filters
            .iter()
            .flat_map(|f| f.quantized.sections.iter())
            .chain(self.padding.iter())
    }

    /// Float32 narrowing warnings together with the filter they belong to
    pub fn warnings(&self) -> impl Iterator<Item = (&ExportedFilter, &PrecisionWarning)> {
        self.filters
            .iter()
            .flat_map(|f| f.quantized.warnings.iter().map(move |w| (f, w)))
    }
}

/// A rendered document destined for a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content: String,
}

/// Render `document` in `format`
pub fn render(document: &ExportDocument, format: ExportFormat, options: &ExportOptions) -> Result<String> {
    options.validate()?;
    let digits = options.precision_digits;
    match format {
        ExportFormat::Header => header::render(document, digits),
        ExportFormat::Json => json::render(document, digits),
        ExportFormat::Csv => csv::render(document, digits),
        ExportFormat::Source => source::render(document, digits),
    }
}

/// Design, quantize and render a whole project
pub fn export_project(
    project: &Project,
    target: &Target,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<String> {
    let document = ExportDocument::from_project(project, target, options)?;
    let content = render(&document, format, options)?;
    info!(
        "Exported project '{}' as {} ({} sections, {})",
        project.name,
        format,
        document.section_count(),
        document.data_type
    );
    Ok(content)
}

/// One document per channel, named `<project>_<channel>`, file `<channel>.<ext>`
pub fn export_channels(
    project: &Project,
    target: &Target,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<Vec<ExportedFile>> {
    let mut cache = CascadeCache::new();
    let mut files = Vec::new();
    for channel in project.channels() {
        if !channel.enabled && !options.include_disabled {
            continue;
        }
        let single = project.single_channel(&channel.name)?;
        let document = ExportDocument::from_project_with(&single, target, options, &mut cache)?;
        files.push(ExportedFile {
            file_name: format!("{}.{}", channel.name, format.extension()),
            content: render(&document, format, options)?,
        });
    }
    info!(
        "Exported {} channels of project '{}' as {}",
        files.len(),
        project.name,
        format
    );
    Ok(files)
}

/// SHA-256 of the rendered text, lowercase hex
pub fn checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Scientific notation with `digits` significant digits; negative zero prints as zero
pub(crate) fn format_float(value: f64, digits: usize) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.*e}", digits.saturating_sub(1), value)
}

/// Fixed-point scale as text. Always at round-trip precision, since a
/// truncated scale shifts every recovered coefficient by far more than one LSB.
pub(crate) fn format_scale(scale: f64) -> String {
    format_float(scale, MAX_PRECISION_DIGITS)
}

/// Stored values of a section as text: integers for fixed point, floats otherwise
pub(crate) fn format_values(values: &QuantizedValues, digits: usize) -> [String; 5] {
    match values.as_i64() {
        Some(ints) => ints.map(|v| v.to_string()),
        None => values.as_f64().map(|v| format_float(v, digits)),
    }
}

/// Identifier safe for C and Python: ASCII alphanumerics and underscores, not starting with a digit
pub(crate) fn identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
