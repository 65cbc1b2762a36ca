//! Python source renderer

use std::fmt::{self, Write};

use super::{format_scale, format_values, ExportDocument};
use crate::error::Result;
use crate::quantize::QuantizedSection;

pub fn render(document: &ExportDocument, digits: usize) -> Result<String> {
    let mut out = String::new();
    write_module(&mut out, document, digits)?;
    Ok(out)
}

fn write_module(out: &mut String, document: &ExportDocument, digits: usize) -> fmt::Result {
    writeln!(out, "\"\"\"Biquad coefficients for project {}.", py_str(&document.project))?;
    writeln!(out)?;
    writeln!(out, "Generated by biquadr. Sections are (b0, b1, b2, a1, a2) with a0 = 1.")?;
    if document.data_type.is_fixed_point() {
        writeln!(out, "Divide each section's integers by its entry in SCALES.")?;
    }
    writeln!(out, "\"\"\"")?;
    writeln!(out)?;
    writeln!(out, "PROJECT = {}", py_str(&document.project))?;
    writeln!(out, "TARGET = {}", py_str(&document.target))?;
    writeln!(out, "DATA_TYPE = {}", py_str(document.data_type.as_str()))?;
    writeln!(out, "SAMPLE_RATE = {:?}", document.sample_rate_hz)?;
    writeln!(out, "BIQUAD_COUNT = {}", document.section_count())?;
    writeln!(out)?;

    writeln!(out, "FILTERS = [")?;
    for filter in &document.filters {
        writeln!(out, "    {{")?;
        writeln!(out, "        \"channel\": {},", py_str(&filter.channel))?;
        writeln!(out, "        \"name\": {},", py_str(&filter.name))?;
        writeln!(out, "        \"type\": {},", py_str(filter.filter_type.as_str()))?;
        writeln!(out, "        \"order\": {},", filter.order)?;
        writeln!(out, "        \"cutoff_hz\": {:?},", filter.cutoff_hz)?;
        writeln!(
            out,
            "        \"enabled\": {},",
            if filter.enabled { "True" } else { "False" }
        )?;
        writeln!(out, "        \"sections\": [")?;
        for section in &filter.quantized.sections {
            writeln!(out, "            {},", py_tuple(section, digits))?;
        }
        writeln!(out, "        ],")?;
        writeln!(out, "    }},")?;
    }
    writeln!(out, "]")?;
    writeln!(out)?;

    writeln!(out, "PADDING = [")?;
    for section in &document.padding {
        writeln!(out, "    {},", py_tuple(section, digits))?;
    }
    writeln!(out, "]")?;
    writeln!(out)?;

    writeln!(
        out,
        "COEFFICIENTS = [s for f in FILTERS for s in f[\"sections\"]] + PADDING"
    )?;

    if document.data_type.is_fixed_point() {
        let scales: Vec<String> = document
            .sections()
            .map(|s| format_scale(s.scale.unwrap_or(1.0)))
            .collect();
        writeln!(out, "SCALES = [{}]", scales.join(", "))?;
    }
    Ok(())
}

fn py_tuple(section: &QuantizedSection, digits: usize) -> String {
    format!("({})", format_values(&section.values, digits).join(", "))
}

/// Double-quoted Python string literal
fn py_str(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
