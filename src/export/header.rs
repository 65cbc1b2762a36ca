//! C header renderer

use std::fmt::{self, Write};

use super::{format_scale, format_values, identifier, ExportDocument};
use crate::error::Result;
use crate::model::DataType;

/// Render a self-contained C header.
///
/// Coefficients go into one `[count][5]` array in export order. Fixed-point
/// documents also get a per-section scale array; divide each integer by its
/// section's scale to recover the real coefficient.
pub fn render(document: &ExportDocument, digits: usize) -> Result<String> {
    let mut out = String::new();
    write_header(&mut out, document, digits)?;
    Ok(out)
}

fn write_header(out: &mut String, document: &ExportDocument, digits: usize) -> fmt::Result {
    let ident = identifier(&document.project);
    let upper = ident.to_ascii_uppercase();
    let lower = ident.to_ascii_lowercase();
    let count = document.section_count();
    let suffix = if document.data_type == DataType::Float32 { "f" } else { "" };

    writeln!(out, "/* Biquad coefficients generated by biquadr */")?;
    writeln!(out, "/* Project: {} */", comment_safe(&document.project))?;
    writeln!(out, "/* Target: {} */", comment_safe(&document.target))?;
    writeln!(out, "/* Data type: {} */", document.data_type)?;
    writeln!(out, "/* Sample rate: {} Hz */", document.sample_rate_hz)?;
    writeln!(out)?;
    writeln!(out, "#ifndef {}_BIQUAD_H", upper)?;
    writeln!(out, "#define {}_BIQUAD_H", upper)?;
    writeln!(out)?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out)?;
    writeln!(out, "#define {}_SAMPLE_RATE {}", upper, document.sample_rate_hz)?;
    writeln!(out, "#define {}_BIQUAD_COUNT {}", upper, count)?;
    writeln!(out)?;

    if count == 0 {
        writeln!(out, "/* No sections */")?;
    } else {
        writeln!(out, "/* Per section: b0, b1, b2, a1, a2 (a0 = 1) */")?;
        writeln!(
            out,
            "static const {} {}_coefficients[{}_BIQUAD_COUNT][5] = {{",
            document.data_type.c_type(),
            lower,
            upper
        )?;
        for filter in &document.filters {
            writeln!(
                out,
                "    /* {}/{}: {}, order {}, {} Hz{} */",
                comment_safe(&filter.channel),
                comment_safe(&filter.name),
                filter.filter_type,
                filter.order,
                filter.cutoff_hz,
                if filter.enabled { "" } else { ", disabled" }
            )?;
            for section in &filter.quantized.sections {
                writeln!(out, "    {},", c_row(&format_values(&section.values, digits), suffix))?;
            }
        }
        if !document.padding.is_empty() {
            writeln!(out, "    /* identity padding */")?;
            for section in &document.padding {
                writeln!(out, "    {},", c_row(&format_values(&section.values, digits), suffix))?;
            }
        }
        writeln!(out, "}};")?;

        if document.data_type.is_fixed_point() {
            let scales: Vec<String> = document
                .sections()
                .map(|s| format_scale(s.scale.unwrap_or(1.0)))
                .collect();
            writeln!(out)?;
            writeln!(out, "/* Divide each section's integers by its scale */")?;
            writeln!(
                out,
                "static const double {}_scales[{}_BIQUAD_COUNT] = {{ {} }};",
                lower,
                upper,
                scales.join(", ")
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "#endif /* {}_BIQUAD_H */", upper)
}

fn c_row(values: &[String; 5], suffix: &str) -> String {
    let cells: Vec<String> = values.iter().map(|v| format!("{}{}", v, suffix)).collect();
    format!("{{ {} }}", cells.join(", "))
}

/// Names land inside block comments
fn comment_safe(text: &str) -> String {
    text.replace("*/", "* /")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::speaker;
    use crate::export::{ExportDocument, ExportOptions};

    #[test]
    fn test_fixed_point_header_layout() {
        let (project, target) = speaker();
        let doc = ExportDocument::from_project(&project, &target, &ExportOptions::default()).unwrap();
        let text = render(&doc, 15).unwrap();

        assert!(text.contains("#ifndef SPEAKER_BIQUAD_H"));
        assert!(text.contains("#include <stdint.h>"));
        assert!(text.contains("#define SPEAKER_BIQUAD_COUNT 5"));
        assert!(text.contains("#define SPEAKER_SAMPLE_RATE 48000"));
        assert!(text.contains("static const int16_t speaker_coefficients[SPEAKER_BIQUAD_COUNT][5]"));
        assert!(text.contains("/* woofer/sub: highpass, order 2, 30 Hz */"));
        assert!(text.contains("speaker_scales[SPEAKER_BIQUAD_COUNT]"));
        assert!(text.trim_end().ends_with("#endif /* SPEAKER_BIQUAD_H */"));
    }

    #[test]
    fn test_float32_literals_have_suffix() {
        let (project, target) = speaker();
        let options = ExportOptions {
            data_type: Some(DataType::Float32),
            ..ExportOptions::default()
        };
        let doc = ExportDocument::from_project(&project, &target, &options).unwrap();
        let text = render(&doc, 9).unwrap();

        assert!(text.contains("static const float speaker_coefficients"));
        assert!(!text.contains("_scales"));
        let row = text
            .lines()
            .find(|l| l.trim_start().starts_with("{ "))
            .unwrap();
        assert_eq!(row.matches("f,").count() + row.matches("f }").count(), 5);
    }

    #[test]
    fn test_scales_keep_full_precision_at_low_digits() {
        let (project, target) = speaker();
        let doc = ExportDocument::from_project(&project, &target, &ExportOptions::default()).unwrap();
        let text = render(&doc, 2).unwrap();
        let line = text.lines().find(|l| l.contains("speaker_scales")).unwrap();
        let list = &line[line.find('{').unwrap() + 1..line.rfind('}').unwrap()];
        let printed: Vec<f64> = list.split(',').map(|v| v.trim().parse().unwrap()).collect();
        let exact: Vec<f64> = doc.sections().map(|s| s.scale.unwrap()).collect();
        assert_eq!(printed, exact);
    }

    #[test]
    fn test_empty_project_has_no_array() {
        let (mut project, target) = speaker();
        project.remove_channel("woofer");
        project.remove_channel("tweeter");
        let doc = ExportDocument::from_project(&project, &target, &ExportOptions::default()).unwrap();
        let text = render(&doc, 15).unwrap();
        assert!(text.contains("#define SPEAKER_BIQUAD_COUNT 0"));
        assert!(!text.contains("speaker_coefficients"));
    }
}
