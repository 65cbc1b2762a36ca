//! CSV renderer
//!
//! One row per section. Padding rows use `identity` as filter name and type.

use ::csv::{Terminator, WriterBuilder};

use super::{format_scale, format_values, ExportDocument};
use crate::error::{BiquadrError, Result};
use crate::quantize::QuantizedSection;

pub const COLUMNS: [&str; 17] = [
    "project",
    "target",
    "data_type",
    "channel",
    "filter",
    "type",
    "order",
    "cutoff_hz",
    "enabled",
    "sample_rate",
    "section",
    "b0",
    "b1",
    "b2",
    "a1",
    "a2",
    "scale",
];

/// Per-filter cells of a row
struct RowLabel<'a> {
    channel: &'a str,
    filter: &'a str,
    kind: &'a str,
    order: String,
    cutoff: String,
    enabled: bool,
}

pub fn render(document: &ExportDocument, digits: usize) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(COLUMNS)?;

    let sample_rate = document.sample_rate_hz.to_string();
    let row = |label: &RowLabel<'_>, index: usize, section: &QuantizedSection| {
        let mut record = vec![
            document.project.clone(),
            document.target.clone(),
            document.data_type.as_str().to_string(),
            label.channel.to_string(),
            label.filter.to_string(),
            label.kind.to_string(),
            label.order.clone(),
            label.cutoff.clone(),
            label.enabled.to_string(),
            sample_rate.clone(),
            index.to_string(),
        ];
        record.extend(format_values(&section.values, digits));
        record.push(section.scale.map(format_scale).unwrap_or_default());
        record
    };

    let mut index = 0;
    for filter in &document.filters {
        let label = RowLabel {
            channel: &filter.channel,
            filter: &filter.name,
            kind: filter.filter_type.as_str(),
            order: filter.order.to_string(),
            cutoff: filter.cutoff_hz.to_string(),
            enabled: filter.enabled,
        };
        for section in &filter.quantized.sections {
            writer.write_record(row(&label, index, section))?;
            index += 1;
        }
    }
    let identity = RowLabel {
        channel: "",
        filter: "identity",
        kind: "identity",
        order: "0".to_string(),
        cutoff: String::new(),
        enabled: true,
    };
    for section in &document.padding {
        writer.write_record(row(&identity, index, section))?;
        index += 1;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| BiquadrError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| BiquadrError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::speaker;
    use crate::export::{ExportDocument, ExportOptions};
    use crate::model::DataType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_header_and_row_count() {
        let (project, target) = speaker();
        let options = ExportOptions {
            pad_sections: Some(7),
            include_disabled: true,
            ..ExportOptions::default()
        };
        let doc = ExportDocument::from_project(&project, &target, &options).unwrap();
        let text = render(&doc, 15).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "project,target,data_type,channel,filter,type,order,cutoff_hz,enabled,sample_rate,section,b0,b1,b2,a1,a2,scale"
        );
        assert_eq!(lines.len(), 1 + 7);
        assert!(lines[1].starts_with("speaker,dsp,int16,woofer,sub,highpass,2,30,true,48000,0,"));
        assert!(lines[6].starts_with("speaker,dsp,int16,tweeter,air,lowpass,2,18000,false,48000,5,"));
        assert!(lines[7].starts_with("speaker,dsp,int16,,identity,identity,0,,true,48000,6,32767,0,0,0,0,"));
    }

    #[test]
    fn test_csv_reads_back_with_csv_reader() {
        let (project, target) = speaker();
        let options = ExportOptions {
            data_type: Some(DataType::Float64),
            ..ExportOptions::default()
        };
        let doc = ExportDocument::from_project(&project, &target, &options).unwrap();
        let text = render(&doc, 15).unwrap();

        let mut reader = ::csv::Reader::from_reader(text.as_bytes());
        let records: Vec<::csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 5);
        assert_eq!(&records[4][3], "tweeter");
        assert_eq!(&records[4][2], "float64");
        assert_eq!(&records[4][16], "");
        let b0: f64 = records[0][11].parse().unwrap();
        let expected = doc.filters[0].quantized.sections[0].dequantize().b0;
        assert!((b0 - expected).abs() < 1e-13);
    }
}
