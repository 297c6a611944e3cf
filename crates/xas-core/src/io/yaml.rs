//! YAML header document closed by an explicit `...` end marker, followed by
//! whitespace-separated data rows.

use super::text::{parse_rows, write_rows};
use super::traits::{RawSpectrum, SpectrumReader, SpectrumWriter};
use crate::domain::{XasError, XasResult};
use crate::header::Header;

const DOCUMENT_END: &str = "...";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YamlCodec;

impl SpectrumWriter for YamlCodec {
    fn render(&self, raw: &RawSpectrum) -> XasResult<String> {
        let mut out = serde_yaml::to_string(&raw.header)
            .map_err(|error| XasError::computation("RUN.YAML_ENCODE", error.to_string()))?;
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(DOCUMENT_END);
        out.push('\n');
        write_rows(&mut out, raw.data.view());
        Ok(out)
    }
}

impl SpectrumReader for YamlCodec {
    fn parse(&self, source: &str) -> XasResult<RawSpectrum> {
        let lines: Vec<&str> = source.lines().collect();
        let end = lines
            .iter()
            .position(|line| line.trim_end() == DOCUMENT_END)
            .ok_or_else(|| {
                XasError::input_validation(
                    "INPUT.MALFORMED_HEADER",
                    "YAML header is missing its '...' end marker",
                )
            })?;

        let header: Header = serde_yaml::from_str(&lines[..end].join("\n")).map_err(|error| {
            XasError::input_validation(
                "INPUT.MALFORMED_HEADER",
                format!("YAML header could not be parsed: {error}"),
            )
        })?;
        let data = parse_rows(
            lines[end + 1..].iter().copied(),
            end + 2,
            Some(header.channelinfo.cols.len()),
        )?;
        RawSpectrum::new(data, header)
    }
}
