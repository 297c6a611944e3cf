//! Export-only commented text for Athena: the SSRL header with every line
//! prefixed by `# `, the column names on a single line, then the data rows.

use super::ssrl::{LegacyHeaderLines, single_line};
use super::text::write_rows;
use super::traits::{RawSpectrum, SpectrumWriter};
use crate::domain::XasResult;

const SEPARATOR_WIDTH: usize = 79;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AthenaWriter {
    pub c1: String,
    pub c2: String,
}

impl SpectrumWriter for AthenaWriter {
    fn render(&self, raw: &RawSpectrum) -> XasResult<String> {
        let lines = LegacyHeaderLines::from_raw(raw);
        let header = [
            lines.banner,
            lines.date,
            lines.points,
            lines.sample,
            lines.command,
            lines.slits,
            lines.manipulator,
            lines.scan,
            single_line(&self.c1),
            single_line(&self.c2),
            "Weights:".to_string(),
            lines.weights,
            "Offsets:".to_string(),
            lines.offsets,
            "ROIS:".to_string(),
            String::new(),
            "-".repeat(SEPARATOR_WIDTH),
            raw.header.channelinfo.cols.join(" "),
        ];

        let mut out = String::new();
        for line in header {
            out.push_str("# ");
            out.push_str(&line);
            out.push('\n');
        }
        write_rows(&mut out, raw.data.view());
        Ok(out)
    }
}
