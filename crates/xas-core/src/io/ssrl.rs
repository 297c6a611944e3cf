//! Fixed-layout SSRL `.dat` text files.
//!
//! The header is exactly `20 + ncols` lines: nineteen fixed lines, one line
//! per column name and a blank separator. Data rows follow.
//!
//! The layout is lossy for metadata: it has no line for the `motor` scan-info
//! field, and the sample, loadid, date and command values are read back with
//! surrounding whitespace trimmed. A `Scan: None` line reads as no scan id.

use super::text::{join_values, parse_rows, write_rows};
use super::traits::{RawSpectrum, SpectrumReader, SpectrumWriter};
use crate::common::constants::{SSRL_MANIPULATOR_MOTORS, SSRL_SLIT_MOTORS};
use crate::domain::{XasError, XasResult};
use crate::header::{ChannelInfo, Header, ScanField, ScanInfo, infer_channel_roles};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const FIXED_HEADER_LINES: usize = 19;
const BANNER: &str = "NSLS";
const CONTROL_LINE: &str = "4 2000 5 RST 2 1";
const UNSET_SCAN: &str = "None";

/// SSRL reader and writer. `c1` and `c2` fill the two free comment lines on write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsrlCodec {
    pub c1: String,
    pub c2: String,
}

impl SsrlCodec {
    pub fn with_comments(c1: impl Into<String>, c2: impl Into<String>) -> Self {
        Self {
            c1: c1.into(),
            c2: c2.into(),
        }
    }
}

/// Header lines shared by the SSRL and Athena layouts.
pub(crate) struct LegacyHeaderLines {
    pub banner: String,
    pub date: String,
    pub points: String,
    pub sample: String,
    pub command: String,
    pub slits: String,
    pub manipulator: String,
    pub scan: String,
    pub weights: String,
    pub offsets: String,
}

impl LegacyHeaderLines {
    pub(crate) fn from_raw(raw: &RawSpectrum) -> Self {
        let Header {
            scaninfo,
            motors,
            channelinfo,
        } = &raw.header;
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let motor = |name: &str| motors.get(name).copied().unwrap_or(0.0);

        let weights = channelinfo
            .cols
            .iter()
            .map(|col| channelinfo.weights.get(col).copied().unwrap_or(1.0));
        let offsets = channelinfo
            .cols
            .iter()
            .map(|col| channelinfo.offsets.get(col).copied().unwrap_or(0.0));

        Self {
            banner: format!("{BANNER:<38}"),
            date: single_line(&text(&scaninfo.date)),
            points: format!("PTS:{:>11} COLS: {:>11}", raw.data.nrows(), raw.data.ncols()),
            sample: format!(
                "Sample: {}   loadid: {}",
                single_line(&text(&scaninfo.sample)),
                single_line(&text(&scaninfo.loadid))
            ),
            command: format!("Command: {}", single_line(&text(&scaninfo.command))),
            slits: format!(
                "Slits: {:.2} {:.2}",
                motor(SSRL_SLIT_MOTORS[0]),
                motor(SSRL_SLIT_MOTORS[1])
            ),
            manipulator: format!(
                "Maniplator Position (XYZ): {:.2} {:.2} {:.2} {:.2}",
                motor(SSRL_MANIPULATOR_MOTORS[0]),
                motor(SSRL_MANIPULATOR_MOTORS[1]),
                motor(SSRL_MANIPULATOR_MOTORS[2]),
                motor(SSRL_MANIPULATOR_MOTORS[3])
            ),
            scan: format!(
                "Scan: {}",
                scaninfo.scan.as_ref().map(ToString::to_string).unwrap_or_default()
            ),
            weights: join_values(weights, |value| value.to_string()),
            offsets: join_values(offsets, |value| format!("{value:e}")),
        }
    }
}

pub(crate) fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

impl SpectrumWriter for SsrlCodec {
    fn render(&self, raw: &RawSpectrum) -> XasResult<String> {
        let lines = LegacyHeaderLines::from_raw(raw);
        let mut out = [
            lines.banner,
            lines.date,
            lines.points,
            "scaler_file".to_string(),
            "region_file".to_string(),
            String::new(),
            CONTROL_LINE.to_string(),
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
            "Data:".to_string(),
        ]
        .join("\n");
        out.push('\n');
        for col in &raw.header.channelinfo.cols {
            out.push_str(col);
            out.push('\n');
        }
        out.push('\n');
        write_rows(&mut out, raw.data.view());
        Ok(out)
    }
}

impl SpectrumReader for SsrlCodec {
    fn parse(&self, source: &str) -> XasResult<RawSpectrum> {
        let lines: Vec<&str> = source.lines().collect();
        let line = |index: usize| lines.get(index).copied().unwrap_or("");

        let (npts, ncols) = parse_counts(line(2))?;
        if lines.len() < FIXED_HEADER_LINES + ncols + 1 {
            return Err(XasError::input_validation(
                "INPUT.MALFORMED_HEADER",
                format!(
                    "SSRL header needs {} lines for {} columns, file has {}",
                    FIXED_HEADER_LINES + ncols + 1,
                    ncols,
                    lines.len()
                ),
            ));
        }

        let (sample, loadid) = parse_sample_line(line(7));
        let scan = match present(line(11).trim().strip_prefix("Scan:").unwrap_or("")) {
            Some(UNSET_SCAN) | None => None,
            Some(text) => Some(text.parse::<ScanField>()?),
        };
        let scaninfo = ScanInfo {
            scan,
            date: present(line(1)).map(str::to_string),
            sample,
            loadid,
            command: line(8)
                .strip_prefix("Command:")
                .and_then(present)
                .map(str::to_string),
            ..ScanInfo::default()
        };

        let cols: Vec<String> = lines[FIXED_HEADER_LINES..FIXED_HEADER_LINES + ncols]
            .iter()
            .map(|col| col.trim_end().to_string())
            .collect();
        let weights = parse_channel_line(line(15), &cols, 1.0, "weights");
        let offsets = parse_channel_line(line(17), &cols, 0.0, "offsets");

        let mut motors = BTreeMap::new();
        parse_motor_values(
            line(9).split_whitespace().skip(1),
            &SSRL_SLIT_MOTORS,
            &mut motors,
        );
        parse_motor_values(
            line(10).rsplit(':').next().unwrap_or("").split_whitespace(),
            &SSRL_MANIPULATOR_MOTORS,
            &mut motors,
        );

        let data_start = FIXED_HEADER_LINES + ncols + 1;
        let data = parse_rows(lines[data_start..].iter().copied(), data_start + 1, Some(ncols))?;
        if data.nrows() != npts {
            debug!(declared = npts, found = data.nrows(), "SSRL point count differs from header");
        }

        let coltypes = Some(infer_channel_roles(&cols));
        RawSpectrum::new(
            data,
            Header {
                scaninfo,
                motors,
                channelinfo: ChannelInfo {
                    cols,
                    coltypes,
                    weights,
                    offsets,
                },
            },
        )
    }
}

fn parse_counts(line: &str) -> XasResult<(usize, usize)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let count = |index: usize| tokens.get(index).and_then(|token| token.parse::<usize>().ok());
    match (tokens.first(), count(1), count(3)) {
        (Some(&"PTS:"), Some(npts), Some(ncols)) => Ok((npts, ncols)),
        _ => Err(XasError::input_validation(
            "INPUT.MALFORMED_HEADER",
            format!("expected 'PTS: <n> COLS: <n>' on line 3, found '{line}'"),
        )),
    }
}

fn present(text: &str) -> Option<&str> {
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

fn parse_sample_line(line: &str) -> (Option<String>, Option<String>) {
    let body = line.trim().strip_prefix("Sample:").unwrap_or(line);
    let (sample, loadid) = body.split_once("loadid:").unwrap_or((body, ""));
    (
        present(sample).map(str::to_string),
        present(loadid).map(str::to_string),
    )
}

/// Reads one value per column; a line of the wrong length or with a bad
/// value falls back to `default` for every column.
fn parse_channel_line(
    line: &str,
    cols: &[String],
    default: f64,
    label: &str,
) -> BTreeMap<String, f64> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let parsed = if tokens.len() == cols.len() {
        tokens
            .iter()
            .map(|token| token.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .ok()
    } else {
        None
    };

    let values = parsed.unwrap_or_else(|| {
        warn!(
            line = line.trim(),
            expected = cols.len(),
            found = tokens.len(),
            "malformed {label} line; using {default} for every channel"
        );
        vec![default; cols.len()]
    });
    cols.iter().cloned().zip(values).collect()
}

/// Sets every motor in `names` only when all of them parse.
fn parse_motor_values<'a>(
    tokens: impl Iterator<Item = &'a str>,
    names: &[&str],
    motors: &mut BTreeMap<String, f64>,
) {
    let values: Option<Vec<f64>> = tokens
        .take(names.len())
        .map(|token| token.parse::<f64>().ok())
        .collect();
    match values {
        Some(values) if values.len() == names.len() => {
            for (name, value) in names.iter().zip(values) {
                motors.insert((*name).to_string(), value);
            }
        }
        _ => debug!(motors = ?names, "motor positions missing from SSRL header"),
    }
}
