//! Whitespace-separated numeric rows shared by the text codecs.

use crate::domain::{XasError, XasResult};
use ndarray::{Array2, ArrayView2};

/// Shortest scientific form that parses back to the same value.
pub(crate) fn format_value(value: f64) -> String {
    format!("{value:>24e}")
}

pub(crate) fn write_rows(out: &mut String, data: ArrayView2<'_, f64>) {
    for row in data.rows() {
        for value in row {
            out.push(' ');
            out.push_str(&format_value(*value));
        }
        out.push('\n');
    }
}

/// Parses data rows, skipping blank and `#` lines. `first_line` is the
/// 1-based file line of the first item, used in error messages.
pub(crate) fn parse_rows<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    first_line: usize,
    expected_cols: Option<usize>,
) -> XasResult<Array2<f64>> {
    let mut values = Vec::new();
    let mut width = expected_cols;
    let mut rows = 0;

    for (offset, line) in lines.into_iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line_number = first_line + offset;
        let row = trimmed
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    XasError::input_validation(
                        "INPUT.MALFORMED_DATA",
                        format!("line {line_number}: '{token}' is not a number"),
                    )
                })
            })
            .collect::<XasResult<Vec<f64>>>()?;

        match width {
            Some(expected) if expected != row.len() => {
                return Err(XasError::input_validation(
                    "INPUT.MALFORMED_DATA",
                    format!(
                        "line {line_number}: expected {expected} values, found {}",
                        row.len()
                    ),
                ));
            }
            Some(_) => {}
            None => width = Some(row.len()),
        }
        values.extend(row);
        rows += 1;
    }

    let Some(width) = width.filter(|_| rows > 0) else {
        return Err(XasError::input_validation(
            "INPUT.EMPTY_DATA",
            "file contains no data rows",
        ));
    };
    Array2::from_shape_vec((rows, width), values)
        .map_err(|error| XasError::input_validation("INPUT.MALFORMED_DATA", error.to_string()))
}

/// Space-joined values using `render` per entry, each preceded by a space.
pub(crate) fn join_values(values: impl IntoIterator<Item = f64>, render: fn(f64) -> String) -> String {
    values
        .into_iter()
        .map(|value| format!(" {:>7}", render(value)))
        .collect()
}
