use crate::domain::{XasError, XasResult};
use crate::header::ScanInfo;
use std::path::{Path, PathBuf};

const NAMED_FIELDS: [&str; 6] = ["scan", "motor", "date", "sample", "loadid", "command"];

/// Fills `{key}` placeholders from scan-info fields; `{{` and `}}` are literal braces.
///
/// Named fields that are unset render as `None`. Any other key must be
/// present in the extra scan-info entries.
pub fn render_name(format: &str, scaninfo: &ScanInfo) -> XasResult<String> {
    let mut rendered = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                rendered.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                rendered.push('}');
            }
            '{' => {
                let mut key = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    key.push(next);
                }
                if !closed {
                    return Err(XasError::input_validation(
                        "INPUT.NAME_FORMAT",
                        format!("unterminated placeholder in name format '{format}'"),
                    ));
                }
                rendered.push_str(&field_value(&key, scaninfo)?);
            }
            other => rendered.push(other),
        }
    }

    Ok(rendered)
}

fn field_value(key: &str, scaninfo: &ScanInfo) -> XasResult<String> {
    match scaninfo.field_text(key) {
        Some(text) => Ok(text),
        None if NAMED_FIELDS.contains(&key) => Ok("None".to_string()),
        None => Err(XasError::lookup(
            "LOOKUP.NAME_FORMAT_KEY",
            format!("name format key '{key}' is not a scan-info field"),
        )),
    }
}

/// `path` itself when free, otherwise the first free `stem_N.ext` with N from 1.
pub fn next_available_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|index| path.with_file_name(format!("{stem}_{index}{extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
