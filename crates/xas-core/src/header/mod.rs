//! Flat `scaninfo` / `motors` / `channelinfo` header shared by the file codecs.

pub mod adapter;

use crate::domain::{ChannelRole, ScanId, XasError, XasResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub scaninfo: ScanInfo,
    #[serde(default)]
    pub motors: BTreeMap<String, f64>,
    pub channelinfo: ChannelInfo,
}

impl Header {
    pub fn new(cols: Vec<String>, scan: ScanId) -> Self {
        Self {
            scaninfo: ScanInfo {
                scan: Some(ScanField::Single(scan)),
                ..ScanInfo::default()
            },
            motors: BTreeMap::new(),
            channelinfo: ChannelInfo {
                cols,
                ..ChannelInfo::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanInfo {
    #[serde(default)]
    pub scan: Option<ScanField>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub motor: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub sample: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub loadid: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub command: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ScanInfo {
    /// Text for a scan-info key as it appears in file names and headers.
    pub fn field_text(&self, key: &str) -> Option<String> {
        let named = match key {
            "scan" => return self.scan.as_ref().map(ToString::to_string),
            "motor" => &self.motor,
            "date" => &self.date,
            "sample" => &self.sample,
            "loadid" => &self.loadid,
            "command" => &self.command,
            _ => {
                return self.extra.get(key).map(|value| match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                });
            }
        };
        named.clone()
    }
}

/// Strings, numbers and booleans are all kept as text; null and empty text are absent.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) if text.is_empty() => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// A single scan id, or the sorted ids of an accumulated container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanField {
    Single(ScanId),
    Many(Vec<ScanId>),
}

impl ScanField {
    pub fn first(&self) -> Option<ScanId> {
        match self {
            Self::Single(scan) => Some(*scan),
            Self::Many(scans) => scans.first().copied(),
        }
    }

    pub fn ids(&self) -> Vec<ScanId> {
        match self {
            Self::Single(scan) => vec![*scan],
            Self::Many(scans) => scans.clone(),
        }
    }

    /// Sorted, de-duplicated ids collapsed to `Single` when only one remains.
    pub fn from_ids(ids: &[ScanId]) -> Option<Self> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        match ids.as_slice() {
            [] => None,
            [scan] => Some(Self::Single(*scan)),
            _ => Some(Self::Many(ids)),
        }
    }
}

impl Display for ScanField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(scan) => write!(f, "{scan}"),
            Self::Many(scans) => {
                let joined: Vec<String> = scans.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

impl FromStr for ScanField {
    type Err = XasError;

    fn from_str(text: &str) -> XasResult<Self> {
        let text = text.trim();
        let invalid = || {
            XasError::input_validation(
                "INPUT.SCAN_FIELD",
                format!("'{text}' is not a scan id or a bracketed list of scan ids"),
            )
        };

        if let Some(inner) = text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let scans = inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| item.parse::<ScanId>().map_err(|_| invalid()))
                .collect::<XasResult<Vec<_>>>()?;
            return Ok(Self::Many(scans));
        }
        text.parse::<ScanId>().map(Self::Single).map_err(|_| invalid())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub cols: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coltypes: Option<Vec<ChannelRole>>,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub offsets: BTreeMap<String, f64>,
}

pub fn infer_channel_roles<S: AsRef<str>>(cols: &[S]) -> Vec<ChannelRole> {
    cols.iter().map(|name| ChannelRole::infer(name.as_ref())).collect()
}
