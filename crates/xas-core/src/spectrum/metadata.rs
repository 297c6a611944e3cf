use serde_json::Value;
use std::collections::BTreeMap;

/// Sample and acquisition context shared by every scan in a container.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanMetadata {
    pub motor: Option<String>,
    pub sample: Option<String>,
    pub date: Option<String>,
    pub command: Option<String>,
    pub loadid: Option<String>,
    /// Scan-info keys without a dedicated field.
    pub scaninfo_extra: BTreeMap<String, Value>,
    /// Instrument positions at acquisition time.
    pub motors: BTreeMap<String, f64>,
}

impl ScanMetadata {
    /// Compares the named scan-info fields only.
    pub fn scalars_eq(&self, other: &Self) -> bool {
        self.motor == other.motor
            && self.sample == other.sample
            && self.date == other.date
            && self.command == other.command
            && self.loadid == other.loadid
    }
}
