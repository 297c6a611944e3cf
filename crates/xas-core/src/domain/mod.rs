pub mod errors;

pub use errors::{XasError, XasErrorCategory, XasResult};

use crate::common::constants::{MOTOR_CHANNELS, SENSOR_CHANNELS};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Scan identifiers come from the acquisition system and are not required to be contiguous.
pub type ScanId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeasurementKind {
    #[default]
    Xas,
    Rixs,
}

impl MeasurementKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Xas => "XAS",
            Self::Rixs => "RIXS",
        }
    }
}

impl Display for MeasurementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRole {
    Motor,
    Sensor,
    Detector,
}

impl ChannelRole {
    /// Fixed-list classification used when a header carries no `coltypes`.
    pub fn infer(name: &str) -> Self {
        if MOTOR_CHANNELS.contains(&name) {
            Self::Motor
        } else if SENSOR_CHANNELS.contains(&name) {
            Self::Sensor
        } else {
            Self::Detector
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Motor => "motor",
            Self::Sensor => "sensor",
            Self::Detector => "detector",
        }
    }
}

impl Display for ChannelRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// How accumulation treats operands whose ordered channel lists differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMismatchPolicy {
    #[default]
    Reject,
    /// Union of channels; absent data become NaN and absent metadata stay unset.
    FillNan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    #[default]
    Sum,
    Mean,
}

#[cfg(test)]
mod tests {
    use super::{Aggregate, ChannelMismatchPolicy, ChannelRole, MeasurementKind};

    #[test]
    fn channel_roles_follow_fixed_name_lists() {
        assert_eq!(ChannelRole::infer("MONO"), ChannelRole::Motor);
        assert_eq!(ChannelRole::infer("Seconds"), ChannelRole::Motor);
        assert_eq!(ChannelRole::infer("ENERGY_ENC"), ChannelRole::Motor);
        assert_eq!(ChannelRole::infer("TEMP"), ChannelRole::Sensor);
        assert_eq!(ChannelRole::infer("I0"), ChannelRole::Detector);
        assert_eq!(ChannelRole::infer("mono"), ChannelRole::Detector);
    }

    #[test]
    fn defaults_match_strict_sum_semantics() {
        assert_eq!(MeasurementKind::default().to_string(), "XAS");
        assert_eq!(ChannelMismatchPolicy::default(), ChannelMismatchPolicy::Reject);
        assert_eq!(Aggregate::default(), Aggregate::Sum);
    }

    #[test]
    fn roles_and_policies_use_lowercase_wire_names() {
        let roles: Vec<ChannelRole> =
            serde_json::from_str(r#"["motor","sensor","detector"]"#).expect("roles parse");
        assert_eq!(
            roles,
            vec![ChannelRole::Motor, ChannelRole::Sensor, ChannelRole::Detector]
        );

        let policy: ChannelMismatchPolicy =
            serde_json::from_str(r#""fill_nan""#).expect("policy parse");
        assert_eq!(policy, ChannelMismatchPolicy::FillNan);
    }
}
