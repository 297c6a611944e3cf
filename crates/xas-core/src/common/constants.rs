//! Fixed channel names and processing constants shared across the crate.

pub const MONO_CHANNEL: &str = "MONO";
pub const REFERENCE_CHANNEL: &str = "REF";

pub const MOTOR_CHANNELS: [&str; 3] = ["Seconds", "ENERGY_ENC", "MONO"];
pub const SENSOR_CHANNELS: [&str; 1] = ["TEMP"];

pub const DEFAULT_CALIBRATION_WIDTH: f64 = 5.0;
/// Half-width of the dense peak refinement around the seed sample.
pub const PEAK_REFINE_HALF_WIDTH: f64 = 1.0;
pub const PEAK_REFINE_SAMPLES: usize = 100;
pub const OFFSET_STD_WARNING: f64 = 0.3;
pub const OFFSET_MEAN_WARNING: f64 = 0.5;

pub const SAVGOL_WINDOW: usize = 7;
pub const SAVGOL_ORDER: usize = 3;

pub const BASELINE_POINTS: usize = 10;
pub const TAIL_POINTS: usize = 10;

pub const DEFAULT_YAML_NAME_FORMAT: &str = "{sample}_{scan}.yaml";
pub const DEFAULT_SSRL_NAME_FORMAT: &str = "{sample}_{scan}.dat";

pub const SSRL_SLIT_MOTORS: [&str; 2] = ["entnslt", "exslit"];
pub const SSRL_MANIPULATOR_MOTORS: [&str; 4] = ["samplex", "sampley", "samplez", "sampler"];

#[cfg(test)]
mod tests {
    use super::{MONO_CHANNEL, MOTOR_CHANNELS, SAVGOL_ORDER, SAVGOL_WINDOW};

    #[test]
    fn mono_is_a_motor_channel() {
        assert!(MOTOR_CHANNELS.contains(&MONO_CHANNEL));
    }

    #[test]
    fn smoothing_window_supports_its_order() {
        assert_eq!(SAVGOL_WINDOW % 2, 1);
        assert!(SAVGOL_ORDER < SAVGOL_WINDOW);
    }
}
