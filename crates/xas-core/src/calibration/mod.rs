pub mod corrector;
pub mod peak;

pub use corrector::{correct_mono, correct_mono_batch};
pub use peak::{PeakSearch, find_offsets, locate_peak};

use crate::common::constants::{
    DEFAULT_CALIBRATION_WIDTH, OFFSET_MEAN_WARNING, OFFSET_STD_WARNING, REFERENCE_CHANNEL,
};
use crate::domain::XasResult;
use crate::numerics::{mean, std_dev};
use ndarray::ArrayView2;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOptions {
    pub col: String,
    pub width: f64,
    pub smooth: bool,
    pub shift: f64,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            col: REFERENCE_CHANNEL.to_string(),
            width: DEFAULT_CALIBRATION_WIDTH,
            smooth: false,
            shift: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationDiagnostics {
    pub mean_offset: f64,
    pub std_offset: f64,
    pub high_variance: bool,
    pub high_mean: bool,
}

impl CalibrationDiagnostics {
    pub fn from_offsets(offsets: &[f64]) -> Self {
        let mean_offset = mean(offsets).unwrap_or(0.0);
        let std_offset = std_dev(offsets).unwrap_or(0.0);
        Self {
            mean_offset,
            std_offset,
            high_variance: std_offset > OFFSET_STD_WARNING,
            high_mean: mean_offset.abs() > OFFSET_MEAN_WARNING,
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.high_variance && !self.high_mean
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub edge: f64,
    pub channel: String,
    pub offsets: Vec<f64>,
    pub peaks: Vec<f64>,
    pub diagnostics: CalibrationDiagnostics,
}

/// Runs the peak search on every scan column and summarizes the resulting offsets.
pub fn calibrate(
    x: ArrayView2<'_, f64>,
    y: ArrayView2<'_, f64>,
    edge: f64,
    options: &CalibrationOptions,
) -> XasResult<CalibrationReport> {
    let search = PeakSearch {
        nominal: edge,
        width: options.width,
        smooth: options.smooth,
        shift: options.shift,
    };
    let (offsets, peaks) = find_offsets(x, y, &search)?;
    let diagnostics = CalibrationDiagnostics::from_offsets(&offsets);

    if diagnostics.high_variance {
        warn!(
            std = diagnostics.std_offset,
            threshold = OFFSET_STD_WARNING,
            "calibration offsets vary strongly between scans; check the reference channel"
        );
    }
    if diagnostics.high_mean {
        warn!(
            mean = diagnostics.mean_offset,
            threshold = OFFSET_MEAN_WARNING,
            "mean calibration offset is large; check the edge energy"
        );
    }
    info!(
        edge,
        channel = %options.col,
        scans = offsets.len(),
        mean = diagnostics.mean_offset,
        clean = diagnostics.is_clean(),
        "computed monochromator offsets"
    );

    Ok(CalibrationReport {
        edge,
        channel: options.col.clone(),
        offsets,
        peaks,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::{CalibrationDiagnostics, CalibrationOptions};

    #[test]
    fn default_options_target_the_reference_channel() {
        let options = CalibrationOptions::default();
        assert_eq!(options.col, "REF");
        assert_eq!(options.width, 5.0);
        assert!(!options.smooth);
        assert_eq!(options.shift, 0.0);
    }

    #[test]
    fn diagnostics_flag_spread_and_bias() {
        let tight = CalibrationDiagnostics::from_offsets(&[0.1, 0.12, 0.08]);
        assert!(tight.is_clean());

        let spread = CalibrationDiagnostics::from_offsets(&[-0.5, 0.5]);
        assert!(spread.high_variance);
        assert!(!spread.high_mean);

        let biased = CalibrationDiagnostics::from_offsets(&[0.9, 1.0, 1.1]);
        assert!(biased.high_mean);
        assert!(!biased.high_variance);
    }
}
