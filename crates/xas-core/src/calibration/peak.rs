use crate::common::constants::{
    PEAK_REFINE_HALF_WIDTH, PEAK_REFINE_SAMPLES, SAVGOL_ORDER, SAVGOL_WINDOW,
};
use crate::domain::{XasError, XasResult};
use crate::numerics::{
    Pchip, argmax, deterministic_argsort, linear_grid, savgol_filter_shrinking,
};
use ndarray::{ArrayView2, Axis};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakSearch {
    pub nominal: f64,
    pub width: f64,
    pub smooth: bool,
    pub shift: f64,
}

impl PeakSearch {
    pub fn center(&self) -> f64 {
        self.nominal + self.shift
    }
}

/// Locates the reference peak of one scan inside `center ± width`.
pub fn locate_peak(x: &[f64], y: &[f64], search: &PeakSearch) -> XasResult<f64> {
    let center = search.center();
    let low = center - search.width;
    let high = center + search.width;

    let mut window: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(energy, intensity)| {
            (low..=high).contains(*energy) && intensity.is_finite()
        })
        .map(|(&energy, &intensity)| (energy, intensity))
        .collect();
    let energies: Vec<f64> = window.iter().map(|(energy, _)| *energy).collect();
    window = deterministic_argsort(&energies)
        .into_iter()
        .map(|index| window[index])
        .collect();
    window.dedup_by(|next, kept| next.0 == kept.0);

    if window.len() < 2 {
        return Err(XasError::computation(
            "RUN.CALIBRATION_WINDOW",
            format!(
                "calibration window [{low}, {high}] holds {} usable point(s), need at least 2",
                window.len()
            ),
        ));
    }

    let energies: Vec<f64> = window.iter().map(|(energy, _)| *energy).collect();
    let mut intensities: Vec<f64> = window.iter().map(|(_, intensity)| *intensity).collect();
    if search.smooth {
        intensities = savgol_filter_shrinking(&intensities, SAVGOL_WINDOW, SAVGOL_ORDER)
            .map_err(|error| XasError::computation("RUN.SMOOTHING", error.to_string()))?;
    }

    let seed_index = argmax(&intensities).ok_or_else(|| {
        XasError::computation("RUN.CALIBRATION_WINDOW", "window intensities are all NaN")
    })?;
    let seed = energies[seed_index];

    let interpolant = Pchip::new(&energies, &intensities)
        .map_err(|error| XasError::computation("RUN.PEAK_INTERPOLATION", error.to_string()))?;
    let (first, last) = interpolant.x_range();
    let dense_low = (seed - PEAK_REFINE_HALF_WIDTH).max(first);
    let dense_high = (seed + PEAK_REFINE_HALF_WIDTH).min(last);
    let grid = linear_grid(dense_low, dense_high, PEAK_REFINE_SAMPLES).ok_or_else(|| {
        XasError::computation("RUN.PEAK_INTERPOLATION", "refinement grid is empty")
    })?;

    let samples = interpolant.evaluate_many(&grid);
    let peak = argmax(&samples).map_or(seed, |index| grid[index]);
    debug!(seed, peak, points = energies.len(), "located calibration peak");
    Ok(peak)
}

/// Per-scan offsets `nominal - peak`. `x` is either one shared column or one column per scan.
pub fn find_offsets(
    x: ArrayView2<'_, f64>,
    y: ArrayView2<'_, f64>,
    search: &PeakSearch,
) -> XasResult<(Vec<f64>, Vec<f64>)> {
    if x.nrows() != y.nrows() || (x.ncols() != 1 && x.ncols() != y.ncols()) {
        return Err(XasError::input_validation(
            "INPUT.LENGTH_MISMATCH",
            format!(
                "energy array {:?} does not align with intensity array {:?}",
                x.shape(),
                y.shape()
            ),
        ));
    }

    let mut offsets = Vec::with_capacity(y.ncols());
    let mut peaks = Vec::with_capacity(y.ncols());
    for (scan, column) in y.axis_iter(Axis(1)).enumerate() {
        let energies = x.column(if x.ncols() == 1 { 0 } else { scan }).to_vec();
        let peak = locate_peak(&energies, &column.to_vec(), search)?;
        offsets.push(search.nominal - peak);
        peaks.push(peak);
    }
    Ok((offsets, peaks))
}
