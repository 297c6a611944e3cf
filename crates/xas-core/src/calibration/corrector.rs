use crate::domain::{XasError, XasResult};
use crate::numerics::{deterministic_argsort, resample_linear};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Resamples `y`, recorded on the shifted axis `x + offset`, back onto `x`.
/// Values beyond the shifted range take the nearest end value.
pub fn correct_mono(x: &[f64], offset: f64, y: &[f64]) -> XasResult<Vec<f64>> {
    if x.len() != y.len() {
        return Err(XasError::input_validation(
            "INPUT.LENGTH_MISMATCH",
            format!(
                "energy axis has {} points but intensity has {}",
                x.len(),
                y.len()
            ),
        ));
    }
    if offset == 0.0 {
        return Ok(y.to_vec());
    }

    let order = deterministic_argsort(x);
    let shifted: Vec<f64> = order.iter().map(|&index| x[index] + offset).collect();
    let values: Vec<f64> = order.iter().map(|&index| y[index]).collect();

    resample_linear(&shifted, &values, x).ok_or_else(|| {
        XasError::computation(
            "RUN.MONO_RESAMPLE",
            "energy axis contains non-finite values and cannot be resampled",
        )
    })
}

/// Column-wise [`correct_mono`] over a (points, columns) array, one offset per column.
pub fn correct_mono_batch(
    x: ArrayView1<'_, f64>,
    offsets: &[f64],
    y: ArrayView2<'_, f64>,
) -> XasResult<Array2<f64>> {
    if offsets.len() != y.ncols() {
        return Err(XasError::input_validation(
            "INPUT.OFFSET_COUNT",
            format!(
                "{} offsets supplied for {} columns",
                offsets.len(),
                y.ncols()
            ),
        ));
    }

    let x = x.to_vec();
    let mut corrected = y.to_owned();
    for (mut column, &offset) in corrected.axis_iter_mut(Axis(1)).zip(offsets) {
        let resampled = correct_mono(&x, offset, &column.to_vec())?;
        for (target, value) in column.iter_mut().zip(resampled) {
            *target = value;
        }
    }
    Ok(corrected)
}
