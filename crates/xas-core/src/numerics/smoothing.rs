//! Savitzky–Golay smoothing. Edges are handled by evaluating the polynomial
//! fitted to the first and last full windows.

use super::linalg::{DenseMatrix, LuError, lu_solve};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SmoothingError {
    #[error("window length must be odd, got {window}")]
    EvenWindow { window: usize },
    #[error("window length {window} exceeds signal length {len}")]
    WindowTooLong { window: usize, len: usize },
    #[error("polynomial order {order} must be less than window length {window}")]
    OrderTooHigh { order: usize, window: usize },
    #[error("failed to solve for filter coefficients: {0}")]
    Solve(#[from] LuError),
}

/// Weights that evaluate the local least-squares polynomial at `position`,
/// measured in samples from the window center.
pub fn savgol_weights(window: usize, order: usize, position: f64) -> Result<Vec<f64>, SmoothingError> {
    if window % 2 == 0 {
        return Err(SmoothingError::EvenWindow { window });
    }
    if order >= window {
        return Err(SmoothingError::OrderTooHigh { order, window });
    }

    let half = (window / 2) as f64;
    let terms = order + 1;
    let mut normal = DenseMatrix::zeros(terms, terms);
    for i in 0..terms {
        for j in 0..terms {
            let mut sum = 0.0;
            for sample in 0..window {
                sum += (sample as f64 - half).powi((i + j) as i32);
            }
            normal[(i, j)] = sum;
        }
    }

    let powers: Vec<f64> = (0..terms).map(|k| position.powi(k as i32)).collect();
    let projection = lu_solve(&normal, &powers)?;

    Ok((0..window)
        .map(|sample| {
            let offset = sample as f64 - half;
            projection
                .iter()
                .enumerate()
                .map(|(k, coefficient)| coefficient * offset.powi(k as i32))
                .sum()
        })
        .collect())
}

pub fn savgol_filter(values: &[f64], window: usize, order: usize) -> Result<Vec<f64>, SmoothingError> {
    if window % 2 == 0 {
        return Err(SmoothingError::EvenWindow { window });
    }
    if window > values.len() {
        return Err(SmoothingError::WindowTooLong {
            window,
            len: values.len(),
        });
    }
    if order >= window {
        return Err(SmoothingError::OrderTooHigh { order, window });
    }

    let len = values.len();
    let half = window / 2;
    let center = savgol_weights(window, order, 0.0)?;
    let apply = |weights: &[f64], start: usize| -> f64 {
        weights
            .iter()
            .zip(&values[start..start + window])
            .map(|(weight, value)| weight * value)
            .sum()
    };

    let mut smoothed = vec![0.0; len];
    for index in half..len - half {
        smoothed[index] = apply(&center, index - half);
    }
    for index in 0..half {
        let leading = savgol_weights(window, order, index as f64 - half as f64)?;
        smoothed[index] = apply(&leading, 0);

        let tail_index = len - half + index;
        let trailing = savgol_weights(window, order, (index + 1) as f64)?;
        smoothed[tail_index] = apply(&trailing, len - window);
    }

    Ok(smoothed)
}

/// Shrinks the window to the largest odd length the signal supports and caps
/// the order below it. Signals shorter than three samples are returned as-is.
pub fn savgol_filter_shrinking(
    values: &[f64],
    window: usize,
    order: usize,
) -> Result<Vec<f64>, SmoothingError> {
    let len = values.len();
    if len < 3 {
        return Ok(values.to_vec());
    }

    let mut window = window.min(len);
    if window % 2 == 0 {
        window -= 1;
    }
    if window < 3 {
        return Ok(values.to_vec());
    }
    let order = order.min(window - 1);
    savgol_filter(values, window, order)
}
