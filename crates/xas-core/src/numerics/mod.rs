pub mod linalg;
pub mod pchip;
pub mod polynomial;
pub mod smoothing;

pub use linalg::{DenseMatrix, LuError, least_squares, lu_solve};
pub use pchip::{Pchip, PchipError};
pub use polynomial::{Polynomial, PolynomialFitError};
pub use smoothing::{SmoothingError, savgol_filter, savgol_filter_shrinking};

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(stable_sum(values) / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let center = mean(values)?;
    let squares: Vec<f64> = values
        .iter()
        .map(|value| (value - center) * (value - center))
        .collect();
    Some((stable_sum(&squares) / values.len() as f64).sqrt())
}

pub fn deterministic_argsort(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_unstable_by(|lhs, rhs| {
        values[*lhs]
            .total_cmp(&values[*rhs])
            .then_with(|| lhs.cmp(rhs))
    });
    indices
}

/// First index of the maximum, ignoring NaN.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// Index whose value is closest to `target`, first one on ties.
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    let distances: Vec<f64> = values.iter().map(|value| -(value - target).abs()).collect();
    argmax(&distances)
}

pub fn linear_grid(start: f64, end: f64, count: usize) -> Option<Vec<f64>> {
    if count < 2 {
        return None;
    }

    let step = (end - start) / ((count - 1) as f64);
    let mut grid = Vec::with_capacity(count);
    for index in 0..count {
        grid.push(start + step * (index as f64));
    }

    if let Some(last) = grid.last_mut() {
        *last = end;
    }

    Some(grid)
}

/// Piecewise-linear interpolation over an ascending grid, clamped to the end values.
pub fn interpolate_linear(x: f64, x_grid: &[f64], y_grid: &[f64]) -> Option<f64> {
    if !is_interpolation_grid(x_grid, y_grid) {
        return None;
    }
    Some(interpolate_sorted(x, x_grid, y_grid))
}

/// [`interpolate_linear`] at every target; the grid is validated once.
pub fn resample_linear(x_grid: &[f64], y_grid: &[f64], targets: &[f64]) -> Option<Vec<f64>> {
    if targets.is_empty() {
        return Some(Vec::new());
    }
    if !is_interpolation_grid(x_grid, y_grid) {
        return None;
    }
    Some(
        targets
            .iter()
            .map(|&target| interpolate_sorted(target, x_grid, y_grid))
            .collect(),
    )
}

fn is_interpolation_grid(x_grid: &[f64], y_grid: &[f64]) -> bool {
    !x_grid.is_empty()
        && x_grid.len() == y_grid.len()
        && x_grid.windows(2).all(|window| window[0] <= window[1])
}

/// Requires a non-empty ascending grid of the same length as `y_grid`.
fn interpolate_sorted(x: f64, x_grid: &[f64], y_grid: &[f64]) -> f64 {
    if x <= x_grid[0] {
        return y_grid[0];
    }

    let last_index = x_grid.len() - 1;
    if x >= x_grid[last_index] {
        return y_grid[last_index];
    }

    let upper = x_grid.partition_point(|&node| node < x);
    if x_grid[upper] == x {
        return y_grid[upper];
    }
    let lower = upper - 1;
    let x0 = x_grid[lower];
    let x1 = x_grid[upper];
    if x1 == x0 {
        return y_grid[upper];
    }

    let interpolation = (x - x0) / (x1 - x0);
    y_grid[lower] + interpolation * (y_grid[upper] - y_grid[lower])
}

pub fn trapezoid(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }

    let panels: Vec<f64> = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .collect();
    Some(stable_sum(&panels))
}
