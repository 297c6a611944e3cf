//! Presentation-time rescaling of intensity curves.
//!
//! Every policy is a pure transform: the input slice is never modified and
//! stored container data is never touched.

use crate::common::constants::{BASELINE_POINTS, TAIL_POINTS};
use crate::domain::{XasError, XasResult};
use crate::numerics::{mean, trapezoid};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Normalization {
    /// Minimum to 0, maximum to 1.
    PeakToPeak,
    /// Unit trapezoidal area, optionally over an energy sub-range.
    Area {
        subtract_baseline: bool,
        range: Option<(f64, f64)>,
    },
    /// Mean of the leading points to 0, mean of the tail region to 1.
    ///
    /// A negative `end_range` selects the region starting at index `-end_range`.
    Tail { start_range: usize, end_range: isize },
    /// Unrecognized policies leave the curve unchanged.
    #[default]
    PassThrough,
}

impl Normalization {
    pub fn area() -> Self {
        Self::Area {
            subtract_baseline: false,
            range: None,
        }
    }

    pub fn tail() -> Self {
        Self::Tail {
            start_range: TAIL_POINTS,
            end_range: TAIL_POINTS as isize,
        }
    }

    /// `pp`, `area` and `tail` select their default policy; any other name passes through.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pp" => Self::PeakToPeak,
            "area" => Self::area(),
            "tail" => Self::tail(),
            _ => Self::PassThrough,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PeakToPeak => "pp",
            Self::Area { .. } => "area",
            Self::Tail { .. } => "tail",
            Self::PassThrough => "none",
        }
    }

    pub fn apply(&self, x: &[f64], y: &[f64]) -> XasResult<Vec<f64>> {
        match *self {
            Self::PeakToPeak => Ok(pp_norm(y)),
            Self::Area {
                subtract_baseline,
                range,
            } => area_norm(x, y, subtract_baseline, range),
            Self::Tail {
                start_range,
                end_range,
            } => Ok(tail_norm(y, start_range, end_range)),
            Self::PassThrough => Ok(y.to_vec()),
        }
    }

    /// Applies the policy to every column of a (points, n) array.
    pub fn apply_columns(&self, x: ArrayView1<'_, f64>, y: ArrayView2<'_, f64>) -> XasResult<Array2<f64>> {
        let x = x.to_vec();
        let mut normalized = y.to_owned();
        for mut column in normalized.axis_iter_mut(Axis(1)) {
            let values = self.apply(&x, &column.to_vec())?;
            for (target, value) in column.iter_mut().zip(values) {
                *target = value;
            }
        }
        Ok(normalized)
    }
}

pub fn pp_norm(y: &[f64]) -> Vec<f64> {
    let min = y.iter().copied().fold(f64::INFINITY, f64::min);
    let max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    y.iter().map(|value| (value - min) / (max - min)).collect()
}

pub fn area_norm(
    x: &[f64],
    y: &[f64],
    subtract_baseline: bool,
    range: Option<(f64, f64)>,
) -> XasResult<Vec<f64>> {
    if x.len() != y.len() {
        return Err(XasError::input_validation(
            "INPUT.LENGTH_MISMATCH",
            format!("energy axis has {} points but intensity has {}", x.len(), y.len()),
        ));
    }

    let baseline = if subtract_baseline {
        mean(&y[..y.len().min(BASELINE_POINTS)]).unwrap_or(0.0)
    } else {
        0.0
    };
    let shifted: Vec<f64> = y.iter().map(|value| value - baseline).collect();

    let (xs, ys): (Vec<f64>, Vec<f64>) = match range {
        Some((low, high)) => x
            .iter()
            .zip(&shifted)
            .filter(|(energy, _)| (low..=high).contains(*energy))
            .map(|(energy, value)| (*energy, *value))
            .unzip(),
        None => (x.to_vec(), shifted.clone()),
    };
    if xs.len() < 2 {
        return Err(XasError::input_validation(
            "INPUT.NORMALIZATION_RANGE",
            format!("area integral needs at least two points, found {}", xs.len()),
        ));
    }
    let area = trapezoid(&xs, &ys).unwrap_or(f64::NAN);

    Ok(shifted.into_iter().map(|value| value / area).collect())
}

pub fn tail_norm(y: &[f64], start_range: usize, end_range: isize) -> Vec<f64> {
    let head = mean(&y[..y.len().min(start_range)]).unwrap_or(0.0);
    let tail = mean(&y[tail_start(y.len(), end_range)..]).unwrap_or(head);
    y.iter().map(|value| (value - head) / (tail - head)).collect()
}

fn tail_start(len: usize, end_range: isize) -> usize {
    let magnitude = end_range.unsigned_abs();
    if end_range > 0 {
        len.saturating_sub(magnitude)
    } else {
        magnitude.min(len)
    }
}
