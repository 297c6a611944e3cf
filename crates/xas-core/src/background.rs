//! Arctangent edge-step models and polynomial pre/post-edge flattening.

use crate::domain::{XasError, XasResult};
use crate::numerics::{Polynomial, nearest_index};
use std::f64::consts::PI;

/// Arctangent step rising from 0 to 1 around `position`.
pub fn edge_jump(energy: f64, steepness: f64, position: f64) -> f64 {
    ((steepness * (energy - position)).atan() + PI / 2.0) / PI
}

/// Two arctangent steps sharing a steepness, weighted `ratio : 1`, rising from 0 to `amplitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleJump {
    pub steepness: f64,
    pub first: f64,
    pub second: f64,
    pub amplitude: f64,
    pub ratio: f64,
}

impl DoubleJump {
    pub fn new(steepness: f64, first: f64, second: f64) -> Self {
        Self {
            steepness,
            first,
            second,
            amplitude: 1.0,
            ratio: 2.0,
        }
    }

    pub fn evaluate(&self, energy: f64) -> f64 {
        let first = edge_jump(energy, self.steepness, self.first);
        let second = edge_jump(energy, self.steepness, self.second);
        self.amplitude * (self.ratio * first + second) / (self.ratio + 1.0)
    }

    pub fn evaluate_many(&self, energies: &[f64]) -> Vec<f64> {
        energies.iter().map(|&energy| self.evaluate(energy)).collect()
    }
}

/// Polynomial fitted to the points between the samples nearest `start` and `end`
/// (end exclusive), evaluated over the whole energy axis.
fn fit_region(
    energy: &[f64],
    counts: &[f64],
    start: f64,
    end: f64,
    degree: usize,
) -> XasResult<Vec<f64>> {
    if energy.len() != counts.len() {
        return Err(XasError::input_validation(
            "INPUT.LENGTH_MISMATCH",
            format!(
                "energy axis has {} points but counts have {}",
                energy.len(),
                counts.len()
            ),
        ));
    }
    let (Some(first), Some(last)) = (nearest_index(energy, start), nearest_index(energy, end))
    else {
        return Err(XasError::input_validation(
            "INPUT.EMPTY_DATA",
            "background fit needs a non-empty energy axis",
        ));
    };
    if last <= first {
        return Err(XasError::input_validation(
            "INPUT.FIT_REGION",
            format!("fit region {start}..{end} selects no points"),
        ));
    }

    let polynomial = Polynomial::fit(&energy[first..last], &counts[first..last], degree)
        .map_err(|error| XasError::computation("RUN.POLYNOMIAL_FIT", error.to_string()))?;
    Ok(polynomial.evaluate_many(energy))
}

/// Linear pre-edge background over `e1..e2`.
pub fn fit_preedge(energy: &[f64], counts: &[f64], e1: f64, e2: f64) -> XasResult<Vec<f64>> {
    fit_region(energy, counts, e1, e2, 1)
}

pub fn flatten_pre(energy: &[f64], counts: &[f64], e1: f64, e2: f64) -> XasResult<Vec<f64>> {
    let background = fit_preedge(energy, counts, e1, e2)?;
    Ok(counts
        .iter()
        .zip(background)
        .map(|(value, fit)| value - fit)
        .collect())
}

pub fn fit_postedge(
    energy: &[f64],
    counts: &[f64],
    e1: f64,
    e2: f64,
    degree: usize,
) -> XasResult<Vec<f64>> {
    fit_region(energy, counts, e1, e2, degree)
}

/// Removes the post-edge slope above `e0` and scales the step at `e0` to 1.
///
/// The fitted curve is shifted so it is zero at `e0` and clamped at zero
/// below, so only the rise past the edge is subtracted.
pub fn flatten_post(
    energy: &[f64],
    counts: &[f64],
    e0: f64,
    e1: f64,
    e2: f64,
    degree: usize,
) -> XasResult<Vec<f64>> {
    let post = fit_postedge(energy, counts, e1, e2, degree)?;
    let anchor = nearest_index(energy, e0)
        .map(|index| post[index])
        .ok_or_else(|| {
            XasError::input_validation("INPUT.EMPTY_DATA", "energy axis is empty")
        })?;

    Ok(counts
        .iter()
        .zip(post)
        .map(|(value, fit)| (value - (fit - anchor).max(0.0)) / anchor)
        .collect())
}
