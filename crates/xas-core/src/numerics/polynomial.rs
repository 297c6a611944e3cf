use super::linalg::{DenseMatrix, LuError, least_squares};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolynomialFitError {
    #[error("abscissa and ordinate lengths differ: {x_len} vs {y_len}")]
    LengthMismatch { x_len: usize, y_len: usize },
    #[error("degree {degree} fit needs at least {required} points, got {actual}")]
    TooFewPoints {
        degree: usize,
        required: usize,
        actual: usize,
    },
    #[error("fit abscissae span a single value")]
    DegenerateDomain,
    #[error("least-squares system could not be solved: {0}")]
    Solve(#[from] LuError),
}

/// Least-squares polynomial in a variable scaled from the fit domain onto [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
    domain: (f64, f64),
}

impl Polynomial {
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self, PolynomialFitError> {
        if x.len() != y.len() {
            return Err(PolynomialFitError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        let required = degree + 1;
        if x.len() < required {
            return Err(PolynomialFitError::TooFewPoints {
                degree,
                required,
                actual: x.len(),
            });
        }

        let low = x.iter().copied().fold(f64::INFINITY, f64::min);
        let high = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if degree > 0 && high <= low {
            return Err(PolynomialFitError::DegenerateDomain);
        }

        let fitted = Self {
            coefficients: Vec::new(),
            domain: (low, high),
        };
        let mut design = DenseMatrix::zeros(x.len(), required);
        for (row, &value) in x.iter().enumerate() {
            let scaled = fitted.scale(value);
            for power in 0..required {
                design[(row, power)] = scaled.powi(power as i32);
            }
        }

        let coefficients = least_squares(&design, y)?;
        Ok(Self {
            coefficients,
            ..fitted
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let scaled = self.scale(x);
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, coefficient| acc * scaled + coefficient)
    }

    pub fn evaluate_many(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&value| self.evaluate(value)).collect()
    }

    fn scale(&self, x: f64) -> f64 {
        let (low, high) = self.domain;
        if high <= low {
            return 0.0;
        }
        (2.0 * x - (low + high)) / (high - low)
    }
}
