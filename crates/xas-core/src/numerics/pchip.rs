//! Shape-preserving piecewise cubic Hermite interpolation (Fritsch–Carlson).

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PchipError {
    #[error("PCHIP needs at least two points, got {actual}")]
    TooFewPoints { actual: usize },
    #[error("abscissa and ordinate lengths differ: {x_len} vs {y_len}")]
    LengthMismatch { x_len: usize, y_len: usize },
    #[error("abscissa must be strictly increasing (violated at index {index})")]
    NotStrictlyIncreasing { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl Pchip {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, PchipError> {
        if x.len() != y.len() {
            return Err(PchipError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(PchipError::TooFewPoints { actual: x.len() });
        }
        if let Some(index) = x.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(PchipError::NotStrictlyIncreasing { index: index + 1 });
        }

        let slopes = derivatives(x, y);
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            slopes,
        })
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Outside the knot range the end cubic is extrapolated.
    pub fn evaluate(&self, t: f64) -> f64 {
        let last = self.x.len() - 2;
        let segment = self.x.partition_point(|&node| node <= t).saturating_sub(1).min(last);

        let h = self.x[segment + 1] - self.x[segment];
        let s = (t - self.x[segment]) / h;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * self.y[segment]
            + h10 * h * self.slopes[segment]
            + h01 * self.y[segment + 1]
            + h11 * h * self.slopes[segment + 1]
    }

    pub fn evaluate_many(&self, targets: &[f64]) -> Vec<f64> {
        targets.iter().map(|&t| self.evaluate(t)).collect()
    }
}

fn derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let delta: Vec<f64> = y
        .windows(2)
        .zip(&h)
        .map(|(pair, step)| (pair[1] - pair[0]) / step)
        .collect();

    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut slopes = vec![0.0; n];
    for k in 1..n - 1 {
        let (left, right) = (delta[k - 1], delta[k]);
        if left * right <= 0.0 {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        slopes[k] = (w1 + w2) / (w1 / left + w2 / right);
    }

    slopes[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    slopes[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    slopes
}

/// One-sided three-point estimate, limited so the end segment stays monotone.
fn end_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let slope = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if sign(slope) != sign(m0) {
        0.0
    } else if sign(m0) != sign(m1) && slope.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        slope
    }
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
