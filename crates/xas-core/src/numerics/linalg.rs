use faer::Mat;

pub type DenseMatrix = Mat<f64>;

const SINGULAR_PIVOT_EPSILON: f64 = 1.0e-14;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LuError {
    #[error("LU factorization requires a square matrix, got {rows}x{cols}")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("LU factorization requires a non-empty matrix")]
    EmptyMatrix,
    #[error("matrix is singular at pivot index {pivot_index}")]
    SingularMatrix { pivot_index: usize },
    #[error("right-hand side length mismatch: expected {expected}, got {actual}")]
    RhsLengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LuDecomposition {
    lu: DenseMatrix,
    pivots: Vec<usize>,
    scale: f64,
}

impl LuDecomposition {
    fn dimension(&self) -> usize {
        self.lu.nrows()
    }

    pub(crate) fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
        let dimension = self.dimension();
        if rhs.len() != dimension {
            return Err(LuError::RhsLengthMismatch {
                expected: dimension,
                actual: rhs.len(),
            });
        }

        let mut forward = vec![0.0; dimension];
        for row in 0..dimension {
            let mut value = rhs[self.pivots[row]];
            for col in 0..row {
                value -= self.lu[(row, col)] * forward[col];
            }
            forward[row] = value;
        }

        let mut solution = vec![0.0; dimension];
        for row in (0..dimension).rev() {
            let mut value = forward[row];
            for col in (row + 1)..dimension {
                value -= self.lu[(row, col)] * solution[col];
            }

            let diagonal = self.lu[(row, row)];
            if diagonal.abs() <= SINGULAR_PIVOT_EPSILON * self.scale {
                return Err(LuError::SingularMatrix { pivot_index: row });
            }
            solution[row] = value / diagonal;
        }

        Ok(solution)
    }
}

/// Partial-pivoting LU; singularity is judged relative to the largest input entry.
pub(crate) fn lu_factorize(matrix: &DenseMatrix) -> Result<LuDecomposition, LuError> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows == 0 || cols == 0 {
        return Err(LuError::EmptyMatrix);
    }
    if rows != cols {
        return Err(LuError::NonSquareMatrix { rows, cols });
    }

    let dimension = rows;
    let mut scale: f64 = 0.0;
    for row in 0..dimension {
        for col in 0..dimension {
            scale = scale.max(matrix[(row, col)].abs());
        }
    }
    if scale == 0.0 {
        return Err(LuError::SingularMatrix { pivot_index: 0 });
    }

    let mut lu = matrix.clone();
    let mut pivots: Vec<usize> = (0..dimension).collect();

    for pivot_col in 0..dimension {
        let mut pivot_row = pivot_col;
        for row in (pivot_col + 1)..dimension {
            if lu[(row, pivot_col)].abs() > lu[(pivot_row, pivot_col)].abs() {
                pivot_row = row;
            }
        }

        if lu[(pivot_row, pivot_col)].abs() <= SINGULAR_PIVOT_EPSILON * scale {
            return Err(LuError::SingularMatrix {
                pivot_index: pivot_col,
            });
        }

        if pivot_row != pivot_col {
            for col in 0..dimension {
                let value = lu[(pivot_col, col)];
                lu[(pivot_col, col)] = lu[(pivot_row, col)];
                lu[(pivot_row, col)] = value;
            }
            pivots.swap(pivot_col, pivot_row);
        }

        let pivot = lu[(pivot_col, pivot_col)];
        for row in (pivot_col + 1)..dimension {
            let multiplier = lu[(row, pivot_col)] / pivot;
            lu[(row, pivot_col)] = multiplier;
            for col in (pivot_col + 1)..dimension {
                let updated = lu[(row, col)] - multiplier * lu[(pivot_col, col)];
                lu[(row, col)] = updated;
            }
        }
    }

    Ok(LuDecomposition { lu, pivots, scale })
}

pub fn lu_solve(matrix: &DenseMatrix, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
    lu_factorize(matrix)?.solve(rhs)
}

/// Solves `min |A c - b|` through the normal equations `AᵀA c = Aᵀb`.
pub fn least_squares(design: &DenseMatrix, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
    let rows = design.nrows();
    let cols = design.ncols();
    if rhs.len() != rows {
        return Err(LuError::RhsLengthMismatch {
            expected: rows,
            actual: rhs.len(),
        });
    }

    let mut normal = DenseMatrix::zeros(cols, cols);
    let mut projected = vec![0.0; cols];
    for i in 0..cols {
        for j in 0..cols {
            let mut sum = 0.0;
            for k in 0..rows {
                sum += design[(k, i)] * design[(k, j)];
            }
            normal[(i, j)] = sum;
        }
        let mut sum = 0.0;
        for k in 0..rows {
            sum += design[(k, i)] * rhs[k];
        }
        projected[i] = sum;
    }

    lu_solve(&normal, &projected)
}

#[cfg(test)]
mod tests {
    use super::{DenseMatrix, LuError, least_squares, lu_factorize, lu_solve};

    fn dense_matrix(rows: &[&[f64]]) -> DenseMatrix {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |row| row.len());
        let mut matrix = DenseMatrix::zeros(nrows, ncols);
        for (row_index, row) in rows.iter().enumerate() {
            for (col_index, value) in row.iter().enumerate() {
                matrix[(row_index, col_index)] = *value;
            }
        }
        matrix
    }

    #[test]
    fn lu_solve_recovers_known_solution_with_pivoting() {
        let matrix = dense_matrix(&[&[0.0, 2.0, 1.0], &[1.0, -2.0, -3.0], &[2.0, 3.0, 1.0]]);
        let expected = [1.0, -0.5, 2.0];
        let rhs: Vec<f64> = (0..3)
            .map(|row| (0..3).map(|col| matrix[(row, col)] * expected[col]).sum())
            .collect();

        let actual = lu_solve(&matrix, &rhs).expect("solve");
        for (lhs, rhs) in expected.iter().zip(&actual) {
            assert!((lhs - rhs).abs() < 1.0e-12, "expected {lhs}, got {rhs}");
        }
    }

    #[test]
    fn rejects_non_square_and_singular_matrices() {
        let error = lu_factorize(&DenseMatrix::zeros(2, 3)).expect_err("non-square should fail");
        assert_eq!(error, LuError::NonSquareMatrix { rows: 2, cols: 3 });

        let singular = dense_matrix(&[&[1.0, 2.0], &[2.0, 4.0]]);
        let error = lu_factorize(&singular).expect_err("singular matrix should fail");
        assert_eq!(error, LuError::SingularMatrix { pivot_index: 1 });
    }

    #[test]
    fn solve_validates_rhs_dimension() {
        let matrix = dense_matrix(&[&[3.0, 1.0], &[1.0, 2.0]]);
        let decomposition = lu_factorize(&matrix).expect("decomposition");
        let error = decomposition.solve(&[1.0]).expect_err("rhs mismatch should fail");
        assert_eq!(
            error,
            LuError::RhsLengthMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn least_squares_fits_an_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let mut design = DenseMatrix::zeros(4, 2);
        for (row, value) in x.iter().enumerate() {
            design[(row, 0)] = 1.0;
            design[(row, 1)] = *value;
        }
        let y: Vec<f64> = x.iter().map(|value| 1.5 - 0.25 * value).collect();

        let coefficients = least_squares(&design, &y).expect("fit");
        assert!((coefficients[0] - 1.5).abs() < 1.0e-12);
        assert!((coefficients[1] + 0.25).abs() < 1.0e-12);
    }
}
