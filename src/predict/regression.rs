//! Ordinary least squares regression
//!
//! Fits `y = b0 + w·x` on centered data. The normal equations are solved
//! through an eigen-decomposition of the (symmetric) Gram matrix, so rank
//! deficient inputs such as two samples over three features yield the
//! minimum-norm solution instead of a singular-matrix failure.

use tracing::{debug, warn};

use super::RegressionFitter;
use crate::error::CoachError;

/// Relative eigenvalue cut-off below which a direction is treated as null
const RANK_TOLERANCE: f64 = 1e-10;

/// Jacobi sweeps before giving up on further off-diagonal reduction
const MAX_JACOBI_SWEEPS: usize = 100;

/// Fitted linear model
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    /// Number of independent feature directions used by the fit
    pub rank: usize,
}

impl LinearModel {
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (w, x)| w.mul_add(*x, acc))
    }
}

/// In-sample OLS fitter with intercept
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinaryLeastSquares;

impl OrdinaryLeastSquares {
    /// Fit the model.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` for an empty sample and `MalformedInput`
    /// when rows disagree on width or targets don't match rows.
    pub fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<LinearModel, CoachError> {
        if features.is_empty() {
            return Err(CoachError::insufficient(1, 0, "regression samples"));
        }
        if features.len() != targets.len() {
            return Err(CoachError::MalformedInput(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }

        let n = features.len() as f64;
        let width = features[0].len();
        if features.iter().any(|row| row.len() != width) {
            return Err(CoachError::MalformedInput(
                "Feature rows have inconsistent widths".to_string(),
            ));
        }

        let feature_means: Vec<f64> = (0..width)
            .map(|j| features.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let target_mean = targets.iter().sum::<f64>() / n;

        // Gram matrix and moment vector of the centered data
        let mut gram = vec![vec![0.0; width]; width];
        let mut moments = vec![0.0; width];
        for (row, y) in features.iter().zip(targets) {
            let centered: Vec<f64> = row.iter().zip(&feature_means).map(|(x, m)| x - m).collect();
            let yc = y - target_mean;
            for a in 0..width {
                moments[a] += centered[a] * yc;
                for b in 0..width {
                    gram[a][b] += centered[a] * centered[b];
                }
            }
        }

        let (eigenvalues, eigenvectors) = symmetric_eigen(gram);
        let largest = eigenvalues.iter().copied().fold(0.0_f64, f64::max);
        let cutoff = largest * width as f64 * RANK_TOLERANCE;

        let mut coefficients = vec![0.0; width];
        let mut rank = 0;
        for (i, &lambda) in eigenvalues.iter().enumerate() {
            if lambda <= cutoff || lambda <= 0.0 {
                continue;
            }
            rank += 1;
            let projection: f64 = (0..width)
                .map(|k| eigenvectors[k][i] * moments[k])
                .sum::<f64>()
                / lambda;
            for (k, coefficient) in coefficients.iter_mut().enumerate() {
                *coefficient += projection * eigenvectors[k][i];
            }
        }

        if rank < width {
            warn!(
                samples = features.len(),
                features = width,
                rank,
                "Regression is rank deficient, using minimum-norm fit"
            );
        }

        let intercept = coefficients
            .iter()
            .zip(&feature_means)
            .fold(target_mean, |acc, (w, m)| (-w).mul_add(*m, acc));

        debug!(samples = features.len(), rank, intercept, "Fitted linear regression");

        Ok(LinearModel {
            intercept,
            coefficients,
            rank,
        })
    }
}

impl RegressionFitter for OrdinaryLeastSquares {
    fn fit_predict(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        query: &[f64],
    ) -> Result<f64, CoachError> {
        Ok(self.fit(features, targets)?.predict(query))
    }
}

/// Cyclic Jacobi eigenvalue iteration for a symmetric matrix.
///
/// Returns eigenvalues and a matrix whose columns are the eigenvectors.
fn symmetric_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut off_diagonal = 0.0;
        let mut diagonal = 0.0;
        for (i, row) in a.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                if i == j {
                    diagonal += value * value;
                } else {
                    off_diagonal += value * value;
                }
            }
        }
        if off_diagonal <= 1e-30 * diagonal.max(f64::MIN_POSITIVE) {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q] == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + theta.mul_add(theta, 1.0).sqrt());
                let c = 1.0 / t.mul_add(t, 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact_sample() -> (Vec<Vec<f64>>, Vec<f64>) {
        let rows: Vec<Vec<f64>> = vec![
            vec![0.0, 30.0, 5000.0],
            vec![1.0, 45.0, 8000.0],
            vec![2.0, 60.0, 7000.0],
            vec![3.0, 20.0, 12000.0],
            vec![4.0, 90.0, 9000.0],
            vec![5.0, 10.0, 3000.0],
            vec![6.0, 75.0, 11000.0],
            vec![0.0, 50.0, 6000.0],
        ];
        let targets = rows
            .iter()
            .map(|r| 1000.0 + 10.0 * r[0] + 5.0 * r[1] + 0.1 * r[2])
            .collect();
        (rows, targets)
    }

    #[test]
    fn test_recovers_exact_coefficients() {
        let (rows, targets) = exact_sample();

        let model = OrdinaryLeastSquares.fit(&rows, &targets).unwrap();

        assert_eq!(model.rank, 3);
        assert!((model.intercept - 1000.0).abs() < 1e-6);
        assert!((model.coefficients[0] - 10.0).abs() < 1e-6);
        assert!((model.coefficients[1] - 5.0).abs() < 1e-6);
        assert!((model.coefficients[2] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_underdetermined_fit_interpolates() {
        let rows = vec![vec![0.0, 30.0, 8000.0], vec![1.0, 60.0, 10000.0]];
        let targets = vec![2000.0, 2300.0];

        let model = OrdinaryLeastSquares.fit(&rows, &targets).unwrap();

        assert_eq!(model.rank, 1);
        assert!((model.predict(&rows[0]) - 2000.0).abs() < 1e-6);
        assert!((model.predict(&rows[1]) - 2300.0).abs() < 1e-6);
    }

    #[test]
    fn test_constant_features() {
        let rows = vec![vec![1.0, 2.0], vec![1.0, 2.0], vec![1.0, 2.0]];
        let targets = vec![10.0, 20.0, 30.0];

        let model = OrdinaryLeastSquares.fit(&rows, &targets).unwrap();

        assert_eq!(model.rank, 0);
        assert!((model.predict(&[5.0, 5.0]) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_mismatched_rows() {
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        let result = OrdinaryLeastSquares.fit(&rows, &[1.0, 2.0]);
        assert!(matches!(result, Err(CoachError::MalformedInput(_))));

        let result = OrdinaryLeastSquares.fit(&[vec![1.0]], &[1.0, 2.0]);
        assert!(matches!(result, Err(CoachError::MalformedInput(_))));
    }

    #[test]
    fn test_eigen_decomposition() {
        let (values, vectors) = symmetric_eigen(vec![vec![2.0, 1.0], vec![1.0, 2.0]]);

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((sorted[0] - 1.0).abs() < 1e-12);
        assert!((sorted[1] - 3.0).abs() < 1e-12);

        // columns are unit length
        for i in 0..2 {
            let norm: f64 = (0..2).map(|k| vectors[k][i] * vectors[k][i]).sum();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }
}
