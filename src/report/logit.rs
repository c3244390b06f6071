//! Binomial logistic regression on categorical predictors.
//!
//! Predictors are treatment coded: the first level of each (in sorted
//! order) is the reference and gets no coefficient. The fit is iteratively
//! reweighted least squares with the same stopping rule as R's `glm`.

use arrow::{
    array::{Array, ArrayRef, BooleanArray, StringArray},
    record_batch::RecordBatch,
};
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::ModelError;
use crate::process::utils::as_strings;

pub const MAX_ITER: usize = 25;
pub const EPSILON: f64 = 1e-8;

/// Keeps fitted probabilities away from 0 and 1 so the log-likelihood and
/// working weights stay finite.
const MU_EPS: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z_value: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogitFit {
    pub outcome: String,
    /// `(predictor, reference level)` pairs.
    pub reference_levels: Vec<(String, String)>,
    /// Intercept first, then one entry per non-reference level.
    pub coefficients: Vec<Coefficient>,
    pub n_obs: usize,
    pub null_deviance: f64,
    pub residual_deviance: f64,
    pub aic: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl LogitFit {
    pub fn coefficient(&self, term: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.term == term)
    }
}

/// Name of the coefficient for `level` of `predictor`.
pub fn term_name(predictor: &str, level: &str) -> String {
    format!("{}[{}]", predictor, level)
}

pub const INTERCEPT: &str = "(Intercept)";

struct Design {
    x: Array2<f64>,
    y: Array1<f64>,
    terms: Vec<String>,
    reference_levels: Vec<(String, String)>,
}

fn boolean_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a BooleanArray, ModelError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<BooleanArray>())
        .ok_or_else(|| ModelError::BadColumn(name.to_string()))
}

fn string_column(batch: &RecordBatch, name: &str) -> Result<StringArray, ModelError> {
    let arr: &ArrayRef = batch
        .column_by_name(name)
        .ok_or_else(|| ModelError::BadColumn(name.to_string()))?;
    as_strings(arr, name).map_err(|_| ModelError::BadColumn(name.to_string()))
}

fn build_design(
    batch: &RecordBatch,
    outcome: &str,
    predictors: &[&str],
) -> Result<Design, ModelError> {
    let y_col = boolean_column(batch, outcome)?;
    let cols = predictors
        .iter()
        .map(|p| string_column(batch, p))
        .collect::<Result<Vec<_>, _>>()?;

    // complete cases only
    let rows: Vec<usize> = (0..batch.num_rows())
        .filter(|&i| y_col.is_valid(i) && cols.iter().all(|c| c.is_valid(i)))
        .collect();
    if rows.len() < batch.num_rows() {
        debug!(
            dropped = batch.num_rows() - rows.len(),
            "rows with missing values left out of the model"
        );
    }
    if rows.is_empty() {
        return Err(ModelError::EmptyTable);
    }

    let mut terms = vec![INTERCEPT.to_string()];
    let mut reference_levels = Vec::with_capacity(predictors.len());
    let mut level_sets: Vec<Vec<String>> = Vec::with_capacity(predictors.len());
    for (name, col) in predictors.iter().zip(&cols) {
        let levels: BTreeSet<&str> = rows.iter().map(|&i| col.value(i)).collect();
        let levels: Vec<String> = levels.into_iter().map(str::to_string).collect();
        if levels.len() < 2 {
            return Err(ModelError::SingleLevel {
                predictor: name.to_string(),
                level: levels.into_iter().next().unwrap_or_default(),
            });
        }
        reference_levels.push((name.to_string(), levels[0].clone()));
        terms.extend(levels[1..].iter().map(|l| term_name(name, l)));
        level_sets.push(levels);
    }

    let y: Array1<f64> = rows
        .iter()
        .map(|&i| if y_col.value(i) { 1.0 } else { 0.0 })
        .collect();
    let positives = y.sum();
    if positives == 0.0 || positives == y.len() as f64 {
        return Err(ModelError::ConstantOutcome {
            outcome: outcome.to_string(),
        });
    }

    let mut x = Array2::zeros((rows.len(), terms.len()));
    x.column_mut(0).fill(1.0);
    for (r, &i) in rows.iter().enumerate() {
        let mut offset = 1;
        for (col, levels) in cols.iter().zip(&level_sets) {
            let v = col.value(i);
            if let Some(pos) = levels[1..].iter().position(|l| l == v) {
                x[[r, offset + pos]] = 1.0;
            }
            offset += levels.len() - 1;
        }
    }

    Ok(Design {
        x,
        y,
        terms,
        reference_levels,
    })
}

fn sigmoid(v: f64) -> f64 {
    (1.0 / (1.0 + (-v).exp())).clamp(MU_EPS, 1.0 - MU_EPS)
}

fn deviance(y: &Array1<f64>, mu: &Array1<f64>) -> f64 {
    -2.0 * y
        .iter()
        .zip(mu.iter())
        .map(|(&y, &m)| y * m.ln() + (1.0 - y) * (1.0 - m).ln())
        .sum::<f64>()
}

/// Xᵀ·diag(w)·X
fn weighted_gram(x: &Array2<f64>, w: &Array1<f64>) -> Array2<f64> {
    let xw = x * &w.view().insert_axis(Axis(1));
    x.t().dot(&xw)
}

/// Fit `outcome ~ predictors` by IRLS.
pub fn fit_logit(
    batch: &RecordBatch,
    outcome: &str,
    predictors: &[&str],
) -> Result<LogitFit, ModelError> {
    let Design {
        x,
        y,
        terms,
        reference_levels,
    } = build_design(batch, outcome, predictors)?;
    let n = y.len();

    // glm's binomial starting values
    let mut mu: Array1<f64> = y.mapv(|v| (v + 0.5) / 2.0);
    let mut eta: Array1<f64> = mu.mapv(|m| (m / (1.0 - m)).ln());
    let mut dev_old = deviance(&y, &mu);
    let mut beta = Array1::zeros(terms.len());
    let mut converged = false;
    let mut iterations = 0;

    for iter in 1..=MAX_ITER {
        iterations = iter;
        let w = mu.mapv(|m| m * (1.0 - m));
        let z: Array1<f64> = &eta + &((&y - &mu) / &w);

        let xtwx = weighted_gram(&x, &w);
        let xtwz = x.t().dot(&(&w * &z));
        beta = solve_spd(&xtwx, &xtwz).ok_or(ModelError::Singular)?;

        eta = x.dot(&beta);
        mu = eta.mapv(sigmoid);
        let dev = deviance(&y, &mu);
        debug!(iter, dev, "irls step");

        if (dev - dev_old).abs() / (dev.abs() + 0.1) < EPSILON {
            converged = true;
            dev_old = dev;
            break;
        }
        dev_old = dev;
    }
    if !converged {
        warn!(iterations, "logistic fit did not converge");
    }

    let w = mu.mapv(|m| m * (1.0 - m));
    let cov = matrix_inverse(&weighted_gram(&x, &w)).ok_or(ModelError::Singular)?;

    let coefficients = terms
        .into_iter()
        .enumerate()
        .map(|(j, term)| {
            let estimate = beta[j];
            let std_error = cov[[j, j]].max(0.0).sqrt();
            let z_value = estimate / std_error;
            Coefficient {
                term,
                estimate,
                std_error,
                z_value,
                p_value: two_sided_p(z_value),
            }
        })
        .collect();

    let p_bar = y.sum() / n as f64;
    let null_deviance = deviance(&y, &Array1::from_elem(n, p_bar));

    Ok(LogitFit {
        outcome: outcome.to_string(),
        reference_levels,
        coefficients,
        n_obs: n,
        null_deviance,
        residual_deviance: dev_old,
        aic: dev_old + 2.0 * beta.len() as f64,
        iterations,
        converged,
    })
}

/// Solve the symmetric positive-definite system `a · x = b` by Cholesky
/// decomposition, falling back to Gauss-Jordan elimination.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    cholesky_solve(a, b).or_else(|| matrix_inverse(a).map(|inv| inv.dot(b)))
}

fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 1e-12 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T * x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan inverse with partial pivoting. `None` when singular.
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // [M | I]
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }
        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }
        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    let mut inv = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }
    Some(inv)
}

/// P(|Z| > |z|) for a standard normal Z.
pub fn two_sided_p(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    erfc(z.abs() / std::f64::consts::SQRT_2).min(1.0)
}

/// Complementary error function, Chebyshev fit with fractional error below
/// 1.2e-7.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398
                                + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::Arc;

    /// `(sex, race, murdered, rows)` groups expanded into a batch.
    fn batch(groups: &[(&str, &str, bool, usize)]) -> Result<RecordBatch> {
        let mut sex = Vec::new();
        let mut race = Vec::new();
        let mut murder = Vec::new();
        for &(s, r, m, n) in groups {
            for _ in 0..n {
                sex.push(Some(s));
                race.push(Some(r));
                murder.push(Some(m));
            }
        }
        Ok(RecordBatch::try_from_iter(vec![
            ("vic_sex", Arc::new(StringArray::from(sex)) as ArrayRef),
            ("vic_race", Arc::new(StringArray::from(race)) as ArrayRef),
            ("is_murder", Arc::new(BooleanArray::from(murder)) as ArrayRef),
        ])?)
    }

    #[test]
    fn single_factor_matches_closed_form() -> Result<()> {
        // F: 20/100 murders, M: 50/100
        let b = batch(&[
            ("F", "WHITE", true, 20),
            ("F", "WHITE", false, 80),
            ("M", "WHITE", true, 50),
            ("M", "WHITE", false, 50),
        ])?;
        let fit = fit_logit(&b, "is_murder", &["vic_sex"])?;

        assert!(fit.converged);
        assert_eq!(fit.n_obs, 200);
        assert_eq!(fit.reference_levels, vec![("vic_sex".to_string(), "F".to_string())]);
        assert_eq!(fit.coefficients.len(), 2);

        let intercept = fit.coefficient(INTERCEPT).unwrap();
        assert!((intercept.estimate - 0.25f64.ln()).abs() < 1e-5);
        assert!((intercept.std_error - 0.25).abs() < 1e-4);

        let male = fit.coefficient("vic_sex[M]").unwrap();
        assert!((male.estimate - 4.0f64.ln()).abs() < 1e-5);
        assert!((male.std_error - 0.1025f64.sqrt()).abs() < 1e-4);
        assert!(male.p_value < 0.001);
        assert!(fit.residual_deviance < fit.null_deviance);
        assert!((fit.aic - (fit.residual_deviance + 4.0)).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn reference_levels_are_omitted() -> Result<()> {
        let b = batch(&[
            ("F", "BLACK", true, 10),
            ("F", "BLACK", false, 30),
            ("F", "WHITE", true, 5),
            ("F", "WHITE", false, 25),
            ("M", "ASIAN", true, 8),
            ("M", "ASIAN", false, 12),
            ("M", "BLACK", true, 20),
            ("M", "BLACK", false, 20),
            ("M", "WHITE", true, 3),
            ("M", "WHITE", false, 17),
            ("F", "ASIAN", true, 2),
            ("F", "ASIAN", false, 8),
        ])?;
        let fit = fit_logit(&b, "is_murder", &["vic_sex", "vic_race"])?;
        let terms: Vec<&str> = fit.coefficients.iter().map(|c| c.term.as_str()).collect();
        assert_eq!(
            terms,
            vec![INTERCEPT, "vic_sex[M]", "vic_race[BLACK]", "vic_race[WHITE]"]
        );
        assert_eq!(
            fit.reference_levels,
            vec![
                ("vic_sex".to_string(), "F".to_string()),
                ("vic_race".to_string(), "ASIAN".to_string())
            ]
        );
        for c in &fit.coefficients {
            assert!(c.std_error.is_finite() && c.std_error > 0.0);
            assert!((0.0..=1.0).contains(&c.p_value));
        }
        Ok(())
    }

    #[test]
    fn single_level_predictor_is_a_model_error() -> Result<()> {
        let b = batch(&[("M", "WHITE", true, 3), ("M", "BLACK", false, 3)])?;
        assert_eq!(
            fit_logit(&b, "is_murder", &["vic_sex", "vic_race"]),
            Err(ModelError::SingleLevel {
                predictor: "vic_sex".into(),
                level: "M".into()
            })
        );
        Ok(())
    }

    #[test]
    fn degenerate_inputs() -> Result<()> {
        let empty = batch(&[])?;
        assert_eq!(
            fit_logit(&empty, "is_murder", &["vic_sex"]),
            Err(ModelError::EmptyTable)
        );

        let constant = batch(&[("M", "WHITE", false, 3), ("F", "WHITE", false, 3)])?;
        assert!(matches!(
            fit_logit(&constant, "is_murder", &["vic_sex"]),
            Err(ModelError::ConstantOutcome { .. })
        ));

        let b = batch(&[("M", "WHITE", true, 3), ("F", "WHITE", false, 3)])?;
        assert_eq!(
            fit_logit(&b, "vic_sex", &["vic_race"]),
            Err(ModelError::BadColumn("vic_sex".into()))
        );
        Ok(())
    }

    #[test]
    fn collinear_predictors_are_singular() -> Result<()> {
        // race is a relabelling of sex
        let b = batch(&[
            ("F", "A", true, 5),
            ("F", "A", false, 10),
            ("M", "B", true, 10),
            ("M", "B", false, 5),
        ])?;
        assert_eq!(
            fit_logit(&b, "is_murder", &["vic_sex", "vic_race"]),
            Err(ModelError::Singular)
        );
        Ok(())
    }

    #[test]
    fn p_values() {
        assert!((two_sided_p(0.0) - 1.0).abs() < 1e-6);
        assert!((two_sided_p(1.959964) - 0.05).abs() < 1e-5);
        assert!((two_sided_p(-1.959964) - 0.05).abs() < 1e-5);
        assert!(two_sided_p(10.0) < 1e-20);
    }
}
