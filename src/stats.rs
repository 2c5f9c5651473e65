use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

pub const ALPHA: f64 = 0.05;

const MAX_ITER: usize = 300;
const EPS: f64 = 3.0e-14;
const FPMIN: f64 = 1.0e-300;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
}

impl ChiSquareResult {
    pub fn significant(&self) -> bool {
        self.p_value < ALPHA
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairedTTestResult {
    pub t_statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
    pub mean_difference: f64,
}

impl PairedTTestResult {
    pub fn significant(&self) -> bool {
        self.p_value < ALPHA
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Descriptive {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Goodness of fit against a uniform expectation of `total / k` per category.
pub fn chi_square_uniform(observed: &[u64]) -> Result<ChiSquareResult, AnalysisError> {
    let total: u64 = observed.iter().sum();
    if observed.len() < 2 || total == 0 {
        return Err(AnalysisError::EmptyDataset);
    }
    let expected = total as f64 / observed.len() as f64;
    let statistic = observed
        .iter()
        .map(|&o| {
            let diff = o as f64 - expected;
            diff * diff / expected
        })
        .sum::<f64>();
    let df = observed.len() - 1;
    Ok(ChiSquareResult {
        statistic,
        p_value: chi_square_sf(statistic, df as f64),
        degrees_of_freedom: df,
    })
}

/// Two-sided paired t-test of `a[i]` against `b[i]`.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> Result<PairedTTestResult, AnalysisError> {
    if a.len() != b.len() {
        return Err(AnalysisError::MismatchedSamples {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.len() < 2 {
        return Err(AnalysisError::InsufficientQualifyingTeams {
            found: a.len(),
            required: 2,
        });
    }

    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let n = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / n;
    let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_err = (variance / n).sqrt();
    if std_err == 0.0 || !std_err.is_finite() {
        return Err(AnalysisError::DegenerateSample("paired t statistic"));
    }

    let t_statistic = mean / std_err;
    let df = diffs.len() - 1;
    Ok(PairedTTestResult {
        t_statistic,
        p_value: student_t_two_sided(t_statistic, df as f64),
        degrees_of_freedom: df,
        mean_difference: mean,
    })
}

/// Mean, median, sample standard deviation, min and max.
pub fn describe(values: &[f64]) -> Result<Descriptive, AnalysisError> {
    if values.len() < 2 {
        return Err(AnalysisError::InsufficientQualifyingTeams {
            found: values.len(),
            required: 2,
        });
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Ok(Descriptive {
        mean,
        median,
        std,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}

/// Upper tail of the chi-square distribution with `df` degrees of freedom.
pub fn chi_square_sf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    regularized_gamma_q(df / 2.0, x / 2.0)
}

/// `P(|T| >= |t|)` for Student's t with `df` degrees of freedom.
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    let x = df / (df + t * t);
    regularized_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

fn ln_gamma(x: f64) -> f64 {
    libm::lgamma(x)
}

/// Q(a, x) = 1 - P(a, x): series below `a + 1`, continued fraction above.
fn regularized_gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        (1.0 - gamma_p_series(a, x)).clamp(0.0, 1.0)
    } else {
        gamma_q_continued_fraction(a, x).clamp(0.0, 1.0)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut term = 1.0 / a;
    let mut sum = term;
    for _ in 0..MAX_ITER {
        ap += 1.0;
        term *= x / ap;
        sum += term;
        if term.abs() < sum.abs() * EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = guard(an * d + b);
        c = guard(b + an / c);
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Regularized incomplete beta I_x(a, b).
fn regularized_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;
    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

fn guard(v: f64) -> f64 {
    if v.abs() < FPMIN { FPMIN } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn chi_square_two_df_matches_closed_form() {
        for x in [0.5, 2.0, 5.991, 12.0] {
            assert!(close(chi_square_sf(x, 2.0), (-x / 2.0).exp(), 1e-12));
        }
    }

    #[test]
    fn chi_square_three_df_reference_values() {
        assert!(close(chi_square_sf(3.0, 3.0), 0.391625, 1e-5));
        assert!(close(chi_square_sf(7.815, 3.0), 0.05, 1e-4));
    }

    #[test]
    fn student_t_reference_values() {
        assert!(close(student_t_two_sided(2.0, 10.0), 0.073388, 1e-5));
        assert!(close(student_t_two_sided(1.0, 1.0), 0.5, 1e-9));
        assert!(close(student_t_two_sided(-3.5, 4.0), 0.024896, 1e-5));
        assert!(close(student_t_two_sided(0.0, 7.0), 1.0, 1e-12));
    }

    #[test]
    fn describe_uses_sample_std() {
        let d = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(close(d.mean, 5.0, 1e-12));
        assert!(close(d.median, 4.5, 1e-12));
        assert!(close(d.std, (32.0f64 / 7.0).sqrt(), 1e-12));
        assert_eq!(d.min, 2.0);
        assert_eq!(d.max, 9.0);
    }

    #[test]
    fn zero_variance_differences_are_degenerate() {
        let err = paired_t_test(&[50.0, 60.0], &[40.0, 50.0]).unwrap_err();
        assert_eq!(err, AnalysisError::DegenerateSample("paired t statistic"));
    }
}
