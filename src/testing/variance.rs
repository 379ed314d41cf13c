//! Variance assumptions: homoscedasticity across independent groups and
//! sphericity across repeated measures.

use super::parametric::one_way_anova;
use super::TestResult;
use crate::descriptive::median;
use crate::special;

/// Levene test for equality of variances: H₀: all groups have equal variance.
///
/// Uses the **median** variant (Brown-Forsythe), which stays robust when
/// the groups are not normal.
///
/// # Algorithm
///
/// 1. zᵢⱼ = |xᵢⱼ - median(groupᵢ)|
/// 2. One-way ANOVA on the zᵢⱼ values
///
/// # Returns
///
/// `None` if fewer than 2 groups, any group < 2 observations, or non-finite values.
///
/// # References
///
/// - Levene (1960). "Robust tests for equality of variances". In
///   Olkin (Ed.), Contributions to Probability and Statistics.
/// - Brown & Forsythe (1974). "Robust tests for the equality of variances".
///   JASA, 69(346), 364–367.
///
/// # Examples
///
/// ```
/// use u_stattest::testing::levene_test;
///
/// let g1 = [4.9, 5.0, 5.0, 5.1, 5.0];
/// let g2 = [0.0, 3.0, 5.0, 7.0, 10.0];
/// let r = levene_test(&[&g1, &g2]).unwrap();
/// assert!(r.p_value < 0.05);
/// ```
pub fn levene_test(groups: &[&[f64]]) -> Option<TestResult> {
    if groups.len() < 2 || groups.iter().any(|g| g.iter().any(|v| !v.is_finite())) {
        return None;
    }

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let m = median(g).unwrap_or(0.0);
            g.iter().map(|&x| (x - m).abs()).collect()
        })
        .collect();
    let refs: Vec<&[f64]> = deviations.iter().map(Vec::as_slice).collect();
    let anova = one_way_anova(&refs)?;

    // Identical deviation profiles leave no between-group signal at all
    let (statistic, p_value) = if anova.ms_between < 1e-300 {
        (0.0, 1.0)
    } else {
        (anova.f_statistic, anova.p_value)
    };

    Some(TestResult {
        statistic,
        df: anova.df_between as f64,
        p_value,
    })
}

/// Result of Mauchly's sphericity test.
#[derive(Debug, Clone, Copy)]
pub struct MauchlyResult {
    /// Mauchly's W (0 ≤ W ≤ 1); 1 means perfectly spherical.
    pub w: f64,
    /// χ² approximation of -(1-f)(n-1)·ln W.
    pub chi_squared: f64,
    /// Degrees of freedom d(d+1)/2 - 1 with d = k - 1.
    pub df: f64,
    /// p-value. Small values reject sphericity.
    pub p_value: f64,
}

/// Mauchly's test of sphericity for repeated measures.
///
/// `rows` holds one subject per row and one condition per column.
///
/// # Algorithm
///
/// With C the k×(k-1) orthonormal Helmert contrasts and S the sample
/// covariance of the conditions, M = CᵀSC and d = k - 1:
///
/// W = det(M) / (tr(M)/d)^d, f = (2d² + d + 2) / (6d(n-1)),
/// χ² = -(1-f)(n-1)·ln W with d(d+1)/2 - 1 degrees of freedom.
///
/// Two conditions are always spherical (W = 1, p = 1).
///
/// # Returns
///
/// `None` if fewer than 2 subjects or 2 conditions, ragged rows,
/// non-finite values, or differences between conditions without variance.
///
/// # References
///
/// Mauchly (1940). "Significance test for sphericity of a normal n-variate
/// distribution". Annals of Mathematical Statistics, 11(2), 204–209.
pub fn mauchly_test(rows: &[Vec<f64>]) -> Option<MauchlyResult> {
    let m = contrast_covariance(rows)?;
    let n = rows.len() as f64;
    let d = m.len();
    if d == 1 {
        return Some(MauchlyResult {
            w: 1.0,
            chi_squared: 0.0,
            df: 0.0,
            p_value: 1.0,
        });
    }

    let df_f = d as f64;
    let trace: f64 = (0..d).map(|i| m[i][i]).sum();
    if trace < 1e-300 {
        return None;
    }

    let w = (determinant(m) / (trace / df_f).powf(df_f)).clamp(0.0, 1.0);
    let f = (2.0 * df_f * df_f + df_f + 2.0) / (6.0 * df_f * (n - 1.0));
    let chi_squared = -(1.0 - f) * (n - 1.0) * w.ln();
    let df = df_f * (df_f + 1.0) / 2.0 - 1.0;

    Some(MauchlyResult {
        w,
        chi_squared,
        df,
        p_value: special::chi_squared_sf(chi_squared, df),
    })
}

/// Greenhouse-Geisser ε for repeated measures.
///
/// ε = tr(M)² / (d · Σ Mᵢⱼ²) with M = CᵀSC as in [`mauchly_test`],
/// bounded to [1/d, 1].
///
/// # Returns
///
/// `None` for the same inputs [`mauchly_test`] rejects.
pub fn greenhouse_geisser_epsilon(rows: &[Vec<f64>]) -> Option<f64> {
    let m = contrast_covariance(rows)?;
    let d = m.len() as f64;
    let trace: f64 = (0..m.len()).map(|i| m[i][i]).sum();
    let frobenius_sq: f64 = m.iter().flatten().map(|v| v * v).sum();
    if frobenius_sq < 1e-300 {
        return None;
    }
    Some((trace * trace / (d * frobenius_sq)).clamp(1.0 / d, 1.0))
}

// Sample covariance (ddof = 1) of the rows projected on orthonormal
// Helmert contrasts, a d×d matrix with d = k - 1.
fn contrast_covariance(rows: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = rows.len();
    let k = rows.first().map_or(0, Vec::len);
    if n < 2 || k < 2 || rows.iter().any(|r| r.len() != k || r.iter().any(|v| !v.is_finite())) {
        return None;
    }
    let d = k - 1;

    let projected: Vec<Vec<f64>> = rows
        .iter()
        .map(|r| {
            (0..d)
                .map(|j| {
                    let jf = (j + 1) as f64;
                    let scale = (jf * (jf + 1.0)).sqrt();
                    (r[..=j].iter().sum::<f64>() - jf * r[j + 1]) / scale
                })
                .collect()
        })
        .collect();

    let nf = n as f64;
    let means: Vec<f64> = (0..d)
        .map(|j| projected.iter().map(|p| p[j]).sum::<f64>() / nf)
        .collect();

    let mut cov = vec![vec![0.0; d]; d];
    for p in &projected {
        for a in 0..d {
            for b in a..d {
                cov[a][b] += (p[a] - means[a]) * (p[b] - means[b]);
            }
        }
    }
    for a in 0..d {
        for b in a..d {
            cov[a][b] /= nf - 1.0;
            cov[b][a] = cov[a][b];
        }
    }
    Some(cov)
}

// Determinant by Gaussian elimination with partial pivoting.
fn determinant(mut m: Vec<Vec<f64>>) -> f64 {
    let n = m.len();
    let mut det = 1.0;
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() < 1e-300 {
            return 0.0;
        }
        if pivot != col {
            m.swap(pivot, col);
            det = -det;
        }
        det *= m[col][col];
        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            for c in col..n {
                m[row][c] -= factor * m[col][c];
            }
        }
    }
    det
}
