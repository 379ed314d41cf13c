//! t-tests and the ANOVA family.

use super::variance::greenhouse_geisser_epsilon;
use super::TestResult;
use crate::descriptive::{mean, variance};
use crate::special;

fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|v| v.is_finite())
}

// Two-sided p-value of a t statistic.
fn t_two_sided(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    (2.0 * special::t_sf(t.abs(), df)).min(1.0)
}

// t statistic for a mean difference whose standard error is zero.
fn unscaled_t(diff: f64) -> f64 {
    if diff == 0.0 {
        f64::NAN
    } else {
        diff.signum() * f64::INFINITY
    }
}

// ---------------------------------------------------------------------------
// t-tests
// ---------------------------------------------------------------------------

/// Paired t-test: H₀: mean difference = 0.
///
/// # Algorithm
///
/// dᵢ = xᵢ - yᵢ, t = d̄ / (s_d / √n), df = n - 1.
///
/// Differences with zero spread give t = ±∞ (p = 0) when their mean is
/// non-zero, and an undefined statistic (`NaN`) when all differences are 0.
///
/// # Returns
///
/// `None` if fewer than 2 pairs, slices differ in length, or non-finite values.
///
/// # Examples
///
/// ```
/// use u_stattest::testing::paired_t_test;
///
/// let before = [5.0, 6.0, 7.0, 8.0, 9.0];
/// let after  = [5.5, 6.2, 7.1, 8.3, 9.4];
/// let r = paired_t_test(&before, &after).unwrap();
/// assert!(r.statistic < 0.0); // after > before
/// assert_eq!(r.df, 4.0);
/// ```
pub fn paired_t_test(x: &[f64], y: &[f64]) -> Option<TestResult> {
    if x.len() != y.len() || x.len() < 2 || !all_finite(x) || !all_finite(y) {
        return None;
    }

    let diffs: Vec<f64> = x.iter().zip(y.iter()).map(|(&a, &b)| a - b).collect();
    let n = diffs.len() as f64;
    let d_mean = mean(&diffs)?;
    let sd = variance(&diffs, 1)?.sqrt();
    let df = n - 1.0;

    let t = if sd < 1e-300 {
        unscaled_t(d_mean)
    } else {
        d_mean / (sd / n.sqrt())
    };

    Some(TestResult {
        statistic: t,
        df,
        p_value: t_two_sided(t, df),
    })
}

/// Two-sample t-test with pooled variance: H₀: μ₁ = μ₂ (equal variances).
///
/// # Algorithm
///
/// s²ₚ = ((n₁-1)s₁² + (n₂-1)s₂²) / (n₁+n₂-2),
/// t = (x̄₁ - x̄₂) / √(s²ₚ (1/n₁ + 1/n₂)), df = n₁+n₂-2.
///
/// Two constant samples give t = ±∞ (p = 0) when their means differ and an
/// undefined statistic (`NaN`) when they are equal.
///
/// # Returns
///
/// `None` if either sample has fewer than 2 observations or non-finite
/// values.
pub fn pooled_t_test(a: &[f64], b: &[f64]) -> Option<TestResult> {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 || !all_finite(a) || !all_finite(b) {
        return None;
    }

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let df = n1f + n2f - 2.0;
    let pooled = ((n1f - 1.0) * variance(a, 1)? + (n2f - 1.0) * variance(b, 1)?) / df;
    let se = (pooled * (1.0 / n1f + 1.0 / n2f)).sqrt();
    let diff = mean(a)? - mean(b)?;
    let t = if se < 1e-300 { unscaled_t(diff) } else { diff / se };
    Some(TestResult {
        statistic: t,
        df,
        p_value: t_two_sided(t, df),
    })
}

/// Welch-Satterthwaite degrees of freedom for two samples.
///
/// df = (v₁/n₁ + v₂/n₂)² / (v₁²/(n₁²(n₁-1)) + v₂²/(n₂²(n₂-1)))
/// where v₁, v₂ are sample variances (ddof = 1).
///
/// # Examples
///
/// ```
/// use u_stattest::testing::welch_satterthwaite_df;
///
/// // Equal variances and sizes reduce to n₁ + n₂ - 2
/// let df = welch_satterthwaite_df(2.0, 10, 2.0, 10);
/// assert!((df - 18.0).abs() < 1e-12);
/// ```
pub fn welch_satterthwaite_df(var1: f64, n1: usize, var2: f64, n2: usize) -> f64 {
    let (n1, n2) = (n1 as f64, n2 as f64);
    let numerator = (var1 / n1 + var2 / n2).powi(2);
    let denominator =
        var1 * var1 / (n1 * n1 * (n1 - 1.0)) + var2 * var2 / (n2 * n2 * (n2 - 1.0));
    numerator / denominator
}

/// Two-sample Welch t-test: H₀: μ₁ = μ₂ (unequal variances).
///
/// # Algorithm
///
/// t = (x̄₁ - x̄₂) / √(s₁²/n₁ + s₂²/n₂), df from [`welch_satterthwaite_df`].
///
/// # Returns
///
/// `None` if either sample has fewer than 2 observations, both variances
/// are zero, or non-finite values.
///
/// # References
///
/// Welch (1947). "The generalization of Student's problem when several
/// different population variances are involved". Biometrika, 34, 28–35.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<TestResult> {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 || !all_finite(a) || !all_finite(b) {
        return None;
    }

    let var1 = variance(a, 1)?;
    let var2 = variance(b, 1)?;
    let se_sq = var1 / n1 as f64 + var2 / n2 as f64;
    if se_sq < 1e-300 {
        return None;
    }

    let t = (mean(a)? - mean(b)?) / se_sq.sqrt();
    let df = welch_satterthwaite_df(var1, n1, var2, n2);
    Some(TestResult {
        statistic: t,
        df,
        p_value: t_two_sided(t, df),
    })
}

// ---------------------------------------------------------------------------
// ANOVA
// ---------------------------------------------------------------------------

/// Result of one-way ANOVA.
#[derive(Debug, Clone)]
pub struct AnovaResult {
    /// F-statistic.
    pub f_statistic: f64,
    /// Degrees of freedom between groups (k - 1).
    pub df_between: usize,
    /// Degrees of freedom within groups (N - k).
    pub df_within: usize,
    /// p-value.
    pub p_value: f64,
    /// Mean square between.
    pub ms_between: f64,
    /// Mean square within (the error term used by Tukey's procedure).
    pub ms_within: f64,
    /// Group means.
    pub group_means: Vec<f64>,
}

/// One-way ANOVA: H₀: all group means are equal.
///
/// # Algorithm
///
/// F = MS_between / MS_within with MS_between = SS_between / (k-1) and
/// MS_within = SS_within / (N-k).
///
/// # Returns
///
/// `None` if fewer than 2 groups, any group has fewer than 2 observations,
/// or non-finite values.
///
/// # References
///
/// Fisher (1925). "Statistical Methods for Research Workers".
///
/// # Examples
///
/// ```
/// use u_stattest::testing::one_way_anova;
///
/// let group1 = [5.0, 6.0, 7.0, 5.5, 6.5];
/// let group2 = [8.0, 9.0, 8.5, 9.5, 8.0];
/// let group3 = [4.0, 3.0, 3.5, 4.5, 4.0];
/// let r = one_way_anova(&[&group1, &group2, &group3]).unwrap();
/// assert!(r.p_value < 0.01);
/// assert_eq!((r.df_between, r.df_within), (2, 12));
/// ```
pub fn one_way_anova(groups: &[&[f64]]) -> Option<AnovaResult> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.len() < 2 || !all_finite(g)) {
        return None;
    }

    let total_n: usize = groups.iter().map(|g| g.len()).sum();
    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / total_n as f64;
    let group_means: Vec<f64> = groups.iter().filter_map(|g| mean(g)).collect();

    let ss_between: f64 = groups
        .iter()
        .zip(group_means.iter())
        .map(|(g, &gm)| g.len() as f64 * (gm - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .zip(group_means.iter())
        .map(|(g, &gm)| g.iter().map(|&x| (x - gm).powi(2)).sum::<f64>())
        .sum();

    let df_between = k - 1;
    let df_within = total_n - k;
    if df_within == 0 {
        return None;
    }

    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;
    let f_statistic = if ms_within > 1e-300 {
        ms_between / ms_within
    } else {
        f64::INFINITY
    };

    Some(AnovaResult {
        f_statistic,
        df_between,
        df_within,
        p_value: special::f_sf(f_statistic, df_between as f64, df_within as f64),
        ms_between,
        ms_within,
        group_means,
    })
}

/// Result of Welch's ANOVA.
#[derive(Debug, Clone, Copy)]
pub struct WelchAnovaResult {
    /// Welch F statistic.
    pub f_statistic: f64,
    /// Numerator degrees of freedom (k - 1).
    pub df1: f64,
    /// Approximate denominator degrees of freedom.
    pub df2: f64,
    /// p-value.
    pub p_value: f64,
}

/// Welch's ANOVA: H₀: all group means are equal, variances may differ.
///
/// # Algorithm
///
/// With weights wᵢ = nᵢ/sᵢ², W = Σwᵢ and weighted grand mean
/// x̄_w = Σwᵢx̄ᵢ / W:
///
/// Λ = 3 Σ (1 - wᵢ/W)² / (nᵢ - 1) / (k² - 1)
/// F = [Σ wᵢ(x̄ᵢ - x̄_w)² / (k-1)] / [1 + 2Λ(k-2)/3], df = (k-1, 1/Λ).
///
/// A group with zero variance gets an infinite weight, leaving the
/// statistic, `df2` and the p-value undefined (`NaN`).
///
/// # Returns
///
/// `None` if fewer than 2 groups, any group has fewer than 2 observations,
/// or non-finite values.
///
/// # References
///
/// Welch (1951). "On the comparison of several mean values: an alternative
/// approach". Biometrika, 38, 330–336.
pub fn welch_anova(groups: &[&[f64]]) -> Option<WelchAnovaResult> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.len() < 2 || !all_finite(g)) {
        return None;
    }

    let kf = k as f64;
    let mut weights = Vec::with_capacity(k);
    let mut means = Vec::with_capacity(k);
    for g in groups {
        let v = variance(g, 1)?;
        if v < 1e-300 {
            return Some(WelchAnovaResult {
                f_statistic: f64::NAN,
                df1: kf - 1.0,
                df2: f64::NAN,
                p_value: f64::NAN,
            });
        }
        weights.push(g.len() as f64 / v);
        means.push(mean(g)?);
    }

    let w_sum: f64 = weights.iter().sum();
    let weighted_mean = weights
        .iter()
        .zip(means.iter())
        .map(|(w, m)| w * m)
        .sum::<f64>()
        / w_sum;

    let ms_between = weights
        .iter()
        .zip(means.iter())
        .map(|(w, m)| w * (m - weighted_mean).powi(2))
        .sum::<f64>()
        / (kf - 1.0);
    let lambda = 3.0
        * weights
            .iter()
            .zip(groups.iter())
            .map(|(w, g)| (1.0 - w / w_sum).powi(2) / (g.len() as f64 - 1.0))
            .sum::<f64>()
        / (kf * kf - 1.0);

    let f_statistic = ms_between / (1.0 + 2.0 * lambda * (kf - 2.0) / 3.0);
    let df1 = kf - 1.0;
    let df2 = 1.0 / lambda;

    Some(WelchAnovaResult {
        f_statistic,
        df1,
        df2,
        p_value: special::f_sf(f_statistic, df1, df2),
    })
}

/// Result of a one-way repeated-measures ANOVA.
#[derive(Debug, Clone, Copy)]
pub struct RmAnovaResult {
    /// F statistic (conditions effect).
    pub f_statistic: f64,
    /// Numerator degrees of freedom, corrected when `epsilon` is set.
    pub df1: f64,
    /// Denominator degrees of freedom, corrected when `epsilon` is set.
    pub df2: f64,
    /// p-value, corrected when `epsilon` is set.
    pub p_value: f64,
    /// Greenhouse-Geisser ε applied to the degrees of freedom, if any.
    pub epsilon: Option<f64>,
}

/// One-way repeated-measures ANOVA.
///
/// `rows` holds one subject per row and one condition per column.
///
/// # Algorithm
///
/// SS_conditions = n Σⱼ (x̄.ⱼ - x̄)², SS_subjects = k Σᵢ (x̄ᵢ. - x̄)²,
/// SS_error = SS_total - SS_conditions - SS_subjects.
/// F = (SS_conditions / (k-1)) / (SS_error / ((k-1)(n-1))).
///
/// With `correction`, both degrees of freedom are multiplied by the
/// Greenhouse-Geisser ε before computing the p-value. When ε is undefined
/// (the differences between conditions have no variance) ε = 1 is used.
///
/// # Returns
///
/// `None` if fewer than 2 subjects or 2 conditions, ragged rows, or
/// non-finite values.
///
/// # References
///
/// Greenhouse & Geisser (1959). "On methods in the analysis of profile
/// data". Psychometrika, 24, 95–112.
pub fn repeated_measures_anova(rows: &[Vec<f64>], correction: bool) -> Option<RmAnovaResult> {
    let n = rows.len();
    let k = rows.first().map_or(0, Vec::len);
    if n < 2 || k < 2 || rows.iter().any(|r| r.len() != k || !all_finite(r)) {
        return None;
    }

    let (nf, kf) = (n as f64, k as f64);
    let grand_mean = rows.iter().flatten().sum::<f64>() / (nf * kf);

    let ss_total: f64 = rows.iter().flatten().map(|&x| (x - grand_mean).powi(2)).sum();
    let ss_conditions: f64 = (0..k)
        .map(|j| {
            let m = rows.iter().map(|r| r[j]).sum::<f64>() / nf;
            nf * (m - grand_mean).powi(2)
        })
        .sum();
    let ss_subjects: f64 = rows
        .iter()
        .map(|r| kf * (r.iter().sum::<f64>() / kf - grand_mean).powi(2))
        .sum();
    let ss_error = (ss_total - ss_conditions - ss_subjects).max(0.0);

    let df1 = kf - 1.0;
    let df2 = (kf - 1.0) * (nf - 1.0);
    let ms_error = ss_error / df2;
    let f_statistic = if ms_error > 1e-300 {
        (ss_conditions / df1) / ms_error
    } else {
        f64::INFINITY
    };

    let epsilon = correction.then(|| greenhouse_geisser_epsilon(rows).unwrap_or(1.0));
    let scale = epsilon.unwrap_or(1.0);
    let (df1, df2) = (df1 * scale, df2 * scale);

    Some(RmAnovaResult {
        f_statistic,
        df1,
        df2,
        p_value: special::f_sf(f_statistic, df1, df2),
        epsilon,
    })
}
