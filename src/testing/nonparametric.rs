//! Rank-based tests.

use super::{average_ranks, rank, tie_correction, TestResult};
use crate::special;

fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|v| v.is_finite())
}

/// Mann-Whitney U test: H₀: the two populations have the same distribution.
///
/// # Algorithm
///
/// 1. Combine samples, rank all observations (average ranks for ties)
/// 2. U₁ = R₁ - n₁(n₁+1)/2 where R₁ = sum of ranks in sample `a`
/// 3. p-value:
///    - exact null distribution of U when either sample has at most 8
///      observations and there are no ties; `continuity` is ignored
///    - otherwise normal approximation z = (|U₁ - μ| - c) / σ with
///      μ = n₁n₂/2, σ² = n₁n₂/12 · (N + 1 - Σt(t²-1) / (N(N-1))), and
///      c = 0.5 when `continuity` is set, 0 otherwise
///
/// The reported statistic is U₁.
///
/// # Returns
///
/// `None` if either sample has fewer than 2 observations, all observations
/// are tied, or non-finite values.
///
/// # References
///
/// Mann & Whitney (1947). "On a test of whether one of two random
/// variables is stochastically larger than the other". Annals of
/// Mathematical Statistics, 18(1), 50–60.
///
/// # Examples
///
/// ```
/// use u_stattest::testing::mann_whitney_u_test;
///
/// // Small untied samples use the exact distribution: 2 of C(10, 5) orderings
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [6.0, 7.0, 8.0, 9.0, 10.0];
/// let r = mann_whitney_u_test(&a, &b, true).unwrap();
/// assert_eq!(r.statistic, 0.0);
/// assert!((r.p_value - 2.0 / 252.0).abs() < 1e-12);
///
/// // Larger samples use the normal approximation
/// let a: Vec<f64> = (0..12).map(f64::from).collect();
/// let b: Vec<f64> = (6..18).map(f64::from).collect();
/// let plain = mann_whitney_u_test(&a, &b, false).unwrap();
/// let corrected = mann_whitney_u_test(&a, &b, true).unwrap();
/// assert!(corrected.p_value > plain.p_value);
/// ```
pub fn mann_whitney_u_test(a: &[f64], b: &[f64], continuity: bool) -> Option<TestResult> {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 || !all_finite(a) || !all_finite(b) {
        return None;
    }

    let combined: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    let (ranks, ties) = rank(&combined);

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let nf = n1f + n2f;
    let r1: f64 = ranks[..n1].iter().sum();
    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;

    let mu = n1f * n2f / 2.0;
    let sigma_sq = n1f * n2f / 12.0 * (nf + 1.0 - ties / (nf * (nf - 1.0)));
    if sigma_sq <= 0.0 {
        return None;
    }

    let p_value = if n1.min(n2) <= 8 && ties == 0.0 {
        let u_upper = u1.max(n1f * n2f - u1).round() as usize;
        let pmf = mann_whitney_exact_pmf(n1, n2);
        let upper_tail: f64 = pmf.iter().skip(u_upper).sum();
        (2.0 * upper_tail).min(1.0)
    } else {
        let correction = if continuity { 0.5 } else { 0.0 };
        let z = ((u1 - mu).abs() - correction) / sigma_sq.sqrt();
        (2.0 * special::standard_normal_sf(z)).min(1.0)
    };

    Some(TestResult {
        statistic: u1,
        df: f64::NAN,
        p_value,
    })
}

// P(U = u) for u = 0..=n₁n₂ under H₀ with untied samples. The counts are the
// coefficients of the Gaussian binomial [N choose m]_q with m = min(n₁, n₂),
// built as Π (1 - q^(n+i)) / (1 - q^i) over i = 1..=m.
fn mann_whitney_exact_pmf(n1: usize, n2: usize) -> Vec<f64> {
    let (m, n) = (n1.min(n2), n1.max(n2));
    let len = m * n + 1;
    let mut counts = vec![0.0_f64; len];
    counts[0] = 1.0;
    for i in 1..=m {
        for s in (n + i..len).rev() {
            counts[s] -= counts[s - n - i];
        }
        for s in i..len {
            counts[s] += counts[s - i];
        }
    }
    let total: f64 = counts.iter().sum();
    counts.iter().map(|c| c / total).collect()
}

/// Wilcoxon signed-rank test: H₀: the median of the paired differences is 0.
///
/// # Algorithm
///
/// 1. dᵢ = xᵢ - yᵢ; zero differences are discarded
/// 2. Rank |dᵢ| (average ranks for ties)
/// 3. T = min(T⁺, T⁻)
/// 4. p-value:
///    - exact null distribution of T when n ≤ 50, there are no ties and no
///      zero differences were discarded
///    - otherwise normal approximation with μ = n(n+1)/4 and
///      σ² = n(n+1)(2n+1)/24 - Σt(t²-1)/48
///
/// # Returns
///
/// `None` if no difference is non-zero, slices differ in length, or
/// non-finite values.
///
/// # References
///
/// Wilcoxon (1945). "Individual comparisons by ranking methods".
/// Biometrics Bulletin, 1(6), 80–83.
///
/// # Examples
///
/// ```
/// use u_stattest::testing::wilcoxon_signed_rank_test;
///
/// let before = [5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// let after  = [6.0, 7.5, 8.2, 9.6, 11.0, 11.7];
/// let r = wilcoxon_signed_rank_test(&before, &after).unwrap();
/// assert_eq!(r.statistic, 0.0); // every difference is negative
/// assert!((r.p_value - 2.0 / 64.0).abs() < 1e-12);
/// ```
pub fn wilcoxon_signed_rank_test(x: &[f64], y: &[f64]) -> Option<TestResult> {
    if x.len() != y.len() || x.is_empty() || !all_finite(x) || !all_finite(y) {
        return None;
    }

    let all_diffs: Vec<f64> = x.iter().zip(y.iter()).map(|(&a, &b)| a - b).collect();
    let diffs: Vec<f64> = all_diffs.iter().copied().filter(|d| d.abs() > 1e-300).collect();
    let zeros_dropped = diffs.len() < all_diffs.len();

    let n = diffs.len();
    if n == 0 {
        return None;
    }

    let abs_diffs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let (ranks, ties) = rank(&abs_diffs);

    let t_plus: f64 = diffs
        .iter()
        .zip(ranks.iter())
        .filter(|&(&d, _)| d > 0.0)
        .map(|(_, &r)| r)
        .sum();
    let nf = n as f64;
    let total = nf * (nf + 1.0) / 2.0;
    let t = t_plus.min(total - t_plus);

    let p_value = if n <= 50 && ties == 0.0 && !zeros_dropped {
        signed_rank_exact_cdf(t, n)
    } else {
        let mu = nf * (nf + 1.0) / 4.0;
        let sigma_sq = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - ties / 48.0;
        if sigma_sq <= 0.0 {
            return None;
        }
        let z = (t - mu) / sigma_sq.sqrt();
        special::standard_normal_cdf(z)
    };

    Some(TestResult {
        statistic: t,
        df: f64::NAN,
        p_value: (2.0 * p_value).min(1.0),
    })
}

// P(T ≤ t) under H₀ for n untied non-zero differences, by counting the
// subsets of {1..n} whose rank sum is at most t.
fn signed_rank_exact_cdf(t: f64, n: usize) -> f64 {
    if t < 0.0 {
        return 0.0;
    }
    let max_sum = n * (n + 1) / 2;
    let mut counts = vec![0.0_f64; max_sum + 1];
    counts[0] = 1.0;
    for r in 1..=n {
        for s in (r..=max_sum).rev() {
            counts[s] += counts[s - r];
        }
    }
    let limit = (t.floor() as usize).min(max_sum);
    let below: f64 = counts[..=limit].iter().sum();
    below / 2.0_f64.powi(n as i32)
}

/// Kruskal-Wallis H test: H₀: all groups have the same distribution.
///
/// # Algorithm
///
/// H = 12 / (N(N+1)) · Σ nᵢ (R̄ᵢ - R̄)², divided by the tie correction
/// 1 - Σt(t²-1) / (N³ - N). H ~ χ²(k-1) under H₀.
///
/// # Returns
///
/// `None` if fewer than 2 groups, any group has fewer than 2 observations,
/// or non-finite values.
///
/// # References
///
/// Kruskal & Wallis (1952). "Use of ranks in one-criterion variance
/// analysis". JASA, 47(260), 583–621.
///
/// # Examples
///
/// ```
/// use u_stattest::testing::kruskal_wallis_test;
///
/// let g1 = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let g2 = [6.0, 7.0, 8.0, 9.0, 10.0];
/// let g3 = [11.0, 12.0, 13.0, 14.0, 15.0];
/// let r = kruskal_wallis_test(&[&g1, &g2, &g3]).unwrap();
/// assert!(r.p_value < 0.01);
/// assert_eq!(r.df, 2.0);
/// ```
pub fn kruskal_wallis_test(groups: &[&[f64]]) -> Option<TestResult> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.len() < 2 || !all_finite(g)) {
        return None;
    }

    let mut combined: Vec<(f64, usize)> = groups
        .iter()
        .enumerate()
        .flat_map(|(gi, g)| g.iter().map(move |&v| (v, gi)))
        .collect();
    combined.sort_by(|a, b| a.0.total_cmp(&b.0));
    let ranks = average_ranks(&combined);

    let mut rank_sums = vec![0.0; k];
    for (&(_, gi), &r) in combined.iter().zip(ranks.iter()) {
        rank_sums[gi] += r;
    }

    let nf = combined.len() as f64;
    let mean_rank = (nf + 1.0) / 2.0;
    let mut h: f64 = groups
        .iter()
        .zip(rank_sums.iter())
        .map(|(g, &rs)| {
            let ni = g.len() as f64;
            ni * (rs / ni - mean_rank).powi(2)
        })
        .sum();
    h *= 12.0 / (nf * (nf + 1.0));

    let denom = 1.0 - tie_correction(&combined) / (nf * nf * nf - nf);
    if denom > 1e-15 {
        h /= denom;
    }

    let df = (k - 1) as f64;
    Some(TestResult {
        statistic: h,
        df,
        p_value: special::chi_squared_sf(h, df),
    })
}

/// Friedman test: H₀: all conditions have the same distribution.
///
/// `rows` holds one subject (block) per row and one condition per column.
///
/// # Algorithm
///
/// Rank within each row; with Rⱼ the rank sum of condition j:
///
/// Q = 12 / (n k (k+1)) · Σ Rⱼ² - 3n(k+1), divided by the tie correction
/// 1 - Σ t(t²-1) / (n k (k² - 1)). Q ~ χ²(k-1) under H₀.
///
/// # Returns
///
/// `None` if fewer than 2 rows or 2 conditions, ragged rows, or non-finite
/// values. When every row is completely tied Q is 0/0 and the statistic
/// and p-value are `NaN`.
///
/// # References
///
/// Friedman (1937). "The use of ranks to avoid the assumption of normality
/// implicit in the analysis of variance". JASA, 32(200), 675–701.
///
/// # Examples
///
/// ```
/// use u_stattest::testing::friedman_test;
///
/// let rows = vec![
///     vec![1.0, 2.0, 3.0],
///     vec![2.0, 3.0, 4.0],
///     vec![1.5, 2.5, 3.5],
///     vec![0.5, 1.0, 1.5],
/// ];
/// let r = friedman_test(&rows).unwrap();
/// assert!((r.statistic - 8.0).abs() < 1e-12);
/// assert_eq!(r.df, 2.0);
/// ```
pub fn friedman_test(rows: &[Vec<f64>]) -> Option<TestResult> {
    let n = rows.len();
    let k = rows.first().map_or(0, Vec::len);
    if n < 2 || k < 2 || rows.iter().any(|r| r.len() != k || !all_finite(r)) {
        return None;
    }

    let mut rank_sums = vec![0.0; k];
    let mut ties = 0.0;
    for row in rows {
        let (ranks, row_ties) = rank(row);
        for (sum, r) in rank_sums.iter_mut().zip(ranks) {
            *sum += r;
        }
        ties += row_ties;
    }

    let (nf, kf) = (n as f64, k as f64);
    let ss: f64 = rank_sums.iter().map(|r| r * r).sum();
    let q = 12.0 / (nf * kf * (kf + 1.0)) * ss - 3.0 * nf * (kf + 1.0);

    let df = kf - 1.0;
    let correction = 1.0 - ties / (nf * kf * (kf * kf - 1.0));
    if correction < 1e-15 {
        return Some(TestResult {
            statistic: f64::NAN,
            df,
            p_value: f64::NAN,
        });
    }
    let q = q / correction;

    Some(TestResult {
        statistic: q,
        df,
        p_value: special::chi_squared_sf(q, df),
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mann_whitney_p_bounded(
            a in proptest::collection::vec(-1e3_f64..1e3, 3..=20),
            b in proptest::collection::vec(-1e3_f64..1e3, 3..=20),
            continuity in any::<bool>(),
        ) {
            if let Some(r) = mann_whitney_u_test(&a, &b, continuity) {
                prop_assert!(r.p_value >= 0.0 && r.p_value <= 1.0, "p = {}", r.p_value);
                let max_u = (a.len() * b.len()) as f64;
                prop_assert!(r.statistic >= 0.0 && r.statistic <= max_u, "U = {}", r.statistic);
            }
        }

        #[test]
        fn wilcoxon_p_bounded(
            diffs in proptest::collection::vec(-1e3_f64..1e3, 3..=60),
        ) {
            let zeros = vec![0.0; diffs.len()];
            if let Some(r) = wilcoxon_signed_rank_test(&diffs, &zeros) {
                prop_assert!(r.p_value >= 0.0 && r.p_value <= 1.0, "p = {}", r.p_value);
            }
        }

        #[test]
        fn kruskal_p_bounded(
            g1 in proptest::collection::vec(-1e3_f64..1e3, 3..=15),
            g2 in proptest::collection::vec(-1e3_f64..1e3, 3..=15),
            g3 in proptest::collection::vec(-1e3_f64..1e3, 3..=15),
        ) {
            if let Some(r) = kruskal_wallis_test(&[&g1, &g2, &g3]) {
                prop_assert!(r.p_value >= 0.0 && r.p_value <= 1.0, "p = {}", r.p_value);
                prop_assert!(r.statistic >= -1e-9, "H = {}", r.statistic);
            }
        }
    }
}
