//! Post-hoc multiple-comparison procedures.
//!
//! Each procedure compares every pair of groups after a significant
//! omnibus test and returns a symmetric [`PairwiseMatrix`] of p-values
//! indexed by group position.
//!
//! | Procedure | Follows | Function |
//! |---|---|---|
//! | Tukey HSD / Tukey-Kramer | one-way or repeated-measures ANOVA | [`tukey_hsd`] |
//! | Tamhane's T2 | Welch's ANOVA | [`tamhane_t2`] |
//! | Nemenyi | Friedman test | [`nemenyi_friedman`] |
//! | Dunn | Kruskal-Wallis test | [`dunn`] |
//!
//! # References
//!
//! - Tukey (1949). "Comparing individual means in the analysis of variance".
//!   Biometrics, 5(2), 99–114.
//! - Kramer (1956). "Extension of multiple range tests to group means with
//!   unequal numbers of replications". Biometrics, 12(3), 307–310.
//! - Tamhane (1979). "A comparison of procedures for multiple comparisons of
//!   means with unequal variances". JASA, 74(366), 471–480.
//! - Nemenyi (1963). "Distribution-free multiple comparisons". PhD thesis,
//!   Princeton University.
//! - Dunn (1964). "Multiple comparisons using rank sums". Technometrics,
//!   6(3), 241–252.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::descriptive::{mean, variance};
use crate::special;
use crate::testing::{one_way_anova, rank, welch_satterthwaite_df};

/// Post-hoc procedure chosen by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostHocKind {
    /// No post-hoc comparison was run.
    None,
    /// Tukey's honestly significant difference, equal group sizes.
    TukeyHsd,
    /// Tukey-Kramer, the unequal-size form of Tukey's procedure.
    TukeyKramer,
    /// Tamhane's T2 for unequal variances.
    TamhaneT2,
    /// Nemenyi test on Friedman mean ranks.
    Nemenyi,
    /// Dunn's test on Kruskal-Wallis mean ranks.
    Dunn,
}

impl PostHocKind {
    /// Display name used in summary records.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TukeyHsd => "Tukey HSD test",
            Self::TukeyKramer => "Tukey-Kramer test",
            Self::TamhaneT2 => "Tamhane's T2 test",
            Self::Nemenyi => "Nemenyi test",
            Self::Dunn => "Dunn's test",
        }
    }
}

impl fmt::Display for PostHocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for PostHocKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Symmetric matrix of pairwise p-values with a unit diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseMatrix {
    k: usize,
    values: Vec<f64>,
}

impl PairwiseMatrix {
    /// Creates a k×k matrix with ones on the diagonal and `NaN` elsewhere.
    pub fn new(k: usize) -> Self {
        let mut values = vec![f64::NAN; k * k];
        for i in 0..k {
            values[i * k + i] = 1.0;
        }
        Self { k, values }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.k
    }

    /// Whether the matrix covers no groups.
    pub fn is_empty(&self) -> bool {
        self.k == 0
    }

    /// p-value comparing groups `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.k && j < self.k, "pair ({i}, {j}) out of bounds");
        self.values[i * self.k + j]
    }

    fn set(&mut self, i: usize, j: usize, p: f64) {
        self.values[i * self.k + j] = p;
        self.values[j * self.k + i] = p;
    }

    /// Unordered pairs `(i, j, p)` with `i < j`, in row-major order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.k).flat_map(move |i| (i + 1..self.k).map(move |j| (i, j, self.get(i, j))))
    }

    fn fill(k: usize, mut compare: impl FnMut(usize, usize) -> f64) -> Self {
        let mut matrix = Self::new(k);
        for i in 0..k {
            for j in i + 1..k {
                let p = compare(i, j);
                matrix.set(i, j, if p.is_nan() { p } else { p.clamp(0.0, 1.0) });
            }
        }
        matrix
    }
}

// p-value for a scaled difference that may have a zero denominator.
fn ratio_or_degenerate(diff: f64, scale: f64, tail: impl FnOnce(f64) -> f64) -> f64 {
    if scale < 1e-300 {
        if diff.abs() < 1e-300 {
            1.0
        } else {
            0.0
        }
    } else {
        tail(diff.abs() / scale)
    }
}

/// Tukey's HSD (Tukey-Kramer for unequal group sizes).
///
/// # Algorithm
///
/// q = |x̄ᵢ - x̄ⱼ| / √(MSE/2 · (1/nᵢ + 1/nⱼ)), p = P(Q > q) for the
/// studentized range with k groups and N - k degrees of freedom. MSE is the
/// within-group mean square of the one-way ANOVA.
///
/// # Returns
///
/// `None` if the one-way ANOVA is undefined for `groups`.
///
/// # Examples
///
/// ```
/// use u_stattest::posthoc::tukey_hsd;
///
/// let g1 = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let g2 = [1.5, 2.5, 3.5, 4.5, 5.5];
/// let g3 = [11.0, 12.0, 13.0, 14.0, 15.0];
/// let m = tukey_hsd(&[&g1, &g2, &g3]).unwrap();
/// assert!(m.get(0, 1) > 0.5);
/// assert!(m.get(0, 2) < 0.001);
/// ```
pub fn tukey_hsd(groups: &[&[f64]]) -> Option<PairwiseMatrix> {
    let anova = one_way_anova(groups)?;
    let k = groups.len();
    let df = anova.df_within as f64;
    let mse = anova.ms_within;

    Some(PairwiseMatrix::fill(k, |i, j| {
        let (ni, nj) = (groups[i].len() as f64, groups[j].len() as f64);
        let se = (mse / 2.0 * (1.0 / ni + 1.0 / nj)).sqrt();
        let diff = anova.group_means[i] - anova.group_means[j];
        ratio_or_degenerate(diff, se, |q| special::studentized_range_sf(q, k, df))
    }))
}

/// Tamhane's T2 procedure for unequal variances.
///
/// # Algorithm
///
/// Welch t statistic and Welch-Satterthwaite df per pair,
/// p = 2·P(T > |t|), then Šidák adjustment 1 - (1 - p)^m with
/// m = k(k-1)/2 comparisons.
///
/// # Returns
///
/// `None` if fewer than 2 groups, any group has fewer than 2 observations,
/// or non-finite values.
pub fn tamhane_t2(groups: &[&[f64]]) -> Option<PairwiseMatrix> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.len() < 2 || g.iter().any(|v| !v.is_finite())) {
        return None;
    }

    let means: Vec<f64> = groups.iter().filter_map(|g| mean(g)).collect();
    let vars: Vec<f64> = groups.iter().filter_map(|g| variance(g, 1)).collect();
    let m = (k * (k - 1) / 2) as i32;

    Some(PairwiseMatrix::fill(k, |i, j| {
        let (ni, nj) = (groups[i].len(), groups[j].len());
        let se = (vars[i] / ni as f64 + vars[j] / nj as f64).sqrt();
        let df = welch_satterthwaite_df(vars[i], ni, vars[j], nj);
        let p = ratio_or_degenerate(means[i] - means[j], se, |t| 2.0 * special::t_sf(t, df));
        1.0 - (1.0 - p.min(1.0)).powi(m)
    }))
}

/// Nemenyi test following a Friedman test.
///
/// `rows` holds one subject per row and one condition per column.
///
/// # Algorithm
///
/// Rank within rows; with R̄ⱼ the mean rank of condition j,
/// q = |R̄ᵢ - R̄ⱼ| / √(k(k+1) / (6n)), p = P(Q > q·√2) for the studentized
/// range with k groups and infinite degrees of freedom.
///
/// # Returns
///
/// `None` if fewer than 2 rows or 2 conditions, ragged rows, or non-finite
/// values.
///
/// # Examples
///
/// ```
/// use u_stattest::posthoc::nemenyi_friedman;
///
/// let rows: Vec<Vec<f64>> = (0..12)
///     .map(|i| vec![i as f64, 100.0 + i as f64, 50.0 + i as f64])
///     .collect();
/// let m = nemenyi_friedman(&rows).unwrap();
/// assert!(m.get(0, 1) < 0.001); // mean ranks 1 and 3
/// ```
pub fn nemenyi_friedman(rows: &[Vec<f64>]) -> Option<PairwiseMatrix> {
    let n = rows.len();
    let k = rows.first().map_or(0, Vec::len);
    if n < 2
        || k < 2
        || rows
            .iter()
            .any(|r| r.len() != k || r.iter().any(|v| !v.is_finite()))
    {
        return None;
    }

    let mut mean_ranks = vec![0.0; k];
    for row in rows {
        let (ranks, _) = rank(row);
        for (m, r) in mean_ranks.iter_mut().zip(ranks) {
            *m += r / n as f64;
        }
    }

    let (nf, kf) = (n as f64, k as f64);
    let scale = (kf * (kf + 1.0) / (6.0 * nf)).sqrt();
    Some(PairwiseMatrix::fill(k, |i, j| {
        let q = (mean_ranks[i] - mean_ranks[j]).abs() / scale;
        special::studentized_range_sf(q * std::f64::consts::SQRT_2, k, f64::INFINITY)
    }))
}

/// Dunn's test following a Kruskal-Wallis test, without p-value adjustment.
///
/// # Algorithm
///
/// Rank the pooled observations; with R̄ᵢ the mean rank of group i and T the
/// tie sum Σ t(t²-1):
///
/// z = |R̄ᵢ - R̄ⱼ| / √((N(N+1)/12 - T/(12(N-1))) · (1/nᵢ + 1/nⱼ)),
/// p = 2·(1 - Φ(z)).
///
/// # Returns
///
/// `None` if fewer than 2 groups, an empty group, or non-finite values.
pub fn dunn(groups: &[&[f64]]) -> Option<PairwiseMatrix> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.is_empty() || g.iter().any(|v| !v.is_finite())) {
        return None;
    }

    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let (ranks, ties) = rank(&pooled);
    let nf = pooled.len() as f64;

    let mut mean_ranks = Vec::with_capacity(k);
    let mut offset = 0;
    for g in groups {
        let sum: f64 = ranks[offset..offset + g.len()].iter().sum();
        mean_ranks.push(sum / g.len() as f64);
        offset += g.len();
    }

    let spread = nf * (nf + 1.0) / 12.0 - ties / (12.0 * (nf - 1.0));
    Some(PairwiseMatrix::fill(k, |i, j| {
        let (ni, nj) = (groups[i].len() as f64, groups[j].len() as f64);
        let se = (spread * (1.0 / ni + 1.0 / nj)).max(0.0).sqrt();
        ratio_or_degenerate(mean_ranks[i] - mean_ranks[j], se, |z| {
            2.0 * special::standard_normal_sf(z)
        })
    }))
}
