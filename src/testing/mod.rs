//! Hypothesis testing.
//!
//! The numerical procedures the test selector dispatches to: assumption
//! checks (normality, homoscedasticity, sphericity) and the parametric and
//! non-parametric comparison tests.
//!
//! Every routine returns `None` when its statistic is undefined for the
//! given input (too few observations, non-finite values, zero variance
//! where the statistic divides by it).
//!
//! # Assumption checks
//!
//! - [`shapiro_wilk_test`] — normality of one sample
//! - [`levene_test`] — equality of variances (median-centred)
//! - [`mauchly_test`] — sphericity of repeated measures
//!
//! # Two groups
//!
//! - [`paired_t_test`], [`pooled_t_test`], [`welch_t_test`]
//! - [`mann_whitney_u_test`], [`wilcoxon_signed_rank_test`]
//!
//! # Several groups
//!
//! - [`one_way_anova`], [`welch_anova`], [`repeated_measures_anova`]
//! - [`kruskal_wallis_test`], [`friedman_test`]
//!
//! # Examples
//!
//! ```
//! use u_stattest::testing::{pooled_t_test, TestResult};
//!
//! let a = [5.1, 4.9, 5.2, 5.0, 4.8];
//! let b = [7.1, 6.9, 7.2, 7.0, 6.8];
//! let r: TestResult = pooled_t_test(&a, &b).unwrap();
//! assert!(r.p_value < 0.01);
//! assert_eq!(r.df, 8.0);
//! ```

mod nonparametric;
mod normality;
mod parametric;
mod variance;

pub use nonparametric::{
    friedman_test, kruskal_wallis_test, mann_whitney_u_test, wilcoxon_signed_rank_test,
};
pub use normality::{shapiro_wilk_by_group, shapiro_wilk_test, ShapiroWilkResult};
pub use parametric::{
    one_way_anova, paired_t_test, pooled_t_test, repeated_measures_anova, welch_anova,
    welch_satterthwaite_df, welch_t_test, AnovaResult, RmAnovaResult, WelchAnovaResult,
};
pub use variance::{greenhouse_geisser_epsilon, levene_test, mauchly_test, MauchlyResult};

/// Result of a hypothesis test.
#[derive(Debug, Clone, Copy)]
pub struct TestResult {
    /// Test statistic (t, U, T, H, χ², or F depending on test).
    pub statistic: f64,
    /// Degrees of freedom; `NaN` for rank tests that have none.
    pub df: f64,
    /// Two-tailed p-value.
    pub p_value: f64,
}

const TIE_TOLERANCE: f64 = 1e-12;

// Average ranks (1-based) for pairs sorted by value. Ties share the mean of
// the ranks they span.
pub(crate) fn average_ranks(sorted: &[(f64, usize)]) -> Vec<f64> {
    let n = sorted.len();
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let j = tie_run_end(sorted, i);
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for rank in ranks.iter_mut().take(j).skip(i) {
            *rank = avg_rank;
        }
        i = j;
    }
    ranks
}

// Σ t(t² - 1) over tie groups of a sorted sequence.
pub(crate) fn tie_correction(sorted: &[(f64, usize)]) -> f64 {
    let mut correction = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let j = tie_run_end(sorted, i);
        let t = (j - i) as f64;
        correction += t * (t * t - 1.0);
        i = j;
    }
    correction
}

fn tie_run_end(sorted: &[(f64, usize)], start: usize) -> usize {
    let mut j = start + 1;
    while j < sorted.len() && (sorted[j].0 - sorted[start].0).abs() < TIE_TOLERANCE {
        j += 1;
    }
    j
}

// Sort values paired with their original index.
pub(crate) fn sorted_with_index(values: &[f64]) -> Vec<(f64, usize)> {
    let mut pairs: Vec<(f64, usize)> = values.iter().copied().zip(0..).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs
}

// Average ranks of `values` in their original order, plus the tie term.
pub(crate) fn rank(values: &[f64]) -> (Vec<f64>, f64) {
    let sorted = sorted_with_index(values);
    let sorted_ranks = average_ranks(&sorted);
    let mut ranks = vec![0.0; values.len()];
    for (&(_, idx), &r) in sorted.iter().zip(sorted_ranks.iter()) {
        ranks[idx] = r;
    }
    (ranks, tie_correction(&sorted))
}
