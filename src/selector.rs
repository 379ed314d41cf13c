//! Automatic selection of a group-comparison test.
//!
//! The selector checks normality (Shapiro-Wilk per group), homogeneity of
//! variance (median-centred Levene) and, for repeated measures, sphericity
//! (Mauchly). It then walks a fixed decision tree to one test, runs it, and
//! for three or more groups follows a significant result with a post-hoc
//! procedure.
//!
//! # Two groups
//!
//! | Normal | Paired | Equal variances | Test |
//! |---|---|---|---|
//! | yes | yes | – | paired t-test |
//! | yes | no | yes | Student's t-test |
//! | yes | no | no | Welch's t-test |
//! | no | yes | – | Wilcoxon signed-rank |
//! | no | no | yes | Mann-Whitney U |
//! | no | no | no | Mann-Whitney U, continuity corrected |
//!
//! Paired data whose differences are all zero cannot be ranked by the
//! signed-rank test and goes to Mann-Whitney instead.
//!
//! # Three or more groups
//!
//! | Normal | Paired | Condition | Omnibus | Post-hoc |
//! |---|---|---|---|---|
//! | yes | yes | spherical | RM ANOVA | Tukey HSD |
//! | yes | yes | not spherical | RM ANOVA, GG corrected | Tukey HSD |
//! | yes | no | equal variances | one-way ANOVA | Tukey HSD / Tukey-Kramer |
//! | yes | no | unequal variances | Welch ANOVA | Tamhane's T2 |
//! | no | yes | – | Friedman | Nemenyi |
//! | no | no | – | Kruskal-Wallis | Dunn |
//!
//! An assumption check that cannot be evaluated counts as violated. A
//! constant group passes the normality check.

use tracing::{debug, warn};

use crate::config::SelectorConfig;
use crate::descriptive::Descriptives;
use crate::error::SelectError;
use crate::groups::{GroupSet, Pairing};
use crate::posthoc::{self, PairwiseMatrix, PostHocKind};
use crate::summary::{DegreesOfFreedom, PostHoc, Summary, TestKind};
use crate::testing::{self, TestResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Normality {
    Normal,
    NonNormal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variance {
    Equal,
    Unequal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sphericity {
    Holds,
    Violated,
}

/// Assumption-check p-values. `NaN` marks a check that could not run.
#[derive(Debug, Clone)]
struct Diagnostics {
    shapiro: Vec<f64>,
    levene: f64,
}

impl Diagnostics {
    fn run(samples: &[&[f64]]) -> Self {
        Self {
            shapiro: testing::shapiro_wilk_by_group(samples),
            levene: testing::levene_test(samples).map_or(f64::NAN, |r| r.p_value),
        }
    }

    fn normality(&self, alpha: f64) -> Normality {
        // NaN compares false, so an unevaluated group is non-normal
        if self.shapiro.iter().all(|&p| p > alpha) {
            Normality::Normal
        } else {
            Normality::NonNormal
        }
    }

    fn variance(&self, alpha: f64) -> Variance {
        if self.levene > alpha {
            Variance::Equal
        } else {
            Variance::Unequal
        }
    }
}

/// What the decision tree produced, before descriptives are attached.
struct Outcome {
    test: TestKind,
    statistic: f64,
    p_value: f64,
    df: DegreesOfFreedom,
    post_hoc: Option<PostHoc>,
}

impl Outcome {
    fn none(names: &[&str]) -> Self {
        let (df, post_hoc) = if names.len() == 2 {
            (DegreesOfFreedom::Single(f64::NAN), None)
        } else {
            (
                DegreesOfFreedom::Pair(f64::NAN, f64::NAN),
                Some(PostHoc::not_run(names)),
            )
        };
        Self {
            test: TestKind::None,
            statistic: f64::NAN,
            p_value: f64::NAN,
            df,
            post_hoc,
        }
    }

    fn two_groups(test: TestKind, r: TestResult) -> Self {
        Self {
            test,
            statistic: r.statistic,
            p_value: r.p_value,
            df: DegreesOfFreedom::Single(r.df),
            post_hoc: None,
        }
    }
}

/// Selects and runs the appropriate test with the default configuration.
///
/// # Errors
///
/// - [`SelectError::TooFewGroups`] for fewer than two groups.
/// - [`SelectError::TestFailed`] when the selected test or post-hoc
///   procedure is undefined for the data.
///
/// # Examples
///
/// ```
/// use u_stattest::{select_and_run, GroupSet, Pairing};
///
/// let set = GroupSet::from_pairs([
///     ("low", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
///     ("mid", vec![11.0, 12.0, 13.0, 14.0, 15.0, 16.0]),
///     ("high", vec![21.0, 22.0, 23.0, 24.0, 25.0, 26.0]),
/// ])
/// .unwrap();
///
/// let summary = select_and_run(&set, Pairing::Unpaired).unwrap();
/// assert_eq!(summary.test.to_string(), "one-way ANOVA");
/// let post_hoc = summary.post_hoc.unwrap();
/// assert_eq!(post_hoc.procedure.to_string(), "Tukey HSD test");
/// assert!(post_hoc.comparisons.iter().all(|c| c.p_value < 0.05));
/// ```
pub fn select_and_run(groups: &GroupSet, pairing: Pairing) -> Result<Summary, SelectError> {
    select_and_run_with(groups, pairing, &SelectorConfig::default())
}

/// Selects and runs the appropriate test with an explicit configuration.
///
/// # Errors
///
/// As [`select_and_run`].
pub fn select_and_run_with(
    groups: &GroupSet,
    pairing: Pairing,
    config: &SelectorConfig,
) -> Result<Summary, SelectError> {
    let pairing = normalize_pairing(groups, pairing);
    if groups.len() < 2 {
        return Err(SelectError::TooFewGroups {
            found: groups.len(),
        });
    }

    let names = groups.names();
    let descriptives: Vec<Descriptives> = groups
        .iter()
        .map(|g| Descriptives::compute(&g.name, &g.values))
        .collect();

    // Paired data is analysed on complete rows only
    let rows = match pairing {
        Pairing::Paired => groups.wide_form(),
        Pairing::Unpaired => None,
    };
    let samples: Vec<Vec<f64>> = match &rows {
        Some(rows) => (0..names.len())
            .map(|j| rows.iter().map(|r| r[j]).collect())
            .collect(),
        None => split_long_form(&groups.long_form(), names.len()),
    };

    let min_size = samples.iter().map(Vec::len).min().unwrap_or(0);
    let all_zero = samples.iter().flatten().all(|&v| v == 0.0);

    let outcome = if min_size < config.min_group_size || all_zero {
        debug!(min_size, all_zero, "skipping test selection");
        Outcome::none(&names)
    } else {
        let refs: Vec<&[f64]> = samples.iter().map(Vec::as_slice).collect();
        let diagnostics = Diagnostics::run(&refs);
        debug!(
            shapiro = ?diagnostics.shapiro,
            levene = diagnostics.levene,
            %pairing,
            "assumption checks"
        );
        let normality = diagnostics.normality(config.alpha);
        let variance = diagnostics.variance(config.alpha);

        let selected = match rows.as_deref() {
            Some(rows) if refs.len() == 2 => {
                two_paired(refs[0], refs[1], rows, normality, variance)
            }
            None if refs.len() == 2 => two_unpaired(refs[0], refs[1], normality, variance),
            Some(rows) => several_paired(&refs, rows, &names, normality, config.alpha),
            None => several_unpaired(&refs, &names, normality, variance, config.alpha),
        };
        selected?
    };

    debug!(test = %outcome.test, p_value = outcome.p_value, "test selected");

    Ok(Summary {
        descriptives,
        test: outcome.test,
        statistic: outcome.statistic,
        p_value: outcome.p_value,
        df: outcome.df,
        post_hoc: outcome.post_hoc,
    })
}

fn split_long_form(long: &[(usize, f64)], k: usize) -> Vec<Vec<f64>> {
    let mut samples = vec![Vec::new(); k];
    for &(i, v) in long {
        samples[i].push(v);
    }
    samples
}

fn normalize_pairing(groups: &GroupSet, pairing: Pairing) -> Pairing {
    if pairing.is_paired() && !groups.has_equal_lengths() {
        let lengths: Vec<usize> = groups.iter().map(|g| g.values.len()).collect();
        warn!(
            ?lengths,
            "paired comparison requires groups of equal length; treating groups as unpaired"
        );
        return Pairing::Unpaired;
    }
    pairing
}

fn run<T>(test: TestKind, result: Option<T>) -> Result<T, SelectError> {
    result.ok_or(SelectError::TestFailed { test: test.name() })
}

fn two_paired(
    a: &[f64],
    b: &[f64],
    rows: &[Vec<f64>],
    normality: Normality,
    variance: Variance,
) -> Result<Outcome, SelectError> {
    let all_differences_zero = rows.iter().all(|r| r[0] == r[1]);
    match normality {
        Normality::Normal => {
            let r = run(TestKind::PairedT, testing::paired_t_test(a, b))?;
            Ok(Outcome::two_groups(TestKind::PairedT, r))
        }
        Normality::NonNormal if !all_differences_zero => {
            let r = run(TestKind::Wilcoxon, testing::wilcoxon_signed_rank_test(a, b))?;
            Ok(Outcome::two_groups(TestKind::Wilcoxon, r))
        }
        Normality::NonNormal => {
            debug!("all paired differences are zero; using Mann-Whitney U");
            mann_whitney(a, b, variance)
        }
    }
}

fn two_unpaired(
    a: &[f64],
    b: &[f64],
    normality: Normality,
    variance: Variance,
) -> Result<Outcome, SelectError> {
    match (normality, variance) {
        (Normality::Normal, Variance::Equal) => {
            let r = run(TestKind::PooledT, testing::pooled_t_test(a, b))?;
            Ok(Outcome::two_groups(TestKind::PooledT, r))
        }
        (Normality::Normal, Variance::Unequal) => {
            let r = run(TestKind::WelchT, testing::welch_t_test(a, b))?;
            Ok(Outcome::two_groups(TestKind::WelchT, r))
        }
        (Normality::NonNormal, _) => mann_whitney(a, b, variance),
    }
}

fn mann_whitney(a: &[f64], b: &[f64], variance: Variance) -> Result<Outcome, SelectError> {
    let (test, continuity) = match variance {
        Variance::Equal => (TestKind::MannWhitneyEqualVariance, false),
        Variance::Unequal => (TestKind::MannWhitneyUnequalVariance, true),
    };
    let r = run(test, testing::mann_whitney_u_test(a, b, continuity))?;
    Ok(Outcome::two_groups(test, r))
}

fn several_paired(
    samples: &[&[f64]],
    rows: &[Vec<f64>],
    names: &[&str],
    normality: Normality,
    alpha: f64,
) -> Result<Outcome, SelectError> {
    match normality {
        Normality::Normal => {
            let mauchly = testing::mauchly_test(rows).map_or(f64::NAN, |r| r.p_value);
            let sphericity = if mauchly > alpha {
                Sphericity::Holds
            } else {
                Sphericity::Violated
            };
            debug!(mauchly, ?sphericity, "sphericity check");

            let (test, correction) = match sphericity {
                Sphericity::Holds => (TestKind::RepeatedMeasuresAnova, false),
                Sphericity::Violated => (TestKind::RepeatedMeasuresAnovaGg, true),
            };
            let r = run(test, testing::repeated_measures_anova(rows, correction))?;
            let post_hoc = post_hoc(r.p_value, alpha, names, PostHocKind::TukeyHsd, || {
                posthoc::tukey_hsd(samples)
            })?;
            Ok(Outcome {
                test,
                statistic: r.f_statistic,
                p_value: r.p_value,
                df: DegreesOfFreedom::Pair(r.df1, r.df2),
                post_hoc: Some(post_hoc),
            })
        }
        Normality::NonNormal => {
            let r = run(TestKind::Friedman, testing::friedman_test(rows))?;
            let post_hoc = post_hoc(r.p_value, alpha, names, PostHocKind::Nemenyi, || {
                posthoc::nemenyi_friedman(rows)
            })?;
            Ok(rank_outcome(TestKind::Friedman, r, post_hoc))
        }
    }
}

fn several_unpaired(
    samples: &[&[f64]],
    names: &[&str],
    normality: Normality,
    variance: Variance,
    alpha: f64,
) -> Result<Outcome, SelectError> {
    match (normality, variance) {
        (Normality::Normal, Variance::Equal) => {
            let test = TestKind::OneWayAnova;
            let r = run(test, testing::one_way_anova(samples))?;
            let equal_sizes = samples.windows(2).all(|w| w[0].len() == w[1].len());
            let kind = if equal_sizes {
                PostHocKind::TukeyHsd
            } else {
                PostHocKind::TukeyKramer
            };
            let post_hoc = post_hoc(r.p_value, alpha, names, kind, || {
                posthoc::tukey_hsd(samples)
            })?;
            Ok(Outcome {
                test,
                statistic: r.f_statistic,
                p_value: r.p_value,
                df: DegreesOfFreedom::Pair(r.df_between as f64, r.df_within as f64),
                post_hoc: Some(post_hoc),
            })
        }
        (Normality::Normal, Variance::Unequal) => {
            let test = TestKind::WelchAnova;
            let r = run(test, testing::welch_anova(samples))?;
            let post_hoc = post_hoc(r.p_value, alpha, names, PostHocKind::TamhaneT2, || {
                posthoc::tamhane_t2(samples)
            })?;
            Ok(Outcome {
                test,
                statistic: r.f_statistic,
                p_value: r.p_value,
                df: DegreesOfFreedom::Pair(r.df1, r.df2),
                post_hoc: Some(post_hoc),
            })
        }
        (Normality::NonNormal, _) => {
            let r = run(TestKind::KruskalWallis, testing::kruskal_wallis_test(samples))?;
            let post_hoc = post_hoc(r.p_value, alpha, names, PostHocKind::Dunn, || {
                posthoc::dunn(samples)
            })?;
            Ok(rank_outcome(TestKind::KruskalWallis, r, post_hoc))
        }
    }
}

fn rank_outcome(test: TestKind, r: TestResult, post_hoc: PostHoc) -> Outcome {
    Outcome {
        test,
        statistic: r.statistic,
        p_value: r.p_value,
        df: DegreesOfFreedom::Pair(r.df, f64::NAN),
        post_hoc: Some(post_hoc),
    }
}

// Runs the post-hoc procedure only after a significant omnibus result.
fn post_hoc(
    omnibus_p: f64,
    alpha: f64,
    names: &[&str],
    kind: PostHocKind,
    procedure: impl FnOnce() -> Option<PairwiseMatrix>,
) -> Result<PostHoc, SelectError> {
    if omnibus_p <= alpha {
        let matrix = procedure().ok_or(SelectError::TestFailed { test: kind.name() })?;
        Ok(PostHoc::from_matrix(kind, names, &matrix))
    } else {
        Ok(PostHoc::not_run(names))
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    fn set(groups: &[(&str, Vec<f64>)]) -> GroupSet {
        GroupSet::from_pairs(groups.iter().cloned()).expect("unique names")
    }

    fn seq(start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    fn skewed() -> Vec<f64> {
        let mut v = vec![1.0; 9];
        v.push(2.0);
        v
    }

    fn procedure(summary: &Summary) -> PostHocKind {
        summary.post_hoc.as_ref().expect("post-hoc section").procedure
    }

    #[test]
    fn fewer_than_two_groups() {
        let one = set(&[("a", seq(1.0, 1.0, 5))]);
        assert!(matches!(
            select_and_run(&one, Pairing::Unpaired),
            Err(SelectError::TooFewGroups { found: 1 })
        ));
        assert!(matches!(
            select_and_run(&GroupSet::new(), Pairing::Paired),
            Err(SelectError::TooFewGroups { found: 0 })
        ));
    }

    #[test]
    fn pooled_t_for_normal_equal_variance() {
        let data = set(&[("a", seq(1.0, 1.0, 6)), ("b", seq(2.0, 1.0, 6))]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::PooledT);
        assert_eq!(s.df, DegreesOfFreedom::Single(10.0));
        assert!(s.post_hoc.is_none());
    }

    #[test]
    fn welch_t_for_unequal_variance() {
        let data = set(&[("a", seq(1.0, 1.0, 6)), ("b", seq(10.0, 10.0, 6))]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::WelchT);
        match s.df {
            DegreesOfFreedom::Single(df) => assert!((df - 5.1).abs() < 0.05, "df = {df}"),
            other => panic!("unexpected df {other:?}"),
        }
    }

    #[test]
    fn mann_whitney_corrected_for_skewed_unequal_variance() {
        let b = vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 200.0];
        let data = set(&[("a", skewed()), ("b", b)]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::MannWhitneyUnequalVariance);
        assert!(matches!(s.df, DegreesOfFreedom::Single(df) if df.is_nan()));
    }

    #[test]
    fn paired_t_for_normal_paired() {
        let after = vec![2.1, 3.0, 4.2, 5.1, 6.0, 7.2];
        let data = set(&[("before", seq(1.0, 1.0, 6)), ("after", after)]);
        let s = select_and_run(&data, Pairing::Paired).expect("runs");
        assert_eq!(s.test, TestKind::PairedT);
        assert_eq!(s.df, DegreesOfFreedom::Single(5.0));
        assert!(s.statistic < 0.0);
    }

    #[test]
    fn wilcoxon_for_skewed_paired() {
        let data = set(&[("a", skewed()), ("b", seq(2.0, 1.0, 10))]);
        let s = select_and_run(&data, Pairing::Paired).expect("runs");
        assert_eq!(s.test, TestKind::Wilcoxon);
        assert!(s.p_value < 0.01, "p = {}", s.p_value);
    }

    #[test]
    fn zero_differences_fall_back_to_mann_whitney() {
        let data = set(&[("a", skewed()), ("b", skewed())]);
        let s = select_and_run(&data, Pairing::Paired).expect("runs");
        assert_eq!(s.test, TestKind::MannWhitneyEqualVariance);
    }

    #[test]
    fn unequal_lengths_downgrade_pairing() {
        let data = set(&[("a", seq(1.0, 1.0, 5)), ("b", seq(1.0, 1.0, 7))]);
        let s = select_and_run(&data, Pairing::Paired).expect("runs");
        assert_eq!(s.test, TestKind::PooledT);
        assert_eq!(s.df, DegreesOfFreedom::Single(10.0));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn downgraded_pairing_is_logged() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let data = set(&[("a", seq(1.0, 1.0, 5)), ("b", seq(1.0, 1.0, 7))]);
        let s = tracing::subscriber::with_default(subscriber, || {
            select_and_run(&data, Pairing::Paired)
        })
        .expect("runs");
        assert_eq!(s.test, TestKind::PooledT);

        let log = String::from_utf8(captured.0.lock().expect("log buffer").clone())
            .expect("utf-8 log");
        assert!(log.contains("WARN"), "log: {log}");
        assert!(log.contains("treating groups as unpaired"), "log: {log}");
        assert!(log.contains("lengths=[5, 7]"), "log: {log}");
    }

    #[test]
    fn equal_lengths_are_not_logged() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let data = set(&[("a", seq(1.0, 1.0, 6)), ("b", seq(2.0, 1.0, 6))]);
        tracing::subscriber::with_default(subscriber, || select_and_run(&data, Pairing::Paired))
            .expect("runs");
        assert!(captured.0.lock().expect("log buffer").is_empty());
    }

    #[test]
    fn wilcoxon_single_nonzero_difference() {
        let mut b = skewed();
        b[0] = 3.0;
        let data = set(&[("a", skewed()), ("b", b)]);
        let s = select_and_run(&data, Pairing::Paired).expect("runs");
        assert_eq!(s.test, TestKind::Wilcoxon);
        assert_eq!(s.statistic, 0.0);
        assert!(s.p_value > 0.05 && s.p_value <= 1.0, "p = {}", s.p_value);
    }

    #[test]
    fn friedman_all_rows_tied() {
        let data = set(&[("a", skewed()), ("b", skewed()), ("c", skewed())]);
        let s = select_and_run(&data, Pairing::Paired).expect("runs");
        assert_eq!(s.test, TestKind::Friedman);
        assert!(s.statistic.is_nan() && s.p_value.is_nan());
        assert!(matches!(s.df, DegreesOfFreedom::Pair(df, nan) if df == 2.0 && nan.is_nan()));
        let post_hoc = s.post_hoc.as_ref().expect("post-hoc");
        assert_eq!(post_hoc.procedure, PostHocKind::None);
        assert!(post_hoc.comparisons.iter().all(|c| c.p_value.is_nan()));
    }

    #[test]
    fn constant_group_counts_as_normal() {
        let data = set(&[
            ("flat", vec![5.0; 6]),
            ("low", seq(1.0, 1.0, 6)),
            ("high", seq(11.0, 1.0, 6)),
        ]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::WelchAnova);
        assert!(s.p_value.is_nan());
        assert!(matches!(s.df, DegreesOfFreedom::Pair(df1, _) if df1 == 2.0));
        assert_eq!(procedure(&s), PostHocKind::None);
    }

    #[test]
    fn constant_group_against_spread_group() {
        let data = set(&[("flat", vec![5.0; 6]), ("spread", seq(1.0, 1.0, 6))]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::WelchT);
        // t = 1.5 / sqrt(3.5 / 6), all of the variance in one group
        assert!((s.statistic - 1.5 / (3.5_f64 / 6.0).sqrt()).abs() < 1e-9);
        assert!(matches!(s.df, DegreesOfFreedom::Single(df) if (df - 5.0).abs() < 1e-9));
        assert!(s.p_value > 0.05 && s.p_value < 0.2, "p = {}", s.p_value);

        let distinct = set(&[("a", vec![5.0; 6]), ("b", vec![7.0; 6])]);
        let s = select_and_run(&distinct, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::PooledT);
        assert_eq!(s.statistic, f64::NEG_INFINITY);
        assert_eq!(s.p_value, 0.0);
    }

    #[test]
    fn tukey_hsd_after_significant_anova() {
        let data = set(&[
            ("a", seq(1.0, 1.0, 6)),
            ("b", seq(11.0, 1.0, 6)),
            ("c", seq(21.0, 1.0, 6)),
        ]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::OneWayAnova);
        assert_eq!(s.df, DegreesOfFreedom::Pair(2.0, 15.0));
        assert_eq!(procedure(&s), PostHocKind::TukeyHsd);
        let post_hoc = s.post_hoc.as_ref().expect("post-hoc");
        assert_eq!(post_hoc.comparisons.len(), 3);
        assert!(post_hoc.comparisons.iter().all(|c| c.p_value < 0.05));
    }

    #[test]
    fn tukey_kramer_for_unequal_sizes() {
        let data = set(&[
            ("a", seq(1.0, 1.0, 6)),
            ("b", seq(11.0, 1.0, 5)),
            ("c", seq(21.0, 1.0, 6)),
        ]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::OneWayAnova);
        assert_eq!(procedure(&s), PostHocKind::TukeyKramer);
        let post_hoc = s.post_hoc.as_ref().expect("post-hoc");
        assert!(post_hoc.comparisons.iter().all(|c| !c.p_value.is_nan()));
    }

    #[test]
    fn no_post_hoc_without_significance() {
        let data = set(&[
            ("a", seq(1.0, 1.0, 6)),
            ("b", seq(1.5, 1.0, 6)),
            ("c", seq(1.2, 1.0, 6)),
        ]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::OneWayAnova);
        assert!(s.p_value > 0.05);
        let post_hoc = s.post_hoc.as_ref().expect("post-hoc");
        assert_eq!(post_hoc.procedure, PostHocKind::None);
        assert!(post_hoc.comparisons.iter().all(|c| c.p_value.is_nan()));
    }

    #[test]
    fn welch_anova_with_tamhane() {
        let data = set(&[
            ("a", seq(1.0, 1.0, 6)),
            ("b", seq(10.0, 10.0, 6)),
            ("c", seq(100.0, 1.0, 6)),
        ]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::WelchAnova);
        assert_eq!(procedure(&s), PostHocKind::TamhaneT2);
    }

    #[test]
    fn kruskal_wallis_with_dunn() {
        let data = set(&[
            ("a", skewed()),
            ("b", seq(3.0, 1.0, 10)),
            ("c", seq(20.0, 1.0, 10)),
        ]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::KruskalWallis);
        assert!(matches!(s.df, DegreesOfFreedom::Pair(df, nan) if df == 2.0 && nan.is_nan()));
        assert_eq!(procedure(&s), PostHocKind::Dunn);
    }

    #[test]
    fn friedman_with_nemenyi() {
        let data = set(&[
            ("a", skewed()),
            ("b", seq(3.0, 1.0, 10)),
            ("c", seq(20.0, 1.0, 10)),
        ]);
        let s = select_and_run(&data, Pairing::Paired).expect("runs");
        assert_eq!(s.test, TestKind::Friedman);
        // every row ranks a < b < c: Q = 12/(10·3·4)·(100 + 400 + 900) - 3·10·4 = 20
        assert!((s.statistic - 20.0).abs() < 1e-9, "Q = {}", s.statistic);
        assert_eq!(procedure(&s), PostHocKind::Nemenyi);
        let post_hoc = s.post_hoc.as_ref().expect("post-hoc");
        assert!(post_hoc.comparisons[1].p_value < 0.001);
    }

    #[test]
    fn repeated_measures_anova_with_tukey() {
        let data = set(&[
            ("t1", seq(1.0, 1.0, 8)),
            ("t2", vec![12.0, 11.0, 14.0, 13.0, 16.0, 15.0, 18.0, 17.0]),
            ("t3", vec![21.0, 23.0, 22.0, 25.0, 24.0, 27.0, 26.0, 28.0]),
        ]);
        let s = select_and_run(&data, Pairing::Paired).expect("runs");
        assert!(
            matches!(
                s.test,
                TestKind::RepeatedMeasuresAnova | TestKind::RepeatedMeasuresAnovaGg
            ),
            "test = {}",
            s.test
        );
        assert!(s.p_value < 0.001);
        assert!(matches!(s.df, DegreesOfFreedom::Pair(..)));
        assert_eq!(procedure(&s), PostHocKind::TukeyHsd);
    }

    #[test]
    fn small_groups_skip_selection() {
        let data = set(&[("a", vec![1.0, 2.0]), ("b", seq(1.0, 1.0, 5))]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::None);
        assert!(s.statistic.is_nan() && s.p_value.is_nan());
        assert_eq!(s.descriptives.len(), 2);
        assert_eq!(s.descriptives[0].n, 2);
    }

    #[test]
    fn missing_values_count_towards_gate() {
        let data = set(&[
            ("a", vec![1.0, f64::NAN, f64::NAN, 2.0]),
            ("b", vec![1.0, 2.0, 3.0, 4.0]),
            ("c", vec![5.0, 6.0, 7.0, 8.0]),
        ]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::None);
        let post_hoc = s.post_hoc.as_ref().expect("post-hoc");
        assert_eq!(post_hoc.procedure, PostHocKind::None);
        assert_eq!(post_hoc.comparisons.len(), 3);
        assert!(matches!(s.df, DegreesOfFreedom::Pair(a, b) if a.is_nan() && b.is_nan()));
    }

    #[test]
    fn paired_gate_uses_complete_rows() {
        // Three rows each, but only two are complete
        let data = set(&[
            ("a", vec![1.0, 2.0, 3.0]),
            ("b", vec![4.0, f64::NAN, 6.0]),
        ]);
        let s = select_and_run(&data, Pairing::Paired).expect("runs");
        assert_eq!(s.test, TestKind::None);
        assert_eq!(s.descriptives[1].n, 2);
    }

    #[test]
    fn all_zero_data_skips_selection() {
        let data = set(&[("a", vec![0.0; 5]), ("b", vec![0.0; 5])]);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::None);
        assert_eq!(s.descriptives[0].mean, 0.0);
    }

    #[test]
    fn min_group_size_is_configurable() {
        let data = set(&[("a", seq(1.0, 1.0, 4)), ("b", seq(2.0, 1.0, 4))]);
        let strict = SelectorConfig {
            min_group_size: 5,
            ..SelectorConfig::default()
        };
        let s = select_and_run_with(&data, Pairing::Unpaired, &strict).expect("runs");
        assert_eq!(s.test, TestKind::None);
        let s = select_and_run(&data, Pairing::Unpaired).expect("runs");
        assert_eq!(s.test, TestKind::PooledT);
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let data = set(&[
            ("a", skewed()),
            ("b", seq(3.0, 1.0, 10)),
            ("c", seq(20.0, 1.0, 10)),
        ]);
        let first = serde_json::to_string(&select_and_run(&data, Pairing::Paired).expect("runs").to_flat())
            .expect("serialize");
        let second = serde_json::to_string(&select_and_run(&data, Pairing::Paired).expect("runs").to_flat())
            .expect("serialize");
        assert_eq!(first, second);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn group_set() -> impl Strategy<Value = GroupSet> {
        proptest::collection::vec(proptest::collection::vec(-100.0_f64..100.0, 0..12), 2..=4)
            .prop_map(|groups| {
                GroupSet::from_pairs(
                    groups
                        .into_iter()
                        .enumerate()
                        .map(|(i, values)| (format!("g{i}"), values)),
                )
                .unwrap_or_default()
            })
    }

    proptest! {
        #[test]
        fn record_shape_depends_only_on_group_count(groups in group_set()) {
            let summary = select_and_run(&groups, Pairing::Unpaired);
            prop_assert!(summary.is_ok(), "{summary:?}");
            let summary = summary.expect("checked");
            let k = groups.len();
            let expected = 7 * k + 3 + if k == 2 { 1 } else { 3 + k * (k - 1) / 2 };
            prop_assert_eq!(summary.to_flat().len(), expected);
            prop_assert_eq!(summary.descriptives.len(), k);
            prop_assert!(summary.p_value.is_nan() || (0.0..=1.0).contains(&summary.p_value));
        }

        #[test]
        fn selection_is_deterministic(groups in group_set()) {
            let a = select_and_run(&groups, Pairing::Paired).ok().map(|s| s.to_flat());
            let b = select_and_run(&groups, Pairing::Paired).ok().map(|s| s.to_flat());
            let a = serde_json::to_string(&a).expect("serialize");
            let b = serde_json::to_string(&b).expect("serialize");
            prop_assert_eq!(a, b);
        }
    }
}
