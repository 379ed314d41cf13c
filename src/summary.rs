//! The summary record produced by the test selector.
//!
//! [`Summary`] is the typed result. [`Summary::to_flat`] lays it out as an
//! ordered list of named columns, the shape consumed by tabular reports:
//! descriptive blocks first (every group's mean, then every group's SD, and
//! so on), then the test, and for three or more groups the post-hoc columns.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::descriptive::Descriptives;
use crate::posthoc::{PairwiseMatrix, PostHocKind};

/// Omnibus or two-sample test chosen by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    /// No test was run (too few observations or all-zero data).
    None,
    /// Paired t-test.
    PairedT,
    /// Student's t-test with pooled variance.
    PooledT,
    /// Welch's t-test.
    WelchT,
    /// Wilcoxon signed-rank test.
    Wilcoxon,
    /// Mann-Whitney U without continuity correction.
    MannWhitneyEqualVariance,
    /// Mann-Whitney U with continuity correction.
    MannWhitneyUnequalVariance,
    /// Repeated-measures ANOVA, sphericity holds.
    RepeatedMeasuresAnova,
    /// Repeated-measures ANOVA with Greenhouse-Geisser correction.
    RepeatedMeasuresAnovaGg,
    /// Classic one-way ANOVA.
    OneWayAnova,
    /// Welch's ANOVA.
    WelchAnova,
    /// Friedman test.
    Friedman,
    /// Kruskal-Wallis H test.
    KruskalWallis,
}

impl TestKind {
    /// Display name used in summary records.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PairedT => "t-test (paired)",
            Self::PooledT => "t-test (equal variances, unpaired)",
            Self::WelchT => "Welch t-test (unequal variances, unpaired)",
            Self::Wilcoxon => "Wilcoxon signed-rank test (paired)",
            Self::MannWhitneyEqualVariance => "Mann-Whitney U test (equal variances, unpaired)",
            Self::MannWhitneyUnequalVariance => {
                "Mann-Whitney U test (unequal variances, unpaired)"
            }
            Self::RepeatedMeasuresAnova => "repeated-measures ANOVA (no correction)",
            Self::RepeatedMeasuresAnovaGg => "repeated-measures ANOVA (GG corrected)",
            Self::OneWayAnova => "one-way ANOVA",
            Self::WelchAnova => "Welch ANOVA",
            Self::Friedman => "Friedman test",
            Self::KruskalWallis => "Kruskal-Wallis H test",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TestKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Degrees of freedom of the reported test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DegreesOfFreedom {
    /// Two-group comparisons.
    Single(f64),
    /// Multi-group comparisons: (numerator, denominator).
    Pair(f64, f64),
}

/// One post-hoc comparison between groups `a` and `b`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseComparison {
    /// First group name (earlier in insertion order).
    pub a: String,
    /// Second group name.
    pub b: String,
    /// p-value; `NaN` when no post-hoc procedure was run.
    pub p_value: f64,
}

impl PairwiseComparison {
    /// Column name `<a>_vs_<b>`.
    pub fn key(&self) -> String {
        format!("{}_vs_{}", self.a, self.b)
    }
}

/// Post-hoc section of a multi-group summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostHoc {
    /// Procedure that produced the p-values.
    pub procedure: PostHocKind,
    /// One entry per unordered pair, in row-major order.
    pub comparisons: Vec<PairwiseComparison>,
}

impl PostHoc {
    /// Placeholder for every pair when no procedure was run.
    pub fn not_run(names: &[&str]) -> Self {
        Self {
            procedure: PostHocKind::None,
            comparisons: pairs(names)
                .map(|(a, b)| PairwiseComparison {
                    a: a.to_string(),
                    b: b.to_string(),
                    p_value: f64::NAN,
                })
                .collect(),
        }
    }

    /// Labels the pairs of `matrix` with group names.
    pub fn from_matrix(procedure: PostHocKind, names: &[&str], matrix: &PairwiseMatrix) -> Self {
        Self {
            procedure,
            comparisons: matrix
                .pairs()
                .map(|(i, j, p_value)| PairwiseComparison {
                    a: names[i].to_string(),
                    b: names[j].to_string(),
                    p_value,
                })
                .collect(),
        }
    }
}

fn pairs<'a>(names: &'a [&'a str]) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    names
        .iter()
        .enumerate()
        .flat_map(move |(i, a)| names[i + 1..].iter().map(move |b| (*a, *b)))
}

/// Result of one test selection.
///
/// Undefined numbers are `NaN` and serialize to `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Descriptive statistics per group, in insertion order.
    pub descriptives: Vec<Descriptives>,
    /// The test that was run.
    pub test: TestKind,
    /// Test statistic.
    pub statistic: f64,
    /// p-value of the test.
    pub p_value: f64,
    /// Degrees of freedom.
    pub df: DegreesOfFreedom,
    /// Post-hoc comparisons; present exactly when there are three or more groups.
    pub post_hoc: Option<PostHoc>,
}

impl Summary {
    /// Flat, ordered column view of the summary.
    ///
    /// ```
    /// use u_stattest::{select_and_run, GroupSet, Pairing};
    ///
    /// let set = GroupSet::from_pairs([
    ///     ("a", vec![1.0, 2.0, 3.0, 4.0]),
    ///     ("b", vec![2.0, 3.0, 4.0, 5.0]),
    /// ])
    /// .unwrap();
    /// let flat = select_and_run(&set, Pairing::Unpaired).unwrap().to_flat();
    /// let columns: Vec<&str> = flat.columns().collect();
    /// assert_eq!(&columns[..2], &["a_mean", "b_mean"]);
    /// assert_eq!(&columns[14..], &["test", "statistic", "p-value", "df"]);
    /// ```
    pub fn to_flat(&self) -> FlatRecord {
        let mut fields = Vec::new();

        let blocks: [(&str, fn(&Descriptives) -> f64); 6] = [
            ("mean", |d| d.mean),
            ("SD", |d| d.sd),
            ("SEM", |d| d.sem),
            ("median", |d| d.median),
            ("Q1", |d| d.q1),
            ("Q3", |d| d.q3),
        ];
        for (suffix, value) in blocks {
            for d in &self.descriptives {
                fields.push((format!("{}_{suffix}", d.name), Field::Number(value(d))));
            }
        }
        for d in &self.descriptives {
            fields.push((format!("{}_N", d.name), Field::Count(d.n)));
        }

        fields.push(("test".to_string(), Field::Text(self.test.name().to_string())));
        fields.push(("statistic".to_string(), Field::Number(self.statistic)));
        fields.push(("p-value".to_string(), Field::Number(self.p_value)));

        match self.df {
            DegreesOfFreedom::Single(df) => fields.push(("df".to_string(), Field::Number(df))),
            DegreesOfFreedom::Pair(df1, df2) => {
                fields.push(("df_1".to_string(), Field::Number(df1)));
                fields.push(("df_2".to_string(), Field::Number(df2)));
            }
        }

        if let Some(post_hoc) = &self.post_hoc {
            fields.push((
                "post-hoc test".to_string(),
                Field::Text(post_hoc.procedure.name().to_string()),
            ));
            for c in &post_hoc.comparisons {
                fields.push((c.key(), Field::Number(c.p_value)));
            }
        }

        FlatRecord { fields }
    }
}

/// A single value in a [`FlatRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Real number; `NaN` means undefined.
    Number(f64),
    /// Observation count.
    Count(usize),
    /// Test or procedure name.
    Text(String),
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Number(_) => serializer.serialize_none(),
            Self::Count(n) => serializer.serialize_u64(*n as u64),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Ordered column-to-value view of a [`Summary`].
///
/// Serializes as a map whose keys keep the column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    fields: Vec<(String, Field)>,
}

impl FlatRecord {
    /// Value of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, field)| field)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FlatRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, field) in &self.fields {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(names: &[&str], post_hoc: Option<PostHoc>) -> Summary {
        Summary {
            descriptives: names
                .iter()
                .map(|n| Descriptives::compute(n, &[1.0, 2.0, 3.0]))
                .collect(),
            test: TestKind::OneWayAnova,
            statistic: 4.5,
            p_value: 0.03,
            df: if post_hoc.is_some() {
                DegreesOfFreedom::Pair(2.0, 6.0)
            } else {
                DegreesOfFreedom::Single(4.0)
            },
            post_hoc,
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(TestKind::PooledT.to_string(), "t-test (equal variances, unpaired)");
        assert_eq!(TestKind::KruskalWallis.to_string(), "Kruskal-Wallis H test");
        assert_eq!(
            TestKind::RepeatedMeasuresAnovaGg.to_string(),
            "repeated-measures ANOVA (GG corrected)"
        );
    }

    #[test]
    fn flat_layout_three_groups() {
        let names = ["x", "y", "z"];
        let flat = summary(&names, Some(PostHoc::not_run(&names))).to_flat();
        let columns: Vec<&str> = flat.columns().collect();
        assert_eq!(&columns[..3], &["x_mean", "y_mean", "z_mean"]);
        assert_eq!(&columns[3..6], &["x_SD", "y_SD", "z_SD"]);
        assert_eq!(&columns[18..21], &["x_N", "y_N", "z_N"]);
        assert_eq!(
            &columns[21..],
            &[
                "test",
                "statistic",
                "p-value",
                "df_1",
                "df_2",
                "post-hoc test",
                "x_vs_y",
                "x_vs_z",
                "y_vs_z"
            ]
        );
        assert_eq!(flat.get("post-hoc test"), Some(&Field::Text("none".to_string())));
        assert_eq!(flat.get("x_N"), Some(&Field::Count(3)));
    }

    #[test]
    fn flat_layout_two_groups() {
        let flat = summary(&["a", "b"], None).to_flat();
        assert_eq!(flat.len(), 14 + 4);
        assert!(flat.get("df").is_some());
        assert!(flat.get("post-hoc test").is_none());
    }

    #[test]
    fn json_keeps_order_and_nulls() {
        let names = ["a", "b", "c"];
        let flat = summary(&names, Some(PostHoc::not_run(&names))).to_flat();
        let json = serde_json::to_string(&flat).expect("serialize");
        assert!(json.starts_with(r#"{"a_mean":2.0,"b_mean":2.0"#), "{json}");
        assert!(json.ends_with(r#""a_vs_b":null,"a_vs_c":null,"b_vs_c":null}"#), "{json}");
    }

    #[test]
    fn from_matrix_labels_pairs() {
        let m = crate::posthoc::dunn(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]])
            .expect("dunn");
        let ph = PostHoc::from_matrix(PostHocKind::Dunn, &["p", "q", "r"], &m);
        let keys: Vec<String> = ph.comparisons.iter().map(PairwiseComparison::key).collect();
        assert_eq!(keys, vec!["p_vs_q", "p_vs_r", "q_vs_r"]);
        assert_eq!(ph.comparisons[1].p_value, m.get(0, 2));
    }

    #[test]
    fn summary_serializes_names() {
        let value = serde_json::to_value(summary(&["a", "b"], None)).expect("serialize");
        assert_eq!(value["test"], "one-way ANOVA");
        assert_eq!(value["df"], 4.0);
        assert!(value["post_hoc"].is_null());
    }
}
