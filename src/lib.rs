//! # u-stattest
//!
//! Automatic selection and execution of group-comparison hypothesis tests.
//!
//! Given two or more named groups of observations and a pairing hint, the
//! selector checks the assumptions of the parametric tests, picks the
//! appropriate test, runs it, and follows a significant multi-group result
//! with a post-hoc procedure. The result is one [`Summary`] holding
//! descriptive statistics, the test outcome and the pairwise p-values.
//!
//! ## Modules
//!
//! - [`selector`] — Decision tree from assumption checks to test and post-hoc
//! - [`groups`] — Named groups, pairing mode, tabular input
//! - [`summary`] — Summary record and its flat column view
//! - [`descriptive`] — Mean, SD, SEM, median, quartiles
//! - [`testing`] — Hypothesis tests (t-tests, ANOVA family, rank tests, assumption checks)
//! - [`posthoc`] — Pairwise comparisons (Tukey, Tamhane, Nemenyi, Dunn)
//! - [`special`] — Distribution tails and the studentized range distribution
//!
//! ## Example
//!
//! ```
//! use u_stattest::{select_and_run, GroupSet, Pairing};
//!
//! let set = GroupSet::from_pairs([
//!     ("placebo", vec![4.0, 5.0, 6.0, 7.0, 8.0]),
//!     ("drug", vec![9.0, 10.0, 11.0, 12.0, 13.0]),
//! ])
//! .unwrap();
//! let summary = select_and_run(&set, Pairing::from_hint("unpaired")).unwrap();
//! assert_eq!(summary.test.to_string(), "t-test (equal variances, unpaired)");
//! assert!(summary.p_value < 0.01);
//! ```
//!
//! ## Design Philosophy
//!
//! - **Pure**: no I/O; the only side effect is `tracing` events
//! - **Stable shape**: the record layout depends only on the number of groups
//! - **Research-backed**: all algorithms reference academic literature

pub mod config;
pub mod descriptive;
pub mod error;
pub mod groups;
pub mod posthoc;
pub mod selector;
pub mod special;
pub mod summary;
pub mod testing;

pub use config::SelectorConfig;
pub use error::SelectError;
pub use groups::{Group, GroupSet, Pairing, Table};
pub use posthoc::PostHocKind;
pub use selector::{select_and_run, select_and_run_with};
pub use summary::{DegreesOfFreedom, FlatRecord, PostHoc, Summary, TestKind};
