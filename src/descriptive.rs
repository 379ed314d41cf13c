//! Descriptive statistics for a single group.
//!
//! Missing observations (`NaN`) are skipped. An empty group yields `NaN`
//! for every statistic and a count of zero.
//!
//! # Examples
//!
//! ```
//! use u_stattest::descriptive::Descriptives;
//!
//! let d = Descriptives::compute("control", &[1.0, 2.0, 3.0, 4.0]);
//! assert_eq!(d.n, 4);
//! assert!((d.mean - 2.5).abs() < 1e-12);
//! assert!((d.q1 - 1.75).abs() < 1e-12);
//! ```

use serde::Serialize;

/// Arithmetic mean. `None` for empty input.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
///
/// `None` if `data.len() <= ddof`.
pub fn variance(data: &[f64], ddof: usize) -> Option<f64> {
    let n = data.len();
    if n <= ddof {
        return None;
    }
    let m = mean(data)?;
    let ss: f64 = data.iter().map(|&x| (x - m).powi(2)).sum();
    Some(ss / (n - ddof) as f64)
}

/// Standard deviation with `ddof` delta degrees of freedom.
pub fn std_dev(data: &[f64], ddof: usize) -> Option<f64> {
    variance(data, ddof).map(f64::sqrt)
}

/// Median. `None` for empty input.
pub fn median(data: &[f64]) -> Option<f64> {
    quantile(data, 0.5)
}

/// Quantile with linear interpolation between order statistics.
///
/// The position of quantile `q` in the sorted data is `q · (n - 1)`; values
/// between two order statistics are interpolated linearly.
///
/// # Returns
///
/// `None` if the data is empty or `q` lies outside [0, 1].
pub fn quantile(data: &[f64], q: f64) -> Option<f64> {
    if data.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, q))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Descriptive summary of one group.
///
/// The standard deviation is population style (ddof = 0) and the standard
/// error of the mean is `sd / √n`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptives {
    /// Group name.
    pub name: String,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub sd: f64,
    /// Standard error of the mean.
    pub sem: f64,
    /// Median.
    pub median: f64,
    /// First quartile (25th percentile).
    pub q1: f64,
    /// Third quartile (75th percentile).
    pub q3: f64,
    /// Number of non-missing observations.
    pub n: usize,
}

impl Descriptives {
    /// Summarizes the non-missing values of `values`.
    pub fn compute(name: &str, values: &[f64]) -> Self {
        let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        present.sort_by(f64::total_cmp);

        let n = present.len();
        if n == 0 {
            return Self {
                name: name.to_string(),
                mean: f64::NAN,
                sd: f64::NAN,
                sem: f64::NAN,
                median: f64::NAN,
                q1: f64::NAN,
                q3: f64::NAN,
                n,
            };
        }

        let mean = mean(&present).unwrap_or(f64::NAN);
        let sd = std_dev(&present, 0).unwrap_or(f64::NAN);

        Self {
            name: name.to_string(),
            mean,
            sd,
            sem: sd / (n as f64).sqrt(),
            median: quantile_sorted(&present, 0.5),
            q1: quantile_sorted(&present, 0.25),
            q3: quantile_sorted(&present, 0.75),
            n,
        }
    }
}
