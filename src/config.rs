//! Selector configuration.

use serde::Deserialize;

use crate::error::SelectError;

/// Thresholds used by the test selector.
///
/// Every field has a default, so a partial JSON document is accepted:
///
/// ```
/// use u_stattest::SelectorConfig;
///
/// let config = SelectorConfig::from_json(r#"{ "alpha": 0.01 }"#).unwrap();
/// assert_eq!(config.alpha, 0.01);
/// assert_eq!(config.min_group_size, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectorConfig {
    /// Significance level for assumption checks and the omnibus test.
    pub alpha: f64,
    /// Groups smaller than this skip the decision tree.
    pub min_group_size: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            min_group_size: 3,
        }
    }
}

impl SelectorConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, SelectError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that `alpha` lies in (0, 1) and `min_group_size` is at least 3.
    ///
    /// Shapiro-Wilk needs three observations, so smaller minimums are rejected.
    pub fn validate(&self) -> Result<(), SelectError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SelectError::InvalidConfig(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.min_group_size < 3 {
            return Err(SelectError::InvalidConfig(format!(
                "min_group_size must be at least 3, got {}",
                self.min_group_size
            )));
        }
        Ok(())
    }
}
