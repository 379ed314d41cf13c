//! Input data model: named groups of observations and the pairing mode.
//!
//! A [`GroupSet`] keeps groups in insertion order, which drives the order of
//! every output column. `NaN` marks a missing observation.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SelectError;

/// Whether observations at the same position across groups belong together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pairing {
    /// Repeated measures on the same subjects; row i of every group is subject i.
    Paired,
    /// Independent samples.
    #[default]
    Unpaired,
}

impl Pairing {
    /// Interprets a free-form hint. Only `"paired"` (any case, surrounding
    /// whitespace ignored) selects [`Pairing::Paired`].
    ///
    /// ```
    /// use u_stattest::Pairing;
    ///
    /// assert_eq!(Pairing::from_hint(" Paired "), Pairing::Paired);
    /// assert_eq!(Pairing::from_hint("unpaired"), Pairing::Unpaired);
    /// assert_eq!(Pairing::from_hint("dependent"), Pairing::Unpaired);
    /// ```
    pub fn from_hint(hint: &str) -> Self {
        if hint.trim().eq_ignore_ascii_case("paired") {
            Self::Paired
        } else {
            Self::Unpaired
        }
    }

    /// Whether this is [`Pairing::Paired`].
    pub fn is_paired(self) -> bool {
        self == Self::Paired
    }
}

impl FromStr for Pairing {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_hint(s))
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Paired => "paired",
            Self::Unpaired => "unpaired",
        })
    }
}

/// A named sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group name, unique within a [`GroupSet`].
    pub name: String,
    /// Observations; `NaN` marks a missing value.
    pub values: Vec<f64>,
}

impl Group {
    /// Creates a group.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Insertion-ordered collection of uniquely named groups.
///
/// ```
/// use u_stattest::GroupSet;
///
/// let set = GroupSet::from_pairs([
///     ("control", vec![4.1, 3.9, 4.4]),
///     ("treated", vec![5.0, f64::NAN, 5.3]),
/// ])
/// .unwrap();
/// assert_eq!(set.names(), vec!["control", "treated"]);
/// assert_eq!(set.long_form().len(), 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSet {
    groups: Vec<Group>,
}

impl GroupSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from `(name, values)` pairs.
    ///
    /// # Errors
    ///
    /// [`SelectError::DuplicateGroup`] if a name occurs twice.
    pub fn from_pairs<I, N>(pairs: I) -> Result<Self, SelectError>
    where
        I: IntoIterator<Item = (N, Vec<f64>)>,
        N: Into<String>,
    {
        let mut set = Self::new();
        for (name, values) in pairs {
            set.push(Group::new(name, values))?;
        }
        Ok(set)
    }

    /// Appends a group.
    ///
    /// # Errors
    ///
    /// [`SelectError::DuplicateGroup`] if the name is already present.
    pub fn push(&mut self, group: Group) -> Result<(), SelectError> {
        if self.groups.iter().any(|g| g.name == group.name) {
            return Err(SelectError::DuplicateGroup(group.name));
        }
        self.groups.push(group);
        Ok(())
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the set holds no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in insertion order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Iterates over groups in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    /// Group names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// Whether every group has the same raw length, missing values included.
    pub fn has_equal_lengths(&self) -> bool {
        self.groups
            .windows(2)
            .all(|w| w[0].values.len() == w[1].values.len())
    }

    /// `(group index, value)` for every non-missing observation.
    pub fn long_form(&self) -> Vec<(usize, f64)> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(i, g)| {
                g.values
                    .iter()
                    .copied()
                    .filter(|v| !v.is_nan())
                    .map(move |v| (i, v))
            })
            .collect()
    }

    /// Subject-by-condition rows for paired data.
    ///
    /// Row i holds the i-th observation of every group. A row with any
    /// missing cell is dropped.
    ///
    /// Returns `None` when the groups have different raw lengths.
    pub fn wide_form(&self) -> Option<Vec<Vec<f64>>> {
        if !self.has_equal_lengths() {
            return None;
        }
        let len = self.groups.first().map_or(0, |g| g.values.len());
        Some(
            (0..len)
                .map(|i| self.groups.iter().map(|g| g.values[i]).collect::<Vec<f64>>())
                .filter(|row| row.iter().all(|v| !v.is_nan()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a GroupSet {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Tabular input: one column per group, one row per observation index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column headers; each becomes a group name.
    pub columns: Vec<String>,
    /// Rows of cells; `NaN` marks an empty cell.
    pub rows: Vec<Vec<f64>>,
}

impl TryFrom<Table> for GroupSet {
    type Error = SelectError;

    fn try_from(table: Table) -> Result<Self, Self::Error> {
        let width = table.columns.len();
        if let Some((row, cells)) = table
            .rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != width)
        {
            return Err(SelectError::RaggedTable {
                row,
                expected: width,
                found: cells.len(),
            });
        }

        let mut set = Self::new();
        for (j, name) in table.columns.into_iter().enumerate() {
            let values = table.rows.iter().map(|r| r[j]).collect();
            set.push(Group::new(name, values))?;
        }
        Ok(set)
    }
}
