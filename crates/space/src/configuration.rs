//! Configuration points and the visited set.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// One point in the design space: a select-index per dimension.
///
/// Identity is the exact parameter sequence, so two configurations are the
/// same point exactly when every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Vec<u32>);

impl Configuration {
    pub fn new(params: Vec<u32>) -> Self {
        Self(params)
    }

    /// All-zero configuration of the given length.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn param(&self, index: usize) -> Option<u32> {
        self.0.get(index).copied()
    }

    pub fn params(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first `count` fields (the independently chosen ones).
    pub fn independent(&self, count: usize) -> &[u32] {
        &self.0[..count.min(self.0.len())]
    }

    /// Build a configuration from independent fields followed by derived ones.
    pub fn from_parts(independent: &[u32], dependent: &[u32]) -> Self {
        let mut params = Vec::with_capacity(independent.len() + dependent.len());
        params.extend_from_slice(independent);
        params.extend_from_slice(dependent);
        Self(params)
    }
}

impl From<Vec<u32>> for Configuration {
    fn from(params: Vec<u32>) -> Self {
        Self(params)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

impl FromStr for Configuration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let params = s
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<u32>()
                    .with_context(|| format!("invalid configuration field '{}'", token))
            })
            .collect::<Result<Vec<_>>>()?;
        if params.is_empty() {
            bail!("configuration string is empty");
        }
        Ok(Self(params))
    }
}

/// Configurations that have already been proposed or evaluated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitedSet {
    seen: HashSet<Configuration>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, config: &Configuration) -> bool {
        self.seen.contains(config)
    }

    /// Returns `true` if the configuration was not seen before.
    pub fn insert(&mut self, config: Configuration) -> bool {
        self.seen.insert(config)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.seen.iter()
    }
}

impl FromIterator<Configuration> for VisitedSet {
    fn from_iter<I: IntoIterator<Item = Configuration>>(iter: I) -> Self {
        Self {
            seen: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let config: Configuration = "3 0  12 1".parse().unwrap();
        assert_eq!(config.params(), &[3, 0, 12, 1]);
        assert_eq!(config.to_string(), "3 0 12 1");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Configuration>().is_err());
        assert!("1 x 2".parse::<Configuration>().is_err());
        assert!("1 -2".parse::<Configuration>().is_err());
    }

    #[test]
    fn test_from_parts() {
        let config = Configuration::from_parts(&[1, 2], &[7]);
        assert_eq!(config.params(), &[1, 2, 7]);
        assert_eq!(config.independent(2), &[1, 2]);
        assert_eq!(config.independent(10), &[1, 2, 7]);
        assert_eq!(config.param(5), None);
    }

    #[test]
    fn test_visited_set_identity() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert(Configuration::new(vec![1, 0])));
        assert!(!visited.insert("1 0".parse().unwrap()));
        assert!(visited.contains(&Configuration::new(vec![1, 0])));
        assert!(!visited.contains(&Configuration::new(vec![0, 1])));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let config = Configuration::new(vec![4, 5]);
        assert_eq!(serde_json::to_string(&config).unwrap(), "[4,5]");
    }
}
