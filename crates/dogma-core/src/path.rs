//! Dotted paths into configuration trees
//!
//! Nested keys in revelation and type-drift reports are named by a
//! [`DottedPath`] built one segment at a time while the reports bubble up
//! through fixed mappings. Finished configurations are looked up by the
//! same type.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Key segments from the outermost mapping inward, shown as `model.layers`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DottedPath(Vec<String>);

impl DottedPath {
    /// Path naming a key of the outermost mapping
    #[must_use]
    pub fn single(key: impl Into<String>) -> Self {
        Self(vec![key.into()])
    }

    /// This path seen from one mapping further out, under `key`
    #[must_use]
    pub fn prefixed(mut self, key: impl Into<String>) -> Self {
        self.0.insert(0, key.into());
        self
    }

    /// Segments from the outermost key inward
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for DottedPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for DottedPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

/// Errors parsing a dotted path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// `a..b`, a leading or trailing dot, or the empty string
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),
}
