//! Scope options
//!
//! Plain data with a builder, loadable from TOML or JSON documents. Missing
//! fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ScopeError;

/// Evaluation options for a [`ConfigScope`](crate::ConfigScope)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeOptions {
    /// Bindings whose name starts with this prefix stay out of the
    /// configuration; empty disables the filter
    pub private_prefix: String,
    /// Maximum depth of nested function calls inside a block
    pub max_call_depth: usize,
    /// Maximum container nesting accepted into the configuration
    pub max_nesting_depth: usize,
    /// Longest string or list that repetition and `range` may build
    pub max_sequence_len: usize,
}

impl ScopeOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With private prefix
    #[inline]
    #[must_use]
    pub fn with_private_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.private_prefix = prefix.into();
        self
    }

    /// With maximum call depth
    #[inline]
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// With maximum nesting depth
    #[inline]
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// With maximum sequence length
    #[inline]
    #[must_use]
    pub fn with_max_sequence_len(mut self, len: usize) -> Self {
        self.max_sequence_len = len;
        self
    }

    /// Parse from a TOML document
    ///
    /// # Errors
    /// Returns [`ScopeError::InvalidOptions`] if the document is malformed.
    pub fn from_toml_str(text: &str) -> Result<Self, ScopeError> {
        toml::from_str(text).map_err(|e| ScopeError::InvalidOptions(e.to_string()))
    }

    /// Parse from a JSON document
    ///
    /// # Errors
    /// Returns [`ScopeError::InvalidOptions`] if the document is malformed.
    pub fn from_json_str(text: &str) -> Result<Self, ScopeError> {
        serde_json::from_str(text).map_err(|e| ScopeError::InvalidOptions(e.to_string()))
    }

    /// Whether a binding name is private
    #[inline]
    #[must_use]
    pub fn is_private(&self, name: &str) -> bool {
        !self.private_prefix.is_empty() && name.starts_with(&self.private_prefix)
    }
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self {
            private_prefix: "_".to_string(),
            max_call_depth: 64,
            max_nesting_depth: dogma_core::DEFAULT_MAX_DEPTH,
            max_sequence_len: 1 << 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ScopeOptions::new();
        assert_eq!(options.private_prefix, "_");
        assert_eq!(options.max_call_depth, 64);
        assert_eq!(options.max_nesting_depth, 256);
        assert_eq!(options.max_sequence_len, 16_777_216);
        assert!(options.is_private("_seed"));
        assert!(!options.is_private("seed"));
    }

    #[test]
    fn builder() {
        let options = ScopeOptions::new()
            .with_private_prefix("tmp_")
            .with_max_call_depth(8);
        assert!(options.is_private("tmp_x"));
        assert!(!options.is_private("_x"));
        assert_eq!(options.max_call_depth, 8);
    }

    #[test]
    fn empty_prefix_keeps_everything() {
        assert!(!ScopeOptions::new().with_private_prefix("").is_private("_x"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let options = ScopeOptions::from_toml_str("max_call_depth = 16\n").unwrap();
        assert_eq!(options.max_call_depth, 16);
        assert_eq!(options.private_prefix, "_");
    }

    #[test]
    fn json_round_trip() {
        let options = ScopeOptions::new().with_max_nesting_depth(12);
        let text = serde_json::to_string(&options).unwrap();
        assert_eq!(ScopeOptions::from_json_str(&text).unwrap(), options);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            ScopeOptions::from_toml_str("max_call_depth = \"deep\""),
            Err(ScopeError::InvalidOptions(_))
        ));
        assert!(ScopeOptions::from_json_str("[").is_err());
    }
}
