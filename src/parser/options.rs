//! Parse configuration

use serde::{Deserialize, Serialize};

/// Options accepted by [`parse_with_options`](super::parse_with_options)
///
/// Loads from JSON with camelCase keys; missing keys take their defaults:
///
/// ```text
/// { "throwSyntaxErrors": false }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Return the first syntax error instead of recording it on the tree
    pub throw_syntax_errors: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            throw_syntax_errors: true,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict when `true` (the default), tolerant when `false`
    pub fn throw_syntax_errors(mut self, throw: bool) -> Self {
        self.throw_syntax_errors = throw;
        self
    }

    /// Shorthand for `ParseOptions::new().throw_syntax_errors(false)`
    pub fn tolerant() -> Self {
        Self::new().throw_syntax_errors(false)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_strict() {
        assert!(ParseOptions::default().throw_syntax_errors);
        assert!(!ParseOptions::tolerant().throw_syntax_errors);
    }

    #[test]
    fn test_from_json() {
        let opts = ParseOptions::from_json(r#"{ "throwSyntaxErrors": false }"#).unwrap();
        assert_eq!(opts, ParseOptions::tolerant());

        let opts = ParseOptions::from_json("{}").unwrap();
        assert_eq!(opts, ParseOptions::default());

        assert!(ParseOptions::from_json(r#"{ "throwSyntaxErrors": "yes" }"#).is_err());
    }
}
