//! Store configuration.

use cairn_query::ValidationOptions;

/// Settings for a [`Database`](crate::Database).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Store label, attached to log events.
    pub name: String,
    /// Reject record fields that are not declared columns.
    pub strict_columns: bool,
    /// Check record values against column types and nullability.
    pub validate_types: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: String::from("cairn"),
            strict_columns: true,
            validate_types: true,
        }
    }
}

impl Config {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets whether unknown fields are rejected.
    pub fn strict_columns(mut self, strict: bool) -> Self {
        self.strict_columns = strict;
        self
    }

    /// Sets whether values are type checked.
    pub fn validate_types(mut self, validate: bool) -> Self {
        self.validate_types = validate;
        self
    }

    /// The validation switches handed to the executors.
    pub fn validation(&self) -> ValidationOptions {
        ValidationOptions {
            strict_columns: self.strict_columns,
            validate_types: self.validate_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.name, "cairn");
        assert_eq!(config.validation(), ValidationOptions::default());
    }

    #[test]
    fn test_builder() {
        let config = Config::new("studio").strict_columns(false);
        assert_eq!(config.name, "studio");
        assert!(!config.validation().strict_columns);
        assert!(config.validation().validate_types);
    }
}
