//! Execution context for query execution.

use cairn_core::schema::{Catalog, Table};
use cairn_core::Result;
use cairn_storage::Store;

/// Record validation switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Reject fields that are not declared columns.
    pub strict_columns: bool,
    /// Check values against column types and nullability.
    pub validate_types: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict_columns: true,
            validate_types: true,
        }
    }
}

/// Everything an executor reads from: the schema, the table state and the
/// validation switches.
#[derive(Clone, Copy, Debug)]
pub struct ExecutionContext<'a> {
    catalog: &'a Catalog,
    store: &'a Store,
    options: ValidationOptions,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with default validation.
    pub fn new(catalog: &'a Catalog, store: &'a Store) -> Self {
        Self {
            catalog,
            store,
            options: ValidationOptions::default(),
        }
    }

    /// Replaces the validation switches.
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    #[inline]
    pub fn store(&self) -> &'a Store {
        self.store
    }

    #[inline]
    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    /// Looks up a table definition.
    #[inline]
    pub fn table(&self, name: &str) -> Result<&'a Table> {
        self.catalog.table(name)
    }
}
