//! Record validation against a table definition.

use crate::context::ValidationOptions;
use cairn_core::schema::Table;
use cairn_core::{Error, Record, Result};

/// Checks a record before it is written to `table`.
///
/// The id must be a string or integer. With `strict_columns`, every field
/// must be a declared column; tables that declare no columns accept any
/// fields. With `validate_types`, declared columns must be present and
/// non-null unless nullable, and present values must fit the column type.
pub fn validate_record(table: &Table, record: &Record, options: ValidationOptions) -> Result<()> {
    if record.id().is_none() {
        return Err(Error::invalid_record_id(table.name()));
    }

    if options.strict_columns && !table.columns().is_empty() {
        if let Some((field, _)) = record.iter().find(|(name, _)| table.get_column(name).is_none()) {
            return Err(Error::unknown_column(table.name(), field.as_str()));
        }
    }

    if options.validate_types {
        for column in table.columns() {
            match record.get(column.name()) {
                None | Some(cairn_core::Value::Null) => {
                    if !column.is_nullable() {
                        return Err(Error::null_constraint(table.name(), column.name()));
                    }
                }
                Some(value) => {
                    if !column.column_type().accepts(value) {
                        return Err(Error::type_mismatch(
                            table.name(),
                            column.name(),
                            column.column_type(),
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}
