//! Table declarations.

use crate::reconcile::column::ColumnSpec;
use crate::reconcile::constraint::ConstraintSpec;
use crate::reconcile::error::ReconcileError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// PostgreSQL truncates longer identifiers, which would silently break derived names.
const MAX_IDENTIFIER_LEN: usize = 63;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_$]*$").expect("identifier pattern compiles"));

/// Desired shape of one table
///
/// Columns and constraints are applied in the order they were added. The table holds no
/// connection: the transaction is handed to [`Reconciler::reconcile`](crate::Reconciler::reconcile)
/// separately, and the declaration carries no state from one pass to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    /// Created with `CREATE SCHEMA IF NOT EXISTS` at the start of every pass.
    pub schema: String,
    /// Scopes catalog lookups. Empty means the database the connection is on.
    pub database: String,
    pub columns: Vec<ColumnSpec>,
    pub constraints: Vec<ConstraintSpec>,
    /// Commit the transaction once the pass succeeds.
    pub autocommit: bool,
}

impl TableSpec {
    pub fn new(
        name: impl Into<String>,
        schema: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            database: database.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
            autocommit: false,
        }
    }

    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    /// Append a column; it is normalized on the way in.
    pub fn append(&mut self, column: ColumnSpec) -> &mut Self {
        self.columns.push(column.normalize());
        self
    }

    pub fn add_constraint(&mut self, constraint: ConstraintSpec) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check every name that ends up spliced into generated SQL
    ///
    /// Datatypes, defaults and constraint definitions are SQL fragments and are not checked.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::Validation`] naming the offending table or column.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        let table = self.name.as_str();
        check_identifier(table, None, "table name", table)?;
        check_identifier(table, None, "schema name", &self.schema)?;

        let mut seen = HashSet::new();
        for column in &self.columns {
            let name = column.name.as_str();
            check_identifier(table, Some(name), "column name", name)?;
            if !seen.insert(name) {
                return Err(ReconcileError::invalid(table, Some(name), "column declared twice"));
            }
            if column.datatype.trim().is_empty() {
                return Err(ReconcileError::invalid(table, Some(name), "datatype is empty"));
            }
            if let Some(method) = column.index_type.as_deref() {
                check_identifier(table, Some(name), "index method", method)?;
            }
        }

        for constraint in &self.constraints {
            check_identifier(table, None, "constraint name", &constraint.name)?;
            if constraint.value.trim().is_empty() {
                return Err(ReconcileError::invalid(
                    table,
                    None,
                    format!("constraint {} has an empty definition", constraint.name),
                ));
            }
        }
        Ok(())
    }
}

fn check_identifier(
    table: &str,
    column: Option<&str>,
    what: &str,
    value: &str,
) -> Result<(), ReconcileError> {
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(ReconcileError::invalid(
            table,
            column,
            format!("{} '{}' is longer than {} bytes", what, value, MAX_IDENTIFIER_LEN),
        ));
    }
    // unquoted names fold to lower case, so catalog lookups only find lower-case ones
    if value.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(ReconcileError::invalid(
            table,
            column,
            format!("{} '{}' must be lower case", what, value),
        ));
    }
    if !IDENTIFIER.is_match(value) {
        return Err(ReconcileError::invalid(
            table,
            column,
            format!("{} '{}' is not a plain identifier", what, value),
        ));
    }
    Ok(())
}
