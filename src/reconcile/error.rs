//! Reconciliation error types

use crate::executor::GuardError;
use crate::reconcile::step::Step;
use std::fmt;

/// Where in a pass a statement was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// `CREATE SCHEMA IF NOT EXISTS`
    EnsureSchema,
    /// `CREATE TABLE <name> ()` for a table that did not exist yet
    CreateTable,
    /// One generator step for one declared column
    Column { column: String, step: Step },
    DropConstraint { constraint: String },
    AddConstraint { constraint: String },
    DropTable,
}

impl Phase {
    pub(crate) fn column(column: &str, step: Step) -> Self {
        Phase::Column {
            column: column.to_string(),
            step,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::EnsureSchema => write!(f, "ensure schema"),
            Phase::CreateTable => write!(f, "create table"),
            Phase::Column { column, step } => write!(f, "column '{}' step {}", column, step),
            Phase::DropConstraint { constraint } => write!(f, "drop constraint '{}'", constraint),
            Phase::AddConstraint { constraint } => write!(f, "add constraint '{}'", constraint),
            Phase::DropTable => write!(f, "drop table"),
        }
    }
}

/// Rejection raised by the statement generator before anything reaches the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Serial types are sequence-bound defaults and can't be retrofitted by a type change.
    SerialTypeChange {
        table: String,
        column: String,
        datatype: String,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::SerialTypeChange {
                table,
                column,
                datatype,
            } => write!(
                f,
                "cannot modify a column's type to a serial-family type while altering an existing table \
                 (table: {}, column: {}, datatype: {})",
                table, column, datatype
            ),
        }
    }
}

impl std::error::Error for StepError {}

/// Outcome of a failed reconciliation pass
///
/// Any of these aborts the whole table: the transaction is rolled back and no further
/// statement is issued.
#[derive(Debug)]
pub enum ReconcileError {
    /// The declaration can't be applied as written. Nothing was sent to the database.
    Validation {
        table: String,
        column: Option<String>,
        reason: String,
    },
    /// PostgreSQL rejected a statement
    Execution {
        table: String,
        phase: Phase,
        statement: String,
        source: GuardError,
    },
    /// A catalog lookup failed, so the live state is unknown
    Introspection {
        table: String,
        column: Option<String>,
        source: GuardError,
    },
    /// Every statement succeeded but `COMMIT` did not
    Commit { table: String, source: GuardError },
}

impl ReconcileError {
    pub(crate) fn invalid(table: &str, column: Option<&str>, reason: impl Into<String>) -> Self {
        ReconcileError::Validation {
            table: table.to_string(),
            column: column.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Table whose pass failed
    pub fn table(&self) -> &str {
        match self {
            ReconcileError::Validation { table, .. }
            | ReconcileError::Execution { table, .. }
            | ReconcileError::Introspection { table, .. }
            | ReconcileError::Commit { table, .. } => table,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ReconcileError::Validation { .. })
    }

    /// Statement that failed, for execution errors
    pub fn statement(&self) -> Option<&str> {
        match self {
            ReconcileError::Execution { statement, .. } => Some(statement),
            _ => None,
        }
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Validation {
                table,
                column: Some(column),
                reason,
            } => write!(f, "Invalid declaration for {}.{}: {}", table, column, reason),
            ReconcileError::Validation {
                table,
                column: None,
                reason,
            } => write!(f, "Invalid declaration for table {}: {}", table, reason),
            ReconcileError::Execution {
                table,
                phase,
                statement,
                source,
            } => write!(
                f,
                "Table {} failed at {}\nStatement: {}\nError: {}",
                table, phase, statement, source
            ),
            ReconcileError::Introspection {
                table,
                column: Some(column),
                source,
            } => write!(f, "Catalog lookup for {}.{} failed: {}", table, column, source),
            ReconcileError::Introspection {
                table,
                column: None,
                source,
            } => write!(f, "Catalog lookup for table {} failed: {}", table, source),
            ReconcileError::Commit { table, source } => {
                write!(f, "Commit after reconciling table {} failed: {}", table, source)
            }
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Validation { .. } => None,
            ReconcileError::Execution { source, .. }
            | ReconcileError::Introspection { source, .. }
            | ReconcileError::Commit { source, .. } => Some(source),
        }
    }
}

impl From<(&str, StepError)> for ReconcileError {
    fn from((table, err): (&str, StepError)) -> Self {
        match &err {
            StepError::SerialTypeChange { column, .. } => {
                ReconcileError::invalid(table, Some(column), err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_names_phase_and_statement() {
        let err = ReconcileError::Execution {
            table: "orders".to_string(),
            phase: Phase::column("total", Step::AddColumn),
            statement: "ALTER TABLE orders ADD total numeric".to_string(),
            source: GuardError::QueryError("boom".to_string()),
        };

        let text = err.to_string();
        assert!(text.contains("column 'total' step ADD_COLUMN"));
        assert!(text.contains("ALTER TABLE orders ADD total numeric"));
        assert!(text.contains("boom"));
        assert_eq!(err.table(), "orders");
        assert_eq!(err.statement(), Some("ALTER TABLE orders ADD total numeric"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_step_error_becomes_validation() {
        let step_err = StepError::SerialTypeChange {
            table: "orders".to_string(),
            column: "x".to_string(),
            datatype: "bigserial".to_string(),
        };
        let err = ReconcileError::from(("orders", step_err));

        assert!(err.is_validation());
        assert!(err.to_string().starts_with("Invalid declaration for orders.x"));
        assert!(err.to_string().contains("serial-family"));
        assert_eq!(err.statement(), None);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::EnsureSchema.to_string(), "ensure schema");
        assert_eq!(
            Phase::AddConstraint {
                constraint: "new_id".to_string()
            }
            .to_string(),
            "add constraint 'new_id'"
        );
    }
}
