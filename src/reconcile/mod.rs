//! Table reconciliation engine.
//!
//! - [`column`], [`constraint`], [`table`]: the declarations
//! - [`step`]: one statement per step, generated from a declaration
//! - [`matcher`]: does a live column already satisfy its declaration?
//! - [`catalog`]: the transaction seam and the catalog lookups
//! - [`reconciler`]: the pass that ties them together

pub mod catalog;
pub mod column;
pub mod constraint;
pub mod error;
pub mod log;
pub mod matcher;
pub mod reconciler;
pub mod step;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::SchemaTransaction;
pub use column::{ColumnSpec, NULL_DEFAULT};
pub use constraint::ConstraintSpec;
pub use error::{Phase, ReconcileError, StepError};
pub use log::{LogFacade, LogLevel, MemoryLog, NullLog, ReconcileLog};
pub use matcher::{matches, LiveColumnInfo};
pub use reconciler::{ExecutedStatement, PassState, ReconcileReport, Reconciler};
pub use step::{generate, Step, ALTERED_COLUMN_STEPS, NEW_COLUMN_STEPS};
pub use table::TableSpec;
