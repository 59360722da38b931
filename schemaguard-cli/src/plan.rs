//! Offline plans: what a pass would send to a database where nothing exists yet.

use schemaguard::reconcile::{generate, NEW_COLUMN_STEPS};
use schemaguard::{ExecutedStatement, Phase, ReconcileError, TableSpec};

/// Statements a pass would run for `table` against an empty database, in order.
///
/// # Errors
///
/// Propagates validation failures from the declaration or the statement generator.
pub fn fresh_table_plan(table: &TableSpec) -> Result<Vec<ExecutedStatement>, ReconcileError> {
    table.validate()?;

    let name = table.name.as_str();
    let mut plan = vec![
        ExecutedStatement {
            phase: Phase::EnsureSchema,
            sql: format!("CREATE SCHEMA IF NOT EXISTS {}", table.schema),
        },
        ExecutedStatement {
            phase: Phase::CreateTable,
            sql: format!("CREATE TABLE {} ()", name),
        },
    ];

    for column in &table.columns {
        for step in NEW_COLUMN_STEPS {
            let statement =
                generate(step, name, false, column).map_err(|e| ReconcileError::from((name, e)))?;
            if let Some(sql) = statement {
                plan.push(ExecutedStatement {
                    phase: Phase::Column {
                        column: column.name.clone(),
                        step,
                    },
                    sql,
                });
            }
        }
    }

    for constraint in &table.constraints {
        plan.push(ExecutedStatement {
            phase: Phase::DropConstraint {
                constraint: constraint.name.clone(),
            },
            sql: constraint.drop_rule(name),
        });
        plan.push(ExecutedStatement {
            phase: Phase::AddConstraint {
                constraint: constraint.name.clone(),
            },
            sql: constraint.add_rule(name),
        });
    }

    Ok(plan)
}
