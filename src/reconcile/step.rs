//! Statement generation, one step at a time.
//!
//! A column is converged by walking a fixed list of [`Step`]s. Each step maps to a generator
//! that either produces one statement or nothing (when the declaration doesn't ask for it).
//! A new column is added together with its declared default so rows already in the table
//! pick it up; PostgreSQL stores a constant default in the catalog instead of rewriting rows.
//! [`Step::SetDefault`] still runs afterwards, and [`Step::Backfill`] is kept for columns that
//! existed before the pass.

use crate::reconcile::column::ColumnSpec;
use crate::reconcile::error::StepError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    AddColumn,
    SetDefault,
    Backfill,
    RestartSequence,
    AddUnique,
    AddPrimaryKey,
    SetNotNull,
    CreateIndex,
    AlterType,
}

/// Steps for a column that is absent from the live table, in execution order.
pub const NEW_COLUMN_STEPS: [Step; 8] = [
    Step::AddColumn,
    Step::SetDefault,
    Step::Backfill,
    Step::RestartSequence,
    Step::AddUnique,
    Step::AddPrimaryKey,
    Step::SetNotNull,
    Step::CreateIndex,
];

/// Steps that follow a successful [`Step::AlterType`] on an existing column.
pub const ALTERED_COLUMN_STEPS: [Step; 5] = [
    Step::SetDefault,
    Step::Backfill,
    Step::AddUnique,
    Step::SetNotNull,
    Step::CreateIndex,
];

/// Everything a generator may look at
pub struct StepInput<'a> {
    pub table: &'a str,
    /// The column was present before this pass started.
    pub column_existed: bool,
    pub column: &'a ColumnSpec,
}

type Generator = fn(&StepInput<'_>) -> Result<Option<String>, StepError>;

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::AddColumn => "ADD_COLUMN",
            Step::SetDefault => "SET_DEFAULT",
            Step::Backfill => "BACKFILL",
            Step::RestartSequence => "RESTART_SEQUENCE",
            Step::AddUnique => "ADD_UNIQUE",
            Step::AddPrimaryKey => "ADD_PRIMARY_KEY",
            Step::SetNotNull => "SET_NOT_NULL",
            Step::CreateIndex => "CREATE_INDEX",
            Step::AlterType => "ALTER_TYPE",
        }
    }

    fn generator(self) -> Generator {
        match self {
            Step::AddColumn => add_column,
            Step::SetDefault => set_default,
            Step::Backfill => backfill,
            Step::RestartSequence => restart_sequence,
            Step::AddUnique => add_unique,
            Step::AddPrimaryKey => add_primary_key,
            Step::SetNotNull => set_not_null,
            Step::CreateIndex => create_index,
            Step::AlterType => alter_type,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the statement for `step`, or `None` when the declaration doesn't call for it
///
/// # Errors
///
/// [`StepError::SerialTypeChange`] when [`Step::AlterType`] targets a serial-family type.
pub fn generate(
    step: Step,
    table: &str,
    column_existed: bool,
    column: &ColumnSpec,
) -> Result<Option<String>, StepError> {
    let input = StepInput {
        table,
        column_existed,
        column,
    };
    (step.generator())(&input)
}

fn add_column(input: &StepInput<'_>) -> Result<Option<String>, StepError> {
    let c = input.column;
    let mut sql = format!("ALTER TABLE {} ADD {} {}", input.table, c.name, c.datatype);
    // serial types already own a nextval() default
    if c.default_exists && !c.is_serial() {
        sql.push_str(" DEFAULT ");
        sql.push_str(&c.default_value);
    }
    Ok(Some(sql))
}

fn set_default(input: &StepInput<'_>) -> Result<Option<String>, StepError> {
    let c = input.column;
    Ok(c.default_exists.then(|| {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
            input.table, c.name, c.default_value
        )
    }))
}

// A column added this pass got its default in every row from ADD_COLUMN.
fn backfill(input: &StepInput<'_>) -> Result<Option<String>, StepError> {
    let c = input.column;
    Ok((c.default_exists && input.column_existed)
        .then(|| format!("UPDATE {} SET {} = {}", input.table, c.name, c.default_value)))
}

fn restart_sequence(input: &StepInput<'_>) -> Result<Option<String>, StepError> {
    let c = input.column;
    Ok(c.is_serial().then(|| {
        format!(
            "ALTER SEQUENCE {}_{}_seq RESTART WITH {}",
            input.table, c.name, c.sequence_restart
        )
    }))
}

fn add_unique(input: &StepInput<'_>) -> Result<Option<String>, StepError> {
    let c = input.column;
    Ok(c.is_unique.then(|| {
        let constraint = format!("{}_{}_unique", input.table, c.name);
        format!(
            "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}, ADD CONSTRAINT {} UNIQUE ({})",
            input.table, constraint, constraint, c.name
        )
    }))
}

fn add_primary_key(input: &StepInput<'_>) -> Result<Option<String>, StepError> {
    let c = input.column;
    Ok(c.is_primary.then(|| {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {}_{} PRIMARY KEY ({})",
            input.table, input.table, c.name, c.name
        )
    }))
}

fn set_not_null(input: &StepInput<'_>) -> Result<Option<String>, StepError> {
    let c = input.column;
    Ok(c.is_not_null.then(|| {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
            input.table, c.name
        )
    }))
}

fn create_index(input: &StepInput<'_>) -> Result<Option<String>, StepError> {
    let c = input.column;
    if !c.index_required {
        return Ok(None);
    }
    let using = c
        .index_type
        .as_deref()
        .map(|method| format!(" USING {}", method))
        .unwrap_or_default();
    Ok(Some(format!(
        "CREATE INDEX IF NOT EXISTS {}_{}_index ON {}{} ({})",
        input.table, c.name, input.table, using, c.name
    )))
}

fn alter_type(input: &StepInput<'_>) -> Result<Option<String>, StepError> {
    let c = input.column;
    if c.is_serial() {
        return Err(StepError::SerialTypeChange {
            table: input.table.to_string(),
            column: c.name.clone(),
            datatype: c.datatype.clone(),
        });
    }
    Ok(Some(format!(
        "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{}",
        input.table, c.name, c.datatype, c.name, c.datatype
    )))
}
