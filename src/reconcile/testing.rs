//! In-memory stand-in for a PostgreSQL transaction.
//!
//! Understands just enough of the statements the reconciler emits to keep a fake catalog in
//! step, so passes can be run twice and compared without a server.

use crate::executor::GuardError;
use crate::reconcile::catalog::{
    SchemaTransaction, COLUMN_EXISTS_SQL, COLUMN_INFO_SQL, TABLE_EXISTS_SQL,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeColumn {
    pub name: String,
    /// What `information_schema.columns.data_type` would say
    pub data_type: String,
    /// Type as written in the statement that created or altered the column
    pub declared_type: String,
    pub default: Option<String>,
}

type Catalog = BTreeMap<String, Vec<FakeColumn>>;

#[derive(Debug, Default)]
pub(crate) struct FakeTransaction {
    tables: Catalog,
    snapshot: Catalog,
    pub statements: Vec<String>,
    pub queries: usize,
    pub commits: usize,
    pub rollbacks: usize,
    closed: bool,
    fail_on: Option<String>,
    fail_queries: bool,
    fail_commit: bool,
}

impl FakeTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table as it would look after earlier, committed work.
    pub fn with_table(mut self, name: &str, columns: &[(&str, &str, Option<&str>)]) -> Self {
        let columns = columns
            .iter()
            .map(|(col, data_type, default)| FakeColumn {
                name: col.to_string(),
                data_type: data_type.to_string(),
                declared_type: data_type.to_string(),
                default: default.map(str::to_string),
            })
            .collect();
        self.tables.insert(name.to_string(), columns);
        self.snapshot = self.tables.clone();
        self
    }

    /// Reject any statement containing `fragment`.
    pub fn fail_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    pub fn fail_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Start the next transaction on the same catalog, forgetting recorded statements.
    pub fn begin(&mut self) {
        self.closed = false;
        self.statements.clear();
        self.snapshot = self.tables.clone();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&FakeColumn> {
        self.tables.get(table)?.iter().find(|c| c.name == column)
    }

    pub fn column_names(&self, table: &str) -> Vec<String> {
        self.tables
            .get(table)
            .map(|cols| cols.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    fn ensure_open(&self) -> Result<(), GuardError> {
        if self.closed {
            return Err(GuardError::Other("Transaction is closed".to_string()));
        }
        Ok(())
    }

    fn apply(&mut self, sql: &str) -> Result<(), GuardError> {
        if let Some(name) = sql.strip_prefix("CREATE TABLE ") {
            let name = name.trim_end_matches(" ()").to_string();
            if self.tables.contains_key(&name) {
                return Err(simulated(&format!("relation \"{}\" already exists", name)));
            }
            self.tables.insert(name, Vec::new());
        } else if let Some(name) = sql.strip_prefix("DROP TABLE ") {
            if self.tables.remove(name).is_none() {
                return Err(simulated(&format!("table \"{}\" does not exist", name)));
            }
        } else if let Some(rest) = sql.strip_prefix("ALTER TABLE ") {
            let (table, action) = rest
                .split_once(' ')
                .ok_or_else(|| simulated("syntax error"))?;
            self.alter(table, action)?;
        }
        // Schemas, sequences, indexes and backfills leave the fake catalog unchanged.
        Ok(())
    }

    fn alter(&mut self, table: &str, action: &str) -> Result<(), GuardError> {
        let columns = self
            .tables
            .get_mut(table)
            .ok_or_else(|| simulated(&format!("relation \"{}\" does not exist", table)))?;

        if action.starts_with("ADD CONSTRAINT ") || action.starts_with("DROP CONSTRAINT ") {
            return Ok(());
        }

        if let Some(def) = action.strip_prefix("ADD ") {
            let (name, rest) = def.split_once(' ').ok_or_else(|| simulated("syntax error"))?;
            if columns.iter().any(|c| c.name == name) {
                return Err(simulated(&format!("column \"{}\" already exists", name)));
            }
            let (datatype, inline_default) = match rest.split_once(" DEFAULT ") {
                Some((datatype, value)) => (datatype, Some(value)),
                None => (rest, None),
            };
            let (data_type, default) = match datatype {
                "bigserial" => ("bigint".to_string(), Some(sequence_default(table, name))),
                "serial" => ("integer".to_string(), Some(sequence_default(table, name))),
                "smallserial" => ("smallint".to_string(), Some(sequence_default(table, name))),
                other => {
                    let data_type = reported_type(other);
                    let default = inline_default.map(|v| stored_default(&data_type, other, v));
                    (data_type, default)
                }
            };
            columns.push(FakeColumn {
                name: name.to_string(),
                data_type,
                declared_type: datatype.to_string(),
                default,
            });
            return Ok(());
        }

        if let Some(rest) = action.strip_prefix("ALTER COLUMN ") {
            let (name, change) = rest.split_once(' ').ok_or_else(|| simulated("syntax error"))?;
            let column = columns
                .iter_mut()
                .find(|c| c.name == name)
                .ok_or_else(|| simulated(&format!("column \"{}\" does not exist", name)))?;

            if let Some(value) = change.strip_prefix("SET DEFAULT ") {
                column.default = Some(stored_default(&column.data_type, &column.declared_type, value));
            } else if let Some(ty) = change.strip_prefix("TYPE ") {
                let ty = ty.split(" USING ").next().unwrap_or(ty);
                column.data_type = reported_type(ty);
                column.declared_type = ty.to_string();
            }
        }
        Ok(())
    }
}

fn sequence_default(table: &str, column: &str) -> String {
    format!("nextval('{}_{}_seq'::regclass)", table, column)
}

/// Array defaults come back from the catalog with a cast to the declared type.
fn stored_default(data_type: &str, declared_type: &str, value: &str) -> String {
    if data_type == "ARRAY" {
        format!("{}::{}", value, declared_type)
    } else {
        value.to_string()
    }
}

fn reported_type(datatype: &str) -> String {
    if datatype.ends_with("[]") {
        "ARRAY".to_string()
    } else {
        datatype.to_string()
    }
}

fn simulated(message: &str) -> GuardError {
    GuardError::QueryError(format!("simulated: {}", message))
}

impl SchemaTransaction for FakeTransaction {
    fn execute_statement(&mut self, sql: &str) -> Result<(), GuardError> {
        self.ensure_open()?;
        self.statements.push(sql.to_string());
        if let Some(fragment) = &self.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(simulated(&format!("rejected {}", sql)));
            }
        }
        self.apply(sql)
    }

    fn query_exists(&mut self, query: &str, params: &[&str]) -> Result<bool, GuardError> {
        self.ensure_open()?;
        self.queries += 1;
        if self.fail_queries {
            return Err(simulated("catalog unavailable"));
        }
        match (query, params) {
            (TABLE_EXISTS_SQL, [table]) => Ok(self.has_table(table)),
            (COLUMN_EXISTS_SQL, [table, _database, column]) => {
                Ok(self.column(table, column).is_some())
            }
            _ => Err(simulated("unexpected query")),
        }
    }

    fn query_text_row(
        &mut self,
        query: &str,
        params: &[&str],
    ) -> Result<Option<Vec<Option<String>>>, GuardError> {
        self.ensure_open()?;
        self.queries += 1;
        if self.fail_queries {
            return Err(simulated("catalog unavailable"));
        }
        match (query, params) {
            (COLUMN_INFO_SQL, [table, _database, column]) => Ok(self
                .column(table, column)
                .map(|c| vec![Some(c.data_type.clone()), c.default.clone()])),
            _ => Err(simulated("unexpected query")),
        }
    }

    fn commit(&mut self) -> Result<(), GuardError> {
        self.ensure_open()?;
        self.closed = true;
        if self.fail_commit {
            self.tables = self.snapshot.clone();
            return Err(simulated("could not serialize access"));
        }
        self.commits += 1;
        self.snapshot = self.tables.clone();
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), GuardError> {
        self.ensure_open()?;
        self.closed = true;
        self.rollbacks += 1;
        self.tables = self.snapshot.clone();
        Ok(())
    }
}
