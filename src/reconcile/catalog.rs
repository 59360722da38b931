//! The transaction seam the reconciler talks through, and the catalog lookups built on it.

use crate::executor::{GuardError, SqlExecutor};
use crate::reconcile::matcher::LiveColumnInfo;
use crate::transaction::Transaction;
use may_postgres::types::ToSql;

/// Does a table with this name exist (any schema)?
pub const TABLE_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM pg_catalog.pg_class \
     WHERE relname::text = $1::text AND relkind IN ('r', 'p'))";

/// Does the column exist? Params: table, database (empty means the current one), column.
pub const COLUMN_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM information_schema.columns \
     WHERE table_name::text = $1::text \
     AND table_catalog::text = COALESCE(NULLIF($2::text, ''), current_database()::text) \
     AND column_name::text = $3::text)";

/// Reported type and default of one column, same params as [`COLUMN_EXISTS_SQL`].
pub const COLUMN_INFO_SQL: &str = "SELECT data_type::text, column_default::text \
     FROM information_schema.columns \
     WHERE table_name::text = $1::text \
     AND table_catalog::text = COALESCE(NULLIF($2::text, ''), current_database()::text) \
     AND column_name::text = $3::text";

/// An open transaction a reconciliation pass runs in
///
/// Parameters and results are plain text so the engine never depends on driver row types.
/// [`Transaction`] is the production implementation.
pub trait SchemaTransaction {
    /// Run one statement
    fn execute_statement(&mut self, sql: &str) -> Result<(), GuardError>;

    /// Run a query whose single row holds a single boolean
    fn query_exists(&mut self, query: &str, params: &[&str]) -> Result<bool, GuardError>;

    /// Run a query returning at most one row, every column read as nullable text
    fn query_text_row(
        &mut self,
        query: &str,
        params: &[&str],
    ) -> Result<Option<Vec<Option<String>>>, GuardError>;

    fn commit(&mut self) -> Result<(), GuardError>;

    fn rollback(&mut self) -> Result<(), GuardError>;
}

fn to_sql_params<'a>(params: &'a [&'a str]) -> Vec<&'a dyn ToSql> {
    params.iter().map(|p| p as &dyn ToSql).collect()
}

impl SchemaTransaction for Transaction {
    fn execute_statement(&mut self, sql: &str) -> Result<(), GuardError> {
        self.execute(sql, &[]).map(|_| ())
    }

    fn query_exists(&mut self, query: &str, params: &[&str]) -> Result<bool, GuardError> {
        let params = to_sql_params(params);
        let row = self.query_one(query, &params)?;
        row.try_get::<_, bool>(0)
            .map_err(|e| GuardError::ParseError(format!("expected a boolean: {}", e)))
    }

    fn query_text_row(
        &mut self,
        query: &str,
        params: &[&str],
    ) -> Result<Option<Vec<Option<String>>>, GuardError> {
        let params = to_sql_params(params);
        let rows = self.query_all(query, &params)?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let mut values = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            let value = row
                .try_get::<_, Option<String>>(idx)
                .map_err(|e| GuardError::ParseError(format!("column {}: {}", idx, e)))?;
            values.push(value);
        }
        Ok(Some(values))
    }

    fn commit(&mut self) -> Result<(), GuardError> {
        Transaction::commit(self).map_err(GuardError::from)
    }

    fn rollback(&mut self) -> Result<(), GuardError> {
        Transaction::rollback(self).map_err(GuardError::from)
    }
}

pub(crate) fn table_exists(tx: &mut dyn SchemaTransaction, table: &str) -> Result<bool, GuardError> {
    tx.query_exists(TABLE_EXISTS_SQL, &[table])
}

/// Existence first, then type and default
///
/// Lookups are keyed by table name and database only. Two schemas holding a table with the
/// same name are indistinguishable here.
pub(crate) fn live_column(
    tx: &mut dyn SchemaTransaction,
    table: &str,
    database: &str,
    column: &str,
) -> Result<LiveColumnInfo, GuardError> {
    let params = [table, database, column];
    if !tx.query_exists(COLUMN_EXISTS_SQL, &params)? {
        return Ok(LiveColumnInfo::absent());
    }

    let row = tx.query_text_row(COLUMN_INFO_SQL, &params)?.ok_or_else(|| {
        GuardError::QueryError(format!("column {}.{} disappeared during lookup", table, column))
    })?;
    let mut values = row.into_iter();
    let datatype = values.next().flatten().ok_or_else(|| {
        GuardError::ParseError(format!("no data_type reported for {}.{}", table, column))
    })?;
    let default = values.next().flatten();

    Ok(LiveColumnInfo::present(datatype, default))
}
