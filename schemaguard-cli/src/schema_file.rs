//! Schema documents: tables described as TOML or JSON
//!
//! ```toml
//! database = "erp"
//! schema = "public"
//! autocommit = true
//!
//! [[tables]]
//! name = "tax_params"
//!
//! [[tables.columns]]
//! name = "id"
//! datatype = "bigserial"
//! is_primary = true
//! sequence_restart = 101
//!
//! [[tables.constraints]]
//! name = "tax_params_name_active"
//! value = "UNIQUE (name, active)"
//! ```

use schemaguard::{ColumnSpec, ConstraintSpec, ReconcileError, TableSpec};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading a schema document.
#[derive(Debug, Error)]
pub enum SchemaFileError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema document declares no tables")]
    NoTables,

    #[error("table {0} is declared more than once")]
    DuplicateTable(String),

    #[error(transparent)]
    Invalid(#[from] ReconcileError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// `.json` files are JSON, everything else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Catalog name for lookups; empty means the connected database.
    #[serde(default)]
    pub database: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default)]
    pub autocommit: bool,
    #[serde(default)]
    pub tables: Vec<TableDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDocument {
    pub name: String,
    pub schema: Option<String>,
    pub database: Option<String>,
    pub autocommit: Option<bool>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
}

fn default_schema() -> String {
    "public".to_string()
}

impl SchemaDocument {
    pub fn parse(content: &str, format: Format) -> Result<Self, SchemaFileError> {
        Ok(match format {
            Format::Toml => toml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
        })
    }

    /// Build table declarations in document order, with document-level defaults filled in
    /// and every column normalized.
    pub fn into_tables(self) -> Vec<TableSpec> {
        let SchemaDocument {
            database,
            schema,
            autocommit,
            tables,
        } = self;

        tables
            .into_iter()
            .map(|doc| {
                let mut table = TableSpec::new(
                    doc.name,
                    doc.schema.unwrap_or_else(|| schema.clone()),
                    doc.database.unwrap_or_else(|| database.clone()),
                )
                .autocommit(doc.autocommit.unwrap_or(autocommit));
                for column in doc.columns {
                    table.append(column);
                }
                for constraint in doc.constraints {
                    table.add_constraint(constraint);
                }
                table
            })
            .collect()
    }
}

/// Read, parse and validate a schema document.
///
/// # Errors
///
/// I/O and syntax errors, an empty document, a table declared twice, or any table failing
/// [`TableSpec::validate`].
pub fn load(path: &Path) -> Result<Vec<TableSpec>, SchemaFileError> {
    let content = fs::read_to_string(path).map_err(|source| SchemaFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded schema document {}", path.display());
    load_str(&content, Format::from_path(path))
}

pub fn load_str(content: &str, format: Format) -> Result<Vec<TableSpec>, SchemaFileError> {
    let tables = SchemaDocument::parse(content, format)?.into_tables();
    if tables.is_empty() {
        return Err(SchemaFileError::NoTables);
    }

    // tables are created and looked up by bare name, so the schema can't tell two apart
    for (idx, table) in tables.iter().enumerate() {
        if tables[..idx].iter().any(|t| t.name == table.name) {
            return Err(SchemaFileError::DuplicateTable(table.name.clone()));
        }
        table.validate()?;
    }
    Ok(tables)
}
