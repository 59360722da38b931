//! schemaguard command-line library
//!
//! Schema-file loading and offline planning, shared by the `schemaguard` binary and its tests.

pub mod plan;
pub mod schema_file;

pub use plan::fresh_table_plan;
pub use schema_file::{load, load_str, Format, SchemaDocument, SchemaFileError};
