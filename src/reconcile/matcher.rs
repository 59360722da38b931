//! Declared-versus-live column comparison.

use crate::reconcile::column::ColumnSpec;

/// What the catalog reports for one column
///
/// Read fresh for every column on every pass; nothing here is cached between lookups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveColumnInfo {
    /// `information_schema.columns.data_type`, e.g. `bigint`, `ARRAY`, `timestamp with time zone`
    pub reported_datatype: String,
    /// `information_schema.columns.column_default`, `None` when the column has no default
    pub reported_default: Option<String>,
    pub exists: bool,
}

impl LiveColumnInfo {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(datatype: impl Into<String>, default: Option<String>) -> Self {
        Self {
            reported_datatype: datatype.into(),
            reported_default: default,
            exists: true,
        }
    }
}

/// Whether an existing column already satisfies its declaration
///
/// The first rule that holds decides:
///
/// 1. a serial declaration is reported as its backing integer type plus a sequence default
/// 2. the live default is exactly the declared default
/// 3. the live type is exactly the declared type
/// 4. an array column whose default carries the declared cast (`'{}'::text[]`)
/// 5. the live type is the declared pseudo-datatype
///
/// A column that doesn't exist never matches.
pub fn matches(declared: &ColumnSpec, live: &LiveColumnInfo) -> bool {
    if !live.exists {
        return false;
    }

    let reported_type = live.reported_datatype.as_str();
    let reported_default = live.reported_default.as_deref();

    if reported_default.is_some() {
        match (declared.datatype.as_str(), reported_type) {
            ("bigserial", "bigint") | ("serial", "integer") => return true,
            _ => {}
        }
    }

    if reported_default == Some(declared.default_value.as_str()) {
        return true;
    }

    if reported_type == declared.datatype {
        return true;
    }

    if reported_type == "ARRAY" {
        let cast_default = format!("{}::{}", declared.default_value, declared.datatype);
        if reported_default == Some(cast_default.as_str()) {
            return true;
        }
    }

    declared
        .pseudo_datatype
        .as_deref()
        .is_some_and(|pseudo| !pseudo.is_empty() && pseudo == reported_type)
}
