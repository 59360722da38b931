//! Column declarations.

use serde::Deserialize;

/// Default expression recorded for columns declared without one.
pub const NULL_DEFAULT: &str = "'NULL'";

/// Desired shape of one column
///
/// Build one with [`ColumnSpec::new`] and the chained setters, or deserialize it from a schema
/// file. Either way the table normalizes it when it is appended, so the reconciler only ever
/// sees fully populated declarations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnSpec {
    pub name: String,
    /// Canonical SQL type, e.g. `text`, `bigserial`, `bigint[]`.
    pub datatype: String,
    /// Alternate spelling the catalog reports for `datatype`, e.g.
    /// `timestamp with time zone` for `timestamptz`.
    pub pseudo_datatype: Option<String>,
    pub default_exists: bool,
    pub default_value: String,
    pub is_unique: bool,
    pub is_primary: bool,
    pub is_not_null: bool,
    pub index_required: bool,
    /// Index access method (`gin`, `gist`, ...). `None` builds a B-tree.
    pub index_type: Option<String>,
    pub sequence_restart: i64,
    pub comment: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            ..Self::default()
        }
        .normalize()
    }

    /// Set a default expression; it is also written into existing rows when the column
    /// already existed.
    pub fn default_value(mut self, expression: impl Into<String>) -> Self {
        self.default_exists = true;
        self.default_value = expression.into();
        self
    }

    pub fn pseudo_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.pseudo_datatype = Some(datatype.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_not_null = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.index_required = true;
        self
    }

    /// Require an index built with a specific access method.
    pub fn indexed_using(mut self, method: impl Into<String>) -> Self {
        self.index_required = true;
        self.index_type = Some(method.into());
        self
    }

    pub fn sequence_restart(mut self, value: i64) -> Self {
        self.sequence_restart = value;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Fill in everything a declaration may leave out
    ///
    /// - an empty default becomes `'NULL'`
    /// - a sequence restart below 1 becomes 1
    /// - the index method is dropped unless an index is required, and an empty method means
    ///   the default B-tree
    /// - an empty pseudo-datatype is treated as absent
    pub fn normalize(mut self) -> Self {
        if self.default_value.is_empty() {
            self.default_value = NULL_DEFAULT.to_string();
        }
        if self.sequence_restart < 1 {
            self.sequence_restart = 1;
        }
        if !self.index_required || self.index_type.as_deref().is_some_and(str::is_empty) {
            self.index_type = None;
        }
        if self.pseudo_datatype.as_deref().is_some_and(str::is_empty) {
            self.pseudo_datatype = None;
        }
        self
    }

    /// Serial-family types carry an implicit sequence default.
    pub fn is_serial(&self) -> bool {
        self.datatype.contains("serial")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_column_is_normalized() {
        let col = ColumnSpec::new("name", "text");

        assert_eq!(col.default_value, "'NULL'");
        assert_eq!(col.sequence_restart, 1);
        assert!(!col.default_exists);
        assert!(!col.is_unique && !col.is_primary && !col.is_not_null && !col.index_required);
        assert_eq!(col.index_type, None);
    }

    #[test]
    fn test_normalize_keeps_explicit_values() {
        let col = ColumnSpec::new("id", "bigserial")
            .primary()
            .sequence_restart(101)
            .default_value("0")
            .normalize();

        assert_eq!(col.sequence_restart, 101);
        assert_eq!(col.default_value, "0");
        assert!(col.default_exists);
        assert!(col.is_primary);
    }

    #[test]
    fn test_normalize_drops_index_type_without_index() {
        let col = ColumnSpec {
            name: "tags".to_string(),
            datatype: "text[]".to_string(),
            index_type: Some("gin".to_string()),
            ..ColumnSpec::default()
        }
        .normalize();
        assert_eq!(col.index_type, None);

        let col = ColumnSpec::new("tags", "text[]").indexed_using("gin").normalize();
        assert_eq!(col.index_type.as_deref(), Some("gin"));

        let col = ColumnSpec::new("tags", "text[]").indexed_using("").normalize();
        assert!(col.index_required);
        assert_eq!(col.index_type, None);
    }

    #[test]
    fn test_normalize_clamps_sequence_restart() {
        let col = ColumnSpec::new("id", "serial").sequence_restart(0).normalize();
        assert_eq!(col.sequence_restart, 1);

        let col = ColumnSpec::new("id", "serial").sequence_restart(-5).normalize();
        assert_eq!(col.sequence_restart, 1);
    }

    #[test]
    fn test_is_serial() {
        assert!(ColumnSpec::new("id", "bigserial").is_serial());
        assert!(ColumnSpec::new("id", "serial").is_serial());
        assert!(!ColumnSpec::new("id", "bigint").is_serial());
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let col: ColumnSpec = serde_json::from_str(
            r#"{"name": "type", "datatype": "text", "is_not_null": true, "default_exists": true, "default_value": "''"}"#,
        )
        .unwrap();
        let col = col.normalize();

        assert_eq!(col.name, "type");
        assert!(col.is_not_null);
        assert_eq!(col.default_value, "''");
        assert_eq!(col.sequence_restart, 1);
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let err = serde_json::from_str::<ColumnSpec>(r#"{"name": "a", "datatype": "text", "unique": true}"#);
        assert!(err.is_err());
    }
}
